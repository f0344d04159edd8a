use serde_json::Value;

use crate::dispatch::Dispatcher;
use crate::error::RpcError;
use crate::rpc::{handle_request, Request, Response};
use crate::tmux::TmuxCommandRunner;

/// Build a request from `<method> [<arg>...]`.
///
/// Each argument is parsed as JSON when possible and kept as a plain string
/// otherwise, so `0` becomes a number and `main` stays a string.
pub fn request_from_args(raw: &[String]) -> Option<Request> {
    let (method, rest) = raw.split_first()?;
    let args = rest
        .iter()
        .map(|arg| serde_json::from_str(arg).unwrap_or_else(|_| Value::String(arg.clone())))
        .collect();

    Some(Request {
        id: None,
        method: method.clone(),
        args,
    })
}

/// Run a single call built from process arguments
pub async fn run_once<R: TmuxCommandRunner>(
    dispatcher: &Dispatcher<R>,
    raw: &[String],
) -> Response {
    match request_from_args(raw) {
        Some(request) => handle_request(dispatcher, request).await,
        None => Response::error(
            None,
            &RpcError::Validation("No method specified".to_string()),
        ),
    }
}
