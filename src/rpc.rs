//! Newline-delimited JSON request/response loop.
//!
//! # Wire format
//!
//! ```text
//! -> {"id": 1, "method": "listSessions", "args": []}
//! <- {"id": 1, "result": [...]}
//! <- {"id": 2, "error": "Unknown method: frobnicate"}
//! ```
//!
//! One request per line in, exactly one response per line out, in the same
//! order. Blank lines are ignored. A line that is not a valid request still
//! gets an error response, and that response never carries an `id`.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::dispatch::Dispatcher;
use crate::error::RpcError;
use crate::tmux::TmuxCommandRunner;

/// A parsed request line
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Echoed verbatim; `None` when the key was absent
    pub id: Option<Value>,
    pub method: String,
    pub args: Vec<Value>,
}

impl Request {
    /// Parse one request line.
    ///
    /// Any structural problem is a protocol error, and its response carries
    /// no `id` even when one was present.
    pub fn parse(line: &str) -> Result<Self, RpcError> {
        let value: Value = serde_json::from_str(line)
            .map_err(|e| RpcError::Protocol(format!("malformed JSON: {}", e)))?;

        let Value::Object(mut object) = value else {
            return Err(RpcError::Protocol("request must be a JSON object".to_string()));
        };

        let method = match object.remove("method") {
            Some(Value::String(method)) => method,
            Some(_) => {
                return Err(RpcError::Protocol(
                    "\"method\" must be a string".to_string(),
                ))
            }
            None => return Err(RpcError::Protocol("missing \"method\"".to_string())),
        };

        let args = match object.remove("args") {
            None => Vec::new(),
            Some(Value::Array(args)) => args,
            Some(_) => {
                return Err(RpcError::Protocol(
                    "\"args\" must be an array".to_string(),
                ))
            }
        };

        Ok(Self {
            id: object.remove("id"),
            method,
            args,
        })
    }
}

/// A response line: the echoed id plus exactly one of `result` / `error`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Result(Value),
    Error(String),
}

impl Response {
    pub fn result(id: Option<Value>, value: Value) -> Self {
        Self {
            id,
            outcome: Outcome::Result(value),
        }
    }

    pub fn error(id: Option<Value>, err: &RpcError) -> Self {
        Self {
            id,
            outcome: Outcome::Error(err.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Error(_))
    }
}

/// Counters reported when the loop closes
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoopStats {
    pub requests: u64,
    pub errors: u64,
}

/// Dispatch one request and turn any failure into an error response
pub async fn handle_request<R: TmuxCommandRunner>(
    dispatcher: &Dispatcher<R>,
    request: Request,
) -> Response {
    match dispatcher.dispatch(&request.method, &request.args).await {
        Ok(value) => Response::result(request.id, value),
        Err(e) => {
            debug!(method = %request.method, error = %e, "request failed");
            Response::error(request.id, &e)
        }
    }
}

async fn handle_line<R: TmuxCommandRunner>(dispatcher: &Dispatcher<R>, line: &[u8]) -> Response {
    let line = match std::str::from_utf8(line) {
        Ok(line) => line,
        Err(e) => {
            let err = RpcError::Protocol(format!("request is not valid UTF-8: {}", e));
            return Response::error(None, &err);
        }
    };

    match Request::parse(line) {
        Ok(request) => handle_request(dispatcher, request).await,
        Err(err) => {
            warn!(error = %err, "rejected request line");
            Response::error(None, &err)
        }
    }
}

/// Serve requests from `reader` until end-of-stream.
///
/// Requests are handled strictly one at a time, and each response is flushed
/// before the next line is read. Only IO failures on the streams end the
/// loop early.
pub async fn serve<I, O, R>(
    mut reader: I,
    mut writer: O,
    dispatcher: &Dispatcher<R>,
) -> Result<LoopStats>
where
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
    R: TmuxCommandRunner,
{
    let mut stats = LoopStats::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .await
            .context("Failed to read request line")?;
        if read == 0 {
            break;
        }

        let line = trim_line_ending(&buf);
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let response = handle_line(dispatcher, line).await;
        stats.requests += 1;
        if response.is_error() {
            stats.errors += 1;
        }

        write_response(&mut writer, &response).await?;
    }

    info!(
        requests = stats.requests,
        errors = stats.errors,
        "input closed, stopping"
    );
    Ok(stats)
}

/// Write one response line and flush it
pub async fn write_response<O: AsyncWrite + Unpin>(
    writer: &mut O,
    response: &Response,
) -> Result<()> {
    let mut line = serde_json::to_string(response).context("Failed to encode response")?;
    line.push('\n');
    writer
        .write_all(line.as_bytes())
        .await
        .context("Failed to write response")?;
    writer.flush().await.context("Failed to flush response")?;
    Ok(())
}

fn trim_line_ending(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tokio::io::BufReader;

    use super::*;
    use crate::tmux::{MockRunner, TmuxClient};

    fn dispatcher(runner: MockRunner) -> Dispatcher<MockRunner> {
        Dispatcher::new(TmuxClient::new(runner))
    }

    async fn run(input: &str, runner: MockRunner) -> (Vec<Value>, LoopStats, Dispatcher<MockRunner>) {
        let d = dispatcher(runner);
        let mut out = Vec::new();
        let stats = serve(input.as_bytes(), &mut out, &d).await.expect("serve");
        let responses = String::from_utf8(out)
            .expect("utf8")
            .lines()
            .map(|l| serde_json::from_str(l).expect("response is JSON"))
            .collect();
        (responses, stats, d)
    }

    #[test]
    fn test_parse_request() {
        let req = Request::parse(r#"{"id":"a","method":"ping"}"#).unwrap();
        assert_eq!(
            req,
            Request {
                id: Some(json!("a")),
                method: "ping".to_string(),
                args: vec![]
            }
        );

        let req = Request::parse(r#"{"id":null,"method":"ping","args":[1]}"#).unwrap();
        assert_eq!(req.id, Some(Value::Null));
        assert_eq!(req.args, vec![json!(1)]);

        let req = Request::parse(r#"{"method":"ping"}"#).unwrap();
        assert_eq!(req.id, None);
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        for line in [
            "{not json",
            "[1,2]",
            r#"{"id":4,"method":7}"#,
            r#"{"id":5}"#,
            r#"{"id":6,"method":"ping","args":"x"}"#,
        ] {
            let err = Request::parse(line).unwrap_err();
            assert!(matches!(err, RpcError::Protocol(_)), "{line}: {err}");
        }
    }

    #[tokio::test]
    async fn test_protocol_errors_omit_id() {
        let input = concat!(
            "{\"id\":4,\"method\":7}\n",
            "{\"id\":5}\n",
            "{\"id\":6,\"method\":\"ping\",\"args\":\"x\"}\n",
            "{\"id\":7,\"method\":\"ping\"}\n",
        );
        let (responses, stats, _) = run(input, MockRunner::new()).await;

        assert_eq!(
            responses,
            vec![
                json!({"error": "Invalid request: \"method\" must be a string"}),
                json!({"error": "Invalid request: missing \"method\""}),
                json!({"error": "Invalid request: \"args\" must be an array"}),
                json!({"id": 7, "result": "pong"}),
            ]
        );
        assert_eq!(stats.errors, 3);
    }

    #[test]
    fn test_response_has_exactly_one_outcome() {
        let ok = serde_json::to_value(Response::result(Some(json!(1)), json!("pong"))).unwrap();
        assert_eq!(ok, json!({"id": 1, "result": "pong"}));

        let err = RpcError::UnknownMethod("x".to_string());
        let bad = serde_json::to_value(Response::error(None, &err)).unwrap();
        assert_eq!(bad, json!({"error": "Unknown method: x"}));
    }

    #[tokio::test]
    async fn test_list_sessions_end_to_end() {
        let (responses, _, _) = run(
            "{\"id\":1,\"method\":\"listSessions\",\"args\":[]}\n",
            MockRunner::single_session(),
        )
        .await;
        assert_eq!(
            responses,
            vec![json!({"id":1,"result":[{"name":"main","attached":true,"windows":[{"sessionName":"main","windowIndex":0,"windowName":"shell","active":true}]}]})]
        );
    }

    #[tokio::test]
    async fn test_send_keys_to_missing_window_end_to_end() {
        let (responses, _, d) = run(
            "{\"id\":2,\"method\":\"sendKeysToWindow\",\"args\":[\"main\",9,\"ls\"]}\n",
            MockRunner::single_session(),
        )
        .await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], json!(2));
        assert!(responses[0].get("result").is_none());
        let error = responses[0]["error"].as_str().expect("error string");
        assert!(error.contains("main:9"), "{error}");
        assert_eq!(d.client().runner().calls_to("send-keys"), 0);
    }

    #[tokio::test]
    async fn test_ping_without_tmux() {
        // No canned replies at all: every tmux call would fail
        let (responses, _, _) = run(
            "{\"id\":\"p\",\"method\":\"ping\"}\n{\"id\":\"q\",\"method\":\"listSessions\"}\n",
            MockRunner::new(),
        )
        .await;
        assert_eq!(responses[0], json!({"id": "p", "result": "pong"}));
        assert_eq!(responses[1]["id"], json!("q"));
        assert!(responses[1]["error"].is_string());
    }

    #[tokio::test]
    async fn test_survives_malformed_lines_in_order() {
        let input = concat!(
            "{\"id\":1,\"method\":\"ping\"}\n",
            "this is not json\n",
            "\n",
            "   \n",
            "{\"id\":2,\"method\":\"nope\"}\n",
            "{\"id\":3,\"method\":\"captureWindowContent\",\"args\":[\"main\"]}\n",
            "{\"id\":4,\"method\":\"ping\"}",
        );
        let (responses, stats, _) = run(input, MockRunner::new()).await;

        assert_eq!(responses.len(), 5);
        assert_eq!(responses[0], json!({"id": 1, "result": "pong"}));
        assert!(responses[1].get("id").is_none());
        assert!(responses[1]["error"].as_str().unwrap().starts_with("Invalid request"));
        assert_eq!(responses[2], json!({"id": 2, "error": "Unknown method: nope"}));
        assert_eq!(responses[3]["id"], json!(3));
        assert!(responses[3]["error"].as_str().unwrap().starts_with("Missing arguments"));
        assert_eq!(responses[4], json!({"id": 4, "result": "pong"}));
        assert_eq!(stats, LoopStats { requests: 5, errors: 3 });
    }

    #[tokio::test]
    async fn test_invalid_utf8_gets_error_response() {
        let d = dispatcher(MockRunner::new());
        let mut input: Vec<u8> = vec![0xff, 0xfe, b'\n'];
        input.extend_from_slice(b"{\"id\":1,\"method\":\"ping\"}\r\n");
        let mut out = Vec::new();
        serve(input.as_slice(), &mut out, &d).await.expect("serve");

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].get("id").is_none());
        assert_eq!(lines[1], json!({"id": 1, "result": "pong"}));
    }

    #[tokio::test]
    async fn test_response_flushed_before_next_request() {
        let (client_side, server_side) = tokio::io::duplex(4096);
        let (server_read, server_write) = tokio::io::split(server_side);
        let (client_read, mut client_write) = tokio::io::split(client_side);

        let server = tokio::spawn(async move {
            let d = dispatcher(MockRunner::new());
            serve(BufReader::new(server_read), server_write, &d).await
        });

        client_write
            .write_all(b"{\"id\":7,\"method\":\"ping\"}\n")
            .await
            .unwrap();

        // Input is still open; the response must already be readable
        let mut client_read = BufReader::new(client_read);
        let mut line = String::new();
        client_read.read_line(&mut line).await.unwrap();
        let response: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(response, json!({"id": 7, "result": "pong"}));

        // Both halves share the duplex stream, so shut the writer down to
        // signal end-of-stream
        client_write.shutdown().await.unwrap();
        let stats = server.await.unwrap().unwrap();
        assert_eq!(stats.requests, 1);
    }
}
