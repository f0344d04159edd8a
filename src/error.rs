use thiserror::Error;

use crate::tmux::TmuxError;

/// Every failure a request can end in. All of them become the `error`
/// string of a response.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Bad arguments, rejected before tmux is touched
    #[error("{0}")]
    Validation(String),

    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error(transparent)]
    Adapter(TmuxError),

    /// The request line itself could not be understood
    #[error("Invalid request: {0}")]
    Protocol(String),

    #[error("failed to encode result: {0}")]
    Encode(String),
}

impl From<TmuxError> for RpcError {
    fn from(err: TmuxError) -> Self {
        match err {
            TmuxError::Invalid(msg) => RpcError::Validation(msg),
            other => RpcError::Adapter(other),
        }
    }
}
