use thiserror::Error;

/// Failures of the tmux adapter.
#[derive(Debug, Error)]
pub enum TmuxError {
    /// Arguments rejected before tmux was invoked
    #[error("{0}")]
    Invalid(String),

    #[error("failed to run tmux: {0}")]
    Io(#[from] std::io::Error),

    #[error("tmux command failed: {0}")]
    CommandFailed(String),

    #[error("tmux target '{target}' does not exist: {detail}")]
    TargetNotFound { target: String, detail: String },

    #[error("unexpected {command} output on line {line_num}: {detail}")]
    Parse {
        command: &'static str,
        line_num: usize,
        detail: String,
    },

    #[error("sent text to {target} but the submit keystroke failed: {detail}")]
    PartialFailure { target: String, detail: String },

    #[error("approval prompt failed: {0}")]
    Approval(String),
}

impl TmuxError {
    /// True when tmux reported that no server (and so no session) exists.
    ///
    /// A socket that is missing counts as no server. Any other connect
    /// failure, such as a permission error or a dead socket, does not.
    pub fn is_no_server(&self) -> bool {
        match self {
            TmuxError::CommandFailed(msg) => {
                msg.contains("no server running")
                    || msg.contains("no sessions")
                    || (msg.contains("error connecting to")
                        && msg.contains("No such file or directory"))
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_server_detection() {
        let failed = |msg: &str| TmuxError::CommandFailed(msg.to_string());

        assert!(failed("exit code 1: no server running on /tmp/tmux-0/default").is_no_server());
        assert!(failed(
            "exit code 1: error connecting to /tmp/tmux-0/default (No such file or directory)"
        )
        .is_no_server());

        assert!(!failed(
            "exit code 1: error connecting to /tmp/tmux-0/default (Permission denied)"
        )
        .is_no_server());
        assert!(!failed(
            "exit code 1: error connecting to /tmp/tmux-0/default (Connection refused)"
        )
        .is_no_server());
        assert!(!TmuxError::Invalid("no server running".to_string()).is_no_server());
    }
}
