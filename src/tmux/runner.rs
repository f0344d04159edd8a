use std::future::Future;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::TmuxError;

/// Executes one tmux command and returns its stdout.
///
/// Every adapter operation goes through this seam so tests can swap in a
/// recording mock instead of a real tmux server. Implementations may write
/// `async fn run`; the returned future must be `Send`.
pub trait TmuxCommandRunner {
    fn run(&self, args: &[&str]) -> impl Future<Output = Result<String, TmuxError>> + Send;
}

/// Runs tmux as a child process
pub struct TmuxExecutor {
    /// Path to tmux binary
    tmux_path: String,
    socket_name: Option<String>,
    socket_path: Option<String>,
}

impl TmuxExecutor {
    pub fn new(tmux_path: impl Into<String>) -> Self {
        Self {
            tmux_path: tmux_path.into(),
            socket_name: None,
            socket_path: None,
        }
    }

    #[must_use]
    pub fn with_socket_name(mut self, name: Option<String>) -> Self {
        self.socket_name = name;
        self
    }

    #[must_use]
    pub fn with_socket_path(mut self, path: Option<String>) -> Self {
        self.socket_path = path;
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.tmux_path);
        // An explicit socket path wins over a socket name
        if let Some(ref path) = self.socket_path {
            cmd.args(["-S", path]);
        } else if let Some(ref name) = self.socket_name {
            cmd.args(["-L", name]);
        }
        cmd
    }

    /// Check that the tmux binary can be executed at all
    pub async fn version(&self) -> Result<String, TmuxError> {
        let output = Command::new(&self.tmux_path)
            .arg("-V")
            .stdin(Stdio::null())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TmuxError::CommandFailed(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Default for TmuxExecutor {
    fn default() -> Self {
        Self::new("tmux")
    }
}

impl TmuxCommandRunner for TmuxExecutor {
    async fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
        debug!(?args, "running tmux");
        let output = self
            .command()
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TmuxError::CommandFailed(format!(
                "exit code {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// Canned tmux replies keyed by the joined argument list.
    ///
    /// Exact replies win over prefix replies. Commands with no canned reply
    /// fail the way tmux does for a missing target. Every call is recorded.
    #[derive(Default)]
    pub struct MockRunner {
        replies: HashMap<String, Result<String, String>>,
        prefixes: Vec<(String, Result<String, String>)>,
        log: Mutex<Vec<Vec<String>>>,
    }

    impl MockRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reply(mut self, args: &[&str], stdout: &str) -> Self {
            self.replies.insert(args.join(" "), Ok(stdout.to_string()));
            self
        }

        pub fn fail(mut self, args: &[&str], stderr: &str) -> Self {
            self.replies.insert(args.join(" "), Err(stderr.to_string()));
            self
        }

        /// Reply to every command whose leading arguments are `args`
        pub fn reply_prefix(mut self, args: &[&str], stdout: &str) -> Self {
            self.prefixes.push((args.join(" "), Ok(stdout.to_string())));
            self
        }

        /// One attached session "main" with an active window 0 named "shell".
        pub fn single_session() -> Self {
            Self::new()
                .reply(
                    &["list-sessions", "-F", "#{session_name}:#{session_attached}"],
                    "main:1\n",
                )
                .reply(
                    &[
                        "list-windows",
                        "-t",
                        "main",
                        "-F",
                        "#{window_index}:#{window_name}:#{window_active}",
                    ],
                    "0:shell:1\n",
                )
                .reply(&["list-panes", "-t", "main:0"], "0: [80x24]\n")
        }

        pub fn calls(&self) -> Vec<Vec<String>> {
            self.log.lock().unwrap().clone()
        }

        pub fn calls_to(&self, subcommand: &str) -> usize {
            self.calls()
                .iter()
                .filter(|c| c.first().map(String::as_str) == Some(subcommand))
                .count()
        }
    }

    impl TmuxCommandRunner for MockRunner {
        async fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
            self.log
                .lock()
                .unwrap()
                .push(args.iter().map(|a| a.to_string()).collect());
            let joined = args.join(" ");
            let canned = self.replies.get(&joined).or_else(|| {
                self.prefixes
                    .iter()
                    .find(|(prefix, _)| {
                        joined == *prefix || joined.starts_with(&format!("{prefix} "))
                    })
                    .map(|(_, reply)| reply)
            });
            match canned {
                Some(Ok(stdout)) => Ok(stdout.clone()),
                Some(Err(stderr)) => Err(TmuxError::CommandFailed(stderr.clone())),
                None => Err(TmuxError::CommandFailed(format!(
                    "exit code 1: can't find target for {joined}"
                ))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_executor() {
        let exec = TmuxExecutor::default();
        assert_eq!(exec.tmux_path, "tmux");
        assert!(exec.socket_name.is_none());
        assert!(exec.socket_path.is_none());
    }

    #[test]
    fn socket_options_are_kept() {
        let exec = TmuxExecutor::default()
            .with_socket_name(Some("agents".to_string()))
            .with_socket_path(Some("/tmp/agents.sock".to_string()));
        assert_eq!(exec.socket_name.as_deref(), Some("agents"));
        assert_eq!(exec.socket_path.as_deref(), Some("/tmp/agents.sock"));
    }

    #[tokio::test]
    async fn missing_binary_is_io_error() {
        let exec = TmuxExecutor::new("/nonexistent/tmux-binary");
        let err = exec.version().await.unwrap_err();
        assert!(matches!(err, TmuxError::Io(_)));
    }
}
