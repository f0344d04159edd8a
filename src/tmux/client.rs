use std::sync::Arc;

use tracing::{debug, info, warn};

use super::approval::{ApprovalRequest, Approver, AutoApprove};
use super::parse::{
    parse_sessions, parse_window_info, parse_windows, SESSION_FORMAT, WINDOW_FORMAT,
    WINDOW_INFO_FORMAT,
};
use super::roles::{NameHeuristics, RolePolicy};
use super::runner::TmuxCommandRunner;
use super::{SessionEntry, TmuxError, TmuxWindow, WindowInfo};

/// Upper bound on lines read by a single capture unless configured otherwise
pub const DEFAULT_MAX_CAPTURE_LINES: u32 = 1000;

/// Lines captured when the caller does not say how many
pub const DEFAULT_CAPTURE_LINES: i64 = 50;

/// Client for interacting with tmux via CLI
///
/// Holds no tmux state between calls; every method reads the server afresh.
pub struct TmuxClient<R> {
    runner: R,
    max_capture_lines: u32,
    approver: Arc<dyn Approver>,
    roles: Box<dyn RolePolicy>,
}

impl<R: TmuxCommandRunner> TmuxClient<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            max_capture_lines: DEFAULT_MAX_CAPTURE_LINES,
            approver: Arc::new(AutoApprove),
            roles: Box::new(NameHeuristics),
        }
    }

    #[must_use]
    pub fn with_max_capture_lines(mut self, max: u32) -> Self {
        self.max_capture_lines = max.max(1);
        self
    }

    #[must_use]
    pub fn with_approver(mut self, approver: Arc<dyn Approver>) -> Self {
        self.approver = approver;
        self
    }

    #[must_use]
    pub fn with_role_policy(mut self, roles: Box<dyn RolePolicy>) -> Self {
        self.roles = roles;
        self
    }

    #[cfg(test)]
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// List all tmux sessions (names and attached flags only)
    pub async fn list_sessions(&self) -> Result<Vec<SessionEntry>, TmuxError> {
        match self
            .runner
            .run(&["list-sessions", "-F", SESSION_FORMAT])
            .await
        {
            Ok(stdout) => parse_sessions(&stdout),
            Err(e) if e.is_no_server() => {
                debug!("no tmux server running");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// List the windows of one session
    pub async fn list_windows(&self, session_name: &str) -> Result<Vec<TmuxWindow>, TmuxError> {
        if session_name.is_empty() {
            return Err(TmuxError::Invalid("Session name must not be empty".to_string()));
        }

        let stdout = self
            .runner
            .run(&["list-windows", "-t", session_name, "-F", WINDOW_FORMAT])
            .await
            .map_err(|e| not_found(session_name, e))?;

        parse_windows(session_name, &stdout)
    }

    /// Capture the last `lines` lines of a window
    pub async fn capture_content(
        &self,
        session_name: &str,
        window_index: i64,
        lines: i64,
    ) -> Result<String, TmuxError> {
        let target = target(session_name, window_index)?;

        if lines <= 0 {
            return Err(TmuxError::Invalid(
                "Number of lines must be positive".to_string(),
            ));
        }

        let max = i64::from(self.max_capture_lines);
        let lines = if lines > max {
            warn!(requested = lines, max, "Limiting capture to {} lines", max);
            max
        } else {
            lines
        };

        self.ensure_target(&target).await?;

        let start = format!("-{}", lines);
        self.runner
            .run(&["capture-pane", "-t", &target, "-p", "-S", &start])
            .await
    }

    /// Get detailed information about a window, including recent content
    pub async fn describe_window(
        &self,
        session_name: &str,
        window_index: i64,
    ) -> Result<WindowInfo, TmuxError> {
        let target = target(session_name, window_index)?;

        let stdout = self
            .runner
            .run(&["display-message", "-t", &target, "-p", WINDOW_INFO_FORMAT])
            .await
            .map_err(|e| not_found(&target, e))?;

        let mut info = parse_window_info(&stdout)?;
        info.content = match self
            .capture_content(session_name, window_index, DEFAULT_CAPTURE_LINES)
            .await
        {
            Ok(content) => content,
            Err(e) => {
                warn!(%target, error = %e, "capture failed while describing window");
                format!("Error: {}", e)
            }
        };

        Ok(info)
    }

    /// Send keys to a window.
    ///
    /// Returns `Ok(false)` only when confirmation was requested and declined.
    pub async fn send_keys(
        &self,
        session_name: &str,
        window_index: i64,
        keys: &str,
        require_confirmation: bool,
    ) -> Result<bool, TmuxError> {
        let target = target(session_name, window_index)?;

        if keys.is_empty() {
            return Err(TmuxError::Invalid("Cannot send empty keys".to_string()));
        }

        self.ensure_target(&target).await?;

        if require_confirmation && !self.confirm(&target, keys).await? {
            info!(%target, "send cancelled by approval policy");
            return Ok(false);
        }

        self.runner.run(&["send-keys", "-t", &target, keys]).await?;
        debug!(%target, "keys sent");
        Ok(true)
    }

    /// Send a command followed by Enter (C-m) as a second keystroke
    pub async fn send_command(
        &self,
        session_name: &str,
        window_index: i64,
        command: &str,
        require_confirmation: bool,
    ) -> Result<bool, TmuxError> {
        if command.is_empty() {
            return Err(TmuxError::Invalid("Cannot send empty command".to_string()));
        }

        if !self
            .send_keys(session_name, window_index, command, require_confirmation)
            .await?
        {
            return Ok(false);
        }

        let target = target(session_name, window_index)?;
        self.runner
            .run(&["send-keys", "-t", &target, "C-m"])
            .await
            .map_err(|e| TmuxError::PartialFailure {
                target: target.clone(),
                detail: e.to_string(),
            })?;

        Ok(true)
    }

    /// Answer a status request by echoing a role-specific status line into
    /// the window.
    ///
    /// Returns `Ok(false)` when the session or window does not exist.
    pub async fn handle_status_request(
        &self,
        session_name: &str,
        window_index: i64,
    ) -> Result<bool, TmuxError> {
        let target = target(session_name, window_index)?;

        let sessions = self.list_sessions().await?;
        if !sessions.iter().any(|s| s.name == session_name) {
            return Ok(false);
        }

        let windows = self.list_windows(session_name).await?;
        let Some(window) = windows
            .iter()
            .find(|w| i64::from(w.window_index) == window_index)
        else {
            return Ok(false);
        };

        let role = self.roles.role(&window.window_name, window.window_index);
        let timestamp = chrono::Local::now().format("%H:%M:%S").to_string();
        let status = role.status_line(&timestamp);
        info!(%target, ?role, "answering status request");

        // Cancel whatever is half-typed at the prompt
        if let Err(e) = self.runner.run(&["send-keys", "-t", &target, "C-c"]).await {
            warn!(%target, error = %e, "failed to clear prompt");
        }

        let echo = format!("echo '{}'", status);
        self.runner
            .run(&["send-keys", "-t", &target, &echo, "C-m"])
            .await?;

        Ok(true)
    }

    async fn ensure_target(&self, target: &str) -> Result<(), TmuxError> {
        self.runner
            .run(&["list-panes", "-t", target])
            .await
            .map(|_| ())
            .map_err(|e| not_found(target, e))
    }

    async fn confirm(&self, target: &str, keys: &str) -> Result<bool, TmuxError> {
        let approver = Arc::clone(&self.approver);
        let request = ApprovalRequest {
            target: target.to_string(),
            keys: keys.to_string(),
        };

        // Approvers may block on an operator, keep them off the runtime threads
        tokio::task::spawn_blocking(move || approver.approve(&request))
            .await
            .map_err(|e| TmuxError::Approval(e.to_string()))?
            .map_err(|e| TmuxError::Approval(e.to_string()))
    }
}

/// Build a `session:index` target after validating both halves
fn target(session_name: &str, window_index: i64) -> Result<String, TmuxError> {
    if session_name.is_empty() || window_index < 0 {
        return Err(TmuxError::Invalid(format!(
            "Invalid session name or window index: {}:{}",
            session_name, window_index
        )));
    }
    Ok(format!("{}:{}", session_name, window_index))
}

fn not_found(target: &str, err: TmuxError) -> TmuxError {
    match err {
        TmuxError::CommandFailed(detail) => TmuxError::TargetNotFound {
            target: target.to_string(),
            detail,
        },
        other => other,
    }
}
