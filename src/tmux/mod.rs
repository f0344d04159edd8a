mod approval;
mod client;
mod error;
mod parse;
mod roles;
mod runner;

pub use approval::ApprovalMode;
pub use client::{TmuxClient, DEFAULT_CAPTURE_LINES, DEFAULT_MAX_CAPTURE_LINES};
pub use error::TmuxError;
pub use runner::{TmuxCommandRunner, TmuxExecutor};

#[cfg(test)]
pub(crate) use runner::mock::MockRunner;

use serde::Serialize;

/// A session as listed by `tmux list-sessions`, before its windows are read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEntry {
    /// Session name, unique per tmux server
    pub name: String,
    /// Whether at least one client is attached
    pub attached: bool,
}

/// Represents a tmux session together with its windows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TmuxSession {
    pub name: String,
    pub attached: bool,
    pub windows: Vec<TmuxWindow>,
}

/// Represents a tmux window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TmuxWindow {
    /// Name of the owning session
    pub session_name: String,
    /// Index, unique within the session
    pub window_index: u32,
    pub window_name: String,
    /// tmux keeps at most one active window per session
    pub active: bool,
}

/// Detail of one window, with recently captured content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowInfo {
    pub name: String,
    pub active: bool,
    pub pane_count: u32,
    pub layout: String,
    /// Captured text, or an `Error: ...` line when capture failed
    pub content: String,
}
