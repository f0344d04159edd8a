//! Aggregate views composed from several tmux calls.

use serde::Serialize;
use tracing::warn;

use crate::tmux::{TmuxClient, TmuxCommandRunner, TmuxError, TmuxSession, WindowInfo};

/// Content lines shown per window in a monitoring snapshot
const RECENT_LINES: usize = 10;

/// Status of every window across all sessions
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub timestamp: String,
    pub sessions: Vec<SessionStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub name: String,
    pub attached: bool,
    pub windows: Vec<WindowStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WindowStatus {
    pub index: u32,
    pub name: String,
    pub active: bool,
    pub info: WindowDetail,
}

/// A described window, or the reason it could not be described.
///
/// Failures are kept per window so one vanished window does not cost the
/// caller the rest of the report.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum WindowDetail {
    Info(WindowInfo),
    Error { error: String },
}

/// All sessions with their windows
pub async fn sessions<R: TmuxCommandRunner>(
    client: &TmuxClient<R>,
) -> Result<Vec<TmuxSession>, TmuxError> {
    let mut sessions = Vec::new();
    for entry in client.list_sessions().await? {
        let windows = client.list_windows(&entry.name).await?;
        sessions.push(TmuxSession {
            name: entry.name,
            attached: entry.attached,
            windows,
        });
    }
    Ok(sessions)
}

/// Describe every window of every session
pub async fn all_windows_status<R: TmuxCommandRunner>(
    client: &TmuxClient<R>,
) -> Result<StatusReport, TmuxError> {
    let timestamp = chrono::Local::now()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string();

    let mut report = StatusReport {
        timestamp,
        sessions: Vec::new(),
    };

    for session in sessions(client).await? {
        let mut windows = Vec::with_capacity(session.windows.len());
        for window in session.windows {
            let info = match client
                .describe_window(&session.name, i64::from(window.window_index))
                .await
            {
                Ok(info) => WindowDetail::Info(info),
                Err(e) => {
                    warn!(
                        session = %session.name,
                        window = window.window_index,
                        error = %e,
                        "could not describe window"
                    );
                    WindowDetail::Error {
                        error: format!("Could not get window info: {}", e),
                    }
                }
            };
            windows.push(WindowStatus {
                index: window.window_index,
                name: window.window_name,
                active: window.active,
                info,
            });
        }
        report.sessions.push(SessionStatus {
            name: session.name,
            attached: session.attached,
            windows,
        });
    }

    Ok(report)
}

/// Find windows whose name contains `needle`, ignoring case.
///
/// An empty needle matches every window.
pub async fn find_windows_by_name<R: TmuxCommandRunner>(
    client: &TmuxClient<R>,
    needle: &str,
) -> Result<Vec<(String, u32)>, TmuxError> {
    let needle = needle.to_lowercase();
    let mut matches = Vec::new();
    for session in sessions(client).await? {
        for window in session.windows {
            if window.window_name.to_lowercase().contains(&needle) {
                matches.push((session.name.clone(), window.window_index));
            }
        }
    }
    Ok(matches)
}

/// Fetch the status report and render it for a human reader
pub async fn monitoring_snapshot<R: TmuxCommandRunner>(
    client: &TmuxClient<R>,
) -> Result<String, TmuxError> {
    let report = all_windows_status(client).await?;
    Ok(render_snapshot(&report))
}

/// Render a status report as plain text
pub fn render_snapshot(report: &StatusReport) -> String {
    let mut out = format!("Tmux Monitoring Snapshot - {}\n", report.timestamp);
    out.push_str(&"=".repeat(50));
    out.push_str("\n\n");

    for session in &report.sessions {
        let marker = if session.attached { "ATTACHED" } else { "DETACHED" };
        out.push_str(&format!("Session: {} ({})\n", session.name, marker));
        out.push_str(&"-".repeat(30));
        out.push('\n');

        for window in &session.windows {
            out.push_str(&format!("  Window {}: {}", window.index, window.name));
            if window.active {
                out.push_str(" (ACTIVE)");
            }
            out.push('\n');

            if let WindowDetail::Info(info) = &window.info {
                out.push_str("    Recent output:\n");
                for line in recent_lines(&info.content) {
                    out.push_str(&format!("    | {}\n", line));
                }
            }
            out.push('\n');
        }
    }

    out
}

/// The last few non-blank lines of captured content
fn recent_lines(content: &str) -> Vec<&str> {
    let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
    let skip = lines.len().saturating_sub(RECENT_LINES);
    lines[skip..].to_vec()
}
