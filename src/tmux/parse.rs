//! Strict parsers for the colon-delimited replies of tmux `-F` formats.
//!
//! A line with the wrong number of fields or an unparsable field is an error;
//! nothing is defaulted.

use super::{SessionEntry, TmuxError, TmuxWindow, WindowInfo};

/// Format for `tmux list-sessions -F`
pub const SESSION_FORMAT: &str = "#{session_name}:#{session_attached}";

/// Format for `tmux list-windows -F`
pub const WINDOW_FORMAT: &str = "#{window_index}:#{window_name}:#{window_active}";

/// Format for `tmux display-message -p`
pub const WINDOW_INFO_FORMAT: &str =
    "#{window_name}:#{window_active}:#{window_panes}:#{window_layout}";

pub fn parse_sessions(output: &str) -> Result<Vec<SessionEntry>, TmuxError> {
    records(output, "list-sessions", 2)?
        .into_iter()
        .map(|(line_num, parts)| {
            let clients: u32 = number(parts[1], "list-sessions", line_num)?;
            Ok(SessionEntry {
                name: parts[0].to_string(),
                attached: clients > 0,
            })
        })
        .collect()
}

pub fn parse_windows(session_name: &str, output: &str) -> Result<Vec<TmuxWindow>, TmuxError> {
    records(output, "list-windows", 3)?
        .into_iter()
        .map(|(line_num, parts)| {
            Ok(TmuxWindow {
                session_name: session_name.to_string(),
                window_index: number(parts[0], "list-windows", line_num)?,
                window_name: parts[1].to_string(),
                active: flag(parts[2], "list-windows", line_num)?,
            })
        })
        .collect()
}

/// Parse the single `display-message` line; `content` is left empty.
pub fn parse_window_info(output: &str) -> Result<WindowInfo, TmuxError> {
    let mut rows = records(output, "display-message", 4)?;
    if rows.len() != 1 {
        return Err(TmuxError::Parse {
            command: "display-message",
            line_num: rows.len(),
            detail: format!("expected exactly one line, got {}", rows.len()),
        });
    }
    let (line_num, parts) = rows.remove(0);
    Ok(WindowInfo {
        name: parts[0].to_string(),
        active: flag(parts[1], "display-message", line_num)?,
        pane_count: number(parts[2], "display-message", line_num)?,
        layout: parts[3].to_string(),
        content: String::new(),
    })
}

/// Split non-blank lines into exactly `fields` colon-separated parts.
fn records<'a>(
    output: &'a str,
    command: &'static str,
    fields: usize,
) -> Result<Vec<(usize, Vec<&'a str>)>, TmuxError> {
    let mut rows = Vec::new();
    for (idx, line) in output.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split(':').collect();
        if parts.len() != fields {
            return Err(TmuxError::Parse {
                command,
                line_num: idx + 1,
                detail: format!(
                    "expected {} colon-separated fields, got {}",
                    fields,
                    parts.len()
                ),
            });
        }
        rows.push((idx + 1, parts));
    }
    Ok(rows)
}

fn number<T: std::str::FromStr>(
    field: &str,
    command: &'static str,
    line_num: usize,
) -> Result<T, TmuxError> {
    field.trim().parse().map_err(|_| TmuxError::Parse {
        command,
        line_num,
        detail: format!("'{}' is not a number", field),
    })
}

fn flag(field: &str, command: &'static str, line_num: usize) -> Result<bool, TmuxError> {
    match field.trim() {
        "1" => Ok(true),
        "0" => Ok(false),
        other => Err(TmuxError::Parse {
            command,
            line_num,
            detail: format!("'{}' is not a 0/1 flag", other),
        }),
    }
}
