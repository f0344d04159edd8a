use serde_json::Value;

use crate::error::RpcError;
use crate::tmux::DEFAULT_CAPTURE_LINES;

/// Methods understood by the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Ping,
    ListSessions,
    ListWindows,
    CaptureWindowContent,
    GetWindowInfo,
    SendKeysToWindow,
    SendCommandToWindow,
    GetAllWindowsStatus,
    FindWindowByName,
    CreateMonitoringSnapshot,
    HandleStatusRequest,
}

impl Method {
    /// Resolve a method name. The snake_case names of the old one-shot
    /// wrapper are accepted as well.
    pub fn from_name(name: &str) -> Option<Self> {
        let method = match name {
            "ping" => Method::Ping,
            "listSessions" | "get_tmux_sessions" => Method::ListSessions,
            "listWindows" | "list_windows" => Method::ListWindows,
            "captureWindowContent" | "capture_window_content" => Method::CaptureWindowContent,
            "getWindowInfo" | "get_window_info" => Method::GetWindowInfo,
            "sendKeysToWindow" | "send_keys_to_window" => Method::SendKeysToWindow,
            "sendCommandToWindow" | "send_command_to_window" => Method::SendCommandToWindow,
            "getAllWindowsStatus" | "get_all_windows_status" => Method::GetAllWindowsStatus,
            "findWindowByName" | "find_window_by_name" => Method::FindWindowByName,
            "createMonitoringSnapshot" | "create_monitoring_snapshot" => {
                Method::CreateMonitoringSnapshot
            }
            "handleStatusRequest" | "handle_status_request" => Method::HandleStatusRequest,
            _ => return None,
        };
        Some(method)
    }

    pub fn name(self) -> &'static str {
        match self {
            Method::Ping => "ping",
            Method::ListSessions => "listSessions",
            Method::ListWindows => "listWindows",
            Method::CaptureWindowContent => "captureWindowContent",
            Method::GetWindowInfo => "getWindowInfo",
            Method::SendKeysToWindow => "sendKeysToWindow",
            Method::SendCommandToWindow => "sendCommandToWindow",
            Method::GetAllWindowsStatus => "getAllWindowsStatus",
            Method::FindWindowByName => "findWindowByName",
            Method::CreateMonitoringSnapshot => "createMonitoringSnapshot",
            Method::HandleStatusRequest => "handleStatusRequest",
        }
    }

    /// (required, optional) positional argument counts
    fn arity(self) -> (usize, usize) {
        match self {
            Method::Ping
            | Method::ListSessions
            | Method::GetAllWindowsStatus
            | Method::CreateMonitoringSnapshot => (0, 0),
            Method::ListWindows | Method::FindWindowByName => (1, 0),
            Method::GetWindowInfo | Method::HandleStatusRequest => (2, 0),
            Method::CaptureWindowContent => (2, 1),
            Method::SendKeysToWindow | Method::SendCommandToWindow => (3, 1),
        }
    }
}

/// A fully validated request, ready to run against tmux
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Ping,
    ListSessions,
    ListWindows {
        session: String,
    },
    CaptureWindowContent {
        session: String,
        index: i64,
        lines: i64,
    },
    GetWindowInfo {
        session: String,
        index: i64,
    },
    SendKeys {
        session: String,
        index: i64,
        keys: String,
        confirm: bool,
    },
    SendCommand {
        session: String,
        index: i64,
        command: String,
        confirm: bool,
    },
    GetAllWindowsStatus,
    FindWindowByName {
        name: String,
    },
    CreateMonitoringSnapshot,
    HandleStatusRequest {
        session: String,
        index: i64,
    },
}

impl Action {
    /// Validate a method name and its positional arguments.
    ///
    /// Argument counts are checked before any argument is coerced.
    pub fn parse(method_name: &str, args: &[Value]) -> Result<Self, RpcError> {
        let method = Method::from_name(method_name)
            .ok_or_else(|| RpcError::UnknownMethod(method_name.to_string()))?;

        let (required, optional) = method.arity();
        if args.len() < required {
            return Err(RpcError::Validation(format!(
                "Missing arguments for {}: expected {}, got {}",
                method.name(),
                required,
                args.len()
            )));
        }
        if args.len() > required + optional {
            return Err(RpcError::Validation(format!(
                "Too many arguments for {}: expected at most {}, got {}",
                method.name(),
                required + optional,
                args.len()
            )));
        }

        let action = match method {
            Method::Ping => Action::Ping,
            Method::ListSessions => Action::ListSessions,
            Method::ListWindows => Action::ListWindows {
                session: session(&args[0])?,
            },
            Method::CaptureWindowContent => Action::CaptureWindowContent {
                session: session(&args[0])?,
                index: integer(&args[1], "window index")?,
                lines: match args.get(2) {
                    Some(v) => integer(v, "line count")?,
                    None => DEFAULT_CAPTURE_LINES,
                },
            },
            Method::GetWindowInfo => Action::GetWindowInfo {
                session: session(&args[0])?,
                index: integer(&args[1], "window index")?,
            },
            Method::SendKeysToWindow => Action::SendKeys {
                session: session(&args[0])?,
                index: integer(&args[1], "window index")?,
                keys: text(&args[2], "keys")?,
                confirm: confirm(args.get(3))?,
            },
            Method::SendCommandToWindow => Action::SendCommand {
                session: session(&args[0])?,
                index: integer(&args[1], "window index")?,
                command: text(&args[2], "command")?,
                confirm: confirm(args.get(3))?,
            },
            Method::GetAllWindowsStatus => Action::GetAllWindowsStatus,
            Method::FindWindowByName => Action::FindWindowByName {
                name: text(&args[0], "window name")?,
            },
            Method::CreateMonitoringSnapshot => Action::CreateMonitoringSnapshot,
            Method::HandleStatusRequest => Action::HandleStatusRequest {
                session: session(&args[0])?,
                index: integer(&args[1], "window index")?,
            },
        };

        Ok(action)
    }
}

/// Session names may arrive as numbers when argv was JSON-parsed
fn session(value: &Value) -> Result<String, RpcError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(RpcError::Validation(format!(
            "session name must be a string, got {}",
            other
        ))),
    }
}

fn integer(value: &Value, what: &str) -> Result<i64, RpcError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| RpcError::Validation(format!("{} must be an integer, got {}", what, value)))
}

fn text(value: &Value, what: &str) -> Result<String, RpcError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(RpcError::Validation(format!(
            "{} must be a string, got {}",
            what, other
        ))),
    }
}

fn confirm(value: Option<&Value>) -> Result<bool, RpcError> {
    match value {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(RpcError::Validation(format!(
            "confirmation flag must be a boolean, got {}",
            other
        ))),
    }
}
