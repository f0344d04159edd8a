use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::actions::Action;
use crate::error::RpcError;
use crate::snapshot;
use crate::tmux::{TmuxClient, TmuxCommandRunner};

/// Maps method calls onto tmux operations
pub struct Dispatcher<R> {
    client: TmuxClient<R>,
}

impl<R: TmuxCommandRunner> Dispatcher<R> {
    pub fn new(client: TmuxClient<R>) -> Self {
        Self { client }
    }

    #[cfg(test)]
    pub fn client(&self) -> &TmuxClient<R> {
        &self.client
    }

    /// Validate and run one call. Nothing reaches tmux unless the method
    /// and its arguments are valid.
    pub async fn dispatch(&self, method: &str, args: &[Value]) -> Result<Value, RpcError> {
        let action = Action::parse(method, args)?;
        debug!(?action, "dispatching");
        self.execute(action).await
    }

    async fn execute(&self, action: Action) -> Result<Value, RpcError> {
        let client = &self.client;
        match action {
            Action::Ping => Ok(Value::String("pong".to_string())),
            Action::ListSessions => to_value(snapshot::sessions(client).await?),
            Action::ListWindows { session } => to_value(client.list_windows(&session).await?),
            Action::CaptureWindowContent {
                session,
                index,
                lines,
            } => to_value(client.capture_content(&session, index, lines).await?),
            Action::GetWindowInfo { session, index } => {
                to_value(client.describe_window(&session, index).await?)
            }
            Action::SendKeys {
                session,
                index,
                keys,
                confirm,
            } => to_value(client.send_keys(&session, index, &keys, confirm).await?),
            Action::SendCommand {
                session,
                index,
                command,
                confirm,
            } => to_value(
                client
                    .send_command(&session, index, &command, confirm)
                    .await?,
            ),
            Action::GetAllWindowsStatus => to_value(snapshot::all_windows_status(client).await?),
            Action::FindWindowByName { name } => {
                to_value(snapshot::find_windows_by_name(client, &name).await?)
            }
            Action::CreateMonitoringSnapshot => {
                to_value(snapshot::monitoring_snapshot(client).await?)
            }
            Action::HandleStatusRequest { session, index } => {
                to_value(client.handle_status_request(&session, index).await?)
            }
        }
    }
}

fn to_value<T: Serialize>(result: T) -> Result<Value, RpcError> {
    serde_json::to_value(result).map_err(|e| RpcError::Encode(e.to_string()))
}
