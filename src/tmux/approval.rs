use std::io::{BufRead, Write};
use std::sync::Arc;

use serde::Deserialize;

/// A keystroke injection waiting for approval
#[derive(Debug, Clone)]
pub struct ApprovalRequest {
    /// tmux target, `session:index`
    pub target: String,
    pub keys: String,
}

/// Decides whether a confirmation-gated send may go ahead.
///
/// Only consulted when the caller asked for confirmation.
pub trait Approver: Send + Sync {
    fn approve(&self, request: &ApprovalRequest) -> std::io::Result<bool>;
}

/// Approves everything. Used by the unattended RPC loop.
pub struct AutoApprove;

impl Approver for AutoApprove {
    fn approve(&self, _request: &ApprovalRequest) -> std::io::Result<bool> {
        Ok(true)
    }
}

/// Declines everything.
pub struct AlwaysDeny;

impl Approver for AlwaysDeny {
    fn approve(&self, _request: &ApprovalRequest) -> std::io::Result<bool> {
        Ok(false)
    }
}

/// Asks the operator on stderr and reads the answer from stdin.
///
/// Blocks until a line arrives, so it only suits the single-shot entry where
/// stdin is not carrying protocol traffic.
pub struct OperatorPrompt;

impl Approver for OperatorPrompt {
    fn approve(&self, request: &ApprovalRequest) -> std::io::Result<bool> {
        let mut stderr = std::io::stderr().lock();
        writeln!(
            stderr,
            "SAFETY CHECK: About to send '{}' to {}",
            request.keys, request.target
        )?;
        write!(stderr, "Confirm? (yes/no): ")?;
        stderr.flush()?;

        let mut answer = String::new();
        std::io::stdin().lock().read_line(&mut answer)?;
        Ok(answer.trim().eq_ignore_ascii_case("yes"))
    }
}

/// Which approver to install, as named in config and on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalMode {
    #[default]
    Auto,
    Deny,
    Prompt,
}

impl ApprovalMode {
    pub fn is_interactive(self) -> bool {
        matches!(self, ApprovalMode::Prompt)
    }

    pub fn approver(self) -> Arc<dyn Approver> {
        match self {
            ApprovalMode::Auto => Arc::new(AutoApprove),
            ApprovalMode::Deny => Arc::new(AlwaysDeny),
            ApprovalMode::Prompt => Arc::new(OperatorPrompt),
        }
    }
}
