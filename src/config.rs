use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::tmux::{ApprovalMode, DEFAULT_MAX_CAPTURE_LINES};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Line-delimited JSON RPC bridge to tmux")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Upper bound on lines read by one capture
    #[arg(long, global = true, env = "TMUX_RPC_MAX_CAPTURE_LINES")]
    pub max_capture_lines: Option<u32>,

    /// tmux binary to run
    #[arg(long, global = true, env = "TMUX_RPC_TMUX_BIN")]
    pub tmux_bin: Option<String>,

    /// tmux socket name (tmux -L)
    #[arg(short = 'L', long, global = true)]
    pub socket_name: Option<String>,

    /// tmux socket path (tmux -S), wins over --socket-name
    #[arg(short = 'S', long, global = true)]
    pub socket_path: Option<String>,

    /// How confirmation-gated sends are approved
    #[arg(long, value_enum, global = true)]
    pub approval: Option<ApprovalMode>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Answer requests from stdin until it closes (the default)
    Serve,
    /// Any other word is a method name: run it once and exit
    #[command(external_subcommand)]
    Call(Vec<String>),
}

impl Cli {
    pub fn is_single_shot(&self) -> bool {
        matches!(self.command, Some(Command::Call(_)))
    }
}

/// Settings from the config file, overridden by the command line
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Upper bound on lines read by one capture
    pub max_capture_lines: u32,
    pub tmux_bin: String,
    pub socket_name: Option<String>,
    pub socket_path: Option<String>,
    pub approval: ApprovalMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_capture_lines: DEFAULT_MAX_CAPTURE_LINES,
            tmux_bin: "tmux".to_string(),
            socket_name: None,
            socket_path: None,
            approval: ApprovalMode::Auto,
        }
    }
}

impl Settings {
    /// Load settings from the given file, a default location, or defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(p) = path {
            return Self::load_from(p);
        }

        let default_paths = [
            dirs::config_dir().map(|p| p.join("tmux-rpc/config.toml")),
            dirs::home_dir().map(|p| p.join(".tmux-rpc.toml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                return Self::load_from(path);
            }
        }

        Ok(Self::default())
    }

    fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Merge CLI arguments into settings (CLI takes precedence)
    pub fn merge_cli(&mut self, cli: &Cli) {
        if let Some(max) = cli.max_capture_lines {
            self.max_capture_lines = max;
        }
        if let Some(ref bin) = cli.tmux_bin {
            self.tmux_bin = bin.clone();
        }
        if cli.socket_name.is_some() {
            self.socket_name = cli.socket_name.clone();
        }
        if cli.socket_path.is_some() {
            self.socket_path = cli.socket_path.clone();
        }
        if let Some(mode) = cli.approval {
            self.approval = mode;
        }
    }

    pub fn validate(&mut self) {
        if self.max_capture_lines == 0 {
            self.max_capture_lines = 1;
        }
    }
}
