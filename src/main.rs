use anyhow::{bail, Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tokio::io::BufReader;
use tracing::info;

mod actions;
mod config;
mod dispatch;
mod error;
mod legacy;
mod rpc;
mod snapshot;
mod tmux;

use config::{Cli, Command, Settings};
use dispatch::Dispatcher;
use tmux::{TmuxClient, TmuxExecutor};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging. stdout carries responses, so logs go to stderr.
    let level = if cli.debug {
        tracing::Level::DEBUG
    } else if cli.is_single_shot() {
        tracing::Level::WARN
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let mut settings = Settings::load(cli.config.as_deref())?;
    settings.merge_cli(&cli);
    settings.validate();

    let executor = TmuxExecutor::new(settings.tmux_bin.clone())
        .with_socket_name(settings.socket_name.clone())
        .with_socket_path(settings.socket_path.clone());

    // Detect a missing tmux once, not on every request
    let version = executor
        .version()
        .await
        .context("tmux is not installed or not accessible")?;
    info!(%version, "found tmux");

    let client = TmuxClient::new(executor)
        .with_max_capture_lines(settings.max_capture_lines)
        .with_approver(settings.approval.approver());
    let dispatcher = Dispatcher::new(client);

    match cli.command {
        Some(Command::Call(ref raw)) => {
            let response = legacy::run_once(&dispatcher, raw).await;
            println!(
                "{}",
                serde_json::to_string(&response).context("Failed to encode response")?
            );
            Ok(if response.is_error() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Some(Command::Serve) | None => {
            // A blocking operator prompt would stall every queued request
            if settings.approval.is_interactive() {
                bail!("--approval prompt is only available for single calls, not in serve mode");
            }

            info!(
                max_capture_lines = settings.max_capture_lines,
                approval = ?settings.approval,
                "serving requests on stdin"
            );
            let reader = BufReader::new(tokio::io::stdin());
            rpc::serve(reader, tokio::io::stdout(), &dispatcher).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
