pub mod api;
pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod event;
pub mod fetch;
pub mod store;
pub mod ui;

use std::sync::Arc;

use app::App;
use clap::Parser;
use cli::{Cli, CliCommand};
use config::load_config;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    // Initialize tracing (logs to stderr if RUST_LOG is set).
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        // No subcommand or explicit `tui` → launch the interactive TUI.
        None | Some(CliCommand::Tui) => run_tui().await,
        // Other subcommands → non-interactive output.
        Some(cmd) => cli::run_command(cmd).await,
    }
}

/// Launch the interactive TUI.
async fn run_tui() -> color_eyre::Result<()> {
    let config = load_config();

    // Missing or malformed credentials are fatal; there is nothing to show
    // without an authenticated session.
    let api_client = Arc::new(cli::build_api_client()?);
    tracing::info!(user = api_client.user_name(), "session initialized");

    let terminal = ratatui::init();
    let result = App::new(config, api_client).run(terminal).await;
    ratatui::restore();
    result
}
