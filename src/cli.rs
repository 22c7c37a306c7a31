use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{self, eyre};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::api::TwitterApiClient;
use crate::auth::credentials::load_credentials;
use crate::config::load_config;
use crate::event::{AppEvent, Event};
use crate::fetch::FriendsFetcher;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "unfriendly",
    about = "review and unfollow inactive Twitter friends"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand)]
pub enum CliCommand {
    /// Launch the interactive TUI (default)
    Tui,
    /// Fetch the friends list and print each record as JSONL
    List,
    /// Unfollow a single user by numeric id
    Unfollow {
        /// Twitter user id
        user_id: u64,
    },
}

// ---------------------------------------------------------------------------
// Client construction (shared with main.rs TUI path)
// ---------------------------------------------------------------------------

/// Build an authenticated `TwitterApiClient` from the credential sources.
/// Missing or malformed credentials are fatal.
pub fn build_api_client() -> eyre::Result<TwitterApiClient> {
    let creds = load_credentials()?;
    Ok(TwitterApiClient::new(creds))
}

// ---------------------------------------------------------------------------
// Command execution
// ---------------------------------------------------------------------------

pub async fn run_command(command: CliCommand) -> eyre::Result<()> {
    match command {
        // Handled in main; listed here so the match is total.
        CliCommand::Tui => Ok(()),
        CliCommand::List => run_list().await,
        CliCommand::Unfollow { user_id } => run_unfollow(user_id).await,
    }
}

/// Run the fetch loop headlessly and print one JSON object per friend.
async fn run_list() -> eyre::Result<()> {
    let config = load_config();
    let client = Arc::new(build_api_client()?);
    let user_name = client.user_name().to_owned();

    let (sender, mut receiver) = mpsc::unbounded_channel();
    let fetcher = FriendsFetcher::new(
        client,
        user_name,
        Duration::from_secs(config.rate_limit_backoff_secs),
        CancellationToken::new(),
        sender,
    );
    tokio::spawn(fetcher.run());

    while let Some(event) = receiver.recv().await {
        match event {
            Event::App(AppEvent::FriendFetched(record)) => {
                println!("{}", serde_json::to_string(&record)?);
            }
            Event::App(AppEvent::FetchRateLimited(message)) => {
                eprintln!("{message} (retrying)");
            }
            Event::App(AppEvent::FetchFailed(message)) => {
                return Err(eyre!(message));
            }
            Event::App(AppEvent::FetchFinished) => break,
            _ => {}
        }
    }

    Ok(())
}

async fn run_unfollow(user_id: u64) -> eyre::Result<()> {
    let client = build_api_client()?;
    let user = client.destroy_friendship(user_id).await?;
    println!("You have unfollowed '{}'.", user.screen_name);
    Ok(())
}
