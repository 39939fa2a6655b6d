//! Quorum lobby and voting server.
//!
//! Participants sign in, wait in the lobby until enough of them are online,
//! and then vote on the topics offered for the current round.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin quorum-server -- --quorum-size 4 \
//!     --account alice@example.com:secret --account bob@example.com:secret \
//!     --topics demos/topics.json
//! QUORUM_BACKEND_API_KEY=... cargo run --bin quorum-server -- --quorum-size 4 \
//!     --backend hosted --backend-url https://project.example.co
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::{Parser, ValueEnum};
use quorum_server::{
    bootstrap::{self, Backend},
    config::LobbyConfig,
    infrastructure::{hosted::HostedConfig, memory::AccountCredential},
    ui::Server,
};
use quorum_shared::{logger::setup_logger, time::SystemClock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendKind {
    /// Accounts and topics given on the command line, kept in memory
    Memory,
    /// Hosted auth, REST and realtime backend
    Hosted,
}

#[derive(Parser, Debug)]
#[command(name = "quorum-server")]
#[command(about = "Presence-gated lobby and topic voting server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Number of online participants required to release the lobby
    #[arg(short = 'q', long)]
    quorum_size: usize,

    /// Seconds the quorum must hold before the lobby is released
    #[arg(long, default_value = "5")]
    grace_seconds: u64,

    /// Seconds between client heartbeats and stale presence sweeps
    #[arg(long, default_value = "5")]
    heartbeat_seconds: u64,

    /// Seconds without a heartbeat before a participant counts as offline
    #[arg(long, default_value = "15")]
    staleness_seconds: u64,

    /// Number of topics offered per round
    #[arg(long, default_value = "3")]
    topics_per_round: usize,

    /// Backend holding identities, presence and votes
    #[arg(long, value_enum, default_value_t = BackendKind::Memory)]
    backend: BackendKind,

    /// Account for the memory backend, as `email:password` (repeatable)
    #[arg(long = "account")]
    accounts: Vec<AccountCredential>,

    /// JSON file with the topics for the memory backend
    #[arg(long)]
    topics: Option<PathBuf>,

    /// Base URL of the hosted backend
    #[arg(long, required_if_eq("backend", "hosted"))]
    backend_url: Option<String>,

    /// API key of the hosted backend
    #[arg(long, env = "QUORUM_BACKEND_API_KEY", hide_env_values = true)]
    backend_api_key: Option<String>,
}

impl Args {
    fn lobby_config(&self) -> Result<LobbyConfig, Box<dyn std::error::Error>> {
        let config = LobbyConfig::new(self.quorum_size)?
            .with_grace_delay(Duration::from_secs(self.grace_seconds))
            .with_heartbeat_interval(Duration::from_secs(self.heartbeat_seconds))
            .with_staleness_window(Duration::from_secs(self.staleness_seconds))
            .with_topics_per_round(self.topics_per_round)
            .validate()?;
        Ok(config)
    }

    async fn backend(&self) -> Result<Backend, Box<dyn std::error::Error>> {
        match self.backend {
            BackendKind::Memory => {
                let topics = match &self.topics {
                    Some(path) => bootstrap::load_topics(path).await?,
                    None => Vec::new(),
                };
                if self.accounts.is_empty() {
                    tracing::warn!("No accounts configured; nobody will be able to sign in");
                }
                tracing::info!(
                    "Memory backend with {} account(s) and {} topic(s)",
                    self.accounts.len(),
                    topics.len()
                );
                Ok(Backend::in_memory(self.accounts.clone(), topics))
            }
            BackendKind::Hosted => {
                let url = self
                    .backend_url
                    .clone()
                    .ok_or("--backend-url is required for the hosted backend")?;
                let api_key = self
                    .backend_api_key
                    .clone()
                    .ok_or("QUORUM_BACKEND_API_KEY is required for the hosted backend")?;
                tracing::info!("Hosted backend at {}", url);
                Ok(Backend::hosted(HostedConfig::new(url, api_key))?)
            }
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize dependencies in order:
    // 1. Configuration
    // 2. Backend
    // 3. UseCases and background tasks
    // 4. Server
    let config = args.lobby_config()?;
    tracing::info!(
        "Lobby opens at {} participant(s) after a {:?} grace delay",
        config.quorum_size.value(),
        config.grace_delay
    );
    let backend = args.backend().await?;
    let (state, tasks) = bootstrap::build_state(&config, backend, Arc::new(SystemClock));

    Server::new(state, tasks).run(args.host, args.port).await
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    if let Err(e) = run(args).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
