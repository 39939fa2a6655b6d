//! Terminal client for the quorum lobby.
//!
//! Signs in, waits in the lobby until enough participants are online, then
//! lets you pick and vote for one of the offered topics.
//! Reconnects to the lobby on disconnection (max 5 attempts with 5 second interval).
//! A second connection for the same account is rejected by the server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin quorum-client -- --email alice@example.com --password secret
//! QUORUM_PASSWORD=secret cargo run --bin quorum-client -- -e bob@example.com -s http://127.0.0.1:3000
//! ```

use clap::Parser;

use quorum_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "quorum-client")]
#[command(about = "Terminal client for the quorum lobby and topic vote", long_about = None)]
struct Args {
    /// Account email
    #[arg(short = 'e', long)]
    email: String,

    /// Account password
    #[arg(short = 'P', long, env = "QUORUM_PASSWORD", hide_env_values = true)]
    password: String,

    /// Server URL
    #[arg(short = 's', long, default_value = "http://127.0.0.1:8080")]
    server: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "warn");

    let args = Args::parse();

    if let Err(e) = quorum_client::run_client(args.server, args.email, args.password).await {
        tracing::error!("Client error: {}", e);
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
