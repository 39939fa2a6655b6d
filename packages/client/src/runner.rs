//! Client execution logic with reconnection support.
//!
//! login → lobby (reconnecting on connection loss) → ballot → logout

use std::{sync::Arc, time::Duration};

use crate::{
    api::{AuthorizedApi, HttpApi, VoteGateway},
    ballot::Ballot,
    domain::{should_attempt_reconnect, should_exit_immediately},
    error::ClientError,
    formatter::MessageFormatter,
    session::run_lobby_session,
    ui::{BallotCommand, LineReader, parse_command},
};

const MAX_RECONNECT_ATTEMPTS: u32 = 5;
const RECONNECT_INTERVAL_SECS: u64 = 5;
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
const PROMPT: &str = "vote> ";

/// Lobby reconnection settings
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
    pub heartbeat_interval: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RECONNECT_ATTEMPTS,
            interval: Duration::from_secs(RECONNECT_INTERVAL_SECS),
            heartbeat_interval: HEARTBEAT_INTERVAL,
        }
    }
}

/// Run the terminal client
///
/// # Arguments
///
/// * `server_url` - HTTP base URL of the server (e.g., "http://127.0.0.1:8080")
/// * `email` / `password` - Account credentials
pub async fn run_client(
    server_url: String,
    email: String,
    password: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let api = HttpApi::new(server_url)?;

    let session = api.login(&email, &password).await?;
    tracing::info!("Signed in as '{}'", session.email);
    println!("\nSigned in as {}. Waiting in the lobby...\n", session.email);

    let authorized = api.authorized(session.access_token.clone());
    let lobby_url = api.lobby_url(&session.access_token);
    let result = match wait_for_release(&lobby_url, ReconnectPolicy::default()).await {
        Ok(_) => run_ballot(Arc::new(authorized.clone())).await,
        Err(e) => Err(e),
    };

    if let Err(e) = authorized.logout().await {
        tracing::warn!("Failed to sign out: {}", e);
    }
    result.map_err(Into::into)
}

/// Stay in the lobby until it is released, reconnecting on connection loss
///
/// # Returns
///
/// The release time (Unix milliseconds)
pub async fn wait_for_release(url: &str, policy: ReconnectPolicy) -> Result<i64, ClientError> {
    let mut reconnect_count = 0;

    loop {
        tracing::info!(
            "Connecting to the lobby (attempt {}/{})",
            reconnect_count + 1,
            policy.max_attempts
        );

        match run_lobby_session(url, policy.heartbeat_interval).await {
            Ok(released_at) => return Ok(released_at),
            Err(e) => {
                if should_exit_immediately(&e) {
                    tracing::error!("{}", e);
                    return Err(e);
                }

                tracing::warn!("Connection lost: {}", e);
                reconnect_count += 1;

                if !should_attempt_reconnect(&e, reconnect_count, policy.max_attempts) {
                    tracing::error!(
                        "Failed to reconnect after {} attempts. Exiting.",
                        policy.max_attempts
                    );
                    return Err(e);
                }

                tracing::info!(
                    "Reconnecting in {:?}... (attempt {}/{})",
                    policy.interval,
                    reconnect_count + 1,
                    policy.max_attempts
                );
                tokio::time::sleep(policy.interval).await;
            }
        }
    }
}

/// Interactive ballot until the user quits or input ends
async fn run_ballot(gateway: Arc<AuthorizedApi>) -> Result<(), ClientError> {
    let offered = gateway.offered_topics().await?;
    let mut ballot = Ballot::new(gateway, offered);
    print!(
        "{}{}",
        MessageFormatter::format_offered_topics(ballot.offered(), ballot.selected()),
        MessageFormatter::format_help()
    );

    let mut reader = LineReader::spawn(PROMPT);
    while let Some(line) = reader.next_line().await {
        if line.trim().is_empty() {
            continue;
        }
        let Some(command) = parse_command(&line) else {
            println!("Unknown command '{}'. Type 'h' for help.", line.trim());
            continue;
        };

        match command {
            BallotCommand::Select(position) => {
                let Some(topic_id) = ballot.offered().topics.get(position - 1).map(|t| t.id)
                else {
                    println!("There is no topic #{}", position);
                    continue;
                };
                ballot.select(topic_id);
            }
            BallotCommand::Vote => match ballot.submit().await {
                Ok(receipt) => print!("{}", MessageFormatter::format_vote_receipt(&receipt)),
                Err(e @ ClientError::VoteFailed(_)) => {
                    println!("{} (your selection is kept)", e);
                    continue;
                }
                Err(e) => {
                    println!("{}", e);
                    continue;
                }
            },
            BallotCommand::Refresh => {
                if let Err(e) = ballot.refresh().await {
                    println!("Failed to refresh topics: {}", e);
                    continue;
                }
            }
            BallotCommand::Help => {
                print!("{}", MessageFormatter::format_help());
                continue;
            }
            BallotCommand::Quit => break,
        }

        print!(
            "{}",
            MessageFormatter::format_offered_topics(ballot.offered(), ballot.selected())
        );
    }

    Ok(())
}
