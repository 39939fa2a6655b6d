//! Error types for the terminal client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Email or password rejected at login
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Another lobby connection for the same participant is open
    #[error("This account is already connected to the lobby")]
    AlreadyConnected,

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Submit without a selected topic
    #[error("Select a topic before voting")]
    NothingSelected,

    /// The server refused the vote (already voted, topic no longer offered, ...)
    #[error("Vote rejected: {0}")]
    VoteRejected(String),

    /// The vote could not be recorded; the selection is kept and the vote may be retried
    #[error("Vote failed, try again: {0}")]
    VoteFailed(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
