//! Row DTOs of the hosted backend.
//!
//! `TopicRow` doubles as the format of the topic seed file used by the in-memory backend.

use serde::{Deserialize, Serialize};

/// `online_users` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineUserRow {
    pub user_id: String,
    /// RFC 3339
    pub last_ping: String,
}

/// `topics` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRow {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub proposed_by: String,
    pub round_key: i64,
    #[serde(default)]
    pub level: i32,
    /// Missing tally reads as 0
    #[serde(default)]
    pub votes: Option<i64>,
    #[serde(default)]
    pub eligible: bool,
    #[serde(default)]
    pub finalized: bool,
}

/// `ballots` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotRow {
    pub participant_id: String,
    pub round_key: i64,
    pub topic_id: i64,
}

/// Body of the `add_vote` RPC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddVoteParams {
    pub topic_id: i64,
}

/// Password grant request of the auth endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordGrant {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Token response of the auth endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokenResponse {
    pub access_token: String,
    pub user: AuthUser,
}
