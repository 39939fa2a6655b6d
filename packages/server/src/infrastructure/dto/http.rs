//! HTTP API request/response DTOs.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResponse {
    pub participant_id: String,
    pub email: String,
    pub access_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicDto {
    pub id: i64,
    pub title: String,
    pub proposed_by: String,
    pub round_key: i64,
    pub level: i32,
    pub votes: u64,
}

/// Topics offered in the current round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferedTopicsResponse {
    /// `None` when no topic is open for voting
    pub round: Option<i64>,
    pub topics: Vec<TopicDto>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRequest {
    pub topic_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteResponse {
    pub topic_id: i64,
    pub round: i64,
    /// Refreshed listing, absent when the refresh failed
    #[serde(default)]
    pub offered: Option<OfferedTopicsResponse>,
}

/// Error body of every non-2xx response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
