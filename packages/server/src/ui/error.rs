//! API error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    infrastructure::dto::http::ErrorResponse,
    usecase::{CastVoteError, JoinLobbyError, ListTopicsError, LoginError, SessionError},
};

/// Errors returned by the HTTP and WebSocket handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing or malformed access token")]
    MissingToken,

    #[error(transparent)]
    Login(#[from] LoginError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    JoinLobby(#[from] JoinLobbyError),

    #[error(transparent)]
    ListTopics(#[from] ListTopicsError),

    #[error(transparent)]
    CastVote(#[from] CastVoteError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingToken => StatusCode::UNAUTHORIZED,
            Self::Login(LoginError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            Self::Login(LoginError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Session(SessionError::InvalidSession) => StatusCode::UNAUTHORIZED,
            Self::Session(SessionError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::JoinLobby(JoinLobbyError::AlreadyConnected(_)) => StatusCode::CONFLICT,
            Self::JoinLobby(JoinLobbyError::RegistrationFailed(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::ListTopics(ListTopicsError::LobbyNotReleased) => StatusCode::CONFLICT,
            Self::ListTopics(ListTopicsError::Store(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::CastVote(error) => match error {
                CastVoteError::TopicNotOffered(_) => StatusCode::BAD_REQUEST,
                CastVoteError::LobbyNotReleased
                | CastVoteError::NoOpenRound
                | CastVoteError::AlreadyVoted => StatusCode::CONFLICT,
                CastVoteError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!("Request failed with {}: {}", status, self);
        } else {
            tracing::debug!("Request rejected with {}: {}", status, self);
        }

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
