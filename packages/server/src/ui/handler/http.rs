//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
};

use crate::{
    domain::{AccessToken, TopicId},
    infrastructure::dto::{
        http::{
            HealthResponse, LoginRequest, OfferedTopicsResponse, SessionResponse, VoteRequest,
            VoteResponse,
        },
        websocket::LobbyStatusDto,
    },
    ui::{error::ApiError, state::AppState},
};

/// `Authorization: Bearer <token>` を取り出す
fn bearer_token(headers: &HeaderMap) -> Result<AccessToken, ApiError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(ApiError::MissingToken)?;
    AccessToken::new(value.trim().to_string()).map_err(|_| ApiError::MissingToken)
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Sign in with email and password
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state
        .login_usecase
        .execute(&request.email, &request.password)
        .await?;
    Ok(Json(session.into()))
}

/// Sign out the bearer's session
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let token = bearer_token(&headers)?;
    state.logout_usecase.execute(&token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Current lobby status
pub async fn lobby_status(State(state): State<Arc<AppState>>) -> Json<LobbyStatusDto> {
    Json(state.tracker.status().into())
}

/// Topics offered in the current round
pub async fn list_topics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<OfferedTopicsResponse>, ApiError> {
    let offered = state.list_topics_usecase.execute().await?;
    Ok(Json(offered.into()))
}

/// Cast the bearer's vote
pub async fn cast_vote(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<VoteRequest>,
) -> Result<Json<VoteResponse>, ApiError> {
    let token = bearer_token(&headers)?;
    let session = state.authenticate_usecase.execute(&token).await?;
    let receipt = state
        .cast_vote_usecase
        .execute(&session.participant_id, TopicId::new(request.topic_id))
        .await?;
    Ok(Json(receipt.into()))
}
