//! HTTP API client.
//!
//! Talks to the quorum server's `/api/*` endpoints with `reqwest` and exposes
//! the vote endpoints through the `VoteGateway` trait used by the ballot.

use std::time::Duration;

use async_trait::async_trait;
use quorum_server::infrastructure::dto::http::{
    ErrorResponse, LoginRequest, OfferedTopicsResponse, SessionResponse, VoteRequest,
    VoteResponse,
};
use reqwest::{Response, StatusCode};

use crate::error::ClientError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Vote endpoints as seen by the ballot
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoteGateway: Send + Sync {
    /// Topics offered in the current round
    async fn offered_topics(&self) -> Result<OfferedTopicsResponse, ClientError>;

    /// Cast one vote; the response carries the refreshed listing when available
    async fn cast_vote(&self, topic_id: i64) -> Result<VoteResponse, ClientError>;
}

/// Unauthenticated API client
#[derive(Debug, Clone)]
pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    /// # Arguments
    ///
    /// * `base_url` - Server URL such as `http://127.0.0.1:8080`
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// WebSocket URL of the lobby for `access_token`
    pub fn lobby_url(&self, access_token: &str) -> String {
        let ws_base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            self.base_url.clone()
        };
        format!("{}/ws/lobby?access_token={}", ws_base, access_token)
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionResponse, ClientError> {
        let response = self
            .http
            .post(self.url("/api/login"))
            .json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(ClientError::InvalidCredentials);
        }
        Ok(response.error_for_status()?.json().await?)
    }

    pub async fn logout(&self, access_token: &str) -> Result<(), ClientError> {
        self.http
            .post(self.url("/api/logout"))
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Client bound to a signed-in session
    pub fn authorized(&self, access_token: impl Into<String>) -> AuthorizedApi {
        AuthorizedApi {
            api: self.clone(),
            access_token: access_token.into(),
        }
    }
}

/// API client carrying the session's access token
#[derive(Debug, Clone)]
pub struct AuthorizedApi {
    api: HttpApi,
    access_token: String,
}

impl AuthorizedApi {
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        self.api.logout(&self.access_token).await
    }
}

/// Message of an error response, falling back to the status text
async fn error_message(response: Response) -> String {
    let status = response.status();
    match response.json::<ErrorResponse>().await {
        Ok(body) => body.error,
        Err(_) => status.to_string(),
    }
}

#[async_trait]
impl VoteGateway for AuthorizedApi {
    async fn offered_topics(&self) -> Result<OfferedTopicsResponse, ClientError> {
        let response = self
            .api
            .http
            .get(self.api.url("/api/topics"))
            .send()
            .await?;
        Ok(response.error_for_status()?.json().await?)
    }

    async fn cast_vote(&self, topic_id: i64) -> Result<VoteResponse, ClientError> {
        let response = self
            .api
            .http
            .post(self.api.url("/api/votes"))
            .bearer_auth(&self.access_token)
            .json(&VoteRequest { topic_id })
            .send()
            .await
            .map_err(|e| ClientError::VoteFailed(e.to_string()))?;

        match response.status() {
            status if status.is_success() => response
                .json()
                .await
                .map_err(|e| ClientError::VoteFailed(e.to_string())),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::CONFLICT => {
                Err(ClientError::VoteRejected(error_message(response).await))
            }
            _ => Err(ClientError::VoteFailed(error_message(response).await)),
        }
    }
}
