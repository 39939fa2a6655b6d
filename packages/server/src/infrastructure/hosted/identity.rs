//! ホスト型バックエンドの Identity Provider
//!
//! パスワード認証（`token?grant_type=password`）、トークンからのユーザー取得、
//! サインアウトを REST で呼び出します。認証状態の変化はこのアダプター経由の
//! サインイン・サインアウトから配信します。

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use tokio::sync::broadcast;

use crate::{
    domain::{
        AccessToken, AuthEvent, Email, IdentityError, IdentityProvider, ParticipantId, Session,
    },
    infrastructure::dto::rows::{AuthTokenResponse, AuthUser, PasswordGrant},
};

use super::client::{HostedClient, HostedError};

const AUTH_EVENT_CAPACITY: usize = 64;

pub struct HostedIdentityProvider {
    client: HostedClient,
    auth_tx: broadcast::Sender<AuthEvent>,
}

impl HostedIdentityProvider {
    pub fn new(client: HostedClient) -> Self {
        let (auth_tx, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self { client, auth_tx }
    }
}

fn to_identity_error(error: HostedError) -> IdentityError {
    match error.status() {
        Some(StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
            IdentityError::InvalidCredentials
        }
        _ => IdentityError::Unavailable(error.to_string()),
    }
}

/// `fallback_email` はユーザー情報にメールアドレスがない場合に使う
fn to_session(
    user: AuthUser,
    fallback_email: Option<&str>,
    token: String,
) -> Result<Session, IdentityError> {
    let participant_id =
        ParticipantId::new(user.id).map_err(|e| IdentityError::Unavailable(e.to_string()))?;
    let email = user
        .email
        .or_else(|| fallback_email.map(str::to_string))
        .map(Email::new)
        .transpose()
        .map_err(|e| IdentityError::Unavailable(e.to_string()))?;
    let access_token =
        AccessToken::new(token).map_err(|e| IdentityError::Unavailable(e.to_string()))?;
    Ok(Session {
        participant_id,
        email,
        access_token,
    })
}

#[async_trait]
impl IdentityProvider for HostedIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let request = self
            .client
            .auth(Method::POST, "token")
            .query(&[("grant_type", "password")])
            .json(&PasswordGrant {
                email: email.to_string(),
                password: password.to_string(),
            });
        let response = self
            .client
            .send(request)
            .await
            .map_err(to_identity_error)?;
        let body: AuthTokenResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        let session = to_session(body.user, Some(email), body.access_token)?;
        let _ = self
            .auth_tx
            .send(AuthEvent::SignedIn(session.participant_id.clone()));
        Ok(session)
    }

    async fn current_session(
        &self,
        token: &AccessToken,
    ) -> Result<Option<Session>, IdentityError> {
        let request = self
            .client
            .auth(Method::GET, "user")
            .bearer_auth(token.as_str());
        let response = match self.client.send(request).await {
            Ok(response) => response,
            Err(e)
                if matches!(
                    e.status(),
                    Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
                ) =>
            {
                return Ok(None);
            }
            Err(e) => return Err(IdentityError::Unavailable(e.to_string())),
        };
        let user: AuthUser = response
            .json()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        to_session(user, None, token.as_str().to_string()).map(Some)
    }

    async fn sign_out(&self, token: &AccessToken) -> Result<(), IdentityError> {
        let session = self
            .current_session(token)
            .await?
            .ok_or(IdentityError::InvalidSession)?;

        let request = self
            .client
            .auth(Method::POST, "logout")
            .bearer_auth(token.as_str());
        self.client.send(request).await.map_err(|e| match e.status() {
            Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => IdentityError::InvalidSession,
            _ => IdentityError::Unavailable(e.to_string()),
        })?;

        let _ = self
            .auth_tx
            .send(AuthEvent::SignedOut(session.participant_id));
        Ok(())
    }

    fn on_auth_change(&self) -> broadcast::Receiver<AuthEvent> {
        self.auth_tx.subscribe()
    }
}
