//! UseCase: アクセストークンの確認

use std::sync::Arc;

use crate::domain::{AccessToken, IdentityProvider, Session};

use super::error::SessionError;

/// アクセストークンからセッションを引くユースケース
pub struct AuthenticateUseCase {
    identity: Arc<dyn IdentityProvider>,
}

impl AuthenticateUseCase {
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
        Self { identity }
    }

    pub async fn execute(&self, token: &AccessToken) -> Result<Session, SessionError> {
        self.identity
            .current_session(token)
            .await?
            .ok_or(SessionError::InvalidSession)
    }
}
