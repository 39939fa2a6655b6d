//! UseCase: ログイン
//!
//! メールアドレスとパスワードでサインインし、参加者をオンラインとして記録します。
//! 資格情報の誤りは利用者に表示するだけで、自動リトライはしません。

use std::sync::Arc;

use crate::domain::{Email, IdentityProvider, Session};

use super::{error::LoginError, presence_tracker::LobbyPresenceTracker};

/// ログインのユースケース
pub struct LoginUseCase {
    identity: Arc<dyn IdentityProvider>,
    tracker: Arc<LobbyPresenceTracker>,
}

impl LoginUseCase {
    pub fn new(identity: Arc<dyn IdentityProvider>, tracker: Arc<LobbyPresenceTracker>) -> Self {
        Self { identity, tracker }
    }

    /// ログインを実行
    ///
    /// # Returns
    ///
    /// * `Ok(Session)` - サインイン成功（到着も記録済み）
    /// * `Err(LoginError::InvalidCredentials)` - メール形式の誤り、資格情報の誤り
    /// * `Err(LoginError::Unavailable)` - Identity Provider に到達できない
    pub async fn execute(&self, email: &str, password: &str) -> Result<Session, LoginError> {
        // 形式が誤っているメールは問い合わせるまでもなく失敗
        let email = Email::new(email.to_string()).map_err(|_| LoginError::InvalidCredentials)?;

        let session = self.identity.sign_in(email.as_str(), password).await?;
        tracing::info!(
            "Participant '{}' logged in",
            session.participant_id.as_str()
        );

        self.tracker.record_arrival(&session.participant_id).await;
        Ok(session)
    }
}
