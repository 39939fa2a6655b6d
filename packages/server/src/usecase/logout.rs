//! UseCase: ログアウトとサインアウトイベントの監視
//!
//! 明示的なログアウトに加え、Identity Provider 側で発生したサインアウト
//! （別タブでのログアウト、セッション失効）でも参加者をオフラインにします。

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;

use crate::domain::{AccessToken, AuthEvent, IdentityProvider};

use super::{error::SessionError, presence_tracker::LobbyPresenceTracker, task::BackgroundTask};

/// ログアウトのユースケース
pub struct LogoutUseCase {
    identity: Arc<dyn IdentityProvider>,
    tracker: Arc<LobbyPresenceTracker>,
}

impl LogoutUseCase {
    pub fn new(identity: Arc<dyn IdentityProvider>, tracker: Arc<LobbyPresenceTracker>) -> Self {
        Self { identity, tracker }
    }

    /// ログアウトを実行
    ///
    /// セッションを確認してからサインアウトし、離脱を記録する。
    pub async fn execute(&self, token: &AccessToken) -> Result<(), SessionError> {
        let session = self
            .identity
            .current_session(token)
            .await?
            .ok_or(SessionError::InvalidSession)?;

        self.identity.sign_out(token).await?;
        self.tracker.record_departure(&session.participant_id).await;

        tracing::info!(
            "Participant '{}' logged out",
            session.participant_id.as_str()
        );
        Ok(())
    }

    /// サインアウトイベントを監視し、離脱を記録するタスクを起動
    pub fn spawn_auth_listener(&self) -> BackgroundTask {
        let mut events = self.identity.on_auth_change();
        let tracker = Arc::clone(&self.tracker);

        BackgroundTask::spawn("auth-listener", async move {
            loop {
                match events.recv().await {
                    Ok(AuthEvent::SignedOut(participant_id)) => {
                        tracker.record_departure(&participant_id).await;
                    }
                    Ok(AuthEvent::SignedIn(_)) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Auth listener lagged, {} events skipped", skipped);
                    }
                    Err(RecvError::Closed) => {
                        tracing::debug!("Auth event stream closed");
                        return;
                    }
                }
            }
        })
    }
}
