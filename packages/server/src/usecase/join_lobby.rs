//! UseCase: ロビーへの接続とハートビート
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinLobbyUseCase::execute() メソッド
//! - 接続時にプッシュ先が登録され、到着が記録されること
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規参加者の接続
//! - 異常系：同じ参加者の二重接続
//! - エッジケース：ハートビートで last_seen が更新される

use std::sync::Arc;

use tokio::sync::watch;

use crate::domain::{LobbyPusher, LobbyStatus, ParticipantId, PushError, PusherChannel};

use super::{error::JoinLobbyError, presence_tracker::LobbyPresenceTracker};

/// ロビー接続のユースケース
pub struct JoinLobbyUseCase {
    pusher: Arc<dyn LobbyPusher>,
    tracker: Arc<LobbyPresenceTracker>,
}

impl JoinLobbyUseCase {
    pub fn new(pusher: Arc<dyn LobbyPusher>, tracker: Arc<LobbyPresenceTracker>) -> Self {
        Self { pusher, tracker }
    }

    /// ロビー接続を実行
    ///
    /// # Arguments
    ///
    /// * `participant_id` - 認証済みの参加者
    /// * `sender` - 参加者へのメッセージ送信用チャンネル
    ///
    /// # Returns
    ///
    /// * `Ok(LobbyStatus)` - 接続成功（接続直後のロビーの状態）
    /// * `Err(JoinLobbyError::AlreadyConnected)` - 同じ参加者が接続中
    pub async fn execute(
        &self,
        participant_id: ParticipantId,
        sender: PusherChannel,
    ) -> Result<LobbyStatus, JoinLobbyError> {
        self.pusher
            .register_client(participant_id.clone(), sender)
            .await
            .map_err(|e| match e {
                PushError::AlreadyConnected(id) => JoinLobbyError::AlreadyConnected(id),
                other => JoinLobbyError::RegistrationFailed(other.to_string()),
            })?;

        self.tracker.record_arrival(&participant_id).await;
        Ok(self.tracker.refresh().await)
    }

    /// ハートビート（last_seen を更新）
    pub async fn heartbeat(&self, participant_id: &ParticipantId) {
        tracing::trace!("Heartbeat from '{}'", participant_id.as_str());
        self.tracker.record_arrival(participant_id).await;
    }

    /// ロビーの状態の変化を購読
    pub fn watch_status(&self) -> watch::Receiver<LobbyStatus> {
        self.tracker.subscribe()
    }
}
