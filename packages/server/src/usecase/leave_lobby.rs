//! UseCase: ロビーからの切断

use std::sync::Arc;

use crate::domain::{LobbyPusher, ParticipantId};

use super::presence_tracker::LobbyPresenceTracker;

/// ロビー切断のユースケース
pub struct LeaveLobbyUseCase {
    pusher: Arc<dyn LobbyPusher>,
    tracker: Arc<LobbyPresenceTracker>,
}

impl LeaveLobbyUseCase {
    pub fn new(pusher: Arc<dyn LobbyPusher>, tracker: Arc<LobbyPresenceTracker>) -> Self {
        Self { pusher, tracker }
    }

    /// 切断を実行（プッシュ先の登録解除と離脱の記録）
    pub async fn execute(&self, participant_id: &ParticipantId) {
        self.pusher.unregister_client(participant_id).await;
        self.tracker.record_departure(participant_id).await;
        tracing::info!("Participant '{}' left the lobby", participant_id.as_str());
    }
}
