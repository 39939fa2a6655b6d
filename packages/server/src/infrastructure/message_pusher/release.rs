//! 解放アクション: 接続中の全参加者へ `lobby-released` を送信
//!
//! クライアントは重複した `lobby-released` を無視するため、何度実行してもよい。

use std::sync::Arc;

use async_trait::async_trait;
use quorum_shared::time::Clock;

use crate::{
    domain::{LobbyPusher, ReleaseAction, ReleaseError},
    infrastructure::dto::websocket::LobbyServerMessage,
};

/// 接続中の参加者を投票画面へ進める ReleaseAction 実装
pub struct PushReleaseAction {
    pusher: Arc<dyn LobbyPusher>,
    clock: Arc<dyn Clock>,
}

impl PushReleaseAction {
    pub fn new(pusher: Arc<dyn LobbyPusher>, clock: Arc<dyn Clock>) -> Self {
        Self { pusher, clock }
    }
}

#[async_trait]
impl ReleaseAction for PushReleaseAction {
    async fn release(&self) -> Result<(), ReleaseError> {
        let message = LobbyServerMessage::LobbyReleased {
            released_at: self.clock.now_millis(),
        };
        let json =
            serde_json::to_string(&message).map_err(|e| ReleaseError::Failed(e.to_string()))?;

        let targets = self.pusher.connected_participants().await;
        tracing::info!("Sending lobby-released to {} participants", targets.len());
        self.pusher
            .broadcast(targets, &json)
            .await
            .map_err(|e| ReleaseError::Failed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::ParticipantId, infrastructure::message_pusher::WebSocketLobbyPusher};
    use quorum_shared::time::FixedClock;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_release_notifies_every_connection() {
        // テスト項目: 接続中の全参加者に lobby-released が届く
        // given (前提条件):
        let pusher = Arc::new(WebSocketLobbyPusher::new());
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        pusher
            .register_client(ParticipantId::new("alice".to_string()).unwrap(), tx1)
            .await
            .unwrap();
        pusher
            .register_client(ParticipantId::new("bob".to_string()).unwrap(), tx2)
            .await
            .unwrap();
        let action = PushReleaseAction::new(pusher, Arc::new(FixedClock::new(42)));

        // when (操作):
        let result = action.release().await;

        // then (期待する結果):
        assert!(result.is_ok());
        let expected = r#"{"type":"lobby-released","released_at":42}"#.to_string();
        assert_eq!(rx1.recv().await, Some(expected.clone()));
        assert_eq!(rx2.recv().await, Some(expected));
    }
}
