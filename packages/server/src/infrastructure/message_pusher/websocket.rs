//! WebSocket を使った LobbyPusher 実装
//!
//! ## 責務
//!
//! - 接続中の参加者ごとの `UnboundedSender` を管理
//! - 参加者へのメッセージ送信（push_to, broadcast）
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された sender を受け取り、送信にだけ使います。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{LobbyPusher, ParticipantId, PushError, PusherChannel};

/// WebSocket を使った LobbyPusher 実装
///
/// 1 参加者につき接続は 1 本まで。
#[derive(Default)]
pub struct WebSocketLobbyPusher {
    /// 参加者 ID → WebSocket sender
    clients: Mutex<HashMap<ParticipantId, PusherChannel>>,
}

impl WebSocketLobbyPusher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LobbyPusher for WebSocketLobbyPusher {
    async fn register_client(
        &self,
        participant_id: ParticipantId,
        sender: PusherChannel,
    ) -> Result<(), PushError> {
        let mut clients = self.clients.lock().await;
        // 閉じた接続の残骸は上書きしてよい
        if clients
            .get(&participant_id)
            .is_some_and(|existing| !existing.is_closed())
        {
            return Err(PushError::AlreadyConnected(
                participant_id.as_str().to_string(),
            ));
        }
        tracing::debug!("Participant '{}' registered", participant_id.as_str());
        clients.insert(participant_id, sender);
        Ok(())
    }

    async fn unregister_client(&self, participant_id: &ParticipantId) {
        self.clients.lock().await.remove(participant_id);
        tracing::debug!("Participant '{}' unregistered", participant_id.as_str());
    }

    async fn connected_participants(&self) -> Vec<ParticipantId> {
        let mut ids: Vec<ParticipantId> = self.clients.lock().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    async fn push_to(
        &self,
        participant_id: &ParticipantId,
        content: &str,
    ) -> Result<(), PushError> {
        let clients = self.clients.lock().await;
        let sender = clients
            .get(participant_id)
            .ok_or_else(|| PushError::ParticipantNotFound(participant_id.as_str().to_string()))?;
        sender
            .send(content.to_string())
            .map_err(|e| PushError::PushFailed(e.to_string()))?;
        tracing::debug!("Pushed message to '{}'", participant_id.as_str());
        Ok(())
    }

    async fn broadcast(
        &self,
        targets: Vec<ParticipantId>,
        content: &str,
    ) -> Result<(), PushError> {
        let clients = self.clients.lock().await;

        for target in targets {
            match clients.get(&target) {
                // ブロードキャストでは一部の送信失敗を許容
                Some(sender) => {
                    if let Err(e) = sender.send(content.to_string()) {
                        tracing::warn!("Failed to push message to '{}': {}", target.as_str(), e);
                    }
                }
                None => tracing::warn!(
                    "Participant '{}' not found during broadcast, skipping",
                    target.as_str()
                ),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn id(value: &str) -> ParticipantId {
        ParticipantId::new(value.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_push_to_registered_participant() {
        // テスト項目: 登録済みの参加者にメッセージを送信できる
        // given (前提条件):
        let pusher = WebSocketLobbyPusher::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        pusher.register_client(id("alice"), tx).await.unwrap();

        // when (操作):
        let result = pusher.push_to(&id("alice"), "Hello").await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(rx.recv().await, Some("Hello".to_string()));
    }

    #[tokio::test]
    async fn test_push_to_unknown_participant() {
        // テスト項目: 未登録の参加者への送信はエラーを返す
        // given (前提条件):
        let pusher = WebSocketLobbyPusher::new();

        // when (操作):
        let result = pusher.push_to(&id("nobody"), "Hello").await;

        // then (期待する結果):
        assert!(matches!(result, Err(PushError::ParticipantNotFound(_))));
    }

    #[tokio::test]
    async fn test_register_rejects_live_duplicate() {
        // テスト項目: 接続中の参加者の二重登録は拒否、閉じた接続なら上書きできる
        // given (前提条件):
        let pusher = WebSocketLobbyPusher::new();
        let (tx1, rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();
        let (tx3, mut rx3) = mpsc::unbounded_channel();
        pusher.register_client(id("alice"), tx1).await.unwrap();

        // when (操作):
        let duplicate = pusher.register_client(id("alice"), tx2).await;
        drop(rx1);
        let after_close = pusher.register_client(id("alice"), tx3).await;

        // then (期待する結果):
        assert_eq!(
            duplicate,
            Err(PushError::AlreadyConnected("alice".to_string()))
        );
        assert!(after_close.is_ok());
        pusher.push_to(&id("alice"), "again").await.unwrap();
        assert_eq!(rx3.recv().await, Some("again".to_string()));
    }

    #[tokio::test]
    async fn test_broadcast_tolerates_missing_participants() {
        // テスト項目: ブロードキャスト時、一部の参加者が存在しなくても成功する
        // given (前提条件):
        let pusher = WebSocketLobbyPusher::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        pusher.register_client(id("alice"), tx1).await.unwrap();
        pusher.register_client(id("bob"), tx2).await.unwrap();

        // when (操作):
        let targets = vec![id("alice"), id("bob"), id("ghost")];
        let result = pusher.broadcast(targets, "Released").await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(rx1.recv().await, Some("Released".to_string()));
        assert_eq!(rx2.recv().await, Some("Released".to_string()));
        assert_eq!(
            pusher.connected_participants().await,
            vec![id("alice"), id("bob")]
        );
    }
}
