//! 参加者へのメッセージ送信の trait 定義
//!
//! ロビーに接続中の参加者へ状態や解放通知を送るためのインターフェース。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{
    error::{PushError, ReleaseError},
    value_object::ParticipantId,
};

/// 参加者への送信チャンネル
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[async_trait]
pub trait LobbyPusher: Send + Sync {
    /// 参加者の送信チャンネルを登録（接続中なら `PushError::AlreadyConnected`）
    async fn register_client(
        &self,
        participant_id: ParticipantId,
        sender: PusherChannel,
    ) -> Result<(), PushError>;

    /// 参加者の送信チャンネルを登録解除
    async fn unregister_client(&self, participant_id: &ParticipantId);

    /// 接続中の参加者 ID
    async fn connected_participants(&self) -> Vec<ParticipantId>;

    /// 1 人に送信
    async fn push_to(&self, participant_id: &ParticipantId, content: &str)
    -> Result<(), PushError>;

    /// 複数人に送信（一部の失敗は許容）
    async fn broadcast(
        &self,
        targets: Vec<ParticipantId>,
        content: &str,
    ) -> Result<(), PushError>;
}

/// ロビー解放時に一度実行されるアクション
///
/// 失敗時はリトライされるため、何度実行されても結果が変わらないこと。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReleaseAction: Send + Sync {
    async fn release(&self) -> Result<(), ReleaseError>;
}
