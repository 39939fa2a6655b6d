//! Repository trait 定義
//!
//! ドメイン層が必要とする外部サービス（Identity / Presence Store / Vote Store / 投票台帳）の
//! インターフェースを定義します。具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::{
    ballot::{TopicFilter, TopicOrder},
    entity::{Participant, Session, Topic},
    error::{IdentityError, LedgerError, RepositoryError},
    value_object::{AccessToken, ParticipantId, RoundKey, Timestamp, TopicId},
};

/// 認証状態の変化
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(ParticipantId),
    SignedOut(ParticipantId),
}

/// Identity Boundary（ログイン、セッション発行）
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// メールアドレスとパスワードでログイン
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError>;

    /// トークンに対応する現在のセッション（なければ `None`）
    async fn current_session(&self, token: &AccessToken)
    -> Result<Option<Session>, IdentityError>;

    /// ログアウト
    async fn sign_out(&self, token: &AccessToken) -> Result<(), IdentityError>;

    /// 認証状態の変化を購読
    fn on_auth_change(&self) -> broadcast::Receiver<AuthEvent>;
}

/// Presence Store（誰がオンラインか）
///
/// 書き込みのたびに Change Notifier へ変更が通知されることを前提とする。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PresenceStore: Send + Sync {
    /// 参加者の last_seen を登録または更新
    async fn upsert(&self, id: &ParticipantId, last_seen: Timestamp)
    -> Result<(), RepositoryError>;

    /// 参加者を削除（存在しなくてもエラーにしない）
    async fn delete(&self, id: &ParticipantId) -> Result<(), RepositoryError>;

    /// 全ての行
    async fn select_all(&self) -> Result<Vec<Participant>, RepositoryError>;

    /// `older_than` より前から更新されていない行
    async fn select_stale(&self, older_than: Timestamp)
    -> Result<Vec<Participant>, RepositoryError>;
}

/// Vote Store（トピックと得票数）
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoteStore: Send + Sync {
    async fn list_topics(
        &self,
        filter: TopicFilter,
        order: TopicOrder,
    ) -> Result<Vec<Topic>, RepositoryError>;

    /// 得票数を 1 増やす（サーバー側でアトミック）
    async fn increment_vote(&self, topic_id: TopicId) -> Result<(), RepositoryError>;
}

/// 投票台帳（参加者ごと、ラウンドごとに 1 票）
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BallotLedger: Send + Sync {
    /// 投票権を確保する。同じラウンドで 2 回目なら `LedgerError::AlreadyVoted`
    async fn claim(
        &self,
        participant: &ParticipantId,
        round: RoundKey,
        topic_id: TopicId,
    ) -> Result<(), LedgerError>;

    /// 確保した投票権を取り消す（得票の加算に失敗したとき）
    async fn release(&self, participant: &ParticipantId, round: RoundKey)
    -> Result<(), LedgerError>;
}
