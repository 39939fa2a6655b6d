//! ドメイン層のエラー型
//!
//! 値オブジェクトの検証エラーと、外部サービス境界（Repository trait 群）が返すエラーを定義します。

use thiserror::Error;

/// 値オブジェクトの生成失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    /// 参加者 ID が空
    #[error("participant id must not be empty")]
    ParticipantIdEmpty,

    /// 参加者 ID が長すぎる
    #[error("participant id must be at most {max} characters (got {actual})")]
    ParticipantIdTooLong { max: usize, actual: usize },

    /// メールアドレスの形式が不正
    #[error("invalid email address: '{0}'")]
    InvalidEmail(String),

    /// アクセストークンが空
    #[error("access token must not be empty")]
    AccessTokenEmpty,

    /// クォーラムサイズが 0
    #[error("quorum size must be at least 1")]
    QuorumSizeZero,
}

/// データストア（Presence Store / Vote Store）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// 外部サービスに到達できない、またはエラー応答
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// 応答の行を解釈できない
    #[error("malformed row: {0}")]
    Malformed(String),

    /// 対象が存在しない
    #[error("not found: {0}")]
    NotFound(String),
}

/// Identity Boundary のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// メールアドレスまたはパスワードが違う
    #[error("invalid credentials")]
    InvalidCredentials,

    /// セッションが無効
    #[error("session is not valid")]
    InvalidSession,

    /// 外部サービスに到達できない
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Change Notifier のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifierError {
    /// 購読の確立に失敗
    #[error("failed to subscribe to '{table}': {reason}")]
    SubscribeFailed { table: String, reason: String },
}

/// 投票台帳のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// 同じラウンドで既に投票済み
    #[error("participant '{0}' already voted in this round")]
    AlreadyVoted(String),

    /// 外部サービスに到達できない
    #[error("ballot ledger unavailable: {0}")]
    Unavailable(String),
}

/// メッセージ通知のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushError {
    /// 同じ参加者が既に接続中
    #[error("participant '{0}' is already connected")]
    AlreadyConnected(String),

    /// 登録されていない参加者
    #[error("participant '{0}' is not connected")]
    ParticipantNotFound(String),

    /// 送信失敗
    #[error("push failed: {0}")]
    PushFailed(String),
}

/// ロビー解放アクションのエラー（リトライ対象）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReleaseError {
    #[error("release failed: {0}")]
    Failed(String),
}
