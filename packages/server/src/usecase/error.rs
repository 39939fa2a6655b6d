//! UseCase 層のエラー型

use thiserror::Error;

use crate::domain::{IdentityError, RepositoryError, TopicId};

/// ログインのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

impl From<IdentityError> for LoginError {
    fn from(error: IdentityError) -> Self {
        match error {
            IdentityError::InvalidCredentials | IdentityError::InvalidSession => {
                Self::InvalidCredentials
            }
            IdentityError::Unavailable(reason) => Self::Unavailable(reason),
        }
    }
}

/// セッション確認・ログアウトのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session is not valid")]
    InvalidSession,

    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

impl From<IdentityError> for SessionError {
    fn from(error: IdentityError) -> Self {
        match error {
            IdentityError::InvalidCredentials | IdentityError::InvalidSession => {
                Self::InvalidSession
            }
            IdentityError::Unavailable(reason) => Self::Unavailable(reason),
        }
    }
}

/// ロビー接続のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinLobbyError {
    #[error("participant '{0}' is already connected to the lobby")]
    AlreadyConnected(String),

    #[error("failed to register participant: {0}")]
    RegistrationFailed(String),
}

/// トピック一覧取得のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListTopicsError {
    #[error("voting is not open until the lobby is released")]
    LobbyNotReleased,

    #[error("vote store unavailable: {0}")]
    Store(#[from] RepositoryError),
}

/// 投票のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CastVoteError {
    #[error("voting is not open until the lobby is released")]
    LobbyNotReleased,

    #[error("no topics are open for voting")]
    NoOpenRound,

    #[error("topic {0} is not offered in the current round")]
    TopicNotOffered(TopicId),

    #[error("already voted in this round")]
    AlreadyVoted,

    #[error("vote could not be recorded: {0}")]
    Unavailable(String),
}

impl CastVoteError {
    /// 同じ選択のまま再送してよいか
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl From<ListTopicsError> for CastVoteError {
    fn from(error: ListTopicsError) -> Self {
        match error {
            ListTopicsError::LobbyNotReleased => Self::LobbyNotReleased,
            ListTopicsError::Store(e) => Self::Unavailable(e.to_string()),
        }
    }
}
