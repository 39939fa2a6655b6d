//! Shared application state.

use std::sync::Arc;

use crate::usecase::{
    AuthenticateUseCase, CastVoteUseCase, JoinLobbyUseCase, LeaveLobbyUseCase,
    ListTopicsUseCase, LobbyPresenceTracker, LoginUseCase, LogoutUseCase,
};

/// Shared application state
pub struct AppState {
    /// LoginUseCase（ログインのユースケース）
    pub login_usecase: Arc<LoginUseCase>,
    /// LogoutUseCase（ログアウトのユースケース）
    pub logout_usecase: Arc<LogoutUseCase>,
    /// AuthenticateUseCase（アクセストークン確認のユースケース）
    pub authenticate_usecase: Arc<AuthenticateUseCase>,
    /// JoinLobbyUseCase（ロビー接続のユースケース）
    pub join_lobby_usecase: Arc<JoinLobbyUseCase>,
    /// LeaveLobbyUseCase（ロビー切断のユースケース）
    pub leave_lobby_usecase: Arc<LeaveLobbyUseCase>,
    /// ListTopicsUseCase（トピック一覧のユースケース）
    pub list_topics_usecase: Arc<ListTopicsUseCase>,
    /// CastVoteUseCase（投票のユースケース）
    pub cast_vote_usecase: Arc<CastVoteUseCase>,
    /// ロビーの状態の参照用
    pub tracker: Arc<LobbyPresenceTracker>,
}
