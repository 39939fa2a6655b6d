//! UseCase 層
//!
//! ドメインのポート（trait）を組み合わせてアプリケーションの操作を実装します。

pub mod authenticate;
pub mod cast_vote;
pub mod error;
pub mod join_lobby;
pub mod leave_lobby;
pub mod list_topics;
pub mod login;
pub mod logout;
pub mod presence_tracker;
pub mod presence_watcher;
pub mod prune_stale;
pub mod task;

pub use authenticate::AuthenticateUseCase;
pub use cast_vote::{CastVoteUseCase, VoteReceipt};
pub use error::{CastVoteError, JoinLobbyError, ListTopicsError, LoginError, SessionError};
pub use join_lobby::JoinLobbyUseCase;
pub use leave_lobby::LeaveLobbyUseCase;
pub use list_topics::ListTopicsUseCase;
pub use login::LoginUseCase;
pub use logout::LogoutUseCase;
pub use presence_tracker::LobbyPresenceTracker;
pub use presence_watcher::PresenceWatcher;
pub use prune_stale::StalePresencePruner;
pub use task::BackgroundTask;
