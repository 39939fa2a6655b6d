//! ドメイン層
//!
//! ロビーの状態機械、投票の選択ルール、外部サービス境界の trait を定義します。
//! 外部サービスや非同期ランタイムのタイマーには依存しません。

pub mod ballot;
pub mod entity;
pub mod error;
pub mod lobby;
pub mod notifier;
pub mod presence;
pub mod pusher;
pub mod repository;
pub mod value_object;

pub use ballot::{OfferedTopics, TopicFilter, TopicOrder, VoteSelection, offer_round, visible_topics};
pub use entity::{Participant, Session, Topic};
pub use error::{
    IdentityError, LedgerError, NotifierError, PushError, ReleaseError, RepositoryError,
    ValueObjectError,
};
pub use lobby::{GateAction, LobbyState, LobbyStatus, QuorumGate};
pub use notifier::{ChangeEvent, ChangeFeed, ChangeKind, ChangeNotifier, SubscriptionHandle};
pub use presence::PresenceSnapshot;
pub use pusher::{LobbyPusher, PusherChannel, ReleaseAction};
pub use repository::{AuthEvent, BallotLedger, IdentityProvider, PresenceStore, VoteStore};
pub use value_object::{
    AccessToken, Email, ParticipantId, QuorumSize, RoundKey, Timestamp, TopicId,
};
