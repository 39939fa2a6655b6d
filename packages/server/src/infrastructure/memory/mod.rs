//! インメモリ実装
//!
//! 外部サービス境界（Identity / Presence Store / Change Notifier / Vote Store / 投票台帳）の
//! テストダブル。ローカルでの動作確認にもそのまま使えます。

pub mod identity;
pub mod ledger;
pub mod notifier;
pub mod presence;
pub mod votes;

pub use identity::{AccountCredential, InMemoryIdentityProvider};
pub use ledger::InMemoryBallotLedger;
pub use notifier::InMemoryChangeNotifier;
pub use presence::InMemoryPresenceStore;
pub use votes::InMemoryVoteStore;
