//! ホスト型バックエンドのアダプター
//!
//! - `client`: REST 呼び出しの共通部分（`apikey` ヘッダー、ステータスの解釈）
//! - `identity`: `{base}/auth/v1` を使った Identity Provider
//! - `presence`: `online_users` テーブルの Presence Store
//! - `votes`: `topics` テーブル、`add_vote` RPC、`ballots` テーブル
//! - `realtime`: Phoenix チャンネルを使った Change Notifier

pub mod client;
pub mod identity;
pub mod presence;
pub mod realtime;
pub mod votes;

pub use client::{HostedClient, HostedConfig};
pub use identity::HostedIdentityProvider;
pub use presence::HostedPresenceStore;
pub use realtime::RealtimeChangeNotifier;
pub use votes::{HostedBallotLedger, HostedVoteStore};

#[cfg(test)]
pub(crate) mod fake;
