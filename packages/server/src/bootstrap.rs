//! Composition root.
//!
//! バックエンド（インメモリ / ホスト型）を選び、UseCase とバックグラウンドタスクを組み立てます。
//! 依存はすべてここで生成して注入し、グローバルな状態は持ちません。

use std::{path::Path, sync::Arc};

use quorum_shared::time::Clock;
use thiserror::Error;

use crate::{
    config::LobbyConfig,
    domain::{BallotLedger, ChangeNotifier, IdentityProvider, PresenceStore, Topic, VoteStore},
    infrastructure::{
        dto::rows::TopicRow,
        hosted::{
            HostedBallotLedger, HostedClient, HostedConfig, HostedIdentityProvider,
            HostedPresenceStore, HostedVoteStore, RealtimeChangeNotifier, client::HostedError,
        },
        memory::{
            AccountCredential, InMemoryBallotLedger, InMemoryChangeNotifier,
            InMemoryIdentityProvider, InMemoryPresenceStore, InMemoryVoteStore,
        },
        message_pusher::{PushReleaseAction, WebSocketLobbyPusher},
    },
    ui::AppState,
    usecase::{
        AuthenticateUseCase, BackgroundTask, CastVoteUseCase, JoinLobbyUseCase, LeaveLobbyUseCase,
        ListTopicsUseCase, LobbyPresenceTracker, LoginUseCase, LogoutUseCase, PresenceWatcher,
        StalePresencePruner,
    },
};

/// 起動時の失敗
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to read topics file: {0}")]
    ReadTopics(#[from] std::io::Error),

    #[error("failed to parse topics file: {0}")]
    ParseTopics(#[from] serde_json::Error),

    #[error("failed to create backend client: {0}")]
    Hosted(#[from] HostedError),
}

/// 外部サービス境界の実装一式
#[derive(Clone)]
pub struct Backend {
    pub identity: Arc<dyn IdentityProvider>,
    pub presence: Arc<dyn PresenceStore>,
    pub notifier: Arc<dyn ChangeNotifier>,
    pub votes: Arc<dyn VoteStore>,
    pub ledger: Arc<dyn BallotLedger>,
}

impl Backend {
    /// インメモリ実装（Presence Store の変更は同じ Notifier に流れる）
    pub fn in_memory(accounts: Vec<AccountCredential>, topics: Vec<Topic>) -> Self {
        let notifier = Arc::new(InMemoryChangeNotifier::new());
        Self {
            identity: Arc::new(InMemoryIdentityProvider::new(accounts)),
            presence: Arc::new(InMemoryPresenceStore::with_notifier(notifier.clone())),
            notifier,
            votes: Arc::new(InMemoryVoteStore::new(topics)),
            ledger: Arc::new(InMemoryBallotLedger::new()),
        }
    }

    /// ホスト型バックエンド
    pub fn hosted(config: HostedConfig) -> Result<Self, BootstrapError> {
        let client = HostedClient::new(config.clone())?;
        Ok(Self {
            identity: Arc::new(HostedIdentityProvider::new(client.clone())),
            presence: Arc::new(HostedPresenceStore::new(client.clone())),
            notifier: Arc::new(RealtimeChangeNotifier::new(&config)),
            votes: Arc::new(HostedVoteStore::new(client.clone())),
            ledger: Arc::new(HostedBallotLedger::new(client)),
        })
    }
}

/// トピック定義ファイル（`topics` テーブルの行と同じ形の JSON 配列）を読み込む
pub async fn load_topics(path: &Path) -> Result<Vec<Topic>, BootstrapError> {
    let contents = tokio::fs::read_to_string(path).await?;
    parse_topics(&contents)
}

fn parse_topics(contents: &str) -> Result<Vec<Topic>, BootstrapError> {
    let rows: Vec<TopicRow> = serde_json::from_str(contents)?;
    Ok(rows.into_iter().map(Topic::from).collect())
}

/// UseCase を組み立て、バックグラウンドタスクを起動する
///
/// Initialize dependencies in order:
/// 1. MessagePusher and ReleaseAction
/// 2. LobbyPresenceTracker
/// 3. UseCases
/// 4. Background tasks (presence watcher, stale presence pruner, auth listener)
pub fn build_state(
    config: &LobbyConfig,
    backend: Backend,
    clock: Arc<dyn Clock>,
) -> (Arc<AppState>, Vec<BackgroundTask>) {
    // 1. MessagePusher (WebSocket implementation)
    let pusher = Arc::new(WebSocketLobbyPusher::new());
    let release_action = Arc::new(PushReleaseAction::new(pusher.clone(), clock.clone()));

    // 2. Tracker
    let tracker = LobbyPresenceTracker::new(config, backend.presence, release_action, clock);

    // 3. UseCases
    let list_topics_usecase =
        ListTopicsUseCase::new(backend.votes.clone(), tracker.clone(), config.topics_per_round);
    let logout_usecase = LogoutUseCase::new(backend.identity.clone(), tracker.clone());

    // 4. Background tasks
    let tasks = vec![
        PresenceWatcher::new(backend.notifier, tracker.clone(), config).spawn(),
        StalePresencePruner::new(tracker.clone(), config.heartbeat_interval).spawn(),
        logout_usecase.spawn_auth_listener(),
    ];

    let state = Arc::new(AppState {
        login_usecase: Arc::new(LoginUseCase::new(backend.identity.clone(), tracker.clone())),
        logout_usecase: Arc::new(logout_usecase),
        authenticate_usecase: Arc::new(AuthenticateUseCase::new(backend.identity)),
        join_lobby_usecase: Arc::new(JoinLobbyUseCase::new(pusher.clone(), tracker.clone())),
        leave_lobby_usecase: Arc::new(LeaveLobbyUseCase::new(pusher, tracker.clone())),
        cast_vote_usecase: Arc::new(CastVoteUseCase::new(
            list_topics_usecase.clone(),
            backend.votes,
            backend.ledger,
        )),
        list_topics_usecase: Arc::new(list_topics_usecase),
        tracker,
    });

    (state, tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RoundKey, TopicId};

    #[test]
    fn test_parse_topics_fills_defaults() {
        // テスト項目: トピック定義の省略項目は既定値で補われる
        // given (前提条件):
        let contents = r#"[
            {"id": 1, "title": "Dragons", "round_key": 1, "eligible": true},
            {"id": 2, "title": "Pirates", "proposed_by": "bob", "round_key": 2, "level": 3, "votes": 4, "eligible": true, "finalized": true}
        ]"#;

        // when (操作):
        let topics = parse_topics(contents).unwrap();

        // then (期待する結果):
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[0].id, TopicId::new(1));
        assert_eq!(topics[0].votes, 0);
        assert!(!topics[0].finalized);
        assert_eq!(topics[1].round_key, RoundKey::new(2));
        assert_eq!(topics[1].votes, 4);
        assert!(topics[1].finalized);
    }

    #[test]
    fn test_parse_topics_rejects_malformed_file() {
        // テスト項目: JSON 配列でなければエラー
        // given (前提条件):
        let contents = r#"{"id": 1}"#;

        // when (操作):
        let result = parse_topics(contents);

        // then (期待する結果):
        assert!(matches!(result, Err(BootstrapError::ParseTopics(_))));
    }

    #[tokio::test]
    async fn test_build_state_wires_in_memory_backend() {
        // テスト項目: インメモリのバックエンドで組み立てたロビーは Waiting から始まる
        // given (前提条件):
        let config = LobbyConfig::new(2).unwrap();
        let backend = Backend::in_memory(
            vec!["alice@example.com:secret".parse().unwrap()],
            Vec::new(),
        );

        // when (操作):
        let (state, tasks) =
            build_state(&config, backend, Arc::new(quorum_shared::time::SystemClock));

        // then (期待する結果):
        assert_eq!(tasks.len(), 3);
        assert_eq!(state.tracker.status().state, crate::domain::LobbyState::Waiting);
        let session = state
            .login_usecase
            .execute("alice@example.com", "secret")
            .await
            .unwrap();
        assert_eq!(session.email.unwrap().as_str(), "alice@example.com");
    }
}
