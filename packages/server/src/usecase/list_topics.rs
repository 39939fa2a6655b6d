//! UseCase: 投票対象トピックの取得
//!
//! ロビーが解放されるまでは投票画面に入れないため、一覧も返しません。

use std::sync::Arc;

use crate::domain::{LobbyState, OfferedTopics, TopicFilter, TopicOrder, VoteStore, offer_round};

use super::{error::ListTopicsError, presence_tracker::LobbyPresenceTracker};

/// 現在のラウンドのトピックを取得するユースケース
#[derive(Clone)]
pub struct ListTopicsUseCase {
    vote_store: Arc<dyn VoteStore>,
    tracker: Arc<LobbyPresenceTracker>,
    topics_per_round: usize,
}

impl ListTopicsUseCase {
    pub fn new(
        vote_store: Arc<dyn VoteStore>,
        tracker: Arc<LobbyPresenceTracker>,
        topics_per_round: usize,
    ) -> Self {
        Self {
            vote_store,
            tracker,
            topics_per_round,
        }
    }

    pub async fn execute(&self) -> Result<OfferedTopics, ListTopicsError> {
        if self.tracker.status().state != LobbyState::Released {
            return Err(ListTopicsError::LobbyNotReleased);
        }

        let topics = self
            .vote_store
            .list_topics(TopicFilter::visible(), TopicOrder::RoundThenId)
            .await?;
        Ok(offer_round(topics, self.topics_per_round))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        config::LobbyConfig,
        domain::{
            ParticipantId, RepositoryError, ReleaseAction, ReleaseError, RoundKey, Topic, TopicId,
            repository::MockVoteStore,
        },
        infrastructure::memory::{InMemoryPresenceStore, InMemoryVoteStore},
    };
    use async_trait::async_trait;
    use quorum_shared::time::FixedClock;
    use std::time::Duration;

    struct NoopRelease;

    #[async_trait]
    impl ReleaseAction for NoopRelease {
        async fn release(&self) -> Result<(), ReleaseError> {
            Ok(())
        }
    }

    pub(crate) fn topic(id: i64, round: i64, eligible: bool, finalized: bool) -> Topic {
        Topic {
            id: TopicId::new(id),
            title: format!("topic {}", id),
            proposed_by: "alice".to_string(),
            round_key: RoundKey::new(round),
            level: 1,
            votes: 0,
            eligible,
            finalized,
        }
    }

    /// 解放済みのロビーを持つ Tracker（quorum 1 で 1 人到着させて猶予を待つ）
    pub(crate) async fn released_tracker() -> Arc<LobbyPresenceTracker> {
        let config = LobbyConfig::new(1)
            .unwrap()
            .with_grace_delay(Duration::from_millis(1));
        let tracker = LobbyPresenceTracker::new(
            &config,
            Arc::new(InMemoryPresenceStore::new()),
            Arc::new(NoopRelease),
            Arc::new(FixedClock::new(0)),
        );
        tracker
            .record_arrival(&ParticipantId::new("host".to_string()).unwrap())
            .await;
        tracker.refresh().await;
        let mut status_rx = tracker.subscribe();
        while status_rx.borrow_and_update().state != LobbyState::Released {
            if status_rx.changed().await.is_err() {
                break;
            }
        }
        tracker
    }

    pub(crate) fn waiting_tracker() -> Arc<LobbyPresenceTracker> {
        LobbyPresenceTracker::new(
            &LobbyConfig::new(4).unwrap(),
            Arc::new(InMemoryPresenceStore::new()),
            Arc::new(NoopRelease),
            Arc::new(FixedClock::new(0)),
        )
    }

    #[tokio::test]
    async fn test_only_visible_topics_are_offered() {
        // テスト項目: 承認済みかつ未決着のトピックだけが提示される
        // given (前提条件):
        let store = Arc::new(InMemoryVoteStore::new(vec![
            topic(1, 1, true, false),
            topic(2, 1, false, false),
            topic(3, 1, true, true),
        ]));
        let usecase = ListTopicsUseCase::new(store, released_tracker().await, 3);

        // when (操作):
        let offered = usecase.execute().await.unwrap();

        // then (期待する結果):
        assert_eq!(offered.round, Some(RoundKey::new(1)));
        let ids: Vec<i64> = offered.topics.iter().map(|t| t.id.value()).collect();
        assert_eq!(ids, vec![1]);
    }

    #[tokio::test]
    async fn test_lowest_round_is_offered() {
        // テスト項目: 最小のラウンドキーのトピックが最大件数まで提示される
        // given (前提条件):
        let store = Arc::new(InMemoryVoteStore::new(vec![
            topic(9, 2, true, false),
            topic(4, 1, true, false),
            topic(2, 1, true, false),
            topic(7, 1, true, false),
        ]));
        let usecase = ListTopicsUseCase::new(store, released_tracker().await, 2);

        // when (操作):
        let offered = usecase.execute().await.unwrap();

        // then (期待する結果):
        let ids: Vec<i64> = offered.topics.iter().map(|t| t.id.value()).collect();
        assert_eq!(ids, vec![2, 4]);
    }

    #[tokio::test]
    async fn test_listing_requires_released_lobby() {
        // テスト項目: ロビーが解放されるまでは一覧を返さない
        // given (前提条件):
        let mut store = MockVoteStore::new();
        store.expect_list_topics().times(0);
        let usecase = ListTopicsUseCase::new(Arc::new(store), waiting_tracker(), 3);

        // when (操作):
        let result = usecase.execute().await;

        // then (期待する結果):
        assert_eq!(result, Err(ListTopicsError::LobbyNotReleased));
    }

    #[tokio::test]
    async fn test_store_failure_is_reported() {
        // テスト項目: Vote Store の失敗はそのまま報告される
        // given (前提条件):
        let mut store = MockVoteStore::new();
        store
            .expect_list_topics()
            .returning(|_, _| Err(RepositoryError::Unavailable("503".to_string())));
        let usecase = ListTopicsUseCase::new(Arc::new(store), released_tracker().await, 3);

        // when (操作):
        let result = usecase.execute().await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ListTopicsError::Store(RepositoryError::Unavailable(
                "503".to_string()
            )))
        );
    }
}
