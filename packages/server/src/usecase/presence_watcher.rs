//! UseCase: Presence テーブルの変更購読
//!
//! 購読に成功するたびに Snapshot を読み直し（購読していない間の変更を取りこぼさないため）、
//! 以降は変更通知ごとに Tracker を refresh します。通知経路が切れたらバックオフして再購読します。

use std::sync::Arc;

use crate::{
    config::{Backoff, LobbyConfig, PRESENCE_TABLE},
    domain::{ChangeFeed, ChangeNotifier, SubscriptionHandle},
};

use super::{presence_tracker::LobbyPresenceTracker, task::BackgroundTask};

/// 購読の所有者（Drop 時に購読を解除）
struct Subscription {
    notifier: Arc<dyn ChangeNotifier>,
    handle: SubscriptionHandle,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.notifier.unsubscribe(self.handle);
    }
}

/// Presence テーブルの変更を Tracker に伝える
pub struct PresenceWatcher {
    notifier: Arc<dyn ChangeNotifier>,
    tracker: Arc<LobbyPresenceTracker>,
    table: String,
    backoff: Backoff,
}

impl PresenceWatcher {
    pub fn new(
        notifier: Arc<dyn ChangeNotifier>,
        tracker: Arc<LobbyPresenceTracker>,
        config: &LobbyConfig,
    ) -> Self {
        Self {
            notifier,
            tracker,
            table: PRESENCE_TABLE.to_string(),
            backoff: config.watcher_backoff,
        }
    }

    /// バックグラウンドで購読を開始（戻り値を drop すると停止し購読も解除される）
    pub fn spawn(self) -> BackgroundTask {
        BackgroundTask::spawn("presence-watcher", self.run())
    }

    async fn run(self) {
        let mut failures: u32 = 0;
        loop {
            match self.notifier.subscribe(&self.table).await {
                Ok(feed) => {
                    failures = 0;
                    tracing::info!("Subscribed to '{}' changes", self.table);
                    self.consume(feed).await;
                    tracing::warn!("Change feed for '{}' closed", self.table);
                    tokio::time::sleep(self.backoff.delay_for(1)).await;
                }
                Err(e) => {
                    failures += 1;
                    if !self.backoff.allows(failures) {
                        tracing::error!(
                            "Giving up on '{}' changes after {} attempts: {}",
                            self.table,
                            failures,
                            e
                        );
                        return;
                    }
                    let delay = self.backoff.delay_for(failures);
                    tracing::warn!("{}. Resubscribing in {:?}", e, delay);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn consume(&self, feed: ChangeFeed) {
        let _subscription = Subscription {
            notifier: Arc::clone(&self.notifier),
            handle: feed.handle,
        };
        let mut events = feed.events;

        self.tracker.refresh().await;

        while let Some(event) = events.recv().await {
            // 溜まっている通知はまとめて 1 回の refresh で処理する
            let mut coalesced = 0;
            while events.try_recv().is_ok() {
                coalesced += 1;
            }
            tracing::trace!(
                "'{}' {:?} (+{} coalesced), refreshing",
                event.table,
                event.kind,
                coalesced
            );
            self.tracker.refresh().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            ChangeFeed, LobbyState, NotifierError, ParticipantId, ReleaseAction, ReleaseError,
        },
        infrastructure::memory::{InMemoryChangeNotifier, InMemoryPresenceStore},
    };
    use async_trait::async_trait;
    use quorum_shared::time::FixedClock;
    use std::{
        sync::atomic::{AtomicU32, Ordering},
        time::Duration,
    };

    struct NoopRelease;

    #[async_trait]
    impl ReleaseAction for NoopRelease {
        async fn release(&self) -> Result<(), ReleaseError> {
            Ok(())
        }
    }

    /// 先頭 `failures` 回の購読に失敗する Notifier
    struct FlakyNotifier {
        inner: Arc<InMemoryChangeNotifier>,
        attempts: AtomicU32,
        failures: u32,
    }

    #[async_trait]
    impl ChangeNotifier for FlakyNotifier {
        async fn subscribe(&self, table: &str) -> Result<ChangeFeed, NotifierError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.failures {
                return Err(NotifierError::SubscribeFailed {
                    table: table.to_string(),
                    reason: "connection refused".to_string(),
                });
            }
            self.inner.subscribe(table).await
        }

        fn unsubscribe(&self, handle: SubscriptionHandle) {
            self.inner.unsubscribe(handle);
        }
    }

    fn id(value: &str) -> ParticipantId {
        ParticipantId::new(value.to_string()).unwrap()
    }

    fn setup(
        quorum: usize,
    ) -> (
        Arc<InMemoryChangeNotifier>,
        Arc<LobbyPresenceTracker>,
        LobbyConfig,
    ) {
        let notifier = Arc::new(InMemoryChangeNotifier::new());
        let store = Arc::new(InMemoryPresenceStore::with_notifier(notifier.clone()));
        let config = LobbyConfig::new(quorum).unwrap();
        let tracker = LobbyPresenceTracker::new(
            &config,
            store,
            Arc::new(NoopRelease),
            Arc::new(FixedClock::new(1_000_000)),
        );
        (notifier, tracker, config)
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_changes_trigger_refresh() {
        // テスト項目: Presence の変更通知で Tracker の人数が更新される
        // given (前提条件):
        let (notifier, tracker, config) = setup(2);
        let _watcher = PresenceWatcher::new(notifier, tracker.clone(), &config).spawn();
        settle().await;

        // when (操作):
        tracker.record_arrival(&id("alice")).await;
        tracker.record_arrival(&id("bob")).await;
        settle().await;

        // then (期待する結果):
        let status = tracker.status();
        assert_eq!(status.online_count, 2);
        assert_eq!(status.state, LobbyState::QuorumReached);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resubscribes_and_reconciles_after_disconnect() {
        // テスト項目: 通知経路が切れても再購読し、切断中の変更を読み直しで取り込む
        // given (前提条件):
        let (notifier, tracker, config) = setup(5);
        let _watcher = PresenceWatcher::new(notifier.clone(), tracker.clone(), &config).spawn();
        settle().await;

        // when (操作):
        notifier.disconnect_all();
        tracker.record_arrival(&id("alice")).await;
        tokio::time::sleep(Duration::from_secs(2)).await;

        // then (期待する結果):
        assert_eq!(notifier.subscriber_count(), 1);
        assert_eq!(tracker.status().online_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribe_failures_are_retried() {
        // テスト項目: 購読に失敗してもバックオフ後に再試行し、成功後は通知を受け取る
        // given (前提条件):
        let (inner, tracker, config) = setup(5);
        let notifier = Arc::new(FlakyNotifier {
            inner: inner.clone(),
            attempts: AtomicU32::new(0),
            failures: 2,
        });
        let _watcher = PresenceWatcher::new(notifier.clone(), tracker.clone(), &config).spawn();

        // when (操作):
        tokio::time::sleep(Duration::from_secs(5)).await;
        tracker.record_arrival(&id("alice")).await;
        settle().await;

        // then (期待する結果):
        assert_eq!(notifier.attempts.load(Ordering::SeqCst), 3);
        assert_eq!(inner.subscriber_count(), 1);
        assert_eq!(tracker.status().online_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_watcher_unsubscribes() {
        // テスト項目: Watcher を停止すると購読が解除される
        // given (前提条件):
        let (notifier, tracker, config) = setup(2);
        let watcher = PresenceWatcher::new(notifier.clone(), tracker, &config).spawn();
        settle().await;
        assert_eq!(notifier.subscriber_count(), 1);

        // when (操作):
        drop(watcher);
        settle().await;

        // then (期待する結果):
        assert_eq!(notifier.subscriber_count(), 0);
    }
}
