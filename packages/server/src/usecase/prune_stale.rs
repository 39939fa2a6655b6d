//! UseCase: 期限切れの参加者の定期削除
//!
//! ハートビートが途絶えた（タブを閉じた、回線が切れた）参加者を
//! ハートビート間隔ごとに Presence Store から取り除きます。

use std::{sync::Arc, time::Duration};

use tokio::time::MissedTickBehavior;

use super::{presence_tracker::LobbyPresenceTracker, task::BackgroundTask};

/// 期限切れの参加者を定期的に削除する
pub struct StalePresencePruner {
    tracker: Arc<LobbyPresenceTracker>,
    interval: Duration,
}

impl StalePresencePruner {
    pub fn new(tracker: Arc<LobbyPresenceTracker>, interval: Duration) -> Self {
        Self { tracker, interval }
    }

    pub fn spawn(self) -> BackgroundTask {
        BackgroundTask::spawn("stale-presence-pruner", self.run())
    }

    async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // 最初の tick は即座に完了する
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let pruned = self.tracker.prune_stale().await;
            for id in &pruned {
                tracing::debug!("Participant '{}' timed out", id.as_str());
            }
        }
    }
}
