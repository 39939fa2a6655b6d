//! InMemory Change Notifier 実装
//!
//! テーブル名ごとに購読者のチャンネルを保持し、`publish` された変更を配ります。

use std::{
    collections::HashMap,
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::{ChangeEvent, ChangeFeed, ChangeNotifier, NotifierError, SubscriptionHandle};

struct Subscriber {
    table: String,
    sender: mpsc::UnboundedSender<ChangeEvent>,
}

/// インメモリ Change Notifier 実装
#[derive(Default)]
pub struct InMemoryChangeNotifier {
    next_handle: AtomicU64,
    subscribers: Mutex<HashMap<SubscriptionHandle, Subscriber>>,
}

impl InMemoryChangeNotifier {
    /// 新しい InMemoryChangeNotifier を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 変更をテーブルの購読者全員に配信
    pub fn publish(&self, event: ChangeEvent) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        // 受信側が閉じた購読者は取り除く
        subscribers.retain(|handle, subscriber| {
            if subscriber.table != event.table {
                return true;
            }
            let delivered = subscriber.sender.send(event.clone()).is_ok();
            if !delivered {
                tracing::debug!("Dropping closed subscription {}", handle.value());
            }
            delivered
        });
    }

    /// 現在の購読数
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// 全ての購読を切断する（通知経路の切断を再現）
    pub fn disconnect_all(&self) {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        tracing::debug!("All change subscriptions disconnected");
    }
}

#[async_trait]
impl ChangeNotifier for InMemoryChangeNotifier {
    async fn subscribe(&self, table: &str) -> Result<ChangeFeed, NotifierError> {
        let handle = SubscriptionHandle::new(self.next_handle.fetch_add(1, Ordering::SeqCst));
        let (sender, events) = mpsc::unbounded_channel();

        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                handle,
                Subscriber {
                    table: table.to_string(),
                    sender,
                },
            );
        tracing::debug!("Subscription {} created for '{}'", handle.value(), table);

        Ok(ChangeFeed { handle, events })
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) {
        let removed = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle);
        if removed.is_some() {
            tracing::debug!("Subscription {} removed", handle.value());
        }
    }
}
