//! InMemory Presence Store 実装
//!
//! HashMap をオンライン参加者テーブルとして使い、書き込みのたびに
//! Change Notifier へ変更を通知します（DB のトリガー + realtime 配信の代わり）。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    config::PRESENCE_TABLE,
    domain::{
        ChangeEvent, ChangeKind, Participant, ParticipantId, PresenceStore, RepositoryError,
        Timestamp,
    },
};

use super::notifier::InMemoryChangeNotifier;

/// インメモリ Presence Store 実装
#[derive(Default)]
pub struct InMemoryPresenceStore {
    /// 参加者 ID → last_seen
    rows: Mutex<HashMap<ParticipantId, Timestamp>>,
    notifier: Option<Arc<InMemoryChangeNotifier>>,
}

impl InMemoryPresenceStore {
    /// 変更通知なしの InMemoryPresenceStore を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 書き込みを `notifier` に通知する InMemoryPresenceStore を作成
    pub fn with_notifier(notifier: Arc<InMemoryChangeNotifier>) -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            notifier: Some(notifier),
        }
    }

    fn notify(&self, kind: ChangeKind) {
        if let Some(notifier) = &self.notifier {
            notifier.publish(ChangeEvent {
                table: PRESENCE_TABLE.to_string(),
                kind,
            });
        }
    }
}

fn sorted(rows: impl Iterator<Item = Participant>) -> Vec<Participant> {
    let mut participants: Vec<Participant> = rows.collect();
    participants.sort_by(|a, b| a.id.cmp(&b.id));
    participants
}

#[async_trait]
impl PresenceStore for InMemoryPresenceStore {
    async fn upsert(
        &self,
        id: &ParticipantId,
        last_seen: Timestamp,
    ) -> Result<(), RepositoryError> {
        let previous = self.rows.lock().await.insert(id.clone(), last_seen);
        let kind = if previous.is_some() {
            ChangeKind::Update
        } else {
            ChangeKind::Insert
        };
        self.notify(kind);
        Ok(())
    }

    async fn delete(&self, id: &ParticipantId) -> Result<(), RepositoryError> {
        let removed = self.rows.lock().await.remove(id);
        if removed.is_some() {
            self.notify(ChangeKind::Delete);
        }
        Ok(())
    }

    async fn select_all(&self) -> Result<Vec<Participant>, RepositoryError> {
        let rows = self.rows.lock().await;
        Ok(sorted(
            rows.iter()
                .map(|(id, last_seen)| Participant::new(id.clone(), *last_seen)),
        ))
    }

    async fn select_stale(
        &self,
        older_than: Timestamp,
    ) -> Result<Vec<Participant>, RepositoryError> {
        let rows = self.rows.lock().await;
        Ok(sorted(
            rows.iter()
                .filter(|(_, last_seen)| **last_seen < older_than)
                .map(|(id, last_seen)| Participant::new(id.clone(), *last_seen)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChangeNotifier;

    fn id(value: &str) -> ParticipantId {
        ParticipantId::new(value.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_upsert_refreshes_last_seen() {
        // テスト項目: 同じ参加者の upsert は行を増やさず last_seen を更新する
        // given (前提条件):
        let store = InMemoryPresenceStore::new();

        // when (操作):
        store.upsert(&id("alice"), Timestamp::new(1_000)).await.unwrap();
        store.upsert(&id("alice"), Timestamp::new(2_000)).await.unwrap();

        // then (期待する結果):
        let rows = store.select_all().await.unwrap();
        assert_eq!(rows, vec![Participant::new(id("alice"), Timestamp::new(2_000))]);
    }

    #[tokio::test]
    async fn test_delete_unknown_participant_is_noop() {
        // テスト項目: 存在しない参加者の削除はエラーにならない（冪等性）
        // given (前提条件):
        let store = InMemoryPresenceStore::new();

        // when (操作):
        let result = store.delete(&id("nobody")).await;

        // then (期待する結果):
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_select_stale_filters_by_cutoff() {
        // テスト項目: cutoff より古い行だけが返される
        // given (前提条件):
        let store = InMemoryPresenceStore::new();
        store.upsert(&id("old"), Timestamp::new(1_000)).await.unwrap();
        store.upsert(&id("new"), Timestamp::new(9_000)).await.unwrap();

        // when (操作):
        let stale = store.select_stale(Timestamp::new(5_000)).await.unwrap();

        // then (期待する結果):
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].id, id("old"));
    }

    #[tokio::test]
    async fn test_writes_are_published_to_notifier() {
        // テスト項目: 書き込みのたびに変更が通知される（存在しない行の削除は通知しない）
        // given (前提条件):
        let notifier = Arc::new(InMemoryChangeNotifier::new());
        let store = InMemoryPresenceStore::with_notifier(notifier.clone());
        let mut feed = notifier.subscribe(PRESENCE_TABLE).await.unwrap();

        // when (操作):
        store.upsert(&id("alice"), Timestamp::new(1)).await.unwrap();
        store.upsert(&id("alice"), Timestamp::new(2)).await.unwrap();
        store.delete(&id("alice")).await.unwrap();
        store.delete(&id("alice")).await.unwrap();

        // then (期待する結果):
        let mut kinds = Vec::new();
        while let Ok(event) = feed.events.try_recv() {
            kinds.push(event.kind);
        }
        assert_eq!(
            kinds,
            vec![ChangeKind::Insert, ChangeKind::Update, ChangeKind::Delete]
        );
    }
}
