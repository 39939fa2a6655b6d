//! Presence Snapshot
//!
//! ある時点で Presence Store が返した「オンラインの参加者」の集合。
//! 保存はせず、ストアの行から毎回作り直します。

use std::collections::BTreeMap;

use super::{
    entity::Participant,
    value_object::{ParticipantId, Timestamp},
};

/// オンライン参加者の集合（参加者 ID で一意）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceSnapshot {
    participants: BTreeMap<ParticipantId, Participant>,
}

impl PresenceSnapshot {
    /// ストアの行から Snapshot を作る
    ///
    /// 同じ ID の行が複数あれば last_seen が最新のものを採用する。
    /// 行が 1 件もなければ 0 人の Snapshot になる。
    pub fn from_participants(rows: impl IntoIterator<Item = Participant>) -> Self {
        let mut participants: BTreeMap<ParticipantId, Participant> = BTreeMap::new();
        for row in rows {
            match participants.get(&row.id) {
                Some(existing) if existing.last_seen >= row.last_seen => {}
                _ => {
                    participants.insert(row.id.clone(), row);
                }
            }
        }

        Self { participants }
    }

    /// `cutoff` より前から更新されていない参加者を除いた Snapshot
    ///
    pub fn excluding_stale(self, cutoff: Timestamp) -> Self {
        let participants = self
            .participants
            .into_iter()
            .filter(|(_, participant)| !participant.is_stale(cutoff))
            .collect();
        Self { participants }
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.participants.contains_key(id)
    }

    /// 参加者 ID 順のイテレータ
    pub fn participants(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(id: &str, last_seen: i64) -> Participant {
        Participant::new(
            ParticipantId::new(id.to_string()).unwrap(),
            Timestamp::new(last_seen),
        )
    }

    #[test]
    fn test_snapshot_counts_distinct_participants() {
        // テスト項目: 同じ参加者の重複行は 1 人として数えられる
        // given (前提条件):
        let rows = vec![
            participant("alice", 1_000),
            participant("bob", 1_000),
            participant("alice", 2_000),
        ];

        // when (操作):
        let snapshot = PresenceSnapshot::from_participants(rows);

        // then (期待する結果):
        assert_eq!(snapshot.len(), 2);
        let alice = snapshot
            .participants()
            .find(|p| p.id.as_str() == "alice")
            .unwrap();
        assert_eq!(alice.last_seen, Timestamp::new(2_000));
    }

    #[test]
    fn test_snapshot_from_no_rows_is_empty() {
        // テスト項目: 行が 0 件の場合は 0 人の Snapshot になる
        // given (前提条件):
        let rows: Vec<Participant> = Vec::new();

        // when (操作):
        let snapshot = PresenceSnapshot::from_participants(rows);

        // then (期待する結果):
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.len(), 0);
    }

    #[test]
    fn test_snapshot_excluding_stale() {
        // テスト項目: cutoff より古い参加者が除外される
        // given (前提条件):
        let snapshot = PresenceSnapshot::from_participants(vec![
            participant("alice", 1_000),
            participant("bob", 9_000),
            participant("carol", 10_000),
        ]);

        // when (操作):
        let fresh = snapshot.excluding_stale(Timestamp::new(5_000));

        // then (期待する結果):
        assert_eq!(fresh.len(), 2);
        assert!(!fresh.contains(&ParticipantId::new("alice".to_string()).unwrap()));
        assert!(fresh.contains(&ParticipantId::new("bob".to_string()).unwrap()));
    }

    #[test]
    fn test_snapshot_excluding_all_stale_is_empty() {
        // テスト項目: 全員が stale の場合は空の Snapshot になる
        // given (前提条件):
        let snapshot = PresenceSnapshot::from_participants(vec![participant("ghost", 1_000)]);

        // when (操作):
        let fresh = snapshot.excluding_stale(Timestamp::new(2_000));

        // then (期待する結果):
        assert!(fresh.is_empty());
    }
}
