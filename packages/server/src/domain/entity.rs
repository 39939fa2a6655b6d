//! エンティティ

use serde::{Deserialize, Serialize};

use super::value_object::{AccessToken, Email, ParticipantId, RoundKey, Timestamp, TopicId};

/// 参加者（オンライン状態の 1 行）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    /// 最後に生存が確認された時刻（ログイン、ハートビート）
    pub last_seen: Timestamp,
}

impl Participant {
    pub fn new(id: ParticipantId, last_seen: Timestamp) -> Self {
        Self { id, last_seen }
    }

    /// `cutoff` より前から更新されていない
    pub fn is_stale(&self, cutoff: Timestamp) -> bool {
        self.last_seen < cutoff
    }
}

/// 投票対象のトピック
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: TopicId,
    pub title: String,
    pub proposed_by: String,
    pub round_key: RoundKey,
    pub level: i32,
    pub votes: u64,
    /// 管理者が投票対象として承認済み
    pub eligible: bool,
    /// 過去のラウンドで決着済み
    pub finalized: bool,
}

impl Topic {
    /// 投票者に表示されるか
    pub fn is_visible(&self) -> bool {
        self.eligible && !self.finalized
    }
}

/// ログインセッション
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub participant_id: ParticipantId,
    /// トークンから引いたセッションでは不明な場合がある
    pub email: Option<Email>,
    pub access_token: AccessToken,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(eligible: bool, finalized: bool) -> Topic {
        Topic {
            id: TopicId::new(1),
            title: "Dungeon crawl".to_string(),
            proposed_by: "alice".to_string(),
            round_key: RoundKey::new(1),
            level: 1,
            votes: 0,
            eligible,
            finalized,
        }
    }

    #[test]
    fn test_topic_visibility_requires_eligible_and_open() {
        // テスト項目: eligible かつ未決着のトピックのみ表示対象になる
        // given (前提条件) / when (操作) / then (期待する結果):
        assert!(topic(true, false).is_visible());
        assert!(!topic(false, false).is_visible());
        assert!(!topic(true, true).is_visible());
        assert!(!topic(false, true).is_visible());
    }

    #[test]
    fn test_participant_is_stale_before_cutoff() {
        // テスト項目: cutoff より古い last_seen の参加者は stale と判定される
        // given (前提条件):
        let id = ParticipantId::new("alice".to_string()).unwrap();
        let participant = Participant::new(id, Timestamp::new(1_000));

        // when (操作) / then (期待する結果):
        assert!(participant.is_stale(Timestamp::new(1_001)));
        assert!(!participant.is_stale(Timestamp::new(1_000)));
        assert!(!participant.is_stale(Timestamp::new(999)));
    }
}
