//! InMemory 投票台帳実装
//!
//! (参加者, ラウンド) ごとに 1 票だけを記録します。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{BallotLedger, LedgerError, ParticipantId, RoundKey, TopicId};

/// インメモリ投票台帳実装
#[derive(Default)]
pub struct InMemoryBallotLedger {
    ballots: Mutex<HashMap<(ParticipantId, RoundKey), TopicId>>,
}

impl InMemoryBallotLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BallotLedger for InMemoryBallotLedger {
    async fn claim(
        &self,
        participant: &ParticipantId,
        round: RoundKey,
        topic_id: TopicId,
    ) -> Result<(), LedgerError> {
        let mut ballots = self.ballots.lock().await;
        let key = (participant.clone(), round);
        if ballots.contains_key(&key) {
            return Err(LedgerError::AlreadyVoted(participant.as_str().to_string()));
        }
        ballots.insert(key, topic_id);
        Ok(())
    }

    async fn release(
        &self,
        participant: &ParticipantId,
        round: RoundKey,
    ) -> Result<(), LedgerError> {
        self.ballots
            .lock()
            .await
            .remove(&(participant.clone(), round));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_claim_once_per_round() {
        // テスト項目: 同じラウンドへの 2 票目は拒否され、別ラウンドなら受け付ける
        // given (前提条件):
        let ledger = InMemoryBallotLedger::new();
        let alice = ParticipantId::new("alice".to_string()).unwrap();

        // when (操作):
        let first = ledger.claim(&alice, RoundKey::new(1), TopicId::new(1)).await;
        let second = ledger.claim(&alice, RoundKey::new(1), TopicId::new(2)).await;
        let next_round = ledger.claim(&alice, RoundKey::new(2), TopicId::new(5)).await;

        // then (期待する結果):
        assert!(first.is_ok());
        assert_eq!(second, Err(LedgerError::AlreadyVoted("alice".to_string())));
        assert!(next_round.is_ok());
    }

    #[tokio::test]
    async fn test_release_allows_new_claim() {
        // テスト項目: 取り消した票は再度投じられる
        // given (前提条件):
        let ledger = InMemoryBallotLedger::new();
        let alice = ParticipantId::new("alice".to_string()).unwrap();
        ledger.claim(&alice, RoundKey::new(1), TopicId::new(1)).await.unwrap();

        // when (操作):
        ledger.release(&alice, RoundKey::new(1)).await.unwrap();
        let retry = ledger.claim(&alice, RoundKey::new(1), TopicId::new(1)).await;

        // then (期待する結果):
        assert!(retry.is_ok());
    }
}
