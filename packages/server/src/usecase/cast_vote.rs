//! UseCase: 投票
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - CastVoteUseCase::execute() メソッド
//! - 投票で対象トピックの投票数がちょうど 1 増えること
//! - 同じラウンドで 2 票目が拒否されること
//!
//! ### どのような状況を想定しているか
//! - 正常系：提示中のトピックへの投票
//! - 異常系：提示されていないトピック、投票数の更新失敗（台帳の取り消し）
//! - エッジケース：公開中のトピックがない

use std::sync::Arc;

use crate::domain::{
    BallotLedger, LedgerError, OfferedTopics, ParticipantId, RoundKey, TopicId, VoteStore,
};

use super::{error::CastVoteError, list_topics::ListTopicsUseCase};

/// 投票の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteReceipt {
    pub topic_id: TopicId,
    pub round: RoundKey,
    /// 投票後の最新の一覧（取得に失敗した場合は `None`）
    pub offered: Option<OfferedTopics>,
}

/// 投票のユースケース
pub struct CastVoteUseCase {
    topics: ListTopicsUseCase,
    vote_store: Arc<dyn VoteStore>,
    ledger: Arc<dyn BallotLedger>,
}

impl CastVoteUseCase {
    pub fn new(
        topics: ListTopicsUseCase,
        vote_store: Arc<dyn VoteStore>,
        ledger: Arc<dyn BallotLedger>,
    ) -> Self {
        Self {
            topics,
            vote_store,
            ledger,
        }
    }

    /// 投票を実行
    ///
    /// # Returns
    ///
    /// * `Ok(VoteReceipt)` - 投票数の更新に成功
    /// * `Err(CastVoteError::AlreadyVoted)` - このラウンドでは投票済み
    /// * `Err(CastVoteError::Unavailable)` - 更新に失敗（台帳は元に戻っているので再送してよい）
    pub async fn execute(
        &self,
        participant_id: &ParticipantId,
        topic_id: TopicId,
    ) -> Result<VoteReceipt, CastVoteError> {
        let offered = self.topics.execute().await?;
        let round = offered.round.ok_or(CastVoteError::NoOpenRound)?;
        if !offered.contains(topic_id) {
            return Err(CastVoteError::TopicNotOffered(topic_id));
        }

        self.ledger
            .claim(participant_id, round, topic_id)
            .await
            .map_err(|e| match e {
                LedgerError::AlreadyVoted(_) => CastVoteError::AlreadyVoted,
                LedgerError::Unavailable(reason) => CastVoteError::Unavailable(reason),
            })?;

        if let Err(e) = self.vote_store.increment_vote(topic_id).await {
            tracing::warn!("Failed to record vote for topic {}: {}", topic_id, e);
            if let Err(release_error) = self.ledger.release(participant_id, round).await {
                tracing::error!(
                    "Failed to release ballot of '{}' for round {}: {}",
                    participant_id.as_str(),
                    round.value(),
                    release_error
                );
            }
            return Err(CastVoteError::Unavailable(e.to_string()));
        }

        tracing::info!(
            "Participant '{}' voted for topic {}",
            participant_id.as_str(),
            topic_id
        );

        let offered = match self.topics.execute().await {
            Ok(offered) => Some(offered),
            Err(e) => {
                tracing::warn!("Failed to refresh topics after vote: {}", e);
                None
            }
        };

        Ok(VoteReceipt {
            topic_id,
            round,
            offered,
        })
    }
}
