//! ホスト型バックエンドの Vote Store と投票台帳
//!
//! 投票数の加算はサーバー側の `add_vote` RPC で原子的に行われます。
//! `ballots` テーブルは `(participant_id, round_key)` に一意制約があり、
//! 二重投票は 409 で返ります。

use async_trait::async_trait;
use reqwest::{Method, StatusCode};

use crate::{
    domain::{
        BallotLedger, LedgerError, ParticipantId, RepositoryError, RoundKey, Topic, TopicFilter,
        TopicId, TopicOrder, VoteStore,
    },
    infrastructure::dto::rows::{AddVoteParams, BallotRow, TopicRow},
};

use super::{client::HostedClient, presence::unavailable};

const TOPICS_TABLE: &str = "topics";
const BALLOTS_TABLE: &str = "ballots";

pub struct HostedVoteStore {
    client: HostedClient,
}

impl HostedVoteStore {
    pub fn new(client: HostedClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl VoteStore for HostedVoteStore {
    async fn list_topics(
        &self,
        filter: TopicFilter,
        order: TopicOrder,
    ) -> Result<Vec<Topic>, RepositoryError> {
        let order = match order {
            TopicOrder::RoundThenId => "round_key.asc,id.asc",
        };
        let request = self.client.rest(Method::GET, TOPICS_TABLE).query(&[
            ("select", "*".to_string()),
            ("eligible", format!("eq.{}", filter.eligible)),
            ("finalized", format!("eq.{}", filter.finalized)),
            ("order", order.to_string()),
        ]);

        let rows: Vec<TopicRow> = self
            .client
            .send(request)
            .await
            .map_err(unavailable)?
            .json()
            .await
            .map_err(|e| RepositoryError::Malformed(e.to_string()))?;

        Ok(rows.into_iter().map(Topic::from).collect())
    }

    async fn increment_vote(&self, topic_id: TopicId) -> Result<(), RepositoryError> {
        let request = self
            .client
            .rest(Method::POST, "rpc/add_vote")
            .json(&AddVoteParams {
                topic_id: topic_id.value(),
            });
        self.client.send(request).await.map_err(|e| match e.status() {
            Some(StatusCode::NOT_FOUND) => {
                RepositoryError::NotFound(format!("topic {}", topic_id))
            }
            _ => unavailable(e),
        })?;
        Ok(())
    }
}

pub struct HostedBallotLedger {
    client: HostedClient,
}

impl HostedBallotLedger {
    pub fn new(client: HostedClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BallotLedger for HostedBallotLedger {
    async fn claim(
        &self,
        participant: &ParticipantId,
        round: RoundKey,
        topic_id: TopicId,
    ) -> Result<(), LedgerError> {
        let request = self
            .client
            .rest(Method::POST, BALLOTS_TABLE)
            .header("Prefer", "return=minimal")
            .json(&BallotRow {
                participant_id: participant.as_str().to_string(),
                round_key: round.value(),
                topic_id: topic_id.value(),
            });
        self.client.send(request).await.map_err(|e| match e.status() {
            Some(StatusCode::CONFLICT) => {
                LedgerError::AlreadyVoted(participant.as_str().to_string())
            }
            _ => LedgerError::Unavailable(e.to_string()),
        })?;
        Ok(())
    }

    async fn release(
        &self,
        participant: &ParticipantId,
        round: RoundKey,
    ) -> Result<(), LedgerError> {
        let request = self.client.rest(Method::DELETE, BALLOTS_TABLE).query(&[
            ("participant_id", format!("eq.{}", participant.as_str())),
            ("round_key", format!("eq.{}", round.value())),
        ]);
        self.client
            .send(request)
            .await
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::hosted::fake;
    use axum::{
        Json, Router,
        extract::{Query, State},
        http::StatusCode,
        routing::{get, post},
    };
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
    };

    #[derive(Default)]
    struct Backend {
        topics: Vec<TopicRow>,
        ballots: Vec<BallotRow>,
    }

    type Shared = Arc<Mutex<Backend>>;

    async fn list(
        State(backend): State<Shared>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Json<Vec<TopicRow>> {
        let eligible = params.get("eligible").map(String::as_str) == Some("eq.true");
        let finalized = params.get("finalized").map(String::as_str) == Some("eq.true");
        let mut rows: Vec<TopicRow> = backend
            .lock()
            .unwrap()
            .topics
            .iter()
            .filter(|row| row.eligible == eligible && row.finalized == finalized)
            .cloned()
            .collect();
        rows.sort_by_key(|row| (row.round_key, row.id));
        Json(rows)
    }

    async fn add_vote(
        State(backend): State<Shared>,
        Json(params): Json<AddVoteParams>,
    ) -> StatusCode {
        let mut backend = backend.lock().unwrap();
        match backend.topics.iter_mut().find(|row| row.id == params.topic_id) {
            Some(row) => {
                row.votes = Some(row.votes.unwrap_or(0) + 1);
                StatusCode::NO_CONTENT
            }
            None => StatusCode::NOT_FOUND,
        }
    }

    async fn insert_ballot(
        State(backend): State<Shared>,
        Json(ballot): Json<BallotRow>,
    ) -> StatusCode {
        let mut backend = backend.lock().unwrap();
        let duplicate = backend.ballots.iter().any(|existing| {
            existing.participant_id == ballot.participant_id
                && existing.round_key == ballot.round_key
        });
        if duplicate {
            return StatusCode::CONFLICT;
        }
        backend.ballots.push(ballot);
        StatusCode::CREATED
    }

    async fn delete_ballot(
        State(backend): State<Shared>,
        Query(params): Query<HashMap<String, String>>,
    ) -> StatusCode {
        let participant = params.get("participant_id").cloned().unwrap_or_default();
        let round = params.get("round_key").cloned().unwrap_or_default();
        backend.lock().unwrap().ballots.retain(|ballot| {
            format!("eq.{}", ballot.participant_id) != participant
                || format!("eq.{}", ballot.round_key) != round
        });
        StatusCode::NO_CONTENT
    }

    fn row(id: i64, eligible: bool, finalized: bool) -> TopicRow {
        TopicRow {
            id,
            title: format!("topic {}", id),
            proposed_by: "alice".to_string(),
            round_key: 1,
            level: 1,
            votes: None,
            eligible,
            finalized,
        }
    }

    async fn create_client(topics: Vec<TopicRow>) -> HostedClient {
        let backend: Shared = Arc::new(Mutex::new(Backend {
            topics,
            ballots: Vec::new(),
        }));
        let router = Router::new()
            .route("/rest/v1/topics", get(list))
            .route("/rest/v1/rpc/add_vote", post(add_vote))
            .route("/rest/v1/ballots", post(insert_ballot).delete(delete_ballot))
            .with_state(backend);
        fake::serve(router).await
    }

    #[tokio::test]
    async fn test_vote_is_visible_in_next_listing() {
        // テスト項目: 表示対象だけが返り、投票後の一覧で投票数が 1 増えている
        // given (前提条件):
        let client = create_client(vec![
            row(1, true, false),
            row(2, false, false),
            row(3, true, true),
        ])
        .await;
        let store = HostedVoteStore::new(client);

        // when (操作):
        store.increment_vote(TopicId::new(1)).await.unwrap();
        let topics = store
            .list_topics(TopicFilter::visible(), TopicOrder::RoundThenId)
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].id, TopicId::new(1));
        assert_eq!(topics[0].votes, 1);
    }

    #[tokio::test]
    async fn test_increment_unknown_topic() {
        // テスト項目: 存在しないトピックへの加算は NotFound
        // given (前提条件):
        let store = HostedVoteStore::new(create_client(Vec::new()).await);

        // when (操作):
        let result = store.increment_vote(TopicId::new(99)).await;

        // then (期待する結果):
        assert!(matches!(result, Err(RepositoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_ledger_conflict_means_already_voted() {
        // テスト項目: 一意制約違反（409）は AlreadyVoted、取り消し後は再度投票できる
        // given (前提条件):
        let ledger = HostedBallotLedger::new(create_client(Vec::new()).await);
        let alice = ParticipantId::new("alice".to_string()).unwrap();
        ledger
            .claim(&alice, RoundKey::new(1), TopicId::new(1))
            .await
            .unwrap();

        // when (操作):
        let duplicate = ledger.claim(&alice, RoundKey::new(1), TopicId::new(2)).await;
        ledger.release(&alice, RoundKey::new(1)).await.unwrap();
        let after_release = ledger.claim(&alice, RoundKey::new(1), TopicId::new(2)).await;

        // then (期待する結果):
        assert_eq!(duplicate, Err(LedgerError::AlreadyVoted("alice".to_string())));
        assert!(after_release.is_ok());
    }
}
