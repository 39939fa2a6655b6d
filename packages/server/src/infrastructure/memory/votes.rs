//! InMemory Vote Store 実装

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{RepositoryError, Topic, TopicFilter, TopicId, TopicOrder, VoteStore};

/// インメモリ Vote Store 実装
pub struct InMemoryVoteStore {
    topics: Mutex<Vec<Topic>>,
}

impl InMemoryVoteStore {
    pub fn new(topics: Vec<Topic>) -> Self {
        Self {
            topics: Mutex::new(topics),
        }
    }
}

#[async_trait]
impl VoteStore for InMemoryVoteStore {
    async fn list_topics(
        &self,
        filter: TopicFilter,
        order: TopicOrder,
    ) -> Result<Vec<Topic>, RepositoryError> {
        let mut topics: Vec<Topic> = self
            .topics
            .lock()
            .await
            .iter()
            .filter(|topic| filter.matches(topic))
            .cloned()
            .collect();
        match order {
            TopicOrder::RoundThenId => topics.sort_by_key(|topic| (topic.round_key, topic.id)),
        }
        Ok(topics)
    }

    async fn increment_vote(&self, topic_id: TopicId) -> Result<(), RepositoryError> {
        let mut topics = self.topics.lock().await;
        let topic = topics
            .iter_mut()
            .find(|topic| topic.id == topic_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("topic {}", topic_id)))?;
        topic.votes += 1;
        Ok(())
    }
}
