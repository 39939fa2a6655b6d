//! Ballot: single-choice selection over the offered topics and vote submission.

use std::sync::Arc;

use quorum_server::{
    domain::{TopicId, VoteSelection},
    infrastructure::dto::http::{OfferedTopicsResponse, VoteResponse},
};

use crate::{api::VoteGateway, error::ClientError};

pub struct Ballot {
    gateway: Arc<dyn VoteGateway>,
    offered: OfferedTopicsResponse,
    selection: VoteSelection,
}

impl Ballot {
    pub fn new(gateway: Arc<dyn VoteGateway>, offered: OfferedTopicsResponse) -> Self {
        Self {
            gateway,
            offered,
            selection: VoteSelection::new(),
        }
    }

    pub fn offered(&self) -> &OfferedTopicsResponse {
        &self.offered
    }

    pub fn selected(&self) -> Option<i64> {
        self.selection.selected().map(|id| id.value())
    }

    /// Toggle the selection; choosing another topic replaces the current one
    pub fn select(&mut self, topic_id: i64) -> Option<i64> {
        self.selection
            .select(TopicId::new(topic_id))
            .map(|id| id.value())
    }

    /// Submit the selected topic
    ///
    /// On success the selection is cleared and the listing replaced with the
    /// refreshed one. On failure the selection is kept so the vote can be retried.
    pub async fn submit(&mut self) -> Result<VoteResponse, ClientError> {
        let topic_id = self.selection.selected().ok_or(ClientError::NothingSelected)?;
        let receipt = self.gateway.cast_vote(topic_id.value()).await?;

        self.selection.clear();
        match &receipt.offered {
            Some(offered) => self.offered = offered.clone(),
            None => {
                if let Err(e) = self.refresh().await {
                    tracing::warn!("Failed to refresh topics after voting: {}", e);
                }
            }
        }
        Ok(receipt)
    }

    /// Reload the offered topics, dropping a selection that is no longer offered
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        self.offered = self.gateway.offered_topics().await?;
        if let Some(selected) = self.selected()
            && !self.offered.topics.iter().any(|topic| topic.id == selected)
        {
            self.selection.clear();
        }
        Ok(())
    }
}
