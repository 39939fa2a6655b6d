//! ホスト型バックエンドの Presence Store（`online_users` テーブル）

use async_trait::async_trait;
use quorum_shared::time::timestamp_to_rfc3339;
use reqwest::Method;

use crate::{
    config::PRESENCE_TABLE,
    domain::{Participant, ParticipantId, PresenceStore, RepositoryError, Timestamp},
    infrastructure::dto::rows::OnlineUserRow,
};

use super::client::{HostedClient, HostedError};

pub struct HostedPresenceStore {
    client: HostedClient,
}

impl HostedPresenceStore {
    pub fn new(client: HostedClient) -> Self {
        Self { client }
    }

    async fn select(
        &self,
        filter: Option<(&str, String)>,
    ) -> Result<Vec<Participant>, RepositoryError> {
        let mut request = self
            .client
            .rest(Method::GET, PRESENCE_TABLE)
            .query(&[("select", "user_id,last_ping"), ("order", "user_id.asc")]);
        if let Some((column, condition)) = filter {
            request = request.query(&[(column, condition)]);
        }

        let rows: Vec<OnlineUserRow> = self
            .client
            .send(request)
            .await
            .map_err(unavailable)?
            .json()
            .await
            .map_err(|e| RepositoryError::Malformed(e.to_string()))?;

        rows.into_iter().map(Participant::try_from).collect()
    }
}

pub(super) fn unavailable(error: HostedError) -> RepositoryError {
    RepositoryError::Unavailable(error.to_string())
}

#[async_trait]
impl PresenceStore for HostedPresenceStore {
    async fn upsert(
        &self,
        id: &ParticipantId,
        last_seen: Timestamp,
    ) -> Result<(), RepositoryError> {
        let row = OnlineUserRow::from(&Participant::new(id.clone(), last_seen));
        let request = self
            .client
            .rest(Method::POST, PRESENCE_TABLE)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&[row]);
        self.client.send(request).await.map_err(unavailable)?;
        Ok(())
    }

    async fn delete(&self, id: &ParticipantId) -> Result<(), RepositoryError> {
        let request = self
            .client
            .rest(Method::DELETE, PRESENCE_TABLE)
            .query(&[("user_id", format!("eq.{}", id.as_str()))]);
        self.client.send(request).await.map_err(unavailable)?;
        Ok(())
    }

    async fn select_all(&self) -> Result<Vec<Participant>, RepositoryError> {
        self.select(None).await
    }

    async fn select_stale(
        &self,
        older_than: Timestamp,
    ) -> Result<Vec<Participant>, RepositoryError> {
        let cutoff = timestamp_to_rfc3339(older_than.value());
        self.select(Some(("last_ping", format!("lt.{}", cutoff)))).await
    }
}
