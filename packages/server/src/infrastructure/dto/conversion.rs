//! Conversion logic between DTOs and domain entities.

use quorum_shared::time::{rfc3339_to_timestamp, timestamp_to_rfc3339};

use crate::{
    domain::{
        LobbyState, LobbyStatus, OfferedTopics, Participant, ParticipantId, RepositoryError,
        RoundKey, Session, Timestamp, Topic, TopicId,
    },
    infrastructure::dto::{
        http::{OfferedTopicsResponse, SessionResponse, TopicDto, VoteResponse},
        rows::{OnlineUserRow, TopicRow},
        websocket::{LobbyStateDto, LobbyStatusDto},
    },
    usecase::VoteReceipt,
};

// ========================================
// Row DTO → Domain Entity
// ========================================

impl TryFrom<OnlineUserRow> for Participant {
    type Error = RepositoryError;

    fn try_from(row: OnlineUserRow) -> Result<Self, Self::Error> {
        let id = ParticipantId::new(row.user_id)
            .map_err(|e| RepositoryError::Malformed(e.to_string()))?;
        let last_seen = rfc3339_to_timestamp(&row.last_ping).ok_or_else(|| {
            RepositoryError::Malformed(format!("invalid last_ping '{}'", row.last_ping))
        })?;
        Ok(Participant::new(id, Timestamp::new(last_seen)))
    }
}

impl From<&Participant> for OnlineUserRow {
    fn from(model: &Participant) -> Self {
        Self {
            user_id: model.id.as_str().to_string(),
            last_ping: timestamp_to_rfc3339(model.last_seen.value()),
        }
    }
}

impl From<TopicRow> for Topic {
    fn from(row: TopicRow) -> Self {
        Self {
            id: TopicId::new(row.id),
            title: row.title,
            proposed_by: row.proposed_by,
            round_key: RoundKey::new(row.round_key),
            level: row.level,
            votes: row.votes.unwrap_or(0).max(0) as u64,
            eligible: row.eligible,
            finalized: row.finalized,
        }
    }
}

// ========================================
// Domain Entity → DTO
// ========================================

impl From<LobbyState> for LobbyStateDto {
    fn from(state: LobbyState) -> Self {
        match state {
            LobbyState::Waiting => Self::Waiting,
            LobbyState::QuorumReached => Self::QuorumReached,
            LobbyState::Released => Self::Released,
        }
    }
}

impl From<LobbyStatus> for LobbyStatusDto {
    fn from(model: LobbyStatus) -> Self {
        Self {
            state: model.state.into(),
            online_count: model.online_count,
            quorum_size: model.quorum_size.value(),
            countdown_ends_at: model.countdown_ends_at.map(|ts| ts.value()),
        }
    }
}

impl From<Topic> for TopicDto {
    fn from(model: Topic) -> Self {
        Self {
            id: model.id.value(),
            title: model.title,
            proposed_by: model.proposed_by,
            round_key: model.round_key.value(),
            level: model.level,
            votes: model.votes,
        }
    }
}

impl From<OfferedTopics> for OfferedTopicsResponse {
    fn from(model: OfferedTopics) -> Self {
        Self {
            round: model.round.map(|round| round.value()),
            topics: model.topics.into_iter().map(TopicDto::from).collect(),
        }
    }
}

impl From<VoteReceipt> for VoteResponse {
    fn from(receipt: VoteReceipt) -> Self {
        Self {
            topic_id: receipt.topic_id.value(),
            round: receipt.round.value(),
            offered: receipt.offered.map(OfferedTopicsResponse::from),
        }
    }
}

impl From<Session> for SessionResponse {
    fn from(model: Session) -> Self {
        Self {
            participant_id: model.participant_id.into_string(),
            email: model
                .email
                .map(|email| email.as_str().to_string())
                .unwrap_or_default(),
            access_token: model.access_token.as_str().to_string(),
        }
    }
}
