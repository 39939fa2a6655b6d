//! Lobby WebSocket message DTOs.

use serde::{Deserialize, Serialize};

/// Lobby state on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LobbyStateDto {
    Waiting,
    QuorumReached,
    Released,
}

/// Lobby status pushed to every connection on change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyStatusDto {
    pub state: LobbyStateDto,
    pub online_count: usize,
    pub quorum_size: usize,
    /// Unix milliseconds, present while counting down
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub countdown_ends_at: Option<i64>,
}

/// Server → client messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum LobbyServerMessage {
    LobbyStatus(LobbyStatusDto),
    LobbyReleased { released_at: i64 },
}

/// Client → server messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum LobbyClientMessage {
    Heartbeat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message_wire_format() {
        // テスト項目: lobby-status はフィールドが平坦化された JSON になる
        // given (前提条件):
        let message = LobbyServerMessage::LobbyStatus(LobbyStatusDto {
            state: LobbyStateDto::QuorumReached,
            online_count: 4,
            quorum_size: 4,
            countdown_ends_at: Some(6_000),
        });

        // when (操作):
        let json = serde_json::to_value(&message).unwrap();

        // then (期待する結果):
        assert_eq!(
            json,
            serde_json::json!({
                "type": "lobby-status",
                "state": "quorum-reached",
                "online_count": 4,
                "quorum_size": 4,
                "countdown_ends_at": 6000
            })
        );
    }

    #[test]
    fn test_heartbeat_is_parsed() {
        // テスト項目: クライアントのハートビートを解釈できる
        // given (前提条件):
        let raw = r#"{"type":"heartbeat"}"#;

        // when (操作):
        let message: Result<LobbyClientMessage, _> = serde_json::from_str(raw);

        // then (期待する結果):
        assert_eq!(message.unwrap(), LobbyClientMessage::Heartbeat);
        assert!(serde_json::from_str::<LobbyClientMessage>(r#"{"type":"chat"}"#).is_err());
    }

    #[test]
    fn test_released_message_without_countdown() {
        // テスト項目: lobby-released を解釈でき、status の countdown は省略可能
        // given (前提条件):
        let released = r#"{"type":"lobby-released","released_at":42}"#;
        let status = r#"{"type":"lobby-status","state":"waiting","online_count":1,"quorum_size":4}"#;

        // when (操作):
        let released: LobbyServerMessage = serde_json::from_str(released).unwrap();
        let status: LobbyServerMessage = serde_json::from_str(status).unwrap();

        // then (期待する結果):
        assert_eq!(released, LobbyServerMessage::LobbyReleased { released_at: 42 });
        assert!(matches!(
            status,
            LobbyServerMessage::LobbyStatus(LobbyStatusDto {
                countdown_ends_at: None,
                ..
            })
        ));
    }
}
