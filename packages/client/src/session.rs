//! Lobby WebSocket session.
//!
//! Stays connected while the lobby fills up, sends a heartbeat every
//! `heartbeat_interval` and returns once the lobby is released.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use quorum_server::infrastructure::dto::websocket::{
    LobbyClientMessage, LobbyServerMessage, LobbyStateDto,
};
use quorum_shared::time::get_utc_timestamp;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, http::StatusCode, protocol::Message},
};

use crate::{error::ClientError, formatter::MessageFormatter};

/// Map a failed handshake to a client error
fn connect_error(error: WsError) -> ClientError {
    match &error {
        WsError::Http(response) if response.status() == StatusCode::CONFLICT => {
            ClientError::AlreadyConnected
        }
        WsError::Http(response) if response.status() == StatusCode::UNAUTHORIZED => {
            ClientError::InvalidCredentials
        }
        _ => ClientError::ConnectionError(error.to_string()),
    }
}

/// Run the lobby session until the lobby is released
///
/// # Returns
///
/// * `Ok(released_at)` - Unix timestamp (milliseconds) of the release
/// * `Err(ClientError::AlreadyConnected)` - Another connection for this account is open
/// * `Err(ClientError::ConnectionError)` - The connection failed or was lost
pub async fn run_lobby_session(
    url: &str,
    heartbeat_interval: Duration,
) -> Result<i64, ClientError> {
    let (ws_stream, _) = connect_async(url).await.map_err(connect_error)?;
    tracing::info!("Connected to the lobby");

    let (mut write, mut read) = ws_stream.split();

    let heartbeat = serde_json::to_string(&LobbyClientMessage::Heartbeat)
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;
    let mut ticker = tokio::time::interval(heartbeat_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = write.send(Message::Text(heartbeat.clone().into())).await {
                    return Err(ClientError::ConnectionError(e.to_string()));
                }
            }
            message = read.next() => {
                let text = match message {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::info!("Server closed the connection");
                        return Err(ClientError::ConnectionError(
                            "Connection lost".to_string(),
                        ));
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        tracing::warn!("WebSocket read error: {}", e);
                        return Err(ClientError::ConnectionError(e.to_string()));
                    }
                };

                match serde_json::from_str::<LobbyServerMessage>(&text) {
                    Ok(LobbyServerMessage::LobbyStatus(status)) => {
                        print!(
                            "{}",
                            MessageFormatter::format_lobby_status(&status, get_utc_timestamp())
                        );
                        // lobby-released が届かなかった場合もここで投票に進む
                        if status.state == LobbyStateDto::Released {
                            let _ = write.send(Message::Close(None)).await;
                            return Ok(get_utc_timestamp());
                        }
                    }
                    Ok(LobbyServerMessage::LobbyReleased { released_at }) => {
                        print!("{}", MessageFormatter::format_lobby_released(released_at));
                        let _ = write.send(Message::Close(None)).await;
                        return Ok(released_at);
                    }
                    Err(e) => {
                        tracing::debug!("Ignoring unknown lobby message: {}", e);
                    }
                }
            }
        }
    }
}
