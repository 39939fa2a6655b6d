//! Lobby WebSocket connection handler.
//!
//! 1 接続 = 1 参加者。接続中は lobby-status を受け取り、クライアントは
//! ハートビートを送り続けます。切断で離脱が記録されます。

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::{mpsc, watch};

use crate::{
    domain::{AccessToken, LobbyState, LobbyStatus, ParticipantId},
    infrastructure::dto::websocket::{LobbyClientMessage, LobbyServerMessage},
    ui::{error::ApiError, state::AppState},
};

/// Query parameters for the lobby connection
#[derive(Debug, Deserialize)]
pub struct LobbyQuery {
    pub access_token: String,
}

fn status_message(status: LobbyStatus) -> Option<String> {
    serde_json::to_string(&LobbyServerMessage::LobbyStatus(status.into())).ok()
}

pub async fn lobby_websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<LobbyQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let token = AccessToken::new(query.access_token).map_err(|_| ApiError::MissingToken)?;
    let session = state.authenticate_usecase.execute(&token).await?;
    let participant_id = session.participant_id;

    let (tx, rx) = mpsc::unbounded_channel();
    let initial_status = state
        .join_lobby_usecase
        .execute(participant_id.clone(), tx.clone())
        .await
        .inspect_err(|e| tracing::warn!("Rejecting lobby connection: {}", e))?;
    tracing::info!("Participant '{}' joined the lobby", participant_id.as_str());

    let cleanup_state = state.clone();
    let cleanup_id = participant_id.clone();
    Ok(ws
        .on_failed_upgrade(move |e| {
            tracing::warn!("WebSocket upgrade failed: {}", e);
            tokio::spawn(async move {
                cleanup_state.leave_lobby_usecase.execute(&cleanup_id).await;
            });
        })
        .on_upgrade(move |socket| {
            handle_socket(socket, state, participant_id, tx, rx, initial_status)
        }))
}

/// Forwards messages queued for this participant to the WebSocket.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

/// Queues a lobby-status message on every status change.
fn status_loop(
    mut status_rx: watch::Receiver<LobbyStatus>,
    tx: mpsc::UnboundedSender<String>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while status_rx.changed().await.is_ok() {
            let status = status_rx.borrow_and_update().clone();
            let Some(json) = status_message(status) else {
                continue;
            };
            if tx.send(json).is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    participant_id: ParticipantId,
    tx: mpsc::UnboundedSender<String>,
    rx: mpsc::UnboundedReceiver<String>,
    initial_status: LobbyStatus,
) {
    let (sender, mut receiver) = socket.split();

    let mut status_rx = state.join_lobby_usecase.watch_status();
    status_rx.borrow_and_update();

    // 接続直後の状態を送る（解放済みなら投票画面へ進ませる）
    let released = initial_status.state == LobbyState::Released;
    if let Some(json) = status_message(initial_status) {
        let _ = tx.send(json);
    }
    if released
        && let Ok(json) = serde_json::to_string(&LobbyServerMessage::LobbyReleased {
            released_at: quorum_shared::time::get_utc_timestamp(),
        })
    {
        let _ = tx.send(json);
    }

    let mut send_task = pusher_loop(rx, sender);
    let mut status_task = status_loop(status_rx, tx);

    let recv_state = state.clone();
    let recv_id = participant_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error from '{}': {}", recv_id.as_str(), e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => match serde_json::from_str::<LobbyClientMessage>(&text) {
                    Ok(LobbyClientMessage::Heartbeat) => {
                        recv_state.join_lobby_usecase.heartbeat(&recv_id).await;
                    }
                    Err(e) => {
                        tracing::debug!("Ignoring message from '{}': {}", recv_id.as_str(), e);
                    }
                },
                Message::Close(_) => {
                    tracing::info!("Participant '{}' requested close", recv_id.as_str());
                    break;
                }
                _ => {}
            }
        }
    });

    // いずれかのタスクが終わったら残りも止める
    tokio::select! {
        _ = &mut recv_task => {},
        _ = &mut send_task => {},
        _ = &mut status_task => {},
    };
    recv_task.abort();
    send_task.abort();
    status_task.abort();

    state.leave_lobby_usecase.execute(&participant_id).await;
}
