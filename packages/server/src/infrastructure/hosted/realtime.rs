//! ホスト型バックエンドの Change Notifier（Phoenix チャンネル）
//!
//! 購読ごとに realtime エンドポイントへ WebSocket 接続を張り、`phx_join` の承認を
//! 待ってから `postgres_changes` を `ChangeEvent` として流します。
//! 接続が切れると feed が閉じ、購読側（Presence Watcher）が再購読します。

use std::{
    collections::HashMap,
    fmt::Display,
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::{
    domain::{ChangeEvent, ChangeFeed, ChangeNotifier, NotifierError, SubscriptionHandle},
    infrastructure::dto::realtime::PhoenixFrame,
};

use super::client::HostedConfig;

const SCHEMA: &str = "public";
const JOIN_REF: &str = "1";
const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);
const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_secs(10);

pub struct RealtimeChangeNotifier {
    url: String,
    heartbeat_interval: Duration,
    join_timeout: Duration,
    next_handle: AtomicU64,
    tasks: Mutex<HashMap<SubscriptionHandle, JoinHandle<()>>>,
}

impl RealtimeChangeNotifier {
    pub fn new(config: &HostedConfig) -> Self {
        Self::with_url(config.realtime_url())
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            join_timeout: DEFAULT_JOIN_TIMEOUT,
            next_handle: AtomicU64::new(1),
            tasks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_heartbeat_interval(mut self, heartbeat_interval: Duration) -> Self {
        self.heartbeat_interval = heartbeat_interval;
        self
    }
}

fn encode(frame: &PhoenixFrame) -> Result<Message, String> {
    serde_json::to_string(frame)
        .map(|json| Message::Text(json.into()))
        .map_err(|e| e.to_string())
}

/// `phx_join` への返信を待つ
async fn wait_for_join<R, E>(read: &mut R) -> Result<(), String>
where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    while let Some(message) = read.next().await {
        let message = message.map_err(|e| e.to_string())?;
        let Message::Text(text) = message else {
            continue;
        };
        let Ok(frame) = serde_json::from_str::<PhoenixFrame>(&text) else {
            continue;
        };
        if let Some(reply) = frame.reply_to(JOIN_REF) {
            return reply;
        }
    }
    Err("connection closed before join reply".to_string())
}

/// 受信したフレームを feed へ流し、定期的にハートビートを送る
async fn pump<W, R, E>(
    mut write: W,
    mut read: R,
    events: mpsc::UnboundedSender<ChangeEvent>,
    table: String,
    heartbeat_interval: Duration,
) where
    W: Sink<Message> + Unpin,
    W::Error: Display,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let mut heartbeat = tokio::time::interval(heartbeat_interval);
    heartbeat.tick().await;
    let mut next_ref: u64 = 2;

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                let frame = PhoenixFrame::heartbeat(&next_ref.to_string());
                next_ref += 1;
                let sent = match encode(&frame) {
                    Ok(message) => write.send(message).await.map_err(|e| e.to_string()),
                    Err(e) => Err(e),
                };
                if let Err(e) = sent {
                    tracing::warn!("Realtime heartbeat failed: {}", e);
                    break;
                }
            }
            _ = events.closed() => break,
            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    let Ok(frame) = serde_json::from_str::<PhoenixFrame>(&text) else {
                        tracing::debug!("Ignoring undecodable realtime frame");
                        continue;
                    };
                    if let Some(kind) = frame.change_of(&table) {
                        let event = ChangeEvent { table: table.clone(), kind };
                        if events.send(event).is_err() {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!("Realtime connection for '{}' closed", table);
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!("Realtime connection for '{}' failed: {}", table, e);
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl ChangeNotifier for RealtimeChangeNotifier {
    async fn subscribe(&self, table: &str) -> Result<ChangeFeed, NotifierError> {
        let failed = |reason: String| NotifierError::SubscribeFailed {
            table: table.to_string(),
            reason,
        };

        let (stream, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| failed(e.to_string()))?;
        let (mut write, mut read) = stream.split();

        let join = encode(&PhoenixFrame::join(SCHEMA, table, JOIN_REF)).map_err(failed)?;
        write.send(join).await.map_err(|e| failed(e.to_string()))?;
        tokio::time::timeout(self.join_timeout, wait_for_join(&mut read))
            .await
            .map_err(|_| failed("join timed out".to_string()))?
            .map_err(failed)?;

        let handle = SubscriptionHandle::new(self.next_handle.fetch_add(1, Ordering::SeqCst));
        let (sender, events) = mpsc::unbounded_channel();
        let task = tokio::spawn(pump(
            write,
            read,
            sender,
            table.to_string(),
            self.heartbeat_interval,
        ));
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle, task);
        tracing::debug!("Realtime subscription {} joined '{}'", handle.value(), table);

        Ok(ChangeFeed { handle, events })
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) {
        let task = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle);
        if let Some(task) = task {
            task.abort();
            tracing::debug!("Realtime subscription {} closed", handle.value());
        }
    }
}
