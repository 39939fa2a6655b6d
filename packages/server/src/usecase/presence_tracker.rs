//! UseCase: ロビーの参加者数の追跡とクォーラム判定
//!
//! Presence Store を唯一の正とし、変更通知のたびに Snapshot を読み直して
//! `QuorumGate` を評価します。ローカルに人数を積算することはありません。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - 到着・離脱の記録が Presence Store に反映されること
//! - Snapshot の人数でクォーラムを判定し、カウントダウン後に一度だけ解放されること
//! - カウントダウン中にクォーラムを失うと取り消され、再到達で最初からやり直すこと
//! - ストアの読み込み失敗・不正な行では状態を維持し、0 件の読み込みは 0 人として扱うこと
//! - stale な参加者が人数に含まれず、prune で削除されること
//!
//! ### どのような状況を想定しているか
//! - 正常系：4 人揃って解放される
//! - 異常系：ストアの読み込み失敗、解放アクションの失敗（リトライ）
//! - エッジケース：同じ人数の通知の重複、猶予中に全員が離脱

use std::sync::Arc;

use quorum_shared::time::Clock;
use tokio::{
    sync::{Mutex, watch},
    task::JoinHandle,
};

use crate::{
    config::{Backoff, LobbyConfig},
    domain::{
        GateAction, LobbyState, LobbyStatus, ParticipantId, PresenceSnapshot, PresenceStore,
        QuorumGate, ReleaseAction, ReleaseError, Timestamp,
    },
};

/// Tracker の動作設定
#[derive(Debug, Clone, Copy)]
struct TrackerSettings {
    grace_delay: std::time::Duration,
    staleness_window: std::time::Duration,
    release_retry: Backoff,
}

struct TrackerInner {
    gate: QuorumGate,
    /// 進行中のカウントダウン
    countdown: Option<JoinHandle<()>>,
}

/// ロビーの参加者数を追跡し、クォーラム到達時にロビーを解放する
pub struct LobbyPresenceTracker {
    /// Presence Store（オンライン状態の正）
    presence_store: Arc<dyn PresenceStore>,
    /// 解放時に実行するアクション（冪等）
    release_action: Arc<dyn ReleaseAction>,
    clock: Arc<dyn Clock>,
    settings: TrackerSettings,
    inner: Mutex<TrackerInner>,
    status_tx: watch::Sender<LobbyStatus>,
}

impl LobbyPresenceTracker {
    /// 新しい LobbyPresenceTracker を作成
    pub fn new(
        config: &LobbyConfig,
        presence_store: Arc<dyn PresenceStore>,
        release_action: Arc<dyn ReleaseAction>,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        let gate = QuorumGate::new(config.quorum_size);
        let (status_tx, _) = watch::channel(gate.status());

        Arc::new(Self {
            presence_store,
            release_action,
            clock,
            settings: TrackerSettings {
                grace_delay: config.grace_delay,
                staleness_window: config.staleness_window,
                release_retry: config.release_retry,
            },
            inner: Mutex::new(TrackerInner {
                gate,
                countdown: None,
            }),
            status_tx,
        })
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }

    /// 参加者をオンラインとして記録（last_seen を更新）
    ///
    /// 人数は Snapshot から数えるため、同じ参加者を何度記録しても二重に数えない。
    /// ストアへの書き込み失敗は握りつぶす（stale の prune が最終的に整合させる）。
    pub async fn record_arrival(&self, participant_id: &ParticipantId) {
        if let Err(e) = self.presence_store.upsert(participant_id, self.now()).await {
            tracing::warn!(
                "Failed to record arrival of '{}': {}",
                participant_id.as_str(),
                e
            );
        }
    }

    /// 参加者をオフラインとして記録（未登録なら何もしない）
    pub async fn record_departure(&self, participant_id: &ParticipantId) {
        if let Err(e) = self.presence_store.delete(participant_id).await {
            tracing::warn!(
                "Failed to record departure of '{}': {}",
                participant_id.as_str(),
                e
            );
        }
    }

    /// Presence Store を読み直して評価する
    ///
    /// 読み込み失敗や不正な行の場合は直前の状態を維持する。
    /// 読み込みに成功して 0 件なら 0 人として評価する。
    pub async fn refresh(self: &Arc<Self>) -> LobbyStatus {
        let rows = match self.presence_store.select_all().await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!("Failed to read presence snapshot, holding state: {}", e);
                return self.status();
            }
        };

        let snapshot = PresenceSnapshot::from_participants(rows);
        let cutoff = self.now().saturating_sub(self.settings.staleness_window);
        self.on_snapshot_changed(snapshot.excluding_stale(cutoff)).await
    }

    /// 新しい Snapshot でクォーラムを評価する
    pub async fn on_snapshot_changed(
        self: &Arc<Self>,
        snapshot: PresenceSnapshot,
    ) -> LobbyStatus {
        let mut inner = self.inner.lock().await;

        let action = inner
            .gate
            .observe(snapshot.len(), self.now(), self.settings.grace_delay);
        match action {
            GateAction::StartCountdown { generation } => {
                if let Some(previous) = inner.countdown.take() {
                    previous.abort();
                }
                inner.countdown = Some(self.spawn_countdown(generation));
                tracing::info!(
                    "Quorum reached with {} participants, releasing in {:?}",
                    snapshot.len(),
                    self.settings.grace_delay
                );
            }
            GateAction::CancelCountdown => {
                if let Some(countdown) = inner.countdown.take() {
                    countdown.abort();
                }
                tracing::info!(
                    "Quorum lost ({} participants online), countdown cancelled",
                    snapshot.len()
                );
            }
            GateAction::Hold => {}
        }

        let status = inner.gate.status();
        self.publish(status.clone());
        status
    }

    fn spawn_countdown(self: &Arc<Self>, generation: u64) -> JoinHandle<()> {
        let tracker = Arc::clone(self);
        let grace_delay = self.settings.grace_delay;
        tokio::spawn(async move {
            tokio::time::sleep(grace_delay).await;
            tracker.complete_countdown(generation).await;
        })
    }

    async fn complete_countdown(&self, generation: u64) {
        {
            let mut inner = self.inner.lock().await;
            if !inner.gate.complete_countdown(generation) {
                tracing::debug!("Countdown generation {} is outdated", generation);
                return;
            }
            // 自分自身のハンドルなので abort せずに手放す
            inner.countdown = None;
            self.publish(inner.gate.status());
        }

        tracing::info!("Lobby released");
        if let Err(e) = self.release().await {
            tracing::error!("Lobby release action failed: {}", e);
        }
    }

    /// 解放アクションを実行する（失敗時はバックオフしてリトライ）
    ///
    /// ロビーが解放済みでなければ何もしない。何度呼んでもよい。
    pub async fn release(&self) -> Result<(), ReleaseError> {
        if self.status().state != LobbyState::Released {
            return Ok(());
        }

        let policy = self.settings.release_retry;
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.release_action.release().await {
                Ok(()) => return Ok(()),
                Err(e) if policy.allows(attempts) => {
                    let delay = policy.delay_for(attempts);
                    tracing::warn!(
                        "Release attempt {} failed: {}. Retrying in {:?}",
                        attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// 期限切れの参加者を Presence Store から削除する
    ///
    /// 削除した参加者がいれば Snapshot を読み直す。
    pub async fn prune_stale(self: &Arc<Self>) -> Vec<ParticipantId> {
        let cutoff = self.now().saturating_sub(self.settings.staleness_window);
        let stale = match self.presence_store.select_stale(cutoff).await {
            Ok(stale) => stale,
            Err(e) => {
                tracing::warn!("Failed to query stale participants: {}", e);
                return Vec::new();
            }
        };

        let mut pruned = Vec::with_capacity(stale.len());
        for participant in stale {
            match self.presence_store.delete(&participant.id).await {
                Ok(()) => pruned.push(participant.id),
                Err(e) => tracing::warn!(
                    "Failed to prune stale participant '{}': {}",
                    participant.id.as_str(),
                    e
                ),
            }
        }

        if !pruned.is_empty() {
            tracing::info!("Pruned {} stale participants", pruned.len());
            self.refresh().await;
        }
        pruned
    }

    /// 現在のロビーの状態
    pub fn status(&self) -> LobbyStatus {
        self.status_tx.borrow().clone()
    }

    /// ロビーの状態の変化を購読
    pub fn subscribe(&self) -> watch::Receiver<LobbyStatus> {
        self.status_tx.subscribe()
    }

    /// 進行中のカウントダウンを取り消す（所有者の終了時）
    pub async fn shutdown(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(countdown) = inner.countdown.take() {
            countdown.abort();
            tracing::info!("Pending lobby release cancelled on shutdown");
        }
    }

    fn publish(&self, status: LobbyStatus) {
        self.status_tx.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            *current = status;
            true
        });
    }
}
