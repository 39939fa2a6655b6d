//! ロビーの状態機械
//!
//! オンライン人数からクォーラム成立を判定し、`Waiting → QuorumReached → Released`
//! を進める純粋なロジック。タイマーやストアへのアクセスは UseCase 層が担当します。
//!
//! ## 遷移規則
//!
//! | 現在の状態      | 入力                         | 次の状態        | アクション        |
//! |-----------------|------------------------------|-----------------|-------------------|
//! | `Waiting`       | 人数 >= クォーラム           | `QuorumReached` | カウントダウン開始 |
//! | `QuorumReached` | 人数 < クォーラム            | `Waiting`       | カウントダウン取消 |
//! | `QuorumReached` | カウントダウン完了（世代一致） | `Released`      | 解放アクション     |
//! | `Released`      | 何でも                       | `Released`      | なし              |

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::value_object::{QuorumSize, Timestamp};

/// ロビーの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LobbyState {
    Waiting,
    QuorumReached,
    Released,
}

/// 参加者に配信するロビーの状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LobbyStatus {
    pub state: LobbyState,
    pub online_count: usize,
    pub quorum_size: QuorumSize,
    /// `QuorumReached` の間だけ値を持つ
    pub countdown_ends_at: Option<Timestamp>,
}

/// Snapshot 評価の結果、UseCase 層が実行すべきこと
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateAction {
    /// 何もしない
    Hold,
    /// カウントダウンを開始する（完了時に `generation` を渡す）
    StartCountdown { generation: u64 },
    /// 進行中のカウントダウンを取り消す
    CancelCountdown,
}

/// クォーラム判定の状態機械
///
/// `generation` はカウントダウンの世代。クォーラムを失うたびに進むため、
/// 取り消し済みのタイマーが完了を報告しても無視される。
#[derive(Debug, Clone)]
pub struct QuorumGate {
    quorum_size: QuorumSize,
    state: LobbyState,
    online_count: usize,
    generation: u64,
    countdown_ends_at: Option<Timestamp>,
}

impl QuorumGate {
    pub fn new(quorum_size: QuorumSize) -> Self {
        Self {
            quorum_size,
            state: LobbyState::Waiting,
            online_count: 0,
            generation: 0,
            countdown_ends_at: None,
        }
    }

    pub fn state(&self) -> LobbyState {
        self.state
    }

    pub fn online_count(&self) -> usize {
        self.online_count
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// 最新の Snapshot の人数を評価する
    ///
    /// 同じ人数で何度呼んでも結果は変わらない（冪等）。
    pub fn observe(
        &mut self,
        online_count: usize,
        now: Timestamp,
        grace_delay: Duration,
    ) -> GateAction {
        self.online_count = online_count;
        let quorum_met = self.quorum_size.is_met_by(online_count);

        match (self.state, quorum_met) {
            (LobbyState::Waiting, true) => {
                self.state = LobbyState::QuorumReached;
                self.generation += 1;
                self.countdown_ends_at = Some(now.saturating_add(grace_delay));
                GateAction::StartCountdown {
                    generation: self.generation,
                }
            }
            (LobbyState::QuorumReached, false) => {
                self.state = LobbyState::Waiting;
                self.generation += 1;
                self.countdown_ends_at = None;
                GateAction::CancelCountdown
            }
            _ => GateAction::Hold,
        }
    }

    /// カウントダウン完了を報告する
    ///
    /// `Released` に遷移した場合のみ `true`。世代が古い、または既に解放済みなら `false`。
    pub fn complete_countdown(&mut self, generation: u64) -> bool {
        if self.state != LobbyState::QuorumReached || generation != self.generation {
            return false;
        }
        self.state = LobbyState::Released;
        self.countdown_ends_at = None;
        true
    }

    pub fn status(&self) -> LobbyStatus {
        LobbyStatus {
            state: self.state,
            online_count: self.online_count,
            quorum_size: self.quorum_size,
            countdown_ends_at: self.countdown_ends_at,
        }
    }
}
