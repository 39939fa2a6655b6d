//! Lobby configuration.
//!
//! Built from command-line arguments by the binary and validated once at startup.

use std::time::Duration;

use thiserror::Error;

use crate::domain::QuorumSize;

/// Presence table watched for changes.
pub const PRESENCE_TABLE: &str = "online_users";

const DEFAULT_GRACE_DELAY: Duration = Duration::from_secs(5);
const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_STALENESS_WINDOW: Duration = Duration::from_secs(15);
const DEFAULT_TOPICS_PER_ROUND: usize = 3;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("quorum size must be at least 1")]
    InvalidQuorumSize,

    #[error("staleness window ({window:?}) must not be shorter than the heartbeat interval ({interval:?})")]
    StalenessWindowTooShort { window: Duration, interval: Duration },

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("topics per round must be at least 1")]
    InvalidTopicsPerRound,
}

/// Exponential backoff with an optional attempt limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    /// `None` retries forever
    pub max_attempts: Option<u32>,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Backoff {
    /// Delay before the given attempt (1-indexed): `initial * 2^(attempt-1)`, capped at `max_delay`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }

    /// Whether another attempt is allowed after `attempts_made` attempts
    pub fn allows(&self, attempts_made: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempts_made < max)
    }
}

/// Lobby presence and ballot settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LobbyConfig {
    pub quorum_size: QuorumSize,
    /// Delay between reaching quorum and releasing the lobby
    pub grace_delay: Duration,
    /// Interval between stale-presence sweeps (and the expected client heartbeat)
    pub heartbeat_interval: Duration,
    /// Maximum age of a last-seen timestamp before a participant counts as gone
    pub staleness_window: Duration,
    pub topics_per_round: usize,
    /// Resubscription policy for the change feed
    pub watcher_backoff: Backoff,
    /// Retry policy for the release action
    pub release_retry: Backoff,
}

impl LobbyConfig {
    /// Configuration with defaults for everything but the quorum size
    pub fn new(quorum_size: usize) -> Result<Self, ConfigError> {
        let quorum_size = QuorumSize::new(quorum_size).map_err(|_| ConfigError::InvalidQuorumSize)?;
        Ok(Self {
            quorum_size,
            grace_delay: DEFAULT_GRACE_DELAY,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            staleness_window: DEFAULT_STALENESS_WINDOW,
            topics_per_round: DEFAULT_TOPICS_PER_ROUND,
            watcher_backoff: Backoff {
                max_attempts: None,
                initial_delay: Duration::from_millis(500),
                max_delay: Duration::from_secs(30),
            },
            release_retry: Backoff {
                max_attempts: Some(3),
                initial_delay: Duration::from_millis(200),
                max_delay: Duration::from_secs(2),
            },
        })
    }

    pub fn with_grace_delay(mut self, grace_delay: Duration) -> Self {
        self.grace_delay = grace_delay;
        self
    }

    pub fn with_heartbeat_interval(mut self, heartbeat_interval: Duration) -> Self {
        self.heartbeat_interval = heartbeat_interval;
        self
    }

    pub fn with_staleness_window(mut self, staleness_window: Duration) -> Self {
        self.staleness_window = staleness_window;
        self
    }

    pub fn with_topics_per_round(mut self, topics_per_round: usize) -> Self {
        self.topics_per_round = topics_per_round;
        self
    }

    /// Check cross-field constraints
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.heartbeat_interval.is_zero() {
            return Err(ConfigError::ZeroDuration("heartbeat interval"));
        }
        if self.staleness_window < self.heartbeat_interval {
            return Err(ConfigError::StalenessWindowTooShort {
                window: self.staleness_window,
                interval: self.heartbeat_interval,
            });
        }
        if self.topics_per_round == 0 {
            return Err(ConfigError::InvalidTopicsPerRound);
        }
        Ok(self)
    }
}
