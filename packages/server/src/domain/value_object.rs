//! 値オブジェクト
//!
//! 生成時に検証を行い、不正な値を持つインスタンスが存在しないことを保証します。

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::ValueObjectError;

/// 参加者 ID の最大長
pub const PARTICIPANT_ID_MAX_LEN: usize = 128;

/// 参加者 ID（Identity Boundary が発行する不透明な文字列）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::ParticipantIdEmpty);
        }
        let actual = trimmed.chars().count();
        if actual > PARTICIPANT_ID_MAX_LEN {
            return Err(ValueObjectError::ParticipantIdTooLong {
                max: PARTICIPANT_ID_MAX_LEN,
                actual,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ParticipantId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// メールアドレス（ログイン ID）
///
/// 形式の検証は最小限（`local@domain`）。実在確認は Identity Boundary の責務。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let normalized = value.trim().to_lowercase();
        match normalized.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
                Ok(Self(normalized))
            }
            _ => Err(ValueObjectError::InvalidEmail(value)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Email {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// アクセストークン（Identity Boundary が発行）
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::AccessTokenEmpty);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// トークンをログに出さない
impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Unix タイムスタンプ（UTC, ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// `duration` 後のタイムスタンプ
    pub fn saturating_add(&self, duration: Duration) -> Self {
        Self(self.0.saturating_add(duration_millis(duration)))
    }

    /// `duration` 前のタイムスタンプ
    pub fn saturating_sub(&self, duration: Duration) -> Self {
        Self(self.0.saturating_sub(duration_millis(duration)))
    }
}

fn duration_millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

/// トピック ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TopicId(i64);

impl TopicId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for TopicId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 投票ラウンドのキー
///
/// 公開中のトピックのうち最小のキーが現在のラウンド。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoundKey(i64);

impl RoundKey {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// クォーラム（投票開始に必要な同時オンライン人数）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumSize(usize);

impl QuorumSize {
    pub fn new(value: usize) -> Result<Self, ValueObjectError> {
        if value == 0 {
            return Err(ValueObjectError::QuorumSizeZero);
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> usize {
        self.0
    }

    pub fn is_met_by(&self, online_count: usize) -> bool {
        online_count >= self.0
    }
}
