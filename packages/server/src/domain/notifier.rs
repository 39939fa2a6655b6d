//! Change Notifier trait 定義
//!
//! Presence Store の変更をプッシュで受け取るためのインターフェース。
//! 通知は少なくとも 1 回（重複あり）届く前提で、受け取る側は毎回ストアを読み直します。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::error::NotifierError;

/// 購読の識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

impl SubscriptionHandle {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// 変更の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// テーブルの変更通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: String,
    pub kind: ChangeKind,
}

/// 購読の結果
///
/// `events` が閉じたら接続が切れたとみなし、購読し直す。
#[derive(Debug)]
pub struct ChangeFeed {
    pub handle: SubscriptionHandle,
    pub events: mpsc::UnboundedReceiver<ChangeEvent>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChangeNotifier: Send + Sync {
    /// テーブルの変更を購読
    async fn subscribe(&self, table: &str) -> Result<ChangeFeed, NotifierError>;

    /// 購読を解除（解除済みの handle でも問題なし）
    fn unsubscribe(&self, handle: SubscriptionHandle);
}
