//! バックグラウンドタスクの所有権
//!
//! 所有者のスコープが終わると同時にタスクを中断します。

use tokio::task::JoinHandle;

/// Drop 時に中断されるタスク
#[derive(Debug)]
pub struct BackgroundTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl BackgroundTask {
    pub fn spawn<F>(name: &'static str, future: F) -> Self
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        tracing::debug!("Background task '{}' started", name);
        Self {
            name,
            handle: tokio::spawn(future),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for BackgroundTask {
    fn drop(&mut self) {
        self.handle.abort();
        tracing::debug!("Background task '{}' stopped", self.name);
    }
}
