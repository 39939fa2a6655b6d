//! ホスト型バックエンドの REST クライアント

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use thiserror::Error;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// REST 呼び出しの失敗
#[derive(Debug, Error)]
pub enum HostedError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

impl HostedError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Transport(e) => e.status(),
            Self::Status { status, .. } => Some(*status),
        }
    }
}

/// 接続設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedConfig {
    /// 例: `https://project.example.co`
    pub base_url: String,
    pub api_key: String,
    pub request_timeout: Duration,
}

impl HostedConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// realtime の WebSocket エンドポイント（`http(s)` を `ws(s)` に置き換える）
    pub fn realtime_url(&self) -> String {
        let ws_base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            self.base_url.clone()
        };
        format!(
            "{}/realtime/v1/websocket?apikey={}&vsn=1.0.0",
            ws_base, self.api_key
        )
    }
}

/// 全アダプターで共有する HTTP クライアント
#[derive(Debug, Clone)]
pub struct HostedClient {
    http: reqwest::Client,
    config: HostedConfig,
}

impl HostedClient {
    pub fn new(config: HostedConfig) -> Result<Self, HostedError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &HostedConfig {
        &self.config
    }

    /// `{base}/rest/v1/{path}` へのリクエスト（サービスの API キーで認可）
    pub fn rest(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}/rest/v1/{}", self.config.base_url, path))
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }

    /// `{base}/auth/v1/{path}` へのリクエスト
    pub fn auth(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}/auth/v1/{}", self.config.base_url, path))
            .header("apikey", &self.config.api_key)
    }

    /// 送信して、2xx 以外を `HostedError::Status` にする
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, HostedError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::debug!("Backend returned {}: {}", status, body);
        Err(HostedError::Status { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_realtime_url_switches_scheme() {
        // テスト項目: realtime の URL は ws(s) スキームになり、末尾のスラッシュは除かれる
        // given (前提条件):
        let secure = HostedConfig::new("https://project.example.co/", "key");
        let local = HostedConfig::new("http://127.0.0.1:54321", "key");

        // when (操作):
        let secure = secure.realtime_url();
        let local = local.realtime_url();

        // then (期待する結果):
        assert_eq!(
            secure,
            "wss://project.example.co/realtime/v1/websocket?apikey=key&vsn=1.0.0"
        );
        assert_eq!(
            local,
            "ws://127.0.0.1:54321/realtime/v1/websocket?apikey=key&vsn=1.0.0"
        );
    }
}
