//! テスト用の偽バックエンド（axum をエフェメラルポートで起動）

use axum::Router;
use tokio::net::TcpListener;

use super::{HostedClient, HostedConfig};

/// ルーターを起動し、そこを向いた HostedClient を返す
pub(crate) async fn serve(router: Router) -> HostedClient {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    HostedClient::new(HostedConfig::new(format!("http://{}", addr), "test-key")).unwrap()
}
