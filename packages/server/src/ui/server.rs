//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::usecase::BackgroundTask;

use super::{
    handler::{
        cast_vote, health_check, list_topics, lobby_status, lobby_websocket_handler, login, logout,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Lobby and voting server
///
/// Owns the application state and the background tasks (presence watcher,
/// stale presence pruner, auth listener) that live as long as the server.
///
/// # Example
///
/// ```ignore
/// let (state, tasks) = bootstrap::build_state(&config, backend, clock);
/// Server::new(state, tasks).run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
    /// Drop 時に中断される
    tasks: Vec<BackgroundTask>,
}

impl Server {
    pub fn new(state: Arc<AppState>, tasks: Vec<BackgroundTask>) -> Self {
        Self { state, tasks }
    }

    /// Build the router with every endpoint
    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    /// Run the server until Ctrl+C or SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        tracing::info!("Quorum server listening on {}", listener.local_addr()?);
        tracing::info!("Lobby endpoint: ws://{}/ws/lobby", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;
        Ok(())
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(
        self,
        listener: tokio::net::TcpListener,
        shutdown: F,
    ) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        // 進行中のカウントダウンとバックグラウンドタスクを止める
        self.state.tracker.shutdown().await;
        drop(self.tasks);

        tracing::info!("Server shutdown complete");
        result
    }
}

/// Routes of the HTTP API and the lobby WebSocket
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // WebSocket エンドポイント
        .route("/ws/lobby", get(lobby_websocket_handler))
        // HTTP エンドポイント
        .route("/api/health", get(health_check))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/lobby", get(lobby_status))
        .route("/api/topics", get(list_topics))
        .route("/api/votes", post(cast_vote))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
