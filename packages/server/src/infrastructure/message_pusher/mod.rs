//! ロビーへのメッセージ送信（通知）の実装
//!
//! - `websocket`: WebSocket の送信チャンネルを管理する `LobbyPusher` 実装
//! - `release`: 解放時に全参加者へ `lobby-released` を送る `ReleaseAction` 実装

pub mod release;
pub mod websocket;

pub use release::PushReleaseAction;
pub use websocket::WebSocketLobbyPusher;
