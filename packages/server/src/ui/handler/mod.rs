//! Request handlers.

mod http;
mod websocket;

pub use http::{cast_vote, health_check, list_topics, lobby_status, login, logout};
pub use websocket::lobby_websocket_handler;
