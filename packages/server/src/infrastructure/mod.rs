//! Infrastructure 層
//!
//! ドメインのポートの実装（インメモリ、ホスト型バックエンド）と、
//! 通信プロトコルの DTO、参加者へのメッセージ送信を提供します。

pub mod dto;
pub mod hosted;
pub mod memory;
pub mod message_pusher;
