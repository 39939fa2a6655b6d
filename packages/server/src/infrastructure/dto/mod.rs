//! Data Transfer Objects (DTOs)
//!
//! DTOs are organized by protocol:
//! - `websocket`: lobby WebSocket messages
//! - `http`: HTTP API request/response bodies
//! - `rows`: rows of the hosted backend tables (also the topic seed file format)
//! - `realtime`: Phoenix channel frames of the hosted realtime endpoint

pub mod conversion;
pub mod http;
pub mod realtime;
pub mod rows;
pub mod websocket;
