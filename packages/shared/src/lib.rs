//! Utilities shared by the quorum server and client.

pub mod logger;
pub mod time;
