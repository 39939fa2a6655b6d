//! Terminal client for the quorum lobby and voting server.

pub mod api;
pub mod ballot;
pub mod domain;
pub mod error;
pub mod formatter;
pub mod runner;
pub mod session;
pub mod ui;

pub use runner::run_client;
