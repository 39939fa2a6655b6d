//! Quorum lobby and voting server.
//!
//! Tracks who is online, releases the lobby once a quorum has stayed connected
//! for the grace delay, and then accepts one vote per participant per round.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// wiring
pub mod bootstrap;
pub mod config;
