//! Logging setup shared by the quorum binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Workspace crates whose logs are enabled by the default filter.
const WORKSPACE_CRATES: [&str; 3] = ["quorum_shared", "quorum_server", "quorum_client"];

/// Build the default `EnvFilter` directive for a binary.
///
/// Every workspace crate plus the binary itself is enabled at `default_log_level`.
pub fn default_filter_directive(binary_name: &str, default_log_level: &str) -> String {
    WORKSPACE_CRATES
        .iter()
        .copied()
        .chain(std::iter::once(binary_name))
        .map(|target| format!("{}={}", target.replace('-', "_"), default_log_level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "quorum-server", "quorum-client")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use quorum_shared::logger::setup_logger;
///
/// setup_logger("quorum-server", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                default_filter_directive(binary_name, default_log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::debug!("Logger initialized for '{}'", binary_name);
}
