//! Logging setup for Tsunagi binaries.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Build the default filter directive for the given binary.
///
/// Covers the binary itself plus every `tsunagi_*` library crate so that
/// relay events logged inside the server library are visible by default.
pub fn default_directive(binary_name: &str, default_log_level: &str) -> String {
    format!(
        "{}={level},tsunagi_server={level},tsunagi_shared={level},tower_http={level}",
        binary_name.replace('-', "_"),
        level = default_log_level,
    )
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Examples
///
/// ```no_run
/// use tsunagi_shared::logger::setup_logger;
///
/// setup_logger("tsunagi-server", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
