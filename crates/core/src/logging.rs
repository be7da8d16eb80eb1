//! Log setup for chainsign-node.
//!
//! `main` calls [`init_from_config`] once, before the store worker starts.
//! The `[logging] json` setting (or `LOG_JSON`) picks line or JSON output.
//! Verbosity always comes from `RUST_LOG`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset or unparsable.
const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs a line formatter that tags each event with its target and
/// thread, so store worker events can be told apart from request handlers.
///
/// ```no_run
/// chainsign_core::logging::init();
/// tracing::info!(address = "0.0.0.0:8080", "chainsign-node listening");
/// ```
pub fn init() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .init();
}

/// Same as [`init`] but one JSON object per event. Structured fields such
/// as `algorithm` and `counter` become keys of the `fields` object.
///
/// ```no_run
/// chainsign_core::logging::init_json();
/// tracing::info!(algorithm = "ECC", counter = 0u64, "Device created");
/// ```
pub fn init_json() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().json().with_target(true).with_thread_ids(true))
        .init();
}

/// Picks [`init_json`] or [`init`] from the `[logging]` section.
pub fn init_from_config(config: &crate::config::LoggingConfig) {
    if config.json {
        init_json();
    } else {
        init();
    }
}
