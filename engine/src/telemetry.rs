//! Telemetry and Observability
//!
//! Sets up `tracing-subscriber` for structured logging. The global
//! subscriber is installed exactly once, behind a reloadable level
//! filter: early startup logs at "info", and once the config file and
//! CLI flags are read the level is swapped in place. A second global
//! registration would be silently ignored, so later calls go through
//! the reload handle instead.

use std::sync::OnceLock;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

static FILTER_HANDLE: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

/// Priority: `RUST_LOG` env var > the `log_level` parameter.
fn level_filter(log_level: &str) -> EnvFilter {
    let default_filter = format!("{},progulka_engine={}", log_level, log_level);
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter))
}

/// Initialize the tracing subscriber at the given log level, or change
/// the level of the already-installed subscriber.
///
/// In debug builds: pretty-printed terminal output.
/// In release builds: JSON structured output with spans.
pub fn init_telemetry_with_level(log_level: &str) {
    if let Some(handle) = FILTER_HANDLE.get() {
        if handle.reload(level_filter(log_level)).is_err() {
            tracing::warn!(log_level, "Failed to reload log level");
        }
        return;
    }

    let (filter, handle) = reload::Layer::new(level_filter(log_level));

    #[cfg(debug_assertions)]
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().pretty().with_target(false))
        .try_init()
        .is_ok();

    #[cfg(not(debug_assertions))]
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_current_span(true))
        .try_init()
        .is_ok();

    if installed {
        let _ = FILTER_HANDLE.set(handle);
    }
}

/// Initialize the tracing subscriber with default settings.
///
/// Falls back to "info" level if no `RUST_LOG` env var is set.
/// Use `init_telemetry_with_level` when config is available.
pub fn init_telemetry() {
    init_telemetry_with_level("info");
}
