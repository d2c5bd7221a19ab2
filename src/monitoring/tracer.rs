/*!
 * Structured Tracing
 *
 * Subscriber setup for the `tracing` events emitted by completion signals:
 * settlement at debug, callback bookkeeping at trace, forced failures at
 * warn and panicking callbacks at error.
 */

use tracing::info;
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const ENV_TRACE_JSON: &str = "SIGNAL_TRACE_JSON";

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - SIGNAL_TRACE_JSON: Enable JSON output (default: false)
///
/// Panics if a global subscriber is already installed; use
/// [`try_init_tracing`] where that can happen.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);

    if json_requested() {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .init();
        info!("Structured tracing initialized with JSON output");
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .init();
        info!("Structured tracing initialized");
    }
}

/// Install a compact subscriber unless one is already set
///
/// `default_filter` applies when RUST_LOG is unset. Returns true if this call
/// installed the subscriber.
pub fn try_init_tracing(default_filter: &str) -> bool {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_thread_names(true)
                .with_test_writer()
                .compact(),
        )
        .try_init()
        .is_ok()
}

fn json_requested() -> bool {
    std::env::var(ENV_TRACE_JSON)
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false)
}
