//! Feature-gated tracing support.
//!
//! With the `tracing` feature enabled this re-exports the tracing macros
//! used throughout the crate. Without the feature, every call site is
//! compiled out behind `#[cfg(feature = "tracing")]`, so instrumentation
//! has zero overhead in default builds.

#[cfg(feature = "tracing")]
pub use tracing::{debug, debug_span, info, trace, warn};

/// Install a stderr subscriber honoring `RUST_LOG`.
///
/// Call once at the start of a test or binary when tracing is enabled.
#[cfg(feature = "tracing")]
pub fn init_subscriber() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_ansi(false),
        )
        .with(filter)
        .try_init()
        .ok();
}

/// No-op when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub fn init_subscriber() {}
