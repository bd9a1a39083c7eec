#![forbid(unsafe_code)]

//! Structured logging glue.
//!
//! With the `tracing` feature the level macros are re-exported so dependent
//! crates can log through `tilegrid_core::{debug, warn, ..}` without naming
//! `tracing` themselves. With `tracing-json`, [`init_json_subscriber`]
//! installs a JSON formatter filtered by `RUST_LOG` (default `info`).
//!
//! Without either feature this module is empty.

#[cfg(feature = "tracing")]
pub use tracing::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};

/// Log target used by the gesture and geometry layers.
pub const TARGET_CORE: &str = "tilegrid.core";

/// Install a global JSON subscriber honoring `RUST_LOG`.
///
/// Returns `false` if a global subscriber was already installed.
#[cfg(feature = "tracing-json")]
pub fn init_json_subscriber() -> bool {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
