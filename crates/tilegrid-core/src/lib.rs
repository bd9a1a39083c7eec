#![forbid(unsafe_code)]

//! Core: grid math, pointer gestures, and reflow planning.
//!
//! # Role in tilegrid
//! `tilegrid-core` is the pure, synchronous layer. It has no clock of its
//! own (callers pass `Instant`s), no shared state, and no async runtime.
//!
//! # Primary responsibilities
//! - **geometry**: pixel offsets to grid cells, clamping, row-major indices.
//! - **event**: canonical pointer events fed in by the rendering shell.
//! - **gesture**: the per-tile long-press-then-drag state machine.
//! - **reflow**: which tiles shift, and where, when a drag crosses a cell.
//! - **style**: transition/easing descriptors handed back to the shell.
//!
//! # How it fits in the system
//! `tilegrid-runtime` owns the stateful pieces (coordinator, transition
//! controllers, registry) and drives them with the types defined here.

pub mod event;
pub mod geometry;
pub mod gesture;
pub mod logging;
pub mod reflow;
pub mod style;

pub use geometry::{GridMetrics, ItemOffset, ItemPosition, TileGeometry};

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};
