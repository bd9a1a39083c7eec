#![forbid(unsafe_code)]

//! tilegrid public facade crate.
//!
//! Re-exports the common types from `tilegrid-core` and `tilegrid-runtime`
//! and offers a prelude for rendering shells.
//!
//! A shell typically:
//! 1. creates one [`ReflowCoordinator`] per grid and calls `set_tiles`;
//! 2. mounts a [`DraggableTile`] per item and `attach`es its measured box;
//! 3. forwards pointer events with `handle_pointer` and polls `tick`;
//! 4. renders each tile from `style()` and `visual_state()`.
//!
//! Everything runs on one thread inside a `tokio::task::LocalSet`.

// --- Core re-exports -------------------------------------------------------

pub use tilegrid_core::event::{PointerButton, PointerEvent};
pub use tilegrid_core::geometry::{GridMetrics, ItemOffset, ItemPosition, TileGeometry};
pub use tilegrid_core::gesture::{GestureConfig, GestureDetector, GestureEvent, GesturePhase};
pub use tilegrid_core::reflow::{PlannedMove, ReflowDirection, plan_reflow};
pub use tilegrid_core::style::{Easing, TileStyle, TileVisualState, Transition};

// --- Runtime re-exports ----------------------------------------------------

pub use tilegrid_runtime::{
    DragUpdate, DraggableTile, MoveFuture, MoveTo, ReflowConfig, ReflowConfigError,
    ReflowCoordinator, ReflowError, RegistrySlot, Settle, TileId, TileResponse,
    TransactionReport, TransitionController,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for tilegrid shells.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Coordinator or tile fault.
    #[error(transparent)]
    Reflow(#[from] ReflowError),
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ReflowConfigError),
}

/// Standard result type for tilegrid APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        DragUpdate, DraggableTile, Easing, Error, GridMetrics, ItemOffset, ItemPosition,
        PointerEvent, ReflowConfig, ReflowCoordinator, Result, Settle, TileGeometry, TileId,
        TileStyle, TileVisualState,
    };

    pub use crate::{core, runtime};
}

pub use tilegrid_core as core;
pub use tilegrid_runtime as runtime;
