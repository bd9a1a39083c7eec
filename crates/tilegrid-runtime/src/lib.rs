#![forbid(unsafe_code)]

//! Runtime: the stateful half of tilegrid.
//!
//! # Role in tilegrid
//! `tilegrid-runtime` turns the pure planning in `tilegrid-core` into moving
//! tiles. It owns the authoritative position map, schedules animated moves on
//! a single-threaded tokio `LocalSet`, and serializes reflow transactions.
//!
//! # Primary responsibilities
//! - **coordinator**: the reflow engine and single writer of positions.
//! - **transition**: per-tile transform owner and `MoveTo` implementation.
//! - **registry**: slots through which the coordinator reaches tiles.
//! - **tile**: the per-item host wiring gestures to the coordinator.
//! - **reflow_config**: timing knobs, loadable from TOML/JSON.
//!
//! # Example
//!
//! ```rust,ignore
//! let coordinator = ReflowCoordinator::new(GridMetrics::new(200.0, 200.0, 800.0), ReflowConfig::default());
//! coordinator.set_tiles(&[TileId(1), TileId(2), TileId(3)]);
//! let mut tile = DraggableTile::mount(&coordinator, TileId(1))?;
//! tile.attach(&TileGeometry::new(0.0, 0.0, 200.0, 200.0))?;
//! let response = tile.handle_pointer(&PointerEvent::down(10.0, 10.0), Instant::now());
//! ```

pub mod coordinator;
pub mod error;
pub mod reflow_config;
pub mod registry;
pub mod tile;
pub mod transition;

pub use coordinator::{DragUpdate, ReflowCoordinator, Settle, TransactionReport};
pub use error::{ReflowError, Result};
pub use reflow_config::{ReflowConfig, ReflowConfigError};
pub use registry::{MoveFuture, MoveTo, RegistrySlot};
pub use tile::{DraggableTile, TileId, TileResponse};
pub use transition::TransitionController;
