#![forbid(unsafe_code)]

//! Registration slots: the seam between the coordinator and each tile.
//!
//! The coordinator allocates one [`RegistrySlot`] per tile. The tile, once
//! mounted, installs its [`MoveTo`] capability into the slot; the coordinator
//! only ever moves a tile by invoking through the slot. Neither side holds a
//! direct reference to the other's internals, so tiles can come and go while
//! the coordinator keeps running.
//!
//! # Invariants
//!
//! 1. A cleared slot is never invoked; [`RegistrySlot::invoke`] reports
//!    [`ReflowError::MissingRegistration`] instead.
//! 2. No `RefCell` borrow is held while the capability runs.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use futures::future::LocalBoxFuture;
use tilegrid_core::ItemPosition;

use crate::TileId;
use crate::error::ReflowError;

/// Completion of a move: `Some(cell)` once the animation finished, `None` if
/// the tile was already there.
pub type MoveFuture = LocalBoxFuture<'static, Result<Option<ItemPosition>, ReflowError>>;

/// Capability to move a tile to a grid cell.
pub trait MoveTo {
    /// Start moving to `(col, row)` over `duration`.
    ///
    /// Side effects (style, optimistic position) happen at call time; the
    /// returned future only signals completion.
    fn move_to(&self, col: u32, row: u32, duration: Duration) -> MoveFuture;
}

/// Per-tile handle through which the coordinator reaches a tile.
#[derive(Clone)]
pub struct RegistrySlot {
    tile: TileId,
    inner: Rc<RefCell<Option<Rc<dyn MoveTo>>>>,
}

impl fmt::Debug for RegistrySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrySlot")
            .field("tile", &self.tile)
            .field("registered", &self.is_registered())
            .finish()
    }
}

impl RegistrySlot {
    /// Empty slot for `tile`.
    #[must_use]
    pub fn new(tile: TileId) -> Self {
        Self {
            tile,
            inner: Rc::new(RefCell::new(None)),
        }
    }

    /// Tile this slot belongs to.
    #[must_use]
    pub fn tile(&self) -> TileId {
        self.tile
    }

    /// Install (or replace) the tile's move capability.
    pub fn install(&self, capability: Rc<dyn MoveTo>) {
        *self.inner.borrow_mut() = Some(capability);
    }

    /// Remove the capability. Later invocations become no-ops.
    pub fn clear(&self) {
        self.inner.borrow_mut().take();
    }

    /// Remove the capability only if it is `capability`.
    ///
    /// Returns `true` if the slot was cleared. A newer registration for the
    /// same tile is left in place.
    pub fn clear_if(&self, capability: &Rc<dyn MoveTo>) -> bool {
        let mut inner = self.inner.borrow_mut();
        let ours = inner
            .as_ref()
            .is_some_and(|installed| std::ptr::addr_eq(Rc::as_ptr(installed), Rc::as_ptr(capability)));
        if ours {
            inner.take();
        }
        ours
    }

    /// Whether a capability is installed.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.inner.borrow().is_some()
    }

    /// Invoke the installed capability.
    pub fn invoke(&self, col: u32, row: u32, duration: Duration) -> Result<MoveFuture, ReflowError> {
        let capability = self
            .inner
            .borrow()
            .clone()
            .ok_or(ReflowError::MissingRegistration { tile: self.tile })?;
        Ok(capability.move_to(col, row, duration))
    }

    /// Invoke toward an [`ItemPosition`].
    pub fn invoke_at(&self, target: ItemPosition, duration: Duration) -> Result<MoveFuture, ReflowError> {
        self.invoke(target.col, target.row, duration)
    }

    /// Whether two handles share the same slot.
    #[must_use]
    pub fn same_slot(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}
