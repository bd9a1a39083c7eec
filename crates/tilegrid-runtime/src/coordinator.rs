#![forbid(unsafe_code)]

//! Reflow coordinator: the single owner of every tile's grid cell.
//!
//! [`ReflowCoordinator`] consumes gesture callbacks from tiles, decides which
//! tiles shift when the dragged tile crosses into a new cell, issues the moves
//! through each tile's [`RegistrySlot`], and commits positions once the moves
//! complete.
//!
//! # Transactions
//!
//! One cell crossing opens one *reflow transaction*: every affected tile's
//! move is issued at once and the transaction closes only when all of them
//! have resolved or rejected (`join_all`). While a transaction is open,
//! further drag updates are **dropped**, not queued; the next update after it
//! closes is evaluated fresh against the pointer's position then.
//!
//! # Invariants
//!
//! 1. At most one transaction is in flight (`in_transition`).
//! 2. Only the coordinator writes authoritative positions.
//! 3. At rest, authoritative positions are exactly
//!    `{position_of(0) .. position_of(N-1)}` (see [`ReflowCoordinator::check_layout`]).
//! 4. The pending target is snapshotted once per gesture, at press start.
//! 5. Completions from before the last collection change are ignored.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Fallback |
//! |---------|-------|----------|
//! | Empty registry slot | Tile unmounted or never registered | Move skipped, logged at debug |
//! | Move rejected | Tile has no rest position | Move counted as failed, logged at warn |
//! | Drag-end mid-transaction | Release while tiles are still moving | Final move deferred until the barrier closes |
//!
//! The coordinator schedules work with `tokio::task::spawn_local`, so it must
//! be driven from inside a `tokio::task::LocalSet`.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use futures::future::join_all;
use rustc_hash::FxHashMap;
use tilegrid_core::geometry::{GridMetrics, ItemOffset, ItemPosition};
use tilegrid_core::reflow::{is_contiguous, plan_reflow};
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::TileId;
use crate::error::{ReflowError, Result};
use crate::reflow_config::ReflowConfig;
use crate::registry::RegistrySlot;

const TARGET: &str = "tilegrid.reflow";

// ---------------------------------------------------------------------------
// Public outcome types
// ---------------------------------------------------------------------------

/// Summary of one closed reflow transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransactionReport {
    /// Pending target index before the crossing.
    pub from_index: u32,
    /// Index of the newly hovered cell.
    pub to_index: u32,
    /// Moves that completed.
    pub moved: usize,
    /// Moves skipped because the tile had no registration.
    pub skipped: usize,
    /// Moves that rejected.
    pub failed: usize,
}

/// What a drag update did.
#[derive(Debug)]
pub enum DragUpdate {
    /// Not the dragged tile, or no gesture in progress.
    Ignored,
    /// Still inside the pending target cell.
    SameCell,
    /// A transaction is in flight; the update was dropped.
    Busy,
    /// A new transaction was opened.
    Started(JoinHandle<TransactionReport>),
}

impl DragUpdate {
    /// Whether this update opened a transaction.
    #[must_use]
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started(_))
    }
}

/// What a drag end did with the dragged tile's final placement.
#[derive(Debug)]
pub enum Settle {
    /// Not the dragged tile, or no gesture in progress.
    Ignored,
    /// Final move issued; the handle completes once positions are committed.
    Scheduled(JoinHandle<()>),
    /// A transaction is open; the final move runs when it closes.
    Deferred,
}

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct TileEntry {
    id: TileId,
    slot: RegistrySlot,
    /// Position first reported on load.
    initial: Option<ItemPosition>,
    /// Authoritative position.
    position: Option<ItemPosition>,
    mounted: bool,
}

#[derive(Debug, Clone, Copy)]
struct Gesture {
    tile: TileId,
    /// Cell the tile occupied at press start; drag offsets are relative to it.
    origin: ItemPosition,
    /// Pending target position.
    pending: ItemPosition,
    dragging: bool,
}

struct CoordinatorState {
    metrics: GridMetrics,
    config: ReflowConfig,
    tiles: Vec<TileEntry>,
    lookup: FxHashMap<TileId, usize>,
    gesture: Option<Gesture>,
    in_transition: bool,
    /// Tile whose final move waits for the open transaction to close.
    deferred: Option<TileId>,
    /// Tiles whose final move is in flight, with its target.
    settling: FxHashMap<TileId, ItemPosition>,
    generation: u64,
    transactions_opened: u64,
}

impl CoordinatorState {
    fn entry(&self, tile: TileId) -> Option<&TileEntry> {
        self.lookup.get(&tile).and_then(|&i| self.tiles.get(i))
    }

    fn entry_mut(&mut self, tile: TileId) -> Option<&mut TileEntry> {
        match self.lookup.get(&tile) {
            Some(&i) => self.tiles.get_mut(i),
            None => None,
        }
    }

    /// Where a tile is, or is about to be once its final move lands.
    fn effective_position(&self, entry: &TileEntry) -> Option<ItemPosition> {
        self.settling.get(&entry.id).copied().or(entry.position)
    }

    /// Clamp a hovered cell onto an occupied slot.
    fn clamp_to_tiles(&self, cell: ItemPosition) -> ItemPosition {
        let last = self.tiles.len().saturating_sub(1) as u32;
        let index = self.metrics.index_of(cell).min(last);
        self.metrics.position_of(index)
    }

    fn commit(&mut self, tile: TileId, pos: ItemPosition) {
        self.settling.remove(&tile);
        if let Some(entry) = self.entry_mut(tile)
            && entry.mounted
        {
            entry.position = Some(pos);
        }
    }
}

// ---------------------------------------------------------------------------
// ReflowCoordinator
// ---------------------------------------------------------------------------

/// Container-level owner of the authoritative position map.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ReflowCoordinator {
    inner: Rc<RefCell<CoordinatorState>>,
}

impl fmt::Debug for ReflowCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.borrow();
        f.debug_struct("ReflowCoordinator")
            .field("tiles", &state.tiles.len())
            .field("gesture", &state.gesture.map(|g| g.tile))
            .field("in_transition", &state.in_transition)
            .field("generation", &state.generation)
            .finish()
    }
}

impl ReflowCoordinator {
    /// Coordinator for a grid with the given metrics.
    #[must_use]
    pub fn new(metrics: GridMetrics, config: ReflowConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(CoordinatorState {
                metrics,
                config,
                tiles: Vec::new(),
                lookup: FxHashMap::default(),
                gesture: None,
                in_transition: false,
                deferred: None,
                settling: FxHashMap::default(),
                generation: 0,
                transactions_opened: 0,
            })),
        }
    }

    fn from_weak(weak: &Weak<RefCell<CoordinatorState>>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    // --- Collection --------------------------------------------------------

    /// Re-derive the tile collection.
    ///
    /// Slots of surviving tiles are kept; slots of removed tiles are cleared.
    /// Every position is forgotten until its tile reports `loaded` again, and
    /// any gesture or transaction in progress is abandoned.
    pub fn set_tiles(&self, ids: &[TileId]) {
        let mut state = self.inner.borrow_mut();
        let mut old: FxHashMap<TileId, RegistrySlot> = state
            .tiles
            .drain(..)
            .map(|entry| (entry.id, entry.slot))
            .collect();

        let mut tiles = Vec::with_capacity(ids.len());
        let mut lookup = FxHashMap::default();
        for &id in ids {
            if lookup.contains_key(&id) {
                tracing::warn!(target: TARGET, tile = %id, "duplicate tile id ignored");
                continue;
            }
            let slot = old.remove(&id).unwrap_or_else(|| RegistrySlot::new(id));
            lookup.insert(id, tiles.len());
            tiles.push(TileEntry {
                id,
                slot,
                initial: None,
                position: None,
                mounted: true,
            });
        }
        for slot in old.values() {
            slot.clear();
        }

        state.tiles = tiles;
        state.lookup = lookup;
        state.gesture = None;
        state.in_transition = false;
        state.deferred = None;
        state.settling.clear();
        state.generation += 1;

        tracing::debug!(
            target: TARGET,
            tiles = state.tiles.len(),
            removed = old.len(),
            generation = state.generation,
            "tile collection updated"
        );
    }

    /// Replace the grid metrics. Positions are forgotten as in [`set_tiles`](Self::set_tiles).
    pub fn set_metrics(&self, metrics: GridMetrics) {
        let ids = self.tile_ids();
        self.inner.borrow_mut().metrics = metrics;
        self.set_tiles(&ids);
    }

    /// Registry slot for a tile.
    pub fn slot(&self, tile: TileId) -> Result<RegistrySlot> {
        self.inner
            .borrow()
            .entry(tile)
            .map(|entry| entry.slot.clone())
            .ok_or(ReflowError::UnknownTile { tile })
    }

    /// Tear down a tile's registration. Pending completions for it are ignored.
    pub fn unmount(&self, tile: TileId) {
        let mut state = self.inner.borrow_mut();
        if state.gesture.is_some_and(|g| g.tile == tile) {
            state.gesture = None;
        }
        if state.deferred == Some(tile) {
            state.deferred = None;
        }
        state.settling.remove(&tile);
        if let Some(entry) = state.entry_mut(tile) {
            entry.slot.clear();
            entry.mounted = false;
            tracing::debug!(target: TARGET, tile = %tile, "tile unmounted");
        }
    }

    // --- Tile callbacks ----------------------------------------------------

    /// A tile reported its measured rest cell.
    ///
    /// Cells outside the first N slots are rejected with
    /// [`ReflowError::LayoutViolation`] and leave the tile unloaded.
    pub fn on_loaded(&self, tile: TileId, pos: ItemPosition) -> Result<()> {
        let mut state = self.inner.borrow_mut();
        let cols = state.metrics.col_count();
        let slots = state.tiles.len() as u32;
        if pos.col >= cols || state.metrics.index_of(pos) >= slots {
            tracing::warn!(target: TARGET, tile = %tile, pos = %pos, "loaded outside the grid");
            return Err(ReflowError::violation(format!(
                "tile {tile} loaded at {pos}, outside {slots} slots in {cols} columns"
            )));
        }
        let entry = state
            .entry_mut(tile)
            .ok_or(ReflowError::UnknownTile { tile })?;
        entry.initial = Some(pos);
        entry.position = Some(pos);
        entry.mounted = true;
        tracing::trace!(target: TARGET, tile = %tile, pos = %pos, "tile loaded");
        Ok(())
    }

    /// Pointer went down on a tile: snapshot its cell as the pending target.
    ///
    /// Returns `false` if another tile is held, a transaction is in flight,
    /// or the tile is not loaded. A repeated press on the held tile (missed
    /// release) continues its gesture with the same pending target.
    pub fn on_press_start(&self, tile: TileId) -> bool {
        let mut state = self.inner.borrow_mut();
        if let Some(active) = state.gesture.as_mut() {
            if active.tile != tile {
                tracing::debug!(
                    target: TARGET,
                    tile = %tile,
                    active = %active.tile,
                    "press ignored while another tile is held"
                );
                return false;
            }
            active.dragging = false;
            tracing::debug!(target: TARGET, tile = %tile, "press resumed held gesture");
            return true;
        }
        // Shifted tiles only commit when the barrier closes; until then no
        // new gesture may snapshot a position.
        if state.in_transition {
            tracing::debug!(target: TARGET, tile = %tile, "press ignored: transaction in flight");
            return false;
        }
        let Some(origin) = state
            .entry(tile)
            .filter(|entry| entry.mounted)
            .and_then(|entry| state.effective_position(entry))
        else {
            tracing::debug!(target: TARGET, tile = %tile, "press on unloaded tile ignored");
            return false;
        };
        state.gesture = Some(Gesture {
            tile,
            origin,
            pending: origin,
            dragging: false,
        });
        tracing::debug!(target: TARGET, tile = %tile, origin = %origin, "press started");
        true
    }

    /// The held tile started following the pointer.
    pub fn on_dragging_start(&self, tile: TileId) {
        let mut state = self.inner.borrow_mut();
        if let Some(gesture) = state.gesture.as_mut()
            && gesture.tile == tile
            && !gesture.dragging
        {
            gesture.dragging = true;
            tracing::debug!(target: TARGET, tile = %tile, "drag started");
        }
    }

    /// The dragged tile moved by a cumulative `offset`.
    pub fn on_dragging(&self, tile: TileId, offset: ItemOffset) -> DragUpdate {
        let mut state = self.inner.borrow_mut();
        let Some(gesture) = state.gesture.filter(|g| g.tile == tile) else {
            return DragUpdate::Ignored;
        };

        let hovered = state
            .metrics
            .center_cell(gesture.origin, offset, state.tiles.len());
        let current = state.clamp_to_tiles(hovered);
        if current == gesture.pending {
            return DragUpdate::SameCell;
        }
        if state.in_transition {
            tracing::trace!(target: TARGET, tile = %tile, to = %current, "update dropped: transaction in flight");
            return DragUpdate::Busy;
        }

        let prev_index = state.metrics.index_of(gesture.pending);
        let to_index = state.metrics.index_of(current);
        let planned = plan_reflow(
            prev_index,
            to_index,
            tile,
            state.tiles.iter().filter_map(|entry| {
                state
                    .effective_position(entry)
                    .map(|pos| (entry.id, state.metrics.index_of(pos)))
            }),
        );

        state.in_transition = true;
        state.transactions_opened += 1;
        let generation = state.generation;
        let duration = state.config.move_duration();

        let mut report = TransactionReport {
            from_index: prev_index,
            to_index,
            ..TransactionReport::default()
        };
        let targets: Vec<(TileId, RegistrySlot, ItemPosition)> = planned
            .iter()
            .filter_map(|step| {
                state.entry(step.tile).map(|entry| {
                    (step.tile, entry.slot.clone(), state.metrics.position_of(step.to_index))
                })
            })
            .collect();
        drop(state);

        // Moves are issued with no coordinator borrow held.
        let mut moves = Vec::with_capacity(targets.len());
        for (id, slot, target) in targets {
            match slot.invoke_at(target, duration) {
                Ok(fut) => moves.push(async move { (id, target, fut.await) }),
                Err(err) => {
                    tracing::debug!(target: TARGET, tile = %id, error = %err, "move skipped");
                    report.skipped += 1;
                }
            }
        }

        let span = tracing::debug_span!(
            target: TARGET,
            "reflow.transaction",
            tile = %tile,
            from_index = prev_index,
            to_index = to_index,
            moves = moves.len(),
        );
        tracing::debug!(
            target: TARGET,
            parent: &span,
            tile = %tile,
            planned = planned.len(),
            "transaction opened"
        );

        let weak = Rc::downgrade(&self.inner);
        let task = async move {
            let results = join_all(moves).await;
            let Some(coordinator) = Self::from_weak(&weak) else {
                return report;
            };
            coordinator.close_transaction(generation, tile, current, results, report)
        };
        DragUpdate::Started(tokio::task::spawn_local(task.instrument(span)))
    }

    /// Pointer released on a tile: place it at the pending target.
    pub fn on_mouse_up(&self, tile: TileId) -> Settle {
        let mut state = self.inner.borrow_mut();
        let Some(gesture) = state.gesture.filter(|g| g.tile == tile) else {
            return Settle::Ignored;
        };
        state.gesture = None;

        if state.in_transition {
            // Presses are refused while a transaction is open, so only the
            // tile that opened it can be released here.
            debug_assert!(state.deferred.is_none());
            state.deferred = Some(tile);
            tracing::debug!(target: TARGET, tile = %tile, "final move deferred until transaction closes");
            return Settle::Deferred;
        }
        drop(state);
        self.settle(tile, gesture.pending)
    }

    /// A tile's move finished at `pos`; make it authoritative.
    pub fn on_move_end(&self, tile: TileId, pos: ItemPosition) {
        self.inner.borrow_mut().commit(tile, pos);
        tracing::trace!(target: TARGET, tile = %tile, pos = %pos, "position committed");
    }

    // --- Transaction internals ---------------------------------------------

    fn close_transaction(
        &self,
        generation: u64,
        tile: TileId,
        current: ItemPosition,
        results: Vec<(TileId, ItemPosition, Result<Option<ItemPosition>>)>,
        mut report: TransactionReport,
    ) -> TransactionReport {
        let mut state = self.inner.borrow_mut();
        if state.generation != generation {
            tracing::debug!(target: TARGET, "stale transaction completion ignored");
            return report;
        }

        for (id, target, result) in results {
            match result {
                Ok(landed) => {
                    state.commit(id, landed.unwrap_or(target));
                    report.moved += 1;
                }
                Err(err) if err.is_benign() => report.skipped += 1,
                Err(err) => {
                    tracing::warn!(target: TARGET, tile = %id, error = %err, "move failed");
                    report.failed += 1;
                }
            }
        }

        state.in_transition = false;
        let still_dragging = state.gesture.is_some_and(|g| g.tile == tile);
        let settle_now = !still_dragging && state.deferred == Some(tile);
        if still_dragging {
            if let Some(gesture) = state.gesture.as_mut() {
                gesture.pending = current;
            }
        } else if settle_now {
            state.deferred = None;
        }
        drop(state);

        tracing::debug!(
            target: TARGET,
            moved = report.moved,
            skipped = report.skipped,
            failed = report.failed,
            "transaction closed"
        );

        if settle_now {
            let _ = self.settle(tile, current);
        }
        report
    }

    fn settle(&self, tile: TileId, target: ItemPosition) -> Settle {
        let (generation, duration, slot) = {
            let state = self.inner.borrow();
            let Some(slot) = state.entry(tile).map(|entry| entry.slot.clone()) else {
                return Settle::Ignored;
            };
            (state.generation, state.config.move_duration(), slot)
        };
        let fut = match slot.invoke_at(target, duration) {
            Ok(fut) => fut,
            Err(err) => {
                tracing::debug!(target: TARGET, tile = %tile, error = %err, "final move skipped");
                return Settle::Ignored;
            }
        };
        self.inner.borrow_mut().settling.insert(tile, target);

        tracing::debug!(target: TARGET, tile = %tile, to = %target, "final move issued");
        let weak = Rc::downgrade(&self.inner);
        Settle::Scheduled(tokio::task::spawn_local(async move {
            let result = fut.await;
            let Some(coordinator) = Self::from_weak(&weak) else {
                return;
            };
            coordinator.finish_settle(generation, tile, target, result);
        }))
    }

    fn finish_settle(
        &self,
        generation: u64,
        tile: TileId,
        target: ItemPosition,
        result: Result<Option<ItemPosition>>,
    ) {
        let mut state = self.inner.borrow_mut();
        if state.generation != generation {
            return;
        }
        // A later shift already committed this tile elsewhere.
        if state.settling.get(&tile) != Some(&target) {
            return;
        }
        match result {
            Ok(landed) => {
                let pos = landed.unwrap_or(target);
                state.commit(tile, pos);
                tracing::debug!(target: TARGET, tile = %tile, pos = %pos, "final position committed");
            }
            Err(err) => {
                state.settling.remove(&tile);
                tracing::warn!(target: TARGET, tile = %tile, error = %err, "final move failed");
            }
        }
    }

    // --- Read surface ------------------------------------------------------

    /// Authoritative position of a tile.
    #[must_use]
    pub fn position(&self, tile: TileId) -> Option<ItemPosition> {
        self.inner.borrow().entry(tile).and_then(|entry| entry.position)
    }

    /// Position first reported when the tile loaded.
    #[must_use]
    pub fn initial_position(&self, tile: TileId) -> Option<ItemPosition> {
        self.inner.borrow().entry(tile).and_then(|entry| entry.initial)
    }

    /// Pending target of the active gesture.
    #[must_use]
    pub fn pending_target(&self) -> Option<ItemPosition> {
        self.inner.borrow().gesture.map(|g| g.pending)
    }

    /// Tile currently held or dragged.
    #[must_use]
    pub fn active_tile(&self) -> Option<TileId> {
        self.inner.borrow().gesture.map(|g| g.tile)
    }

    /// Whether a transaction is in flight.
    #[must_use]
    pub fn in_transition(&self) -> bool {
        self.inner.borrow().in_transition
    }

    /// No gesture, no transaction, no deferred or in-flight final move.
    #[must_use]
    pub fn is_at_rest(&self) -> bool {
        let state = self.inner.borrow();
        state.gesture.is_none()
            && !state.in_transition
            && state.deferred.is_none()
            && state.settling.is_empty()
    }

    /// Total transactions opened since creation.
    #[must_use]
    pub fn transactions_opened(&self) -> u64 {
        self.inner.borrow().transactions_opened
    }

    /// Grid metrics in use.
    #[must_use]
    pub fn metrics(&self) -> GridMetrics {
        self.inner.borrow().metrics
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> ReflowConfig {
        self.inner.borrow().config.clone()
    }

    /// Tile ids in collection order.
    #[must_use]
    pub fn tile_ids(&self) -> Vec<TileId> {
        self.inner.borrow().tiles.iter().map(|entry| entry.id).collect()
    }

    /// Loaded tiles ordered by authoritative linear index.
    #[must_use]
    pub fn order(&self) -> Vec<TileId> {
        let state = self.inner.borrow();
        let mut placed: Vec<(u32, TileId)> = state
            .tiles
            .iter()
            .filter_map(|entry| {
                entry
                    .position
                    .map(|pos| (state.metrics.index_of(pos), entry.id))
            })
            .collect();
        placed.sort_unstable();
        placed.into_iter().map(|(_, id)| id).collect()
    }

    /// Verify the at-rest layout is a bijection onto the first N cells.
    pub fn check_layout(&self) -> Result<()> {
        let state = self.inner.borrow();
        let cols = state.metrics.col_count();
        let mut indices = Vec::with_capacity(state.tiles.len());
        for entry in &state.tiles {
            let Some(pos) = entry.position else {
                return Err(ReflowError::violation(format!("tile {} is not loaded", entry.id)));
            };
            if pos.col >= cols {
                return Err(ReflowError::violation(format!(
                    "tile {} at {pos} is outside {cols} columns",
                    entry.id
                )));
            }
            indices.push(state.metrics.index_of(pos));
        }
        if is_contiguous(&indices) {
            Ok(())
        } else {
            Err(ReflowError::violation(format!(
                "indices {indices:?} are not a permutation of 0..{}",
                indices.len()
            )))
        }
    }
}
