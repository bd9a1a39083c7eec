#![forbid(unsafe_code)]

//! Per-tile transition controller.
//!
//! [`TransitionController`] owns a tile's visual transform. It exposes the
//! imperative [`MoveTo`] capability the coordinator drives through the
//! registry, and toggles between instantaneous transitions (while the tile
//! follows the pointer) and eased ones (programmatic snaps).
//!
//! # Invariants
//!
//! 1. While dragging, the style's transition is [`Transition::None`].
//! 2. `move_to` the current `real_position` resolves `None` immediately and
//!    leaves the style untouched.
//! 3. `real_position` is written at call time, so a late completion of a
//!    superseded move can never regress it.
//! 4. Translation is relative to the rest cell, in percent of the tile's own
//!    size: `(col - rest_col) * 100`, `(row - rest_row) * 100`.
//!
//! # Failure Modes
//!
//! - `move_to` before [`set_rest_position`](TransitionController::set_rest_position)
//!   rejects with [`ReflowError::UnknownRestPosition`].

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use futures::FutureExt;
use tilegrid_core::ItemOffset;
use tilegrid_core::ItemPosition;
use tilegrid_core::style::{Easing, TileStyle, Transition};

use crate::TileId;
use crate::error::ReflowError;
use crate::registry::{MoveFuture, MoveTo};

const TARGET: &str = "tilegrid.transition";

type MoveEndListener = Rc<dyn Fn(ItemPosition)>;

struct ControllerState {
    rest: Option<ItemPosition>,
    real: Option<ItemPosition>,
    dragging: bool,
    style: TileStyle,
    default_transition: Transition,
    easing: Easing,
    on_move_end: Option<MoveEndListener>,
}

/// Visual transform owner for one tile.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct TransitionController {
    tile: TileId,
    state: Rc<RefCell<ControllerState>>,
}

impl fmt::Debug for TransitionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("TransitionController")
            .field("tile", &self.tile)
            .field("rest", &state.rest)
            .field("real", &state.real)
            .field("dragging", &state.dragging)
            .finish_non_exhaustive()
    }
}

impl TransitionController {
    /// Controller using `default_transition` for programmatic moves.
    #[must_use]
    pub fn new(tile: TileId, default_transition: Transition) -> Self {
        let easing = match default_transition {
            Transition::Eased { easing, .. } => easing,
            Transition::None => Easing::default(),
        };
        Self {
            tile,
            state: Rc::new(RefCell::new(ControllerState {
                rest: None,
                real: None,
                dragging: false,
                style: TileStyle {
                    transition: default_transition,
                    ..TileStyle::default()
                },
                default_transition,
                easing,
                on_move_end: None,
            })),
        }
    }

    /// Tile this controller animates.
    #[must_use]
    pub fn tile(&self) -> TileId {
        self.tile
    }

    /// Record the measured rest cell ("loaded"). Resets translation.
    pub fn set_rest_position(&self, pos: ItemPosition) {
        let mut state = self.state.borrow_mut();
        state.rest = Some(pos);
        state.real = Some(pos);
        state.style.translate_pct = (0.0, 0.0);
        state.style.drag_offset = ItemOffset::ZERO;
    }

    /// Toggle live-drag mode. Leaving it drops any pointer displacement.
    pub fn set_dragging(&self, dragging: bool) {
        let mut state = self.state.borrow_mut();
        if state.dragging == dragging {
            return;
        }
        state.dragging = dragging;
        if dragging {
            state.style.transition = Transition::None;
        } else {
            state.style.transition = state.default_transition;
            state.style.drag_offset = ItemOffset::ZERO;
        }
    }

    /// Apply the live pointer displacement.
    pub fn drag_to(&self, offset: ItemOffset) {
        self.state.borrow_mut().style.drag_offset = offset;
    }

    /// Register a listener fired after each completed move.
    pub fn on_move_end(&self, listener: impl Fn(ItemPosition) + 'static) {
        self.state.borrow_mut().on_move_end = Some(Rc::new(listener));
    }

    /// Current render descriptor.
    #[must_use]
    pub fn style(&self) -> TileStyle {
        self.state.borrow().style
    }

    /// Last committed cell.
    #[must_use]
    pub fn real_position(&self) -> Option<ItemPosition> {
        self.state.borrow().real
    }

    /// Measured rest cell.
    #[must_use]
    pub fn rest_position(&self) -> Option<ItemPosition> {
        self.state.borrow().rest
    }

    /// Whether the tile is in live-drag mode.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.state.borrow().dragging
    }

    /// Move with the controller's default duration.
    pub fn move_to_default(&self, target: ItemPosition) -> MoveFuture {
        let duration = self.state.borrow().default_transition.duration();
        self.move_to(target.col, target.row, duration)
    }
}

fn translate_pct(rest: ItemPosition, target: ItemPosition) -> (f32, f32) {
    let dx = i64::from(target.col) - i64::from(rest.col);
    let dy = i64::from(target.row) - i64::from(rest.row);
    ((dx * 100) as f32, (dy * 100) as f32)
}

impl MoveTo for TransitionController {
    fn move_to(&self, col: u32, row: u32, duration: Duration) -> MoveFuture {
        let target = ItemPosition::new(row, col);
        let mut state = self.state.borrow_mut();

        let Some(rest) = state.rest else {
            tracing::debug!(target: TARGET, tile = %self.tile, "move before load rejected");
            return futures::future::ready(Err(ReflowError::UnknownRestPosition { tile: self.tile }))
                .boxed_local();
        };

        if state.real == Some(target) {
            return futures::future::ready(Ok(None)).boxed_local();
        }

        let easing = state.easing;
        state.style.translate_pct = translate_pct(rest, target);
        state.style.transition = Transition::eased(duration, easing);
        state.style.drag_offset = ItemOffset::ZERO;
        state.real = Some(target);
        drop(state);

        tracing::trace!(
            target: TARGET,
            tile = %self.tile,
            to = %target,
            duration_ms = duration.as_millis() as u64,
            "move started"
        );

        let shared = Rc::clone(&self.state);
        let tile = self.tile;
        async move {
            tokio::time::sleep(duration).await;
            let listener = shared.borrow().on_move_end.clone();
            if let Some(listener) = listener {
                listener(target);
            }
            tracing::trace!(target: TARGET, tile = %tile, to = %target, "move finished");
            Ok(Some(target))
        }
        .boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn loaded(row: u32, col: u32) -> TransitionController {
        let c = TransitionController::new(TileId(0), Transition::default());
        c.set_rest_position(ItemPosition::new(row, col));
        c
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn rejects_before_load() {
        let c = TransitionController::new(TileId(4), Transition::default());
        let result = c.move_to(1, 1, Duration::from_millis(300)).await;
        assert_eq!(result, Err(ReflowError::UnknownRestPosition { tile: TileId(4) }));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn move_translates_relative_to_rest() {
        let c = loaded(0, 2);
        let start = tokio::time::Instant::now();
        let fut = c.move_to(1, 1, Duration::from_millis(300));

        // Style and optimistic position apply at call time.
        let style = c.style();
        assert_eq!(style.translate_pct, (-100.0, 100.0));
        assert_eq!(
            style.transition,
            Transition::eased(Duration::from_millis(300), Easing::EaseInOut)
        );
        assert_eq!(c.real_position(), Some(ItemPosition::new(1, 1)));

        assert_eq!(fut.await, Ok(Some(ItemPosition::new(1, 1))));
        assert!(start.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn repeated_move_is_idempotent() {
        let c = loaded(0, 0);
        assert_eq!(
            c.move_to(1, 1, Duration::from_millis(300)).await,
            Ok(Some(ItemPosition::new(1, 1)))
        );
        let before = c.style();
        let start = tokio::time::Instant::now();
        assert_eq!(c.move_to(1, 1, Duration::from_millis(300)).await, Ok(None));
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(c.style(), before);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn move_clears_drag_offset() {
        let c = loaded(0, 0);
        c.drag_to(ItemOffset::new(40.0, 12.0));
        let _ = c.move_to(0, 1, Duration::from_millis(100)).await;
        assert!(c.style().drag_offset.is_zero());
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn move_end_listener_fires_after_duration() {
        let c = loaded(0, 0);
        let fired = Rc::new(Cell::new(None));
        let sink = fired.clone();
        c.on_move_end(move |pos| sink.set(Some(pos)));

        let fut = c.move_to(2, 0, Duration::from_millis(300));
        assert_eq!(fired.get(), None);
        fut.await.unwrap();
        assert_eq!(fired.get(), Some(ItemPosition::new(0, 2)));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn superseded_move_does_not_regress() {
        let c = loaded(0, 0);
        let first = c.move_to(1, 0, Duration::from_millis(300));
        let second = c.move_to(2, 0, Duration::from_millis(100));
        assert_eq!(second.await, Ok(Some(ItemPosition::new(0, 2))));
        assert_eq!(first.await, Ok(Some(ItemPosition::new(0, 1))));
        assert_eq!(c.real_position(), Some(ItemPosition::new(0, 2)));
        assert_eq!(c.style().translate_pct, (200.0, 0.0));
    }

    #[test]
    fn dragging_disables_transition() {
        let c = loaded(0, 0);
        c.set_dragging(true);
        assert!(c.is_dragging());
        assert_eq!(c.style().transition, Transition::None);
        c.set_dragging(false);
        assert_eq!(c.style().transition, Transition::default());
    }

    #[test]
    fn leaving_drag_mode_clears_offset() {
        let c = loaded(0, 2);
        c.set_dragging(true);
        c.drag_to(ItemOffset::new(20.0, 10.0));
        assert_eq!(c.style().drag_offset, ItemOffset::new(20.0, 10.0));
        c.set_dragging(false);
        assert!(c.style().drag_offset.is_zero());
        assert_eq!(c.style().translate_pct, (0.0, 0.0));
    }

    #[test]
    fn rest_position_resets_translation() {
        let c = loaded(1, 1);
        assert_eq!(c.rest_position(), Some(ItemPosition::new(1, 1)));
        assert_eq!(c.real_position(), Some(ItemPosition::new(1, 1)));
        c.drag_to(ItemOffset::new(5.0, 5.0));
        c.set_rest_position(ItemPosition::new(0, 0));
        assert_eq!(c.style().translate_pct, (0.0, 0.0));
        assert!(c.style().drag_offset.is_zero());
    }
}
