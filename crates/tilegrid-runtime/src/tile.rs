#![forbid(unsafe_code)]

//! Tile identity and the per-tile host.
//!
//! [`DraggableTile`] is what a rendering shell instantiates for each item in
//! the grid. It owns the tile's [`GestureDetector`] and
//! [`TransitionController`], registers the controller's move capability with
//! the coordinator on mount, and forwards recognized gestures:
//!
//! | Gesture | Controller | Coordinator |
//! |---------|------------|-------------|
//! | `PressStart` | | `on_press_start` |
//! | `Held` | | |
//! | `DragStart` | `set_dragging(true)` | `on_dragging_start` |
//! | `DragUpdate` | `drag_to` | `on_dragging` |
//! | `DragEnd` | `set_dragging(false)` | `on_mouse_up` |
//!
//! Dropping the tile unregisters it. A newer tile mounted under the same id
//! keeps its registration.

use std::fmt;
use std::rc::Rc;

use tilegrid_core::event::PointerEvent;
use tilegrid_core::geometry::{ItemPosition, TileGeometry};
use tilegrid_core::gesture::{GestureDetector, GestureEvent};
use tilegrid_core::style::{TileStyle, TileVisualState};
use web_time::Instant;

use crate::coordinator::{DragUpdate, ReflowCoordinator, Settle};
use crate::error::Result;
use crate::registry::{MoveTo, RegistrySlot};
use crate::transition::TransitionController;

const TARGET: &str = "tilegrid.tile";

/// Stable, caller-supplied identity of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(pub u64);

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for TileId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Outcome of feeding one pointer event to a tile.
#[derive(Debug, Default)]
pub struct TileResponse {
    /// Gestures recognized, in order.
    pub events: Vec<GestureEvent>,
    /// The shell should stop the event from reaching ancestors.
    pub stop_propagation: bool,
    /// Result of the drag update, if one was routed.
    pub drag: Option<DragUpdate>,
    /// Result of the drag end, if one was routed.
    pub settle: Option<Settle>,
}

/// One grid item: gesture recognition plus its visual transform.
pub struct DraggableTile {
    id: TileId,
    detector: GestureDetector,
    controller: TransitionController,
    capability: Rc<dyn MoveTo>,
    slot: RegistrySlot,
    coordinator: ReflowCoordinator,
}

impl fmt::Debug for DraggableTile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DraggableTile")
            .field("id", &self.id)
            .field("phase", &self.detector.phase())
            .field("controller", &self.controller)
            .finish_non_exhaustive()
    }
}

impl DraggableTile {
    /// Mount tile `id` and register its move capability.
    ///
    /// Fails with [`ReflowError::UnknownTile`](crate::ReflowError::UnknownTile)
    /// if `id` is not in the coordinator's collection.
    pub fn mount(coordinator: &ReflowCoordinator, id: TileId) -> Result<Self> {
        let slot = coordinator.slot(id)?;
        let config = coordinator.config();
        let controller = TransitionController::new(id, config.transition());
        let capability: Rc<dyn MoveTo> = Rc::new(controller.clone());
        slot.install(Rc::clone(&capability));
        tracing::debug!(target: TARGET, tile = %id, "tile mounted");
        Ok(Self {
            id,
            detector: GestureDetector::new(config.gesture_config()),
            controller,
            capability,
            slot,
            coordinator: coordinator.clone(),
        })
    }

    /// Report the tile's measured box. Returns its rest cell.
    pub fn attach(&self, geometry: &TileGeometry) -> Result<ItemPosition> {
        let pos = self.coordinator.metrics().rest_cell(geometry);
        self.controller.set_rest_position(pos);
        self.coordinator.on_loaded(self.id, pos)?;
        Ok(pos)
    }

    /// Feed a pointer event.
    pub fn handle_pointer(&mut self, event: &PointerEvent, now: Instant) -> TileResponse {
        let stop_propagation = self.detector.stops_propagation(event);
        let events = self.detector.process(event, now);
        let mut response = TileResponse {
            events: Vec::with_capacity(events.len()),
            stop_propagation,
            drag: None,
            settle: None,
        };

        for gesture in events {
            tracing::trace!(target: TARGET, tile = %self.id, event = ?gesture, "gesture");
            match gesture {
                GestureEvent::PressStart => {
                    if !self.coordinator.on_press_start(self.id) {
                        self.detector.reset();
                        response.stop_propagation = false;
                        return response;
                    }
                }
                GestureEvent::Held => {}
                GestureEvent::DragStart => {
                    self.controller.set_dragging(true);
                    self.coordinator.on_dragging_start(self.id);
                }
                GestureEvent::DragUpdate(offset) => {
                    self.controller.drag_to(offset);
                    response.drag = Some(self.coordinator.on_dragging(self.id, offset));
                }
                GestureEvent::DragEnd => {
                    self.controller.set_dragging(false);
                    response.settle = Some(self.coordinator.on_mouse_up(self.id));
                }
            }
            response.events.push(gesture);
        }
        response
    }

    /// Poll the hold deadline. Returns `Held` once it is reached.
    pub fn tick(&mut self, now: Instant) -> Option<GestureEvent> {
        self.detector.tick(now)
    }

    /// Register a listener fired after each of this tile's moves completes.
    pub fn on_move_end(&self, listener: impl Fn(ItemPosition) + 'static) {
        self.controller.on_move_end(listener);
    }

    #[must_use]
    pub fn id(&self) -> TileId {
        self.id
    }

    /// Current render descriptor.
    #[must_use]
    pub fn style(&self) -> TileStyle {
        self.controller.style()
    }

    /// Pressed/dragging flags for the shell's class list.
    #[must_use]
    pub fn visual_state(&self) -> TileVisualState {
        self.detector.visual_state()
    }

    #[must_use]
    pub fn controller(&self) -> &TransitionController {
        &self.controller
    }

    #[must_use]
    pub fn slot(&self) -> &RegistrySlot {
        &self.slot
    }
}

impl Drop for DraggableTile {
    fn drop(&mut self) {
        if self.slot.clear_if(&self.capability) {
            self.coordinator.unmount(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReflowError;
    use crate::reflow_config::ReflowConfig;
    use std::time::Duration;
    use tilegrid_core::geometry::{GridMetrics, ItemOffset};
    use tilegrid_core::style::Transition;

    fn coordinator(n: u64) -> ReflowCoordinator {
        let c = ReflowCoordinator::new(GridMetrics::new(100.0, 100.0, 400.0), ReflowConfig::default());
        c.set_tiles(&(0..n).map(TileId).collect::<Vec<_>>());
        c
    }

    fn geometry(index: u32) -> TileGeometry {
        let pos = GridMetrics::new(100.0, 100.0, 400.0).position_of(index);
        TileGeometry::new(f64::from(pos.col) * 100.0, f64::from(pos.row) * 100.0, 100.0, 100.0)
    }

    #[test]
    fn display_is_hash_prefixed() {
        assert_eq!(TileId(42).to_string(), "#42");
        assert_eq!(TileId::from(3), TileId(3));
    }

    #[test]
    fn mount_unknown_tile_fails() {
        let c = coordinator(2);
        let err = DraggableTile::mount(&c, TileId(9)).unwrap_err();
        assert_eq!(err, ReflowError::UnknownTile { tile: TileId(9) });
    }

    #[test]
    fn attach_reports_rest_cell() {
        let c = coordinator(8);
        let tile = DraggableTile::mount(&c, TileId(5)).unwrap();
        assert!(tile.slot().is_registered());
        let pos = tile.attach(&geometry(5)).unwrap();
        assert_eq!(pos, ItemPosition::new(1, 1));
        assert_eq!(c.position(TileId(5)), Some(pos));
        assert_eq!(tile.controller().rest_position(), Some(pos));
    }

    #[test]
    fn drop_unregisters() {
        let c = coordinator(2);
        let tile = DraggableTile::mount(&c, TileId(1)).unwrap();
        let slot = tile.slot().clone();
        drop(tile);
        assert!(!slot.is_registered());
    }

    #[test]
    fn dropping_stale_tile_keeps_remount() {
        let c = coordinator(2);
        let old = DraggableTile::mount(&c, TileId(1)).unwrap();
        let new = DraggableTile::mount(&c, TileId(1)).unwrap();
        new.attach(&geometry(1)).unwrap();
        drop(old);
        assert!(new.slot().is_registered());
        assert_eq!(c.position(TileId(1)), Some(ItemPosition::new(0, 1)));
    }

    #[test]
    fn press_hold_drag_routes_to_controller() {
        let c = coordinator(4);
        let mut tile = DraggableTile::mount(&c, TileId(0)).unwrap();
        tile.attach(&geometry(0)).unwrap();
        let t0 = Instant::now();

        let down = tile.handle_pointer(&PointerEvent::down(10.0, 10.0), t0);
        assert_eq!(down.events, vec![GestureEvent::PressStart]);
        assert!(down.stop_propagation);
        assert_eq!(c.active_tile(), Some(TileId(0)));

        // Movement before the hold is ignored.
        let early = tile.handle_pointer(&PointerEvent::moved(5.0, 0.0), t0 + Duration::from_millis(100));
        assert!(early.events.is_empty());
        assert!(early.drag.is_none());

        assert_eq!(tile.tick(t0 + Duration::from_millis(600)), Some(GestureEvent::Held));
        assert!(tile.visual_state().contains(TileVisualState::PRESSED));

        let drag = tile.handle_pointer(&PointerEvent::moved(20.0, 5.0), t0 + Duration::from_millis(700));
        assert_eq!(
            drag.events,
            vec![
                GestureEvent::DragStart,
                GestureEvent::DragUpdate(ItemOffset::new(20.0, 5.0))
            ]
        );
        assert!(matches!(drag.drag, Some(DragUpdate::SameCell)));
        assert!(tile.controller().is_dragging());
        assert_eq!(tile.style().transition, Transition::None);
        assert_eq!(tile.style().drag_offset, ItemOffset::new(20.0, 5.0));
    }

    #[test]
    fn second_tile_press_is_rejected_while_one_is_held() {
        let c = coordinator(4);
        let mut a = DraggableTile::mount(&c, TileId(0)).unwrap();
        let mut b = DraggableTile::mount(&c, TileId(1)).unwrap();
        a.attach(&geometry(0)).unwrap();
        b.attach(&geometry(1)).unwrap();
        let now = Instant::now();

        a.handle_pointer(&PointerEvent::down(0.0, 0.0), now);
        let rejected = b.handle_pointer(&PointerEvent::down(0.0, 0.0), now);
        assert!(rejected.events.is_empty());
        assert!(!rejected.stop_propagation);
        assert!(b.visual_state().is_empty());
        assert_eq!(c.active_tile(), Some(TileId(0)));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn quick_click_settles_in_place() {
        tokio::task::LocalSet::new()
            .run_until(async {
                let c = coordinator(4);
                let mut tile = DraggableTile::mount(&c, TileId(2)).unwrap();
                tile.attach(&geometry(2)).unwrap();
                let now = Instant::now();
                tile.handle_pointer(&PointerEvent::down(0.0, 0.0), now);
                let up = tile.handle_pointer(&PointerEvent::up(), now + Duration::from_millis(50));
                assert_eq!(up.events, vec![GestureEvent::DragEnd]);
                let Some(Settle::Scheduled(handle)) = up.settle else {
                    panic!("expected a scheduled settle");
                };
                handle.await.unwrap();
                assert!(c.is_at_rest());
                assert_eq!(c.position(TileId(2)), Some(ItemPosition::new(0, 2)));
                assert_eq!(tile.style().translate_pct, (0.0, 0.0));
            })
            .await;
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn release_in_own_cell_drops_drag_offset() {
        tokio::task::LocalSet::new()
            .run_until(async {
                let c = coordinator(4);
                let mut tile = DraggableTile::mount(&c, TileId(2)).unwrap();
                tile.attach(&geometry(2)).unwrap();
                let t0 = Instant::now();
                tile.handle_pointer(&PointerEvent::down(0.0, 0.0), t0);
                tile.tick(t0 + Duration::from_millis(600));
                let moved = tile.handle_pointer(
                    &PointerEvent::moved(20.0, 10.0),
                    t0 + Duration::from_millis(650),
                );
                assert!(matches!(moved.drag, Some(DragUpdate::SameCell)));
                assert_eq!(tile.style().drag_offset, ItemOffset::new(20.0, 10.0));

                let up = tile.handle_pointer(&PointerEvent::up(), t0 + Duration::from_millis(700));
                assert!(tile.style().drag_offset.is_zero());
                let Some(Settle::Scheduled(handle)) = up.settle else {
                    panic!("expected a scheduled settle");
                };
                handle.await.unwrap();
                assert!(c.is_at_rest());
                assert!(tile.style().drag_offset.is_zero());
                assert_eq!(tile.style().translate_pct, (0.0, 0.0));
            })
            .await;
    }
}
