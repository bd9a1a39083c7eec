#![forbid(unsafe_code)]

//! Long-press-then-drag recognition for a single tile.
//!
//! [`GestureDetector`] turns raw [`PointerEvent`]s into [`GestureEvent`]s.
//! A tile only becomes draggable after the pointer has been held on it for
//! the configured threshold; a quick press and release is a plain click.
//!
//! # State Machine
//!
//! ```text
//!   Idle --down--> Pressed --threshold--> Held --move--> Dragging
//!     ^               |                    |                |
//!     +------up-------+---------up---------+-------up-------+
//! ```
//!
//! - `down` emits `PressStart` and arms the hold deadline.
//! - The deadline is polled via [`GestureDetector::tick`]; reaching it emits
//!   `Held`.
//! - The first move in `Held` emits `DragStart` then `DragUpdate`; later
//!   moves emit `DragUpdate` with the cumulative offset.
//! - `up` from any engaged phase emits `DragEnd` and resets the offset.
//!
//! # Invariants
//!
//! 1. `DragStart` is emitted at most once per press.
//! 2. Every `PressStart` is eventually followed by exactly one `DragEnd`
//!    unless [`GestureDetector::reset`] intervenes.
//! 3. Movement before the hold is recognized is ignored, not accumulated.
//! 4. After `DragEnd` or `reset()`, the offset is zero and the phase is `Idle`.
//!
//! # Failure Modes
//!
//! - A second `down` while engaged (missed `up`) restarts the press from
//!   scratch without emitting `DragEnd`.
//! - `up` while `Idle` is ignored.

use std::time::Duration;

use web_time::Instant;

use crate::event::PointerEvent;
use crate::geometry::ItemOffset;
#[cfg(feature = "tracing")]
use crate::logging::TARGET_CORE;
use crate::style::TileVisualState;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Default hold duration before a tile becomes draggable.
pub const DEFAULT_LONG_PRESS: Duration = Duration::from_millis(600);

/// Thresholds for gesture recognition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GestureConfig {
    /// Hold duration before dragging is allowed (default: 600ms).
    pub long_press_threshold: Duration,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            long_press_threshold: DEFAULT_LONG_PRESS,
        }
    }
}

impl GestureConfig {
    /// Config with a custom hold duration.
    #[must_use]
    pub fn with_long_press(mut self, threshold: Duration) -> Self {
        self.long_press_threshold = threshold;
        self
    }
}

// ---------------------------------------------------------------------------
// Events and phases
// ---------------------------------------------------------------------------

/// Semantic gesture output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    /// Pointer went down on the tile.
    PressStart,
    /// Hold threshold reached; the tile is now draggable.
    Held,
    /// First movement after the hold.
    DragStart,
    /// Cumulative displacement since the drag began.
    DragUpdate(ItemOffset),
    /// Pointer released (emitted whether or not a drag happened).
    DragEnd,
}

/// Current phase of the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    /// No pointer interaction.
    Idle,
    /// Pointer down, waiting for the hold deadline.
    Pressed {
        /// When the deadline fires.
        deadline: Instant,
    },
    /// Hold recognized, no movement yet.
    Held,
    /// Following the pointer.
    Dragging,
}

impl GesturePhase {
    /// Whether a press is in progress.
    #[must_use]
    pub const fn is_engaged(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

// ---------------------------------------------------------------------------
// GestureDetector
// ---------------------------------------------------------------------------

/// Per-tile long-press-then-drag recognizer.
///
/// Feed pointer input through [`process`](GestureDetector::process) and call
/// [`tick`](GestureDetector::tick) periodically (e.g. on every frame) so the
/// hold deadline can fire.
#[derive(Debug, Clone)]
pub struct GestureDetector {
    config: GestureConfig,
    phase: GesturePhase,
    offset: ItemOffset,
}

impl GestureDetector {
    /// Create a detector with the given configuration.
    #[must_use]
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            phase: GesturePhase::Idle,
            offset: ItemOffset::ZERO,
        }
    }

    /// Process a pointer event, returning any gesture events produced.
    pub fn process(&mut self, event: &PointerEvent, now: Instant) -> Vec<GestureEvent> {
        let mut out = Vec::with_capacity(2);

        // A late tick must not let a move slip through before `Held`.
        self.poll_deadline(now, &mut out);

        match *event {
            PointerEvent::Down { .. } => {
                self.phase = GesturePhase::Pressed {
                    deadline: now + self.config.long_press_threshold,
                };
                self.offset = ItemOffset::ZERO;
                out.push(GestureEvent::PressStart);
            }
            PointerEvent::Move {
                movement_x,
                movement_y,
            } => match self.phase {
                GesturePhase::Held => {
                    self.phase = GesturePhase::Dragging;
                    #[cfg(feature = "tracing")]
                    tracing::trace!(target: TARGET_CORE, "drag started");
                    out.push(GestureEvent::DragStart);
                    self.offset = self.offset.accumulate(movement_x, movement_y);
                    out.push(GestureEvent::DragUpdate(self.offset));
                }
                GesturePhase::Dragging => {
                    self.offset = self.offset.accumulate(movement_x, movement_y);
                    out.push(GestureEvent::DragUpdate(self.offset));
                }
                GesturePhase::Idle | GesturePhase::Pressed { .. } => {}
            },
            PointerEvent::Up { .. } => {
                if self.phase.is_engaged() {
                    self.phase = GesturePhase::Idle;
                    self.offset = ItemOffset::ZERO;
                    out.push(GestureEvent::DragEnd);
                }
            }
        }

        out
    }

    /// Check the hold deadline. Call periodically (e.g. on tick).
    ///
    /// Returns `Some(Held)` the first time the deadline has passed.
    pub fn tick(&mut self, now: Instant) -> Option<GestureEvent> {
        let mut out = Vec::with_capacity(1);
        self.poll_deadline(now, &mut out);
        out.pop()
    }

    /// Whether this event should stop propagating to ancestors.
    ///
    /// Presses always stop; moves stop while this tile is engaged.
    #[must_use]
    pub fn stops_propagation(&self, event: &PointerEvent) -> bool {
        match event {
            PointerEvent::Down { .. } => true,
            PointerEvent::Move { .. } => self.phase.is_engaged(),
            PointerEvent::Up { .. } => false,
        }
    }

    /// Current phase.
    #[inline]
    #[must_use]
    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    /// Whether the tile is following the pointer.
    #[inline]
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, GesturePhase::Dragging)
    }

    /// Cumulative offset of the current drag.
    #[inline]
    #[must_use]
    pub fn offset(&self) -> ItemOffset {
        self.offset
    }

    /// Visual state for the shell.
    #[must_use]
    pub fn visual_state(&self) -> TileVisualState {
        match self.phase {
            GesturePhase::Idle | GesturePhase::Pressed { .. } => TileVisualState::empty(),
            GesturePhase::Held => TileVisualState::PRESSED,
            GesturePhase::Dragging => TileVisualState::PRESSED | TileVisualState::DRAGGING,
        }
    }

    /// Return to `Idle` without emitting anything.
    pub fn reset(&mut self) {
        self.phase = GesturePhase::Idle;
        self.offset = ItemOffset::ZERO;
    }

    /// Get a reference to the current configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Update the configuration. Takes effect on the next press.
    pub fn set_config(&mut self, config: GestureConfig) {
        self.config = config;
    }

    fn poll_deadline(&mut self, now: Instant, out: &mut Vec<GestureEvent>) {
        if let GesturePhase::Pressed { deadline } = self.phase
            && now >= deadline
        {
            self.phase = GesturePhase::Held;
            #[cfg(feature = "tracing")]
            tracing::trace!(target: TARGET_CORE, "long press recognized");
            out.push(GestureEvent::Held);
        }
    }
}

impl Default for GestureDetector {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const MS_100: Duration = Duration::from_millis(100);
    const MS_599: Duration = Duration::from_millis(599);
    const MS_600: Duration = Duration::from_millis(600);
    const MS_700: Duration = Duration::from_millis(700);

    fn held(t: Instant) -> GestureDetector {
        let mut gd = GestureDetector::default();
        gd.process(&PointerEvent::down(10.0, 10.0), t);
        assert_eq!(gd.tick(t + MS_600), Some(GestureEvent::Held));
        gd
    }

    #[test]
    fn press_emits_press_start() {
        let mut gd = GestureDetector::default();
        let t = Instant::now();
        let events = gd.process(&PointerEvent::down(0.0, 0.0), t);
        assert_eq!(events, vec![GestureEvent::PressStart]);
        assert!(matches!(gd.phase(), GesturePhase::Pressed { .. }));
    }

    #[test]
    fn quick_release_is_click() {
        let mut gd = GestureDetector::default();
        let t = Instant::now();
        gd.process(&PointerEvent::down(0.0, 0.0), t);
        assert!(gd.tick(t + MS_100).is_none());
        let events = gd.process(&PointerEvent::up(), t + MS_100);
        assert_eq!(events, vec![GestureEvent::DragEnd]);
        assert_eq!(gd.phase(), GesturePhase::Idle);
        // Deadline was cancelled.
        assert!(gd.tick(t + MS_700).is_none());
    }

    #[test]
    fn hold_fires_at_threshold_once() {
        let mut gd = GestureDetector::default();
        let t = Instant::now();
        gd.process(&PointerEvent::down(0.0, 0.0), t);
        assert!(gd.tick(t + MS_599).is_none());
        assert_eq!(gd.tick(t + MS_600), Some(GestureEvent::Held));
        assert!(gd.tick(t + MS_700).is_none());
        assert_eq!(gd.phase(), GesturePhase::Held);
        assert_eq!(gd.visual_state(), TileVisualState::PRESSED);
    }

    #[test]
    fn moves_before_hold_are_ignored() {
        let mut gd = GestureDetector::default();
        let t = Instant::now();
        gd.process(&PointerEvent::down(0.0, 0.0), t);
        let events = gd.process(&PointerEvent::moved(30.0, 0.0), t + MS_100);
        assert!(events.is_empty());
        assert!(gd.offset().is_zero());
        assert!(!gd.is_dragging());
    }

    #[test]
    fn first_move_after_hold_starts_drag() {
        let t = Instant::now();
        let mut gd = held(t);
        let events = gd.process(&PointerEvent::moved(5.0, -2.0), t + MS_700);
        assert_eq!(
            events,
            vec![
                GestureEvent::DragStart,
                GestureEvent::DragUpdate(ItemOffset::new(5.0, -2.0)),
            ]
        );
        assert!(gd.is_dragging());
        assert_eq!(
            gd.visual_state(),
            TileVisualState::PRESSED | TileVisualState::DRAGGING
        );
    }

    #[test]
    fn drag_start_emitted_once_and_offset_accumulates() {
        let t = Instant::now();
        let mut gd = held(t);
        gd.process(&PointerEvent::moved(5.0, 0.0), t + MS_700);
        let events = gd.process(&PointerEvent::moved(7.0, 3.0), t + MS_700);
        assert_eq!(
            events,
            vec![GestureEvent::DragUpdate(ItemOffset::new(12.0, 3.0))]
        );
        let events = gd.process(&PointerEvent::moved(-20.0, 1.0), t + MS_700);
        assert_eq!(
            events,
            vec![GestureEvent::DragUpdate(ItemOffset::new(-8.0, 4.0))]
        );
    }

    #[test]
    fn late_tick_is_polled_by_move() {
        // No tick between press and move: the move itself observes the deadline.
        let mut gd = GestureDetector::default();
        let t = Instant::now();
        gd.process(&PointerEvent::down(0.0, 0.0), t);
        let events = gd.process(&PointerEvent::moved(1.0, 1.0), t + MS_700);
        assert_eq!(
            events,
            vec![
                GestureEvent::Held,
                GestureEvent::DragStart,
                GestureEvent::DragUpdate(ItemOffset::new(1.0, 1.0)),
            ]
        );
    }

    #[test]
    fn release_after_drag_resets() {
        let t = Instant::now();
        let mut gd = held(t);
        gd.process(&PointerEvent::moved(50.0, 50.0), t + MS_700);
        let events = gd.process(&PointerEvent::up(), t + MS_700);
        assert_eq!(events, vec![GestureEvent::DragEnd]);
        assert_eq!(gd.phase(), GesturePhase::Idle);
        assert!(gd.offset().is_zero());
        assert_eq!(gd.visual_state(), TileVisualState::empty());
    }

    #[test]
    fn release_while_held_emits_drag_end() {
        let t = Instant::now();
        let mut gd = held(t);
        assert_eq!(
            gd.process(&PointerEvent::up(), t + MS_700),
            vec![GestureEvent::DragEnd]
        );
    }

    #[test]
    fn stray_release_is_ignored() {
        let mut gd = GestureDetector::default();
        assert!(gd.process(&PointerEvent::up(), Instant::now()).is_empty());
    }

    #[test]
    fn idle_moves_are_ignored() {
        let mut gd = GestureDetector::default();
        assert!(
            gd.process(&PointerEvent::moved(3.0, 3.0), Instant::now())
                .is_empty()
        );
    }

    #[test]
    fn second_press_restarts() {
        let t = Instant::now();
        let mut gd = held(t);
        gd.process(&PointerEvent::moved(5.0, 0.0), t + MS_700);
        let events = gd.process(&PointerEvent::down(0.0, 0.0), t + MS_700);
        assert_eq!(events, vec![GestureEvent::PressStart]);
        assert!(gd.offset().is_zero());
        assert!(matches!(gd.phase(), GesturePhase::Pressed { .. }));
    }

    #[test]
    fn propagation_policy() {
        let mut gd = GestureDetector::default();
        let mv = PointerEvent::moved(1.0, 0.0);
        assert!(gd.stops_propagation(&PointerEvent::down(0.0, 0.0)));
        assert!(!gd.stops_propagation(&mv));
        gd.process(&PointerEvent::down(0.0, 0.0), Instant::now());
        assert!(gd.stops_propagation(&mv));
        assert!(!gd.stops_propagation(&PointerEvent::up()));
    }

    #[test]
    fn reset_is_silent() {
        let t = Instant::now();
        let mut gd = held(t);
        gd.process(&PointerEvent::moved(5.0, 0.0), t + MS_700);
        gd.reset();
        assert_eq!(gd.phase(), GesturePhase::Idle);
        assert!(gd.offset().is_zero());
        assert!(gd.process(&PointerEvent::up(), t + MS_700).is_empty());
    }

    #[test]
    fn custom_threshold() {
        let mut gd =
            GestureDetector::new(GestureConfig::default().with_long_press(MS_100));
        let t = Instant::now();
        gd.process(&PointerEvent::down(0.0, 0.0), t);
        assert_eq!(gd.tick(t + MS_100), Some(GestureEvent::Held));
    }

    #[test]
    fn config_getter_and_setter() {
        let mut gd = GestureDetector::default();
        assert_eq!(gd.config().long_press_threshold, MS_600);
        gd.set_config(GestureConfig::default().with_long_press(MS_100));
        assert_eq!(gd.config().long_press_threshold, MS_100);
    }
}
