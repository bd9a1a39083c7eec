#![forbid(unsafe_code)]

//! Canonical pointer event types.
//!
//! The rendering shell translates its native input into [`PointerEvent`]s.
//! Only a single pointer is modeled.
//!
//! # Design Notes
//!
//! - `Down` is delivered by the tile itself; `Move` and `Up` are observed at
//!   the document level so a drag continues when the pointer leaves the tile.
//! - `Move` carries the *incremental* movement since the previous move
//!   (like DOM `movementX`/`movementY`), not an absolute position.

/// Pointer button that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PointerButton {
    /// Primary (left) button.
    #[default]
    Primary,
    /// Secondary (right) button.
    Secondary,
    /// Auxiliary (middle) button.
    Auxiliary,
}

/// Raw pointer input for one tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Button pressed on the tile.
    Down {
        /// Pressed button.
        button: PointerButton,
        /// Pointer x relative to the container.
        x: f64,
        /// Pointer y relative to the container.
        y: f64,
    },
    /// Pointer moved anywhere in the document.
    Move {
        /// Horizontal movement since the previous event.
        movement_x: f64,
        /// Vertical movement since the previous event.
        movement_y: f64,
    },
    /// Button released.
    Up {
        /// Released button.
        button: PointerButton,
    },
}

impl PointerEvent {
    /// Primary-button press at `(x, y)`.
    #[must_use]
    pub const fn down(x: f64, y: f64) -> Self {
        Self::Down {
            button: PointerButton::Primary,
            x,
            y,
        }
    }

    /// Incremental move.
    #[must_use]
    pub const fn moved(movement_x: f64, movement_y: f64) -> Self {
        Self::Move {
            movement_x,
            movement_y,
        }
    }

    /// Primary-button release.
    #[must_use]
    pub const fn up() -> Self {
        Self::Up {
            button: PointerButton::Primary,
        }
    }

    /// Whether this is a button press.
    #[must_use]
    pub const fn is_down(&self) -> bool {
        matches!(self, Self::Down { .. })
    }
}
