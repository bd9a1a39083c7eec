#![forbid(unsafe_code)]

//! Render descriptors handed to the rendering shell.
//!
//! The engine never draws. It describes *what* a tile should look like
//! (translation, live drag offset, transition timing, held/dragging state)
//! and the shell maps that onto its own styling system.

use std::time::Duration;

use bitflags::bitflags;

use crate::geometry::ItemOffset;

/// Default programmatic move duration.
pub const DEFAULT_MOVE_DURATION: Duration = Duration::from_millis(300);

// ---------------------------------------------------------------------------
// Easing
// ---------------------------------------------------------------------------

/// Timing curve of an eased transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Easing {
    /// Constant speed.
    Linear,
    /// Slow start.
    EaseIn,
    /// Slow finish.
    EaseOut,
    /// Slow start and finish.
    #[default]
    EaseInOut,
}

impl Easing {
    /// Map linear progress `t` in `[0, 1]` onto the curve.
    ///
    /// Input outside `[0, 1]` is clamped.
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => t * (2.0 - t),
            Self::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
        }
    }

    /// CSS timing-function keyword.
    #[must_use]
    pub const fn timing_name(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::EaseIn => "ease-in",
            Self::EaseOut => "ease-out",
            Self::EaseInOut => "ease-in-out",
        }
    }

    /// Parse a CSS timing-function keyword.
    #[must_use]
    pub fn from_timing_name(name: &str) -> Option<Self> {
        match name {
            "linear" => Some(Self::Linear),
            "ease-in" => Some(Self::EaseIn),
            "ease-out" => Some(Self::EaseOut),
            "ease-in-out" => Some(Self::EaseInOut),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Transition
// ---------------------------------------------------------------------------

/// How the shell should animate a change of the tile's transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// Apply immediately. Used while the tile follows the pointer.
    None,
    /// Animate over `duration` along `easing`.
    Eased {
        /// Animation length.
        duration: Duration,
        /// Timing curve.
        easing: Easing,
    },
}

impl Transition {
    /// Eased transition with the given duration and curve.
    #[must_use]
    pub const fn eased(duration: Duration, easing: Easing) -> Self {
        Self::Eased { duration, easing }
    }

    /// Animation length; zero for [`Transition::None`].
    #[must_use]
    pub const fn duration(&self) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::Eased { duration, .. } => *duration,
        }
    }

    /// Whether changes are applied without animation.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl Default for Transition {
    fn default() -> Self {
        Self::eased(DEFAULT_MOVE_DURATION, Easing::EaseInOut)
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Eased { duration, easing } => {
                write!(f, "{}s {}", duration.as_secs_f32(), easing.timing_name())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// TileStyle
// ---------------------------------------------------------------------------

/// Complete transform descriptor for one tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileStyle {
    /// Translation as a percentage of the tile's own size (x, y).
    pub translate_pct: (f32, f32),
    /// Live drag displacement in pixels, applied on top of the translation.
    pub drag_offset: ItemOffset,
    /// Timing for the next change.
    pub transition: Transition,
}

impl Default for TileStyle {
    fn default() -> Self {
        Self {
            translate_pct: (0.0, 0.0),
            drag_offset: ItemOffset::ZERO,
            transition: Transition::default(),
        }
    }
}

impl TileStyle {
    /// CSS `transform` value for the percentage translation.
    #[must_use]
    pub fn transform_css(&self) -> String {
        let (x, y) = self.translate_pct;
        format!("translate({x}%, {y}%)")
    }
}

// ---------------------------------------------------------------------------
// TileVisualState
// ---------------------------------------------------------------------------

bitflags! {
    /// Interaction state the shell reflects visually.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TileVisualState: u8 {
        /// Held past the long-press threshold.
        const PRESSED  = 0b01;
        /// Following the pointer.
        const DRAGGING = 0b10;
    }
}
