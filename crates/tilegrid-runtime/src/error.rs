#![forbid(unsafe_code)]

//! Error types for the reflow runtime.

use thiserror::Error;

use crate::TileId;

pub type Result<T> = std::result::Result<T, ReflowError>;

/// Faults raised by tiles, the registry, and the coordinator.
///
/// None of these is fatal: the coordinator logs them and carries on, and the
/// layout self-heals on the next cell crossing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReflowError {
    #[error("tile {tile} has no rest position yet")]
    UnknownRestPosition { tile: TileId },

    #[error("tile {tile} has no registered move capability")]
    MissingRegistration { tile: TileId },

    #[error("tile {tile} is not part of the current collection")]
    UnknownTile { tile: TileId },

    #[error("layout violation: {reason}")]
    LayoutViolation { reason: String },
}

impl ReflowError {
    #[must_use]
    pub fn violation(reason: impl Into<String>) -> Self {
        Self::LayoutViolation {
            reason: reason.into(),
        }
    }

    /// Expected churn from mount/unmount races rather than a real fault.
    #[must_use]
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::MissingRegistration { .. })
    }
}
