#![forbid(unsafe_code)]

//! Tunable timing for the reflow engine.
//!
//! [`ReflowConfig`] gathers the hold threshold, the programmatic move
//! duration and the easing curve. With the `reflow-config` feature it can be
//! loaded from TOML or JSON at startup.
//!
//! # Loading
//!
//! ```toml
//! # tilegrid.toml
//! long_press_ms = 450
//! move_duration_ms = 250
//! easing = "ease-out"
//! ```
//!
//! ```rust,ignore
//! let config = ReflowConfig::from_toml_file("tilegrid.toml")?;
//! let config = ReflowConfig::from_json_str(json)?;
//! ```
//!
//! # Defaults
//!
//! `ReflowConfig::default()` is a 600ms hold, 300ms moves, `ease-in-out`.

#[cfg(feature = "reflow-config")]
use std::path::Path;
use std::time::Duration;

#[cfg(feature = "reflow-config")]
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tilegrid_core::gesture::GestureConfig;
use tilegrid_core::style::{Easing, Transition};

/// Upper bound accepted for either duration.
const MAX_DURATION_MS: u64 = 10_000;

/// Timing configuration for gestures and moves.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "reflow-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "reflow-config", serde(default))]
pub struct ReflowConfig {
    /// Hold time before a tile becomes draggable, in milliseconds.
    pub long_press_ms: u64,

    /// Duration of every programmatic move, in milliseconds.
    pub move_duration_ms: u64,

    /// Timing curve for programmatic moves.
    #[cfg_attr(feature = "reflow-config", serde(with = "easing_name"))]
    pub easing: Easing,
}

impl Default for ReflowConfig {
    fn default() -> Self {
        Self {
            long_press_ms: 600,
            move_duration_ms: 300,
            easing: Easing::EaseInOut,
        }
    }
}

impl ReflowConfig {
    /// Set the hold threshold.
    #[must_use]
    pub fn with_long_press(mut self, threshold: Duration) -> Self {
        self.long_press_ms = threshold.as_millis() as u64;
        self
    }

    /// Set the move duration.
    #[must_use]
    pub fn with_move_duration(mut self, duration: Duration) -> Self {
        self.move_duration_ms = duration.as_millis() as u64;
        self
    }

    /// Set the easing curve.
    #[must_use]
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Hold threshold as a [`Duration`].
    #[must_use]
    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }

    /// Move duration as a [`Duration`].
    #[must_use]
    pub fn move_duration(&self) -> Duration {
        Duration::from_millis(self.move_duration_ms)
    }

    /// Transition used for programmatic moves.
    #[must_use]
    pub fn transition(&self) -> Transition {
        Transition::eased(self.move_duration(), self.easing)
    }

    /// Gesture detector configuration derived from this config.
    #[must_use]
    pub fn gesture_config(&self) -> GestureConfig {
        GestureConfig::default().with_long_press(self.long_press())
    }

    /// Validate all parameters.
    ///
    /// Returns a list of problems; empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.long_press_ms > MAX_DURATION_MS {
            errors.push(format!(
                "long_press_ms must be <= {MAX_DURATION_MS}, got {}",
                self.long_press_ms
            ));
        }

        if self.move_duration_ms == 0 {
            errors.push("move_duration_ms must be > 0".into());
        } else if self.move_duration_ms > MAX_DURATION_MS {
            errors.push(format!(
                "move_duration_ms must be <= {MAX_DURATION_MS}, got {}",
                self.move_duration_ms
            ));
        }

        errors
    }

    /// Fail with [`ReflowConfigError::Validation`] if invalid.
    pub fn validated(self) -> Result<Self, ReflowConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ReflowConfigError::Validation(errors))
        }
    }

    /// Load from a TOML string.
    #[cfg(feature = "reflow-config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ReflowConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ReflowConfigError::parse("TOML", e))?;
        config.validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "reflow-config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ReflowConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "reflow-config")]
    pub fn from_json_str(s: &str) -> Result<Self, ReflowConfigError> {
        let config: Self =
            serde_json::from_str(s).map_err(|e| ReflowConfigError::parse("JSON", e))?;
        config.validated()
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "reflow-config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ReflowConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }
}

/// Errors from loading or validating a [`ReflowConfig`].
#[derive(Debug, Error)]
pub enum ReflowConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{format} parse error: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    #[error("invalid reflow config: {}", .0.join("; "))]
    Validation(Vec<String>),
}

impl ReflowConfigError {
    #[cfg(feature = "reflow-config")]
    fn parse(format: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Parse {
            format,
            message: err.to_string(),
        }
    }
}

#[cfg(feature = "reflow-config")]
mod easing_name {
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};
    use tilegrid_core::style::Easing;

    pub fn serialize<S: Serializer>(easing: &Easing, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(easing.timing_name())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Easing, D::Error> {
        let name = String::deserialize(d)?;
        Easing::from_timing_name(&name)
            .ok_or_else(|| D::Error::custom(format!("unknown easing `{name}`")))
    }
}
