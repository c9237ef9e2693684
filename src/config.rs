//! Engine settings: judgment profile, scroll speed and the global audio offset.

use thiserror::Error;

use crate::stats::PlayStatistics;

/// A rejected configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// No built-in judgment profile has the name.
    #[error("unknown judgment profile: {0}")]
    UnknownProfile(String),
    /// The speed modifier is not a positive finite number.
    #[error("speed modifier must be positive and finite, got {0}")]
    InvalidSpeedMod(f64),
    /// The pixels per beat is not a positive finite number.
    #[error("pixels per beat must be positive and finite, got {0}")]
    InvalidPixelsPerBeat(f64),
    /// The global offset is not finite.
    #[error("global offset must be finite")]
    NonFiniteOffset,
    /// A judgment profile has no standard window.
    #[error("judgment profile has no standard window")]
    EmptyProfile,
    /// A judgment window is malformed.
    #[error("judgment window {id}: {reason}")]
    InvalidWindow {
        /// Id of the window.
        id: String,
        /// The violated rule.
        reason: &'static str,
    },
    /// The JSON text could not be read.
    #[cfg(feature = "json")]
    #[error("failed to read config: {0}")]
    Json(#[from] serde_json::Error),
}

/// How far apart notes are drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpeedMod {
    /// Multiplier on the beat spacing, following tempo and scroll changes.
    X(f64),
    /// Constant scroll at the given tempo, ignoring tempo and scroll changes.
    C(f64),
}

impl Default for SpeedMod {
    fn default() -> Self {
        Self::X(1.0)
    }
}

impl SpeedMod {
    const fn value(self) -> f64 {
        match self {
            Self::X(value) | Self::C(value) => value,
        }
    }
}

/// Settings of the Y-offset computation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScrollConfig {
    /// The speed modifier.
    pub speed_mod: SpeedMod,
    /// Pixels between two beats at 1x.
    pub pixels_per_beat: f64,
    /// Whether speed events apply.
    pub do_speed_changes: bool,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            speed_mod: SpeedMod::default(),
            pixels_per_beat: 64.0,
            do_speed_changes: true,
        }
    }
}

impl ScrollConfig {
    /// Whether the constant-speed mode is active.
    #[must_use]
    pub const fn is_cmod(&self) -> bool {
        matches!(self.speed_mod, SpeedMod::C(_))
    }
}

/// Settings of the whole engine.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Name of the built-in judgment profile, see [`crate::judgment::PROFILE_NAMES`].
    pub judgment_profile: String,
    /// Scroll settings.
    pub scroll: ScrollConfig,
    /// Audio offset in seconds applied to every chart.
    pub global_offset: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            judgment_profile: crate::judgment::ITG_PROFILE.to_owned(),
            scroll: ScrollConfig::default(),
            global_offset: 0.0,
        }
    }
}

impl EngineConfig {
    /// Checks every field.
    ///
    /// # Errors
    ///
    /// Fails on an unknown profile, a non-positive speed modifier or pixel spacing, or a
    /// non-finite offset.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !crate::judgment::PROFILE_NAMES.contains(&self.judgment_profile.as_str()) {
            return Err(ConfigError::UnknownProfile(self.judgment_profile.clone()));
        }
        let speed = self.scroll.speed_mod.value();
        if !speed.is_finite() || speed <= 0.0 {
            return Err(ConfigError::InvalidSpeedMod(speed));
        }
        let ppb = self.scroll.pixels_per_beat;
        if !ppb.is_finite() || ppb <= 0.0 {
            return Err(ConfigError::InvalidPixelsPerBeat(ppb));
        }
        if !self.global_offset.is_finite() {
            return Err(ConfigError::NonFiniteOffset);
        }
        Ok(())
    }

    /// Whether the constant-speed mode is active.
    #[must_use]
    pub const fn is_cmod(&self) -> bool {
        self.scroll.is_cmod()
    }

    /// Moves the global offset by the suggested correction of `stats` and shifts the statistics
    /// to match. Returns the old and new offsets, or `None` when no correction is suggested.
    pub fn calibrate_global_offset(&mut self, stats: &mut PlayStatistics) -> Option<(f64, f64)> {
        let correction = stats.offset_correction()?;
        let old = self.global_offset;
        let new = round_millis(old - correction);
        stats.apply_offset(-correction).ok()?;
        self.global_offset = new;
        log::info!("global offset calibrated from {old:.3}s to {new:.3}s");
        Some((old, new))
    }

    /// Reads a config from JSON and validates it. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON or an invalid config.
    #[cfg(feature = "json")]
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }
}

/// Rounds seconds to the nearest millisecond.
pub(crate) fn round_millis(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}
