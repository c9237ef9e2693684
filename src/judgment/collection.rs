//! A full set of judgment windows and the classification of timing errors against it.

use super::{
    profile,
    window::{HoldRelease, HoldType, JudgmentWindow, WindowHandle, WindowKind},
};
use strict_num_extended::NonNegativeF64;

use crate::config::{ConfigError, EngineConfig};

/// The widest boundary a window may have, in milliseconds.
pub const MAX_BOUNDARY_MS: f64 = 10_000.0;

/// The windows of one judgment profile.
///
/// Standard windows are kept from the narrowest to the widest.
#[derive(Debug, Clone, PartialEq)]
pub struct JudgmentWindowCollection {
    name: String,
    standard: Vec<JudgmentWindow>,
    miss: JudgmentWindow,
    holds: Vec<JudgmentWindow>,
    dropped: Vec<JudgmentWindow>,
    mine: Option<JudgmentWindow>,
}

impl JudgmentWindowCollection {
    /// Assembles a collection after checking every window.
    ///
    /// `holds` may mix [`WindowKind::Hold`] and [`WindowKind::HoldDropped`] windows.
    ///
    /// # Errors
    ///
    /// Fails when `standard` is empty, when a boundary is negative, not finite or above
    /// [`MAX_BOUNDARY_MS`], or when a window is passed where its kind does not belong.
    pub fn new(
        name: impl Into<String>,
        standard: Vec<JudgmentWindow>,
        miss: JudgmentWindow,
        holds: Vec<JudgmentWindow>,
        mine: Option<JudgmentWindow>,
    ) -> Result<Self, ConfigError> {
        if standard.is_empty() {
            return Err(ConfigError::EmptyProfile);
        }
        let all = standard
            .iter()
            .chain(std::iter::once(&miss))
            .chain(&holds)
            .chain(&mine);
        for window in all {
            if NonNegativeF64::new(window.boundary_ms).is_err() {
                return Err(invalid(window, "boundary must be finite and non-negative"));
            }
            if window.boundary_ms > MAX_BOUNDARY_MS {
                return Err(invalid(window, "boundary must not exceed 10 seconds"));
            }
        }
        if let Some(window) = standard.iter().find(|w| w.kind != WindowKind::Standard) {
            return Err(invalid(window, "expected a standard window"));
        }
        if miss.kind != WindowKind::Miss {
            return Err(invalid(&miss, "expected a miss window"));
        }
        if let Some(window) = holds
            .iter()
            .find(|w| !matches!(w.kind, WindowKind::Hold(_) | WindowKind::HoldDropped(_)))
        {
            return Err(invalid(window, "expected a hold window"));
        }
        if let Some(window) = mine.as_ref().filter(|w| w.kind != WindowKind::Mine) {
            return Err(invalid(window, "expected a mine window"));
        }
        Ok(Self::assemble(name.into(), standard, miss, holds, mine))
    }

    /// Sorts the standard windows and hands out handles without checking anything.
    pub(crate) fn assemble(
        name: String,
        mut standard: Vec<JudgmentWindow>,
        mut miss: JudgmentWindow,
        holds: Vec<JudgmentWindow>,
        mine: Option<JudgmentWindow>,
    ) -> Self {
        standard.sort_by(|a, b| a.boundary_ms.total_cmp(&b.boundary_ms));
        for (rank, window) in standard.iter_mut().enumerate() {
            window.handle = WindowHandle::Standard(rank);
        }
        let (holds, dropped): (Vec<_>, Vec<_>) = holds
            .into_iter()
            .map(|mut window| {
                window.handle = window.kind.into();
                window
            })
            .partition(|window| matches!(window.kind, WindowKind::Hold(_)));
        miss.handle = WindowHandle::Miss;
        let mine = mine.map(|mut window| {
            window.handle = WindowHandle::Mine;
            window
        });
        Self {
            name,
            standard,
            miss,
            holds,
            dropped,
            mine,
        }
    }

    /// The built-in profile of the name, see [`super::PROFILE_NAMES`].
    #[must_use]
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            profile::ITG_PROFILE => Some(profile::itg()),
            profile::FA_PLUS_PROFILE => Some(profile::fa_plus()),
            _ => None,
        }
    }

    /// The built-in profile named by the config.
    ///
    /// # Errors
    ///
    /// Fails with [`ConfigError::UnknownProfile`] for an unknown name.
    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        Self::builtin(&config.judgment_profile)
            .ok_or_else(|| ConfigError::UnknownProfile(config.judgment_profile.clone()))
    }

    /// The profile name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Standard windows from the narrowest to the widest.
    #[must_use]
    pub fn standard_windows(&self) -> &[JudgmentWindow] {
        &self.standard
    }

    /// Completed-hold windows.
    #[must_use]
    pub fn hold_windows(&self) -> &[JudgmentWindow] {
        &self.holds
    }

    /// Dropped-hold windows.
    #[must_use]
    pub fn dropped_windows(&self) -> &[JudgmentWindow] {
        &self.dropped
    }

    /// The miss window.
    #[must_use]
    pub const fn miss_judgment(&self) -> &JudgmentWindow {
        &self.miss
    }

    /// The mine window, if the profile judges mines.
    #[must_use]
    pub const fn mine_judgment(&self) -> Option<&JudgmentWindow> {
        self.mine.as_ref()
    }

    /// Every window of the collection.
    pub fn windows(&self) -> impl Iterator<Item = &JudgmentWindow> {
        self.standard
            .iter()
            .chain(std::iter::once(&self.miss))
            .chain(&self.holds)
            .chain(&self.dropped)
            .chain(&self.mine)
    }

    /// The widest standard boundary in milliseconds.
    #[must_use]
    pub fn max_window_ms(&self) -> f64 {
        self.standard.last().map_or(0.0, |window| window.boundary_ms)
    }

    /// Looks a window up by handle.
    #[must_use]
    pub fn window(&self, handle: WindowHandle) -> Option<&JudgmentWindow> {
        match handle {
            WindowHandle::Standard(rank) => self.standard.get(rank),
            WindowHandle::Miss => Some(&self.miss),
            WindowHandle::Hold(hold) => self.hold_window(hold),
            WindowHandle::HoldDropped(hold) => {
                self.dropped.iter().find(|w| w.kind == WindowKind::HoldDropped(hold))
            }
            WindowHandle::Mine => self.mine.as_ref(),
        }
    }

    /// The narrowest standard window containing the error in milliseconds, or the miss window.
    ///
    /// Boundaries are inclusive and the sign of the error is ignored.
    #[must_use]
    pub fn classify(&self, error_ms: f64) -> &JudgmentWindow {
        self.standard
            .iter()
            .find(|window| window.contains(error_ms))
            .unwrap_or(&self.miss)
    }

    /// [`Self::classify`] for an error in seconds.
    #[must_use]
    pub fn classify_seconds(&self, error: f64) -> &JudgmentWindow {
        self.classify(error * 1000.0)
    }

    /// The completed-hold window of the type.
    #[must_use]
    pub fn hold_window(&self, note_type: HoldType) -> Option<&JudgmentWindow> {
        self.holds
            .iter()
            .find(|window| window.kind == WindowKind::Hold(note_type))
    }

    /// Whether letting go of a hold for `gap_ms` drops it.
    #[must_use]
    pub fn is_hold_dropped(&self, note_type: HoldType, gap_ms: f64) -> bool {
        self.hold_window(note_type)
            .is_some_and(|window| gap_ms > window.boundary_ms)
    }

    /// The window judging a hold that ended the given way.
    ///
    /// A hold whose head was never hit counts as dropped.
    #[must_use]
    pub fn classify_hold(
        &self,
        note_type: HoldType,
        release: HoldRelease,
    ) -> Option<&JudgmentWindow> {
        match release {
            HoldRelease::Completed => self.hold_window(note_type),
            HoldRelease::ReleasedEarly | HoldRelease::NeverHit => {
                self.window(WindowHandle::HoldDropped(note_type))
            }
        }
    }

    /// The mine window when the mine went off, `None` when it was avoided.
    #[must_use]
    pub fn classify_mine(&self, hit: bool) -> Option<&JudgmentWindow> {
        self.mine.as_ref().filter(|_| hit)
    }

    /// The most points a tap can earn.
    #[must_use]
    pub fn best_tap_points(&self) -> f64 {
        self.standard
            .iter()
            .map(|window| window.dance_points)
            .fold(0.0, f64::max)
    }

    /// The most points a hold can earn.
    #[must_use]
    pub fn best_hold_points(&self) -> f64 {
        self.holds
            .iter()
            .map(|window| window.dance_points)
            .fold(0.0, f64::max)
    }
}

fn invalid(window: &JudgmentWindow, reason: &'static str) -> ConfigError {
    ConfigError::InvalidWindow {
        id: window.id.clone(),
        reason,
    }
}
