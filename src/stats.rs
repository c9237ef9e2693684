//! Play statistics: timing error distribution, judgment counts, combo and score.
//!
//! Only hits judged by a standard window feed the error statistics and the histogram. Misses,
//! holds and mines are counted and scored but carry no meaningful error.

pub mod histogram;
pub mod running;

use std::collections::BTreeMap;

use thiserror::Error;

use self::{histogram::Histogram, running::RunningStats};
use crate::{
    config::round_millis,
    judgment::{HoldRelease, HoldType, JudgmentWindowCollection, WindowHandle, WindowKind},
};

/// A request the statistics cannot serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum StatisticsError {
    /// Nothing was recorded yet.
    #[error("no data points recorded")]
    Empty,
    /// The handle names no window of the collection in use.
    #[error("unknown judgment window {0:?}")]
    UnknownWindow(WindowHandle),
}

/// Note counts of the chart being played, for the score denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChartTotals {
    /// Judged taps, hold heads included.
    pub taps: u32,
    /// Holds and rolls.
    pub holds: u32,
}

/// One recorded judgment.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataPoint {
    /// Timing error in seconds as recorded, positive when late.
    pub raw_error: f64,
    /// Timing error in seconds with the applied offset.
    pub error: f64,
    /// The window that judged it.
    pub judgment: WindowHandle,
}

/// Statistics of one play, judged against a [`JudgmentWindowCollection`].
#[derive(Debug, Clone)]
pub struct PlayStatistics {
    windows: JudgmentWindowCollection,
    totals: ChartTotals,
    points: Vec<(f64, WindowHandle)>,
    running: RunningStats,
    histogram: Histogram,
    offset: f64,
    counts: BTreeMap<WindowHandle, u32>,
    combo: u32,
    max_combo: u32,
    earned: f64,
    possible_so_far: f64,
}

impl PlayStatistics {
    /// Creates empty statistics for a chart.
    #[must_use]
    pub fn new(windows: JudgmentWindowCollection, totals: ChartTotals) -> Self {
        let histogram = Histogram::new(windows.max_window_ms().round() as i32);
        Self {
            windows,
            totals,
            points: Vec::new(),
            running: RunningStats::new(),
            histogram,
            offset: 0.0,
            counts: BTreeMap::new(),
            combo: 0,
            max_combo: 0,
            earned: 0.0,
            possible_so_far: 0.0,
        }
    }

    /// The windows judging this play.
    #[must_use]
    pub const fn windows(&self) -> &JudgmentWindowCollection {
        &self.windows
    }

    /// Classifies a tap error in seconds and records it. Returns the judging window.
    pub fn judge(&mut self, error: f64) -> WindowHandle {
        let handle = self.windows.classify_seconds(error).handle();
        self.push(error, handle);
        handle
    }

    /// Records an error in seconds judged by the window.
    ///
    /// # Errors
    ///
    /// Fails with [`StatisticsError::UnknownWindow`] when the collection has no such window.
    pub fn record(&mut self, error: f64, judgment: WindowHandle) -> Result<(), StatisticsError> {
        if self.windows.window(judgment).is_none() {
            return Err(StatisticsError::UnknownWindow(judgment));
        }
        self.push(error, judgment);
        Ok(())
    }

    /// Records how a hold ended. Returns the judging window, if the profile judges the type.
    pub fn record_hold(&mut self, note_type: HoldType, release: HoldRelease) -> Option<WindowHandle> {
        let handle = self.windows.classify_hold(note_type, release)?.handle();
        self.push(0.0, handle);
        Some(handle)
    }

    /// Records a mine. Avoided mines leave no trace.
    pub fn record_mine(&mut self, hit: bool) -> Option<WindowHandle> {
        let handle = self.windows.classify_mine(hit)?.handle();
        self.push(0.0, handle);
        Some(handle)
    }

    fn push(&mut self, error: f64, handle: WindowHandle) {
        let Some(window) = self.windows.window(handle) else {
            return;
        };
        let (kind, points, breaks_combo) = (window.kind, window.dance_points, window.breaks_combo);
        match kind {
            WindowKind::Standard => {
                self.running.push(error * 1000.0);
                self.histogram.add((error + self.offset) * 1000.0);
                self.possible_so_far += self.windows.best_tap_points();
            }
            WindowKind::Miss => self.possible_so_far += self.windows.best_tap_points(),
            WindowKind::Hold(_) | WindowKind::HoldDropped(_) => {
                self.possible_so_far += self.windows.best_hold_points();
            }
            WindowKind::Mine => {}
        }
        if breaks_combo {
            self.combo = 0;
        } else if kind == WindowKind::Standard {
            self.combo += 1;
            self.max_combo = self.max_combo.max(self.combo);
        }
        self.earned += points;
        *self.counts.entry(handle).or_default() += 1;
        self.points.push((error, handle));
    }

    /// Forgets every recording and the applied offset.
    pub fn clear(&mut self) {
        *self = Self::new(self.windows.clone(), self.totals);
    }

    /// Number of recordings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The recordings in order, with the applied offset.
    pub fn data_points(&self) -> impl ExactSizeIterator<Item = DataPoint> + '_ {
        self.points.iter().map(|&(raw_error, judgment)| DataPoint {
            raw_error,
            error: raw_error + self.offset,
            judgment,
        })
    }

    /// How many recordings the window judged.
    #[must_use]
    pub fn count(&self, judgment: WindowHandle) -> u32 {
        self.counts.get(&judgment).copied().unwrap_or(0)
    }

    /// The current combo.
    #[must_use]
    pub const fn combo(&self) -> u32 {
        self.combo
    }

    /// The longest combo so far.
    #[must_use]
    pub const fn max_combo(&self) -> u32 {
        self.max_combo
    }

    /// Points earned so far.
    #[must_use]
    pub const fn earned_points(&self) -> f64 {
        self.earned
    }

    /// Earned points over the most the whole chart can give, at least 0.
    #[must_use]
    pub fn score(&self) -> f64 {
        let possible = f64::from(self.totals.taps) * self.windows.best_tap_points()
            + f64::from(self.totals.holds) * self.windows.best_hold_points();
        ratio(self.earned, possible)
    }

    /// Earned points over the most the judged notes could give, at least 0.
    #[must_use]
    pub fn cumulative_score(&self) -> f64 {
        ratio(self.earned, self.possible_so_far)
    }

    /// Mean error in seconds.
    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        self.running.mean().map(|ms| ms / 1000.0 + self.offset)
    }

    /// Median error in seconds.
    #[must_use]
    pub fn median(&self) -> Option<f64> {
        self.running.median().map(|ms| ms / 1000.0 + self.offset)
    }

    /// Population standard deviation of the error in seconds.
    #[must_use]
    pub fn std_dev(&self) -> Option<f64> {
        self.running.std_dev().map(|ms| ms / 1000.0)
    }

    /// The most frequent error in seconds, at millisecond resolution.
    #[must_use]
    pub fn mode(&self) -> Option<f64> {
        self.histogram
            .mode_ms()
            .map(|bucket| f64::from(bucket) / 1000.0)
    }

    /// The error histogram, offset applied.
    #[must_use]
    pub const fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    /// The error histogram smoothed for display.
    #[must_use]
    pub fn smoothed_histogram(&self) -> Vec<(i32, f64)> {
        self.histogram.smoothed()
    }

    /// The offset in seconds added to every recorded error.
    #[must_use]
    pub const fn applied_offset(&self) -> f64 {
        self.offset
    }

    /// Adds `delta` seconds to every error, as if the chart had been shifted by it.
    ///
    /// Repeated calls add up. The recorded errors stay untouched.
    ///
    /// # Errors
    ///
    /// Fails with [`StatisticsError::Empty`] when nothing was recorded.
    pub fn apply_offset(&mut self, delta: f64) -> Result<(), StatisticsError> {
        if self.points.is_empty() {
            return Err(StatisticsError::Empty);
        }
        self.offset += delta;
        self.rebuild_histogram();
        log::debug!("statistics offset now {:.4}s", self.offset);
        Ok(())
    }

    /// Removes the applied offset.
    pub fn clear_offset(&mut self) {
        self.offset = 0.0;
        self.rebuild_histogram();
    }

    fn rebuild_histogram(&mut self) {
        self.histogram.clear();
        for &(error, handle) in &self.points {
            if matches!(handle, WindowHandle::Standard(_)) {
                self.histogram.add((error + self.offset) * 1000.0);
            }
        }
    }

    /// The offset change in seconds that would center the errors: the median rounded to the
    /// millisecond. `None` when there is nothing to correct.
    #[must_use]
    pub fn offset_correction(&self) -> Option<f64> {
        let correction = round_millis(self.median()?);
        (correction != 0.0).then_some(correction)
    }
}

fn ratio(earned: f64, possible: f64) -> f64 {
    if possible <= 0.0 {
        return 0.0;
    }
    (earned / possible).max(0.0)
}
