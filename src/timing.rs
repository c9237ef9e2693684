//! The timing engine: beats, seconds and where they land on the note field.
//!
//! [`TimingData`] owns an [`EventTimeline`] together with the caches derived from it. Every edit
//! goes through the facade, which rebuilds the caches before returning, so a query never sees a
//! half-applied edit.
//!
//! ```
//! use chart_timing::timing::{TimingData, event::{EventValue, TimingEventKind}};
//!
//! let mut data = TimingData::new();
//! data.insert(TimingEventKind::Tempo, 0.0, EventValue::tempo(120.0)?)?;
//! data.insert(TimingEventKind::Stop, 4.0, EventValue::stop(2.0)?)?;
//! assert_eq!(data.seconds_from_beat(4.0), 2.0);
//! assert_eq!(data.seconds_from_beat(6.0), 5.0);
//! # Ok::<(), chart_timing::timing::timeline::TimelineError>(())
//! ```

pub mod area;
pub mod converter;
pub mod event;
pub mod measure;
pub mod scroll;
pub mod timeline;

use self::{
    area::TimingArea,
    converter::BeatTimeConverter,
    event::{EventValue, TimingEvent, TimingEventKind},
    measure::MeasureMap,
    scroll::{ScrollSpeedIntegrator, YSpan},
    timeline::{EventTimeline, TimelineError},
};
use crate::{
    config::{ScrollConfig, round_millis},
    stats::PlayStatistics,
};

/// Where playback is, in both coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlaybackPosition {
    /// Current beat.
    pub beat: f64,
    /// Current time in seconds.
    pub second: f64,
}

/// A source of the current playback time, usually the audio output.
pub trait AudioClock {
    /// Seconds elapsed in the song, on the same axis as [`TimingData::seconds_from_beat`].
    fn current_seconds(&self) -> f64;
}

impl AudioClock for f64 {
    fn current_seconds(&self) -> f64 {
        *self
    }
}

/// A chart's timing events and everything derived from them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimingData {
    timeline: EventTimeline,
    converter: BeatTimeConverter,
    measures: MeasureMap,
    scroll: ScrollSpeedIntegrator,
}

impl TimingData {
    /// Creates timing data with no event.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a timeline and builds its caches.
    #[must_use]
    pub fn from_timeline(timeline: EventTimeline) -> Self {
        let converter = BeatTimeConverter::new(&timeline);
        let measures = MeasureMap::new(&timeline);
        let scroll = ScrollSpeedIntegrator::new(&timeline, &converter);
        let mut data = Self {
            timeline,
            converter,
            measures,
            scroll,
        };
        data.annotate();
        data
    }

    /// Builds timing data from events sorted by beat within each kind.
    ///
    /// # Errors
    ///
    /// Fails like [`EventTimeline::from_flat`].
    pub fn from_flat(events: impl IntoIterator<Item = TimingEvent>) -> Result<Self, TimelineError> {
        EventTimeline::from_flat(events).map(Self::from_timeline)
    }

    /// The events.
    #[must_use]
    pub const fn timeline(&self) -> &EventTimeline {
        &self.timeline
    }

    /// Gives back the events.
    #[must_use]
    pub fn into_timeline(self) -> EventTimeline {
        self.timeline
    }

    /// The beat/second cache.
    #[must_use]
    pub const fn converter(&self) -> &BeatTimeConverter {
        &self.converter
    }

    /// The measure cache.
    #[must_use]
    pub const fn measures(&self) -> &MeasureMap {
        &self.measures
    }

    /// The scroll cache.
    #[must_use]
    pub const fn scroll(&self) -> &ScrollSpeedIntegrator {
        &self.scroll
    }

    /// The modification counter of the events.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.timeline.version()
    }

    /// Inserts an event and refreshes the caches.
    ///
    /// # Errors
    ///
    /// Fails like [`EventTimeline::insert`], leaving everything unchanged.
    pub fn insert(
        &mut self,
        kind: TimingEventKind,
        beat: f64,
        value: EventValue,
    ) -> Result<(), TimelineError> {
        self.timeline.insert(kind, beat, value)?;
        self.sync();
        Ok(())
    }

    /// Removes an event and refreshes the caches.
    ///
    /// # Errors
    ///
    /// Fails like [`EventTimeline::remove`], leaving everything unchanged.
    pub fn remove(&mut self, kind: TimingEventKind, beat: f64) -> Result<TimingEvent, TimelineError> {
        let removed = self.timeline.remove(kind, beat)?;
        self.sync();
        Ok(removed)
    }

    /// Replaces the value of an event and refreshes the caches.
    ///
    /// # Errors
    ///
    /// Fails like [`EventTimeline::modify`], leaving everything unchanged.
    pub fn modify(
        &mut self,
        kind: TimingEventKind,
        beat: f64,
        value: EventValue,
    ) -> Result<EventValue, TimelineError> {
        let previous = self.timeline.modify(kind, beat, value)?;
        self.sync();
        Ok(previous)
    }

    fn sync(&mut self) {
        let mut changed = self.converter.refresh(&self.timeline);
        changed |= self.measures.refresh(&self.timeline);
        changed |= self.scroll.refresh(&self.timeline, &self.converter);
        if changed {
            self.annotate();
        }
    }

    fn annotate(&mut self) {
        let converter = &self.converter;
        self.timeline
            .annotate_seconds(|event| converter.event_second(event));
    }

    /// Events of the kinds merged in beat order, with their times filled in.
    #[must_use]
    pub fn timing_events(&self, kinds: &[TimingEventKind]) -> Vec<&TimingEvent> {
        self.timeline.timing_events(kinds)
    }

    /// The last event of the kind at or before the beat.
    #[must_use]
    pub fn event_at_or_before(&self, kind: TimingEventKind, beat: f64) -> Option<&TimingEvent> {
        self.timeline.event_at_or_before(kind, beat)
    }

    /// See [`BeatTimeConverter::seconds_from_beat`].
    #[must_use]
    pub fn seconds_from_beat(&self, beat: f64) -> f64 {
        self.converter.seconds_from_beat(beat)
    }

    /// See [`BeatTimeConverter::beat_from_seconds`].
    #[must_use]
    pub fn beat_from_seconds(&self, second: f64) -> f64 {
        self.converter.beat_from_seconds(second)
    }

    /// The tempo in effect at the beat.
    #[must_use]
    pub fn bpm_at(&self, beat: f64) -> f64 {
        self.converter.bpm_at(beat)
    }

    /// Whether the beat lies inside a warp. Warp ends are not warped.
    #[must_use]
    pub fn is_beat_warped(&self, beat: f64) -> bool {
        self.converter.is_beat_warped(beat)
    }

    /// Whether the beat lies inside a fake range.
    #[must_use]
    pub fn is_beat_faked(&self, beat: f64) -> bool {
        self.timeline.is_beat_faked(beat)
    }

    /// The song offset in seconds.
    #[must_use]
    pub fn song_offset(&self) -> f64 {
        self.timeline.song_offset()
    }

    /// Sets the song offset, creating the offset event when missing.
    ///
    /// # Errors
    ///
    /// Fails when `seconds` is not finite.
    pub fn set_song_offset(&mut self, seconds: f64) -> Result<(), TimelineError> {
        self.store_song_offset(EventValue::offset(seconds)?)
    }

    fn store_song_offset(&mut self, value: EventValue) -> Result<(), TimelineError> {
        if self.timeline.count(TimingEventKind::Offset) == 0 {
            self.insert(TimingEventKind::Offset, 0.0, value)
        } else {
            self.modify(TimingEventKind::Offset, 0.0, value).map(|_| ())
        }
    }

    /// Moves the song offset by the suggested correction of `stats` and shifts the statistics
    /// to match. Returns the old and new offsets, or `None` when no correction is suggested.
    ///
    /// # Errors
    ///
    /// Fails when the new offset is not finite. Neither the offset nor `stats` change then.
    pub fn calibrate_song_offset(
        &mut self,
        stats: &mut PlayStatistics,
    ) -> Result<Option<(f64, f64)>, TimelineError> {
        let Some(correction) = stats.offset_correction() else {
            return Ok(None);
        };
        let old = self.song_offset();
        let new = round_millis(old - correction);
        let value = EventValue::offset(new)?;
        if stats.apply_offset(-correction).is_err() {
            return Ok(None);
        }
        self.store_song_offset(value)?;
        log::info!("song offset calibrated from {old:.3}s to {new:.3}s");
        Ok(Some((old, new)))
    }

    /// The playback position reported by the clock.
    #[must_use]
    pub fn position_at(&self, clock: &impl AudioClock) -> PlaybackPosition {
        let second = clock.current_seconds();
        PlaybackPosition {
            beat: self.beat_from_seconds(second),
            second,
        }
    }

    /// The playback position at the beat.
    #[must_use]
    pub fn position_of_beat(&self, beat: f64) -> PlaybackPosition {
        PlaybackPosition {
            beat,
            second: self.seconds_from_beat(beat),
        }
    }

    /// Beats in one division at the beat.
    #[must_use]
    pub fn division_length(&self, beat: f64) -> f64 {
        self.measures.division_length(beat)
    }

    /// The fractional division index of the beat within its measure.
    #[must_use]
    pub fn division_of_measure(&self, beat: f64) -> f64 {
        self.measures.division_of_measure(beat)
    }

    /// The fractional measure number of the beat.
    #[must_use]
    pub fn measure(&self, beat: f64) -> f64 {
        self.measures.measure(beat)
    }

    /// Division lines in `[max(0, from), to)` as `(beat, is_measure_line)`.
    ///
    /// Warped beats are never listed. With `cmod`, beats frozen by a negative stop or delay are
    /// left out as well.
    #[must_use]
    pub fn barline_beats(&self, from: f64, to: f64, cmod: bool) -> Vec<(f64, bool)> {
        self.measures.barline_beats(from, to, |beat| {
            self.converter.is_beat_warped(beat) || (cmod && self.converter.is_beat_frozen(beat))
        })
    }

    /// The speed multiplier at the position.
    #[must_use]
    pub fn speed_multiplier(&self, position: PlaybackPosition) -> f64 {
        self.scroll.speed_multiplier(position.beat, position.second)
    }

    /// The Y-offset of the beat relative to the receptors at `position`.
    #[must_use]
    pub fn y_offset(&self, beat: f64, position: PlaybackPosition, config: &ScrollConfig) -> f64 {
        self.scroll.y_offset(beat, position, config, &self.converter)
    }

    /// The Y-offsets of many beats; ascending input is resolved in one sweep.
    #[must_use]
    pub fn y_offsets(
        &self,
        beats: impl IntoIterator<Item = f64>,
        position: PlaybackPosition,
        config: &ScrollConfig,
    ) -> Vec<f64> {
        self.scroll.y_offsets(beats, position, config, &self.converter)
    }

    /// Splits `[from, to]` into pieces over which Y is linear in the beat.
    #[must_use]
    pub fn visible_spans(
        &self,
        from: f64,
        to: f64,
        position: PlaybackPosition,
        config: &ScrollConfig,
    ) -> Vec<YSpan> {
        self.scroll
            .visible_spans(from, to, position, config, &self.converter)
    }

    /// The overlay rectangles of the timing events touching `[from, to]`.
    #[must_use]
    pub fn timing_areas(
        &self,
        from: f64,
        to: f64,
        position: PlaybackPosition,
        config: &ScrollConfig,
    ) -> Vec<TimingArea> {
        area::timing_areas(self, from, to, position, config)
    }
}

/// Partition index of `beat` in `items`, resuming from `hint` and storing the result back.
///
/// A short forward walk serves ascending sweeps; anything else falls back to a binary search.
pub(crate) fn seek_partition<T>(
    items: &[T],
    hint: &mut usize,
    beat: f64,
    key: impl Fn(&T) -> f64,
) -> usize {
    const WALK: usize = 8;
    let mut idx = (*hint).min(items.len());
    let behind = idx
        .checked_sub(1)
        .and_then(|prev| items.get(prev))
        .is_some_and(|item| key(item) > beat);
    if behind {
        idx = items.partition_point(|item| key(item) <= beat);
    } else {
        let mut steps = 0;
        while steps < WALK && items.get(idx).is_some_and(|item| key(item) <= beat) {
            idx += 1;
            steps += 1;
        }
        if steps == WALK {
            idx += items
                .get(idx..)
                .map_or(0, |rest| rest.partition_point(|item| key(item) <= beat));
        }
    }
    *hint = idx;
    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seek_agrees_with_partition_point() {
        let items: Vec<f64> = (0..50).map(f64::from).collect();
        let mut hint = 0;
        for beat in [-1.0, 0.0, 0.5, 3.0, 3.0, 30.5, 10.0, 49.0, 60.0, 2.0] {
            let expected = items.partition_point(|&item| item <= beat);
            assert_eq!(seek_partition(&items, &mut hint, beat, |&item| item), expected);
        }
    }

    #[test]
    fn edits_refresh_caches_and_event_times() {
        let mut data = TimingData::new();
        data.insert(TimingEventKind::Tempo, 0.0, EventValue::tempo(60.0).unwrap())
            .unwrap();
        data.insert(TimingEventKind::Delay, 2.0, EventValue::delay(1.0).unwrap())
            .unwrap();
        let delay = data
            .event_at_or_before(TimingEventKind::Delay, 2.0)
            .unwrap();
        assert_eq!(delay.second, Some(2.0));
        assert_eq!(data.seconds_from_beat(3.0), 4.0);

        data.modify(TimingEventKind::Tempo, 0.0, EventValue::tempo(120.0).unwrap())
            .unwrap();
        let delay = data
            .event_at_or_before(TimingEventKind::Delay, 2.0)
            .unwrap();
        assert_eq!(delay.second, Some(1.0));
        assert!(data.converter().is_current(data.timeline()));
    }

    #[test]
    fn song_offset_moves_beat_zero() {
        let mut data = TimingData::new();
        data.set_song_offset(0.05).unwrap();
        assert_eq!(data.seconds_from_beat(0.0), -0.05);
        data.set_song_offset(-0.1).unwrap();
        assert_eq!(data.seconds_from_beat(0.0), 0.1);
        assert_eq!(data.timeline().count(TimingEventKind::Offset), 1);
    }

    #[test]
    fn position_follows_the_clock() {
        let data = TimingData::new();
        let position = data.position_at(&1.5);
        assert_eq!(position.beat, 3.0);
        assert_eq!(data.position_of_beat(3.0), position);
    }

    #[test]
    fn cmod_barlines_skip_frozen_beats() {
        let mut data = TimingData::new();
        data.insert(TimingEventKind::Tempo, 0.0, EventValue::tempo(60.0).unwrap())
            .unwrap();
        data.insert(TimingEventKind::Stop, 1.0, EventValue::stop(-2.0).unwrap())
            .unwrap();
        let beats = |cmod| -> Vec<f64> {
            data.barline_beats(0.0, 5.0, cmod)
                .into_iter()
                .map(|(beat, _)| beat)
                .collect()
        };
        assert_eq!(beats(false), vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(beats(true), vec![0.0, 1.0, 3.0, 4.0]);
    }
}
