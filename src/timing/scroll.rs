//! Vertical placement of beats on the note field.
//!
//! In the multiplier mode a beat is placed by its *displayed beat*, the integral of the scroll
//! ratio from beat 0. A negative stop or delay pulls every later displayed beat back by the beats
//! its freeze spans, which shows a rewind while keeping the motion continuous. In the constant
//! mode a beat is placed by its time alone.

use itertools::Itertools;

use super::{
    PlaybackPosition,
    converter::BeatTimeConverter,
    event::{EventValue, SpeedUnit, TimingEvent, TimingEventKind},
    seek_partition,
    timeline::EventTimeline,
};
use crate::config::{ScrollConfig, SpeedMod};

/// Displayed beats around a beat carrying a scroll change or a negative dwell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct VisualPoint {
    pub(crate) beat: f64,
    /// Approaching from earlier beats.
    pub(crate) before: f64,
    /// On the beat, after a negative delay.
    pub(crate) at: f64,
    /// Leaving the beat, after a negative stop.
    pub(crate) after: f64,
    ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SpeedRamp {
    beat: f64,
    start_second: f64,
    from: f64,
    to: f64,
    delay: f64,
    unit: SpeedUnit,
}

/// A piece of the note field over which Y is linear in the beat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YSpan {
    /// First beat of the piece.
    pub from_beat: f64,
    /// Last beat of the piece.
    pub to_beat: f64,
    /// Y-offset leaving `from_beat`.
    pub y_from: f64,
    /// Y-offset approaching `to_beat`.
    pub y_to: f64,
}

/// Scroll and speed cache built from an [`EventTimeline`] and its [`BeatTimeConverter`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollSpeedIntegrator {
    version: u64,
    points: Vec<VisualPoint>,
    ramps: Vec<SpeedRamp>,
}

impl Default for ScrollSpeedIntegrator {
    fn default() -> Self {
        let timeline = EventTimeline::default();
        Self::new(&timeline, &BeatTimeConverter::new(&timeline))
    }
}

impl ScrollSpeedIntegrator {
    /// Builds the cache. `converter` must be current for `timeline`.
    #[must_use]
    pub fn new(timeline: &EventTimeline, converter: &BeatTimeConverter) -> Self {
        let events: Vec<&TimingEvent> = timeline
            .timing_events(&[
                TimingEventKind::Stop,
                TimingEventKind::Delay,
                TimingEventKind::Scroll,
            ])
            .into_iter()
            .filter(|event| event.kind() == TimingEventKind::Scroll || event.value.is_negative_dwell())
            .collect();
        let mut points: Vec<VisualPoint> = Vec::new();
        let mut ratio = 1.0;
        let mut displayed = 0.0;
        let mut last_beat = 0.0;
        for group in events.chunk_by(|a, b| a.beat == b.beat) {
            let Some(beat) = group.first().map(|event| event.beat) else {
                continue;
            };
            let before = displayed + (beat - last_beat) * ratio;
            let rewind = |kind: TimingEventKind| {
                group
                    .iter()
                    .find(|event| event.kind() == kind)
                    .and_then(|event| event.value.scalar())
                    .map_or(0.0, |seconds| (-seconds).max(0.0))
            };
            if let Some(EventValue::Scroll { ratio: next }) = group
                .iter()
                .find(|event| event.kind() == TimingEventKind::Scroll)
                .map(|event| &event.value)
            {
                ratio = next.as_f64();
            }
            let delay_rewind = rewind(TimingEventKind::Delay);
            let delay_beats = converter.beats_for_seconds(beat, delay_rewind);
            let total_beats =
                converter.beats_for_seconds(beat, delay_rewind + rewind(TimingEventKind::Stop));
            let at = before - delay_beats * ratio;
            let after = before - total_beats * ratio;
            points.push(VisualPoint {
                beat,
                before,
                at,
                after,
                ratio,
            });
            displayed = after;
            last_beat = beat;
        }

        let mut ramps: Vec<SpeedRamp> = Vec::new();
        for event in timeline.events(TimingEventKind::Speed) {
            let EventValue::Speed { ratio, delay, unit } = &event.value else {
                continue;
            };
            let from = ramps.last().map_or(1.0, |ramp| ramp.to);
            ramps.push(SpeedRamp {
                beat: event.beat,
                start_second: converter.seconds_from_beat(event.beat),
                from,
                to: ratio.as_f64(),
                delay: delay.as_f64(),
                unit: *unit,
            });
        }
        Self {
            version: timeline.version(),
            points,
            ramps,
        }
    }

    /// Rebuilds the cache if the timeline changed since it was built. Returns whether it did.
    pub fn refresh(&mut self, timeline: &EventTimeline, converter: &BeatTimeConverter) -> bool {
        if self.version == timeline.version() {
            return false;
        }
        *self = Self::new(timeline, converter);
        true
    }

    /// The displayed beat: accumulated scroll distance from beat 0.
    #[must_use]
    pub fn displayed_beat(&self, beat: f64) -> f64 {
        let idx = self.points.partition_point(|point| point.beat <= beat);
        self.displayed_in(idx, beat)
    }

    fn displayed_in(&self, idx: usize, beat: f64) -> f64 {
        match idx.checked_sub(1).and_then(|prev| self.points.get(prev)) {
            Some(point) if beat <= point.beat => point.at,
            Some(point) => point.after + (beat - point.beat) * point.ratio,
            None => beat,
        }
    }

    /// The displayed beat approaching `beat` from earlier beats.
    fn displayed_left(&self, beat: f64) -> f64 {
        match self.point_at(beat) {
            Some(point) => point.before,
            None => self.displayed_beat(beat),
        }
    }

    /// The displayed beat leaving `beat` toward later beats.
    fn displayed_right(&self, beat: f64) -> f64 {
        match self.point_at(beat) {
            Some(point) => point.after,
            None => self.displayed_beat(beat),
        }
    }

    /// The point placed exactly on `beat`.
    pub(crate) fn point_at(&self, beat: f64) -> Option<&VisualPoint> {
        let idx = self.points.partition_point(|point| point.beat < beat);
        self.points.get(idx).filter(|point| point.beat <= beat)
    }

    /// The speed multiplier at the playback position, ramping over each speed event's delay.
    #[must_use]
    pub fn speed_multiplier(&self, beat: f64, second: f64) -> f64 {
        let idx = self.ramps.partition_point(|ramp| ramp.beat <= beat);
        let Some(ramp) = idx.checked_sub(1).and_then(|prev| self.ramps.get(prev)) else {
            return 1.0;
        };
        if ramp.delay <= 0.0 {
            return ramp.to;
        }
        let elapsed = match ramp.unit {
            SpeedUnit::Beats => beat - ramp.beat,
            SpeedUnit::Seconds => second - ramp.start_second,
        };
        let progress = (elapsed / ramp.delay).clamp(0.0, 1.0);
        ramp.from + (ramp.to - ramp.from) * progress
    }

    /// Pixels per displayed beat in the multiplier mode.
    fn x_scale(&self, multiplier: f64, position: PlaybackPosition, config: &ScrollConfig) -> f64 {
        let speed = if config.do_speed_changes {
            self.speed_multiplier(position.beat, position.second)
        } else {
            1.0
        };
        config.pixels_per_beat * multiplier * speed
    }

    /// Pixels per second in the constant mode.
    fn c_scale(bpm: f64, config: &ScrollConfig) -> f64 {
        bpm / 60.0 * config.pixels_per_beat
    }

    /// The Y-offset of `beat` relative to the receptors at `position`. Later beats are below.
    #[must_use]
    pub fn y_offset(
        &self,
        beat: f64,
        position: PlaybackPosition,
        config: &ScrollConfig,
        converter: &BeatTimeConverter,
    ) -> f64 {
        match config.speed_mod {
            SpeedMod::X(_) => {
                self.y_offset_of_displayed(self.displayed_beat(beat), position, config)
            }
            SpeedMod::C(bpm) => {
                (converter.seconds_from_beat(beat) - position.second) * Self::c_scale(bpm, config)
            }
        }
    }

    /// The Y-offset of a displayed beat in the multiplier mode.
    pub(crate) fn y_offset_of_displayed(
        &self,
        displayed: f64,
        position: PlaybackPosition,
        config: &ScrollConfig,
    ) -> f64 {
        let multiplier = match config.speed_mod {
            SpeedMod::X(multiplier) => multiplier,
            SpeedMod::C(_) => 1.0,
        };
        (displayed - self.displayed_beat(position.beat))
            * self.x_scale(multiplier, position, config)
    }

    /// The Y-offset of a time relative to the receptors at `position` in the constant mode, or
    /// of the beat reached at that time otherwise.
    #[must_use]
    pub fn y_offset_for_second(
        &self,
        second: f64,
        position: PlaybackPosition,
        config: &ScrollConfig,
        converter: &BeatTimeConverter,
    ) -> f64 {
        match config.speed_mod {
            SpeedMod::X(_) => {
                self.y_offset(converter.beat_from_seconds(second), position, config, converter)
            }
            SpeedMod::C(bpm) => (second - position.second) * Self::c_scale(bpm, config),
        }
    }

    /// Y-offsets of many beats. Ascending input is resolved in one sweep.
    #[must_use]
    pub fn y_offsets(
        &self,
        beats: impl IntoIterator<Item = f64>,
        position: PlaybackPosition,
        config: &ScrollConfig,
        converter: &BeatTimeConverter,
    ) -> Vec<f64> {
        let mut hint = 0;
        match config.speed_mod {
            SpeedMod::X(multiplier) => {
                let origin = self.displayed_beat(position.beat);
                let scale = self.x_scale(multiplier, position, config);
                beats
                    .into_iter()
                    .map(|beat| {
                        let idx = seek_partition(&self.points, &mut hint, beat, |point| point.beat);
                        (self.displayed_in(idx, beat) - origin) * scale
                    })
                    .collect()
            }
            SpeedMod::C(bpm) => {
                let scale = Self::c_scale(bpm, config);
                beats
                    .into_iter()
                    .map(|beat| {
                        (converter.seconds_from_beat_seek(beat, &mut hint) - position.second)
                            * scale
                    })
                    .collect()
            }
        }
    }

    /// Splits `[from, to]` into pieces over which Y is linear, with their end offsets.
    ///
    /// A jump in Y, such as a rewind or a stop in the constant mode, separates two pieces.
    #[must_use]
    pub fn visible_spans(
        &self,
        from: f64,
        to: f64,
        position: PlaybackPosition,
        config: &ScrollConfig,
        converter: &BeatTimeConverter,
    ) -> Vec<YSpan> {
        if !(from.is_finite() && to.is_finite()) || to <= from {
            return Vec::new();
        }
        let inner: Vec<f64> = match config.speed_mod {
            SpeedMod::X(_) => {
                let start = self.points.partition_point(|point| point.beat <= from);
                self.points
                    .iter()
                    .skip(start)
                    .take_while(|point| point.beat < to)
                    .map(|point| point.beat)
                    .collect()
            }
            SpeedMod::C(_) => converter.breakpoints(from, to),
        };
        std::iter::once(from)
            .chain(inner)
            .chain(std::iter::once(to))
            .tuple_windows()
            .map(|(a, b)| match config.speed_mod {
                SpeedMod::X(multiplier) => {
                    let origin = self.displayed_beat(position.beat);
                    let scale = self.x_scale(multiplier, position, config);
                    YSpan {
                        from_beat: a,
                        to_beat: b,
                        y_from: (self.displayed_right(a) - origin) * scale,
                        y_to: (self.displayed_left(b) - origin) * scale,
                    }
                }
                SpeedMod::C(bpm) => {
                    let scale = Self::c_scale(bpm, config);
                    YSpan {
                        from_beat: a,
                        to_beat: b,
                        y_from: (converter.seconds_after_beat(a) - position.second) * scale,
                        y_to: (converter.seconds_before_beat(b) - position.second) * scale,
                    }
                }
            })
            .collect()
    }
}
