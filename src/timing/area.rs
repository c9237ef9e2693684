//! Overlay regions drawn over stops, delays, warps and fakes.

use super::{
    PlaybackPosition, TimingData,
    event::{TimingEvent, TimingEventKind},
};
use crate::config::ScrollConfig;

/// Seconds past a negative dwell at which its visible end is sampled.
const REWIND_PROBE: f64 = 0.0001;

/// A rectangle of the note field covered by a timing event.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimingArea {
    /// Kind of the covering event.
    pub kind: TimingEventKind,
    /// Beat of the event.
    pub beat: f64,
    /// Dwell seconds or range length of the event.
    pub value: f64,
    /// Y-offset of the top edge.
    pub y_start: f64,
    /// Y-offset of the bottom edge.
    pub y_end: f64,
}

impl TimingArea {
    /// Height of the area in pixels.
    #[must_use]
    pub fn height(&self) -> f64 {
        (self.y_end - self.y_start).abs()
    }
}

pub(crate) fn timing_areas(
    data: &TimingData,
    from: f64,
    to: f64,
    position: PlaybackPosition,
    config: &ScrollConfig,
) -> Vec<TimingArea> {
    let cmod = config.is_cmod();
    let converter = data.converter();
    let scroll = data.scroll();
    let from_second = converter.seconds_from_beat(from);
    let y_of_beat = |beat: f64| scroll.y_offset(beat, position, config, converter);
    let y_of_second =
        |second: f64| scroll.y_offset_for_second(second, position, config, converter);

    let events = data.timeline().timing_events(&[
        TimingEventKind::Stop,
        TimingEventKind::Delay,
        TimingEventKind::Warp,
        TimingEventKind::Fake,
    ]);
    let mut areas = Vec::new();
    for event in events {
        if event.beat > to {
            break;
        }
        let Some(value) = event.value.scalar() else {
            continue;
        };
        let span = match event.kind() {
            TimingEventKind::Stop | TimingEventKind::Delay => {
                let second = converter.event_second(event);
                if second + value.abs() <= from_second {
                    continue;
                }
                match (cmod, value > 0.0) {
                    (true, true) => Some((y_of_second(second), y_of_second(second + value))),
                    (false, false) => Some(rewind_span(data, event, position, config).unwrap_or_else(
                        || {
                            let end = converter.beat_from_seconds(second + REWIND_PROBE);
                            (y_of_beat(event.beat), y_of_beat(end))
                        },
                    )),
                    _ => None,
                }
            }
            TimingEventKind::Warp if cmod => None,
            TimingEventKind::Warp | TimingEventKind::Fake => (event.end_beat() >= from)
                .then(|| (y_of_beat(event.beat), y_of_beat(event.end_beat()))),
            _ => None,
        };
        if let Some((y_start, y_end)) = span {
            areas.push(TimingArea {
                kind: event.kind(),
                beat: event.beat,
                value,
                y_start,
                y_end,
            });
        }
    }
    areas
}

/// The Y-offsets a negative dwell jumps between when it rewinds the field.
fn rewind_span(
    data: &TimingData,
    event: &TimingEvent,
    position: PlaybackPosition,
    config: &ScrollConfig,
) -> Option<(f64, f64)> {
    let scroll = data.scroll();
    let point = scroll.point_at(event.beat)?;
    let (top, bottom) = match event.kind() {
        TimingEventKind::Delay => (point.before, point.at),
        _ => (point.at, point.after),
    };
    Some((
        scroll.y_offset_of_displayed(top, position, config),
        scroll.y_offset_of_displayed(bottom, position, config),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::SpeedMod,
        timing::event::EventValue,
    };

    fn close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    fn chart() -> TimingData {
        let mut data = TimingData::new();
        for (beat, value) in [
            (0.0, EventValue::tempo(60.0).unwrap()),
            (1.0, EventValue::stop(0.5).unwrap()),
            (2.0, EventValue::stop(-1.0).unwrap()),
            (4.0, EventValue::warp(1.0).unwrap()),
            (6.0, EventValue::fake(0.5).unwrap()),
        ] {
            data.insert(value.kind(), beat, value).unwrap();
        }
        data
    }

    const ORIGIN: PlaybackPosition = PlaybackPosition {
        beat: 0.0,
        second: 0.0,
    };

    #[test]
    fn speed_mode_shows_rewinds_warps_and_fakes() {
        let data = chart();
        let config = ScrollConfig {
            pixels_per_beat: 10.0,
            ..ScrollConfig::default()
        };
        let areas = data.timing_areas(0.0, 10.0, ORIGIN, &config);
        let kinds: Vec<TimingEventKind> = areas.iter().map(|area| area.kind).collect();
        assert_eq!(
            kinds,
            vec![TimingEventKind::Stop, TimingEventKind::Warp, TimingEventKind::Fake]
        );
        let rewind = areas[0];
        close(rewind.beat, 2.0);
        close(rewind.y_start, 20.0);
        close(rewind.y_end, 10.0);
        close(areas[1].height(), 10.0);
        close(areas[2].height(), 5.0);
    }

    #[test]
    fn cmod_shows_positive_dwells_and_fakes() {
        let data = chart();
        let config = ScrollConfig {
            speed_mod: SpeedMod::C(60.0),
            pixels_per_beat: 10.0,
            do_speed_changes: true,
        };
        let areas = data.timing_areas(0.0, 10.0, ORIGIN, &config);
        let kinds: Vec<TimingEventKind> = areas.iter().map(|area| area.kind).collect();
        assert_eq!(kinds, vec![TimingEventKind::Stop, TimingEventKind::Fake]);
        close(areas[0].y_start, 10.0);
        close(areas[0].y_end, 15.0);
    }

    #[test]
    fn areas_before_the_range_are_skipped() {
        let data = chart();
        let config = ScrollConfig::default();
        let areas = data.timing_areas(5.5, 10.0, ORIGIN, &config);
        let kinds: Vec<TimingEventKind> = areas.iter().map(|area| area.kind).collect();
        assert_eq!(kinds, vec![TimingEventKind::Fake]);
        assert!(data.timing_areas(0.0, 0.5, ORIGIN, &config).is_empty());
    }
}
