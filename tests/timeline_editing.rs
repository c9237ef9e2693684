use chart_timing::prelude::*;
use pretty_assertions::assert_eq;

fn beats(events: &[&TimingEvent]) -> Vec<f64> {
    events.iter().map(|event| event.beat).collect()
}

#[test]
fn insert_orders_events_per_kind() {
    let mut timeline = EventTimeline::new();
    for beat in [8.0, 0.0, 4.0] {
        timeline
            .insert(TimingEventKind::Tempo, beat, EventValue::tempo(120.0 + beat).unwrap())
            .unwrap();
    }
    timeline
        .insert(TimingEventKind::Stop, 4.0, EventValue::stop(0.5).unwrap())
        .unwrap();

    let tempos: Vec<f64> = timeline
        .events(TimingEventKind::Tempo)
        .map(|event| event.beat)
        .collect();
    assert_eq!(tempos, vec![0.0, 4.0, 8.0]);
    assert_eq!(timeline.len(), 4);
    assert_eq!(timeline.count(TimingEventKind::Stop), 1);

    let merged = timeline.timing_events(&[TimingEventKind::Stop, TimingEventKind::Tempo]);
    assert_eq!(beats(&merged), vec![0.0, 4.0, 4.0, 8.0]);
    let kinds: Vec<TimingEventKind> = merged.iter().map(|event| event.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            TimingEventKind::Tempo,
            TimingEventKind::Tempo,
            TimingEventKind::Stop,
            TimingEventKind::Tempo,
        ]
    );
}

#[test]
fn duplicates_are_detected_by_row() {
    let mut timeline = EventTimeline::new();
    timeline
        .insert(TimingEventKind::Scroll, 1.0, EventValue::scroll(2.0).unwrap())
        .unwrap();
    let version = timeline.version();

    let err = timeline
        .insert(TimingEventKind::Scroll, 1.001, EventValue::scroll(3.0).unwrap())
        .unwrap_err();
    assert_eq!(
        err,
        TimelineError::DuplicateBeat {
            kind: TimingEventKind::Scroll,
            beat: 1.0,
        }
    );
    assert_eq!(timeline.version(), version);
    assert_eq!(timeline.count(TimingEventKind::Scroll), 1);

    // Another kind on the same row is fine.
    timeline
        .insert(TimingEventKind::Stop, 1.0, EventValue::stop(0.2).unwrap())
        .unwrap();
    // So is the next row.
    timeline
        .insert(
            TimingEventKind::Scroll,
            row_to_beat(beat_to_row(1.0) + 1),
            EventValue::scroll(3.0).unwrap(),
        )
        .unwrap();
}

#[test]
fn invalid_edits_are_rejected() {
    let mut timeline = EventTimeline::new();
    let cases = [
        (
            TimingEventKind::Tempo,
            -1.0,
            EventValue::tempo(120.0).unwrap(),
            TimelineError::NegativeBeat {
                kind: TimingEventKind::Tempo,
                beat: -1.0,
            },
        ),
        (
            TimingEventKind::Tempo,
            f64::NAN,
            EventValue::tempo(120.0).unwrap(),
            TimelineError::NonFinite {
                kind: TimingEventKind::Tempo,
            },
        ),
        (
            TimingEventKind::Tempo,
            0.0,
            EventValue::stop(1.0).unwrap(),
            TimelineError::KindMismatch {
                kind: TimingEventKind::Tempo,
                value_kind: TimingEventKind::Stop,
            },
        ),
    ];
    for (kind, beat, value, expected) in cases {
        assert_eq!(timeline.insert(kind, beat, value), Err(expected));
    }
    for rejected in [
        EventValue::tempo(0.0),
        EventValue::tempo(f64::NAN),
        EventValue::warp(-1.0),
        EventValue::fake(0.0),
        EventValue::scroll(f64::INFINITY),
        EventValue::speed(1.0, -0.5, SpeedUnit::Beats),
        EventValue::offset(f64::NEG_INFINITY),
    ] {
        assert!(matches!(rejected, Err(TimelineError::InvalidValue { .. })));
    }
    for (kind, value) in [
        (TimingEventKind::Stop, EventValue::stop(0.0).unwrap()),
        (
            TimingEventKind::TimeSignature,
            EventValue::TimeSignature {
                numerator: 0,
                denominator: 4,
            },
        ),
    ] {
        assert!(matches!(
            timeline.insert(kind, 0.0, value),
            Err(TimelineError::InvalidValue { .. })
        ));
    }
    assert!(matches!(
        timeline.insert(TimingEventKind::Offset, 1.0, EventValue::offset(0.1).unwrap()),
        Err(TimelineError::InvalidValue { .. })
    ));
    assert!(timeline.is_empty());
    assert_eq!(timeline.version(), 0);
}

#[test]
fn remove_and_modify_find_events_by_row() {
    let mut timeline = EventTimeline::new();
    timeline
        .insert(TimingEventKind::Label, 2.0, EventValue::Label { text: "drop".into() })
        .unwrap();

    let previous = timeline
        .modify(
            TimingEventKind::Label,
            2.005,
            EventValue::Label { text: "chorus".into() },
        )
        .unwrap();
    assert_eq!(previous, EventValue::Label { text: "drop".into() });

    assert_eq!(
        timeline.remove(TimingEventKind::Label, 3.0),
        Err(TimelineError::NotFound {
            kind: TimingEventKind::Label,
            beat: 3.0,
        })
    );
    let removed = timeline.remove(TimingEventKind::Label, 2.0).unwrap();
    assert_eq!(removed.value, EventValue::Label { text: "chorus".into() });
    assert!(timeline.is_empty());
}

#[test]
fn every_successful_edit_bumps_the_version() {
    let mut data = TimingData::new();
    let mut versions = vec![data.version()];
    data.insert(TimingEventKind::Tempo, 0.0, EventValue::tempo(140.0).unwrap())
        .unwrap();
    versions.push(data.version());
    data.modify(TimingEventKind::Tempo, 0.0, EventValue::tempo(150.0).unwrap())
        .unwrap();
    versions.push(data.version());
    assert!(data.remove(TimingEventKind::Stop, 0.0).is_err());
    versions.push(data.version());
    data.remove(TimingEventKind::Tempo, 0.0).unwrap();
    versions.push(data.version());

    assert_eq!(versions, vec![0, 1, 2, 2, 3]);
    assert_eq!(data.converter().version(), data.version());
    assert!(data.converter().is_current(data.timeline()));
}

#[test]
fn neighbour_lookups() {
    let mut timeline = EventTimeline::new();
    for beat in [0.0, 4.0, 8.0] {
        timeline
            .insert(TimingEventKind::Scroll, beat, EventValue::scroll(1.0).unwrap())
            .unwrap();
    }
    let at_or_before = |beat| {
        timeline
            .event_at_or_before(TimingEventKind::Scroll, beat)
            .map(|event| event.beat)
    };
    assert_eq!(at_or_before(4.0), Some(4.0));
    assert_eq!(at_or_before(7.9), Some(4.0));
    assert_eq!(
        timeline
            .event_after(TimingEventKind::Scroll, 4.0)
            .map(|event| event.beat),
        Some(8.0)
    );
    assert_eq!(timeline.event_after(TimingEventKind::Scroll, 8.0), None);
    assert_eq!(timeline.event_at_or_before(TimingEventKind::Tempo, 8.0), None);
}

#[test]
fn range_events() {
    let mut data = TimingData::new();
    data.insert(TimingEventKind::Fake, 2.0, EventValue::fake(1.0).unwrap())
        .unwrap();
    data.insert(TimingEventKind::Warp, 4.0, EventValue::warp(1.0).unwrap())
        .unwrap();
    data.insert(TimingEventKind::Warp, 4.5, EventValue::warp(2.0).unwrap())
        .unwrap();

    assert!(data.is_beat_faked(2.0));
    assert!(data.is_beat_faked(2.99));
    assert!(!data.is_beat_faked(3.0));
    assert_eq!(data.converter().warp_ranges(), &[(4.0, 6.5)]);
    for beat in [3.9, 4.0, 5.5, 6.4, 6.5] {
        assert_eq!(
            data.is_beat_warped(beat),
            data.timeline().is_beat_warped(beat),
            "warp answers differ at {beat}"
        );
    }
    assert!(data.is_beat_warped(6.0));
    assert!(!data.is_beat_warped(6.5));
}

#[test]
fn flat_sequences_rebuild_the_timeline() {
    let events = vec![
        TimingEvent::new(0.0, EventValue::tempo(120.0).unwrap()),
        TimingEvent::new(
            0.0,
            EventValue::TimeSignature {
                numerator: 3,
                denominator: 4,
            },
        ),
        TimingEvent::new(6.0, EventValue::tempo(180.0).unwrap()),
        TimingEvent::new(2.0, EventValue::stop(0.5).unwrap()),
    ];
    let data = TimingData::from_flat(events).unwrap();
    assert_eq!(data.timeline().len(), 4);
    let flat = data.timeline().to_flat();
    let kinds: Vec<TimingEventKind> = flat.iter().map(TimingEvent::kind).collect();
    assert_eq!(
        kinds,
        vec![
            TimingEventKind::Tempo,
            TimingEventKind::Tempo,
            TimingEventKind::Stop,
            TimingEventKind::TimeSignature,
        ]
    );
    assert!(flat.iter().all(|event| event.second.is_some()));

    let unsorted = vec![
        TimingEvent::new(4.0, EventValue::tempo(120.0).unwrap()),
        TimingEvent::new(2.0, EventValue::tempo(140.0).unwrap()),
    ];
    assert_eq!(
        EventTimeline::from_flat(unsorted),
        Err(TimelineError::OutOfOrder {
            kind: TimingEventKind::Tempo,
            beat: 2.0,
            previous: 4.0,
        })
    );
}
