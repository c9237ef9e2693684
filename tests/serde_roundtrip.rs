use chart_timing::prelude::*;
use pretty_assertions::assert_eq;

fn chart() -> TimingData {
    TimingData::from_flat([
        TimingEvent::new(0.0, EventValue::tempo(174.0).unwrap()),
        TimingEvent::new(16.0, EventValue::tempo(87.0).unwrap()),
        TimingEvent::new(4.0, EventValue::stop(-0.25).unwrap()),
        TimingEvent::new(
            8.0,
            EventValue::speed(1.5, 2.0, SpeedUnit::Seconds).unwrap(),
        ),
        TimingEvent::new(
            12.0,
            EventValue::attack(3.0, "*2 50% drunk".to_owned()).unwrap(),
        ),
        TimingEvent::new(0.0, EventValue::offset(0.009).unwrap()),
    ])
    .expect("chart is sorted")
}

#[test]
fn timing_events_survive_json() {
    let data = chart();
    let text = serde_json::to_string(&data.timeline().to_flat()).unwrap();
    assert!(!text.contains("second\""), "times are derived, not stored: {text}");

    let events: Vec<TimingEvent> = serde_json::from_str(&text).unwrap();
    let restored = TimingData::from_flat(events).unwrap();
    assert_eq!(restored.timeline().to_flat(), data.timeline().to_flat());
    assert_eq!(restored.seconds_from_beat(20.0), data.seconds_from_beat(20.0));
}

#[test]
fn event_json_shape() {
    let event = TimingEvent::new(4.0, EventValue::stop(2.0).unwrap());
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(
        json,
        serde_json::json!({ "beat": 4.0, "value": { "Stop": { "seconds": 2.0 } } })
    );
    let back: TimingEvent = serde_json::from_value(json).unwrap();
    assert_eq!(back, event);
}

#[test]
fn config_fills_missing_fields() {
    let config: EngineConfig =
        serde_json::from_str(r#"{ "scroll": { "speed_mod": { "C": 450.0 } } }"#).unwrap();
    assert_eq!(config.judgment_profile, ITG_PROFILE);
    assert_eq!(config.scroll.speed_mod, SpeedMod::C(450.0));
    assert_eq!(config.scroll.pixels_per_beat, 64.0);
    assert!(config.scroll.do_speed_changes);
    assert!(config.validate().is_ok());
}

#[test]
fn play_results_serialize() {
    let mut stats = PlayStatistics::new(
        JudgmentWindowCollection::builtin(FA_PLUS_PROFILE).unwrap(),
        ChartTotals { taps: 2, holds: 0 },
    );
    stats.judge(0.0);
    stats.judge(0.03);
    let points: Vec<DataPoint> = stats.data_points().collect();
    let text = serde_json::to_string(&points).unwrap();
    let back: Vec<DataPoint> = serde_json::from_str(&text).unwrap();
    assert_eq!(back, points);
    assert_eq!(back[1].judgment, WindowHandle::Standard(2));
}
