//! Benchmark for beat/time conversion and Y-offset queries on a dense chart.

use chart_timing::prelude::*;
use criterion::{Criterion, Throughput};

const BEATS: u32 = 2048;

/// A chart changing tempo every 4 beats, with a stop, a scroll change and a delay sprinkled in.
fn dense_chart() -> TimingData {
    let mut data = TimingData::new();
    for step in 0..BEATS / 4 {
        let beat = f64::from(step * 4);
        let bpm = 120.0 + f64::from(step % 7) * 15.0;
        data.insert(TimingEventKind::Tempo, beat, EventValue::tempo(bpm).unwrap())
            .expect("tempo must be accepted");
        let seconds = if step % 5 == 0 { -0.1 } else { 0.05 };
        data.insert(TimingEventKind::Stop, beat + 1.0, EventValue::stop(seconds).unwrap())
            .expect("stop must be accepted");
        let ratio = if step % 3 == 0 { 0.5 } else { 1.0 };
        data.insert(TimingEventKind::Scroll, beat + 2.0, EventValue::scroll(ratio).unwrap())
            .expect("scroll must be accepted");
        data.insert(TimingEventKind::Delay, beat + 3.0, EventValue::delay(0.02).unwrap())
            .expect("delay must be accepted");
    }
    data
}

fn bench_conversion(c: &mut Criterion, data: &TimingData) {
    let beats: Vec<f64> = (0..BEATS * 4).map(|step| f64::from(step) * 0.25).collect();
    let mut group = c.benchmark_group("conversion");
    group.throughput(Throughput::Elements(beats.len() as u64));
    group.bench_function("seconds_from_beat", |b| {
        b.iter(|| {
            beats
                .iter()
                .map(|&beat| data.seconds_from_beat(std::hint::black_box(beat)))
                .sum::<f64>()
        });
    });
    let end = data.seconds_from_beat(f64::from(BEATS));
    let seconds: Vec<f64> = (0..beats.len())
        .map(|step| end * step as f64 / beats.len() as f64)
        .collect();
    group.bench_function("beat_from_seconds", |b| {
        b.iter(|| {
            seconds
                .iter()
                .map(|&second| data.beat_from_seconds(std::hint::black_box(second)))
                .sum::<f64>()
        });
    });
    group.finish();
}

fn bench_y_offsets(c: &mut Criterion, data: &TimingData) {
    let beats: Vec<f64> = (0..BEATS * 4).map(|step| f64::from(step) * 0.25).collect();
    let position = data.position_of_beat(64.0);
    let mut group = c.benchmark_group("y_offsets");
    group.throughput(Throughput::Elements(beats.len() as u64));
    for (name, config) in [
        ("xmod", ScrollConfig::default()),
        (
            "cmod",
            ScrollConfig {
                speed_mod: SpeedMod::C(600.0),
                ..ScrollConfig::default()
            },
        ),
    ] {
        group.bench_function(format!("{name}_single"), |b| {
            b.iter(|| {
                beats
                    .iter()
                    .map(|&beat| data.y_offset(std::hint::black_box(beat), position, &config))
                    .sum::<f64>()
            });
        });
        group.bench_function(format!("{name}_sweep"), |b| {
            b.iter(|| data.y_offsets(std::hint::black_box(beats.iter().copied()), position, &config));
        });
    }
    group.finish();
}

fn main() {
    env_logger::init();
    let data = dense_chart();
    let mut criterion = Criterion::default();
    bench_conversion(&mut criterion, &data);
    bench_y_offsets(&mut criterion, &data);
}
