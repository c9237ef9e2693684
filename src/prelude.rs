//! Prelude module for the crate.
//!
//! You can use `use chart_timing::prelude::*;` to import the common types at once.

pub use crate::{
    config::{ConfigError, EngineConfig, ScrollConfig, SpeedMod},
    judgment::{
        FA_PLUS_PROFILE, HoldRelease, HoldType, ITG_PROFILE, JudgmentWindow,
        JudgmentWindowCollection, PROFILE_NAMES, WindowHandle, WindowKind,
    },
    stats::{ChartTotals, DataPoint, PlayStatistics, StatisticsError},
    timing::{
        AudioClock, PlaybackPosition, TimingData,
        area::TimingArea,
        converter::{BeatTimeConverter, DEFAULT_BPM},
        event::{
            EventValue, ROWS_PER_BEAT, SpeedUnit, TimingEvent, TimingEventKind, beat_to_row,
            row_to_beat,
        },
        measure::MeasureMap,
        scroll::{ScrollSpeedIntegrator, YSpan},
        timeline::{EventTimeline, TimelineError},
    },
};
