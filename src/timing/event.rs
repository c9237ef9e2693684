//! Definitions of timing events, the values they carry and the note-row grid they live on.

use std::fmt;

use strict_num_extended::{FinF64, NonNegativeF64, PositiveF64};

use super::timeline::TimelineError;

/// Number of note rows in one beat. Beats that round to the same row are the same position.
pub const ROWS_PER_BEAT: i64 = 48;

/// Converts a beat into its nearest note row.
#[must_use]
pub fn beat_to_row(beat: f64) -> i64 {
    (beat * ROWS_PER_BEAT as f64).round() as i64
}

/// Converts a note row back into a beat.
#[must_use]
pub fn row_to_beat(row: i64) -> f64 {
    row as f64 / ROWS_PER_BEAT as f64
}

/// The kinds of timing events a chart can hold.
///
/// The declaration order is also the tie-break order when events of different kinds
/// share a beat in a merged sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TimingEventKind {
    /// Tempo change. `#BPMS`
    Tempo,
    /// Pause after the beat is reached. `#STOPS`
    Stop,
    /// Pause before the notes on the beat become reachable. `#DELAYS`
    Delay,
    /// Instantaneous skip over a range of beats. `#WARPS`
    Warp,
    /// Time signature change. `#TIMESIGNATURES`
    TimeSignature,
    /// Visual scroll multiplier. `#SCROLLS`
    Scroll,
    /// Interpolated speed multiplier. `#SPEEDS`
    Speed,
    /// Range of beats whose notes are not judged. `#FAKES`
    Fake,
    /// Hold tick count. `#TICKCOUNTS`
    TickCount,
    /// Free text marker. `#LABELS`
    Label,
    /// Combo multipliers. `#COMBOS`
    Combo,
    /// Modifier attack. `#ATTACKS`
    Attack,
    /// Song offset, a singleton living at beat 0. `#OFFSET`
    Offset,
}

impl TimingEventKind {
    /// Every kind, in tie-break order.
    pub const ALL: [Self; 13] = [
        Self::Tempo,
        Self::Stop,
        Self::Delay,
        Self::Warp,
        Self::TimeSignature,
        Self::Scroll,
        Self::Speed,
        Self::Fake,
        Self::TickCount,
        Self::Label,
        Self::Combo,
        Self::Attack,
        Self::Offset,
    ];

    /// The simfile tag name of the kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Tempo => "BPMS",
            Self::Stop => "STOPS",
            Self::Delay => "DELAYS",
            Self::Warp => "WARPS",
            Self::TimeSignature => "TIMESIGNATURES",
            Self::Scroll => "SCROLLS",
            Self::Speed => "SPEEDS",
            Self::Fake => "FAKES",
            Self::TickCount => "TICKCOUNTS",
            Self::Label => "LABELS",
            Self::Combo => "COMBOS",
            Self::Attack => "ATTACKS",
            Self::Offset => "OFFSET",
        }
    }

    /// Whether the kind alters the beat/second mapping.
    #[must_use]
    pub const fn affects_time(self) -> bool {
        matches!(self, Self::Tempo | Self::Stop | Self::Delay | Self::Warp | Self::Offset)
    }
}

impl fmt::Display for TimingEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unit of the ramp length of a [`EventValue::Speed`] event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpeedUnit {
    /// The ramp length is measured in beats.
    #[default]
    Beats,
    /// The ramp length is measured in seconds.
    Seconds,
}

/// The kind-specific payload of a timing event.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventValue {
    /// New tempo in beats per minute.
    Tempo {
        /// Beats per minute.
        bpm: PositiveF64,
    },
    /// Dwell after the beat. Negative values rewind visually only.
    Stop {
        /// Dwell length in seconds.
        seconds: FinF64,
    },
    /// Dwell before the beat. Negative values rewind visually only.
    Delay {
        /// Dwell length in seconds.
        seconds: FinF64,
    },
    /// Skip of `length` beats taking no time.
    Warp {
        /// Skipped length in beats.
        length: PositiveF64,
    },
    /// Time signature `numerator/denominator`.
    TimeSignature {
        /// Divisions per measure.
        numerator: u32,
        /// Note value of one division.
        denominator: u32,
    },
    /// Visual distance multiplier per beat.
    Scroll {
        /// The multiplier, possibly negative.
        ratio: FinF64,
    },
    /// Speed multiplier reached after a ramp.
    Speed {
        /// Target multiplier.
        ratio: FinF64,
        /// Ramp length, zero for an immediate change.
        delay: NonNegativeF64,
        /// Unit of `delay`.
        unit: SpeedUnit,
    },
    /// Range of unjudged beats.
    Fake {
        /// Length of the range in beats.
        length: PositiveF64,
    },
    /// Hold ticks per beat.
    TickCount {
        /// Ticks per beat.
        ticks: u32,
    },
    /// Free text.
    Label {
        /// The label text.
        text: String,
    },
    /// Combo multipliers.
    Combo {
        /// Combo gained per hit.
        hit: u32,
        /// Misses counted per miss.
        miss: u32,
    },
    /// Modifier attack.
    Attack {
        /// How long the attack lasts, in seconds.
        length: NonNegativeF64,
        /// The modifier string.
        mods: String,
    },
    /// Song offset in seconds; beat 0 sounds at `-seconds`.
    Offset {
        /// The offset.
        seconds: FinF64,
    },
}

impl EventValue {
    /// A tempo change.
    ///
    /// # Errors
    ///
    /// Fails unless `bpm` is finite and positive.
    pub fn tempo(bpm: f64) -> Result<Self, TimelineError> {
        let bpm = checked(PositiveF64::new(bpm), TimingEventKind::Tempo, "tempo must be positive")?;
        Ok(Self::Tempo { bpm })
    }

    /// A stop of `seconds`, negative to rewind.
    ///
    /// # Errors
    ///
    /// Fails unless `seconds` is finite.
    pub fn stop(seconds: f64) -> Result<Self, TimelineError> {
        let seconds = checked(FinF64::new(seconds), TimingEventKind::Stop, "dwell must be finite")?;
        Ok(Self::Stop { seconds })
    }

    /// A delay of `seconds`, negative to rewind.
    ///
    /// # Errors
    ///
    /// Fails unless `seconds` is finite.
    pub fn delay(seconds: f64) -> Result<Self, TimelineError> {
        let seconds = checked(FinF64::new(seconds), TimingEventKind::Delay, "dwell must be finite")?;
        Ok(Self::Delay { seconds })
    }

    /// A warp skipping `length` beats.
    ///
    /// # Errors
    ///
    /// Fails unless `length` is finite and positive.
    pub fn warp(length: f64) -> Result<Self, TimelineError> {
        let length = checked(
            PositiveF64::new(length),
            TimingEventKind::Warp,
            "range length must be positive",
        )?;
        Ok(Self::Warp { length })
    }

    /// A scroll multiplier.
    ///
    /// # Errors
    ///
    /// Fails unless `ratio` is finite.
    pub fn scroll(ratio: f64) -> Result<Self, TimelineError> {
        let ratio = checked(FinF64::new(ratio), TimingEventKind::Scroll, "ratio must be finite")?;
        Ok(Self::Scroll { ratio })
    }

    /// A speed multiplier reached after a ramp of `delay` in `unit`.
    ///
    /// # Errors
    ///
    /// Fails unless `ratio` is finite and `delay` finite and non-negative.
    pub fn speed(ratio: f64, delay: f64, unit: SpeedUnit) -> Result<Self, TimelineError> {
        let kind = TimingEventKind::Speed;
        let ratio = checked(FinF64::new(ratio), kind, "ratio must be finite")?;
        let delay = checked(
            NonNegativeF64::new(delay),
            kind,
            "speed ramp must be non-negative",
        )?;
        Ok(Self::Speed { ratio, delay, unit })
    }

    /// A fake range of `length` beats.
    ///
    /// # Errors
    ///
    /// Fails unless `length` is finite and positive.
    pub fn fake(length: f64) -> Result<Self, TimelineError> {
        let length = checked(
            PositiveF64::new(length),
            TimingEventKind::Fake,
            "range length must be positive",
        )?;
        Ok(Self::Fake { length })
    }

    /// A modifier attack lasting `length` seconds.
    ///
    /// # Errors
    ///
    /// Fails unless `length` is finite and non-negative.
    pub fn attack(length: f64, mods: impl Into<String>) -> Result<Self, TimelineError> {
        let length = checked(
            NonNegativeF64::new(length),
            TimingEventKind::Attack,
            "attack length must be non-negative",
        )?;
        Ok(Self::Attack {
            length,
            mods: mods.into(),
        })
    }

    /// A song offset of `seconds`.
    ///
    /// # Errors
    ///
    /// Fails unless `seconds` is finite.
    pub fn offset(seconds: f64) -> Result<Self, TimelineError> {
        let seconds = checked(
            FinF64::new(seconds),
            TimingEventKind::Offset,
            "offset must be finite",
        )?;
        Ok(Self::Offset { seconds })
    }

    /// The kind of event this value belongs to.
    #[must_use]
    pub const fn kind(&self) -> TimingEventKind {
        match self {
            Self::Tempo { .. } => TimingEventKind::Tempo,
            Self::Stop { .. } => TimingEventKind::Stop,
            Self::Delay { .. } => TimingEventKind::Delay,
            Self::Warp { .. } => TimingEventKind::Warp,
            Self::TimeSignature { .. } => TimingEventKind::TimeSignature,
            Self::Scroll { .. } => TimingEventKind::Scroll,
            Self::Speed { .. } => TimingEventKind::Speed,
            Self::Fake { .. } => TimingEventKind::Fake,
            Self::TickCount { .. } => TimingEventKind::TickCount,
            Self::Label { .. } => TimingEventKind::Label,
            Self::Combo { .. } => TimingEventKind::Combo,
            Self::Attack { .. } => TimingEventKind::Attack,
            Self::Offset { .. } => TimingEventKind::Offset,
        }
    }

    /// The scalar most overlays care about: dwell seconds, range length, ratio or tempo.
    ///
    /// Returns `None` for kinds without a single scalar.
    #[must_use]
    pub fn scalar(&self) -> Option<f64> {
        match self {
            Self::Tempo { bpm: value }
            | Self::Warp { length: value }
            | Self::Fake { length: value } => Some(value.as_f64()),
            Self::Stop { seconds: value }
            | Self::Delay { seconds: value }
            | Self::Offset { seconds: value }
            | Self::Scroll { ratio: value }
            | Self::Speed { ratio: value, .. } => Some(value.as_f64()),
            Self::Attack { length, .. } => Some(length.as_f64()),
            Self::TimeSignature { .. }
            | Self::TickCount { .. }
            | Self::Label { .. }
            | Self::Combo { .. } => None,
        }
    }

    /// Whether the value is a stop or delay that rewinds instead of pausing.
    #[must_use]
    pub fn is_negative_dwell(&self) -> bool {
        matches!(self, Self::Stop { seconds } | Self::Delay { seconds } if seconds.as_f64() < 0.0)
    }

    /// Checks the rules the payload types do not carry, returning the violated one.
    pub(crate) fn check(&self) -> Result<(), &'static str> {
        match self {
            Self::Stop { seconds } | Self::Delay { seconds } if seconds.as_f64() == 0.0 => {
                Err("dwell must be non-zero")
            }
            Self::TimeSignature {
                numerator,
                denominator,
            } if *numerator == 0 || *denominator == 0 => {
                Err("time signature parts must be at least 1")
            }
            _ => Ok(()),
        }
    }
}

/// Turns the error of a checked float constructor into a rejected value of `kind`.
fn checked<T, E>(
    value: Result<T, E>,
    kind: TimingEventKind,
    reason: &'static str,
) -> Result<T, TimelineError> {
    value.map_err(|_| TimelineError::InvalidValue { kind, reason })
}

/// One timing event of a chart.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimingEvent {
    /// Position of the event in beats, non-negative.
    pub beat: f64,
    /// Time of the event in seconds, filled in by [`crate::timing::TimingData`] after every edit.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub second: Option<f64>,
    /// The kind-specific payload.
    pub value: EventValue,
}

impl TimingEvent {
    /// Creates an event whose time is not computed yet.
    #[must_use]
    pub const fn new(beat: f64, value: EventValue) -> Self {
        Self {
            beat,
            second: None,
            value,
        }
    }

    /// The kind of the event.
    #[must_use]
    pub const fn kind(&self) -> TimingEventKind {
        self.value.kind()
    }

    /// The note row of the event.
    #[must_use]
    pub fn row(&self) -> i64 {
        beat_to_row(self.beat)
    }

    /// The beat right after the range of a warp or fake, or the event beat otherwise.
    #[must_use]
    pub fn end_beat(&self) -> f64 {
        match self.value {
            EventValue::Warp { length } | EventValue::Fake { length } => {
                self.beat + length.as_f64()
            }
            _ => self.beat,
        }
    }
}
