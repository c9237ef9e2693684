//! Timing engine for rhythm-game chart editors.
//!
//! The crate consists of three layers:
//!
//! - `timing` stores tempo, stop, delay, warp and scroll events per beat, converts between beats
//!   and seconds, and maps beats onto the vertical position used to draw a note field.
//! - `judgment` defines judgment windows and the built-in ITG and FA+ profiles.
//! - `stats` accumulates timing errors of a play session into scores, a histogram and an offset
//!   suggestion.
//!
//! `config` holds the engine settings shared by those layers. For convenience, `prelude`
//! re-exports the types needed in most programs.
//!
//! ```
//! use chart_timing::prelude::*;
//!
//! let mut data = TimingData::new();
//! data.insert(TimingEventKind::Stop, 4.0, EventValue::stop(2.0)?)?;
//! assert_eq!(data.seconds_from_beat(4.0), 2.0);
//! assert!(data.seconds_from_beat(4.001) > 4.0);
//! # Ok::<(), TimelineError>(())
//! ```

pub mod config;
pub mod judgment;
pub mod prelude;
pub mod stats;
pub mod timing;
