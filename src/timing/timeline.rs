//! The editable, per-kind ordered store of timing events.

use std::collections::{BTreeMap, btree_map::Entry};

use itertools::Itertools;
use strict_num_extended::NonNegativeF64;
use thiserror::Error;

use super::event::{EventValue, TimingEvent, TimingEventKind, beat_to_row};

/// An edit rejected by [`EventTimeline`]. The timeline is left untouched when one is returned.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum TimelineError {
    /// Another event of the kind already occupies the note row.
    #[error("{kind} event already exists at beat {beat}")]
    DuplicateBeat {
        /// Kind of the edited event.
        kind: TimingEventKind,
        /// Beat of the existing event.
        beat: f64,
    },
    /// A flat sequence was not sorted by beat.
    #[error("{kind} event at beat {beat} comes after beat {previous}")]
    OutOfOrder {
        /// Kind of the event.
        kind: TimingEventKind,
        /// Beat of the offending event.
        beat: f64,
        /// Beat of the event listed before it.
        previous: f64,
    },
    /// The beat is negative.
    #[error("{kind} event at negative beat {beat}")]
    NegativeBeat {
        /// Kind of the event.
        kind: TimingEventKind,
        /// The rejected beat.
        beat: f64,
    },
    /// The beat is NaN or infinite.
    #[error("{kind} event at non-finite beat")]
    NonFinite {
        /// Kind of the event.
        kind: TimingEventKind,
    },
    /// The value is outside the domain of its kind.
    #[error("invalid {kind} value: {reason}")]
    InvalidValue {
        /// Kind of the event.
        kind: TimingEventKind,
        /// The violated rule.
        reason: &'static str,
    },
    /// The value belongs to a different kind than the one edited.
    #[error("{value_kind} value given for a {kind} event")]
    KindMismatch {
        /// Kind requested by the caller.
        kind: TimingEventKind,
        /// Kind of the supplied value.
        value_kind: TimingEventKind,
    },
    /// No event of the kind exists at the beat.
    #[error("no {kind} event at beat {beat}")]
    NotFound {
        /// Kind of the event.
        kind: TimingEventKind,
        /// The looked up beat.
        beat: f64,
    },
}

/// Timing events kept in beat order per kind, with a version bumped on every successful edit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventTimeline {
    events: BTreeMap<TimingEventKind, BTreeMap<NonNegativeF64, TimingEvent>>,
    version: u64,
}

impl EventTimeline {
    /// Creates an empty timeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The modification counter. It changes after every successful insert, remove or modify.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Total number of events of every kind.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.values().map(BTreeMap::len).sum()
    }

    /// Whether no event exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.values().all(BTreeMap::is_empty)
    }

    /// Number of events of the kind.
    #[must_use]
    pub fn count(&self, kind: TimingEventKind) -> usize {
        self.events.get(&kind).map_or(0, BTreeMap::len)
    }

    /// Events of the kind in beat order.
    pub fn events(
        &self,
        kind: TimingEventKind,
    ) -> impl DoubleEndedIterator<Item = &TimingEvent> + Clone + '_ {
        self.events.get(&kind).into_iter().flat_map(BTreeMap::values)
    }

    /// Events of all the kinds merged in beat order. Events sharing a beat follow the order of
    /// [`TimingEventKind::ALL`].
    #[must_use]
    pub fn timing_events(&self, kinds: &[TimingEventKind]) -> Vec<&TimingEvent> {
        kinds
            .iter()
            .copied()
            .sorted()
            .dedup()
            .map(|kind| self.events(kind))
            .kmerge_by(|a, b| (a.beat, a.kind()) < (b.beat, b.kind()))
            .collect()
    }

    /// Every event of every kind in beat order.
    #[must_use]
    pub fn all_events(&self) -> Vec<&TimingEvent> {
        self.timing_events(&TimingEventKind::ALL)
    }

    /// The last event of the kind at or before the beat.
    #[must_use]
    pub fn event_at_or_before(&self, kind: TimingEventKind, beat: f64) -> Option<&TimingEvent> {
        if beat < 0.0 {
            return None;
        }
        self.events
            .get(&kind)?
            .range(..=clamped_key(beat)?)
            .next_back()
            .map(|(_, event)| event)
    }

    /// The first event of the kind strictly after the beat.
    #[must_use]
    pub fn event_after(&self, kind: TimingEventKind, beat: f64) -> Option<&TimingEvent> {
        use std::ops::Bound::{Excluded, Unbounded};
        let map = self.events.get(&kind)?;
        if beat < 0.0 {
            return map.values().next();
        }
        map.range((Excluded(clamped_key(beat)?), Unbounded))
            .next()
            .map(|(_, event)| event)
    }

    /// The event of the kind sharing the note row of the beat.
    #[must_use]
    pub fn event_at_row(&self, kind: TimingEventKind, beat: f64) -> Option<&TimingEvent> {
        let key = self.row_key(kind, beat)?;
        self.events.get(&kind)?.get(&key)
    }

    /// Whether the beat lies inside `[start, start + length)` of any warp.
    ///
    /// This scans the warps before the beat. [`crate::timing::TimingData::is_beat_warped`] answers
    /// the same question in logarithmic time.
    #[must_use]
    pub fn is_beat_warped(&self, beat: f64) -> bool {
        self.is_in_range_event(TimingEventKind::Warp, beat)
    }

    /// Whether the beat lies inside `[start, start + length)` of any fake.
    #[must_use]
    pub fn is_beat_faked(&self, beat: f64) -> bool {
        self.is_in_range_event(TimingEventKind::Fake, beat)
    }

    fn is_in_range_event(&self, kind: TimingEventKind, beat: f64) -> bool {
        let Some(key) = clamped_key(beat).filter(|_| beat >= 0.0) else {
            return false;
        };
        self.events.get(&kind).is_some_and(|map| {
            map.range(..=key)
                .rev()
                .any(|(_, event)| beat < event.end_beat())
        })
    }

    /// The song offset in seconds, 0 when none is set.
    #[must_use]
    pub fn song_offset(&self) -> f64 {
        self.events(TimingEventKind::Offset)
            .next()
            .and_then(|event| event.value.scalar())
            .unwrap_or(0.0)
    }

    /// Inserts an event.
    ///
    /// # Errors
    ///
    /// Fails when the beat is negative or not finite, when `value` is out of its domain or of
    /// another kind, or when another event of the kind shares the note row.
    pub fn insert(
        &mut self,
        kind: TimingEventKind,
        beat: f64,
        value: EventValue,
    ) -> Result<(), TimelineError> {
        self.try_insert(kind, beat, value)
            .inspect_err(|err| log::warn!("rejected insert: {err}"))?;
        self.bump();
        Ok(())
    }

    fn try_insert(
        &mut self,
        kind: TimingEventKind,
        beat: f64,
        value: EventValue,
    ) -> Result<(), TimelineError> {
        let key = check_position(kind, beat)?;
        check_value(kind, &value)?;
        if let Some(existing) = self.event_at_row(kind, beat) {
            return Err(TimelineError::DuplicateBeat {
                kind,
                beat: existing.beat,
            });
        }
        match self.events.entry(kind).or_default().entry(key) {
            Entry::Vacant(vacant) => {
                vacant.insert(TimingEvent::new(beat, value));
                Ok(())
            }
            Entry::Occupied(_) => Err(TimelineError::DuplicateBeat { kind, beat }),
        }
    }

    /// Removes the event of the kind on the note row of the beat and returns it.
    ///
    /// # Errors
    ///
    /// Fails with [`TimelineError::NotFound`] when no such event exists.
    pub fn remove(&mut self, kind: TimingEventKind, beat: f64) -> Result<TimingEvent, TimelineError> {
        let removed = self
            .row_key(kind, beat)
            .and_then(|key| self.events.get_mut(&kind)?.remove(&key))
            .ok_or(TimelineError::NotFound { kind, beat })
            .inspect_err(|err| log::warn!("rejected remove: {err}"))?;
        self.bump();
        Ok(removed)
    }

    /// Replaces the value of the event of the kind on the note row of the beat, returning the
    /// previous value.
    ///
    /// # Errors
    ///
    /// Fails when no such event exists or the new value is invalid.
    pub fn modify(
        &mut self,
        kind: TimingEventKind,
        beat: f64,
        value: EventValue,
    ) -> Result<EventValue, TimelineError> {
        let previous = self
            .try_modify(kind, beat, value)
            .inspect_err(|err| log::warn!("rejected modify: {err}"))?;
        self.bump();
        Ok(previous)
    }

    fn try_modify(
        &mut self,
        kind: TimingEventKind,
        beat: f64,
        value: EventValue,
    ) -> Result<EventValue, TimelineError> {
        check_value(kind, &value)?;
        let event = self
            .row_key(kind, beat)
            .and_then(|key| self.events.get_mut(&kind)?.get_mut(&key))
            .ok_or(TimelineError::NotFound { kind, beat })?;
        Ok(std::mem::replace(&mut event.value, value))
    }

    /// Removes every event.
    pub fn clear(&mut self) {
        self.events.clear();
        self.bump();
    }

    /// Copies out every event, grouped by kind and in beat order within each kind.
    #[must_use]
    pub fn to_flat(&self) -> Vec<TimingEvent> {
        self.events
            .values()
            .flat_map(BTreeMap::values)
            .cloned()
            .collect()
    }

    /// Builds a timeline from events, which must be sorted by beat within each kind.
    ///
    /// # Errors
    ///
    /// Fails on the first invalid event, unsorted pair or duplicate row.
    pub fn from_flat(events: impl IntoIterator<Item = TimingEvent>) -> Result<Self, TimelineError> {
        let mut timeline = Self::new();
        let mut last_beats = BTreeMap::<TimingEventKind, f64>::new();
        for event in events {
            let kind = event.kind();
            if let Some(&previous) = last_beats.get(&kind)
                && event.beat < previous
            {
                return Err(TimelineError::OutOfOrder {
                    kind,
                    beat: event.beat,
                    previous,
                });
            }
            last_beats.insert(kind, event.beat);
            timeline.try_insert(kind, event.beat, event.value)?;
        }
        timeline.bump();
        Ok(timeline)
    }

    /// Fills in the time of every event. The version is kept as is.
    pub(crate) fn annotate_seconds(&mut self, mut second_of: impl FnMut(&TimingEvent) -> f64) {
        for event in self.events.values_mut().flat_map(BTreeMap::values_mut) {
            event.second = Some(second_of(event));
        }
    }

    /// The map key of the event on the note row of the beat.
    fn row_key(&self, kind: TimingEventKind, beat: f64) -> Option<NonNegativeF64> {
        if !beat.is_finite() {
            return None;
        }
        let row = beat_to_row(beat);
        let key = clamped_key(beat)?;
        let map = self.events.get(&kind)?;
        let before = map.range(..=key).next_back();
        let after = map.range(key..).next();
        before
            .into_iter()
            .chain(after)
            .find(|(_, event)| event.row() == row)
            .map(|(key, _)| *key)
    }

    fn bump(&mut self) {
        self.version = self.version.wrapping_add(1);
    }
}

/// The map key nearest to `beat`, `None` for NaN.
fn clamped_key(beat: f64) -> Option<NonNegativeF64> {
    if beat.is_nan() {
        return None;
    }
    NonNegativeF64::new(beat.clamp(0.0, f64::MAX).abs()).ok()
}

fn check_position(kind: TimingEventKind, beat: f64) -> Result<NonNegativeF64, TimelineError> {
    if !beat.is_finite() {
        return Err(TimelineError::NonFinite { kind });
    }
    if beat < 0.0 {
        return Err(TimelineError::NegativeBeat { kind, beat });
    }
    // `abs` folds -0.0 into 0.0.
    let key =
        NonNegativeF64::new(beat.abs()).map_err(|_| TimelineError::NegativeBeat { kind, beat })?;
    if kind == TimingEventKind::Offset && beat != 0.0 {
        return Err(TimelineError::InvalidValue {
            kind,
            reason: "offset must be placed at beat 0",
        });
    }
    Ok(key)
}

fn check_value(kind: TimingEventKind, value: &EventValue) -> Result<(), TimelineError> {
    let value_kind = value.kind();
    if value_kind != kind {
        return Err(TimelineError::KindMismatch { kind, value_kind });
    }
    value
        .check()
        .map_err(|reason| TimelineError::InvalidValue { kind, reason })
}
