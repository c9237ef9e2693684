//! Conversion between beats and seconds.
//!
//! The converter walks the time-affecting events once and stores a checkpoint for every distinct
//! event beat. Each checkpoint keeps the walk state right after the events on its beat, so both
//! directions are answered by a binary search followed by a closed-form solve inside a single
//! segment.
//!
//! On a shared beat the events apply as tempo, delay, stop, then warp. Notes on the beat become
//! reachable after the delay and before the stop. Stops and delays on warped beats take no time.
//! A negative stop or delay does not move time backward: it becomes a time debt that the
//! following beats pay off, which freezes the time while they pass.

use itertools::Itertools;

use super::{
    event::{TimingEvent, TimingEventKind},
    seek_partition,
    timeline::EventTimeline,
};

/// Tempo used before the first tempo event.
pub const DEFAULT_BPM: f64 = 120.0;

/// The kinds walked to build the checkpoints.
const WALK_KINDS: [TimingEventKind; 4] = [
    TimingEventKind::Tempo,
    TimingEventKind::Stop,
    TimingEventKind::Delay,
    TimingEventKind::Warp,
];

/// State of the walk at some beat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct WalkState {
    pub(crate) beat: f64,
    pub(crate) second: f64,
    /// Beats per second.
    pub(crate) bps: f64,
    /// Seconds still owed by negative dwells.
    pub(crate) debt: f64,
    /// Beats before this are skipped by a warp.
    pub(crate) warp_end: f64,
}

impl WalkState {
    const fn origin(second: f64) -> Self {
        Self {
            beat: 0.0,
            second,
            bps: DEFAULT_BPM / 60.0,
            debt: 0.0,
            warp_end: 0.0,
        }
    }

    /// The first beat not covered by the warp or the debt.
    fn free_beat(&self) -> f64 {
        self.beat.max(self.warp_end) + self.debt * self.bps
    }

    /// The time at `beat`, assuming no event lies in `(self.beat, beat]`.
    pub(crate) fn second_at(&self, beat: f64) -> f64 {
        let from = self.beat.max(self.warp_end.min(beat));
        let elapsed = (beat - from).max(0.0) / self.bps;
        self.second + (elapsed - self.debt).max(0.0)
    }

    /// The earliest beat at `second`, assuming no event lies after `self.beat` before it.
    pub(crate) fn beat_at(&self, second: f64) -> f64 {
        if second <= self.second {
            return self.beat;
        }
        self.free_beat() + (second - self.second) * self.bps
    }

    /// Moves the state to `beat`, paying the debt with the elapsed time.
    fn advance(&mut self, beat: f64) {
        let from = self.beat.max(self.warp_end.min(beat));
        let elapsed = (beat - from).max(0.0) / self.bps;
        let paid = self.debt.min(elapsed);
        self.debt -= paid;
        self.second += elapsed - paid;
        self.beat = beat;
    }

    /// Applies a stop or delay of `seconds`.
    fn dwell(&mut self, seconds: f64) {
        if seconds < 0.0 {
            self.debt -= seconds;
            return;
        }
        let paid = self.debt.min(seconds);
        self.debt -= paid;
        self.second += seconds - paid;
    }
}

/// The walk state recorded on one distinct event beat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Checkpoint {
    pub(crate) beat: f64,
    /// Time on the beat before its delay.
    pub(crate) before_delay: f64,
    /// Time the notes on the beat are reached.
    pub(crate) second: f64,
    /// State after every event on the beat.
    pub(crate) after: WalkState,
}

/// Beat/second conversion cache built from an [`EventTimeline`].
///
/// The cache remembers the timeline version it was built from. [`Self::is_current`] tells
/// whether it needs a [`Self::refresh`].
#[derive(Debug, Clone, PartialEq)]
pub struct BeatTimeConverter {
    version: u64,
    origin: WalkState,
    checkpoints: Vec<Checkpoint>,
    tempos: Vec<(f64, f64)>,
    warps: Vec<(f64, f64)>,
}

impl Default for BeatTimeConverter {
    fn default() -> Self {
        Self::new(&EventTimeline::default())
    }
}

impl BeatTimeConverter {
    /// Builds the cache for the timeline.
    #[must_use]
    pub fn new(timeline: &EventTimeline) -> Self {
        let origin = WalkState::origin(-timeline.song_offset());
        let mut state = origin;
        let mut checkpoints = Vec::new();
        let events = timeline.timing_events(&WALK_KINDS);
        for (_, group) in &events.into_iter().chunk_by(|event| event.beat) {
            let group: Vec<&TimingEvent> = group.collect();
            let Some(beat) = group.first().map(|event| event.beat) else {
                continue;
            };
            state.advance(beat);
            if let Some(bpm) = find_scalar(&group, TimingEventKind::Tempo) {
                state.bps = bpm / 60.0;
            }
            let warp_end = find_scalar(&group, TimingEventKind::Warp)
                .map_or(state.warp_end, |length| state.warp_end.max(beat + length));
            let dwells = beat >= warp_end;
            let before_delay = state.second;
            if let Some(seconds) = find_scalar(&group, TimingEventKind::Delay).filter(|_| dwells) {
                state.dwell(seconds);
            }
            let second = state.second;
            if let Some(seconds) = find_scalar(&group, TimingEventKind::Stop).filter(|_| dwells) {
                state.dwell(seconds);
            }
            state.warp_end = warp_end;
            checkpoints.push(Checkpoint {
                beat,
                before_delay,
                second,
                after: state,
            });
        }
        let tempos = timeline
            .events(TimingEventKind::Tempo)
            .filter_map(|event| Some((event.beat, event.value.scalar()?)))
            .collect();
        let warps = merge_ranges(timeline.events(TimingEventKind::Warp));
        log::debug!(
            "rebuilt beat/time cache at version {} with {} checkpoints",
            timeline.version(),
            checkpoints.len()
        );
        Self {
            version: timeline.version(),
            origin,
            checkpoints,
            tempos,
            warps,
        }
    }

    /// The timeline version the cache was built from.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Whether the cache matches the timeline.
    #[must_use]
    pub const fn is_current(&self, timeline: &EventTimeline) -> bool {
        self.version == timeline.version()
    }

    /// Rebuilds the cache if the timeline changed since it was built. Returns whether it did.
    pub fn refresh(&mut self, timeline: &EventTimeline) -> bool {
        if self.is_current(timeline) {
            return false;
        }
        *self = Self::new(timeline);
        true
    }

    /// The time in seconds at which the notes on `beat` are reached.
    ///
    /// Negative beats are clamped to 0, so `seconds_from_beat(0.0)` is minus the song offset.
    #[must_use]
    pub fn seconds_from_beat(&self, beat: f64) -> f64 {
        let beat = clamp_beat(beat);
        let idx = self.checkpoints.partition_point(|cp| cp.beat <= beat);
        self.second_in(idx, beat)
    }

    /// [`Self::seconds_from_beat`] resuming the search from `hint`, for ascending sweeps.
    pub(crate) fn seconds_from_beat_seek(&self, beat: f64, hint: &mut usize) -> f64 {
        let beat = clamp_beat(beat);
        let idx = seek_partition(&self.checkpoints, hint, beat, |cp| cp.beat);
        self.second_in(idx, beat)
    }

    fn second_in(&self, idx: usize, beat: f64) -> f64 {
        match idx.checked_sub(1).and_then(|prev| self.checkpoints.get(prev)) {
            Some(cp) if beat <= cp.beat => cp.second,
            Some(cp) => cp.after.second_at(beat),
            None => self.origin.second_at(beat),
        }
    }

    /// The time in seconds right before any event on `beat` applies.
    ///
    /// This differs from [`Self::seconds_from_beat`] only on beats carrying a delay.
    #[must_use]
    pub fn seconds_before_beat(&self, beat: f64) -> f64 {
        let beat = clamp_beat(beat);
        match self.checkpoint_at_or_before(beat) {
            Some(cp) if beat <= cp.beat => cp.before_delay,
            Some(cp) => cp.after.second_at(beat),
            None => self.origin.second_at(beat),
        }
    }

    /// The time in seconds right after every event on `beat` has applied.
    ///
    /// This differs from [`Self::seconds_from_beat`] only on beats carrying a stop.
    #[must_use]
    pub fn seconds_after_beat(&self, beat: f64) -> f64 {
        let beat = clamp_beat(beat);
        match self.checkpoint_at_or_before(beat) {
            Some(cp) if beat <= cp.beat => cp.after.second,
            Some(cp) => cp.after.second_at(beat),
            None => self.origin.second_at(beat),
        }
    }

    /// The earliest reachable beat at `second`.
    ///
    /// Times inside a stop or delay map to its beat. Times inside a frozen region map to its
    /// start. The instant of a warp maps to the warp end. The result is never negative.
    #[must_use]
    pub fn beat_from_seconds(&self, second: f64) -> f64 {
        if second.is_nan() {
            return 0.0;
        }
        let idx = self.checkpoints.partition_point(|cp| cp.second < second);
        let state = idx
            .checked_sub(1)
            .and_then(|prev| self.checkpoints.get(prev))
            .map_or(self.origin, |cp| cp.after);
        let beat = state.beat_at(second);
        let beat = self
            .checkpoints
            .get(idx)
            .map_or(beat, |next| beat.min(next.beat))
            .max(0.0);
        self.warp_containing(beat).map_or(beat, |&(_, end)| end)
    }

    /// The time of an event as listed by an editor: delays are placed before their dwell, every
    /// other kind where the notes on its beat are reached.
    #[must_use]
    pub fn event_second(&self, event: &TimingEvent) -> f64 {
        if event.kind() == TimingEventKind::Delay
            && let Some(cp) = self.checkpoint_at_or_before(event.beat)
            && event.beat <= cp.beat
        {
            return cp.before_delay;
        }
        self.seconds_from_beat(event.beat)
    }

    /// The tempo in effect at `beat`.
    #[must_use]
    pub fn bpm_at(&self, beat: f64) -> f64 {
        let idx = self.tempos.partition_point(|&(start, _)| start <= beat);
        idx.checked_sub(1)
            .and_then(|prev| self.tempos.get(prev))
            .map_or(DEFAULT_BPM, |&(_, bpm)| bpm)
    }

    /// Whether `beat` lies inside a warp range.
    #[must_use]
    pub fn is_beat_warped(&self, beat: f64) -> bool {
        self.warp_containing(beat).is_some()
    }

    fn warp_containing(&self, beat: f64) -> Option<&(f64, f64)> {
        let idx = self.warps.partition_point(|&(start, _)| start <= beat);
        self.warps
            .get(idx.checked_sub(1)?)
            .filter(|&&(_, end)| beat < end)
    }

    /// How many beats after `beat` pass while `seconds` of time elapse, following the tempo
    /// changes on the way. Warped beats pass for free.
    ///
    /// This is how far the time debt of a negative dwell of `seconds` on `beat` reaches.
    #[must_use]
    pub fn beats_for_seconds(&self, beat: f64, seconds: f64) -> f64 {
        let beat = clamp_beat(beat);
        let mut at = beat;
        let mut left = seconds.max(0.0);
        loop {
            if let Some(&(_, end)) = self.warp_containing(at) {
                at = end;
            }
            let bps = self.bpm_at(at) / 60.0;
            let next_tempo = self.tempos.partition_point(|&(start, _)| start <= at);
            let next_warp = self.warps.partition_point(|&(start, _)| start <= at);
            let limit = [
                self.tempos.get(next_tempo).map(|&(start, _)| start),
                self.warps.get(next_warp).map(|&(start, _)| start),
            ]
            .into_iter()
            .flatten()
            .fold(f64::INFINITY, f64::min);
            let reach = at + left * bps;
            if !left.is_finite() || reach <= limit {
                return reach - beat;
            }
            left -= (limit - at) / bps;
            at = limit;
        }
    }

    /// Whether `beat` lies after a negative stop or delay while time stands still.
    ///
    /// Such beats share the time of the frozen region's start. The event beat itself is not
    /// frozen.
    #[must_use]
    pub fn is_beat_frozen(&self, beat: f64) -> bool {
        self.checkpoint_at_or_before(beat).is_some_and(|cp| {
            let state = cp.after;
            state.debt > 0.0 && state.beat.max(state.warp_end) < beat && beat < state.free_beat()
        })
    }

    /// Disjoint warp ranges as `[start, end)` pairs in beat order.
    #[must_use]
    pub fn warp_ranges(&self) -> &[(f64, f64)] {
        &self.warps
    }

    /// Beats inside `(from, to)` where the time slope changes: event beats, warp ends and the
    /// ends of frozen regions.
    #[must_use]
    pub fn breakpoints(&self, from: f64, to: f64) -> Vec<f64> {
        let start = self.checkpoints.partition_point(|cp| cp.beat <= from);
        let states = std::iter::once(
            start
                .checked_sub(1)
                .and_then(|prev| self.checkpoints.get(prev))
                .map_or(self.origin, |cp| cp.after),
        )
        .chain(
            self.checkpoints
                .iter()
                .skip(start)
                .take_while(|cp| cp.beat < to)
                .map(|cp| cp.after),
        );
        let mut points = Vec::new();
        for state in states {
            let inner = [
                state.beat,
                state.beat.max(state.warp_end),
                state.free_beat(),
            ];
            points.extend(inner.into_iter().filter(|&beat| from < beat && beat < to));
        }
        points.sort_by(f64::total_cmp);
        points.dedup_by(|a, b| a.total_cmp(b).is_eq());
        points
    }

    fn checkpoint_at_or_before(&self, beat: f64) -> Option<&Checkpoint> {
        let idx = self.checkpoints.partition_point(|cp| cp.beat <= beat);
        self.checkpoints.get(idx.checked_sub(1)?)
    }
}

fn clamp_beat(beat: f64) -> f64 {
    if beat.is_nan() { 0.0 } else { beat.max(0.0) }
}

fn find_scalar(group: &[&TimingEvent], kind: TimingEventKind) -> Option<f64> {
    group
        .iter()
        .find(|event| event.kind() == kind)
        .and_then(|event| event.value.scalar())
}

/// Unions possibly overlapping range events into sorted disjoint ranges.
pub(crate) fn merge_ranges<'a>(events: impl Iterator<Item = &'a TimingEvent>) -> Vec<(f64, f64)> {
    let mut ranges: Vec<(f64, f64)> = Vec::new();
    for event in events {
        let (start, end) = (event.beat, event.end_beat());
        match ranges.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => ranges.push((start, end)),
        }
    }
    ranges
}
