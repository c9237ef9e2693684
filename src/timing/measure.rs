//! Measures, divisions and barlines derived from time signatures.

use num::{ToPrimitive, rational::Ratio};

use super::{
    event::{EventValue, TimingEventKind},
    timeline::EventTimeline,
};

/// A stretch of beats governed by one time signature.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SignatureSpan {
    beat: f64,
    numerator: u32,
    denominator: u32,
    /// Measures completed before `beat`.
    measures_before: f64,
}

impl SignatureSpan {
    /// Beats in one division, `4 / denominator`.
    fn division_length(&self) -> Ratio<u32> {
        Ratio::new(4, self.denominator)
    }

    /// Beats in one measure, `4 * numerator / denominator`.
    fn measure_length(&self) -> Ratio<u32> {
        self.division_length() * self.numerator
    }
}

fn to_beats(ratio: Ratio<u32>) -> f64 {
    ratio.to_f64().unwrap_or(4.0)
}

/// Measure arithmetic over the time signatures of a timeline.
///
/// Before the first time signature, and when there is none, the chart is in 4/4.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureMap {
    version: u64,
    spans: Vec<SignatureSpan>,
}

impl Default for MeasureMap {
    fn default() -> Self {
        Self::new(&EventTimeline::default())
    }
}

impl MeasureMap {
    /// Builds the map for the timeline.
    #[must_use]
    pub fn new(timeline: &EventTimeline) -> Self {
        let mut spans = vec![SignatureSpan {
            beat: 0.0,
            numerator: 4,
            denominator: 4,
            measures_before: 0.0,
        }];
        for event in timeline.events(TimingEventKind::TimeSignature) {
            let EventValue::TimeSignature {
                numerator,
                denominator,
            } = event.value
            else {
                continue;
            };
            let Some(last) = spans.last().copied() else {
                continue;
            };
            let measures_before = last.measures_before
                + (event.beat - last.beat) / to_beats(last.measure_length());
            let span = SignatureSpan {
                beat: event.beat,
                numerator,
                denominator,
                measures_before,
            };
            match spans.last_mut() {
                Some(last) if event.beat <= last.beat => *last = span,
                _ => spans.push(span),
            }
        }
        Self {
            version: timeline.version(),
            spans,
        }
    }

    /// Rebuilds the map if the timeline changed since it was built. Returns whether it did.
    pub fn refresh(&mut self, timeline: &EventTimeline) -> bool {
        if self.version == timeline.version() {
            return false;
        }
        *self = Self::new(timeline);
        true
    }

    fn span_index(&self, beat: f64) -> usize {
        self.spans
            .partition_point(|span| span.beat <= beat)
            .saturating_sub(1)
    }

    fn span_at(&self, beat: f64) -> Option<&SignatureSpan> {
        self.spans.get(self.span_index(beat))
    }

    /// The time signature at the beat as `(numerator, denominator)`.
    #[must_use]
    pub fn time_signature_at(&self, beat: f64) -> (u32, u32) {
        self.span_at(beat)
            .map_or((4, 4), |span| (span.numerator, span.denominator))
    }

    /// Beats in one division at the beat.
    #[must_use]
    pub fn division_length(&self, beat: f64) -> f64 {
        self.span_at(beat)
            .map_or(1.0, |span| to_beats(span.division_length()))
    }

    /// Beats in one measure at the beat.
    #[must_use]
    pub fn measure_length(&self, beat: f64) -> f64 {
        self.span_at(beat)
            .map_or(4.0, |span| to_beats(span.measure_length()))
    }

    /// The fractional division index of the beat within its measure, counted from the last time
    /// signature.
    #[must_use]
    pub fn division_of_measure(&self, beat: f64) -> f64 {
        let Some(span) = self.span_at(beat) else {
            return 0.0;
        };
        ((beat - span.beat) / to_beats(span.division_length())).rem_euclid(span.numerator as f64)
    }

    /// The fractional measure number of the beat.
    #[must_use]
    pub fn measure(&self, beat: f64) -> f64 {
        self.span_at(beat).map_or(beat / 4.0, |span| {
            span.measures_before + (beat - span.beat) / to_beats(span.measure_length())
        })
    }

    /// Division lines in `[from, to)` as `(beat, is_measure_line)`.
    ///
    /// Beats for which `skip` returns true are left out.
    #[must_use]
    pub fn barline_beats(&self, from: f64, to: f64, skip: impl Fn(f64) -> bool) -> Vec<(f64, bool)> {
        let from = from.max(0.0);
        let mut lines = Vec::new();
        if !to.is_finite() || to <= from {
            return lines;
        }
        let first = self.span_index(from);
        for (idx, span) in self.spans.iter().enumerate().skip(first) {
            let end = self
                .spans
                .get(idx + 1)
                .map_or(f64::INFINITY, |next| next.beat)
                .min(to);
            let division = to_beats(span.division_length());
            let start = ((from.max(span.beat) - span.beat) / division - 1e-9).ceil().max(0.0);
            let mut index = start as u64;
            loop {
                let beat = span.beat + index as f64 * division;
                if beat >= end {
                    break;
                }
                if !skip(beat) {
                    lines.push((beat, index % u64::from(span.numerator) == 0));
                }
                index += 1;
            }
            if end >= to {
                break;
            }
        }
        lines
    }
}
