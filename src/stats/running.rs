//! Streaming mean, variance and median.

use std::{cmp::Reverse, collections::BinaryHeap};

use strict_num_extended::FinF64;

/// Mean and population variance by Welford's method, median by two heaps.
///
/// Every query is O(1) and every push is O(log n).
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: usize,
    mean: f64,
    m2: f64,
    /// The smaller half, holding the extra sample when the count is odd.
    lower: BinaryHeap<FinF64>,
    upper: BinaryHeap<Reverse<FinF64>>,
}

impl RunningStats {
    /// Creates empty statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sample. NaN and infinite samples are ignored.
    pub fn push(&mut self, value: f64) {
        let Ok(sample) = FinF64::new(value) else {
            return;
        };
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);

        let goes_low = self.lower.peek().is_none_or(|top| sample <= *top);
        if goes_low {
            self.lower.push(sample);
        } else {
            self.upper.push(Reverse(sample));
        }
        if self.lower.len() > self.upper.len() + 1 {
            if let Some(moved) = self.lower.pop() {
                self.upper.push(Reverse(moved));
            }
        } else if self.upper.len() > self.lower.len()
            && let Some(Reverse(moved)) = self.upper.pop()
        {
            self.lower.push(moved);
        }
    }

    /// Number of samples.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// Whether no sample was added.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The mean.
    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    /// The population variance.
    #[must_use]
    pub fn variance(&self) -> Option<f64> {
        (self.count > 0).then(|| self.m2 / self.count as f64)
    }

    /// The population standard deviation.
    #[must_use]
    pub fn std_dev(&self) -> Option<f64> {
        self.variance().map(f64::sqrt)
    }

    /// The median; the mean of the two middle samples when the count is even.
    #[must_use]
    pub fn median(&self) -> Option<f64> {
        let low = self.lower.peek()?.as_f64();
        if self.lower.len() > self.upper.len() {
            return Some(low);
        }
        let high = self.upper.peek().map_or(low, |Reverse(top)| top.as_f64());
        Some((low + high) / 2.0)
    }
}
