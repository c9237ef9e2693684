//! Timing error histogram with 1 ms buckets.

/// Weights of the 7-tap smoothing kernel, centered on the middle entry.
pub const SMOOTHING_KERNEL: [f64; 7] = [0.045, 0.09, 0.18, 0.37, 0.18, 0.09, 0.045];

/// Counts of errors per whole millisecond in `[-radius, radius]`.
///
/// Errors beyond the radius land in the outermost bucket on their side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    radius_ms: i32,
    counts: Vec<u32>,
}

impl Histogram {
    /// Creates an empty histogram covering `[-radius_ms, radius_ms]`.
    #[must_use]
    pub fn new(radius_ms: i32) -> Self {
        let radius_ms = radius_ms.max(0);
        Self {
            radius_ms,
            counts: vec![0; 2 * radius_ms as usize + 1],
        }
    }

    /// The radius in milliseconds.
    #[must_use]
    pub const fn radius_ms(&self) -> i32 {
        self.radius_ms
    }

    /// The bucket an error in milliseconds falls into.
    #[must_use]
    pub fn bucket_of(&self, error_ms: f64) -> i32 {
        if error_ms.is_nan() {
            return 0;
        }
        let radius = f64::from(self.radius_ms);
        error_ms.round().clamp(-radius, radius) as i32
    }

    fn index(&self, bucket: i32) -> Option<usize> {
        usize::try_from(bucket + self.radius_ms).ok()
    }

    /// Counts an error in milliseconds.
    pub fn add(&mut self, error_ms: f64) {
        let bucket = self.bucket_of(error_ms);
        if let Some(count) = self.index(bucket).and_then(|idx| self.counts.get_mut(idx)) {
            *count += 1;
        }
    }

    /// Empties every bucket.
    pub fn clear(&mut self) {
        self.counts.fill(0);
    }

    /// The count of a bucket, 0 outside the radius.
    #[must_use]
    pub fn count(&self, bucket: i32) -> u32 {
        self.index(bucket)
            .and_then(|idx| self.counts.get(idx))
            .copied()
            .unwrap_or(0)
    }

    /// Number of counted errors.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// `(bucket, count)` pairs from the most negative bucket.
    pub fn iter(&self) -> impl Iterator<Item = (i32, u32)> + '_ {
        (-self.radius_ms..).zip(self.counts.iter().copied())
    }

    /// The fullest bucket. Ties go to the bucket nearest 0, then to the earlier one.
    #[must_use]
    pub fn mode_ms(&self) -> Option<i32> {
        self.iter()
            .filter(|&(_, count)| count > 0)
            .max_by(|&(a, count_a), &(b, count_b)| {
                count_a
                    .cmp(&count_b)
                    .then_with(|| b.abs().cmp(&a.abs()))
                    .then_with(|| b.cmp(&a))
            })
            .map(|(bucket, _)| bucket)
    }

    /// Counts convolved with [`SMOOTHING_KERNEL`]. Taps falling outside the radius are dropped.
    #[must_use]
    pub fn smoothed(&self) -> Vec<(i32, f64)> {
        let half = (SMOOTHING_KERNEL.len() / 2) as i32;
        self.iter()
            .map(|(bucket, _)| {
                let value: f64 = (-half..=half)
                    .zip(SMOOTHING_KERNEL)
                    .map(|(shift, weight)| f64::from(self.count(bucket + shift)) * weight)
                    .sum();
                (bucket, value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn rounds_and_clamps_into_buckets() {
        let mut histogram = Histogram::new(10);
        histogram.add(2.4);
        histogram.add(2.6);
        histogram.add(-50.0);
        histogram.add(f64::NAN);
        assert_eq!(histogram.count(2), 1);
        assert_eq!(histogram.count(3), 1);
        assert_eq!(histogram.count(-10), 1);
        assert_eq!(histogram.count(0), 1);
        assert_eq!(histogram.count(11), 0);
        assert_eq!(histogram.total(), 4);
    }

    #[test]
    fn mode_prefers_buckets_near_zero() {
        let mut histogram = Histogram::new(10);
        assert_eq!(histogram.mode_ms(), None);
        for error in [-4.0, -4.0, 3.0, 3.0, 8.0] {
            histogram.add(error);
        }
        assert_eq!(histogram.mode_ms(), Some(3));
        histogram.add(-3.0);
        histogram.add(-3.0);
        assert_eq!(histogram.mode_ms(), Some(-3));
    }

    #[test]
    fn smoothing_spreads_a_spike() {
        let mut histogram = Histogram::new(5);
        histogram.add(0.0);
        let smoothed: Vec<f64> = histogram.smoothed().into_iter().map(|(_, v)| v).collect();
        assert_eq!(
            smoothed,
            vec![0.0, 0.0, 0.045, 0.09, 0.18, 0.37, 0.18, 0.09, 0.045, 0.0, 0.0]
        );
        let mut edge = Histogram::new(1);
        edge.add(1.0);
        let total: f64 = edge.smoothed().into_iter().map(|(_, v)| v).sum();
        assert!((total - (0.37 + 0.18 + 0.09)).abs() < 1e-12);
    }
}
