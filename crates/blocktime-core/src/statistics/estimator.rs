use crate::types::{DescriptiveStats, EstimatedRange};

/// Confidence level at which no narrowing is applied.
const FULL_CONFIDENCE: f64 = 0.95;

/// Turns the statistics of a cleaned delta series into an [`EstimatedRange`].
///
/// The interval is `[max(p25 - iqr/2, min), min(p75 + iqr/2, p95)]` around the
/// median. Confidence levels below 0.95 shrink both bounds toward the centre by
/// the same amount. `lower` is clamped at zero; the ordering
/// `lower <= typical <= upper` is not enforced after narrowing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeEstimator {
    confidence_level: f64,
}

impl RangeEstimator {
    #[must_use]
    pub fn new(confidence_level: f64) -> Self {
        Self { confidence_level }
    }

    #[must_use]
    pub fn confidence_level(&self) -> f64 {
        self.confidence_level
    }

    /// Estimates the block-time range. An empty `cleaned` series yields a zero range.
    #[must_use]
    pub fn estimate(&self, cleaned: &[f64], stats: &DescriptiveStats) -> EstimatedRange {
        if cleaned.is_empty() {
            return EstimatedRange::default();
        }

        let iqr = stats.iqr();
        let mut lower = (stats.p25 - 0.5 * iqr).max(stats.min);
        let mut upper = (stats.p75 + 0.5 * iqr).min(stats.p95);

        if self.confidence_level < FULL_CONFIDENCE {
            let factor = self.confidence_level / FULL_CONFIDENCE;
            let adjustment = (upper - lower) * (1.0 - factor) / 2.0;
            lower += adjustment;
            upper -= adjustment;
        }

        EstimatedRange { lower: lower.max(0.0), upper, typical: stats.median }
    }
}
