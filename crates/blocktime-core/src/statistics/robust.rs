//! Outlier removal and descriptive summaries.
//!
//! Two interchangeable filters are supported:
//!
//! - **MAD** (default): modified z-score `0.6745 * (x - median) / MAD`, keeping
//!   `|z| <= 3.5`, followed by symmetric trimming of the survivors. A zero MAD
//!   falls back to the IQR filter without trimming.
//! - **IQR**: keeps values inside `[p25 - t * IQR, p75 + t * IQR]`.
//!
//! Series of three values or fewer are returned unchanged.
//!
//! `outlier_count` is cumulative: every filter drop and every trimmed element
//! counts once, so a summary can report more outliers than a single filter pass
//! would have removed.

use super::percentile::{percentile, sorted};
use crate::{config::CalculatorConfig, types::DescriptiveStats};

/// Scale factor that makes the MAD consistent with the standard deviation.
const MODIFIED_Z_SCALE: f64 = 0.6745;

/// Values with a larger absolute modified z-score are dropped.
const MODIFIED_Z_CUTOFF: f64 = 3.5;

/// Series at or below this length skip outlier removal.
const MIN_FILTER_LEN: usize = 3;

/// Trimming only applies when more survivors than this remain.
const MIN_TRIM_LEN: usize = 10;

/// Outlier-removal parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierPolicy {
    pub use_median_absolute: bool,
    /// IQR fence multiplier.
    pub outlier_threshold: f64,
    /// Fraction trimmed from each end after MAD filtering.
    pub trim_percent: f64,
}

impl Default for OutlierPolicy {
    fn default() -> Self {
        Self::from(&CalculatorConfig::default())
    }
}

impl From<&CalculatorConfig> for OutlierPolicy {
    fn from(config: &CalculatorConfig) -> Self {
        Self {
            use_median_absolute: config.use_median_absolute,
            outlier_threshold: config.outlier_threshold,
            trim_percent: config.trim_percent,
        }
    }
}

/// Result of [`clean`].
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedSeries {
    pub values: Vec<f64>,
    pub outlier_count: usize,
}

impl CleanedSeries {
    fn unchanged(values: &[f64]) -> Self {
        Self { values: values.to_vec(), outlier_count: 0 }
    }
}

/// Removes outliers from `deltas` according to `policy`.
///
/// The MAD filter preserves input order (unless trimming sorts the survivors);
/// the IQR filter returns values in ascending order.
#[must_use]
pub fn clean(deltas: &[f64], policy: &OutlierPolicy) -> CleanedSeries {
    if deltas.len() <= MIN_FILTER_LEN {
        return CleanedSeries::unchanged(deltas);
    }

    let cleaned = if policy.use_median_absolute {
        mad_filter(deltas, policy)
    } else {
        iqr_filter(deltas, policy.outlier_threshold)
    };

    tracing::trace!(
        input = deltas.len(),
        kept = cleaned.values.len(),
        outliers = cleaned.outlier_count,
        "outlier removal finished"
    );
    cleaned
}

#[allow(clippy::float_cmp)]
fn mad_filter(deltas: &[f64], policy: &OutlierPolicy) -> CleanedSeries {
    let ordered = sorted(deltas);
    let median = percentile(&ordered, 0.5);

    let deviations: Vec<f64> = ordered.iter().map(|x| (x - median).abs()).collect();
    let mad = percentile(&sorted(&deviations), 0.5);

    if mad == 0.0 {
        tracing::trace!(median, "MAD is zero, falling back to IQR fences");
        return iqr_filter(deltas, policy.outlier_threshold);
    }

    let mut values: Vec<f64> = deltas
        .iter()
        .copied()
        .filter(|x| (MODIFIED_Z_SCALE * (x - median) / mad).abs() <= MODIFIED_Z_CUTOFF)
        .collect();
    let mut outlier_count = deltas.len() - values.len();

    if values.len() > MIN_TRIM_LEN && policy.trim_percent > 0.0 {
        let trim = trim_count(values.len(), policy.trim_percent);
        if trim > 0 {
            values.sort_unstable_by(f64::total_cmp);
            values = values[trim..values.len() - trim].to_vec();
            outlier_count += 2 * trim;
        }
    }

    CleanedSeries { values, outlier_count }
}

fn iqr_filter(deltas: &[f64], threshold: f64) -> CleanedSeries {
    let ordered = sorted(deltas);
    let q1 = percentile(&ordered, 0.25);
    let q3 = percentile(&ordered, 0.75);
    let iqr = q3 - q1;
    let (low, high) = (q1 - threshold * iqr, q3 + threshold * iqr);

    let values: Vec<f64> = ordered.into_iter().filter(|x| (low..=high).contains(x)).collect();
    let outlier_count = deltas.len() - values.len();

    CleanedSeries { values, outlier_count }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn trim_count(len: usize, trim_percent: f64) -> usize {
    // Never trims everything: trim_percent < 0.5 is validated upstream.
    ((len as f64 * trim_percent).floor() as usize).min((len - 1) / 2)
}

/// Descriptive statistics of `deltas`; population standard deviation.
///
/// Returns a zero-valued summary for an empty series.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summarize(deltas: &[f64]) -> DescriptiveStats {
    if deltas.is_empty() {
        return DescriptiveStats::default();
    }

    let ordered = sorted(deltas);
    let n = ordered.len() as f64;
    let mean = ordered.iter().sum::<f64>() / n;
    let variance = ordered.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;

    DescriptiveStats {
        mean,
        median: percentile(&ordered, 0.5),
        std_dev: variance.sqrt(),
        min: ordered[0],
        max: ordered[ordered.len() - 1],
        p25: percentile(&ordered, 0.25),
        p75: percentile(&ordered, 0.75),
        p95: percentile(&ordered, 0.95),
        p99: percentile(&ordered, 0.99),
    }
}
