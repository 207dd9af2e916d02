//! Core data model for block-time sampling and prediction.
//!
//! # Type Categories
//!
//! ## Chain observations
//! - [`BlockSample`]: one block as reported by the chain node
//!
//! ## Derived statistics
//! - [`DescriptiveStats`]: location, spread and percentiles of a delta series
//! - [`EstimatedRange`]: confidence-adjusted block-time interval
//! - [`StatisticalSummary`]: everything above plus sample provenance
//!
//! ## Projections
//! - [`Prediction`], [`DurationEstimate`]: arrival estimate for one target height
//! - [`MultiBlockPrediction`], [`BlockMilestone`]: arrival estimates for the next N heights
//!
//! Every value here is built fresh per call and never mutated afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A single block as observed through a [`ChainQueryService`](crate::chain::ChainQueryService).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSample {
    pub height: u64,
    pub timestamp: DateTime<Utc>,
    /// Proposer address as reported by the node (hex for CometBFT).
    pub proposer: String,
    pub tx_count: u64,
}

/// Location, spread and percentile statistics of a series of block times, in seconds.
///
/// `std_dev` is the population standard deviation. A zero-valued instance is
/// returned for an empty series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveStats {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub p25: f64,
    pub p75: f64,
    pub p95: f64,
    pub p99: f64,
}

impl DescriptiveStats {
    /// Interquartile range (`p75 - p25`).
    #[must_use]
    pub fn iqr(&self) -> f64 {
        self.p75 - self.p25
    }
}

/// Estimated block-time interval in seconds.
///
/// `lower` is never negative. The ordering `lower <= typical <= upper` is expected
/// but not forced after confidence narrowing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EstimatedRange {
    pub lower: f64,
    pub upper: f64,
    /// Median block time.
    pub typical: f64,
}

/// Statistical summary of a sampled height range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalSummary {
    /// Number of valid (strictly positive) deltas before outlier removal.
    pub sample_size: usize,
    pub start_height: u64,
    pub end_height: u64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Computed on the cleaned series.
    #[serde(flatten)]
    pub stats: DescriptiveStats,
    /// Cumulative removal events: filter drops plus symmetric trims.
    pub outlier_count: usize,
    pub estimated_range: EstimatedRange,
    pub confidence_level: f64,
}

/// Optimistic, typical and pessimistic time-to-arrival.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationEstimate {
    pub typical: Duration,
    pub min: Duration,
    pub max: Duration,
}

/// Arrival prediction for a single target height.
///
/// When `is_complete` is set the target already exists: `actual_time` carries its
/// real timestamp and every forward-looking field is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub target_height: u64,
    pub current_height: u64,
    pub blocks_left: u64,
    pub is_complete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_time: Option<DateTime<Utc>>,
    /// Wall-clock instant all projections are anchored to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_block_age: Option<Duration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimistic_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pessimistic_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<DurationEstimate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<StatisticalSummary>,
}

impl Prediction {
    /// Builds a completed prediction for a height that already exists.
    #[must_use]
    pub fn completed(target: &BlockSample, current_height: u64) -> Self {
        Self {
            target_height: target.height,
            current_height,
            blocks_left: 0,
            is_complete: true,
            actual_time: Some(target.timestamp),
            current_time: None,
            current_block_age: None,
            estimated_time: None,
            optimistic_time: None,
            pessimistic_time: None,
            duration: None,
            summary: None,
        }
    }
}

/// Projected arrival of one future height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMilestone {
    pub height: u64,
    pub blocks_from_now: u64,
    pub estimated_time: DateTime<Utc>,
    pub duration: Duration,
}

/// Projected arrivals for the next N heights, each anchored to the same `current_time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiBlockPrediction {
    pub current_height: u64,
    pub current_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_block_age: Option<Duration>,
    pub predictions: Vec<BlockMilestone>,
    pub summary: StatisticalSummary,
}
