//! Arrival-time projection for future heights.
//!
//! Every prediction takes a fresh head height and a fresh [`StatisticalSummary`],
//! then projects forward from the local wall clock captured at call time (not
//! from the head block's own timestamp). Local clock skew against the chain
//! therefore shows up directly in the estimates; `current_block_age` reports
//! how stale the head block looked at that instant.

use chrono::{DateTime, TimeDelta, Utc};
use std::{sync::Arc, time::Duration};

use crate::{
    calculator::BlockTimeCalculator,
    error::{CoreError, CoreResult},
    types::{
        BlockMilestone, BlockSample, DurationEstimate, MultiBlockPrediction, Prediction,
        StatisticalSummary,
    },
};

/// Source of "now" for projections.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Projects block arrival times using a [`BlockTimeCalculator`].
#[derive(Clone)]
pub struct Predictor {
    calculator: BlockTimeCalculator,
    clock: Clock,
}

impl Predictor {
    #[must_use]
    pub fn new(calculator: BlockTimeCalculator) -> Self {
        Self { calculator, clock: Arc::new(Utc::now) }
    }

    /// Replaces the wall clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn calculator(&self) -> &BlockTimeCalculator {
        &self.calculator
    }

    /// Predicts when `target_height` will be produced.
    ///
    /// A target at or below the current head is answered with the real block
    /// timestamp and `is_complete` set.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Upstream`] if the head, the target or the head block cannot be fetched
    /// - any [`BlockTimeCalculator::calculate_stats`] error
    /// - [`CoreError::InvalidArgument`] if a projected instant is out of range
    pub async fn predict_height(&self, target_height: u64) -> CoreResult<Prediction> {
        let current_height = self.calculator.current_height().await?;

        if target_height <= current_height {
            let block = self.get_block(target_height).await?;
            tracing::debug!(target_height, current_height, "target height already produced");
            return Ok(Prediction::completed(&block, current_height));
        }

        let summary = self.calculator.calculate_stats_at(current_height).await?;
        let (now, current_block_age) = self.anchor(current_height).await?;
        let blocks_left = target_height - current_height;
        let range = summary.estimated_range;

        let (estimated_time, typical) = project(now, blocks_left, range.typical)?;
        let (optimistic_time, min) = project(now, blocks_left, range.lower)?;
        let (pessimistic_time, max) = project(now, blocks_left, range.upper)?;

        tracing::info!(
            target_height,
            current_height,
            blocks_left,
            typical_secs = typical.as_secs(),
            "block arrival predicted"
        );

        Ok(Prediction {
            target_height,
            current_height,
            blocks_left,
            is_complete: false,
            actual_time: None,
            current_time: Some(now),
            current_block_age,
            estimated_time: Some(estimated_time),
            optimistic_time: Some(optimistic_time),
            pessimistic_time: Some(pessimistic_time),
            duration: Some(DurationEstimate { typical, min, max }),
            summary: Some(summary),
        })
    }

    /// Predicts arrival times of the next `count` heights.
    ///
    /// Milestone `i` is projected as `now + i * typical`, independently of the
    /// others.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidArgument`] if `count` is zero or a projection overflows
    /// - [`CoreError::Upstream`] / calculator errors as for
    ///   [`Predictor::predict_height`]
    pub async fn predict_next(&self, count: u64) -> CoreResult<MultiBlockPrediction> {
        if count == 0 {
            return Err(CoreError::InvalidArgument("count must be positive".to_string()));
        }

        let current_height = self.calculator.current_height().await?;
        let summary = self.calculator.calculate_stats_at(current_height).await?;
        let (now, current_block_age) = self.anchor(current_height).await?;

        let predictions = milestones(now, current_height, count, &summary)?;

        tracing::info!(current_height, count, "next block arrivals predicted");

        Ok(MultiBlockPrediction {
            current_height,
            current_time: now,
            current_block_age,
            predictions,
            summary,
        })
    }

    /// Captures "now" and the head block's age relative to it.
    async fn anchor(&self, current_height: u64) -> CoreResult<(DateTime<Utc>, Option<Duration>)> {
        let head = self.get_block(current_height).await?;
        let now = (self.clock)();
        // Negative when the chain clock runs ahead of ours.
        let age = (now - head.timestamp).to_std().ok();
        Ok((now, age))
    }

    async fn get_block(&self, height: u64) -> CoreResult<BlockSample> {
        self.calculator
            .chain()
            .get_block(height)
            .await
            .map_err(|e| CoreError::upstream("get_block", Some(height), e))
    }
}

fn milestones(
    now: DateTime<Utc>,
    current_height: u64,
    count: u64,
    summary: &StatisticalSummary,
) -> CoreResult<Vec<BlockMilestone>> {
    (1..=count)
        .map(|blocks_from_now| {
            let height = current_height.checked_add(blocks_from_now).ok_or_else(|| {
                CoreError::InvalidArgument(format!("height overflow past {current_height}"))
            })?;
            let (estimated_time, duration) =
                project(now, blocks_from_now, summary.estimated_range.typical)?;
            Ok(BlockMilestone { height, blocks_from_now, estimated_time, duration })
        })
        .collect()
}

/// `now + blocks * seconds_per_block`.
#[allow(clippy::cast_precision_loss)]
fn project(
    now: DateTime<Utc>,
    blocks: u64,
    seconds_per_block: f64,
) -> CoreResult<(DateTime<Utc>, Duration)> {
    let out_of_range = || {
        CoreError::InvalidArgument(format!(
            "projection of {blocks} blocks at {seconds_per_block}s is out of range"
        ))
    };

    let duration =
        Duration::try_from_secs_f64(blocks as f64 * seconds_per_block).map_err(|_| out_of_range())?;
    let offset = TimeDelta::from_std(duration).map_err(|_| out_of_range())?;
    let at = now.checked_add_signed(offset).ok_or_else(out_of_range)?;
    Ok((at, duration))
}
