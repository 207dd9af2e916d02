//! Block-time statistics over sampled height ranges.
//!
//! [`BlockTimeCalculator`] composes the pipeline
//!
//! ```text
//! current_height ─► RangeFetcher ─► DeltaSeries ─► clean ─► summarize ─► RangeEstimator
//! ```
//!
//! and assembles a fresh [`StatisticalSummary`] on every call. Nothing is cached.

use std::{collections::BTreeMap, sync::Arc};

use crate::{
    chain::ChainQueryService,
    config::CalculatorConfig,
    error::{CoreError, CoreResult},
    sampling::{BlockDelta, DeltaSeries, RangeFetcher, SampledRange},
    statistics::{clean, summarize, OutlierPolicy, RangeEstimator},
    types::{BlockSample, EstimatedRange, StatisticalSummary},
};

/// Proposers with fewer valid deltas than this are left out of proposer analysis.
pub const DEFAULT_PROPOSER_MIN_DELTAS: usize = 5;

/// Computes block-time summaries from live chain data.
#[derive(Clone)]
pub struct BlockTimeCalculator {
    chain: Arc<dyn ChainQueryService>,
    fetcher: RangeFetcher,
    config: CalculatorConfig,
}

impl BlockTimeCalculator {
    /// Creates a calculator with a default [`RangeFetcher`] over `chain`.
    ///
    /// `config` is expected to be validated already.
    #[must_use]
    pub fn new(chain: Arc<dyn ChainQueryService>, config: CalculatorConfig) -> Self {
        let fetcher = RangeFetcher::new(Arc::clone(&chain));
        Self { chain, fetcher, config }
    }

    /// Replaces the fetcher, e.g. to change the concurrency limit or attach a
    /// cancellation token.
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: RangeFetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    #[must_use]
    pub fn config(&self) -> &CalculatorConfig {
        &self.config
    }

    #[must_use]
    pub fn chain(&self) -> &Arc<dyn ChainQueryService> {
        &self.chain
    }

    /// Latest chain height.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Upstream`] if the node cannot be queried.
    pub async fn current_height(&self) -> CoreResult<u64> {
        self.chain
            .current_height()
            .await
            .map_err(|e| CoreError::upstream("current_height", None, e))
    }

    /// Summarises the most recent `sample_size` blocks.
    ///
    /// # Errors
    ///
    /// See [`BlockTimeCalculator::calculate_stats_for_range`].
    pub async fn calculate_stats(&self) -> CoreResult<StatisticalSummary> {
        let head = self.current_height().await?;
        self.calculate_stats_at(head).await
    }

    /// Summarises the `sample_size` blocks ending at `head`.
    ///
    /// # Errors
    ///
    /// See [`BlockTimeCalculator::calculate_stats_for_range`].
    pub async fn calculate_stats_at(&self, head: u64) -> CoreResult<StatisticalSummary> {
        let (start, end) = recent_range(head, self.config.sample_size);
        self.calculate_stats_for_range(start, end).await
    }

    /// Summarises block times in `start..=end`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidRange`] for an empty or zero-based range
    /// - [`CoreError::InsufficientSample`] if the range, or the number of valid
    ///   deltas fetched from it, is below `min_sample_size`
    /// - [`CoreError::Upstream`] / [`CoreError::Cancelled`] from the fetch
    pub async fn calculate_stats_for_range(
        &self,
        start: u64,
        end: u64,
    ) -> CoreResult<StatisticalSummary> {
        if start == 0 || start > end {
            return Err(CoreError::InvalidRange { start, end });
        }

        let span = usize::try_from(end - start + 1).unwrap_or(usize::MAX);
        if span < self.config.min_sample_size {
            return Err(CoreError::InsufficientSample {
                actual: span,
                required: self.config.min_sample_size,
            });
        }

        let range = self.fetcher.fetch_range(start, end).await?;
        self.summarize_range(&range)
    }

    /// Builds a summary from an already fetched range.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InsufficientSample`] if the range holds fewer valid
    /// deltas than `min_sample_size`.
    pub fn summarize_range(&self, range: &SampledRange) -> CoreResult<StatisticalSummary> {
        let (Some(first), Some(last)) = (range.samples.first(), range.samples.last()) else {
            return Err(CoreError::InsufficientSample {
                actual: 0,
                required: self.config.min_sample_size,
            });
        };

        let valid = range.deltas.len();
        if valid < self.config.min_sample_size {
            return Err(CoreError::InsufficientSample {
                actual: valid,
                required: self.config.min_sample_size,
            });
        }

        let cleaned = clean(&range.deltas.values(), &OutlierPolicy::from(&self.config));
        let stats = summarize(&cleaned.values);
        let estimated_range =
            RangeEstimator::new(self.config.confidence_level).estimate(&cleaned.values, &stats);

        tracing::debug!(
            start = first.height,
            end = last.height,
            valid_deltas = valid,
            outliers = cleaned.outlier_count,
            median = stats.median,
            "block time summary computed"
        );

        Ok(StatisticalSummary {
            sample_size: valid,
            start_height: first.height,
            end_height: last.height,
            start_time: first.timestamp,
            end_time: last.timestamp,
            stats,
            outlier_count: cleaned.outlier_count,
            estimated_range,
            confidence_level: self.config.confidence_level,
        })
    }

    /// Per-proposer summaries of height-ascending `samples`.
    ///
    /// Each delta is attributed to the proposer of the later block. Proposers with
    /// fewer than `min_deltas` valid deltas are omitted. Groups are cleaned and
    /// summarised but not range-estimated, so `estimated_range` is zero.
    #[must_use]
    pub fn analyze_proposers(
        &self,
        samples: &[BlockSample],
        min_deltas: usize,
    ) -> BTreeMap<String, StatisticalSummary> {
        let series = DeltaSeries::from_samples(samples);
        let policy = OutlierPolicy::from(&self.config);

        let summaries: BTreeMap<String, StatisticalSummary> = series
            .by_proposer()
            .into_iter()
            .filter(|(_, deltas)| deltas.len() >= min_deltas)
            .filter_map(|(proposer, deltas)| {
                self.proposer_summary(&deltas, &policy).map(|s| (proposer.to_string(), s))
            })
            .collect();
        summaries
    }

    /// Fetches the most recent `sample_size` blocks and runs
    /// [`BlockTimeCalculator::analyze_proposers`] on them.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Upstream`] or [`CoreError::Cancelled`] if fetching fails.
    pub async fn analyze_recent_proposers(
        &self,
        sample_size: usize,
        min_deltas: usize,
    ) -> CoreResult<BTreeMap<String, StatisticalSummary>> {
        let head = self.current_height().await?;
        let (start, end) = recent_range(head, sample_size);
        let samples = self.fetcher.fetch(start, end).await?;

        let proposers = self.analyze_proposers(&samples, min_deltas);
        tracing::debug!(start, end, proposers = proposers.len(), "proposer analysis finished");
        Ok(proposers)
    }

    fn proposer_summary(
        &self,
        deltas: &[&BlockDelta],
        policy: &OutlierPolicy,
    ) -> Option<StatisticalSummary> {
        let (first, last) = (deltas.first()?, deltas.last()?);
        let values: Vec<f64> = deltas.iter().map(|d| d.seconds).collect();
        let cleaned = clean(&values, policy);

        Some(StatisticalSummary {
            sample_size: values.len(),
            start_height: first.height,
            end_height: last.height,
            start_time: first.timestamp,
            end_time: last.timestamp,
            stats: summarize(&cleaned.values),
            outlier_count: cleaned.outlier_count,
            estimated_range: EstimatedRange::default(),
            confidence_level: self.config.confidence_level,
        })
    }
}

/// `[max(1, head - sample_size + 1), head]`.
fn recent_range(head: u64, sample_size: usize) -> (u64, u64) {
    let span = u64::try_from(sample_size).unwrap_or(u64::MAX);
    let start = head.saturating_sub(span.saturating_sub(1)).max(1);
    (start, head.max(1))
}
