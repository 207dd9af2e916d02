//! Block range sampling.
//!
//! [`RangeFetcher`] pulls a contiguous span of blocks through a
//! [`ChainQueryService`](crate::chain::ChainQueryService) with bounded
//! concurrency; [`DeltaSeries`] turns the height-ordered samples into
//! block-time deltas.

pub mod delta;
pub mod fetcher;

pub use delta::{BlockDelta, DeltaSeries};
pub use fetcher::{RangeFetcher, DEFAULT_MAX_CONCURRENT};

use crate::types::BlockSample;

/// A fetched height range together with its delta series.
#[derive(Debug, Clone, Default)]
pub struct SampledRange {
    /// Height-ascending samples.
    pub samples: Vec<BlockSample>,
    pub deltas: DeltaSeries,
}
