//! Scripted in-memory chain.

use async_trait::async_trait;
use blocktime_core::{
    chain::{ChainError, ChainQueryService},
    types::BlockSample,
};
use chrono::{DateTime, TimeDelta, Utc};
use std::{
    collections::{BTreeMap, HashSet},
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

/// Timestamp of the first scripted block.
#[must_use]
pub fn genesis_time() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default()
}

/// A [`ChainQueryService`] backed by a fixed block map.
///
/// Heights above the head or missing from the map return [`ChainError::NotFound`];
/// heights marked with [`InMemoryChain::failing_at`] return
/// [`ChainError::ConnectionFailed`].
#[derive(Debug, Default)]
pub struct InMemoryChain {
    blocks: BTreeMap<u64, BlockSample>,
    head: u64,
    failing: HashSet<u64>,
    head_unavailable: bool,
    latency: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    block_calls: AtomicUsize,
    height_calls: AtomicUsize,
}

impl InMemoryChain {
    #[must_use]
    pub fn from_samples(samples: Vec<BlockSample>) -> Self {
        let blocks: BTreeMap<u64, BlockSample> =
            samples.into_iter().map(|s| (s.height, s)).collect();
        let head = blocks.keys().next_back().copied().unwrap_or_default();
        Self { blocks, head, ..Self::default() }
    }

    /// Blocks from `first_height` on, where block `first_height + i + 1` arrives
    /// `intervals[i]` seconds after its parent. Proposer is `"validator-0"`.
    #[must_use]
    pub fn from_intervals(first_height: u64, intervals: &[f64]) -> Self {
        let mut at = genesis_time();
        let mut samples = vec![sample(first_height, at, "validator-0")];

        for (height, seconds) in (first_height + 1..).zip(intervals) {
            at += millis(*seconds);
            samples.push(sample(height, at, "validator-0"));
        }
        Self::from_samples(samples)
    }

    /// `count` blocks from `first_height` on, `seconds` apart.
    #[must_use]
    pub fn uniform(first_height: u64, count: usize, seconds: f64) -> Self {
        Self::from_intervals(first_height, &vec![seconds; count.saturating_sub(1)])
    }

    /// Rotates proposers over the blocks in height order.
    #[must_use]
    pub fn with_proposers(mut self, rotation: &[&str]) -> Self {
        if rotation.is_empty() {
            return self;
        }
        for (i, block) in self.blocks.values_mut().enumerate() {
            block.proposer = rotation[i % rotation.len()].to_string();
        }
        self
    }

    #[must_use]
    pub fn with_head(mut self, head: u64) -> Self {
        self.head = head;
        self
    }

    #[must_use]
    pub fn failing_at(mut self, height: u64) -> Self {
        self.failing.insert(height);
        self
    }

    /// Makes `current_height` fail.
    #[must_use]
    pub fn with_head_unavailable(mut self) -> Self {
        self.head_unavailable = true;
        self
    }

    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    #[must_use]
    pub fn head(&self) -> u64 {
        self.head
    }

    #[must_use]
    pub fn block(&self, height: u64) -> Option<&BlockSample> {
        self.blocks.get(&height)
    }

    /// `get_block` calls currently in progress.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of `get_block` calls observed in flight at once.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn block_calls(&self) -> usize {
        self.block_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn height_calls(&self) -> usize {
        self.height_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainQueryService for InMemoryChain {
    async fn current_height(&self) -> Result<u64, ChainError> {
        self.height_calls.fetch_add(1, Ordering::SeqCst);
        if self.head_unavailable {
            return Err(ChainError::ConnectionFailed("node unreachable".to_string()));
        }
        Ok(self.head)
    }

    async fn get_block(&self, height: u64) -> Result<BlockSample, ChainError> {
        self.block_calls.fetch_add(1, Ordering::SeqCst);

        let _guard = InFlight::enter(&self.in_flight, &self.max_in_flight);
        if self.latency.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.latency).await;
        }

        if self.failing.contains(&height) {
            return Err(ChainError::ConnectionFailed(format!("injected failure at {height}")));
        }
        if height > self.head {
            return Err(ChainError::NotFound { height });
        }
        self.blocks.get(&height).cloned().ok_or(ChainError::NotFound { height })
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(in_flight: &'a AtomicUsize, high_water: &AtomicUsize) -> Self {
        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        high_water.fetch_max(now, Ordering::SeqCst);
        Self(in_flight)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn sample(height: u64, timestamp: DateTime<Utc>, proposer: &str) -> BlockSample {
    BlockSample { height, timestamp, proposer: proposer.to_string(), tx_count: 0 }
}

#[allow(clippy::cast_possible_truncation)]
fn millis(seconds: f64) -> TimeDelta {
    TimeDelta::milliseconds((seconds * 1_000.0).round() as i64)
}
