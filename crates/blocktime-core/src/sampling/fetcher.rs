use std::{
    sync::{Arc, OnceLock},
    time::Instant,
};
use tokio::{
    sync::{mpsc, Semaphore},
    task::JoinSet,
};
use tokio_util::sync::CancellationToken;

use super::{delta::DeltaSeries, SampledRange};
use crate::{
    chain::ChainQueryService,
    error::{CoreError, CoreResult},
    types::BlockSample,
};

/// Default number of block requests in flight at once.
pub const DEFAULT_MAX_CONCURRENT: usize = 10;

/// Fetches contiguous height ranges with bounded concurrency.
///
/// One task is spawned per height, each admitted through a semaphore so at most
/// `max_concurrent` requests are in flight. The first failure wins a single-slot
/// error cell; no new tasks are admitted after it is set, every admitted task is
/// joined, and the error is returned with no partial result.
///
/// Cancellation is observed only while admitting tasks. Tasks that already hold
/// a permit run to completion.
#[derive(Clone)]
pub struct RangeFetcher {
    chain: Arc<dyn ChainQueryService>,
    max_concurrent: usize,
    cancel: CancellationToken,
}

impl RangeFetcher {
    #[must_use]
    pub fn new(chain: Arc<dyn ChainQueryService>) -> Self {
        Self { chain, max_concurrent: DEFAULT_MAX_CONCURRENT, cancel: CancellationToken::new() }
    }

    /// Sets the in-flight limit. Values below 1 are raised to 1.
    #[must_use]
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Fetches every block in `start..=end`, sorted by ascending height.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidRange`] if `start` is zero or greater than `end`; no
    ///   request is made
    /// - [`CoreError::Upstream`] with the first failing height
    /// - [`CoreError::Cancelled`] if cancellation stopped admission before every
    ///   height was scheduled
    pub async fn fetch(&self, start: u64, end: u64) -> CoreResult<Vec<BlockSample>> {
        if start == 0 || start > end {
            return Err(CoreError::InvalidRange { start, end });
        }

        let started = Instant::now();
        tracing::debug!(start, end, max_concurrent = self.max_concurrent, "fetching block range");

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let first_error: Arc<OnceLock<CoreError>> = Arc::new(OnceLock::new());
        let (tx, mut rx) = mpsc::unbounded_channel::<BlockSample>();
        let mut tasks = JoinSet::new();
        let mut cancelled = false;

        for height in start..=end {
            let permit = tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    cancelled = true;
                    break;
                }
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    // The semaphore is owned here and never closed.
                    Err(_) => break,
                },
            };

            if first_error.get().is_some() {
                break;
            }

            let chain = Arc::clone(&self.chain);
            let first_error = Arc::clone(&first_error);
            let tx = tx.clone();
            tasks.spawn(async move {
                let _permit = permit;
                match chain.get_block(height).await {
                    Ok(sample) => {
                        // The receiver outlives every task.
                        let _ = tx.send(sample);
                    }
                    Err(e) => {
                        tracing::warn!(height, error = %e, "block fetch failed");
                        let _ = first_error.set(CoreError::upstream("get_block", Some(height), e));
                    }
                }
            });
        }
        drop(tx);

        let admitted = tasks.len();
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                if e.is_panic() {
                    std::panic::resume_unwind(e.into_panic());
                }
            }
        }

        // Every task has been joined, so this is the last reference.
        if let Some(error) = Arc::into_inner(first_error).and_then(OnceLock::into_inner) {
            tracing::debug!(start, end, admitted, error = %error, "block range fetch failed");
            return Err(error);
        }
        if cancelled {
            tracing::debug!(start, end, admitted, "block range fetch cancelled");
            return Err(CoreError::Cancelled);
        }

        let mut samples = Vec::with_capacity(admitted);
        while let Some(sample) = rx.recv().await {
            samples.push(sample);
        }
        samples.sort_unstable_by_key(|s| s.height);

        tracing::debug!(
            start,
            end,
            fetched = samples.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "block range fetched"
        );
        Ok(samples)
    }

    /// Fetches `start..=end` and derives its delta series.
    ///
    /// # Errors
    ///
    /// Same as [`RangeFetcher::fetch`].
    pub async fn fetch_range(&self, start: u64, end: u64) -> CoreResult<SampledRange> {
        let samples = self.fetch(start, end).await?;
        let deltas = DeltaSeries::from_samples(&samples);
        Ok(SampledRange { samples, deltas })
    }
}
