//! Range fetching: bounded concurrency, ordering, fail-fast and cancellation.

use crate::mock_infrastructure::InMemoryChain;
use blocktime_core::{chain::ChainError, sampling::RangeFetcher, CoreError};
use std::{sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;

fn fetcher(chain: &Arc<InMemoryChain>, max_concurrent: usize) -> RangeFetcher {
    RangeFetcher::new(Arc::clone(chain) as _).with_max_concurrent(max_concurrent)
}

#[tokio::test]
async fn test_in_flight_requests_never_exceed_limit() {
    let chain =
        Arc::new(InMemoryChain::uniform(1, 60, 6.0).with_latency(Duration::from_millis(5)));

    let samples = fetcher(&chain, 4).fetch(1, 60).await.unwrap();

    assert_eq!(samples.len(), 60);
    assert!(chain.max_in_flight() <= 4, "saw {} in flight", chain.max_in_flight());
    assert!(chain.max_in_flight() > 1, "requests were never overlapped");
    assert_eq!(chain.block_calls(), 60);
}

#[tokio::test]
async fn test_limit_of_one_is_sequential() {
    let chain = Arc::new(InMemoryChain::uniform(1, 20, 6.0));

    fetcher(&chain, 1).fetch(5, 20).await.unwrap();

    assert_eq!(chain.max_in_flight(), 1);
    assert_eq!(chain.block_calls(), 16);
}

#[tokio::test]
async fn test_samples_sorted_by_height() {
    let chain = Arc::new(InMemoryChain::uniform(1, 200, 6.0));

    let samples = fetcher(&chain, 16).fetch(50, 150).await.unwrap();

    let heights: Vec<u64> = samples.iter().map(|s| s.height).collect();
    assert_eq!(heights, (50..=150).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_single_height_range() {
    let chain = Arc::new(InMemoryChain::uniform(1, 10, 6.0));

    let range = fetcher(&chain, 10).fetch_range(7, 7).await.unwrap();

    assert_eq!(range.samples.len(), 1);
    assert!(range.deltas.is_empty());
}

#[tokio::test]
async fn test_first_failure_aborts_without_partial_result() {
    let chain = Arc::new(
        InMemoryChain::uniform(1, 500, 6.0)
            .failing_at(3)
            .with_latency(Duration::from_millis(20)),
    );

    let err = fetcher(&chain, 4).fetch(1, 500).await.unwrap_err();

    // Requests admitted alongside the failing one were joined, not abandoned.
    assert_eq!(chain.in_flight(), 0);

    match err {
        CoreError::Upstream { operation, height, source } => {
            assert_eq!(operation, "get_block");
            assert_eq!(height, Some(3));
            assert!(matches!(source, ChainError::ConnectionFailed(_)));
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
    assert!(chain.block_calls() < 500, "admission continued after the failure");
}

#[tokio::test]
async fn test_height_beyond_head_is_not_found() {
    let chain = Arc::new(InMemoryChain::uniform(1, 10, 6.0));

    let err = fetcher(&chain, 4).fetch(8, 12).await.unwrap_err();

    assert!(matches!(err.chain_error(), Some(ChainError::NotFound { .. })));
}

#[tokio::test]
async fn test_invalid_range_makes_no_requests() {
    let chain = Arc::new(InMemoryChain::uniform(1, 10, 6.0));
    let fetcher = fetcher(&chain, 4);

    assert!(matches!(
        fetcher.fetch(9, 3).await,
        Err(CoreError::InvalidRange { start: 9, end: 3 })
    ));
    assert!(matches!(fetcher.fetch(0, 3).await, Err(CoreError::InvalidRange { .. })));
    assert_eq!(chain.block_calls(), 0);
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let chain = Arc::new(InMemoryChain::uniform(1, 100, 6.0));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = fetcher(&chain, 4).with_cancellation(cancel).fetch(1, 100).await;

    assert!(matches!(result, Err(CoreError::Cancelled)));
    assert_eq!(chain.block_calls(), 0);
}

#[tokio::test]
async fn test_cancelled_mid_range() {
    let chain =
        Arc::new(InMemoryChain::uniform(1, 1_000, 6.0).with_latency(Duration::from_millis(10)));
    let cancel = CancellationToken::new();
    let fetcher = fetcher(&chain, 2).with_cancellation(cancel.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
    });

    let result = fetcher.fetch(1, 1_000).await;
    assert_eq!(chain.in_flight(), 0);
    let calls_at_return = chain.block_calls();
    canceller.await.unwrap();

    assert!(matches!(result, Err(CoreError::Cancelled)));
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(chain.block_calls(), calls_at_return);
    assert!(chain.block_calls() > 0);
    assert!(chain.block_calls() < 1_000);
}
