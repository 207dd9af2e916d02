//! Calculator pipeline and proposer analysis against an in-memory chain.

use crate::mock_infrastructure::InMemoryChain;
use blocktime_core::{
    calculator::BlockTimeCalculator, config::CalculatorConfig, types::EstimatedRange, CoreError,
};
use std::sync::Arc;

fn calculator(chain: &Arc<InMemoryChain>, sample_size: usize) -> BlockTimeCalculator {
    let config = CalculatorConfig { sample_size, ..CalculatorConfig::default() };
    BlockTimeCalculator::new(Arc::clone(chain) as _, config)
}

/// 99 intervals cycling 5.0..=7.0 with a single 60s stall at index 50.
fn noisy_intervals() -> Vec<f64> {
    const CYCLE: [f64; 5] = [5.0, 5.5, 6.0, 6.5, 7.0];
    let mut intervals: Vec<f64> = (0..99).map(|i| CYCLE[i % CYCLE.len()]).collect();
    intervals[50] = 60.0;
    intervals
}

#[tokio::test]
#[allow(clippy::float_cmp)]
async fn test_recent_window_summary() {
    let chain = Arc::new(InMemoryChain::uniform(1, 300, 6.0));

    let summary = calculator(&chain, 100).calculate_stats().await.unwrap();

    assert_eq!((summary.start_height, summary.end_height), (201, 300));
    assert_eq!(summary.sample_size, 99);
    assert_eq!(summary.stats.mean, 6.0);
    assert_eq!(summary.stats.median, 6.0);
    assert_eq!(summary.stats.std_dev, 0.0);
    assert_eq!(summary.estimated_range, EstimatedRange { lower: 6.0, upper: 6.0, typical: 6.0 });
    assert_eq!(summary.start_time, chain.block(201).unwrap().timestamp);
    assert_eq!(summary.end_time, chain.block(300).unwrap().timestamp);
    assert_eq!(chain.block_calls(), 100);
}

#[tokio::test]
#[allow(clippy::float_cmp)]
async fn test_stall_is_removed_as_outlier() {
    let chain = Arc::new(InMemoryChain::from_intervals(1, &noisy_intervals()));

    let summary = calculator(&chain, 100).calculate_stats_for_range(1, 100).await.unwrap();

    assert_eq!(summary.sample_size, 99);
    assert!(summary.outlier_count >= 1);
    assert!(summary.stats.max <= 7.0, "stall survived cleaning: {}", summary.stats.max);
    assert!(summary.stats.min >= 5.0);
    assert_eq!(summary.estimated_range.typical, 6.0);
    assert!(summary.estimated_range.lower >= 0.0);
    assert!(summary.estimated_range.lower <= summary.estimated_range.upper);
}

#[tokio::test]
async fn test_repeated_calls_are_identical() {
    let chain = Arc::new(InMemoryChain::from_intervals(1, &noisy_intervals()));
    let calculator = calculator(&chain, 100);

    let first = calculator.calculate_stats().await.unwrap();
    let second = calculator.calculate_stats().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(chain.height_calls(), 2);
}

#[tokio::test]
async fn test_duplicate_timestamps_reduce_valid_sample() {
    let mut intervals = vec![6.0; 39];
    for zero in intervals.iter_mut().step_by(4).take(10) {
        *zero = 0.0;
    }
    let chain = Arc::new(InMemoryChain::from_intervals(1, &intervals));

    let err = calculator(&chain, 40).calculate_stats().await.unwrap_err();

    assert!(matches!(err, CoreError::InsufficientSample { actual: 29, required: 30 }));
}

#[tokio::test]
async fn test_window_equal_to_minimum_never_summarizes() {
    let chain = Arc::new(InMemoryChain::uniform(1, 100, 6.0));

    let err = calculator(&chain, 30).calculate_stats().await.unwrap_err();

    // 30 blocks give 29 deltas.
    assert!(matches!(err, CoreError::InsufficientSample { actual: 29, required: 30 }));
    assert_eq!(chain.block_calls(), 30);
}

#[tokio::test]
async fn test_short_range_fails_before_fetching() {
    let chain = Arc::new(InMemoryChain::uniform(1, 100, 6.0));

    let err = calculator(&chain, 100).calculate_stats_for_range(1, 10).await.unwrap_err();

    assert!(matches!(err, CoreError::InsufficientSample { actual: 10, required: 30 }));
    assert_eq!(chain.block_calls(), 0);
}

#[tokio::test]
async fn test_inverted_range_is_rejected() {
    let chain = Arc::new(InMemoryChain::uniform(1, 100, 6.0));

    let err = calculator(&chain, 100).calculate_stats_for_range(90, 10).await.unwrap_err();

    assert!(matches!(err, CoreError::InvalidRange { start: 90, end: 10 }));
    assert_eq!(chain.block_calls(), 0);
}

#[tokio::test]
async fn test_head_failure_is_reported_as_upstream() {
    let chain = Arc::new(InMemoryChain::uniform(1, 100, 6.0).with_head_unavailable());

    let err = calculator(&chain, 50).calculate_stats().await.unwrap_err();

    assert!(matches!(err, CoreError::Upstream { operation: "current_height", height: None, .. }));
    assert_eq!(chain.block_calls(), 0);
}

#[tokio::test]
async fn test_block_failure_carries_height() {
    let chain = Arc::new(InMemoryChain::uniform(1, 100, 6.0).failing_at(77));

    let err = calculator(&chain, 50).calculate_stats().await.unwrap_err();

    assert!(matches!(err, CoreError::Upstream { operation: "get_block", height: Some(77), .. }));
    assert!(err.to_string().contains("at height 77"));
}

#[tokio::test]
#[allow(clippy::float_cmp)]
async fn test_proposer_analysis_groups_by_later_block() {
    let chain = Arc::new(InMemoryChain::uniform(1, 31, 6.0).with_proposers(&["A", "B", "C"]));
    let calculator = calculator(&chain, 100);

    let proposers = calculator.analyze_recent_proposers(31, 5).await.unwrap();

    assert_eq!(proposers.keys().collect::<Vec<_>>(), vec!["A", "B", "C"]);
    for summary in proposers.values() {
        assert_eq!(summary.sample_size, 10);
        assert_eq!(summary.stats.mean, 6.0);
        assert_eq!(summary.estimated_range, EstimatedRange::default());
    }
    // Block 2 is the first attributed delta and was proposed by "B".
    assert_eq!(proposers["B"].start_height, 2);
    assert_eq!(proposers["A"].end_height, 31);
}

#[tokio::test]
async fn test_proposers_below_minimum_are_omitted() {
    let chain = Arc::new(InMemoryChain::uniform(1, 31, 6.0).with_proposers(&["A", "B", "C"]));

    let proposers = calculator(&chain, 100).analyze_recent_proposers(31, 11).await.unwrap();

    assert!(proposers.is_empty());
}
