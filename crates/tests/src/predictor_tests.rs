//! Predictions against an in-memory chain with a pinned clock.

use crate::mock_infrastructure::InMemoryChain;
use blocktime_core::{
    calculator::BlockTimeCalculator,
    config::CalculatorConfig,
    predictor::{Clock, Predictor},
    CoreError,
};
use chrono::{DateTime, TimeDelta, Utc};
use std::{sync::Arc, time::Duration};

fn predictor(chain: &Arc<InMemoryChain>, now: DateTime<Utc>) -> Predictor {
    let config = CalculatorConfig { sample_size: 50, ..CalculatorConfig::default() };
    let clock: Clock = Arc::new(move || now);
    Predictor::new(BlockTimeCalculator::new(Arc::clone(chain) as _, config)).with_clock(clock)
}

fn head_time(chain: &InMemoryChain) -> DateTime<Utc> {
    chain.block(chain.head()).map(|b| b.timestamp).unwrap()
}

#[tokio::test]
async fn test_target_at_head_is_complete() {
    let chain = Arc::new(InMemoryChain::uniform(1, 100, 6.0));
    let now = head_time(&chain) + TimeDelta::seconds(2);

    let prediction = predictor(&chain, now).predict_height(100).await.unwrap();

    assert!(prediction.is_complete);
    assert_eq!(prediction.blocks_left, 0);
    assert_eq!(prediction.current_height, 100);
    assert_eq!(prediction.actual_time, Some(head_time(&chain)));
    assert!(prediction.estimated_time.is_none());
    assert!(prediction.summary.is_none());
    // Only the target block is read; no statistics are gathered.
    assert_eq!(chain.block_calls(), 1);
}

#[tokio::test]
async fn test_past_target_reports_its_own_timestamp() {
    let chain = Arc::new(InMemoryChain::uniform(1, 100, 6.0));

    let prediction =
        predictor(&chain, head_time(&chain)).predict_height(40).await.unwrap();

    assert!(prediction.is_complete);
    assert_eq!(prediction.target_height, 40);
    assert_eq!(prediction.actual_time, chain.block(40).map(|b| b.timestamp));
}

#[tokio::test]
async fn test_next_three_blocks_from_now() {
    let chain = Arc::new(InMemoryChain::uniform(1, 100, 6.0));
    let now = head_time(&chain) + TimeDelta::seconds(4);

    let prediction = predictor(&chain, now).predict_next(3).await.unwrap();

    assert_eq!(prediction.current_height, 100);
    assert_eq!(prediction.current_time, now);
    assert_eq!(prediction.current_block_age, Some(Duration::from_secs(4)));
    assert!((prediction.summary.estimated_range.typical - 6.0).abs() < 1e-9);

    let heights: Vec<u64> = prediction.predictions.iter().map(|m| m.height).collect();
    assert_eq!(heights, vec![101, 102, 103]);
    let offsets: Vec<i64> =
        prediction.predictions.iter().map(|m| (m.estimated_time - now).num_seconds()).collect();
    assert_eq!(offsets, vec![6, 12, 18]);
    let steps: Vec<u64> = prediction.predictions.iter().map(|m| m.blocks_from_now).collect();
    assert_eq!(steps, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_future_target_projects_from_local_clock() {
    let chain = Arc::new(InMemoryChain::uniform(1, 100, 6.0));
    let now = head_time(&chain) + TimeDelta::seconds(3);

    let prediction = predictor(&chain, now).predict_height(110).await.unwrap();

    assert!(!prediction.is_complete);
    assert_eq!(prediction.blocks_left, 10);
    assert_eq!(prediction.current_time, Some(now));
    assert_eq!(prediction.estimated_time, Some(now + TimeDelta::seconds(60)));

    let duration = prediction.duration.unwrap();
    assert_eq!(duration.typical, Duration::from_secs(60));
    assert!(duration.min <= duration.typical && duration.typical <= duration.max);
    assert!(prediction.optimistic_time <= prediction.estimated_time);
    assert!(prediction.estimated_time <= prediction.pessimistic_time);

    let summary = prediction.summary.unwrap();
    assert_eq!((summary.start_height, summary.end_height), (51, 100));
}

#[tokio::test]
async fn test_block_age_absent_when_chain_clock_is_ahead() {
    let chain = Arc::new(InMemoryChain::uniform(1, 100, 6.0));
    let now = head_time(&chain) - TimeDelta::seconds(5);

    let prediction = predictor(&chain, now).predict_next(1).await.unwrap();

    assert_eq!(prediction.current_block_age, None);
    assert_eq!(prediction.predictions[0].estimated_time, now + TimeDelta::seconds(6));
}

#[tokio::test]
async fn test_zero_count_is_rejected_without_queries() {
    let chain = Arc::new(InMemoryChain::uniform(1, 100, 6.0));

    let err = predictor(&chain, head_time(&chain)).predict_next(0).await.unwrap_err();

    assert!(matches!(err, CoreError::InvalidArgument(_)));
    assert_eq!(chain.height_calls(), 0);
    assert_eq!(chain.block_calls(), 0);
}

#[tokio::test]
async fn test_young_chain_has_insufficient_sample() {
    let chain = Arc::new(InMemoryChain::uniform(1, 20, 6.0));

    let err = predictor(&chain, head_time(&chain)).predict_height(25).await.unwrap_err();

    assert!(matches!(err, CoreError::InsufficientSample { actual: 20, required: 30 }));
}
