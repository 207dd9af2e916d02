//! Integration tests for the block time estimator.
//!
//! - `fetcher_tests`: bounded concurrency, fail-fast and cancellation of range fetches
//! - `calculator_tests`: the sample → clean → summarize → estimate pipeline and
//!   per-proposer analysis
//! - `predictor_tests`: completed targets, projections and next-N milestones
//! - `comet_client_tests`: CometBFT JSON-RPC wire mapping, error classification
//!   and retries against a mockito node
//! - `mock_infrastructure`: reusable chain doubles
//!
//! ```bash
//! cargo test --package tests
//! ```

#[cfg(test)]
mod calculator_tests;


#[cfg(test)]
mod fetcher_tests;

#[cfg(test)]
mod predictor_tests;

/// Mock infrastructure for testing
pub mod mock_infrastructure;
