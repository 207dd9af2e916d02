//! # Blocktime Core
//!
//! Core library for estimating block production times on CometBFT chains.
//!
//! This crate provides:
//!
//! - **[`chain`]**: The [`ChainQueryService`](chain::ChainQueryService) boundary and a
//!   CometBFT JSON-RPC client with retries for transient failures.
//!
//! - **[`sampling`]**: Bounded-concurrency, fail-fast retrieval of contiguous height
//!   ranges and the resulting block-time delta series.
//!
//! - **[`statistics`]**: Percentiles, MAD / IQR outlier removal with symmetric trimming,
//!   and the confidence-adjusted range estimator.
//!
//! - **[`calculator`]**: Composes sampling and statistics into a
//!   [`StatisticalSummary`](types::StatisticalSummary), plus per-proposer analysis.
//!
//! - **[`predictor`]**: Projects the estimated block time forward to a target height or
//!   the next N heights.
//!
//! - **[`config`]**: Layered configuration (defaults, file, `BLOCKTIME__*` env vars).
//!
//! ## Data Flow
//!
//! ```text
//!   ChainQueryService
//!         │ get_block(h) × K in flight
//!         ▼
//! ┌───────────────┐
//! │ RangeFetcher  │ ─── any failure ──► CoreError (no partial result)
//! └───────┬───────┘
//!         │ sorted samples
//!         ▼
//! ┌───────────────┐
//! │  DeltaSeries  │  non-positive deltas dropped
//! └───────┬───────┘
//!         ▼
//! ┌───────────────┐
//! │ clean (MAD /  │
//! │ IQR + trim)   │
//! └───────┬───────┘
//!         ▼
//! ┌───────────────┐      ┌──────────────────┐
//! │  summarize    │ ───► │  RangeEstimator  │ ───► StatisticalSummary ───► Predictor
//! └───────────────┘      └──────────────────┘
//! ```
//!
//! Nothing is cached between calls: every summary and prediction is rebuilt from
//! live chain queries.

pub mod calculator;
pub mod chain;
pub mod config;
pub mod error;
pub mod predictor;
pub mod sampling;
pub mod statistics;
pub mod types;

pub use error::{CoreError, CoreResult};
