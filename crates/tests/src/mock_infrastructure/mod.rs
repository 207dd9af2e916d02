//! Mock infrastructure for testing without a live node.
//!
//! ## Components
//!
//! - `CometMockBuilder`: wraps mockito to serve CometBFT `status` / `block` responses
//! - `InMemoryChain`: a scripted [`ChainQueryService`](blocktime_core::chain::ChainQueryService)
//!   with failure injection, latency and concurrency probes
//!
//! ## Usage
//!
//! ```ignore
//! use tests::mock_infrastructure::{CometMockBuilder, InMemoryChain};
//!
//! let mut node = CometMockBuilder::new().await;
//! node.mock_status(100).mock_block(100, &block_json(100, "2024-01-01T00:00:00Z", "AA", 0));
//!
//! let chain = InMemoryChain::from_intervals(1, &[6.0, 6.0, 7.0]).failing_at(3);
//! ```

pub mod in_memory_chain;

pub use comet_mock::{block_json, CometMockBuilder};
pub use in_memory_chain::{genesis_time, InMemoryChain};
