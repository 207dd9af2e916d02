//! Chain query boundary.
//!
//! The sampling and prediction code only ever talks to a node through the
//! [`ChainQueryService`] trait, shared as `Arc<dyn ChainQueryService>`:
//!
//! ```text
//!  BlockTimeCalculator ──┐
//!                        ├──► Arc<dyn ChainQueryService> ──► CometRpcClient ──► node
//!  Predictor ────────────┤                                   (or a test double)
//!  RangeFetcher ─────────┘
//! ```
//!
//! Retries, timeouts and wire encoding are the implementation's business. The
//! bundled [`CometRpcClient`] speaks CometBFT JSON-RPC over HTTP.

pub mod comet;
pub mod errors;
pub mod jsonrpc;

use async_trait::async_trait;

use crate::types::BlockSample;

pub use comet::CometRpcClient;
pub use errors::ChainError;

/// Read-only access to a chain node.
#[async_trait]
pub trait ChainQueryService: Send + Sync {
    /// Returns the height of the current chain head.
    async fn current_height(&self) -> Result<u64, ChainError>;

    /// Returns the block at `height`.
    ///
    /// Fails with [`ChainError::NotFound`] when the height is beyond the head or pruned.
    async fn get_block(&self, height: u64) -> Result<BlockSample, ChainError>;
}
