//! JSON-RPC 2.0 envelope types and CometBFT result payloads.
//!
//! Only the fields the sampler reads are modelled; everything else in the node's
//! responses is ignored by serde.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// JSON-RPC protocol version constant to avoid repeated allocations.
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC 2.0 request structure.
///
/// # Example
///
/// ```
/// use blocktime_core::chain::jsonrpc::JsonRpcRequest;
/// use serde_json::json;
///
/// let request = JsonRpcRequest::new("block", json!({ "height": "100" }), 1);
/// assert_eq!(request.method, "block");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: Cow<'static, str>,
    pub method: String,
    pub params: serde_json::Value,
    pub id: u64,
}

impl JsonRpcRequest {
    #[must_use]
    pub fn new(method: impl Into<String>, params: serde_json::Value, id: u64) -> Self {
        Self { jsonrpc: Cow::Borrowed(JSONRPC_VERSION), method: method.into(), params, id }
    }
}

/// JSON-RPC 2.0 response structure carrying either a `result` or an `error`.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse<T> {
    pub result: Option<T>,
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error object. CometBFT puts the useful detail in `data`.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(default)]
    pub data: Option<String>,
}

/// `status` result; only the sync info is read.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResult {
    pub sync_info: SyncInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncInfo {
    /// Decimal string, as CometBFT encodes 64-bit integers.
    pub latest_block_height: String,
}

/// `block` result.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockResult {
    pub block: Block,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    #[serde(default)]
    pub data: BlockData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockHeader {
    pub height: String,
    /// RFC 3339 timestamp with nanosecond precision.
    pub time: String,
    #[serde(default)]
    pub proposer_address: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlockData {
    /// `null` on empty blocks.
    #[serde(default)]
    pub txs: Option<Vec<serde_json::Value>>,
}
