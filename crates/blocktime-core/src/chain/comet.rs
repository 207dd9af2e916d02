use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, ClientBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use super::{
    errors::ChainError,
    jsonrpc::{BlockResult, JsonRpcRequest, JsonRpcResponse, StatusResult},
    ChainQueryService,
};
use crate::{config::ChainConfig, types::BlockSample};

/// Longest slice of an error body kept in [`ChainError::HttpError`].
const MAX_ERROR_BODY: usize = 256;

/// CometBFT JSON-RPC client.
///
/// Every call is a single HTTP POST of a JSON-RPC 2.0 envelope to the configured
/// endpoint. Transient failures (see [`ChainError::is_transient`]) are retried up to
/// `max_retries` times with a fixed `retry_delay` between attempts. Permanent
/// failures (see [`ChainError::is_permanent`]) and anything else unclassified are
/// returned on the first failure.
pub struct CometRpcClient {
    client: Client,
    endpoint: String,
    max_retries: u32,
    retry_delay: Duration,
    next_id: AtomicU64,
}

impl CometRpcClient {
    /// Builds a client for the endpoint in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::ConnectionFailed`] if the underlying reqwest client fails to build.
    pub fn new(config: &ChainConfig) -> Result<Self, ChainError> {
        let client = ClientBuilder::new()
            .pool_idle_timeout(Duration::from_secs(30))
            .connect_timeout(config.timeout().min(Duration::from_secs(10)))
            .timeout(config.timeout())
            .use_rustls_tls()
            .user_agent(concat!("blocktime/", env!("CARGO_PKG_VERSION")))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| {
                tracing::error!(error = %e, "failed to build http client");
                ChainError::ConnectionFailed(format!("HTTP client build failed: {e}"))
            })?;

        Ok(Self {
            client,
            endpoint: config.rpc_endpoint.clone(),
            max_retries: config.max_retries,
            retry_delay: config.retry_delay(),
            next_id: AtomicU64::new(1),
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends `method` and retries transient failures.
    ///
    /// `height` is only used to classify `block` errors as [`ChainError::NotFound`].
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
        height: Option<u64>,
    ) -> Result<T, ChainError> {
        let mut retries = 0;

        loop {
            match self.call_once(method, params.clone(), height).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_permanent() => {
                    tracing::debug!(method = method, height = ?height, error = %e, "rpc call rejected");
                    return Err(e);
                }
                Err(e) if e.is_transient() && retries < self.max_retries => {
                    retries += 1;
                    tracing::debug!(
                        method = method,
                        height = ?height,
                        attempt = retries,
                        error = %e,
                        "transient rpc failure, retrying"
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => {
                    tracing::warn!(
                        method = method,
                        height = ?height,
                        retries = retries,
                        error = %e,
                        "rpc call failed"
                    );
                    return Err(e);
                }
            }
        }
    }

    async fn call_once<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
        height: Option<u64>,
    ) -> Result<T, ChainError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(method, params, id);

        let response =
            self.client.post(&self.endpoint).json(&request).send().await.map_err(map_send_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_send_error)?;

        // CometBFT answers JSON-RPC errors with a 500 status and a valid envelope, so
        // try the envelope before falling back to the HTTP status.
        let envelope = serde_json::from_slice::<JsonRpcResponse<T>>(&body);

        match envelope {
            Ok(JsonRpcResponse { error: Some(error), .. }) => Err(match height {
                Some(height) => ChainError::from_block_rpc_error(
                    height,
                    error.code,
                    &error.message,
                    error.data.as_deref(),
                ),
                None => ChainError::RpcError(error.code, error.message),
            }),
            Ok(JsonRpcResponse { result: Some(result), .. }) if status.is_success() => Ok(result),
            _ if !status.is_success() => {
                Err(ChainError::HttpError(status.as_u16(), truncate_body(&body)))
            }
            Ok(_) => Err(ChainError::InvalidResponse(format!("{method}: missing result"))),
            Err(e) => Err(ChainError::InvalidResponse(format!("{method}: {e}"))),
        }
    }
}

#[async_trait]
impl ChainQueryService for CometRpcClient {
    async fn current_height(&self) -> Result<u64, ChainError> {
        let status: StatusResult = self.call("status", json!({}), None).await?;
        parse_height(&status.sync_info.latest_block_height)
    }

    async fn get_block(&self, height: u64) -> Result<BlockSample, ChainError> {
        let result: BlockResult =
            self.call("block", json!({ "height": height.to_string() }), Some(height)).await?;
        let sample = block_sample(result)?;

        if sample.height != height {
            return Err(ChainError::InvalidResponse(format!(
                "requested block {height}, node returned {}",
                sample.height
            )));
        }

        tracing::trace!(height = height, tx_count = sample.tx_count, "block fetched");
        Ok(sample)
    }
}

fn map_send_error(e: reqwest::Error) -> ChainError {
    if e.is_timeout() {
        ChainError::Timeout
    } else if e.is_connect() {
        ChainError::ConnectionFailed("connection refused or unreachable".to_string())
    } else {
        ChainError::Network(e)
    }
}

fn truncate_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}... (truncated)", &text[..cut])
    } else {
        text.into_owned()
    }
}

fn parse_height(raw: &str) -> Result<u64, ChainError> {
    raw.parse::<u64>().map_err(|_| ChainError::InvalidResponse(format!("invalid height: {raw:?}")))
}

/// Converts a `block` result into a [`BlockSample`].
fn block_sample(result: BlockResult) -> Result<BlockSample, ChainError> {
    let header = result.block.header;
    let height = parse_height(&header.height)?;
    let timestamp = DateTime::parse_from_rfc3339(&header.time)
        .map_err(|e| ChainError::InvalidResponse(format!("invalid block time {:?}: {e}", header.time)))?
        .with_timezone(&Utc);
    let tx_count = result.block.data.txs.map_or(0, |txs| txs.len() as u64);

    Ok(BlockSample { height, timestamp, proposer: header.proposer_address, tx_count })
}
