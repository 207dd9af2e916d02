use thiserror::Error;

/// Errors that can occur when querying a chain node.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ChainError {
    /// The requested height is beyond the chain head or has been pruned.
    #[error("Block {height} not found")]
    NotFound { height: u64 },

    /// Failed to establish a connection to the node.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request exceeded the configured timeout duration.
    #[error("Request timeout")]
    Timeout,

    /// HTTP-level error occurred (non-2xx status code).
    ///
    /// First field is the HTTP status code, second is the (truncated) body.
    #[error("HTTP error {0}: {1}")]
    HttpError(u16, String),

    /// JSON-RPC error returned by the node.
    #[error("RPC error {0}: {1}")]
    RpcError(i32, String),

    /// The node rejected the request itself; resending it cannot succeed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Response could not be parsed or was missing required fields.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Network-level error from the underlying HTTP client.
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),
}

impl ChainError {
    /// Returns `true` if this error is transient and the request may be retried.
    ///
    /// Transient errors include:
    /// - Timeouts and connection failures
    /// - HTTP 5xx server errors and 429 rate limiting
    /// - Network errors other than response decoding failures
    /// - JSON-RPC internal / rate-limit errors
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::ConnectionFailed(_) => true,
            Self::Network(e) => !e.is_decode(),
            Self::HttpError(status, _) => (500..=599).contains(status) || *status == 429,
            Self::RpcError(code, _) => matches!(code, -32603 | -32005),
            _ => false,
        }
    }

    /// Returns `true` if retrying cannot change the outcome.
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        match self {
            Self::NotFound { .. } | Self::InvalidRequest(_) | Self::InvalidResponse(_) => true,
            Self::HttpError(status, _) => (400..=499).contains(status) && *status != 429,
            Self::RpcError(..) => !self.is_transient(),
            _ => false,
        }
    }

    /// Classifies a JSON-RPC error for a `block` query at `height`.
    ///
    /// CometBFT reports out-of-range and malformed heights as generic internal
    /// errors (`-32603`); the message (or `data`) text is the only signal that the
    /// block does not exist or that the height itself was rejected.
    #[must_use]
    pub fn from_block_rpc_error(height: u64, code: i32, message: &str, data: Option<&str>) -> Self {
        let detail = data.unwrap_or_default().to_lowercase();
        let message_lower = message.to_lowercase();
        let mentions_missing_height = |text: &str| {
            text.contains("must be less than or equal to") ||
                text.contains("lowest height is") ||
                text.contains("could not find results for height") ||
                text.contains("is not available")
        };

        let rejects_height = |text: &str| text.contains("must be greater than 0");

        if mentions_missing_height(&message_lower) || mentions_missing_height(&detail) {
            Self::NotFound { height }
        } else if rejects_height(&message_lower) || rejects_height(&detail) {
            Self::InvalidRequest(format!("height {height}: {}", data.unwrap_or(message)))
        } else if detail.is_empty() {
            Self::RpcError(code, message.to_string())
        } else {
            Self::RpcError(code, format!("{message}: {}", data.unwrap_or_default()))
        }
    }
}
