/// Errors from the chain client layer.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// The HTTP request itself failed (connect, DNS, TLS, body read).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The node answered with a non-2xx status.
    #[error("RPC endpoint returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Connectivity failure that is not tied to a single request, e.g.
    /// primary and fallback endpoints both unreachable.
    #[error("{0}")]
    Transport(String),

    /// The node processed the request and rejected it (revert during gas
    /// estimation, nonce too low, insufficient funds, ...).
    #[error("{message}")]
    Rpc { code: i64, message: String },

    /// The node answered with a payload this client could not interpret.
    #[error("Malformed {method} response: {reason}")]
    Decode { method: String, reason: String },

    /// Key material could not be loaded or used.
    #[error("Signer error: {0}")]
    Signer(String),
}

impl ChainError {
    pub(crate) fn decode(method: &str, reason: impl Into<String>) -> Self {
        Self::Decode {
            method: method.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the failure happened before the node could process the request.
    ///
    /// Only these are retried against the fallback endpoint.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Http { .. } | Self::Transport(_))
    }

    /// Whether the node itself refused the request.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rpc { .. })
    }
}
