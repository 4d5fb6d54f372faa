//! Typed outcomes of a single resolve-and-execute attempt.
//!
//! Every failure the resolver or executor can produce is one of these
//! variants. The batch scheduler logs them and moves on; the on-demand HTTP
//! trigger surfaces the `Display` text verbatim.

use crate::address::INVALID_ADDRESS_MESSAGE;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    #[error("{}", INVALID_ADDRESS_MESSAGE)]
    InvalidAddress,

    #[error("No proposals found in the lookback window")]
    NoProposalsFound,

    #[error("No executable proposal found")]
    NoExecutableProposal,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Timed out after {secs}s waiting for confirmation of {tx_hash}")]
    Timeout { tx_hash: String, secs: u64 },
}

impl ExecutionError {
    /// Stable machine-readable code, used in logs and HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidAddress => "INVALID_ADDRESS",
            Self::NoProposalsFound => "NO_PROPOSALS_FOUND",
            Self::NoExecutableProposal => "NO_EXECUTABLE_PROPOSAL",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::ExecutionFailed(_) => "EXECUTION_FAILED",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Timeout { .. } => "TIMEOUT",
        }
    }
}
