//! Governance proposal shapes as seen by the execution pipeline.

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The `state(uint256)` return code that marks a proposal as executable.
pub const EXECUTABLE_STATE_CODE: u8 = 4;

/// A proposal reconstructed from a `ProposalCreated` event.
///
/// Built fresh on every resolution pass and never cached. The three action
/// sequences are positional: `targets[i]` is called with `values[i]` and
/// `calldatas[i]`. They are handed to `execute` exactly as decoded, because
/// the governor re-derives the proposal id from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalRecord {
    pub proposal_id: U256,
    pub targets: Vec<Address>,
    pub values: Vec<U256>,
    pub calldatas: Vec<Bytes>,
    pub description: String,
}

impl ProposalRecord {
    /// Build a record, rejecting action sequences of unequal length.
    pub fn new(
        proposal_id: U256,
        targets: Vec<Address>,
        values: Vec<U256>,
        calldatas: Vec<Bytes>,
        description: String,
    ) -> Result<Self, CoreError> {
        if targets.len() != values.len() || targets.len() != calldatas.len() {
            return Err(CoreError::Validation(format!(
                "proposal {proposal_id} has mismatched actions: {} targets, {} values, {} calldatas",
                targets.len(),
                values.len(),
                calldatas.len()
            )));
        }
        Ok(Self {
            proposal_id,
            targets,
            values,
            calldatas,
            description,
        })
    }

    /// Number of calls the proposal performs.
    pub fn action_count(&self) -> usize {
        self.targets.len()
    }
}

/// Governor proposal lifecycle, as returned by `state(uint256)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalState {
    Pending,
    Active,
    Canceled,
    Defeated,
    Succeeded,
    Queued,
    Expired,
    Executed,
    /// Any code this engine does not recognise. Never executable.
    Unknown,
}

impl ProposalState {
    /// Map a raw `uint8` state code.
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Pending,
            1 => Self::Active,
            2 => Self::Canceled,
            3 => Self::Defeated,
            EXECUTABLE_STATE_CODE => Self::Succeeded,
            5 => Self::Queued,
            6 => Self::Expired,
            7 => Self::Executed,
            _ => Self::Unknown,
        }
    }

    /// Whether a proposal in this state may be executed.
    pub fn is_executable(self) -> bool {
        self == Self::Succeeded
    }
}

/// Outcome of a confirmed `execute` transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub success: bool,
    /// Decimal rendering of the uint256 proposal id.
    pub proposal_id: String,
    pub transaction_hash: String,
}

impl ExecutionResult {
    pub fn confirmed(proposal_id: U256, transaction_hash: impl Into<String>) -> Self {
        Self {
            success: true,
            proposal_id: proposal_id.to_string(),
            transaction_hash: transaction_hash.into(),
        }
    }
}
