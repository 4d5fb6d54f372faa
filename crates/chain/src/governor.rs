//! Bindings for the OpenZeppelin-style Governor surface the keeper touches:
//! the `ProposalCreated` event, the `state` view and the `execute` write.

use alloy_primitives::{keccak256, Bytes, B256, U256};
use alloy_sol_types::{sol, SolCall, SolEvent};
use keeper_core::proposal::{ProposalRecord, ProposalState};

sol! {
    event ProposalCreated(
        uint256 proposalId,
        address proposer,
        address[] targets,
        uint256[] values,
        string[] signatures,
        bytes[] calldatas,
        uint256 voteStart,
        uint256 voteEnd,
        string description
    );

    function state(uint256 proposalId) external view returns (uint8);

    function execute(
        address[] targets,
        uint256[] values,
        bytes[] calldatas,
        bytes32 descriptionHash
    ) external payable returns (uint256);
}

/// Why a `ProposalCreated` payload was not turned into a [`ProposalRecord`].
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Malformed ProposalCreated data: {0}")]
    Abi(#[from] alloy_sol_types::Error),

    #[error("ProposalCreated action arrays differ in length")]
    LengthMismatch,
}

/// topic0 of `ProposalCreated`.
pub fn proposal_created_topic() -> B256 {
    ProposalCreated::SIGNATURE_HASH
}

/// keccak256 of the UTF-8 description, as `execute` expects it.
pub fn description_hash(description: &str) -> B256 {
    keccak256(description.as_bytes())
}

pub fn encode_state_call(proposal_id: U256) -> Bytes {
    stateCall {
        proposalId: proposal_id,
    }
    .abi_encode()
    .into()
}

/// Interpret a `state(uint256)` return payload. An empty, short or
/// out-of-range payload is reported as [`ProposalState::Unknown`].
pub fn decode_state(returned: &[u8]) -> ProposalState {
    match stateCall::abi_decode_returns(returned, true) {
        Ok(decoded) => ProposalState::from_code(decoded._0),
        Err(_) => ProposalState::Unknown,
    }
}

pub fn encode_execute_call(record: &ProposalRecord) -> Bytes {
    executeCall {
        targets: record.targets.clone(),
        values: record.values.clone(),
        calldatas: record.calldatas.clone(),
        descriptionHash: description_hash(&record.description),
    }
    .abi_encode()
    .into()
}

/// Decode the data section of a `ProposalCreated` log.
pub fn decode_proposal_created(data: &[u8]) -> Result<ProposalRecord, DecodeError> {
    let (proposal_id, _, targets, values, _, calldatas, _, _, description) =
        ProposalCreated::abi_decode_data(data, true)?;
    ProposalRecord::new(proposal_id, targets, values, calldatas, description)
        .map_err(|_| DecodeError::LengthMismatch)
}

/// Encode a `ProposalCreated` data payload the way a Governor emits it.
/// Used to build log fixtures.
#[cfg(any(test, feature = "mock"))]
pub fn encode_proposal_created(
    record: &ProposalRecord,
    proposer: alloy_primitives::Address,
    vote_start: u64,
    vote_end: u64,
) -> Bytes {
    ProposalCreated {
        proposalId: record.proposal_id,
        proposer,
        targets: record.targets.clone(),
        values: record.values.clone(),
        signatures: vec![String::new(); record.targets.len()],
        calldatas: record.calldatas.clone(),
        voteStart: U256::from(vote_start),
        voteEnd: U256::from(vote_end),
        description: record.description.clone(),
    }
    .encode_data()
    .into()
}
