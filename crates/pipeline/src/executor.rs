//! Submits `execute` for a resolved proposal and waits for it to confirm.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::hex;
use keeper_chain::{governor, ChainClient, ChainError, LocalSigner};
use keeper_core::address::parse_address;
use keeper_core::execution::ExecutionError;
use keeper_core::proposal::{ExecutionResult, ProposalRecord};
use keeper_core::scheduling::{DEFAULT_CONFIRMATIONS, DEFAULT_CONFIRMATION_TIMEOUT_SECS};

pub struct ProposalExecutor {
    chain: Arc<dyn ChainClient>,
    signer: Option<Arc<LocalSigner>>,
    confirmations: u64,
    confirmation_timeout: Duration,
}

impl ProposalExecutor {
    /// `signer` is `None` when no usable key was configured; every
    /// execution then fails with a configuration error.
    pub fn new(chain: Arc<dyn ChainClient>, signer: Option<Arc<LocalSigner>>) -> Self {
        Self {
            chain,
            signer,
            confirmations: DEFAULT_CONFIRMATIONS,
            confirmation_timeout: Duration::from_secs(DEFAULT_CONFIRMATION_TIMEOUT_SECS),
        }
    }

    pub fn with_confirmations(mut self, confirmations: u64) -> Self {
        self.confirmations = confirmations.max(1);
        self
    }

    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    pub async fn execute(
        &self,
        dao_address: &str,
        record: &ProposalRecord,
    ) -> Result<ExecutionResult, ExecutionError> {
        let dao = parse_address(dao_address).map_err(|_| ExecutionError::InvalidAddress)?;
        let signer = self.signer.as_deref().ok_or_else(|| {
            ExecutionError::Configuration("executor signing key is not configured".into())
        })?;

        let calldata = governor::encode_execute_call(record);
        tracing::info!(
            dao = dao_address,
            proposal_id = %record.proposal_id,
            actions = record.action_count(),
            "Submitting execute transaction"
        );

        let pending = self
            .chain
            .send_transaction(signer, dao, calldata)
            .await
            .map_err(submission_error)?;
        let tx_hash = format!("0x{}", hex::encode(pending.tx_hash));
        tracing::info!(dao = dao_address, tx_hash = %tx_hash, "Transaction submitted");

        let receipt = tokio::time::timeout(
            self.confirmation_timeout,
            self.chain.wait_for_confirmation(&pending, self.confirmations),
        )
        .await
        .map_err(|_| ExecutionError::Timeout {
            tx_hash: tx_hash.clone(),
            secs: self.confirmation_timeout.as_secs(),
        })?
        .map_err(|err| confirmation_error(err, &tx_hash))?;

        if !receipt.succeeded {
            return Err(ExecutionError::ExecutionFailed(format!(
                "transaction {tx_hash} reverted in block {}",
                receipt.block_number
            )));
        }

        tracing::info!(
            dao = dao_address,
            proposal_id = %record.proposal_id,
            tx_hash = %tx_hash,
            block_number = receipt.block_number,
            "Proposal executed"
        );
        Ok(ExecutionResult::confirmed(
            record.proposal_id,
            format!("0x{}", hex::encode(receipt.transaction_hash)),
        ))
    }
}

fn submission_error(err: ChainError) -> ExecutionError {
    if err.is_rejection() {
        return ExecutionError::ExecutionFailed(err.to_string());
    }
    match err {
        ChainError::Signer(_) => ExecutionError::Configuration(err.to_string()),
        other => ExecutionError::Transport(other.to_string()),
    }
}

/// The transaction is already broadcast and may still be mined, so any
/// failure while polling for it is a transport problem.
fn confirmation_error(err: ChainError, tx_hash: &str) -> ExecutionError {
    ExecutionError::Transport(format!("{err} (pending transaction {tx_hash})"))
}
