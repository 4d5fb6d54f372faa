//! In-memory [`ChainClient`] for engine tests.
//!
//! Serves canned `ProposalCreated` logs and `state` answers, records every
//! call in order, and behaves like a Governor on resubmission: sending the
//! same `execute` calldata twice is rejected the way a node rejects a
//! proposal that is no longer `Succeeded`.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use keeper_core::proposal::ProposalRecord;

use crate::client::{ChainClient, PendingTransaction, RawLog, TransactionReceipt};
use crate::error::ChainError;
use crate::governor;
use crate::signer::LocalSigner;

/// One recorded interaction with the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainCall {
    BlockNumber,
    GetLogs {
        address: Address,
        from_block: u64,
        to_block: u64,
    },
    State {
        address: Address,
        proposal_id: U256,
    },
    Call {
        address: Address,
        data: Bytes,
    },
    SendTransaction {
        to: Address,
        data: Bytes,
    },
    WaitForConfirmation {
        tx_hash: B256,
    },
}

pub struct MockChainClient {
    head: u64,
    logs: Vec<RawLog>,
    states: HashMap<(Address, U256), u8>,
    tx_hash: B256,
    fail_block_number: bool,
    fail_state_reads: bool,
    reject_submissions: Option<String>,
    revert_receipts: bool,
    fail_receipts: Option<String>,
    confirmation_delay: Option<Duration>,
    submitted: Mutex<HashSet<(Address, Bytes)>>,
    calls: Mutex<Vec<ChainCall>>,
}

impl MockChainClient {
    pub fn new(head: u64) -> Self {
        Self {
            head,
            logs: Vec::new(),
            states: HashMap::new(),
            tx_hash: B256::repeat_byte(0xde),
            fail_block_number: false,
            fail_state_reads: false,
            reject_submissions: None,
            revert_receipts: false,
            fail_receipts: None,
            confirmation_delay: None,
            submitted: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Emit a `ProposalCreated` log for `record` from `dao` at the given
    /// position, and answer `state(record.proposal_id)` with `state`.
    pub fn with_proposal(
        mut self,
        dao: Address,
        block_number: u64,
        log_index: u64,
        record: &ProposalRecord,
        state: u8,
    ) -> Self {
        let data = governor::encode_proposal_created(
            record,
            Address::repeat_byte(0x99),
            block_number,
            block_number + 100,
        );
        self.logs.push(RawLog {
            address: dao,
            topics: vec![governor::proposal_created_topic()],
            data,
            block_number,
            log_index,
        });
        self.states.insert((dao, record.proposal_id), state);
        self
    }

    /// Add an arbitrary log, e.g. one with corrupt data.
    pub fn with_raw_log(mut self, log: RawLog) -> Self {
        self.logs.push(log);
        self
    }

    pub fn with_tx_hash(mut self, tx_hash: B256) -> Self {
        self.tx_hash = tx_hash;
        self
    }

    pub fn failing_block_number(mut self) -> Self {
        self.fail_block_number = true;
        self
    }

    pub fn failing_state_reads(mut self) -> Self {
        self.fail_state_reads = true;
        self
    }

    /// Reject every submission with the given node message.
    pub fn rejecting_submissions(mut self, message: impl Into<String>) -> Self {
        self.reject_submissions = Some(message.into());
        self
    }

    /// Mine every transaction with receipt status 0.
    pub fn reverting_receipts(mut self) -> Self {
        self.revert_receipts = true;
        self
    }

    /// Answer every receipt poll with a node error carrying `message`.
    pub fn failing_receipts(mut self, message: impl Into<String>) -> Self {
        self.fail_receipts = Some(message.into());
        self
    }

    pub fn with_confirmation_delay(mut self, delay: Duration) -> Self {
        self.confirmation_delay = Some(delay);
        self
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<ChainCall> {
        self.calls.lock().expect("mock lock poisoned").clone()
    }

    /// Proposal ids passed to `state`, in order.
    pub fn state_queries(&self) -> Vec<U256> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ChainCall::State { proposal_id, .. } => Some(proposal_id),
                _ => None,
            })
            .collect()
    }

    /// `(to, calldata)` of every submission attempt, accepted or not.
    pub fn submissions(&self) -> Vec<(Address, Bytes)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ChainCall::SendTransaction { to, data } => Some((to, data)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: ChainCall) {
        self.calls.lock().expect("mock lock poisoned").push(call);
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn block_number(&self) -> Result<u64, ChainError> {
        self.record(ChainCall::BlockNumber);
        if self.fail_block_number {
            return Err(ChainError::Transport("connection refused".into()));
        }
        Ok(self.head)
    }

    async fn get_logs(
        &self,
        address: Address,
        topic0: B256,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<RawLog>, ChainError> {
        self.record(ChainCall::GetLogs {
            address,
            from_block,
            to_block,
        });
        Ok(self
            .logs
            .iter()
            .filter(|log| {
                log.address == address
                    && log.topics.first() == Some(&topic0)
                    && (from_block..=to_block).contains(&log.block_number)
            })
            .cloned()
            .collect())
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        if data.len() < 4 || data[..4] != governor::stateCall::SELECTOR {
            self.record(ChainCall::Call { address: to, data });
            return Ok(Bytes::new());
        }

        let proposal_id = governor::stateCall::abi_decode(&data, true)
            .map_err(|err| ChainError::Rpc {
                code: -32000,
                message: format!("execution reverted: {err}"),
            })?
            .proposalId;
        self.record(ChainCall::State {
            address: to,
            proposal_id,
        });
        if self.fail_state_reads {
            return Err(ChainError::Transport("connection reset by peer".into()));
        }
        // Unknown proposals answer with an empty payload.
        Ok(match self.states.get(&(to, proposal_id)) {
            Some(code) => Bytes::from(U256::from(*code).to_be_bytes::<32>().to_vec()),
            None => Bytes::new(),
        })
    }

    async fn send_transaction(
        &self,
        _signer: &LocalSigner,
        to: Address,
        data: Bytes,
    ) -> Result<PendingTransaction, ChainError> {
        self.record(ChainCall::SendTransaction {
            to,
            data: data.clone(),
        });
        if let Some(message) = &self.reject_submissions {
            return Err(ChainError::Rpc {
                code: -32000,
                message: message.clone(),
            });
        }
        let fresh = self
            .submitted
            .lock()
            .expect("mock lock poisoned")
            .insert((to, data));
        if !fresh {
            return Err(ChainError::Rpc {
                code: -32000,
                message: "execution reverted: Governor: proposal not successful".into(),
            });
        }
        Ok(PendingTransaction {
            tx_hash: self.tx_hash,
        })
    }

    async fn wait_for_confirmation(
        &self,
        pending: &PendingTransaction,
        _confirmations: u64,
    ) -> Result<TransactionReceipt, ChainError> {
        self.record(ChainCall::WaitForConfirmation {
            tx_hash: pending.tx_hash,
        });
        if let Some(delay) = self.confirmation_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.fail_receipts {
            return Err(ChainError::Rpc {
                code: -32603,
                message: message.clone(),
            });
        }
        Ok(TransactionReceipt {
            transaction_hash: pending.tx_hash,
            block_number: self.head + 1,
            succeeded: !self.revert_receipts,
        })
    }
}
