//! The capability the engine needs from a remote node.

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;

use crate::error::ChainError;
use crate::signer::LocalSigner;

/// A log entry as returned by `eth_getLogs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub block_number: u64,
    pub log_index: u64,
}

/// A transaction accepted into the node's pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransaction {
    pub tx_hash: B256,
}

/// Outcome of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    pub block_number: u64,
    /// `false` when the receipt status is 0 (mined but reverted).
    pub succeeded: bool,
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Current chain head.
    async fn block_number(&self) -> Result<u64, ChainError>;

    /// Logs emitted by `address` with first topic `topic0` in the inclusive
    /// range `[from_block, to_block]`.
    async fn get_logs(
        &self,
        address: Address,
        topic0: B256,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<RawLog>, ChainError>;

    /// Read-only `eth_call` against the latest block.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError>;

    /// Sign and broadcast a zero-value EIP-1559 transaction.
    async fn send_transaction(
        &self,
        signer: &LocalSigner,
        to: Address,
        data: Bytes,
    ) -> Result<PendingTransaction, ChainError>;

    /// Block until the transaction is mined and buried under `confirmations`
    /// blocks (the inclusion block counts as the first). Callers bound the
    /// wait themselves.
    async fn wait_for_confirmation(
        &self,
        pending: &PendingTransaction,
        confirmations: u64,
    ) -> Result<TransactionReceipt, ChainError>;
}
