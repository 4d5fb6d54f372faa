//! Finds the most recent executable proposal of a DAO.

use std::sync::Arc;

use alloy_primitives::Address;
use keeper_chain::{governor, ChainClient, ChainError, RawLog};
use keeper_core::address::parse_address;
use keeper_core::execution::ExecutionError;
use keeper_core::proposal::{ProposalRecord, ProposalState};
use keeper_core::scheduling::DEFAULT_LOOKBACK_BLOCKS;

pub struct ProposalResolver {
    chain: Arc<dyn ChainClient>,
    lookback_blocks: u64,
    /// `None` fetches the whole window with one request.
    log_chunk_blocks: Option<u64>,
}

impl ProposalResolver {
    pub fn new(chain: Arc<dyn ChainClient>) -> Self {
        Self {
            chain,
            lookback_blocks: DEFAULT_LOOKBACK_BLOCKS,
            log_chunk_blocks: None,
        }
    }

    pub fn with_lookback_blocks(mut self, lookback_blocks: u64) -> Self {
        self.lookback_blocks = lookback_blocks;
        self
    }

    pub fn with_log_chunk_blocks(mut self, log_chunk_blocks: Option<u64>) -> Self {
        self.log_chunk_blocks = log_chunk_blocks.map(|blocks| blocks.max(1));
        self
    }

    /// Scan the lookback window for `ProposalCreated` events and return the
    /// newest proposal whose on-chain state is `Succeeded`.
    ///
    /// Candidates are visited newest first (block number, then log index).
    /// Events that fail to decode are skipped. A failed state read aborts
    /// the whole resolution.
    pub async fn resolve(&self, dao_address: &str) -> Result<ProposalRecord, ExecutionError> {
        let dao = parse_address(dao_address).map_err(|_| ExecutionError::InvalidAddress)?;

        let head = self.chain.block_number().await.map_err(read_error)?;
        let from_block = head.saturating_sub(self.lookback_blocks);
        let mut logs = self.fetch_logs(dao, from_block, head).await?;

        tracing::debug!(
            dao = dao_address,
            from_block,
            to_block = head,
            events = logs.len(),
            "Fetched ProposalCreated events"
        );

        if logs.is_empty() {
            return Err(ExecutionError::NoProposalsFound);
        }

        logs.sort_by(|a, b| {
            (b.block_number, b.log_index).cmp(&(a.block_number, a.log_index))
        });

        for log in &logs {
            let record = match governor::decode_proposal_created(&log.data) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(
                        dao = dao_address,
                        block_number = log.block_number,
                        log_index = log.log_index,
                        error = %e,
                        "Skipping undecodable ProposalCreated event"
                    );
                    continue;
                }
            };

            let returned = self
                .chain
                .call(dao, governor::encode_state_call(record.proposal_id))
                .await
                .map_err(read_error)?;
            let state = governor::decode_state(&returned);

            tracing::debug!(
                dao = dao_address,
                proposal_id = %record.proposal_id,
                state = ?state,
                "Checked proposal state"
            );

            if state == ProposalState::Succeeded {
                return Ok(record);
            }
        }

        Err(ExecutionError::NoExecutableProposal)
    }

    async fn fetch_logs(
        &self,
        dao: Address,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<RawLog>, ExecutionError> {
        let topic = governor::proposal_created_topic();
        let Some(chunk) = self.log_chunk_blocks else {
            return self
                .chain
                .get_logs(dao, topic, from_block, to_block)
                .await
                .map_err(read_error);
        };

        let mut logs = Vec::new();
        let mut start = from_block;
        loop {
            let end = start.saturating_add(chunk - 1).min(to_block);
            logs.extend(
                self.chain
                    .get_logs(dao, topic, start, end)
                    .await
                    .map_err(read_error)?,
            );
            if end >= to_block {
                break;
            }
            start = end + 1;
        }
        Ok(logs)
    }
}

/// Every failed read is a transport problem from the engine's point of view.
fn read_error(err: ChainError) -> ExecutionError {
    ExecutionError::Transport(err.to_string())
}
