//! Engine defaults and the batch run state machine.

use serde::Serialize;

/// Blocks scanned backwards from the chain head for `ProposalCreated` logs.
pub const DEFAULT_LOOKBACK_BLOCKS: u64 = 10_000;

/// Confirmations awaited after an `execute` transaction is mined.
pub const DEFAULT_CONFIRMATIONS: u64 = 1;

/// Upper bound on the confirmation wait for one transaction.
pub const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 600;

/// Delay between receipt polls while waiting for confirmation.
pub const DEFAULT_RECEIPT_POLL_INTERVAL_MS: u64 = 2_000;

/// Batch cadence: once a day.
pub const DEFAULT_BATCH_INTERVAL_SECS: u64 = 86_400;

/// A batch run is either in progress or not. There is no paused state and a
/// started run always visits every registered DAO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Running,
}
