//! Ties the registry, resolver and executor together.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use keeper_core::error::CoreError;
use keeper_core::execution::ExecutionError;
use keeper_core::proposal::ExecutionResult;
use keeper_core::registry::DaoRegistry;
use keeper_core::scheduling::RunState;
use tokio::sync::Mutex;

use crate::executor::ProposalExecutor;
use crate::resolver::ProposalResolver;

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("A batch run is already in progress")]
    AlreadyRunning,

    #[error("Failed to read DAO registry: {0}")]
    Registry(#[from] CoreError),
}

/// Marks a batch run as in progress. Dropping it returns the engine to idle,
/// including when the run panics.
#[derive(Debug)]
pub struct RunGuard {
    running: Arc<AtomicBool>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

pub struct ExecutionEngine {
    registry: Arc<dyn DaoRegistry>,
    resolver: ProposalResolver,
    executor: ProposalExecutor,
    /// Held from submission until confirmation so the signer never has two
    /// transactions in flight.
    submission_lock: Mutex<()>,
    running: Arc<AtomicBool>,
}

impl ExecutionEngine {
    pub fn new(
        registry: Arc<dyn DaoRegistry>,
        resolver: ProposalResolver,
        executor: ProposalExecutor,
    ) -> Self {
        Self {
            registry,
            resolver,
            executor,
            submission_lock: Mutex::new(()),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn registry(&self) -> &Arc<dyn DaoRegistry> {
        &self.registry
    }

    pub fn run_state(&self) -> RunState {
        if self.running.load(Ordering::Acquire) {
            RunState::Running
        } else {
            RunState::Idle
        }
    }

    /// Resolve and execute the newest executable proposal of one DAO.
    pub async fn trigger_execution_for_one(
        &self,
        dao_address: &str,
    ) -> Result<ExecutionResult, ExecutionError> {
        let record = self.resolver.resolve(dao_address).await?;
        let _submission = self.submission_lock.lock().await;
        self.executor.execute(dao_address, &record).await
    }

    /// Claim the batch slot. Fails when a run is already in progress.
    pub fn try_start_run(&self) -> Result<RunGuard, BatchError> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| BatchError::AlreadyRunning)?;
        Ok(RunGuard {
            running: Arc::clone(&self.running),
        })
    }

    /// Run the pipeline over every registered DAO.
    pub async fn trigger_execution_for_all(&self) -> Result<(), BatchError> {
        let guard = self.try_start_run()?;
        self.run_batch(guard).await
    }

    /// Run a batch under an already claimed slot.
    ///
    /// The registry is read once up front; DAOs are then processed one at a
    /// time and every per-DAO failure is logged and skipped. Only a failed
    /// registry read aborts the run.
    pub async fn run_batch(&self, guard: RunGuard) -> Result<(), BatchError> {
        let _guard = guard;
        tracing::info!("Starting proposal execution for all DAOs");

        let daos = self.registry.list_all().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to load DAO registry, aborting run");
            BatchError::Registry(e)
        })?;

        let mut executed = 0usize;
        let mut failed = 0usize;
        for dao in &daos {
            tracing::info!(dao = %dao.address, "Processing DAO");
            match self.trigger_execution_for_one(&dao.address).await {
                Ok(result) => {
                    executed += 1;
                    tracing::info!(
                        dao = %dao.address,
                        proposal_id = %result.proposal_id,
                        tx_hash = %result.transaction_hash,
                        "Successfully processed DAO"
                    );
                }
                Err(e) => {
                    failed += 1;
                    tracing::error!(
                        dao = %dao.address,
                        code = e.code(),
                        error = %e,
                        "Error processing DAO"
                    );
                }
            }
        }

        tracing::info!(
            total = daos.len(),
            executed,
            failed,
            "Completed proposal execution for all DAOs"
        );
        Ok(())
    }
}
