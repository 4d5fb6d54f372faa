//! Fixed-cadence batch trigger.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::engine::{BatchError, ExecutionEngine};

/// Shortest accepted period; `tokio::time::interval` rejects zero.
const MIN_PERIOD: Duration = Duration::from_secs(1);

/// Background service that runs the engine over every registered DAO on a
/// fixed interval.
pub struct BatchScheduler {
    engine: Arc<ExecutionEngine>,
    period: Duration,
    run_on_startup: bool,
}

impl BatchScheduler {
    /// Periods shorter than one second are raised to one second.
    pub fn new(engine: Arc<ExecutionEngine>, period: Duration) -> Self {
        Self {
            engine,
            period: period.max(MIN_PERIOD),
            run_on_startup: false,
        }
    }

    /// Fire the first run immediately instead of one period after start.
    pub fn with_run_on_startup(mut self, run_on_startup: bool) -> Self {
        self.run_on_startup = run_on_startup;
        self
    }

    /// Run the scheduler loop until `cancel` fires.
    ///
    /// A started batch is never interrupted; cancellation is observed
    /// between runs. A tick that lands while another run (e.g. an on-demand
    /// one) is active is skipped.
    pub async fn run(&self, cancel: CancellationToken) {
        let first_tick = if self.run_on_startup {
            Instant::now()
        } else {
            Instant::now() + self.period
        };
        let mut interval = tokio::time::interval_at(first_tick, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            interval_secs = self.period.as_secs(),
            run_on_startup = self.run_on_startup,
            "Batch scheduler started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Batch scheduler cancelled");
                    break;
                }
                _ = interval.tick() => {
                    match self.engine.trigger_execution_for_all().await {
                        Ok(()) => {}
                        Err(BatchError::AlreadyRunning) => {
                            tracing::warn!("Previous batch still running, skipping scheduled run");
                        }
                        // Already logged by the engine; the next tick runs normally.
                        Err(BatchError::Registry(_)) => {}
                    }
                }
            }
        }
    }
}
