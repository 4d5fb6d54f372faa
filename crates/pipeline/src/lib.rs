//! The proposal execution pipeline.
//!
//! [`ProposalResolver`] finds the newest executable proposal of a DAO,
//! [`ProposalExecutor`] submits and confirms its `execute` transaction,
//! [`ExecutionEngine`] ties both to the registry, and [`BatchScheduler`]
//! runs the engine over every registered DAO on a fixed cadence.

pub mod config;
pub mod engine;
pub mod executor;
pub mod resolver;
pub mod scheduler;

pub use config::EngineConfig;
pub use engine::{BatchError, ExecutionEngine, RunGuard};
pub use executor::ProposalExecutor;
pub use resolver::ProposalResolver;
pub use scheduler::BatchScheduler;
