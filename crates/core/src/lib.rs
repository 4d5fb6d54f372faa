//! Domain types shared by every `dao-keeper` crate.
//!
//! This crate has zero internal dependencies so the chain client, the
//! registry, the execution pipeline and the HTTP layer can all agree on
//! addresses, proposal shapes and error kinds.

pub mod address;
pub mod error;
pub mod execution;
pub mod proposal;
pub mod registry;
pub mod scheduling;
pub mod types;
