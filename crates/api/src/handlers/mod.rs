pub mod daos;
pub mod executions;
