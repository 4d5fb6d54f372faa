//! Table-level data access. Repositories are zero-sized and take the pool
//! per call.

pub mod dao_repo;

pub use dao_repo::DaoRepo;
