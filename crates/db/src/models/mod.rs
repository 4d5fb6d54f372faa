//! Row structs for the keeper's tables.

pub mod dao;
