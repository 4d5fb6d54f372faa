//! The DAO registry seam.
//!
//! The pipeline only ever reads the registry; the HTTP layer writes to it.
//! Postgres backs it in production (`keeper-db`); [`InMemoryDaoRegistry`]
//! backs tests and local experiments.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::address::canonicalize_address;
use crate::error::CoreError;
use crate::types::Timestamp;

/// A registered DAO. `address` is always in canonical lowercase form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaoRegistration {
    pub address: String,
    pub registered_at: Timestamp,
}

#[async_trait]
pub trait DaoRegistry: Send + Sync {
    /// Every registration, oldest first.
    async fn list_all(&self) -> Result<Vec<DaoRegistration>, CoreError>;

    /// Register a new address. Fails on malformed input or a duplicate.
    async fn add(&self, address: &str) -> Result<DaoRegistration, CoreError>;

    /// Case-insensitive lookup.
    async fn find_by_address(&self, address: &str)
        -> Result<Option<DaoRegistration>, CoreError>;
}

/// Message for a duplicate registration.
pub const DUPLICATE_DAO_MESSAGE: &str = "DAO already exists";

#[derive(Debug, Default)]
pub struct InMemoryDaoRegistry {
    daos: Mutex<Vec<DaoRegistration>>,
}

impl InMemoryDaoRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<DaoRegistration>>, CoreError> {
        self.daos
            .lock()
            .map_err(|_| CoreError::Internal("registry lock poisoned".into()))
    }
}

#[async_trait]
impl DaoRegistry for InMemoryDaoRegistry {
    async fn list_all(&self) -> Result<Vec<DaoRegistration>, CoreError> {
        Ok(self.lock()?.clone())
    }

    async fn add(&self, address: &str) -> Result<DaoRegistration, CoreError> {
        let address = canonicalize_address(address)?;
        let mut daos = self.lock()?;
        if daos.iter().any(|dao| dao.address == address) {
            return Err(CoreError::Conflict(DUPLICATE_DAO_MESSAGE.into()));
        }
        let registration = DaoRegistration {
            address,
            registered_at: chrono::Utc::now(),
        };
        daos.push(registration.clone());
        Ok(registration)
    }

    async fn find_by_address(
        &self,
        address: &str,
    ) -> Result<Option<DaoRegistration>, CoreError> {
        let address = canonicalize_address(address)?;
        Ok(self
            .lock()?
            .iter()
            .find(|dao| dao.address == address)
            .cloned())
    }
}
