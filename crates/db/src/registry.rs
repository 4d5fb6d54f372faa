//! Postgres-backed [`DaoRegistry`].

use async_trait::async_trait;
use keeper_core::address::canonicalize_address;
use keeper_core::error::CoreError;
use keeper_core::registry::{DaoRegistration, DaoRegistry, DUPLICATE_DAO_MESSAGE};

use crate::repositories::dao_repo::ADDRESS_UNIQUE_CONSTRAINT;
use crate::repositories::DaoRepo;
use crate::DbPool;

#[derive(Clone)]
pub struct PgDaoRegistry {
    pool: DbPool,
}

impl PgDaoRegistry {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DaoRegistry for PgDaoRegistry {
    async fn list_all(&self) -> Result<Vec<DaoRegistration>, CoreError> {
        let rows = DaoRepo::list(&self.pool).await.map_err(internal)?;
        Ok(rows.into_iter().map(DaoRegistration::from).collect())
    }

    async fn add(&self, address: &str) -> Result<DaoRegistration, CoreError> {
        let address = canonicalize_address(address)?;
        match DaoRepo::create(&self.pool, &address).await {
            Ok(row) => {
                tracing::info!(address = %row.address, "DAO registered");
                Ok(row.into())
            }
            Err(sqlx::Error::Database(db_err))
                if db_err.is_unique_violation()
                    && db_err.constraint() == Some(ADDRESS_UNIQUE_CONSTRAINT) =>
            {
                Err(CoreError::Conflict(DUPLICATE_DAO_MESSAGE.into()))
            }
            Err(err) => Err(internal(err)),
        }
    }

    async fn find_by_address(
        &self,
        address: &str,
    ) -> Result<Option<DaoRegistration>, CoreError> {
        let address = canonicalize_address(address)?;
        let row = DaoRepo::find_by_address(&self.pool, &address)
            .await
            .map_err(internal)?;
        Ok(row.map(DaoRegistration::from))
    }
}

fn internal(err: sqlx::Error) -> CoreError {
    CoreError::Internal(format!("Database error: {err}"))
}
