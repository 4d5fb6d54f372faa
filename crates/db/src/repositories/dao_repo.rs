//! Repository for the `daos` table.

use sqlx::PgPool;

use crate::models::dao::Dao;

const COLUMNS: &str = "id, address, created_at, updated_at";

/// Name of the unique constraint on `daos.address`.
pub const ADDRESS_UNIQUE_CONSTRAINT: &str = "uq_daos_address";

pub struct DaoRepo;

impl DaoRepo {
    /// Insert a registration. `address` must already be canonical; the
    /// table's check constraint rejects anything else.
    pub async fn create(pool: &PgPool, address: &str) -> Result<Dao, sqlx::Error> {
        let query = format!("INSERT INTO daos (address) VALUES ($1) RETURNING {COLUMNS}");
        sqlx::query_as::<_, Dao>(&query)
            .bind(address)
            .fetch_one(pool)
            .await
    }

    /// All registrations, oldest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Dao>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM daos ORDER BY created_at ASC, id ASC");
        sqlx::query_as::<_, Dao>(&query).fetch_all(pool).await
    }

    pub async fn find_by_address(pool: &PgPool, address: &str) -> Result<Option<Dao>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM daos WHERE address = $1");
        sqlx::query_as::<_, Dao>(&query)
            .bind(address)
            .fetch_optional(pool)
            .await
    }
}
