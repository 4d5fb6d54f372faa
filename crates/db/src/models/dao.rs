use keeper_core::registry::DaoRegistration;
use keeper_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `daos` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Dao {
    pub id: DbId,
    pub address: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<Dao> for DaoRegistration {
    fn from(row: Dao) -> Self {
        Self {
            address: row.address,
            registered_at: row.created_at,
        }
    }
}

/// Body of `POST /api/v1/daos`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDao {
    pub address: String,
}
