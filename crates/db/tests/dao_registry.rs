//! Registry persistence against a real database.

use assert_matches::assert_matches;
use keeper_core::error::CoreError;
use keeper_core::registry::{DaoRegistry, DUPLICATE_DAO_MESSAGE};
use keeper_db::repositories::DaoRepo;
use keeper_db::PgDaoRegistry;
use sqlx::PgPool;

const CHECKSUMMED: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";
const CANONICAL: &str = "0x742d35cc6634c0532925a3b844bc454e4438f44e";

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_health_check(pool: PgPool) {
    keeper_db::health_check(&pool).await.unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_add_stores_canonical_form(pool: PgPool) {
    let registry = PgDaoRegistry::new(pool.clone());

    let dao = registry.add(CHECKSUMMED).await.unwrap();
    assert_eq!(dao.address, CANONICAL);

    let row = DaoRepo::find_by_address(&pool, CANONICAL)
        .await
        .unwrap()
        .expect("row should exist");
    assert_eq!(row.address, CANONICAL);
    assert_eq!(row.created_at, dao.registered_at);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_in_any_case_is_a_conflict(pool: PgPool) {
    let registry = PgDaoRegistry::new(pool);
    registry.add(CANONICAL).await.unwrap();

    let err = registry.add(CHECKSUMMED).await.unwrap_err();
    assert_matches!(err, CoreError::Conflict(msg) if msg == DUPLICATE_DAO_MESSAGE);
    assert_eq!(registry.list_all().await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_malformed_address_is_rejected_before_insert(pool: PgPool) {
    let registry = PgDaoRegistry::new(pool.clone());

    for bad in ["invalid-address", "0x123", "742d35cc6634c0532925a3b844bc454e4438f44e"] {
        assert_matches!(registry.add(bad).await, Err(CoreError::Validation(_)));
    }
    assert!(DaoRepo::list(&pool).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_check_constraint_rejects_non_canonical_rows(pool: PgPool) {
    let result = DaoRepo::create(&pool, CHECKSUMMED).await;
    assert!(result.is_err(), "mixed-case address must violate the check constraint");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_find_is_case_insensitive(pool: PgPool) {
    let registry = PgDaoRegistry::new(pool);
    assert!(registry.find_by_address(CANONICAL).await.unwrap().is_none());

    registry.add(CANONICAL).await.unwrap();
    let found = registry.find_by_address(CHECKSUMMED).await.unwrap();
    assert_eq!(found.map(|dao| dao.address), Some(CANONICAL.to_string()));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_is_in_registration_order(pool: PgPool) {
    let registry = PgDaoRegistry::new(pool);
    let addresses = [
        "0x3333333333333333333333333333333333333333",
        "0x1111111111111111111111111111111111111111",
        "0x2222222222222222222222222222222222222222",
    ];
    for address in addresses {
        registry.add(address).await.unwrap();
    }

    let listed: Vec<String> = registry
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|dao| dao.address)
        .collect();
    assert_eq!(listed, addresses);
}
