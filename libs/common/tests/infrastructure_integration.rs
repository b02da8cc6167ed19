//! Integration tests for the infrastructure components
//!
//! These tests verify that PostgreSQL and Redis are reachable, that the
//! embedded migrations apply, and that the session cache round-trips values.
//! They need running services and are ignored by default:
//! `cargo test -p common -- --ignored`.

use common::{
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, health_check, init_pool, run_migrations},
};
use sqlx::Row;

#[tokio::test]
#[ignore = "requires running PostgreSQL and Redis"]
async fn test_infrastructure_integration() -> Result<(), Box<dyn std::error::Error>> {
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    assert!(health_check(&pool).await?, "Database health check failed");

    run_migrations(&pool).await?;

    let row = sqlx::query(
        "SELECT COUNT(*) AS tables FROM information_schema.tables \
         WHERE table_name IN ('users', 'services', 'bookings', 'payments')",
    )
    .fetch_one(&pool)
    .await?;
    let tables: i64 = row.get("tables");
    assert_eq!(tables, 4, "Migrations did not create the expected tables");

    let redis_config = RedisConfig::from_env()?;
    let redis_pool = RedisPool::new(&redis_config).await?;

    assert!(
        redis_pool.health_check().await?,
        "Redis health check failed"
    );

    let test_key = "integration_test_session";
    let test_value = "refresh-token";

    redis_pool.set(test_key, test_value, Some(10)).await?;
    let retrieved_value = redis_pool.get(test_key).await?;
    assert_eq!(retrieved_value, Some(test_value.to_string()));

    redis_pool.delete(test_key).await?;
    let retrieved_value = redis_pool.get(test_key).await?;
    assert_eq!(retrieved_value, None, "Redis delete operation failed");

    Ok(())
}
