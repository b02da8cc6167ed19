//! Provider and customer profiles

use anyhow::Result;
use marketplace::models::{
    AvailabilityStatus, Customer, CustomerProfile, ProviderProfile, ServiceProvider,
};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

const PROVIDER_COLUMNS: &str = r#"
    provider_id, full_name, phone, email, expertise, rating, total_jobs,
    availability_status, created_at
"#;

fn provider_from_row(row: &PgRow) -> ServiceProvider {
    let availability: String = row.get("availability_status");
    ServiceProvider {
        provider_id: row.get("provider_id"),
        full_name: row.get("full_name"),
        phone: row.get("phone"),
        email: row.get("email"),
        expertise: row.get("expertise"),
        rating: row.get("rating"),
        total_jobs: row.get("total_jobs"),
        availability_status: AvailabilityStatus::from(availability),
        created_at: row.get("created_at"),
    }
}

fn customer_from_row(row: &PgRow) -> Customer {
    Customer {
        customer_id: row.get("customer_id"),
        full_name: row.get("full_name"),
        phone: row.get("phone"),
        email: row.get("email"),
        address: row.get("address"),
        created_at: row.get("created_at"),
    }
}

/// Service provider repository for database operations
#[derive(Clone)]
pub struct ProviderRepository {
    pool: PgPool,
}

impl ProviderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Providers ordered by rating, highest first
    pub async fn list(&self, limit: Option<i64>) -> Result<Vec<ServiceProvider>> {
        let query = format!(
            r#"
            SELECT {PROVIDER_COLUMNS}
            FROM service_providers
            ORDER BY rating DESC
            LIMIT $1
            "#
        );

        let rows = sqlx::query(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(provider_from_row).collect())
    }

    pub async fn find_available(&self) -> Result<Option<ServiceProvider>> {
        let query = format!(
            r#"
            SELECT {PROVIDER_COLUMNS}
            FROM service_providers
            WHERE availability_status = 'available'
            LIMIT 1
            "#
        );

        let row = sqlx::query(&query).fetch_optional(&self.pool).await?;

        Ok(row.as_ref().map(provider_from_row))
    }

    /// Create or update the provider row keyed by the account id
    pub async fn upsert(&self, profile: &ProviderProfile) -> Result<ServiceProvider> {
        let query = format!(
            r#"
            INSERT INTO service_providers
                (provider_id, full_name, phone, email, expertise, availability_status)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (provider_id) DO UPDATE SET
                full_name = EXCLUDED.full_name,
                phone = EXCLUDED.phone,
                email = EXCLUDED.email,
                expertise = EXCLUDED.expertise,
                availability_status = EXCLUDED.availability_status
            RETURNING {PROVIDER_COLUMNS}
            "#
        );

        let row = sqlx::query(&query)
            .bind(profile.provider_id)
            .bind(&profile.full_name)
            .bind(&profile.phone)
            .bind(&profile.email)
            .bind(&profile.expertise)
            .bind(profile.availability_status.as_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(provider_from_row(&row))
    }

    pub async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM service_providers")
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get("count"))
    }
}

/// Customer repository for database operations
#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn upsert(&self, profile: &CustomerProfile) -> Result<Customer> {
        let row = sqlx::query(
            r#"
            INSERT INTO customers (customer_id, full_name, phone, email, address)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (customer_id) DO UPDATE SET
                full_name = EXCLUDED.full_name,
                phone = EXCLUDED.phone,
                email = EXCLUDED.email,
                address = EXCLUDED.address
            RETURNING customer_id, full_name, phone, email, address, created_at
            "#,
        )
        .bind(profile.customer_id)
        .bind(&profile.full_name)
        .bind(&profile.phone)
        .bind(&profile.email)
        .bind(&profile.address)
        .fetch_one(&self.pool)
        .await?;

        Ok(customer_from_row(&row))
    }

    pub async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM customers")
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get("count"))
    }
}
