//! Categories and services

use anyhow::{Result, anyhow};
use marketplace::models::{NewCategory, NewService, Service, ServiceCategory, ServiceFilter};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

const SERVICE_COLUMNS: &str = r#"
    s.service_id, s.category_id, c.category_name, s.provider_id, s.service_name,
    s.description, s.base_price, s.duration_minutes, s.approved, s.created_at
"#;

fn category_from_row(row: &PgRow) -> ServiceCategory {
    ServiceCategory {
        category_id: row.get("category_id"),
        category_name: row.get("category_name"),
        description: row.get("description"),
        created_at: row.get("created_at"),
    }
}

fn service_from_row(row: &PgRow) -> Service {
    Service {
        service_id: row.get("service_id"),
        category_id: row.get("category_id"),
        category_name: row.get("category_name"),
        provider_id: row.get("provider_id"),
        service_name: row.get("service_name"),
        description: row.get("description"),
        base_price: row.get("base_price"),
        duration_minutes: row.get("duration_minutes"),
        approved: row.get("approved"),
        created_at: row.get("created_at"),
    }
}

/// Catalog repository for database operations
#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All categories ordered by name
    pub async fn list_categories(&self) -> Result<Vec<ServiceCategory>> {
        let rows = sqlx::query(
            r#"
            SELECT category_id, category_name, description, created_at
            FROM service_categories
            ORDER BY category_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(category_from_row).collect())
    }

    pub async fn insert_category(&self, category: &NewCategory) -> Result<ServiceCategory> {
        let row = sqlx::query(
            r#"
            INSERT INTO service_categories (category_name, description)
            VALUES ($1, $2)
            RETURNING category_id, category_name, description, created_at
            "#,
        )
        .bind(&category.category_name)
        .bind(&category.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(category_from_row(&row))
    }

    /// Services matching the filter, newest first. A `NULL` limit means no limit.
    pub async fn list_services(&self, filter: &ServiceFilter) -> Result<Vec<Service>> {
        let query = format!(
            r#"
            SELECT {SERVICE_COLUMNS}
            FROM services s
            LEFT JOIN service_categories c ON c.category_id = s.category_id
            WHERE ($1::BOOLEAN IS NULL OR s.approved = $1)
              AND ($2::UUID IS NULL OR s.category_id = $2)
              AND ($3::UUID IS NULL OR s.provider_id = $3)
            ORDER BY s.created_at DESC
            LIMIT $4
            "#
        );

        let rows = sqlx::query(&query)
            .bind(filter.approved)
            .bind(filter.category_id)
            .bind(filter.provider_id)
            .bind(filter.limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(service_from_row).collect())
    }

    pub async fn find_service(&self, service_id: Uuid) -> Result<Option<Service>> {
        let query = format!(
            r#"
            SELECT {SERVICE_COLUMNS}
            FROM services s
            LEFT JOIN service_categories c ON c.category_id = s.category_id
            WHERE s.service_id = $1
            "#
        );

        let row = sqlx::query(&query)
            .bind(service_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(service_from_row))
    }

    /// Insert an unapproved service and return it with its category name
    pub async fn insert_service(&self, service: &NewService) -> Result<Service> {
        let query = format!(
            r#"
            WITH s AS (
                INSERT INTO services
                    (category_id, provider_id, service_name, description, base_price,
                     duration_minutes, approved)
                VALUES ($1, $2, $3, $4, $5, $6, FALSE)
                RETURNING *
            )
            SELECT {SERVICE_COLUMNS}
            FROM s
            LEFT JOIN service_categories c ON c.category_id = s.category_id
            "#
        );

        let row = sqlx::query(&query)
            .bind(service.category_id)
            .bind(service.provider_id)
            .bind(&service.service_name)
            .bind(&service.description)
            .bind(service.base_price)
            .bind(service.duration_minutes)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| anyhow!("Service insert returned no row"))?;

        Ok(service_from_row(&row))
    }

    pub async fn approve_service(&self, service_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE services
            SET approved = TRUE
            WHERE service_id = $1
            "#,
        )
        .bind(service_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Approved services are never deleted
    pub async fn delete_service(&self, service_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM services
            WHERE service_id = $1 AND approved = FALSE
            "#,
        )
        .bind(service_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
