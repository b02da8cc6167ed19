//! Bookings and their payments

use anyhow::{Result, anyhow};
use marketplace::models::{
    Booking, BookingFilter, BookingStatus, BookingSummary, NewBooking, Payment, PaymentMethod,
};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

const BOOKING_COLUMNS: &str = r#"
    b.booking_id, b.customer_id, b.provider_id, b.service_id, b.booking_date,
    b.booking_time, b.address, b.phone, b.status, b.total_amount, b.notes, b.created_at
"#;

fn booking_from_row(row: &PgRow) -> Result<Booking> {
    let status: String = row.get("status");
    let status: BookingStatus = status.parse().map_err(|e: String| anyhow!(e))?;

    Ok(Booking {
        booking_id: row.get("booking_id"),
        customer_id: row.get("customer_id"),
        provider_id: row.get("provider_id"),
        service_id: row.get("service_id"),
        booking_date: row.get("booking_date"),
        booking_time: row.get("booking_time"),
        address: row.get("address"),
        phone: row.get("phone"),
        status,
        total_amount: row.get("total_amount"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
    })
}

fn summary_from_row(row: &PgRow) -> Result<BookingSummary> {
    Ok(BookingSummary {
        booking: booking_from_row(row)?,
        service_name: row.get("service_name"),
        service_price: row.get("service_price"),
        provider_name: row.get("provider_name"),
        provider_phone: row.get("provider_phone"),
        provider_expertise: row.get("provider_expertise"),
        customer_name: row.get("customer_name"),
        customer_phone: row.get("customer_phone"),
        customer_address: row.get("customer_address"),
    })
}

fn payment_from_row(row: &PgRow) -> Result<Payment> {
    let method: String = row.get("payment_method");
    let payment_method: PaymentMethod = method.parse().map_err(|e: String| anyhow!(e))?;

    Ok(Payment {
        payment_id: row.get("payment_id"),
        booking_id: row.get("booking_id"),
        amount: row.get("amount"),
        payment_date: row.get("payment_date"),
        payment_method,
        transaction_id: row.get("transaction_id"),
        status: row.get("status"),
        created_at: row.get("created_at"),
    })
}

/// Booking repository for database operations
#[derive(Clone)]
pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a booking only while its provider is still available.
    ///
    /// Returns `None` when the availability check fails, in which case no
    /// row is written.
    pub async fn insert_if_provider_available(
        &self,
        booking: &NewBooking,
    ) -> Result<Option<Booking>> {
        let query = format!(
            r#"
            WITH b AS (
                INSERT INTO bookings
                    (customer_id, provider_id, service_id, booking_date, booking_time,
                     address, phone, status, total_amount, notes)
                SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10
                WHERE EXISTS (
                    SELECT 1 FROM service_providers
                    WHERE provider_id = $2 AND availability_status = 'available'
                )
                RETURNING *
            )
            SELECT {BOOKING_COLUMNS}
            FROM b
            "#
        );

        let row = sqlx::query(&query)
            .bind(booking.customer_id)
            .bind(booking.provider_id)
            .bind(booking.service_id)
            .bind(booking.booking_date)
            .bind(booking.booking_time)
            .bind(&booking.address)
            .bind(&booking.phone)
            .bind(booking.status.as_str())
            .bind(booking.total_amount)
            .bind(&booking.notes)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(booking_from_row).transpose()
    }

    /// Bookings with their service, provider and customer names, newest first
    pub async fn list(&self, filter: &BookingFilter) -> Result<Vec<BookingSummary>> {
        let query = format!(
            r#"
            SELECT {BOOKING_COLUMNS},
                   s.service_name,
                   s.base_price AS service_price,
                   p.full_name AS provider_name,
                   p.phone AS provider_phone,
                   p.expertise AS provider_expertise,
                   c.full_name AS customer_name,
                   c.phone AS customer_phone,
                   c.address AS customer_address
            FROM bookings b
            LEFT JOIN services s ON s.service_id = b.service_id
            LEFT JOIN service_providers p ON p.provider_id = b.provider_id
            LEFT JOIN customers c ON c.customer_id = b.customer_id
            WHERE ($1::UUID IS NULL OR b.customer_id = $1)
              AND ($2::UUID IS NULL OR b.provider_id = $2)
            ORDER BY b.created_at DESC
            "#
        );

        let rows = sqlx::query(&query)
            .bind(filter.customer_id)
            .bind(filter.provider_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(summary_from_row).collect()
    }

    pub async fn find_by_id(&self, booking_id: Uuid) -> Result<Option<Booking>> {
        let query = format!(
            r#"
            SELECT {BOOKING_COLUMNS}
            FROM bookings b
            WHERE b.booking_id = $1
            "#
        );

        let row = sqlx::query(&query)
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(booking_from_row).transpose()
    }

    /// Conditional status write: only matches while the stored status is `from`
    pub async fn set_status(
        &self,
        booking_id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = $3
            WHERE booking_id = $1 AND status = $2
            "#,
        )
        .bind(booking_id)
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_payments(&self, booking_id: Uuid) -> Result<Vec<Payment>> {
        let rows = sqlx::query(
            r#"
            SELECT payment_id, booking_id, amount, payment_date, payment_method,
                   transaction_id, status, created_at
            FROM payments
            WHERE booking_id = $1
            ORDER BY payment_date DESC
            "#,
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(payment_from_row).collect()
    }
}
