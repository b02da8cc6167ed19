//! Repositories for database operations
//!
//! [`PgMarketplaceStore`] is the PostgreSQL implementation of the
//! marketplace data boundary. Database errors are logged and surfaced with
//! their message intact.

use async_trait::async_trait;
use marketplace::models::{
    Booking, BookingFilter, BookingStatus, BookingSummary, Customer, CustomerProfile, NewBooking,
    NewCategory, NewService, Payment, ProviderProfile, Service, ServiceCategory, ServiceFilter,
    ServiceProvider,
};
use marketplace::ports::MarketplaceStore;
use marketplace::{MarketplaceError, MarketplaceResult};
use sqlx::PgPool;
use tracing::{error, warn};
use uuid::Uuid;

pub mod bookings;
pub mod catalog;
pub mod people;

pub use bookings::BookingRepository;
pub use catalog::CatalogRepository;
pub use people::{CustomerRepository, ProviderRepository};

fn store_error(e: anyhow::Error) -> MarketplaceError {
    error!("Database error: {:#}", e);
    MarketplaceError::Store(e.to_string())
}

/// PostgreSQL backed marketplace store
#[derive(Clone)]
pub struct PgMarketplaceStore {
    catalog: CatalogRepository,
    providers: ProviderRepository,
    customers: CustomerRepository,
    bookings: BookingRepository,
}

impl PgMarketplaceStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            catalog: CatalogRepository::new(pool.clone()),
            providers: ProviderRepository::new(pool.clone()),
            customers: CustomerRepository::new(pool.clone()),
            bookings: BookingRepository::new(pool),
        }
    }
}

#[async_trait]
impl MarketplaceStore for PgMarketplaceStore {
    async fn list_categories(&self) -> MarketplaceResult<Vec<ServiceCategory>> {
        self.catalog.list_categories().await.map_err(store_error)
    }

    async fn insert_category(&self, category: NewCategory) -> MarketplaceResult<ServiceCategory> {
        self.catalog
            .insert_category(&category)
            .await
            .map_err(store_error)
    }

    async fn list_services(&self, filter: ServiceFilter) -> MarketplaceResult<Vec<Service>> {
        self.catalog
            .list_services(&filter)
            .await
            .map_err(store_error)
    }

    async fn get_service(&self, service_id: Uuid) -> MarketplaceResult<Option<Service>> {
        self.catalog
            .find_service(service_id)
            .await
            .map_err(store_error)
    }

    async fn insert_service(&self, service: NewService) -> MarketplaceResult<Service> {
        self.catalog
            .insert_service(&service)
            .await
            .map_err(store_error)
    }

    async fn approve_service(&self, service_id: Uuid) -> MarketplaceResult<bool> {
        self.catalog
            .approve_service(service_id)
            .await
            .map_err(store_error)
    }

    async fn delete_service(&self, service_id: Uuid) -> MarketplaceResult<bool> {
        self.catalog
            .delete_service(service_id)
            .await
            .map_err(store_error)
    }

    async fn list_providers(&self, limit: Option<i64>) -> MarketplaceResult<Vec<ServiceProvider>> {
        self.providers.list(limit).await.map_err(store_error)
    }

    async fn find_available_provider(&self) -> MarketplaceResult<Option<ServiceProvider>> {
        self.providers.find_available().await.map_err(store_error)
    }

    async fn upsert_provider(&self, profile: ProviderProfile) -> MarketplaceResult<ServiceProvider> {
        self.providers.upsert(&profile).await.map_err(store_error)
    }

    async fn count_providers(&self) -> MarketplaceResult<i64> {
        self.providers.count().await.map_err(store_error)
    }

    async fn upsert_customer(&self, profile: CustomerProfile) -> MarketplaceResult<Customer> {
        self.customers.upsert(&profile).await.map_err(store_error)
    }

    async fn count_customers(&self) -> MarketplaceResult<i64> {
        self.customers.count().await.map_err(store_error)
    }

    async fn insert_booking(&self, booking: NewBooking) -> MarketplaceResult<Booking> {
        match self
            .bookings
            .insert_if_provider_available(&booking)
            .await
            .map_err(store_error)?
        {
            Some(booking) => Ok(booking),
            None => {
                warn!(
                    "Provider {} became unavailable before the booking was written",
                    booking.provider_id
                );
                Err(MarketplaceError::NoProvidersAvailable)
            }
        }
    }

    async fn list_bookings(&self, filter: BookingFilter) -> MarketplaceResult<Vec<BookingSummary>> {
        self.bookings.list(&filter).await.map_err(store_error)
    }

    async fn get_booking(&self, booking_id: Uuid) -> MarketplaceResult<Option<Booking>> {
        self.bookings
            .find_by_id(booking_id)
            .await
            .map_err(store_error)
    }

    async fn set_booking_status(
        &self,
        booking_id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> MarketplaceResult<bool> {
        self.bookings
            .set_status(booking_id, from, to)
            .await
            .map_err(store_error)
    }

    async fn list_payments(&self, booking_id: Uuid) -> MarketplaceResult<Vec<Payment>> {
        self.bookings
            .list_payments(booking_id)
            .await
            .map_err(store_error)
    }
}
