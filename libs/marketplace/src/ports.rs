//! Boundaries the marketplace workflows talk to
//!
//! The identity boundary authenticates principals and owns the role
//! attribute. The data boundary owns the marketplace tables. Workflows only
//! ever see these traits; the services plug in PostgreSQL/Redis backed
//! implementations and tests plug in the mocks from [`crate::testing`].

use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::MarketplaceResult;
use crate::models::{
    AuthSession, Booking, BookingFilter, BookingStatus, BookingSummary, Credentials, Customer,
    CustomerProfile, NewBooking, NewCategory, NewService, Payment, Principal, ProviderProfile,
    Role, Service, ServiceCategory, ServiceFilter, ServiceProvider, SessionEvent,
};

/// Identity boundary: authentication and the mutable role attribute
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Register a new account with its initial role
    async fn sign_up(&self, credentials: &Credentials, role: Role) -> MarketplaceResult<Principal>;

    /// Check an email/password pair
    async fn authenticate(&self, credentials: &Credentials) -> MarketplaceResult<Principal>;

    /// Overwrite the role attribute of an account
    async fn update_role(&self, user_id: Uuid, role: Role) -> MarketplaceResult<Principal>;

    /// Issue bearer tokens for an authenticated principal
    async fn issue_session(&self, principal: &Principal) -> MarketplaceResult<AuthSession>;

    /// Exchange a refresh token for a new token pair, revoking the old one
    async fn refresh_session(&self, refresh_token: &str) -> MarketplaceResult<AuthSession>;

    /// Revoke the session identified by a refresh token
    async fn sign_out(&self, refresh_token: &str) -> MarketplaceResult<()>;

    /// Receive session-change notifications
    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;
}

/// Data boundary: the marketplace tables
#[async_trait]
pub trait MarketplaceStore: Send + Sync {
    /// All categories ordered by name
    async fn list_categories(&self) -> MarketplaceResult<Vec<ServiceCategory>>;

    async fn insert_category(&self, category: NewCategory) -> MarketplaceResult<ServiceCategory>;

    async fn list_services(&self, filter: ServiceFilter) -> MarketplaceResult<Vec<Service>>;

    async fn get_service(&self, service_id: Uuid) -> MarketplaceResult<Option<Service>>;

    /// Insert an unapproved service
    async fn insert_service(&self, service: NewService) -> MarketplaceResult<Service>;

    /// Set approved = true; returns whether a row matched
    async fn approve_service(&self, service_id: Uuid) -> MarketplaceResult<bool>;

    /// Delete the service row if it is still unapproved; returns whether a row matched
    async fn delete_service(&self, service_id: Uuid) -> MarketplaceResult<bool>;

    /// Providers ordered by rating, highest first
    async fn list_providers(&self, limit: Option<i64>) -> MarketplaceResult<Vec<ServiceProvider>>;

    /// Any one provider whose availability status is `available`
    async fn find_available_provider(&self) -> MarketplaceResult<Option<ServiceProvider>>;

    async fn upsert_provider(&self, profile: ProviderProfile) -> MarketplaceResult<ServiceProvider>;

    async fn count_providers(&self) -> MarketplaceResult<i64>;

    async fn upsert_customer(&self, profile: CustomerProfile) -> MarketplaceResult<Customer>;

    async fn count_customers(&self) -> MarketplaceResult<i64>;

    /// Insert a booking.
    ///
    /// Implementations must refuse the insert with
    /// [`MarketplaceError::NoProvidersAvailable`](crate::MarketplaceError::NoProvidersAvailable)
    /// when the referenced provider is no longer available.
    async fn insert_booking(&self, booking: NewBooking) -> MarketplaceResult<Booking>;

    /// Bookings matching the filter, newest first
    async fn list_bookings(&self, filter: BookingFilter) -> MarketplaceResult<Vec<BookingSummary>>;

    async fn get_booking(&self, booking_id: Uuid) -> MarketplaceResult<Option<Booking>>;

    /// Move the booking from `from` to `to` in one conditional write.
    ///
    /// Returns `false` when the booking is missing or its stored status is
    /// no longer `from`.
    async fn set_booking_status(
        &self,
        booking_id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> MarketplaceResult<bool>;

    async fn list_payments(&self, booking_id: Uuid) -> MarketplaceResult<Vec<Payment>>;
}
