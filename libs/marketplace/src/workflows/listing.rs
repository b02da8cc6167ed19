//! Read-side listings: catalogue, providers, bookings and dashboards

use serde::Serialize;
use uuid::Uuid;

use crate::error::{MarketplaceError, MarketplaceResult};
use crate::models::{
    Booking, BookingFilter, BookingSummary, Payment, Role, Service, ServiceFilter,
    ServiceProvider, Session,
};
use crate::ports::MarketplaceStore;

/// Number of entries on the landing page shelves
pub const FEATURED_LIMIT: i64 = 6;

/// Approved services, optionally narrowed to one category
pub async fn browse_services<S>(
    store: &S,
    category_id: Option<Uuid>,
) -> MarketplaceResult<Vec<Service>>
where
    S: MarketplaceStore + ?Sized,
{
    store
        .list_services(ServiceFilter::approved().in_category(category_id))
        .await
}

pub async fn featured_services<S>(store: &S) -> MarketplaceResult<Vec<Service>>
where
    S: MarketplaceStore + ?Sized,
{
    store
        .list_services(ServiceFilter::approved().limit(FEATURED_LIMIT))
        .await
}

/// One service as shown on the booking page. Unapproved services are hidden.
pub async fn service_for_booking<S>(store: &S, service_id: Uuid) -> MarketplaceResult<Service>
where
    S: MarketplaceStore + ?Sized,
{
    store
        .get_service(service_id)
        .await?
        .filter(|service| service.approved)
        .ok_or(MarketplaceError::ServiceNotFound(service_id))
}

pub async fn list_providers<S>(store: &S) -> MarketplaceResult<Vec<ServiceProvider>>
where
    S: MarketplaceStore + ?Sized,
{
    store.list_providers(None).await
}

pub async fn top_providers<S>(store: &S) -> MarketplaceResult<Vec<ServiceProvider>>
where
    S: MarketplaceStore + ?Sized,
{
    store.list_providers(Some(FEATURED_LIMIT)).await
}

fn booking_filter(session: &Session) -> BookingFilter {
    match session.role {
        Role::Admin => BookingFilter::default(),
        Role::Provider => BookingFilter::for_provider(session.user_id),
        Role::Client => BookingFilter::for_customer(session.user_id),
    }
}

/// Bookings visible to the session, newest first
pub async fn list_bookings_for<S>(
    store: &S,
    session: &Session,
) -> MarketplaceResult<Vec<BookingSummary>>
where
    S: MarketplaceStore + ?Sized,
{
    store.list_bookings(booking_filter(session)).await
}

/// A booking together with its payments
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingDetail {
    pub booking: Booking,
    pub payments: Vec<Payment>,
}

impl BookingDetail {
    /// Customer, provider and admins may look at a booking
    pub async fn load<S>(store: &S, session: &Session, booking_id: Uuid) -> MarketplaceResult<Self>
    where
        S: MarketplaceStore + ?Sized,
    {
        let booking = store
            .get_booking(booking_id)
            .await?
            .ok_or(MarketplaceError::BookingNotFound(booking_id))?;

        if !booking_filter(session).matches(&booking) {
            return Err(MarketplaceError::Forbidden);
        }

        let payments = store.list_payments(booking_id).await?;
        Ok(Self { booking, payments })
    }
}

/// Client dashboard: what can be booked and what was booked
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientDashboard {
    pub services: Vec<Service>,
    pub bookings: Vec<BookingSummary>,
}

impl ClientDashboard {
    pub async fn load<S>(store: &S, session: &Session) -> MarketplaceResult<Self>
    where
        S: MarketplaceStore + ?Sized,
    {
        if !session.has_role(Role::Client) {
            return Err(MarketplaceError::Forbidden);
        }

        Ok(Self {
            services: store.list_services(ServiceFilter::approved()).await?,
            bookings: store
                .list_bookings(BookingFilter::for_customer(session.user_id))
                .await?,
        })
    }
}
