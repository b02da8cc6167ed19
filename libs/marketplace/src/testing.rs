//! In-memory boundary implementations for tests
//!
//! Both mocks record the calls they receive so tests can assert on exactly
//! which boundary operations a workflow issued.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::{MarketplaceError, MarketplaceResult};
use crate::models::{
    AuthSession, AvailabilityStatus, Booking, BookingFilter, BookingStatus, BookingSummary,
    Credentials, Customer, CustomerProfile, NewBooking, NewCategory, NewService, Payment,
    Principal, ProviderProfile, Role, Service, ServiceCategory, ServiceFilter, ServiceProvider,
    SessionEvent, SessionEventKind, TokenPair,
};
use crate::ports::{IdentityProvider, MarketplaceStore};

/// Approved or pending service in a fresh category
pub fn sample_service(approved: bool) -> Service {
    Service {
        service_id: Uuid::new_v4(),
        category_id: Uuid::new_v4(),
        category_name: Some("Cleaning".to_string()),
        provider_id: Uuid::new_v4(),
        service_name: "Home Deep Clean".to_string(),
        description: Some("Full apartment".to_string()),
        base_price: 2500.0,
        duration_minutes: 180,
        approved,
        created_at: Utc::now(),
    }
}

pub fn sample_provider(availability_status: AvailabilityStatus) -> ServiceProvider {
    ServiceProvider {
        provider_id: Uuid::new_v4(),
        full_name: "Karim Uddin".to_string(),
        phone: "01711000000".to_string(),
        email: Some("karim@example.com".to_string()),
        expertise: Some("Cleaning".to_string()),
        rating: 4.5,
        total_jobs: 12,
        availability_status,
        created_at: Utc::now(),
    }
}

pub fn sample_booking(status: BookingStatus) -> Booking {
    Booking {
        booking_id: Uuid::new_v4(),
        customer_id: Uuid::new_v4(),
        provider_id: Uuid::new_v4(),
        service_id: Uuid::new_v4(),
        booking_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap_or_default(),
        booking_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap_or_default(),
        address: "House 1".to_string(),
        phone: "017...".to_string(),
        status,
        total_amount: Some(2500.0),
        notes: None,
        created_at: Utc::now(),
    }
}

#[derive(Default)]
struct StoreState {
    categories: Vec<ServiceCategory>,
    services: Vec<Service>,
    providers: Vec<ServiceProvider>,
    customers: Vec<Customer>,
    bookings: Vec<Booking>,
    payments: Vec<Payment>,
    inserted_bookings: Vec<NewBooking>,
    approve_calls: Vec<Uuid>,
    delete_calls: Vec<Uuid>,
    calls: usize,
    failure: Option<String>,
    concurrent_status: Option<BookingStatus>,
}

impl StoreState {
    /// Count the call and return the configured write failure, if any
    fn write(&mut self) -> MarketplaceResult<()> {
        self.calls += 1;
        match &self.failure {
            Some(message) => Err(MarketplaceError::Store(message.clone())),
            None => Ok(()),
        }
    }

    fn read(&mut self) {
        self.calls += 1;
    }

    fn summarize(&self, booking: &Booking) -> BookingSummary {
        let service = self
            .services
            .iter()
            .find(|s| s.service_id == booking.service_id);
        let provider = self
            .providers
            .iter()
            .find(|p| p.provider_id == booking.provider_id);
        let customer = self
            .customers
            .iter()
            .find(|c| c.customer_id == booking.customer_id);

        BookingSummary {
            booking: booking.clone(),
            service_name: service.map(|s| s.service_name.clone()),
            service_price: service.map(|s| s.base_price),
            provider_name: provider.map(|p| p.full_name.clone()),
            provider_phone: provider.map(|p| p.phone.clone()),
            provider_expertise: provider.and_then(|p| p.expertise.clone()),
            customer_name: customer.map(|c| c.full_name.clone()),
            customer_phone: customer.map(|c| c.phone.clone()),
            customer_address: customer.and_then(|c| c.address.clone()),
        }
    }
}

/// In-memory data boundary.
///
/// Reads always succeed; after [`MockStore::failing_with`] every write
/// returns the given message as a store error.
#[derive(Clone, Default)]
pub struct MockStore {
    state: Arc<Mutex<StoreState>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().expect("mock store poisoned")
    }

    pub fn with_service(self, service: Service) -> Self {
        self.state().services.push(service);
        self
    }

    pub fn with_provider(self, provider: ServiceProvider) -> Self {
        self.state().providers.push(provider);
        self
    }

    pub fn with_booking(self, booking: Booking) -> Self {
        self.state().bookings.push(booking);
        self
    }

    pub fn with_payment(self, payment: Payment) -> Self {
        self.state().payments.push(payment);
        self
    }

    /// Have another writer move the next booking read to `status`, right
    /// after the read returned
    pub fn with_concurrent_status(self, status: BookingStatus) -> Self {
        self.state().concurrent_status = Some(status);
        self
    }

    pub fn failing_with(self, message: &str) -> Self {
        self.state().failure = Some(message.to_string());
        self
    }

    /// Number of boundary calls received, reads included
    pub fn call_count(&self) -> usize {
        self.state().calls
    }

    pub fn inserted_bookings(&self) -> Vec<NewBooking> {
        self.state().inserted_bookings.clone()
    }

    pub fn approve_calls(&self) -> Vec<Uuid> {
        self.state().approve_calls.clone()
    }

    pub fn delete_calls(&self) -> Vec<Uuid> {
        self.state().delete_calls.clone()
    }

    pub fn service(&self, service_id: Uuid) -> Option<Service> {
        self.state()
            .services
            .iter()
            .find(|s| s.service_id == service_id)
            .cloned()
    }

    pub fn booking(&self, booking_id: Uuid) -> Option<Booking> {
        self.state()
            .bookings
            .iter()
            .find(|b| b.booking_id == booking_id)
            .cloned()
    }
}

#[async_trait]
impl MarketplaceStore for MockStore {
    async fn list_categories(&self) -> MarketplaceResult<Vec<ServiceCategory>> {
        let mut state = self.state();
        state.read();
        let mut categories = state.categories.clone();
        categories.sort_by(|a, b| a.category_name.cmp(&b.category_name));
        Ok(categories)
    }

    async fn insert_category(&self, category: NewCategory) -> MarketplaceResult<ServiceCategory> {
        let mut state = self.state();
        state.write()?;
        let category = ServiceCategory {
            category_id: Uuid::new_v4(),
            category_name: category.category_name,
            description: category.description,
            created_at: Utc::now(),
        };
        state.categories.push(category.clone());
        Ok(category)
    }

    async fn list_services(&self, filter: ServiceFilter) -> MarketplaceResult<Vec<Service>> {
        let mut state = self.state();
        state.read();
        let limit = filter
            .limit
            .and_then(|limit| usize::try_from(limit).ok())
            .unwrap_or(usize::MAX);
        Ok(state
            .services
            .iter()
            .filter(|service| filter.matches(service))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get_service(&self, service_id: Uuid) -> MarketplaceResult<Option<Service>> {
        let mut state = self.state();
        state.read();
        Ok(state
            .services
            .iter()
            .find(|s| s.service_id == service_id)
            .cloned())
    }

    async fn insert_service(&self, service: NewService) -> MarketplaceResult<Service> {
        let mut state = self.state();
        state.write()?;
        let category_name = state
            .categories
            .iter()
            .find(|c| c.category_id == service.category_id)
            .map(|c| c.category_name.clone());
        let service = Service {
            service_id: Uuid::new_v4(),
            category_id: service.category_id,
            category_name,
            provider_id: service.provider_id,
            service_name: service.service_name,
            description: service.description,
            base_price: service.base_price,
            duration_minutes: service.duration_minutes,
            approved: false,
            created_at: Utc::now(),
        };
        state.services.push(service.clone());
        Ok(service)
    }

    async fn approve_service(&self, service_id: Uuid) -> MarketplaceResult<bool> {
        let mut state = self.state();
        state.write()?;
        state.approve_calls.push(service_id);
        match state.services.iter_mut().find(|s| s.service_id == service_id) {
            Some(service) => {
                service.approved = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_service(&self, service_id: Uuid) -> MarketplaceResult<bool> {
        let mut state = self.state();
        state.write()?;
        state.delete_calls.push(service_id);
        let before = state.services.len();
        state
            .services
            .retain(|s| s.service_id != service_id || s.approved);
        Ok(state.services.len() != before)
    }

    async fn list_providers(&self, limit: Option<i64>) -> MarketplaceResult<Vec<ServiceProvider>> {
        let mut state = self.state();
        state.read();
        let mut providers = state.providers.clone();
        providers.sort_by(|a, b| b.rating.total_cmp(&a.rating));
        if let Some(limit) = limit.and_then(|limit| usize::try_from(limit).ok()) {
            providers.truncate(limit);
        }
        Ok(providers)
    }

    async fn find_available_provider(&self) -> MarketplaceResult<Option<ServiceProvider>> {
        let mut state = self.state();
        state.read();
        Ok(state
            .providers
            .iter()
            .find(|p| p.availability_status.is_available())
            .cloned())
    }

    async fn upsert_provider(&self, profile: ProviderProfile) -> MarketplaceResult<ServiceProvider> {
        let mut state = self.state();
        state.write()?;
        let existing = state
            .providers
            .iter_mut()
            .find(|p| p.provider_id == profile.provider_id);
        let provider = match existing {
            Some(provider) => {
                provider.full_name = profile.full_name;
                provider.phone = profile.phone;
                provider.email = profile.email;
                provider.expertise = profile.expertise;
                provider.availability_status = profile.availability_status;
                provider.clone()
            }
            None => {
                let provider = ServiceProvider {
                    provider_id: profile.provider_id,
                    full_name: profile.full_name,
                    phone: profile.phone,
                    email: profile.email,
                    expertise: profile.expertise,
                    rating: 0.0,
                    total_jobs: 0,
                    availability_status: profile.availability_status,
                    created_at: Utc::now(),
                };
                state.providers.push(provider.clone());
                provider
            }
        };
        Ok(provider)
    }

    async fn count_providers(&self) -> MarketplaceResult<i64> {
        let mut state = self.state();
        state.read();
        Ok(state.providers.len() as i64)
    }

    async fn upsert_customer(&self, profile: CustomerProfile) -> MarketplaceResult<Customer> {
        let mut state = self.state();
        state.write()?;
        let customer = Customer {
            customer_id: profile.customer_id,
            full_name: profile.full_name,
            phone: profile.phone,
            email: profile.email,
            address: profile.address,
            created_at: Utc::now(),
        };
        state
            .customers
            .retain(|c| c.customer_id != customer.customer_id);
        state.customers.push(customer.clone());
        Ok(customer)
    }

    async fn count_customers(&self) -> MarketplaceResult<i64> {
        let mut state = self.state();
        state.read();
        Ok(state.customers.len() as i64)
    }

    async fn insert_booking(&self, booking: NewBooking) -> MarketplaceResult<Booking> {
        let mut state = self.state();
        state.write()?;
        let provider_available = state
            .providers
            .iter()
            .any(|p| p.provider_id == booking.provider_id && p.availability_status.is_available());
        if !provider_available {
            return Err(MarketplaceError::NoProvidersAvailable);
        }

        state.inserted_bookings.push(booking.clone());
        let booking = Booking {
            booking_id: Uuid::new_v4(),
            customer_id: booking.customer_id,
            provider_id: booking.provider_id,
            service_id: booking.service_id,
            booking_date: booking.booking_date,
            booking_time: booking.booking_time,
            address: booking.address,
            phone: booking.phone,
            status: booking.status,
            total_amount: booking.total_amount,
            notes: booking.notes,
            created_at: Utc::now(),
        };
        state.bookings.push(booking.clone());
        Ok(booking)
    }

    async fn list_bookings(&self, filter: BookingFilter) -> MarketplaceResult<Vec<BookingSummary>> {
        let mut state = self.state();
        state.read();
        let mut bookings: Vec<&Booking> = state
            .bookings
            .iter()
            .filter(|booking| filter.matches(booking))
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings
            .into_iter()
            .map(|booking| state.summarize(booking))
            .collect())
    }

    async fn get_booking(&self, booking_id: Uuid) -> MarketplaceResult<Option<Booking>> {
        let mut state = self.state();
        state.read();
        let concurrent_status = state.concurrent_status.take();
        let Some(booking) = state
            .bookings
            .iter_mut()
            .find(|b| b.booking_id == booking_id)
        else {
            return Ok(None);
        };
        let found = booking.clone();
        if let Some(status) = concurrent_status {
            booking.status = status;
        }
        Ok(Some(found))
    }

    async fn set_booking_status(
        &self,
        booking_id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> MarketplaceResult<bool> {
        let mut state = self.state();
        state.write()?;
        match state
            .bookings
            .iter_mut()
            .find(|b| b.booking_id == booking_id && b.status == from)
        {
            Some(booking) => {
                booking.status = to;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_payments(&self, booking_id: Uuid) -> MarketplaceResult<Vec<Payment>> {
        let mut state = self.state();
        state.read();
        Ok(state
            .payments
            .iter()
            .filter(|p| p.booking_id == booking_id)
            .cloned()
            .collect())
    }
}

struct IdentityState {
    users: HashMap<String, (String, Principal)>,
    revoked: Vec<String>,
    update_role_calls: usize,
    call_log: Vec<&'static str>,
}

/// In-memory identity boundary keyed by email
#[derive(Clone)]
pub struct MockIdentity {
    state: Arc<Mutex<IdentityState>>,
    events: broadcast::Sender<SessionEvent>,
}

impl Default for MockIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl MockIdentity {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            state: Arc::new(Mutex::new(IdentityState {
                users: HashMap::new(),
                revoked: Vec::new(),
                update_role_calls: 0,
                call_log: Vec::new(),
            })),
            events,
        }
    }

    fn state(&self) -> MutexGuard<'_, IdentityState> {
        self.state.lock().expect("mock identity poisoned")
    }

    pub fn with_user(self, credentials: &Credentials, role: Option<Role>) -> Self {
        let principal = Principal {
            user_id: Uuid::new_v4(),
            email: credentials.email.clone(),
            role,
        };
        self.state().users.insert(
            credentials.email.clone(),
            (credentials.password.clone(), principal),
        );
        self
    }

    pub fn update_role_calls(&self) -> usize {
        self.state().update_role_calls
    }

    /// Names of the trait methods called, in order
    pub fn call_log(&self) -> Vec<&'static str> {
        self.state().call_log.clone()
    }

    pub fn revoked_tokens(&self) -> Vec<String> {
        self.state().revoked.clone()
    }

    fn publish(&self, kind: SessionEventKind, principal: &Principal) {
        // No subscribers is fine
        let _ = self
            .events
            .send(SessionEvent::new(kind, principal.user_id, principal.role));
    }
}

#[async_trait]
impl IdentityProvider for MockIdentity {
    async fn sign_up(&self, credentials: &Credentials, role: Role) -> MarketplaceResult<Principal> {
        let principal = {
            let mut state = self.state();
            state.call_log.push("sign_up");
            if state.users.contains_key(&credentials.email) {
                return Err(MarketplaceError::Identity(
                    "User already registered".to_string(),
                ));
            }
            let principal = Principal {
                user_id: Uuid::new_v4(),
                email: credentials.email.clone(),
                role: Some(role),
            };
            state.users.insert(
                credentials.email.clone(),
                (credentials.password.clone(), principal.clone()),
            );
            principal
        };
        self.publish(SessionEventKind::SignedUp, &principal);
        Ok(principal)
    }

    async fn authenticate(&self, credentials: &Credentials) -> MarketplaceResult<Principal> {
        let mut state = self.state();
        state.call_log.push("authenticate");
        match state.users.get(&credentials.email) {
            Some((password, principal)) if *password == credentials.password => {
                Ok(principal.clone())
            }
            _ => Err(MarketplaceError::Identity(
                "Invalid login credentials".to_string(),
            )),
        }
    }

    async fn update_role(&self, user_id: Uuid, role: Role) -> MarketplaceResult<Principal> {
        let principal = {
            let mut state = self.state();
            state.call_log.push("update_role");
            state.update_role_calls += 1;
            let (_, principal) = state
                .users
                .values_mut()
                .find(|(_, principal)| principal.user_id == user_id)
                .ok_or_else(|| MarketplaceError::Identity("User not found".to_string()))?;
            principal.role = Some(role);
            principal.clone()
        };
        self.publish(SessionEventKind::RoleUpdated, &principal);
        Ok(principal)
    }

    async fn issue_session(&self, principal: &Principal) -> MarketplaceResult<AuthSession> {
        self.state().call_log.push("issue_session");
        self.publish(SessionEventKind::SignedIn, principal);
        Ok(AuthSession {
            principal: principal.clone(),
            tokens: TokenPair {
                access_token: format!("access-{}", principal.user_id),
                refresh_token: format!("refresh-{}.{}", principal.user_id, Uuid::new_v4()),
                token_type: "Bearer".to_string(),
                expires_in: 900,
            },
        })
    }

    async fn refresh_session(&self, refresh_token: &str) -> MarketplaceResult<AuthSession> {
        let principal = {
            let mut state = self.state();
            state.call_log.push("refresh_session");
            let invalid = || MarketplaceError::Identity("Invalid refresh token".to_string());
            if state.revoked.iter().any(|t| t == refresh_token) {
                return Err(invalid());
            }
            let user_id = refresh_token
                .strip_prefix("refresh-")
                .and_then(|rest| rest.split('.').next())
                .and_then(|id| Uuid::parse_str(id).ok())
                .ok_or_else(invalid)?;
            let principal = state
                .users
                .values()
                .map(|(_, principal)| principal)
                .find(|principal| principal.user_id == user_id)
                .cloned()
                .ok_or_else(invalid)?;
            state.revoked.push(refresh_token.to_string());
            principal
        };
        self.issue_session(&principal).await
    }

    async fn sign_out(&self, refresh_token: &str) -> MarketplaceResult<()> {
        let mut state = self.state();
        state.call_log.push("sign_out");
        state.revoked.push(refresh_token.to_string());
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}
