//! Marketplace domain models

pub mod booking;
pub mod catalog;
pub mod customer;
pub mod payment;
pub mod provider;
pub mod role;
pub mod session;

// Re-export for convenience
pub use booking::{Booking, BookingFilter, BookingStatus, BookingSummary, NewBooking};
pub use catalog::{NewCategory, NewService, Service, ServiceCategory, ServiceFilter};
pub use customer::{Customer, CustomerProfile};
pub use payment::{Payment, PaymentMethod};
pub use provider::{AvailabilityStatus, ProviderProfile, ServiceProvider};
pub use role::{Role, RolePolicy};
pub use session::{
    AuthSession, Credentials, Principal, Session, SessionEvent, SessionEventKind, TokenPair,
};
