//! Marketplace workflows
//!
//! Every workflow takes its boundaries and the request [`Session`](crate::models::Session)
//! explicitly; none of them hold state between calls.

pub mod approval;
pub mod booking;
pub mod catalog;
pub mod listing;
pub mod profile;
pub mod sign_in;
pub mod status;

pub use approval::{AdminDashboard, PendingServices, approve_service, reject_service};
pub use booking::{BOOKINGS_PATH, BookingForm, BookingOutcome, create_booking};
pub use catalog::{
    CategorySubmission, ProviderDashboard, ServiceSubmission, submit_category, submit_service,
};
pub use listing::{
    BookingDetail, ClientDashboard, browse_services, featured_services, list_bookings_for,
    list_providers, service_for_booking, top_providers,
};
pub use profile::{
    CustomerProfileForm, ProviderProfileForm, update_customer_profile, update_provider_profile,
};
pub use sign_in::{SignInOutcome, sign_in, sign_up};
pub use status::{cancel_booking, update_booking_status};
