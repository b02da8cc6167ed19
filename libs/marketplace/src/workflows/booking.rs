//! Booking creation
//!
//! Steps, in order: require a session, validate the form, load the
//! (approved) service, pick any available provider, insert one pending
//! booking. The data boundary re-checks provider availability as part of
//! the insert. There is no time-slot conflict check and resubmitting the
//! form books twice.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::{MarketplaceError, MarketplaceResult};
use crate::models::{Booking, BookingStatus, NewBooking, Session};
use crate::ports::MarketplaceStore;

/// Where the client lands after booking
pub const BOOKINGS_PATH: &str = "/bookings";

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMATS: [&str; 2] = ["%H:%M", "%H:%M:%S"];

/// Booking form as submitted from the per-service booking page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingForm {
    pub service_id: Uuid,
    pub date: String,
    pub time: String,
    pub address: String,
    pub phone: String,
    #[serde(default)]
    pub notes: String,
}

/// Successful booking
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingOutcome {
    pub booking: Booking,
    pub redirect_to: &'static str,
}

impl BookingForm {
    /// Check required fields and parse the date and time
    pub fn validate(&self) -> MarketplaceResult<(NaiveDate, NaiveTime)> {
        let required = [
            ("date", &self.date),
            ("time", &self.time),
            ("address", &self.address),
            ("phone", &self.phone),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(MarketplaceError::Validation(format!(
                "Please fill in the {} field",
                field
            )));
        }

        let date = NaiveDate::parse_from_str(self.date.trim(), DATE_FORMAT).map_err(|_| {
            MarketplaceError::Validation(format!("Invalid date: {}", self.date))
        })?;

        let time = TIME_FORMATS
            .iter()
            .find_map(|format| NaiveTime::parse_from_str(self.time.trim(), format).ok())
            .ok_or_else(|| MarketplaceError::Validation(format!("Invalid time: {}", self.time)))?;

        Ok((date, time))
    }

    /// Reset the fields, keeping the service the page is for
    pub fn clear(&mut self) {
        *self = Self {
            service_id: self.service_id,
            ..Self::default()
        };
    }

    /// Run the booking workflow and clear the form on success.
    ///
    /// On failure the form keeps its values so the user can retry.
    pub async fn submit<S>(
        &mut self,
        store: &S,
        session: Option<&Session>,
    ) -> MarketplaceResult<BookingOutcome>
    where
        S: MarketplaceStore + ?Sized,
    {
        let outcome = create_booking(store, session, self).await?;
        self.clear();
        Ok(outcome)
    }
}

/// Create one pending booking for the session's customer
pub async fn create_booking<S>(
    store: &S,
    session: Option<&Session>,
    form: &BookingForm,
) -> MarketplaceResult<BookingOutcome>
where
    S: MarketplaceStore + ?Sized,
{
    let session = session.ok_or(MarketplaceError::Unauthenticated)?;
    let (booking_date, booking_time) = form.validate()?;

    let service = store
        .get_service(form.service_id)
        .await?
        .filter(|service| service.approved)
        .ok_or(MarketplaceError::ServiceNotFound(form.service_id))?;

    let provider = store
        .find_available_provider()
        .await?
        .ok_or(MarketplaceError::NoProvidersAvailable)?;

    let notes = Some(form.notes.trim())
        .filter(|notes| !notes.is_empty())
        .map(str::to_string);

    let booking = store
        .insert_booking(NewBooking {
            customer_id: session.user_id,
            provider_id: provider.provider_id,
            service_id: service.service_id,
            booking_date,
            booking_time,
            address: form.address.trim().to_string(),
            phone: form.phone.trim().to_string(),
            status: BookingStatus::Pending,
            total_amount: Some(service.base_price),
            notes,
        })
        .await?;

    info!(
        "Booking {} created for customer {} with provider {}",
        booking.booking_id, session.user_id, provider.provider_id
    );

    Ok(BookingOutcome {
        booking,
        redirect_to: BOOKINGS_PATH,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AvailabilityStatus, Role};
    use crate::testing::{MockStore, sample_provider, sample_service};

    fn session() -> Session {
        Session {
            user_id: Uuid::new_v4(),
            email: "client@example.com".to_string(),
            role: Role::Client,
        }
    }

    fn form(service_id: Uuid) -> BookingForm {
        BookingForm {
            service_id,
            date: "2025-06-01".to_string(),
            time: "10:00".to_string(),
            address: "House 1".to_string(),
            phone: "017...".to_string(),
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn no_session_fails_locally_without_boundary_calls() {
        let service = sample_service(true);
        let store = MockStore::new()
            .with_service(service.clone())
            .with_provider(sample_provider(AvailabilityStatus::Available));

        let err = create_booking(&store, None, &form(service.service_id))
            .await
            .unwrap_err();

        assert_eq!(err, MarketplaceError::Unauthenticated);
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn no_available_provider_fails() {
        let service = sample_service(true);
        let store = MockStore::new()
            .with_service(service.clone())
            .with_provider(sample_provider(AvailabilityStatus::Busy));

        let err = create_booking(&store, Some(&session()), &form(service.service_id))
            .await
            .unwrap_err();

        assert_eq!(err, MarketplaceError::NoProvidersAvailable);
        assert!(store.inserted_bookings().is_empty());
    }

    #[tokio::test]
    async fn booking_scenario_inserts_one_pending_row() {
        let service = sample_service(true);
        let provider = sample_provider(AvailabilityStatus::Available);
        let store = MockStore::new()
            .with_service(service.clone())
            .with_provider(provider.clone());
        let session = session();

        let outcome = create_booking(&store, Some(&session), &form(service.service_id))
            .await
            .unwrap();

        let inserted = store.inserted_bookings();
        assert_eq!(inserted.len(), 1);
        let row = &inserted[0];
        assert_eq!(row.booking_date, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert_eq!(row.booking_time, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        assert_eq!(row.address, "House 1");
        assert_eq!(row.phone, "017...");
        assert_eq!(row.notes, None);
        assert_eq!(row.provider_id, provider.provider_id);
        assert_eq!(row.customer_id, session.user_id);
        assert_eq!(row.service_id, service.service_id);
        assert_eq!(row.status, BookingStatus::Pending);
        assert_eq!(row.total_amount, Some(service.base_price));

        assert_eq!(outcome.redirect_to, "/bookings");
        assert_eq!(outcome.booking.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn submit_clears_form_and_navigates_to_bookings() {
        let service = sample_service(true);
        let store = MockStore::new()
            .with_service(service.clone())
            .with_provider(sample_provider(AvailabilityStatus::Available));
        let mut booking_form = form(service.service_id);
        booking_form.notes = "Ring twice".to_string();

        let outcome = booking_form.submit(&store, Some(&session())).await.unwrap();

        assert_eq!(outcome.redirect_to, BOOKINGS_PATH);
        assert_eq!(
            booking_form,
            BookingForm {
                service_id: service.service_id,
                ..BookingForm::default()
            }
        );
        assert_eq!(
            store.inserted_bookings()[0].notes.as_deref(),
            Some("Ring twice")
        );
    }

    #[tokio::test]
    async fn failed_submit_keeps_form_values() {
        let service = sample_service(true);
        let store = MockStore::new().with_service(service.clone());
        let mut booking_form = form(service.service_id);

        let err = booking_form.submit(&store, Some(&session())).await.unwrap_err();

        assert_eq!(err, MarketplaceError::NoProvidersAvailable);
        assert_eq!(booking_form, form(service.service_id));
    }

    #[tokio::test]
    async fn insert_errors_are_surfaced() {
        let service = sample_service(true);
        let store = MockStore::new()
            .with_service(service.clone())
            .with_provider(sample_provider(AvailabilityStatus::Available))
            .failing_with("insert or update on table \"bookings\" violates foreign key constraint");

        let err = create_booking(&store, Some(&session()), &form(service.service_id))
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "insert or update on table \"bookings\" violates foreign key constraint"
        );
    }

    #[tokio::test]
    async fn unapproved_service_cannot_be_booked() {
        let service = sample_service(false);
        let store = MockStore::new()
            .with_service(service.clone())
            .with_provider(sample_provider(AvailabilityStatus::Available));

        let err = create_booking(&store, Some(&session()), &form(service.service_id))
            .await
            .unwrap_err();

        assert_eq!(err, MarketplaceError::ServiceNotFound(service.service_id));
        assert!(store.inserted_bookings().is_empty());
    }

    #[tokio::test]
    async fn missing_fields_fail_before_boundary_calls() {
        let store = MockStore::new();
        let mut incomplete = form(Uuid::new_v4());
        incomplete.address = "   ".to_string();

        let err = create_booking(&store, Some(&session()), &incomplete)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            MarketplaceError::Validation("Please fill in the address field".to_string())
        );
        assert_eq!(store.call_count(), 0);
    }

    #[test]
    fn validate_rejects_malformed_date_and_time() {
        let mut bad_date = form(Uuid::new_v4());
        bad_date.date = "01/06/2025".to_string();
        assert!(matches!(
            bad_date.validate(),
            Err(MarketplaceError::Validation(_))
        ));

        let mut bad_time = form(Uuid::new_v4());
        bad_time.time = "ten".to_string();
        assert!(matches!(
            bad_time.validate(),
            Err(MarketplaceError::Validation(_))
        ));

        let mut with_seconds = form(Uuid::new_v4());
        with_seconds.time = "10:00:30".to_string();
        assert_eq!(
            with_seconds.validate().unwrap().1,
            NaiveTime::from_hms_opt(10, 0, 30).unwrap()
        );
    }
}
