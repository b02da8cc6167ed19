//! Booking status changes after creation

use tracing::info;
use uuid::Uuid;

use crate::error::{MarketplaceError, MarketplaceResult};
use crate::models::{Booking, BookingStatus, Role, Session};
use crate::ports::MarketplaceStore;

async fn load_booking<S>(store: &S, booking_id: Uuid) -> MarketplaceResult<Booking>
where
    S: MarketplaceStore + ?Sized,
{
    store
        .get_booking(booking_id)
        .await?
        .ok_or(MarketplaceError::BookingNotFound(booking_id))
}

async fn transition<S>(
    store: &S,
    mut booking: Booking,
    next: BookingStatus,
) -> MarketplaceResult<Booking>
where
    S: MarketplaceStore + ?Sized,
{
    if !booking.status.can_transition_to(next) {
        return Err(MarketplaceError::InvalidTransition {
            from: booking.status,
            to: next,
        });
    }

    if !store
        .set_booking_status(booking.booking_id, booking.status, next)
        .await?
    {
        // Someone else moved or removed the booking since it was read
        let current = load_booking(store, booking.booking_id).await?;
        return Err(MarketplaceError::InvalidTransition {
            from: current.status,
            to: next,
        });
    }

    info!(
        "Booking {} moved from {} to {}",
        booking.booking_id, booking.status, next
    );
    booking.status = next;
    Ok(booking)
}

/// Client cancels their own booking while it is still pending
pub async fn cancel_booking<S>(
    store: &S,
    session: &Session,
    booking_id: Uuid,
) -> MarketplaceResult<Booking>
where
    S: MarketplaceStore + ?Sized,
{
    let booking = load_booking(store, booking_id).await?;
    if booking.customer_id != session.user_id {
        return Err(MarketplaceError::Forbidden);
    }
    if booking.status != BookingStatus::Pending {
        return Err(MarketplaceError::InvalidTransition {
            from: booking.status,
            to: BookingStatus::Cancelled,
        });
    }

    transition(store, booking, BookingStatus::Cancelled).await
}

/// Provider moves one of their bookings along the state machine
pub async fn update_booking_status<S>(
    store: &S,
    session: &Session,
    booking_id: Uuid,
    next: BookingStatus,
) -> MarketplaceResult<Booking>
where
    S: MarketplaceStore + ?Sized,
{
    if !session.has_role(Role::Provider) {
        return Err(MarketplaceError::Forbidden);
    }

    let booking = load_booking(store, booking_id).await?;
    if booking.provider_id != session.user_id {
        return Err(MarketplaceError::Forbidden);
    }

    transition(store, booking, next).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockStore, sample_booking};

    fn session(user_id: Uuid, role: Role) -> Session {
        Session {
            user_id,
            email: "someone@example.com".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn client_cancels_pending_booking() {
        let booking = sample_booking(BookingStatus::Pending);
        let store = MockStore::new().with_booking(booking.clone());

        let updated = cancel_booking(
            &store,
            &session(booking.customer_id, Role::Client),
            booking.booking_id,
        )
        .await
        .unwrap();

        assert_eq!(updated.status, BookingStatus::Cancelled);
        assert_eq!(
            store.booking(booking.booking_id).unwrap().status,
            BookingStatus::Cancelled
        );
    }

    #[tokio::test]
    async fn client_cannot_cancel_confirmed_or_foreign_booking() {
        let confirmed = sample_booking(BookingStatus::Confirmed);
        let pending = sample_booking(BookingStatus::Pending);
        let store = MockStore::new()
            .with_booking(confirmed.clone())
            .with_booking(pending.clone());

        let err = cancel_booking(
            &store,
            &session(confirmed.customer_id, Role::Client),
            confirmed.booking_id,
        )
        .await
        .unwrap_err();
        assert_eq!(
            err,
            MarketplaceError::InvalidTransition {
                from: BookingStatus::Confirmed,
                to: BookingStatus::Cancelled
            }
        );

        let err = cancel_booking(
            &store,
            &session(Uuid::new_v4(), Role::Client),
            pending.booking_id,
        )
        .await
        .unwrap_err();
        assert_eq!(err, MarketplaceError::Forbidden);
    }

    #[tokio::test]
    async fn provider_walks_booking_to_completion() {
        let booking = sample_booking(BookingStatus::Pending);
        let store = MockStore::new().with_booking(booking.clone());
        let provider = session(booking.provider_id, Role::Provider);

        for next in [
            BookingStatus::Confirmed,
            BookingStatus::InProgress,
            BookingStatus::Completed,
        ] {
            let updated = update_booking_status(&store, &provider, booking.booking_id, next)
                .await
                .unwrap();
            assert_eq!(updated.status, next);
        }

        let err = update_booking_status(
            &store,
            &provider,
            booking.booking_id,
            BookingStatus::Cancelled,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MarketplaceError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn other_providers_cannot_touch_booking() {
        let booking = sample_booking(BookingStatus::Pending);
        let store = MockStore::new().with_booking(booking.clone());

        let err = update_booking_status(
            &store,
            &session(Uuid::new_v4(), Role::Provider),
            booking.booking_id,
            BookingStatus::Confirmed,
        )
        .await
        .unwrap_err();

        assert_eq!(err, MarketplaceError::Forbidden);
        assert_eq!(
            store.booking(booking.booking_id).unwrap().status,
            BookingStatus::Pending
        );
    }

    #[tokio::test]
    async fn missing_booking() {
        let store = MockStore::new();
        let id = Uuid::new_v4();

        let err = cancel_booking(&store, &session(Uuid::new_v4(), Role::Client), id)
            .await
            .unwrap_err();

        assert_eq!(err, MarketplaceError::BookingNotFound(id));
    }

    #[tokio::test]
    async fn write_refuses_status_changed_since_read() {
        let booking = sample_booking(BookingStatus::Pending);
        let store = MockStore::new()
            .with_booking(booking.clone())
            .with_concurrent_status(BookingStatus::Completed);

        let err = cancel_booking(
            &store,
            &session(booking.customer_id, Role::Client),
            booking.booking_id,
        )
        .await
        .unwrap_err();

        assert_eq!(
            err,
            MarketplaceError::InvalidTransition {
                from: BookingStatus::Completed,
                to: BookingStatus::Cancelled
            }
        );
        assert_eq!(
            store.booking(booking.booking_id).unwrap().status,
            BookingStatus::Completed
        );
    }

    #[tokio::test]
    async fn store_write_is_conditional_on_status() {
        let booking = sample_booking(BookingStatus::Cancelled);
        let store = MockStore::new().with_booking(booking.clone());

        let moved = store
            .set_booking_status(
                booking.booking_id,
                BookingStatus::Pending,
                BookingStatus::Completed,
            )
            .await
            .unwrap();

        assert!(!moved);
        assert_eq!(
            store.booking(booking.booking_id).unwrap().status,
            BookingStatus::Cancelled
        );
    }
}
