//! Bookings and the booking status state machine

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Booking status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Completed and cancelled bookings never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// Whether the state machine allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;

        matches!(
            (self, next),
            (Pending, Confirmed | InProgress | Completed | Cancelled)
                | (Confirmed, InProgress | Completed | Cancelled)
                | (InProgress, Completed)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "in_progress" => Ok(BookingStatus::InProgress),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(format!("Unknown booking status: {}", other)),
        }
    }
}

/// Booking entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub booking_id: Uuid,
    pub customer_id: Uuid,
    pub provider_id: Uuid,
    pub service_id: Uuid,
    pub booking_date: NaiveDate,
    pub booking_time: NaiveTime,
    pub address: String,
    pub phone: String,
    pub status: BookingStatus,
    pub total_amount: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// New booking insert payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBooking {
    pub customer_id: Uuid,
    pub provider_id: Uuid,
    pub service_id: Uuid,
    pub booking_date: NaiveDate,
    pub booking_time: NaiveTime,
    pub address: String,
    pub phone: String,
    pub status: BookingStatus,
    pub total_amount: Option<f64>,
    pub notes: Option<String>,
}

/// Booking row with the joined customer, provider and service summaries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingSummary {
    #[serde(flatten)]
    pub booking: Booking,
    pub service_name: Option<String>,
    pub service_price: Option<f64>,
    pub provider_name: Option<String>,
    pub provider_phone: Option<String>,
    pub provider_expertise: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
}

/// Filter for booking listings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingFilter {
    pub customer_id: Option<Uuid>,
    pub provider_id: Option<Uuid>,
}

impl BookingFilter {
    pub fn for_customer(customer_id: Uuid) -> Self {
        Self {
            customer_id: Some(customer_id),
            provider_id: None,
        }
    }

    pub fn for_provider(provider_id: Uuid) -> Self {
        Self {
            customer_id: None,
            provider_id: Some(provider_id),
        }
    }

    pub fn matches(&self, booking: &Booking) -> bool {
        self.customer_id.is_none_or(|id| booking.customer_id == id)
            && self.provider_id.is_none_or(|id| booking.provider_id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::BookingStatus::*;
    use super::*;

    #[test]
    fn pending_can_move_anywhere_but_back() {
        for next in [Confirmed, InProgress, Completed, Cancelled] {
            assert!(Pending.can_transition_to(next), "pending -> {}", next);
        }
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn terminal_states_are_final() {
        for from in [Completed, Cancelled] {
            assert!(from.is_terminal());
            for next in [Pending, Confirmed, InProgress, Completed, Cancelled] {
                assert!(!from.can_transition_to(next), "{} -> {}", from, next);
            }
        }
    }

    #[test]
    fn in_progress_only_completes() {
        assert!(InProgress.can_transition_to(Completed));
        assert!(!InProgress.can_transition_to(Cancelled));
        assert!(!InProgress.can_transition_to(Confirmed));
        assert!(!Confirmed.can_transition_to(Pending));
    }

    #[test]
    fn status_strings_match_storage() {
        assert_eq!(InProgress.as_str(), "in_progress");
        assert_eq!("in_progress".parse::<BookingStatus>(), Ok(InProgress));
        assert_eq!(
            serde_json::to_string(&InProgress).unwrap(),
            "\"in_progress\""
        );
        assert!("done".parse::<BookingStatus>().is_err());
    }
}
