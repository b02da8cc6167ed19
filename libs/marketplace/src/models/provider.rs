//! Service providers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Provider availability flag.
///
/// Only `available` makes a provider eligible for new bookings. Values the
/// marketplace does not know are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AvailabilityStatus {
    Available,
    Busy,
    Other(String),
}

impl AvailabilityStatus {
    pub fn as_str(&self) -> &str {
        match self {
            AvailabilityStatus::Available => "available",
            AvailabilityStatus::Busy => "busy",
            AvailabilityStatus::Other(value) => value,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, AvailabilityStatus::Available)
    }
}

impl From<String> for AvailabilityStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "available" => AvailabilityStatus::Available,
            "busy" => AvailabilityStatus::Busy,
            _ => AvailabilityStatus::Other(value),
        }
    }
}

impl From<AvailabilityStatus> for String {
    fn from(value: AvailabilityStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service provider entity. The provider id is the provider's user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceProvider {
    pub provider_id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub expertise: Option<String>,
    pub rating: f64,
    pub total_jobs: i32,
    pub availability_status: AvailabilityStatus,
    pub created_at: DateTime<Utc>,
}

/// Provider profile upsert payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderProfile {
    pub provider_id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub expertise: Option<String>,
    pub availability_status: AvailabilityStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn availability_round_trips_unknown_values() {
        let status = AvailabilityStatus::from("on_leave".to_string());
        assert_eq!(status, AvailabilityStatus::Other("on_leave".to_string()));
        assert_eq!(status.as_str(), "on_leave");
        assert!(!status.is_available());
        assert!(AvailabilityStatus::from("available".to_string()).is_available());
    }

    #[test]
    fn availability_serializes_as_plain_string() {
        let json = serde_json::to_string(&AvailabilityStatus::Busy).unwrap();
        assert_eq!(json, "\"busy\"");
    }
}
