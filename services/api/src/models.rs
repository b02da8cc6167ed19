//! API models for request payloads

use marketplace::models::BookingStatus;
use serde::Deserialize;
use uuid::Uuid;

/// Query parameters for service listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServicesQuery {
    /// Restrict to one category
    pub category: Option<Uuid>,
}

/// Request for a provider-driven booking status change
#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: BookingStatus,
}
