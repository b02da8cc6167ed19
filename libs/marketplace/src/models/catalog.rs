//! Service categories and services

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Service category entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCategory {
    pub category_id: Uuid,
    pub category_name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// New category creation payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCategory {
    pub category_name: String,
    pub description: Option<String>,
}

/// Service entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub service_id: Uuid,
    pub category_id: Uuid,
    /// Joined from the category when the store provides it
    pub category_name: Option<String>,
    pub provider_id: Uuid,
    pub service_name: String,
    pub description: Option<String>,
    pub base_price: f64,
    pub duration_minutes: i32,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

/// New service creation payload. Services always start unapproved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewService {
    pub category_id: Uuid,
    pub provider_id: Uuid,
    pub service_name: String,
    pub description: Option<String>,
    pub base_price: f64,
    pub duration_minutes: i32,
}

/// Filter for service listings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceFilter {
    pub approved: Option<bool>,
    pub category_id: Option<Uuid>,
    pub provider_id: Option<Uuid>,
    pub limit: Option<i64>,
}

impl ServiceFilter {
    /// Services visible to clients
    pub fn approved() -> Self {
        Self {
            approved: Some(true),
            ..Self::default()
        }
    }

    /// Services waiting for admin review
    pub fn pending() -> Self {
        Self {
            approved: Some(false),
            ..Self::default()
        }
    }

    pub fn in_category(mut self, category_id: Option<Uuid>) -> Self {
        self.category_id = category_id;
        self
    }

    pub fn by_provider(mut self, provider_id: Uuid) -> Self {
        self.provider_id = Some(provider_id);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a service satisfies this filter, ignoring the limit
    pub fn matches(&self, service: &Service) -> bool {
        self.approved.is_none_or(|approved| service.approved == approved)
            && self.category_id.is_none_or(|id| service.category_id == id)
            && self.provider_id.is_none_or(|id| service.provider_id == id)
    }
}
