//! Provider-side catalogue management: new services and new categories

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::{MarketplaceError, MarketplaceResult};
use crate::models::{
    BookingFilter, BookingSummary, NewCategory, NewService, Role, Service, ServiceCategory,
    ServiceFilter, Session,
};
use crate::ports::MarketplaceStore;

/// Duration recorded when the provider leaves it out
pub const DEFAULT_DURATION_MINUTES: i32 = 60;

/// New service form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSubmission {
    pub service_name: String,
    pub base_price: f64,
    pub category_id: Uuid,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<i32>,
}

/// New category form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySubmission {
    pub category_name: String,
    #[serde(default)]
    pub description: Option<String>,
}

fn require_provider(session: &Session) -> MarketplaceResult<()> {
    if session.has_role(Role::Provider) {
        Ok(())
    } else {
        Err(MarketplaceError::Forbidden)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ServiceSubmission {
    fn into_new_service(self, provider_id: Uuid) -> MarketplaceResult<NewService> {
        let service_name = self.service_name.trim().to_string();
        if service_name.is_empty() {
            return Err(MarketplaceError::Validation(
                "Service name is required".to_string(),
            ));
        }
        if !self.base_price.is_finite() || self.base_price < 0.0 {
            return Err(MarketplaceError::Validation(format!(
                "Invalid price: {}",
                self.base_price
            )));
        }
        let duration_minutes = self.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES);
        if duration_minutes <= 0 {
            return Err(MarketplaceError::Validation(format!(
                "Invalid duration: {} minutes",
                duration_minutes
            )));
        }

        Ok(NewService {
            category_id: self.category_id,
            provider_id,
            service_name,
            description: non_blank(self.description),
            base_price: self.base_price,
            duration_minutes,
        })
    }
}

/// Submit a service for review. It stays invisible to clients until approved.
pub async fn submit_service<S>(
    store: &S,
    session: &Session,
    submission: ServiceSubmission,
) -> MarketplaceResult<Service>
where
    S: MarketplaceStore + ?Sized,
{
    require_provider(session)?;
    let new_service = submission.into_new_service(session.user_id)?;

    let service = store.insert_service(new_service).await?;
    info!(
        "Provider {} submitted service {} for review",
        session.user_id, service.service_id
    );
    Ok(service)
}

/// Add a category. Duplicate names are allowed.
pub async fn submit_category<S>(
    store: &S,
    session: &Session,
    submission: CategorySubmission,
) -> MarketplaceResult<ServiceCategory>
where
    S: MarketplaceStore + ?Sized,
{
    require_provider(session)?;

    let category_name = submission.category_name.trim().to_string();
    if category_name.is_empty() {
        return Err(MarketplaceError::Validation(
            "Category name is required".to_string(),
        ));
    }

    let category = store
        .insert_category(NewCategory {
            category_name,
            description: non_blank(submission.description),
        })
        .await?;
    info!(
        "Provider {} added category {}",
        session.user_id, category.category_id
    );
    Ok(category)
}

/// Provider dashboard: own services, every category, own bookings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderDashboard {
    pub services: Vec<Service>,
    pub categories: Vec<ServiceCategory>,
    pub bookings: Vec<BookingSummary>,
}

impl ProviderDashboard {
    pub async fn load<S>(store: &S, session: &Session) -> MarketplaceResult<Self>
    where
        S: MarketplaceStore + ?Sized,
    {
        require_provider(session)?;

        Ok(Self {
            services: store
                .list_services(ServiceFilter::default().by_provider(session.user_id))
                .await?,
            categories: store.list_categories().await?,
            bookings: store
                .list_bookings(BookingFilter::for_provider(session.user_id))
                .await?,
        })
    }
}
