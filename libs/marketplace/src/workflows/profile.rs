//! Provider and customer profiles

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{MarketplaceError, MarketplaceResult};
use crate::models::{
    AvailabilityStatus, Customer, CustomerProfile, ProviderProfile, Role, ServiceProvider, Session,
};
use crate::ports::MarketplaceStore;

/// Provider profile form. The provider id always comes from the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderProfileForm {
    pub full_name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub expertise: Option<String>,
    #[serde(default = "default_availability")]
    pub availability_status: AvailabilityStatus,
}

fn default_availability() -> AvailabilityStatus {
    AvailabilityStatus::Available
}

/// Customer profile form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerProfileForm {
    pub full_name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

fn required(field: &str, value: &str) -> MarketplaceResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(MarketplaceError::Validation(format!(
            "Please fill in the {} field",
            field
        )));
    }
    Ok(value.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub async fn update_provider_profile<S>(
    store: &S,
    session: &Session,
    form: ProviderProfileForm,
) -> MarketplaceResult<ServiceProvider>
where
    S: MarketplaceStore + ?Sized,
{
    if !session.has_role(Role::Provider) {
        return Err(MarketplaceError::Forbidden);
    }

    let profile = ProviderProfile {
        provider_id: session.user_id,
        full_name: required("full_name", &form.full_name)?,
        phone: required("phone", &form.phone)?,
        email: optional(form.email).or_else(|| Some(session.email.clone())),
        expertise: optional(form.expertise),
        availability_status: form.availability_status,
    };

    let provider = store.upsert_provider(profile).await?;
    info!(
        "Provider {} profile saved ({})",
        provider.provider_id, provider.availability_status
    );
    Ok(provider)
}

pub async fn update_customer_profile<S>(
    store: &S,
    session: &Session,
    form: CustomerProfileForm,
) -> MarketplaceResult<Customer>
where
    S: MarketplaceStore + ?Sized,
{
    if !session.has_role(Role::Client) {
        return Err(MarketplaceError::Forbidden);
    }

    let profile = CustomerProfile {
        customer_id: session.user_id,
        full_name: required("full_name", &form.full_name)?,
        phone: required("phone", &form.phone)?,
        email: optional(form.email).or_else(|| Some(session.email.clone())),
        address: optional(form.address),
    };

    let customer = store.upsert_customer(profile).await?;
    info!("Customer {} profile saved", customer.customer_id);
    Ok(customer)
}
