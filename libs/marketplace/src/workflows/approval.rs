//! Admin review of provider-submitted services
//!
//! Approve flips the approved flag; reject deletes the row. Both are single
//! store calls. The pending list drops a service only after the store call
//! succeeded.

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::error::{MarketplaceError, MarketplaceResult};
use crate::models::{Role, Service, ServiceFilter, Session};
use crate::ports::MarketplaceStore;

fn require_admin(session: &Session) -> MarketplaceResult<()> {
    if session.has_role(Role::Admin) {
        Ok(())
    } else {
        Err(MarketplaceError::Forbidden)
    }
}

/// Mark a service as approved
pub async fn approve_service<S>(
    store: &S,
    session: &Session,
    service_id: Uuid,
) -> MarketplaceResult<()>
where
    S: MarketplaceStore + ?Sized,
{
    require_admin(session)?;

    if !store.approve_service(service_id).await? {
        return Err(MarketplaceError::ServiceNotFound(service_id));
    }

    info!("Service {} approved by {}", service_id, session.user_id);
    Ok(())
}

/// Delete an unapproved service
pub async fn reject_service<S>(
    store: &S,
    session: &Session,
    service_id: Uuid,
) -> MarketplaceResult<()>
where
    S: MarketplaceStore + ?Sized,
{
    require_admin(session)?;

    if !store.delete_service(service_id).await? {
        return Err(MarketplaceError::ServiceNotFound(service_id));
    }

    info!("Service {} rejected by {}", service_id, session.user_id);
    Ok(())
}

/// Services waiting for review, as shown on the admin dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PendingServices {
    services: Vec<Service>,
}

impl PendingServices {
    pub fn new(services: Vec<Service>) -> Self {
        Self { services }
    }

    pub async fn load<S>(store: &S) -> MarketplaceResult<Self>
    where
        S: MarketplaceStore + ?Sized,
    {
        Ok(Self::new(store.list_services(ServiceFilter::pending()).await?))
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub async fn approve<S>(
        &mut self,
        store: &S,
        session: &Session,
        service_id: Uuid,
    ) -> MarketplaceResult<()>
    where
        S: MarketplaceStore + ?Sized,
    {
        approve_service(store, session, service_id).await?;
        self.remove(service_id);
        Ok(())
    }

    pub async fn reject<S>(
        &mut self,
        store: &S,
        session: &Session,
        service_id: Uuid,
    ) -> MarketplaceResult<()>
    where
        S: MarketplaceStore + ?Sized,
    {
        reject_service(store, session, service_id).await?;
        self.remove(service_id);
        Ok(())
    }

    fn remove(&mut self, service_id: Uuid) {
        self.services.retain(|service| service.service_id != service_id);
    }
}

/// Admin dashboard: pending services plus head counts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminDashboard {
    pub pending_services: PendingServices,
    pub providers_count: i64,
    pub clients_count: i64,
}

impl AdminDashboard {
    pub async fn load<S>(store: &S, session: &Session) -> MarketplaceResult<Self>
    where
        S: MarketplaceStore + ?Sized,
    {
        require_admin(session)?;

        Ok(Self {
            pending_services: PendingServices::load(store).await?,
            providers_count: store.count_providers().await?,
            clients_count: store.count_customers().await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockStore, sample_service};

    fn admin() -> Session {
        Session {
            user_id: Uuid::new_v4(),
            email: "admin@example.com".to_string(),
            role: Role::Admin,
        }
    }

    #[tokio::test]
    async fn approve_issues_one_update_and_removes_after_success() {
        let pending = sample_service(false);
        let other = sample_service(false);
        let store = MockStore::new()
            .with_service(pending.clone())
            .with_service(other.clone());
        let mut list = PendingServices::load(&store).await.unwrap();
        assert_eq!(list.len(), 2);

        list.approve(&store, &admin(), pending.service_id)
            .await
            .unwrap();

        assert_eq!(store.approve_calls(), vec![pending.service_id]);
        assert!(store.delete_calls().is_empty());
        assert_eq!(list.services(), &[other]);
        assert!(store.service(pending.service_id).unwrap().approved);
    }

    #[tokio::test]
    async fn reject_issues_one_delete_and_removes_after_success() {
        let pending = sample_service(false);
        let store = MockStore::new().with_service(pending.clone());
        let mut list = PendingServices::load(&store).await.unwrap();

        list.reject(&store, &admin(), pending.service_id)
            .await
            .unwrap();

        assert_eq!(store.delete_calls(), vec![pending.service_id]);
        assert!(store.approve_calls().is_empty());
        assert!(list.is_empty());
        assert!(store.service(pending.service_id).is_none());
    }

    #[tokio::test]
    async fn failed_calls_leave_the_list_untouched() {
        let pending = sample_service(false);
        let store = MockStore::new().with_service(pending.clone());
        let mut list = PendingServices::load(&store).await.unwrap();
        let store = store.failing_with("permission denied for table services");

        let err = list
            .approve(&store, &admin(), pending.service_id)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "permission denied for table services");
        assert_eq!(list.len(), 1);

        let err = list
            .reject(&store, &admin(), pending.service_id)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "permission denied for table services");
        assert_eq!(list.len(), 1);
    }

    #[tokio::test]
    async fn unknown_service_is_reported_and_kept_out_of_the_list() {
        let store = MockStore::new();
        let mut list = PendingServices::default();
        let missing = Uuid::new_v4();

        let err = list.approve(&store, &admin(), missing).await.unwrap_err();

        assert_eq!(err, MarketplaceError::ServiceNotFound(missing));
        assert_eq!(store.approve_calls(), vec![missing]);
    }

    #[tokio::test]
    async fn approved_service_cannot_be_rejected() {
        let approved = sample_service(true);
        let store = MockStore::new().with_service(approved.clone());

        let err = reject_service(&store, &admin(), approved.service_id)
            .await
            .unwrap_err();

        assert_eq!(err, MarketplaceError::ServiceNotFound(approved.service_id));
        assert!(store.service(approved.service_id).is_some());
    }

    #[tokio::test]
    async fn only_admins_may_review() {
        let pending = sample_service(false);
        let store = MockStore::new().with_service(pending.clone());
        let provider = Session {
            role: Role::Provider,
            ..admin()
        };

        let err = approve_service(&store, &provider, pending.service_id)
            .await
            .unwrap_err();

        assert_eq!(err, MarketplaceError::Forbidden);
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn dashboard_counts() {
        let store = MockStore::new()
            .with_service(sample_service(false))
            .with_service(sample_service(true))
            .with_provider(crate::testing::sample_provider(
                crate::models::AvailabilityStatus::Available,
            ));

        let dashboard = AdminDashboard::load(&store, &admin()).await.unwrap();

        assert_eq!(dashboard.pending_services.len(), 1);
        assert_eq!(dashboard.providers_count, 1);
        assert_eq!(dashboard.clients_count, 0);
    }
}
