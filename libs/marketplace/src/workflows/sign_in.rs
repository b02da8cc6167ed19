//! Role-specific sign-in and sign-up
//!
//! Each portal (admin, provider, client) signs users in through the same
//! identity boundary. After authentication the stored role is compared to
//! the portal role and, depending on [`RolePolicy`], rewritten or refused.

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{MarketplaceError, MarketplaceResult};
use crate::models::{AuthSession, Credentials, Role, RolePolicy};
use crate::ports::IdentityProvider;

/// Result of signing in or up through a portal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignInOutcome {
    pub session: AuthSession,
    /// Dashboard to navigate to
    pub redirect_to: &'static str,
    /// Whether the stored role was rewritten during this sign-in
    pub role_updated: bool,
}

/// Sign in through the portal for `portal`.
///
/// Issues at most one role update, always before the session is issued,
/// so the returned tokens carry the final role.
pub async fn sign_in<I>(
    identity: &I,
    portal: Role,
    credentials: &Credentials,
    policy: RolePolicy,
) -> MarketplaceResult<SignInOutcome>
where
    I: IdentityProvider + ?Sized,
{
    let principal = identity.authenticate(credentials).await?;

    let (principal, role_updated) = match principal.role {
        Some(role) if role == portal => (principal, false),
        Some(actual) if policy == RolePolicy::Enforce => {
            info!(
                "Refusing {} sign-in for user {} registered as {}",
                portal, principal.user_id, actual
            );
            return Err(MarketplaceError::RoleMismatch { portal, actual });
        }
        Some(actual) => {
            warn!(
                "User {} signed in through the {} portal; rewriting role {} -> {}",
                principal.user_id, portal, actual, portal
            );
            (identity.update_role(principal.user_id, portal).await?, true)
        }
        None => {
            info!("Assigning role {} to user {}", portal, principal.user_id);
            (identity.update_role(principal.user_id, portal).await?, true)
        }
    };

    let session = identity.issue_session(&principal).await?;

    Ok(SignInOutcome {
        session,
        redirect_to: portal.dashboard_path(),
        role_updated,
    })
}

/// Register through the portal for `role` and sign the new account in
pub async fn sign_up<I>(
    identity: &I,
    role: Role,
    credentials: &Credentials,
    policy: RolePolicy,
) -> MarketplaceResult<SignInOutcome>
where
    I: IdentityProvider + ?Sized,
{
    if role == Role::Admin {
        if policy == RolePolicy::Enforce {
            return Err(MarketplaceError::Forbidden);
        }
        warn!("Self-registration as admin for {}", credentials.email);
    }

    let principal = identity.sign_up(credentials, role).await?;
    let session = identity.issue_session(&principal).await?;

    Ok(SignInOutcome {
        session,
        redirect_to: role.dashboard_path(),
        role_updated: false,
    })
}
