//! Bearer authentication and portal guards

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use marketplace::MarketplaceError;
use marketplace::models::{Role, Session};
use tracing::{debug, warn};

use crate::{error::ApiError, state::AppState};

/// Authenticated session taken from the request extensions
#[derive(Debug, Clone)]
pub struct AuthUser(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(AuthUser)
            .ok_or(ApiError::Unauthorized)
    }
}

/// Authentication middleware
///
/// Verifies the access token and stores the resulting [`Session`] in the
/// request extensions. Tokens without a recognised role are refused.
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(ApiError::Unauthorized)?;

    let claims = state.verifier.verify_access(bearer.token()).map_err(|e| {
        debug!("Rejected bearer token: {}", e);
        ApiError::Unauthorized
    })?;

    let role: Role = claims
        .role
        .as_deref()
        .and_then(|role| role.parse().ok())
        .ok_or_else(|| {
            warn!("Token for user {} carries no usable role", claims.sub);
            ApiError::Unauthorized
        })?;

    req.extensions_mut().insert(Session {
        user_id: claims.sub,
        email: claims.email,
        role,
    });

    Ok(next.run(req).await)
}

/// Portal guard, used as `from_fn_with_state(Role::Admin, require_role)`
pub async fn require_role(
    State(role): State<Role>,
    AuthUser(session): AuthUser,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !session.has_role(role) {
        debug!(
            "User {} with role {} refused from the {} portal",
            session.user_id, session.role, role
        );
        return Err(MarketplaceError::Forbidden.into());
    }

    Ok(next.run(req).await)
}
