//! Identity service routes

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use marketplace::MarketplaceError;
use marketplace::models::{Credentials, Role};
use marketplace::workflows::{sign_in, sign_up};
use serde::Deserialize;
use std::convert::Infallible;
use thiserror::Error;
use tokio_stream::{Stream, StreamExt};
use tokio_stream::wrappers::{BroadcastStream, errors::BroadcastStreamRecvError};
use tracing::{debug, error, info, warn};

use crate::AppState;

/// Request for sign-up
#[derive(Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Request carrying a refresh token
#[derive(Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Create the router for the identity service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/auth/signup", post(signup))
        .route("/auth/signin/:portal", post(signin))
        .route("/auth/refresh", post(refresh_token))
        .route("/auth/logout", post(logout))
        .route("/auth/events", get(session_events))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

/// Register through one of the portals
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignUpRequest>,
) -> Result<impl IntoResponse, AuthError> {
    info!("Sign-up request for {} as {}", payload.email, payload.role);

    let credentials = Credentials {
        email: payload.email,
        password: payload.password,
    };
    let outcome = sign_up(
        state.identity.as_ref(),
        payload.role,
        &credentials,
        state.role_policy,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(outcome)))
}

/// Role-specific sign-in
pub async fn signin(
    State(state): State<AppState>,
    Path(portal): Path<String>,
    Json(credentials): Json<Credentials>,
) -> Result<impl IntoResponse, AuthError> {
    let portal: Role = portal
        .parse()
        .map_err(|_| AuthError::UnknownPortal(portal.clone()))?;
    info!("Sign-in attempt for {} through the {} portal", credentials.email, portal);

    let limiter_key = format!("signin:{}", credentials.email.trim().to_lowercase());
    if !state.rate_limiter.is_allowed(&limiter_key).await {
        return Err(AuthError::RateLimited);
    }

    let outcome = sign_in(
        state.identity.as_ref(),
        portal,
        &credentials,
        state.role_policy,
    )
    .await?;
    state.rate_limiter.reset(&limiter_key).await;

    Ok((StatusCode::OK, Json(outcome)))
}

/// Exchange a refresh token for a new token pair
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, AuthError> {
    info!("Token refresh request");

    let session = state.identity.refresh_session(&payload.refresh_token).await?;

    Ok((StatusCode::OK, Json(session.tokens)))
}

/// Revoke a refresh token
pub async fn logout(
    State(state): State<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, AuthError> {
    info!("Logout request");

    state.identity.sign_out(&payload.refresh_token).await?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({"message": "Logged out successfully"})),
    ))
}

/// Session-change notifications for the bearer's own account, as server-sent events
pub async fn session_events(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AuthError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AuthError::Unauthorized)?;
    let claims = state.verifier.verify_access(bearer.token()).map_err(|e| {
        debug!("Rejected bearer token on event stream: {}", e);
        AuthError::Unauthorized
    })?;
    let user_id = claims.sub;

    let stream = BroadcastStream::new(state.identity.subscribe()).filter_map(move |result| match result {
        Ok(event) if event.user_id != user_id => None,
        Ok(event) => match Event::default().event("session").json_data(&event) {
            Ok(sse) => Some(Ok(sse)),
            Err(e) => {
                error!("Failed to encode session event: {}", e);
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            warn!("Session event subscriber lagged, {} events dropped", skipped);
            None
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Errors returned by the identity routes
#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Marketplace(#[from] MarketplaceError),

    #[error("Unknown portal: {0}")]
    UnknownPortal(String),

    #[error("Too many sign-in attempts, try again later")]
    RateLimited,

    #[error("Unauthorized")]
    Unauthorized,
}

impl AuthError {
    fn status(&self) -> StatusCode {
        match self {
            AuthError::Marketplace(err) => match err {
                MarketplaceError::Unauthenticated | MarketplaceError::Identity(_) => {
                    StatusCode::UNAUTHORIZED
                }
                MarketplaceError::Validation(_) => StatusCode::BAD_REQUEST,
                MarketplaceError::Forbidden | MarketplaceError::RoleMismatch { .. } => {
                    StatusCode::FORBIDDEN
                }
                MarketplaceError::ServiceNotFound(_) | MarketplaceError::BookingNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                MarketplaceError::NoProvidersAvailable
                | MarketplaceError::InvalidTransition { .. } => StatusCode::CONFLICT,
                MarketplaceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AuthError::UnknownPortal(_) => StatusCode::NOT_FOUND,
            AuthError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Identity request failed: {}", self);
        }

        let body = Json(serde_json::json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limiter::{RateLimiter, RateLimiterConfig};
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use common::token::{Claims, TokenType, TokenVerifier};
    use jsonwebtoken::{EncodingKey, Header, encode};
    use marketplace::models::{Principal, RolePolicy};
    use marketplace::ports::IdentityProvider;
    use marketplace::testing::MockIdentity;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};
    use tower::ServiceExt;
    use uuid::Uuid;

    const SECRET: &[u8] = b"auth-test-secret";

    fn token(user_id: Uuid, token_type: TokenType) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let claims = Claims {
            sub: user_id,
            email: "rahim@example.com".to_string(),
            role: Some(Role::Client.to_string()),
            jti: Uuid::new_v4(),
            iat: now,
            exp: now + 600,
            token_type,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET)).unwrap()
    }

    fn events_request(bearer: Option<&str>) -> Request<Body> {
        let mut request = Request::builder().uri("/auth/events");
        if let Some(bearer) = bearer {
            request = request.header(header::AUTHORIZATION, format!("Bearer {bearer}"));
        }
        request.body(Body::empty()).unwrap()
    }

    fn credentials() -> Credentials {
        Credentials {
            email: "rahim@example.com".to_string(),
            password: "Secret#123".to_string(),
        }
    }

    fn app(identity: MockIdentity, role_policy: RolePolicy) -> Router {
        create_router(AppState {
            identity: Arc::new(identity),
            rate_limiter: RateLimiter::new(RateLimiterConfig {
                max_attempts: 2,
                window_seconds: 300,
                ban_duration_seconds: 3600,
            }),
            role_policy,
            verifier: TokenVerifier::from_secret(SECRET),
        })
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn signin_body(password: &str) -> Value {
        json!({"email": "rahim@example.com", "password": password})
    }

    #[tokio::test]
    async fn test_signin_rewrites_role_and_redirects() {
        let identity = MockIdentity::new().with_user(&credentials(), Some(Role::Client));
        let app = app(identity.clone(), RolePolicy::SelfAssign);

        let response = app
            .oneshot(post_json("/auth/signin/admin", signin_body("Secret#123")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["redirect_to"], "/admin/dashboard");
        assert_eq!(body["role_updated"], true);
        assert_eq!(body["session"]["principal"]["role"], "admin");
        assert_eq!(identity.update_role_calls(), 1);
    }

    #[tokio::test]
    async fn test_signin_enforce_policy_refuses_mismatch() {
        let identity = MockIdentity::new().with_user(&credentials(), Some(Role::Client));
        let app = app(identity.clone(), RolePolicy::Enforce);

        let response = app
            .oneshot(post_json("/auth/signin/provider", signin_body("Secret#123")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(identity.update_role_calls(), 0);
    }

    #[tokio::test]
    async fn test_signin_wrong_password() {
        let identity = MockIdentity::new().with_user(&credentials(), Some(Role::Client));

        let response = app(identity, RolePolicy::SelfAssign)
            .oneshot(post_json("/auth/signin/client", signin_body("wrong")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            read_json(response).await["error"],
            "Invalid login credentials"
        );
    }

    #[tokio::test]
    async fn test_signin_unknown_portal() {
        let response = app(MockIdentity::new(), RolePolicy::SelfAssign)
            .oneshot(post_json("/auth/signin/superuser", signin_body("Secret#123")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_signin_is_rate_limited() {
        let app = app(MockIdentity::new(), RolePolicy::SelfAssign);

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(post_json("/auth/signin/client", signin_body("nope")))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }

        let response = app
            .oneshot(post_json("/auth/signin/client", signin_body("nope")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_signup_lands_on_dashboard() {
        let response = app(MockIdentity::new(), RolePolicy::SelfAssign)
            .oneshot(post_json(
                "/auth/signup",
                json!({"email": "new@example.com", "password": "Secret#123", "role": "provider"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = read_json(response).await;
        assert_eq!(body["redirect_to"], "/provider/dashboard");
        assert_eq!(body["session"]["tokens"]["token_type"], "Bearer");
    }

    #[tokio::test]
    async fn test_admin_signup_refused_when_enforcing() {
        let response = app(MockIdentity::new(), RolePolicy::Enforce)
            .oneshot(post_json(
                "/auth/signup",
                json!({"email": "boss@example.com", "password": "Secret#123", "role": "admin"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_refresh_rotates_token() {
        let identity = MockIdentity::new().with_user(&credentials(), Some(Role::Client));
        let app = app(identity, RolePolicy::SelfAssign);

        let signed_in = read_json(
            app.clone()
                .oneshot(post_json("/auth/signin/client", signin_body("Secret#123")))
                .await
                .unwrap(),
        )
        .await;
        let refresh = signed_in["session"]["tokens"]["refresh_token"].clone();

        let response = app
            .clone()
            .oneshot(post_json("/auth/refresh", json!({"refresh_token": refresh})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let rotated = read_json(response).await;
        assert_ne!(rotated["refresh_token"], refresh);

        let replay = app
            .oneshot(post_json("/auth/refresh", json!({"refresh_token": refresh})))
            .await
            .unwrap();
        assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout() {
        let identity = MockIdentity::new();

        let response = app(identity.clone(), RolePolicy::SelfAssign)
            .oneshot(post_json("/auth/logout", json!({"refresh_token": "refresh-x"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(identity.revoked_tokens(), vec!["refresh-x".to_string()]);
    }

    #[tokio::test]
    async fn test_events_stream_headers() {
        let bearer = token(Uuid::new_v4(), TokenType::Access);
        let response = app(MockIdentity::new(), RolePolicy::SelfAssign)
            .oneshot(events_request(Some(&bearer)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );
    }

    #[tokio::test]
    async fn test_events_require_access_token() {
        let app = app(MockIdentity::new(), RolePolicy::SelfAssign);

        let anonymous = app.clone().oneshot(events_request(None)).await.unwrap();
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

        let garbage = app.clone().oneshot(events_request(Some("not-a-jwt"))).await.unwrap();
        assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);

        let refresh = token(Uuid::new_v4(), TokenType::Refresh);
        let response = app.oneshot(events_request(Some(&refresh))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_events_only_carry_the_bearers_account() {
        let identity = MockIdentity::new();
        let alice = Principal {
            user_id: Uuid::new_v4(),
            email: "alice@example.com".to_string(),
            role: Some(Role::Client),
        };
        let other = Principal {
            user_id: Uuid::new_v4(),
            email: "other@example.com".to_string(),
            role: Some(Role::Provider),
        };

        let response = app(identity.clone(), RolePolicy::SelfAssign)
            .oneshot(events_request(Some(&token(alice.user_id, TokenType::Access))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        identity.issue_session(&other).await.unwrap();
        identity.issue_session(&alice).await.unwrap();

        let mut frames = response.into_body().into_data_stream();
        let frame = tokio::time::timeout(Duration::from_secs(5), frames.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let frame = String::from_utf8(frame.to_vec()).unwrap();

        assert!(frame.contains("event: session"));
        assert!(frame.contains(&alice.user_id.to_string()));
        assert!(!frame.contains(&other.user_id.to_string()));
    }
}
