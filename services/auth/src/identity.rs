//! PostgreSQL/Redis backed identity boundary

use async_trait::async_trait;
use common::cache::RedisPool;
use common::token::Claims;
use marketplace::MarketplaceError;
use marketplace::error::MarketplaceResult;
use marketplace::models::{
    AuthSession, Credentials, Principal, Role, SessionEvent, SessionEventKind, TokenPair,
};
use marketplace::ports::IdentityProvider;
use tokio::sync::broadcast;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::jwt::JwtService;
use crate::models::NewUser;
use crate::repositories::UserRepository;
use crate::repositories::user::verify_password;
use crate::session::SessionManager;
use crate::validation::{validate_email, validate_password};

const INVALID_CREDENTIALS: &str = "Invalid login credentials";
const INVALID_REFRESH_TOKEN: &str = "Invalid refresh token";

/// Log an infrastructure failure and hide its details from the caller
fn internal(context: &str, e: anyhow::Error) -> MarketplaceError {
    error!("{}: {}", context, e);
    MarketplaceError::Store(format!("{} failed", context))
}

fn already_registered() -> MarketplaceError {
    MarketplaceError::Validation("User already registered".to_string())
}

/// A concurrent sign-up that won the race on `users.email` is a duplicate, not a failure
fn creation_error(e: anyhow::Error) -> MarketplaceError {
    let duplicate = e
        .downcast_ref::<sqlx::Error>()
        .and_then(sqlx::Error::as_database_error)
        .is_some_and(|db| db.is_unique_violation());
    if duplicate {
        debug!("Sign-up lost a race on a duplicate email");
        return already_registered();
    }
    internal("User creation", e)
}

fn invalid_refresh_token() -> MarketplaceError {
    MarketplaceError::Identity(INVALID_REFRESH_TOKEN.to_string())
}

#[derive(Clone)]
pub struct AuthIdentity {
    users: UserRepository,
    jwt_service: JwtService,
    sessions: SessionManager,
    redis_pool: RedisPool,
    events: broadcast::Sender<SessionEvent>,
}

impl AuthIdentity {
    pub fn new(
        users: UserRepository,
        jwt_service: JwtService,
        redis_pool: RedisPool,
        event_buffer: usize,
    ) -> Self {
        let sessions = SessionManager::new(redis_pool.clone(), jwt_service.refresh_token_expiry());
        let (events, _) = broadcast::channel(event_buffer.max(1));
        Self {
            users,
            jwt_service,
            sessions,
            redis_pool,
            events,
        }
    }

    fn publish(&self, kind: SessionEventKind, principal: &Principal) {
        let event = SessionEvent::new(kind, principal.user_id, principal.role);
        if self.events.send(event).is_err() {
            debug!("No session event subscribers");
        }
    }

    /// Validate a refresh token and make sure it is still the live one
    async fn live_refresh_claims(&self, refresh_token: &str) -> MarketplaceResult<Claims> {
        let claims = self
            .jwt_service
            .validate_refresh_token(refresh_token)
            .map_err(|_| invalid_refresh_token())?;

        let blacklisted = self
            .jwt_service
            .is_token_blacklisted(&self.redis_pool, &claims)
            .await
            .map_err(|e| internal("Blacklist lookup", e))?;
        if blacklisted {
            return Err(invalid_refresh_token());
        }

        let current = self
            .sessions
            .is_session_valid(claims.sub, refresh_token)
            .await
            .map_err(|e| internal("Session lookup", e))?;
        if !current {
            return Err(invalid_refresh_token());
        }

        Ok(claims)
    }
}

#[async_trait]
impl IdentityProvider for AuthIdentity {
    async fn sign_up(&self, credentials: &Credentials, role: Role) -> MarketplaceResult<Principal> {
        let email = credentials.email.trim().to_lowercase();
        validate_email(&email).map_err(MarketplaceError::Validation)?;
        validate_password(&credentials.password).map_err(MarketplaceError::Validation)?;

        let existing = self
            .users
            .find_by_email(&email)
            .await
            .map_err(|e| internal("User lookup", e))?;
        if existing.is_some() {
            return Err(already_registered());
        }

        let user = self
            .users
            .create(&NewUser {
                email,
                password: credentials.password.clone(),
                role,
            })
            .await
            .map_err(creation_error)?;

        info!("User {} signed up as {}", user.id, role);
        let principal = user.principal();
        self.publish(SessionEventKind::SignedUp, &principal);
        Ok(principal)
    }

    async fn authenticate(&self, credentials: &Credentials) -> MarketplaceResult<Principal> {
        let user = self
            .users
            .find_by_email(credentials.email.trim())
            .await
            .map_err(|e| internal("User lookup", e))?
            .ok_or_else(|| MarketplaceError::Identity(INVALID_CREDENTIALS.to_string()))?;

        let valid = verify_password(&user.password_hash, &credentials.password)
            .map_err(|e| internal("Password check", e))?;
        if !valid {
            info!("Failed sign-in for user {}", user.id);
            return Err(MarketplaceError::Identity(INVALID_CREDENTIALS.to_string()));
        }

        Ok(user.principal())
    }

    async fn update_role(&self, user_id: Uuid, role: Role) -> MarketplaceResult<Principal> {
        let user = self
            .users
            .update_role(user_id, role)
            .await
            .map_err(|e| internal("Role update", e))?
            .ok_or_else(|| MarketplaceError::Identity("User not found".to_string()))?;

        let principal = user.principal();
        self.publish(SessionEventKind::RoleUpdated, &principal);
        Ok(principal)
    }

    async fn issue_session(&self, principal: &Principal) -> MarketplaceResult<AuthSession> {
        let access_token = self
            .jwt_service
            .generate_access_token(principal)
            .map_err(|e| internal("Access token generation", e))?;
        let refresh_token = self
            .jwt_service
            .generate_refresh_token(principal)
            .map_err(|e| internal("Refresh token generation", e))?;

        self.sessions
            .create_session(principal.user_id, &refresh_token)
            .await
            .map_err(|e| internal("Session store", e))?;

        self.publish(SessionEventKind::SignedIn, principal);
        Ok(AuthSession {
            principal: principal.clone(),
            tokens: TokenPair {
                access_token,
                refresh_token,
                token_type: "Bearer".to_string(),
                expires_in: self.jwt_service.access_token_expiry(),
            },
        })
    }

    async fn refresh_session(&self, refresh_token: &str) -> MarketplaceResult<AuthSession> {
        let claims = self.live_refresh_claims(refresh_token).await?;

        // Role may have changed since the token was issued
        let user = self
            .users
            .find_by_id(claims.sub)
            .await
            .map_err(|e| internal("User lookup", e))?
            .ok_or_else(invalid_refresh_token)?;

        self.jwt_service
            .blacklist_token(&self.redis_pool, &claims)
            .await
            .map_err(|e| internal("Token revocation", e))?;

        self.issue_session(&user.principal()).await
    }

    async fn sign_out(&self, refresh_token: &str) -> MarketplaceResult<()> {
        let claims = self.live_refresh_claims(refresh_token).await?;

        self.jwt_service
            .blacklist_token(&self.redis_pool, &claims)
            .await
            .map_err(|e| internal("Token revocation", e))?;
        self.sessions
            .delete_session(claims.sub)
            .await
            .map_err(|e| internal("Session removal", e))?;

        info!("User {} signed out", claims.sub);
        let principal = Principal {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role.as_deref().and_then(|role| role.parse().ok()),
        };
        self.publish(SessionEventKind::SignedOut, &principal);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}
