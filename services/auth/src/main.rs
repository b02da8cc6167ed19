use anyhow::Result;
use std::sync::Arc;
use tracing::info;

mod identity;
mod jwt;
mod models;
mod rate_limiter;
mod repositories;
mod routes;
mod session;
mod settings;
mod validation;

use common::cache::{RedisConfig, RedisPool};
use common::token::TokenVerifier;
use common::{database, telemetry};
use marketplace::models::RolePolicy;
use marketplace::ports::IdentityProvider;

use crate::{
    identity::AuthIdentity,
    jwt::{JwtConfig, JwtService},
    rate_limiter::RateLimiter,
    repositories::UserRepository,
    settings::AuthSettings,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityProvider>,
    pub rate_limiter: RateLimiter,
    pub role_policy: RolePolicy,
    pub verifier: TokenVerifier,
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing("info");

    info!("Starting identity service");

    let settings = AuthSettings::load()?;
    if settings.role_policy == RolePolicy::SelfAssign {
        tracing::warn!("Role policy is self_assign: sign-in rewrites stored roles");
    }

    // Initialize database connection pool
    let db_config = database::DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }
    database::run_migrations(&pool).await?;

    let jwt_service = JwtService::new(JwtConfig::from_env()?)?;

    let redis_config = RedisConfig::from_env()?;
    let redis_pool = RedisPool::new(&redis_config).await?;
    if !redis_pool.health_check().await? {
        anyhow::bail!("Failed to connect to Redis");
    }

    let verifier = jwt_service.verifier();
    let identity = AuthIdentity::new(
        UserRepository::new(pool),
        jwt_service,
        redis_pool,
        settings.event_buffer,
    );

    let app_state = AppState {
        identity: Arc::new(identity),
        rate_limiter: RateLimiter::new(settings.rate_limit.clone()),
        role_policy: settings.role_policy,
        verifier,
    };

    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&settings.bind_address).await?;
    info!("Identity service listening on {}", settings.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
