use anyhow::Result;
use std::sync::Arc;
use tracing::info;

mod error;
mod middleware;
mod models;
mod repositories;
mod routes;
mod settings;
mod state;

use common::database::{DatabaseConfig, health_check, init_pool};
use common::telemetry;
use common::token::TokenVerifier;
use tokio::net::TcpListener;

use crate::{repositories::PgMarketplaceStore, settings::ApiSettings, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing("info");

    info!("Starting API service");

    let settings = ApiSettings::load()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    let app_state = AppState {
        store: Arc::new(PgMarketplaceStore::new(pool)),
        verifier: TokenVerifier::from_env()?,
    };

    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(&settings.bind_address).await?;
    info!("API service listening on {}", settings.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
