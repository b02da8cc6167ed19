//! Application state shared across handlers

use common::token::TokenVerifier;
use marketplace::ports::MarketplaceStore;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MarketplaceStore>,
    pub verifier: TokenVerifier,
}
