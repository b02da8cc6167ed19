//! Custom error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use marketplace::MarketplaceError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing, invalid or expired bearer token
    #[error("Unauthorized")]
    Unauthorized,

    /// Error raised by a marketplace workflow or the data boundary
    #[error(transparent)]
    Marketplace(#[from] MarketplaceError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Marketplace(err) => match err {
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
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("API request failed: {}", self);
        }

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
