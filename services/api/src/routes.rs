//! API routes

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use marketplace::models::Role;
use marketplace::workflows::{
    AdminDashboard, BookingDetail, BookingForm, CategorySubmission, ClientDashboard,
    CustomerProfileForm, ProviderDashboard, ProviderProfileForm, ServiceSubmission,
    approve_service, browse_services, cancel_booking, create_booking, featured_services,
    list_bookings_for, list_providers, reject_service, service_for_booking, submit_category,
    submit_service, top_providers, update_booking_status, update_customer_profile,
    update_provider_profile,
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::ApiResult,
    middleware::{AuthUser, auth_middleware, require_role},
    models::{ServicesQuery, StatusUpdateRequest},
    state::AppState,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health_check))
        .route("/categories", get(get_categories))
        .route("/services", get(get_services))
        .route("/services/featured", get(get_featured_services))
        .route("/services/:id", get(get_service))
        .route("/providers", get(get_providers))
        .route("/providers/top", get(get_top_providers));

    let provider = Router::new()
        .route("/bookings/:id/status", post(set_booking_status))
        .route("/provider/profile", put(put_provider_profile))
        .route("/provider/dashboard", get(get_provider_dashboard))
        .route("/provider/services", post(post_service))
        .route("/provider/categories", post(post_category))
        .route_layer(middleware::from_fn_with_state(Role::Provider, require_role));

    let client = Router::new()
        .route("/client/profile", put(put_client_profile))
        .route("/client/dashboard", get(get_client_dashboard))
        .route_layer(middleware::from_fn_with_state(Role::Client, require_role));

    let admin = Router::new()
        .route("/admin/dashboard", get(get_admin_dashboard))
        .route("/admin/services/:id/approve", post(approve))
        .route("/admin/services/:id/reject", post(reject))
        .route_layer(middleware::from_fn_with_state(Role::Admin, require_role));

    let protected = Router::new()
        .route("/bookings", post(post_booking).get(get_bookings))
        .route("/bookings/:id", get(get_booking))
        .route("/bookings/:id/cancel", post(cancel))
        .merge(provider)
        .merge(client)
        .merge(admin)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "api-service"
    }))
}

pub async fn get_categories(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let categories = state.store.list_categories().await?;
    Ok(Json(categories))
}

/// Approved services, optionally restricted to one category
pub async fn get_services(
    State(state): State<AppState>,
    Query(query): Query<ServicesQuery>,
) -> ApiResult<impl IntoResponse> {
    let services = browse_services(state.store.as_ref(), query.category).await?;
    Ok(Json(services))
}

pub async fn get_featured_services(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let services = featured_services(state.store.as_ref()).await?;
    Ok(Json(services))
}

/// Service shown on the booking page
pub async fn get_service(
    State(state): State<AppState>,
    Path(service_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let service = service_for_booking(state.store.as_ref(), service_id).await?;
    Ok(Json(service))
}

pub async fn get_providers(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let providers = list_providers(state.store.as_ref()).await?;
    Ok(Json(providers))
}

pub async fn get_top_providers(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let providers = top_providers(state.store.as_ref()).await?;
    Ok(Json(providers))
}

/// Book a service
pub async fn post_booking(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    Json(form): Json<BookingForm>,
) -> ApiResult<impl IntoResponse> {
    info!(
        "Booking request from {} for service {}",
        session.user_id, form.service_id
    );

    let outcome = create_booking(state.store.as_ref(), Some(&session), &form).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// Bookings visible to the caller's role
pub async fn get_bookings(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
) -> ApiResult<impl IntoResponse> {
    let bookings = list_bookings_for(state.store.as_ref(), &session).await?;
    Ok(Json(bookings))
}

pub async fn get_booking(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    Path(booking_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let detail = BookingDetail::load(state.store.as_ref(), &session, booking_id).await?;
    Ok(Json(detail))
}

/// Customer cancels a pending booking
pub async fn cancel(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    Path(booking_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let booking = cancel_booking(state.store.as_ref(), &session, booking_id).await?;
    Ok(Json(booking))
}

/// Provider moves one of their bookings forward
pub async fn set_booking_status(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<StatusUpdateRequest>,
) -> ApiResult<impl IntoResponse> {
    let booking =
        update_booking_status(state.store.as_ref(), &session, booking_id, payload.status).await?;
    Ok(Json(booking))
}

pub async fn put_provider_profile(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    Json(form): Json<ProviderProfileForm>,
) -> ApiResult<impl IntoResponse> {
    let provider = update_provider_profile(state.store.as_ref(), &session, form).await?;
    Ok(Json(provider))
}

pub async fn get_provider_dashboard(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
) -> ApiResult<impl IntoResponse> {
    let dashboard = ProviderDashboard::load(state.store.as_ref(), &session).await?;
    Ok(Json(dashboard))
}

/// Submit a service for admin approval
pub async fn post_service(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    Json(submission): Json<ServiceSubmission>,
) -> ApiResult<impl IntoResponse> {
    let service = submit_service(state.store.as_ref(), &session, submission).await?;
    Ok((StatusCode::CREATED, Json(service)))
}

pub async fn post_category(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    Json(submission): Json<CategorySubmission>,
) -> ApiResult<impl IntoResponse> {
    let category = submit_category(state.store.as_ref(), &session, submission).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn put_client_profile(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    Json(form): Json<CustomerProfileForm>,
) -> ApiResult<impl IntoResponse> {
    let customer = update_customer_profile(state.store.as_ref(), &session, form).await?;
    Ok(Json(customer))
}

pub async fn get_client_dashboard(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
) -> ApiResult<impl IntoResponse> {
    let dashboard = ClientDashboard::load(state.store.as_ref(), &session).await?;
    Ok(Json(dashboard))
}

/// Pending services plus provider/client counts
pub async fn get_admin_dashboard(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
) -> ApiResult<impl IntoResponse> {
    let dashboard = AdminDashboard::load(state.store.as_ref(), &session).await?;
    Ok(Json(dashboard))
}

pub async fn approve(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    Path(service_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    approve_service(state.store.as_ref(), &session, service_id).await?;
    Ok(Json(json!({"message": "Service approved"})))
}

/// Rejection deletes the service
pub async fn reject(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    Path(service_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    reject_service(state.store.as_ref(), &session, service_id).await?;
    Ok(Json(json!({"message": "Service rejected"})))
}
