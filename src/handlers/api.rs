use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::models::{
    BookingConfirmation, BookingFormResponse, CancelBookingRequest, CancellationConfirmation,
    CreateBookingRequest, MenuResponse, ServiceError,
};
use crate::observability::Metrics;
use crate::services::{BookingService, MenuService};

/// Shared application state containing all services
#[derive(Clone)]
pub struct ApiState {
    pub menu_service: Arc<MenuService>,
    pub booking_service: Arc<BookingService>,
    pub metrics: Arc<Metrics>,
}

/// Create API router with all endpoints
pub fn create_api_router(
    menu_service: Arc<MenuService>,
    booking_service: Arc<BookingService>,
    metrics: Arc<Metrics>,
) -> Router {
    let state = ApiState {
        menu_service,
        booking_service,
        metrics,
    };

    Router::new()
        // Menu browsing endpoint (read-only)
        .route("/menu", get(list_menu))
        // Booking endpoints
        .route("/booking/create", get(booking_form).post(create_booking))
        .route("/booking/cancel", post(cancel_booking))
        .with_state(state)
}

// =============================================================================
// MENU ENDPOINTS
// =============================================================================

/// List all dishes on the menu
#[instrument(name = "list_menu", skip(state))]
pub async fn list_menu(
    State(state): State<ApiState>,
) -> Result<Json<MenuResponse>, (StatusCode, Json<Value>)> {
    info!("Listing menu");

    match state.menu_service.list_dishes().await {
        Ok(response) => {
            info!("Successfully listed {} dishes", response.total_count);
            state.metrics.record_menu_operation("list", "success");
            Ok(Json(response))
        }
        Err(err) => {
            error!("Failed to list menu: {}", err);
            state.metrics.record_menu_operation("list", "error");
            Err(service_error_to_response(err))
        }
    }
}

// =============================================================================
// BOOKING ENDPOINTS
// =============================================================================

/// Show the booking form: dishes that still have portions available
#[instrument(name = "booking_form", skip(state))]
pub async fn booking_form(
    State(state): State<ApiState>,
) -> Result<Json<BookingFormResponse>, (StatusCode, Json<Value>)> {
    info!("Listing dishes open for booking");

    match state.menu_service.booking_form().await {
        Ok(response) => {
            info!("{} dishes open for booking", response.dishes.len());
            state.metrics.record_menu_operation("booking_form", "success");
            Ok(Json(response))
        }
        Err(err) => {
            error!("Failed to list bookable dishes: {}", err);
            state.metrics.record_menu_operation("booking_form", "error");
            Err(service_error_to_response(err))
        }
    }
}

/// Place a booking for a dish
#[instrument(name = "create_booking", skip(state, request), fields(
    dish_id = %request.dish_id,
    quantity = %request.quantity,
))]
pub async fn create_booking(
    State(state): State<ApiState>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingConfirmation>), (StatusCode, Json<Value>)> {
    crate::info_with_trace!(
        "Creating booking for dish_id: {}, quantity: {}",
        request.dish_id,
        request.quantity
    );

    match state.booking_service.create_booking(request).await {
        Ok(confirmation) => {
            crate::info_with_trace!(
                "Successfully created booking: {}",
                confirmation.booking.id
            );
            state.metrics.record_booking_operation("create", "success");
            Ok((StatusCode::CREATED, Json(confirmation)))
        }
        Err(err) => {
            crate::error_with_trace!("Failed to create booking: {}", err);
            state.metrics.record_booking_operation("create", "error");
            Err(service_error_to_response(err))
        }
    }
}

/// Cancel a booking, restoring the dish's inventory
#[instrument(name = "cancel_booking", skip(state, request), fields(
    booking_id = %request.booking_id,
))]
pub async fn cancel_booking(
    State(state): State<ApiState>,
    Json(request): Json<CancelBookingRequest>,
) -> Result<Json<CancellationConfirmation>, (StatusCode, Json<Value>)> {
    crate::info_with_trace!("Cancelling booking: {}", request.booking_id);

    match state.booking_service.cancel_booking(&request.booking_id).await {
        Ok(confirmation) => {
            crate::info_with_trace!("Successfully cancelled booking");
            state.metrics.record_booking_operation("cancel", "success");
            Ok(Json(confirmation))
        }
        Err(err) => {
            crate::error_with_trace!("Failed to cancel booking: {}", err);
            state.metrics.record_booking_operation("cancel", "error");
            Err(service_error_to_response(err))
        }
    }
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Convert ServiceError to HTTP response
pub(crate) fn service_error_to_response(err: ServiceError) -> (StatusCode, Json<Value>) {
    let (status, message) = match err {
        ServiceError::DishNotFound { .. } => {
            (StatusCode::NOT_FOUND, "Dish not found.".to_string())
        }
        ServiceError::BookingNotFound { .. } => {
            (StatusCode::NOT_FOUND, "Booking not found.".to_string())
        }
        ServiceError::InvalidQuantity { .. } => (
            StatusCode::BAD_REQUEST,
            "Invalid quantity or dish not available.".to_string(),
        ),
        ServiceError::DishAlreadyExists { .. } => (StatusCode::CONFLICT, err.to_string()),
        ServiceError::ValidationError { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        ServiceError::Repository { source } => match source {
            crate::models::RepositoryError::NotFound => {
                (StatusCode::NOT_FOUND, "Resource not found".to_string())
            }
            crate::models::RepositoryError::ConnectionFailed => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Database connection failed".to_string(),
            ),
            crate::models::RepositoryError::Timeout => {
                (StatusCode::REQUEST_TIMEOUT, "Request timeout".to_string())
            }
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        },
        ServiceError::Configuration { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Configuration error".to_string(),
        ),
    };

    (
        status,
        Json(json!({
            "error": message,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}
