use axum::{extract::State, http::StatusCode, response::Json, routing::post, Router};
use rust_decimal_macros::dec;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::models::{CreateDishRequest, Dish};
use crate::repositories::TableManager;
use crate::services::{BookingService, MenuService};

/// Admin state containing services
#[derive(Clone)]
pub struct AdminState {
    pub menu_service: Arc<MenuService>,
    pub booking_service: Arc<BookingService>,
    pub table_manager: Arc<TableManager>,
}

/// Response for seeding operations
#[derive(Debug, Serialize)]
pub struct SeedResponse {
    pub message: String,
    pub dishes_created: usize,
    pub timestamp: String,
}

/// Response for cleanup operations
#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub message: String,
    pub dishes_deleted: usize,
    pub bookings_deleted: usize,
    pub timestamp: String,
}

/// Response for table setup operations
#[derive(Debug, Serialize)]
pub struct SetupTablesResponse {
    pub message: String,
    pub tables_created: Vec<String>,
    pub timestamp: String,
}

/// Create admin router with database management endpoints
pub fn create_admin_router(
    menu_service: Arc<MenuService>,
    booking_service: Arc<BookingService>,
    table_manager: Arc<TableManager>,
) -> Router {
    let state = AdminState {
        menu_service,
        booking_service,
        table_manager,
    };

    Router::new()
        // Database setup and management endpoints
        .route("/api/admin/setup-tables", post(setup_tables))
        .route("/api/admin/seed", post(seed_database))
        .route("/api/admin/cleanup", post(cleanup_database))
        // Dish management endpoint (admin only)
        .route("/api/admin/dishes", post(create_dish))
        .with_state(state)
}

// =============================================================================
// DATABASE SETUP, SEEDING AND CLEANUP ENDPOINTS
// =============================================================================

/// Set up the required DynamoDB tables
#[instrument(name = "setup_tables", skip(state))]
pub async fn setup_tables(
    State(state): State<AdminState>,
) -> Result<Json<SetupTablesResponse>, (StatusCode, Json<Value>)> {
    let timestamp = chrono::Utc::now().to_rfc3339();

    info!("Setting up DynamoDB tables");

    match state.table_manager.create_all_tables().await {
        Ok(tables_created) => {
            info!("Successfully created tables: {:?}", tables_created);

            Ok(Json(SetupTablesResponse {
                message: format!("Successfully created {} tables", tables_created.len()),
                tables_created,
                timestamp,
            }))
        }
        Err(err) => {
            error!("Failed to create tables: {}", err);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to create tables",
                    "message": err.to_string(),
                    "timestamp": timestamp,
                })),
            ))
        }
    }
}

/// Seed the database with a sample menu
#[instrument(name = "seed_database", skip(state))]
pub async fn seed_database(
    State(state): State<AdminState>,
) -> Result<Json<SeedResponse>, (StatusCode, Json<Value>)> {
    let timestamp = chrono::Utc::now().to_rfc3339();

    info!("Seeding database with sample menu");

    let sample_dishes = create_sample_dishes();
    let mut created_count = 0;
    let mut errors = Vec::new();

    for dish_request in sample_dishes {
        let name = dish_request.name.clone();
        match state.menu_service.add_dish(dish_request).await {
            Ok(_) => {
                created_count += 1;
                info!("Successfully seeded dish: {}", name);
            }
            Err(err) => {
                warn!("Failed to seed dish {}: {}", name, err);
                errors.push(format!("{}: {}", name, err));
            }
        }
    }

    if errors.is_empty() {
        info!("Successfully seeded database with {} dishes", created_count);

        Ok(Json(SeedResponse {
            message: format!("Database seeded successfully with {} dishes", created_count),
            dishes_created: created_count,
            timestamp,
        }))
    } else {
        warn!("Database seeding completed with {} errors", errors.len());

        if created_count > 0 {
            Ok(Json(SeedResponse {
                message: format!(
                    "Database seeded with {} dishes, {} errors occurred",
                    created_count,
                    errors.len()
                ),
                dishes_created: created_count,
                timestamp,
            }))
        } else {
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to seed database",
                    "details": errors,
                    "timestamp": timestamp,
                })),
            ))
        }
    }
}

/// Clean up the database, deleting every booking and dish
///
/// Bookings go first so no booking is left pointing at a deleted dish.
#[instrument(name = "cleanup_database", skip(state))]
pub async fn cleanup_database(
    State(state): State<AdminState>,
) -> Result<Json<CleanupResponse>, (StatusCode, Json<Value>)> {
    let timestamp = chrono::Utc::now().to_rfc3339();

    info!("Cleaning up database");

    let mut bookings_deleted = 0;
    let mut dishes_deleted = 0;
    let mut errors = Vec::new();

    match state.booking_service.list_bookings().await {
        Ok(bookings) => {
            for booking in bookings {
                match state.booking_service.cancel_booking(&booking.id).await {
                    Ok(_) => {
                        bookings_deleted += 1;
                        info!("Successfully removed booking: {}", booking.id);
                    }
                    Err(err) => {
                        warn!("Failed to remove booking {}: {}", booking.id, err);
                        errors.push(format!("{}: {}", booking.id, err));
                    }
                }
            }
        }
        Err(err) => {
            error!("Failed to list bookings for cleanup: {}", err);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to cleanup database",
                    "message": err.to_string(),
                    "timestamp": timestamp,
                })),
            ));
        }
    }

    match state.menu_service.list_dishes().await {
        Ok(menu) => {
            for dish in menu.dishes {
                match state.menu_service.remove_dish(&dish.id).await {
                    Ok(()) => {
                        dishes_deleted += 1;
                        info!("Successfully removed dish: {}", dish.name);
                    }
                    Err(err) => {
                        warn!("Failed to remove dish {}: {}", dish.name, err);
                        errors.push(format!("{}: {}", dish.name, err));
                    }
                }
            }
        }
        Err(err) => {
            error!("Failed to list dishes for cleanup: {}", err);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to cleanup database",
                    "message": err.to_string(),
                    "timestamp": timestamp,
                })),
            ));
        }
    }

    let message = if errors.is_empty() {
        format!(
            "Database cleaned up successfully, removed {} dishes and {} bookings",
            dishes_deleted, bookings_deleted
        )
    } else {
        format!(
            "Database cleanup completed with {} errors, removed {} dishes and {} bookings",
            errors.len(),
            dishes_deleted,
            bookings_deleted
        )
    };

    info!("{}", message);

    Ok(Json(CleanupResponse {
        message,
        dishes_deleted,
        bookings_deleted,
        timestamp,
    }))
}

// =============================================================================
// DISH MANAGEMENT ENDPOINTS (ADMIN ONLY)
// =============================================================================

/// Create a new dish (admin only)
#[instrument(name = "create_dish", skip(state, request), fields(
    dish_id = %request.id,
    dish_name = %request.name,
    price = %request.price,
))]
pub async fn create_dish(
    State(state): State<AdminState>,
    Json(request): Json<CreateDishRequest>,
) -> Result<(StatusCode, Json<Dish>), (StatusCode, Json<Value>)> {
    info!("Admin creating new dish: {}", request.name);

    match state.menu_service.add_dish(request).await {
        Ok(dish) => {
            info!("Successfully created dish with ID: {}", dish.id);
            Ok((StatusCode::CREATED, Json(dish)))
        }
        Err(err) => {
            error!("Failed to create dish: {}", err);
            Err(super::api::service_error_to_response(err))
        }
    }
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Create the sample menu used for seeding
fn create_sample_dishes() -> Vec<CreateDishRequest> {
    vec![
        CreateDishRequest {
            id: "1".to_string(),
            name: "Margherita Pizza".to_string(),
            description: "Wood-fired pizza with tomato, mozzarella and fresh basil.".to_string(),
            price: dec!(10.00),
            available_quantity: 20,
        },
        CreateDishRequest {
            id: "2".to_string(),
            name: "Spaghetti Carbonara".to_string(),
            description: "Spaghetti with guanciale, egg yolk and pecorino romano.".to_string(),
            price: dec!(10.00),
            available_quantity: 30,
        },
        CreateDishRequest {
            id: "3".to_string(),
            name: "Caesar Salad".to_string(),
            description: "Romaine lettuce, parmesan and croutons with Caesar dressing."
                .to_string(),
            price: dec!(10.00),
            available_quantity: 40,
        },
        CreateDishRequest {
            id: "4".to_string(),
            name: "Tiramisu".to_string(),
            description: "Espresso-soaked ladyfingers layered with mascarpone cream.".to_string(),
            price: dec!(10.00),
            available_quantity: 10,
        },
    ]
}
