use axum::{middleware, routing::get, Router};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use dinebook_rs::{
    handlers::{
        admin::create_admin_router, api::create_api_router, health_check, metrics_handler,
        request_validation_middleware, security_headers_middleware,
    },
    init_observability,
    observability::{observability_middleware, Metrics},
    repositories::{DynamoDbBookingRepository, DynamoDbDishRepository, TableManager},
    services::{BookingService, MenuService},
    shutdown_observability, Config,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration first (basic logging only)
    let config = Config::from_environment().await?;
    println!("Configuration loaded successfully");

    // Initialize comprehensive observability
    init_observability(
        &config.observability.service_name,
        &config.observability.service_version,
        config.observability.otlp_endpoint.as_deref().unwrap_or(""),
        config.observability.enable_json_logging,
    )?;

    info!("Starting dinebook-rs service");
    info!(
        "Service: {} v{}",
        config.observability.service_name, config.observability.service_version
    );
    info!("Region: {}", config.aws.region);
    info!(
        "DynamoDB Tables: dishes={}, bookings={}",
        config.database.dishes_table_name, config.database.bookings_table_name
    );

    // Initialize metrics
    let metrics = Arc::new(Metrics::new()?);
    info!("Metrics initialized successfully");

    // Use AWS clients from config (already properly configured with region and credentials)
    let dynamodb_client = Arc::new(config.aws.dynamodb_client.clone());
    info!("AWS clients initialized successfully");

    // Initialize table manager
    let table_manager = Arc::new(TableManager::new(
        dynamodb_client.clone(),
        config.database.dishes_table_name.clone(),
        config.database.bookings_table_name.clone(),
    ));
    info!("Table manager initialized successfully");

    // Initialize repositories
    let dish_repository = Arc::new(DynamoDbDishRepository::new(
        dynamodb_client.clone(),
        config.database.dishes_table_name.clone(),
        config.database.region.clone(),
    ));
    let booking_repository = Arc::new(DynamoDbBookingRepository::new(
        dynamodb_client.clone(),
        config.database.bookings_table_name.clone(),
        config.database.dishes_table_name.clone(),
        config.database.region.clone(),
    ));
    info!("Repositories initialized successfully");

    // Initialize services
    let menu_service = Arc::new(MenuService::new(dish_repository.clone()));
    let booking_service = Arc::new(BookingService::new(booking_repository, dish_repository));
    info!("Services initialized successfully");

    // Build the application router
    let app = create_app(metrics, menu_service, booking_service, table_manager);

    // Create socket address
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Server listening on {}", addr);

    // Create TCP listener
    let listener = TcpListener::bind(addr).await?;

    // Set up graceful shutdown
    let shutdown_signal = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
        info!("Shutdown signal received");
        shutdown_observability().await;
    };

    // Start the server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn create_app(
    metrics: Arc<Metrics>,
    menu_service: Arc<MenuService>,
    booking_service: Arc<BookingService>,
    table_manager: Arc<TableManager>,
) -> Router {
    let metrics_for_middleware = metrics.clone();

    Router::new()
        // Health and metrics endpoints (with metrics state)
        .route("/health/status", get(health_check))
        .route("/metrics", get(metrics_handler))
        .with_state(metrics.clone())
        // Menu and booking endpoints
        .merge(create_api_router(
            menu_service.clone(),
            booking_service.clone(),
            metrics,
        ))
        // Admin endpoints
        .merge(create_admin_router(
            menu_service,
            booking_service,
            table_manager,
        ))
        // Add middleware layers (order matters - outer to inner)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(request_validation_middleware))
        .layer(middleware::from_fn(move |req, next| {
            observability_middleware(metrics_for_middleware.clone(), req, next)
        }))
}
