use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{routing::get, Router};
use reqwest::Client;
use tokio::net::TcpListener;

use dinebook_rs::handlers::{
    admin::create_admin_router, api::create_api_router, health_check, metrics_handler,
};
use dinebook_rs::models::{Booking, Dish, RepositoryError, RepositoryResult};
use dinebook_rs::observability::Metrics;
use dinebook_rs::repositories::{BookingRepository, DishRepository, TableManager};
use dinebook_rs::services::{BookingService, MenuService};

/// Shared in-memory store backing both repositories, so the transactional
/// booking operations see a single consistent view of dishes and bookings.
#[derive(Default)]
struct InMemoryStore {
    dishes: HashMap<String, Dish>,
    bookings: HashMap<String, Booking>,
}

pub struct InMemoryDishRepository {
    store: Arc<Mutex<InMemoryStore>>,
}

pub struct InMemoryBookingRepository {
    store: Arc<Mutex<InMemoryStore>>,
}

/// Build a dish/booking repository pair over one shared store
pub fn in_memory_repositories() -> (Arc<InMemoryDishRepository>, Arc<InMemoryBookingRepository>) {
    let store = Arc::new(Mutex::new(InMemoryStore::default()));
    (
        Arc::new(InMemoryDishRepository {
            store: store.clone(),
        }),
        Arc::new(InMemoryBookingRepository { store }),
    )
}

#[async_trait]
impl DishRepository for InMemoryDishRepository {
    async fn find_all(&self) -> RepositoryResult<Vec<Dish>> {
        let store = self.store.lock().unwrap();
        let mut dishes: Vec<Dish> = store.dishes.values().cloned().collect();
        dishes.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(dishes)
    }

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Dish>> {
        let store = self.store.lock().unwrap();
        Ok(store.dishes.get(id).cloned())
    }

    async fn create(&self, dish: Dish) -> RepositoryResult<Dish> {
        let mut store = self.store.lock().unwrap();
        if store.dishes.contains_key(&dish.id) {
            return Err(RepositoryError::ConstraintViolation {
                message: format!("Dish {} already exists", dish.id),
            });
        }
        store.dishes.insert(dish.id.clone(), dish.clone());
        Ok(dish)
    }

    async fn delete(&self, id: &str) -> RepositoryResult<()> {
        let mut store = self.store.lock().unwrap();
        store.dishes.remove(id);
        Ok(())
    }

    async fn exists(&self, id: &str) -> RepositoryResult<bool> {
        let store = self.store.lock().unwrap();
        Ok(store.dishes.contains_key(id))
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn find_all(&self) -> RepositoryResult<Vec<Booking>> {
        let store = self.store.lock().unwrap();
        Ok(store.bookings.values().cloned().collect())
    }

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Booking>> {
        let store = self.store.lock().unwrap();
        Ok(store.bookings.get(id).cloned())
    }

    async fn create_with_reservation(&self, booking: &Booking) -> RepositoryResult<()> {
        let mut store = self.store.lock().unwrap();

        if store.bookings.contains_key(&booking.id) {
            return Err(RepositoryError::TransactionFailed {
                message: "Booking id collision".to_string(),
            });
        }

        let dish = store.dishes.get_mut(&booking.dish_id).ok_or_else(|| {
            RepositoryError::TransactionFailed {
                message: "Dish does not exist".to_string(),
            }
        })?;

        if dish.available_quantity < booking.booked_quantity {
            return Err(RepositoryError::TransactionFailed {
                message: "Insufficient available quantity".to_string(),
            });
        }

        dish.available_quantity -= booking.booked_quantity;
        store.bookings.insert(booking.id.clone(), booking.clone());
        Ok(())
    }

    async fn delete_with_restock(&self, booking: &Booking) -> RepositoryResult<()> {
        let mut store = self.store.lock().unwrap();

        if !store.bookings.contains_key(&booking.id) {
            return Err(RepositoryError::TransactionFailed {
                message: "Booking does not exist".to_string(),
            });
        }

        let dish = store.dishes.get_mut(&booking.dish_id).ok_or_else(|| {
            RepositoryError::TransactionFailed {
                message: "Dish does not exist".to_string(),
            }
        })?;

        dish.available_quantity += booking.booked_quantity;
        store.bookings.remove(&booking.id);
        Ok(())
    }

    async fn delete(&self, id: &str) -> RepositoryResult<()> {
        let mut store = self.store.lock().unwrap();
        store.bookings.remove(id);
        Ok(())
    }
}

pub struct TestEnvironment {
    pub client: Client,
    pub base_url: String,
}

fn create_test_app() -> Router {
    let (dish_repository, booking_repository) = in_memory_repositories();

    let menu_service = Arc::new(MenuService::new(dish_repository.clone()));
    let booking_service = Arc::new(BookingService::new(booking_repository, dish_repository));

    let metrics = Arc::new(Metrics::new().expect("Failed to create metrics"));

    // The table manager is only exercised by the setup-tables endpoint, which
    // these tests never call. A client with no credentials is sufficient.
    let dynamodb_config = aws_sdk_dynamodb::Config::builder()
        .region(aws_sdk_dynamodb::config::Region::new("us-east-1"))
        .behavior_version(aws_sdk_dynamodb::config::BehaviorVersion::latest())
        .build();
    let table_manager = Arc::new(TableManager::new(
        Arc::new(aws_sdk_dynamodb::Client::from_conf(dynamodb_config)),
        "Dishes".to_string(),
        "Bookings".to_string(),
    ));

    Router::new()
        .route("/health/status", get(health_check))
        .route("/metrics", get(metrics_handler))
        .with_state(metrics.clone())
        .merge(create_api_router(
            menu_service.clone(),
            booking_service.clone(),
            metrics,
        ))
        .merge(create_admin_router(
            menu_service,
            booking_service,
            table_manager,
        ))
}

impl TestEnvironment {
    pub async fn new() -> Self {
        let app = create_test_app();

        // Start server
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind listener");
        let addr = listener.local_addr().expect("Failed to get local address");
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Failed to serve app");
        });

        // Wait for server to start
        tokio::time::sleep(Duration::from_millis(100)).await;

        let client = Client::new();

        Self { client, base_url }
    }

    /// Create a dish through the admin API
    pub async fn create_dish(&self, id: &str, name: &str, quantity: u32) {
        let response = self
            .client
            .post(format!("{}/api/admin/dishes", self.base_url))
            .json(&serde_json::json!({
                "id": id,
                "name": name,
                "description": format!("{} from the test kitchen", name),
                "price": "10.00",
                "available_quantity": quantity,
            }))
            .send()
            .await
            .expect("Failed to create dish");

        assert_eq!(response.status().as_u16(), 201);
    }
}
