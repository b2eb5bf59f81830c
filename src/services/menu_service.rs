use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::models::{
    validation, BookingFormResponse, CreateDishRequest, Dish, MenuResponse, ServiceError,
    ServiceResult,
};
use crate::repositories::DishRepository;

/// Service for menu management business logic
pub struct MenuService {
    repository: Arc<dyn DishRepository>,
}

impl MenuService {
    pub fn new(repository: Arc<dyn DishRepository>) -> Self {
        Self { repository }
    }

    /// List every dish on the menu, including sold-out ones
    #[instrument(skip(self))]
    pub async fn list_dishes(&self) -> ServiceResult<MenuResponse> {
        info!("Listing menu dishes");

        let dishes = self.repository.find_all().await?;
        let total_count = dishes.len();

        info!("Menu contains {} dishes", total_count);
        Ok(MenuResponse {
            dishes,
            total_count,
        })
    }

    /// List only dishes that still have portions available for booking
    #[instrument(skip(self))]
    pub async fn booking_form(&self) -> ServiceResult<BookingFormResponse> {
        let dishes = self
            .repository
            .find_all()
            .await?
            .into_iter()
            .filter(Dish::is_bookable)
            .collect::<Vec<_>>();

        info!("{} dishes open for booking", dishes.len());
        Ok(BookingFormResponse { dishes })
    }

    /// Get a single dish by ID
    #[instrument(skip(self), fields(dish_id = %id))]
    pub async fn get_dish(&self, id: &str) -> ServiceResult<Dish> {
        match self.repository.find_by_id(id).await? {
            Some(dish) => Ok(dish),
            None => {
                warn!("Dish not found");
                Err(ServiceError::DishNotFound { id: id.to_string() })
            }
        }
    }

    /// Add a new dish to the menu
    #[instrument(skip(self, request), fields(dish_id = %request.id))]
    pub async fn add_dish(&self, request: CreateDishRequest) -> ServiceResult<Dish> {
        validation::validate_dish_name(&request.name)?;
        validation::validate_dish_description(&request.description)?;
        validation::validate_dish_price(&request.price)?;

        if self.repository.exists(&request.id).await? {
            warn!("Dish already exists");
            return Err(ServiceError::DishAlreadyExists { id: request.id });
        }

        let dish = Dish::new(request);
        let created = self.repository.create(dish).await?;

        info!("Dish added to menu");
        Ok(created)
    }

    /// Remove a dish from the menu
    #[instrument(skip(self), fields(dish_id = %id))]
    pub async fn remove_dish(&self, id: &str) -> ServiceResult<()> {
        if self.repository.find_by_id(id).await?.is_none() {
            return Err(ServiceError::DishNotFound { id: id.to_string() });
        }

        self.repository.delete(id).await?;
        info!("Dish removed from menu");
        Ok(())
    }
}
