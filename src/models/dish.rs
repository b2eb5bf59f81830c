use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Core menu dish model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dish {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub available_quantity: u32,
}

/// Request model for adding a dish to the menu
///
/// Dish ids are curated by the restaurant, so the caller supplies them
/// instead of the server generating one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDishRequest {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub available_quantity: u32,
}

/// Response model for menu listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuResponse {
    pub dishes: Vec<Dish>,
    pub total_count: usize,
}

/// Response model for the booking form: only dishes open for booking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingFormResponse {
    pub dishes: Vec<Dish>,
}

impl Dish {
    pub fn new(request: CreateDishRequest) -> Self {
        Self {
            id: request.id,
            name: request.name,
            description: request.description,
            price: request.price,
            available_quantity: request.available_quantity,
        }
    }

    /// Check whether the dish can satisfy a booking of `quantity` portions
    pub fn can_book(&self, quantity: u32) -> bool {
        quantity > 0 && quantity <= self.available_quantity
    }

    /// Check whether the dish should appear on the booking form
    pub fn is_bookable(&self) -> bool {
        self.available_quantity > 0
    }
}
