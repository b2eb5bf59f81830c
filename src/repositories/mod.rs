pub mod booking_repository;
pub mod dish_repository;
pub mod table_manager;

pub use booking_repository::{BookingRepository, DynamoDbBookingRepository};
pub use dish_repository::{DishRepository, DynamoDbDishRepository};
pub use table_manager::TableManager;
