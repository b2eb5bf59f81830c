pub mod booking_service;
pub mod menu_service;

pub use booking_service::BookingService;
pub use menu_service::MenuService;
