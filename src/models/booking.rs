use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Core booking model: a reservation of `booked_quantity` portions of a dish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub dish_id: String,
    pub booked_quantity: u32,
}

/// Request model for placing a booking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub dish_id: String,
    pub quantity: u32,
}

/// Request model for cancelling a booking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelBookingRequest {
    pub booking_id: String,
}

/// Response returned after a successful booking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfirmation {
    pub message: String,
    pub booking: Booking,
}

/// Response returned after a successful cancellation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationConfirmation {
    pub message: String,
    pub booking_id: String,
}

impl Booking {
    /// Create a new Booking with a generated ID
    pub fn new(dish_id: String, quantity: u32) -> Self {
        Self {
            id: format!(
                "B{}",
                Uuid::new_v4()
                    .simple()
                    .to_string()
                    .get(0..8)
                    .unwrap_or("00000000")
            ),
            dish_id,
            booked_quantity: quantity,
        }
    }
}
