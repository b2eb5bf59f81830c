use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::models::{
    Booking, BookingConfirmation, CancellationConfirmation, CreateBookingRequest, RepositoryError,
    ServiceError, ServiceResult,
};
use crate::repositories::{BookingRepository, DishRepository};

/// Service for booking business logic
pub struct BookingService {
    bookings: Arc<dyn BookingRepository>,
    dishes: Arc<dyn DishRepository>,
}

impl BookingService {
    pub fn new(bookings: Arc<dyn BookingRepository>, dishes: Arc<dyn DishRepository>) -> Self {
        Self { bookings, dishes }
    }

    /// Place a booking, reserving portions from the dish's inventory
    #[instrument(skip(self, request), fields(dish_id = %request.dish_id, quantity = request.quantity))]
    pub async fn create_booking(
        &self,
        request: CreateBookingRequest,
    ) -> ServiceResult<BookingConfirmation> {
        info!("Creating booking");

        let dish = match self.dishes.find_by_id(&request.dish_id).await? {
            Some(dish) => dish,
            None => {
                warn!("Dish not found");
                return Err(ServiceError::DishNotFound {
                    id: request.dish_id,
                });
            }
        };

        if !dish.can_book(request.quantity) {
            warn!(
                "Quantity {} rejected, {} portions available",
                request.quantity, dish.available_quantity
            );
            return Err(ServiceError::InvalidQuantity {
                requested: request.quantity,
                available: dish.available_quantity,
            });
        }

        let booking = Booking::new(dish.id.clone(), request.quantity);

        // A concurrent booking may have drained the dish between the check
        // above and the write. The transaction condition decides the winner.
        match self.bookings.create_with_reservation(&booking).await {
            Ok(()) => {}
            Err(RepositoryError::TransactionFailed { message }) => {
                warn!("Reservation transaction cancelled: {}", message);
                return Err(ServiceError::InvalidQuantity {
                    requested: request.quantity,
                    available: dish.available_quantity,
                });
            }
            Err(e) => return Err(e.into()),
        }

        info!(booking_id = %booking.id, "Booking created");
        Ok(BookingConfirmation {
            message: "Booking successful!".to_string(),
            booking,
        })
    }

    /// Cancel a booking, restoring its portions to the dish's inventory
    #[instrument(skip(self), fields(booking_id = %booking_id))]
    pub async fn cancel_booking(
        &self,
        booking_id: &str,
    ) -> ServiceResult<CancellationConfirmation> {
        info!("Cancelling booking");

        let booking = match self.bookings.find_by_id(booking_id).await? {
            Some(booking) => booking,
            None => {
                warn!("Booking not found");
                return Err(ServiceError::BookingNotFound {
                    id: booking_id.to_string(),
                });
            }
        };

        // The portions have nowhere to go if the dish was removed from
        // the menu, so the cancellation is refused rather than losing them.
        if self.dishes.find_by_id(&booking.dish_id).await?.is_none() {
            warn!(dish_id = %booking.dish_id, "Booked dish no longer on the menu");
            return Err(ServiceError::DishNotFound {
                id: booking.dish_id,
            });
        }

        self.bookings.delete_with_restock(&booking).await?;

        info!("Booking cancelled");
        Ok(CancellationConfirmation {
            message: "Booking cancellation successful!".to_string(),
            booking_id: booking.id,
        })
    }

    /// List all bookings
    #[instrument(skip(self))]
    pub async fn list_bookings(&self) -> ServiceResult<Vec<Booking>> {
        let bookings = self.bookings.find_all().await?;
        info!("Found {} bookings", bookings.len());
        Ok(bookings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Dish, RepositoryResult};
    use async_trait::async_trait;
    use mockall::mock;
    use mockall::predicate::*;
    use rust_decimal_macros::dec;

    mock! {
        DishRepo {}

        #[async_trait]
        impl DishRepository for DishRepo {
            async fn find_all(&self) -> RepositoryResult<Vec<Dish>>;
            async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Dish>>;
            async fn create(&self, dish: Dish) -> RepositoryResult<Dish>;
            async fn delete(&self, id: &str) -> RepositoryResult<()>;
            async fn exists(&self, id: &str) -> RepositoryResult<bool>;
        }
    }

    mock! {
        BookingRepo {}

        #[async_trait]
        impl BookingRepository for BookingRepo {
            async fn find_all(&self) -> RepositoryResult<Vec<Booking>>;
            async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Booking>>;
            async fn create_with_reservation(&self, booking: &Booking) -> RepositoryResult<()>;
            async fn delete_with_restock(&self, booking: &Booking) -> RepositoryResult<()>;
            async fn delete(&self, id: &str) -> RepositoryResult<()>;
        }
    }

    fn test_dish(id: &str, quantity: u32) -> Dish {
        Dish {
            id: id.to_string(),
            name: format!("Dish {}", id),
            description: "A test dish".to_string(),
            price: dec!(10.00),
            available_quantity: quantity,
        }
    }

    #[tokio::test]
    async fn test_create_booking_success() {
        let mut mock_dishes = MockDishRepo::new();
        mock_dishes
            .expect_find_by_id()
            .with(eq("1"))
            .times(1)
            .returning(|_| Ok(Some(test_dish("1", 20))));

        let mut mock_bookings = MockBookingRepo::new();
        mock_bookings
            .expect_create_with_reservation()
            .times(1)
            .returning(|_| Ok(()));

        let service = BookingService::new(Arc::new(mock_bookings), Arc::new(mock_dishes));
        let confirmation = service
            .create_booking(CreateBookingRequest {
                dish_id: "1".to_string(),
                quantity: 12,
            })
            .await
            .unwrap();

        assert_eq!(confirmation.message, "Booking successful!");
        assert_eq!(confirmation.booking.dish_id, "1");
        assert_eq!(confirmation.booking.booked_quantity, 12);
    }

    #[tokio::test]
    async fn test_create_booking_unknown_dish() {
        let mut mock_dishes = MockDishRepo::new();
        mock_dishes
            .expect_find_by_id()
            .with(eq("5"))
            .times(1)
            .returning(|_| Ok(None));

        let mock_bookings = MockBookingRepo::new();

        let service = BookingService::new(Arc::new(mock_bookings), Arc::new(mock_dishes));
        let result = service
            .create_booking(CreateBookingRequest {
                dish_id: "5".to_string(),
                quantity: 2,
            })
            .await;

        assert!(matches!(result, Err(ServiceError::DishNotFound { .. })));
    }

    #[tokio::test]
    async fn test_create_booking_quantity_exceeds_stock() {
        let mut mock_dishes = MockDishRepo::new();
        mock_dishes
            .expect_find_by_id()
            .with(eq("1"))
            .times(1)
            .returning(|_| Ok(Some(test_dish("1", 20))));

        let mock_bookings = MockBookingRepo::new();

        let service = BookingService::new(Arc::new(mock_bookings), Arc::new(mock_dishes));
        let result = service
            .create_booking(CreateBookingRequest {
                dish_id: "1".to_string(),
                quantity: 22,
            })
            .await;

        match result {
            Err(ServiceError::InvalidQuantity {
                requested,
                available,
            }) => {
                assert_eq!(requested, 22);
                assert_eq!(available, 20);
            }
            other => panic!("Expected InvalidQuantity, got {:?}", other.map(|c| c.message)),
        }
    }

    #[tokio::test]
    async fn test_create_booking_zero_quantity() {
        let mut mock_dishes = MockDishRepo::new();
        mock_dishes
            .expect_find_by_id()
            .with(eq("1"))
            .times(1)
            .returning(|_| Ok(Some(test_dish("1", 20))));

        let mock_bookings = MockBookingRepo::new();

        let service = BookingService::new(Arc::new(mock_bookings), Arc::new(mock_dishes));
        let result = service
            .create_booking(CreateBookingRequest {
                dish_id: "1".to_string(),
                quantity: 0,
            })
            .await;

        assert!(matches!(
            result,
            Err(ServiceError::InvalidQuantity { .. })
        ));
    }

    #[tokio::test]
    async fn test_create_booking_large_quantity_within_stock() {
        let mut mock_dishes = MockDishRepo::new();
        mock_dishes
            .expect_find_by_id()
            .with(eq("1"))
            .times(1)
            .returning(|_| Ok(Some(test_dish("1", 2000))));

        let mut mock_bookings = MockBookingRepo::new();
        mock_bookings
            .expect_create_with_reservation()
            .times(1)
            .returning(|_| Ok(()));

        let service = BookingService::new(Arc::new(mock_bookings), Arc::new(mock_dishes));
        let confirmation = service
            .create_booking(CreateBookingRequest {
                dish_id: "1".to_string(),
                quantity: 1500,
            })
            .await
            .unwrap();

        assert_eq!(confirmation.booking.booked_quantity, 1500);
    }

    #[tokio::test]
    async fn test_create_booking_unknown_dish_reported_before_quantity() {
        let mut mock_dishes = MockDishRepo::new();
        mock_dishes
            .expect_find_by_id()
            .with(eq("5"))
            .times(1)
            .returning(|_| Ok(None));

        let mock_bookings = MockBookingRepo::new();

        let service = BookingService::new(Arc::new(mock_bookings), Arc::new(mock_dishes));
        let result = service
            .create_booking(CreateBookingRequest {
                dish_id: "5".to_string(),
                quantity: 0,
            })
            .await;

        assert!(matches!(result, Err(ServiceError::DishNotFound { .. })));
    }

    #[tokio::test]
    async fn test_create_booking_lost_race() {
        let mut mock_dishes = MockDishRepo::new();
        mock_dishes
            .expect_find_by_id()
            .with(eq("1"))
            .times(1)
            .returning(|_| Ok(Some(test_dish("1", 5))));

        let mut mock_bookings = MockBookingRepo::new();
        mock_bookings
            .expect_create_with_reservation()
            .times(1)
            .returning(|_| {
                Err(RepositoryError::TransactionFailed {
                    message: "ConditionalCheckFailed".to_string(),
                })
            });

        let service = BookingService::new(Arc::new(mock_bookings), Arc::new(mock_dishes));
        let result = service
            .create_booking(CreateBookingRequest {
                dish_id: "1".to_string(),
                quantity: 5,
            })
            .await;

        assert!(matches!(
            result,
            Err(ServiceError::InvalidQuantity { .. })
        ));
    }

    #[tokio::test]
    async fn test_cancel_booking_success() {
        let booking = Booking::new("2".to_string(), 3);
        let booking_id = booking.id.clone();

        let mut mock_bookings = MockBookingRepo::new();
        {
            let booking = booking.clone();
            mock_bookings
                .expect_find_by_id()
                .with(eq(booking_id.clone()))
                .times(1)
                .returning(move |_| Ok(Some(booking.clone())));
        }
        mock_bookings
            .expect_delete_with_restock()
            .times(1)
            .returning(|_| Ok(()));

        let mut mock_dishes = MockDishRepo::new();
        mock_dishes
            .expect_find_by_id()
            .with(eq("2"))
            .times(1)
            .returning(|_| Ok(Some(test_dish("2", 30))));

        let service = BookingService::new(Arc::new(mock_bookings), Arc::new(mock_dishes));
        let confirmation = service.cancel_booking(&booking_id).await.unwrap();

        assert_eq!(confirmation.message, "Booking cancellation successful!");
        assert_eq!(confirmation.booking_id, booking_id);
    }

    #[tokio::test]
    async fn test_cancel_unknown_booking() {
        let mut mock_bookings = MockBookingRepo::new();
        mock_bookings
            .expect_find_by_id()
            .with(eq("B00000000"))
            .times(1)
            .returning(|_| Ok(None));

        let mock_dishes = MockDishRepo::new();

        let service = BookingService::new(Arc::new(mock_bookings), Arc::new(mock_dishes));
        let result = service.cancel_booking("B00000000").await;

        assert!(matches!(
            result,
            Err(ServiceError::BookingNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_cancel_booking_dish_removed() {
        let booking = Booking::new("7".to_string(), 2);
        let booking_id = booking.id.clone();

        let mut mock_bookings = MockBookingRepo::new();
        {
            let booking = booking.clone();
            mock_bookings
                .expect_find_by_id()
                .times(1)
                .returning(move |_| Ok(Some(booking.clone())));
        }

        let mut mock_dishes = MockDishRepo::new();
        mock_dishes
            .expect_find_by_id()
            .with(eq("7"))
            .times(1)
            .returning(|_| Ok(None));

        let service = BookingService::new(Arc::new(mock_bookings), Arc::new(mock_dishes));
        let result = service.cancel_booking(&booking_id).await;

        assert!(matches!(result, Err(ServiceError::DishNotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_bookings() {
        let mut mock_bookings = MockBookingRepo::new();
        mock_bookings
            .expect_find_all()
            .times(1)
            .returning(|| Ok(vec![Booking::new("1".to_string(), 2)]));

        let mock_dishes = MockDishRepo::new();

        let service = BookingService::new(Arc::new(mock_bookings), Arc::new(mock_dishes));
        let bookings = service.list_bookings().await.unwrap();

        assert_eq!(bookings.len(), 1);
    }
}
