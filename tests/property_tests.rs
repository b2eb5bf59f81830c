mod common;

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;

use common::in_memory_repositories;
use dinebook_rs::models::{validation, Booking, CreateBookingRequest, CreateDishRequest, Dish};
use dinebook_rs::repositories::DishRepository;
use dinebook_rs::services::BookingService;

prop_compose! {
    fn arb_dish_request()(
        id in "[0-9]{1,4}",
        name in "[A-Za-z][A-Za-z ]{0,40}",
        description in "[A-Za-z][A-Za-z ]{0,80}",
        cents in 1i64..1_000_000,
        available_quantity in 0u32..200,
    ) -> CreateDishRequest {
        CreateDishRequest {
            id,
            name,
            description,
            price: Decimal::new(cents, 2),
            available_quantity,
        }
    }
}

proptest! {
    #[test]
    fn dish_serde_round_trip(request in arb_dish_request()) {
        let dish = Dish::new(request);
        let json = serde_json::to_string(&dish).unwrap();
        let decoded: Dish = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(dish, decoded);
    }

    #[test]
    fn can_book_respects_inventory(request in arb_dish_request(), quantity in 0u32..300) {
        let dish = Dish::new(request);
        let allowed = dish.can_book(quantity);
        prop_assert_eq!(allowed, quantity > 0 && quantity <= dish.available_quantity);
    }

    #[test]
    fn valid_prices_pass_validation(cents in 1i64..1_000_000) {
        let price = Decimal::new(cents, 2);
        prop_assert!(validation::validate_dish_price(&price).is_ok());
    }

    #[test]
    fn booking_ids_have_fixed_shape(dish_id in "[0-9]{1,4}", quantity in 1u32..100) {
        let booking = Booking::new(dish_id.clone(), quantity);
        prop_assert!(booking.id.starts_with('B'));
        prop_assert_eq!(booking.id.len(), 9);
        prop_assert_eq!(booking.dish_id, dish_id);
        prop_assert_eq!(booking.booked_quantity, quantity);
    }
}

/// A single step of the booking lifecycle used by the conservation check
#[derive(Debug, Clone)]
enum Step {
    Book { dish_index: usize, quantity: u32 },
    Cancel { booking_index: usize },
}

fn arb_steps() -> impl Strategy<Value = Vec<Step>> {
    prop::collection::vec(
        prop_oneof![
            (0usize..4, 1u32..30).prop_map(|(dish_index, quantity)| Step::Book {
                dish_index,
                quantity
            }),
            (0usize..50).prop_map(|booking_index| Step::Cancel { booking_index }),
        ],
        0..50,
    )
}

proptest! {
    /// Portions are conserved through the real service: for every dish,
    /// booked plus available always equals the starting inventory, no matter
    /// how bookings and cancellations interleave.
    #[test]
    fn inventory_is_conserved(steps in arb_steps()) {
        let initial = [20u32, 30, 40, 10];

        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("Failed to build runtime");

        let per_dish = runtime.block_on(async {
            let (dish_repository, booking_repository) = in_memory_repositories();

            for (dish_index, quantity) in initial.iter().enumerate() {
                dish_repository
                    .create(Dish::new(CreateDishRequest {
                        id: dish_index.to_string(),
                        name: format!("Dish {}", dish_index),
                        description: "Portion accounting check".to_string(),
                        price: Decimal::new(1000, 2),
                        available_quantity: *quantity,
                    }))
                    .await
                    .expect("Failed to seed dish");
            }

            let service = BookingService::new(booking_repository, dish_repository.clone());
            let mut booking_ids: Vec<String> = Vec::new();

            for step in steps {
                match step {
                    Step::Book {
                        dish_index,
                        quantity,
                    } => {
                        // Rejected bookings must leave the store untouched
                        if let Ok(confirmation) = service
                            .create_booking(CreateBookingRequest {
                                dish_id: dish_index.to_string(),
                                quantity,
                            })
                            .await
                        {
                            booking_ids.push(confirmation.booking.id);
                        }
                    }
                    Step::Cancel { booking_index } => {
                        if booking_index < booking_ids.len() {
                            let booking_id = booking_ids.swap_remove(booking_index);
                            service
                                .cancel_booking(&booking_id)
                                .await
                                .expect("Failed to cancel a live booking");
                        }
                    }
                }
            }

            let mut booked_per_dish: HashMap<String, u32> = HashMap::new();
            for booking in service.list_bookings().await.expect("Failed to list bookings") {
                *booked_per_dish.entry(booking.dish_id).or_insert(0) += booking.booked_quantity;
            }

            let mut per_dish = Vec::new();
            for (dish_index, start) in initial.iter().enumerate() {
                let dish = dish_repository
                    .find_by_id(&dish_index.to_string())
                    .await
                    .expect("Failed to look up dish")
                    .expect("Seeded dish disappeared");
                let booked = booked_per_dish.get(&dish.id).copied().unwrap_or(0);
                per_dish.push((dish.available_quantity, booked, *start));
            }
            per_dish
        });

        for (available, booked, start) in per_dish {
            prop_assert_eq!(available + booked, start);
        }
    }
}
