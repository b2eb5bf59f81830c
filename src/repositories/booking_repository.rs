use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, Delete, Put, Select, TransactWriteItem, Update};
use aws_sdk_dynamodb::{Client as DynamoDbClient, Error as DynamoDbError};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn, Instrument};

use crate::models::{Booking, RepositoryError, RepositoryResult};

/// Trait defining the interface for booking data access operations
///
/// Bookings and dish inventory move together: a booking only exists if the
/// portions it reserves were taken out of the dish's available quantity, and
/// cancelling it puts them back. The transactional methods below keep the two
/// tables consistent under concurrent bookings.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Find all bookings
    async fn find_all(&self) -> RepositoryResult<Vec<Booking>>;

    /// Find a booking by its ID
    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Booking>>;

    /// Atomically insert the booking and decrement the dish's available
    /// quantity. Fails with `TransactionFailed` if the dish no longer has
    /// enough portions.
    async fn create_with_reservation(&self, booking: &Booking) -> RepositoryResult<()>;

    /// Atomically delete the booking and restore its portions to the dish.
    /// Fails with `TransactionFailed` if the booking or dish is gone.
    async fn delete_with_restock(&self, booking: &Booking) -> RepositoryResult<()>;

    /// Delete a booking without touching inventory (admin cleanup)
    async fn delete(&self, id: &str) -> RepositoryResult<()>;
}

/// DynamoDB implementation of the BookingRepository trait
pub struct DynamoDbBookingRepository {
    client: Arc<DynamoDbClient>,
    bookings_table: String,
    dishes_table: String,
    region: String,
}

impl DynamoDbBookingRepository {
    /// Create a new DynamoDB booking repository
    pub fn new(
        client: Arc<DynamoDbClient>,
        bookings_table: String,
        dishes_table: String,
        region: String,
    ) -> Self {
        Self {
            client,
            bookings_table,
            dishes_table,
            region,
        }
    }

    /// Create a DynamoDB subsegment span with proper X-Ray attributes
    fn create_dynamodb_span(&self, operation: &str) -> tracing::Span {
        tracing::info_span!(
            "DynamoDB",
            // AWS X-Ray specific attributes
            "aws.service" = "DynamoDB",
            "aws.operation" = operation,
            "aws.region" = %self.region,
            "aws.dynamodb.table_name" = %self.bookings_table,
            "aws.request_id" = tracing::field::Empty,
            "aws.agent" = "rust-aws-sdk",

            // Resource identification for X-Ray
            "aws.remote.service" = "AWS::DynamoDB",
            "aws.remote.operation" = operation,
            "aws.remote.resource.type" = "AWS::DynamoDB::Table",
            "aws.remote.resource.identifier" = %self.bookings_table,

            // OpenTelemetry semantic conventions
            "otel.kind" = "client",
            "otel.name" = format!("DynamoDB.{}", operation),

            // RPC semantic conventions for AWS API calls
            "rpc.system" = "aws-api",
            "rpc.service" = "AmazonDynamoDBv2",
            "rpc.method" = operation,

            // Database semantic conventions
            "db.system" = "dynamodb",
            "db.name" = %self.bookings_table,
            "db.operation" = operation,

            "component" = "aws-sdk-dynamodb",
        )
    }

    /// Get the bookings table name (for testing)
    pub fn bookings_table(&self) -> &str {
        &self.bookings_table
    }

    /// Get the dishes table name (for testing)
    pub fn dishes_table(&self) -> &str {
        &self.dishes_table
    }

    /// Convert a Booking struct to DynamoDB attribute values
    pub fn booking_to_item(&self, booking: &Booking) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();

        item.insert("id".to_string(), AttributeValue::S(booking.id.clone()));
        item.insert(
            "dish_id".to_string(),
            AttributeValue::S(booking.dish_id.clone()),
        );
        item.insert(
            "booked_quantity".to_string(),
            AttributeValue::N(booking.booked_quantity.to_string()),
        );

        item
    }

    /// Convert DynamoDB item to Booking struct
    pub fn item_to_booking(
        &self,
        item: HashMap<String, AttributeValue>,
    ) -> RepositoryResult<Booking> {
        let id = item
            .get("id")
            .and_then(|v| v.as_s().ok())
            .ok_or_else(|| RepositoryError::InvalidQuery {
                message: "Missing id".to_string(),
            })?
            .clone();

        let dish_id = item
            .get("dish_id")
            .and_then(|v| v.as_s().ok())
            .ok_or_else(|| RepositoryError::InvalidQuery {
                message: "Missing dish_id".to_string(),
            })?
            .clone();

        let booked_quantity = item
            .get("booked_quantity")
            .and_then(|v| v.as_n().ok())
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| RepositoryError::InvalidQuery {
                message: "Invalid booked_quantity".to_string(),
            })?;

        Ok(Booking {
            id,
            dish_id,
            booked_quantity,
        })
    }

    /// Convert DynamoDB error to RepositoryError
    fn map_dynamodb_error(&self, error: DynamoDbError) -> RepositoryError {
        error!("DynamoDB error: {:?}", error);

        if let DynamoDbError::TransactionCanceledException(cancelled) = &error {
            return RepositoryError::TransactionFailed {
                message: cancelled
                    .message()
                    .unwrap_or("transaction cancelled")
                    .to_string(),
            };
        }

        if let DynamoDbError::ResourceNotFoundException(_) = &error {
            return RepositoryError::TableNotFound {
                table_name: self.bookings_table.clone(),
            };
        }

        RepositoryError::AwsSdk {
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl BookingRepository for DynamoDbBookingRepository {
    #[instrument(skip(self), fields(table = %self.bookings_table))]
    async fn find_all(&self) -> RepositoryResult<Vec<Booking>> {
        info!("Scanning all bookings");

        let scan_span = self.create_dynamodb_span("Scan");

        let response = async {
            self.client
                .scan()
                .table_name(&self.bookings_table)
                .select(Select::AllAttributes)
                .send()
                .await
                .map_err(|e| self.map_dynamodb_error(e.into()))
        }
        .instrument(scan_span)
        .await?;

        let mut bookings = Vec::new();
        if let Some(items) = response.items {
            for item in items {
                match self.item_to_booking(item) {
                    Ok(booking) => bookings.push(booking),
                    Err(e) => {
                        warn!("Failed to parse booking item: {}", e);
                        continue;
                    }
                }
            }
        }

        info!("Found {} bookings", bookings.len());
        Ok(bookings)
    }

    #[instrument(skip(self), fields(table = %self.bookings_table, id = %id))]
    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Booking>> {
        info!("Finding booking by ID");

        let get_span = self.create_dynamodb_span("GetItem");

        let response = async {
            self.client
                .get_item()
                .table_name(&self.bookings_table)
                .key("id", AttributeValue::S(id.to_string()))
                .send()
                .await
                .map_err(|e| self.map_dynamodb_error(e.into()))
        }
        .instrument(get_span)
        .await?;

        match response.item {
            Some(item) => {
                let booking = self.item_to_booking(item)?;
                info!("Booking found");
                Ok(Some(booking))
            }
            None => {
                info!("Booking not found");
                Ok(None)
            }
        }
    }

    #[instrument(
        skip(self, booking),
        fields(booking_id = %booking.id, dish_id = %booking.dish_id, quantity = booking.booked_quantity)
    )]
    async fn create_with_reservation(&self, booking: &Booking) -> RepositoryResult<()> {
        info!("Creating booking with inventory reservation");

        let put_booking = Put::builder()
            .table_name(&self.bookings_table)
            .set_item(Some(self.booking_to_item(booking)))
            .condition_expression("attribute_not_exists(id)")
            .build()
            .map_err(|e| RepositoryError::InvalidQuery {
                message: e.to_string(),
            })?;

        // The condition is the arbiter under concurrency: the decrement only
        // commits if the dish still holds enough portions.
        let decrement_dish = Update::builder()
            .table_name(&self.dishes_table)
            .key("id", AttributeValue::S(booking.dish_id.clone()))
            .update_expression("SET available_quantity = available_quantity - :qty")
            .condition_expression("attribute_exists(id) AND available_quantity >= :qty")
            .expression_attribute_values(
                ":qty",
                AttributeValue::N(booking.booked_quantity.to_string()),
            )
            .build()
            .map_err(|e| RepositoryError::InvalidQuery {
                message: e.to_string(),
            })?;

        let transact_span = self.create_dynamodb_span("TransactWriteItems");

        async {
            self.client
                .transact_write_items()
                .transact_items(TransactWriteItem::builder().put(put_booking).build())
                .transact_items(TransactWriteItem::builder().update(decrement_dish).build())
                .send()
                .await
                .map_err(|e| self.map_dynamodb_error(e.into()))
        }
        .instrument(transact_span)
        .await?;

        info!("Booking created and inventory reserved");
        Ok(())
    }

    #[instrument(
        skip(self, booking),
        fields(booking_id = %booking.id, dish_id = %booking.dish_id, quantity = booking.booked_quantity)
    )]
    async fn delete_with_restock(&self, booking: &Booking) -> RepositoryResult<()> {
        info!("Cancelling booking and restoring inventory");

        let delete_booking = Delete::builder()
            .table_name(&self.bookings_table)
            .key("id", AttributeValue::S(booking.id.clone()))
            .condition_expression("attribute_exists(id)")
            .build()
            .map_err(|e| RepositoryError::InvalidQuery {
                message: e.to_string(),
            })?;

        let restock_dish = Update::builder()
            .table_name(&self.dishes_table)
            .key("id", AttributeValue::S(booking.dish_id.clone()))
            .update_expression("SET available_quantity = available_quantity + :qty")
            .condition_expression("attribute_exists(id)")
            .expression_attribute_values(
                ":qty",
                AttributeValue::N(booking.booked_quantity.to_string()),
            )
            .build()
            .map_err(|e| RepositoryError::InvalidQuery {
                message: e.to_string(),
            })?;

        let transact_span = self.create_dynamodb_span("TransactWriteItems");

        async {
            self.client
                .transact_write_items()
                .transact_items(TransactWriteItem::builder().delete(delete_booking).build())
                .transact_items(TransactWriteItem::builder().update(restock_dish).build())
                .send()
                .await
                .map_err(|e| self.map_dynamodb_error(e.into()))
        }
        .instrument(transact_span)
        .await?;

        info!("Booking cancelled and inventory restored");
        Ok(())
    }

    #[instrument(skip(self), fields(table = %self.bookings_table, id = %id))]
    async fn delete(&self, id: &str) -> RepositoryResult<()> {
        info!("Deleting booking");

        let delete_span = self.create_dynamodb_span("DeleteItem");

        async {
            self.client
                .delete_item()
                .table_name(&self.bookings_table)
                .key("id", AttributeValue::S(id.to_string()))
                .send()
                .await
                .map_err(|e| self.map_dynamodb_error(e.into()))?;

            info!("Booking deleted successfully");
            Ok(())
        }
        .instrument(delete_span)
        .await
    }
}
