use async_trait::async_trait;
use aws_sdk_dynamodb::operation::RequestId;
use aws_sdk_dynamodb::types::{AttributeValue, Select};
use aws_sdk_dynamodb::{Client as DynamoDbClient, Error as DynamoDbError};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn, Instrument};

use crate::models::{Dish, RepositoryError, RepositoryResult};

/// Trait defining the interface for dish data access operations
#[async_trait]
pub trait DishRepository: Send + Sync {
    /// Find all dishes on the menu
    async fn find_all(&self) -> RepositoryResult<Vec<Dish>>;

    /// Find a dish by its ID
    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Dish>>;

    /// Create a new dish; fails if the id is already taken
    async fn create(&self, dish: Dish) -> RepositoryResult<Dish>;

    /// Delete a dish
    async fn delete(&self, id: &str) -> RepositoryResult<()>;

    /// Check if a dish exists
    async fn exists(&self, id: &str) -> RepositoryResult<bool>;
}

/// DynamoDB implementation of the DishRepository trait
pub struct DynamoDbDishRepository {
    client: Arc<DynamoDbClient>,
    table_name: String,
    region: String,
}

impl DynamoDbDishRepository {
    /// Create a new DynamoDB dish repository
    pub fn new(client: Arc<DynamoDbClient>, table_name: String, region: String) -> Self {
        Self {
            client,
            table_name,
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
            "aws.dynamodb.table_name" = %self.table_name,
            "aws.request_id" = tracing::field::Empty,
            "aws.agent" = "rust-aws-sdk",

            // Resource identification for X-Ray
            "aws.remote.service" = "AWS::DynamoDB",
            "aws.remote.operation" = operation,
            "aws.remote.resource.type" = "AWS::DynamoDB::Table",
            "aws.remote.resource.identifier" = %self.table_name,

            // OpenTelemetry semantic conventions
            "otel.kind" = "client",
            "otel.name" = format!("DynamoDB.{}", operation),

            // RPC semantic conventions for AWS API calls
            "rpc.system" = "aws-api",
            "rpc.service" = "AmazonDynamoDBv2",
            "rpc.method" = operation,

            // Database semantic conventions
            "db.system" = "dynamodb",
            "db.name" = %self.table_name,
            "db.operation" = operation,

            "component" = "aws-sdk-dynamodb",
        )
    }

    /// Get the table name (for testing)
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Convert a Dish struct to DynamoDB attribute values
    pub fn dish_to_item(&self, dish: &Dish) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();

        item.insert("id".to_string(), AttributeValue::S(dish.id.clone()));
        item.insert("name".to_string(), AttributeValue::S(dish.name.clone()));
        item.insert(
            "description".to_string(),
            AttributeValue::S(dish.description.clone()),
        );
        item.insert(
            "price".to_string(),
            AttributeValue::N(dish.price.to_string()),
        );
        item.insert(
            "available_quantity".to_string(),
            AttributeValue::N(dish.available_quantity.to_string()),
        );

        item
    }

    /// Convert DynamoDB item to Dish struct
    pub fn item_to_dish(&self, item: HashMap<String, AttributeValue>) -> RepositoryResult<Dish> {
        use rust_decimal::Decimal;
        use std::str::FromStr;

        let id = item
            .get("id")
            .and_then(|v| v.as_s().ok())
            .ok_or_else(|| RepositoryError::InvalidQuery {
                message: "Missing id".to_string(),
            })?
            .clone();

        let name = item
            .get("name")
            .and_then(|v| v.as_s().ok())
            .ok_or_else(|| RepositoryError::InvalidQuery {
                message: "Missing name".to_string(),
            })?
            .clone();

        let description = item
            .get("description")
            .and_then(|v| v.as_s().ok())
            .cloned()
            .unwrap_or_default();

        let price = item
            .get("price")
            .and_then(|v| v.as_n().ok())
            .and_then(|s| Decimal::from_str(s).ok())
            .ok_or_else(|| RepositoryError::InvalidQuery {
                message: "Invalid price".to_string(),
            })?;

        let available_quantity = item
            .get("available_quantity")
            .and_then(|v| v.as_n().ok())
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| RepositoryError::InvalidQuery {
                message: "Invalid available_quantity".to_string(),
            })?;

        Ok(Dish {
            id,
            name,
            description,
            price,
            available_quantity,
        })
    }

    /// Convert DynamoDB error to RepositoryError
    fn map_dynamodb_error(&self, error: DynamoDbError) -> RepositoryError {
        error!("DynamoDB error: {:?}", error);

        if let DynamoDbError::ResourceNotFoundException(_) = &error {
            return RepositoryError::TableNotFound {
                table_name: self.table_name.clone(),
            };
        }

        RepositoryError::AwsSdk {
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl DishRepository for DynamoDbDishRepository {
    #[instrument(skip(self), fields(table = %self.table_name))]
    async fn find_all(&self) -> RepositoryResult<Vec<Dish>> {
        info!("Scanning all dishes");

        let scan_span = self.create_dynamodb_span("Scan");

        let response = async {
            self.client
                .scan()
                .table_name(&self.table_name)
                .select(Select::AllAttributes)
                .send()
                .await
                .map_err(|e| self.map_dynamodb_error(e.into()))
        }
        .instrument(scan_span)
        .await?;

        let mut dishes = Vec::new();
        if let Some(items) = response.items {
            for item in items {
                match self.item_to_dish(item) {
                    Ok(dish) => dishes.push(dish),
                    Err(e) => {
                        warn!("Failed to parse dish item: {}", e);
                        continue;
                    }
                }
            }
        }

        info!("Found {} dishes", dishes.len());
        Ok(dishes)
    }

    #[instrument(skip(self), fields(table = %self.table_name, id = %id))]
    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Dish>> {
        info!("Finding dish by ID");

        let get_span = self.create_dynamodb_span("GetItem");

        let response = async {
            let result = self
                .client
                .get_item()
                .table_name(&self.table_name)
                .key("id", AttributeValue::S(id.to_string()))
                .send()
                .await;

            if let Ok(output) = &result {
                if let Some(request_id) = output.request_id() {
                    tracing::Span::current().record("aws.request_id", request_id);
                }
            }

            result.map_err(|e| self.map_dynamodb_error(e.into()))
        }
        .instrument(get_span)
        .await?;

        match response.item {
            Some(item) => {
                let dish = self.item_to_dish(item)?;
                info!("Dish found");
                Ok(Some(dish))
            }
            None => {
                info!("Dish not found");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, dish), fields(table = %self.table_name, id = %dish.id))]
    async fn create(&self, dish: Dish) -> RepositoryResult<Dish> {
        info!("Creating new dish");

        let item = self.dish_to_item(&dish);

        let put_span = self.create_dynamodb_span("PutItem");

        async {
            self.client
                .put_item()
                .table_name(&self.table_name)
                .set_item(Some(item))
                .condition_expression("attribute_not_exists(id)")
                .send()
                .await
                .map_err(|e| {
                    let sdk_error: DynamoDbError = e.into();
                    if let DynamoDbError::ConditionalCheckFailedException(_) = &sdk_error {
                        return RepositoryError::ConstraintViolation {
                            message: format!("Dish {} already exists", dish.id),
                        };
                    }
                    self.map_dynamodb_error(sdk_error)
                })
        }
        .instrument(put_span)
        .await?;

        info!("Dish created successfully");
        Ok(dish)
    }

    #[instrument(skip(self), fields(table = %self.table_name, id = %id))]
    async fn delete(&self, id: &str) -> RepositoryResult<()> {
        info!("Deleting dish");

        let delete_span = self.create_dynamodb_span("DeleteItem");

        async {
            self.client
                .delete_item()
                .table_name(&self.table_name)
                .key("id", AttributeValue::S(id.to_string()))
                .send()
                .await
                .map_err(|e| self.map_dynamodb_error(e.into()))?;

            info!("Dish deleted successfully");
            Ok(())
        }
        .instrument(delete_span)
        .await
    }

    #[instrument(skip(self), fields(table = %self.table_name, id = %id))]
    async fn exists(&self, id: &str) -> RepositoryResult<bool> {
        let get_span = self.create_dynamodb_span("GetItem");

        let response = async {
            self.client
                .get_item()
                .table_name(&self.table_name)
                .key("id", AttributeValue::S(id.to_string()))
                .projection_expression("id")
                .send()
                .await
                .map_err(|e| self.map_dynamodb_error(e.into()))
        }
        .instrument(get_span)
        .await?;

        Ok(response.item.is_some())
    }
}
