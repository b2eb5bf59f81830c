use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType, TableStatus,
};
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::models::{RepositoryError, RepositoryResult};

const TABLE_ACTIVE_MAX_ATTEMPTS: u32 = 30;
const TABLE_ACTIVE_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Manages the lifecycle of the DynamoDB tables backing the service
pub struct TableManager {
    client: Arc<DynamoDbClient>,
    dishes_table: String,
    bookings_table: String,
}

impl TableManager {
    pub fn new(client: Arc<DynamoDbClient>, dishes_table: String, bookings_table: String) -> Self {
        Self {
            client,
            dishes_table,
            bookings_table,
        }
    }

    /// Create both tables if they do not exist and wait for them to go active
    #[instrument(skip(self))]
    pub async fn create_all_tables(&self) -> RepositoryResult<Vec<String>> {
        let mut created = Vec::new();

        if self.create_table_if_missing(&self.dishes_table).await? {
            created.push(self.dishes_table.clone());
        }
        if self.create_table_if_missing(&self.bookings_table).await? {
            created.push(self.bookings_table.clone());
        }

        for table_name in &created {
            self.wait_for_table_active(table_name).await?;
        }

        Ok(created)
    }

    /// Check whether a table exists
    #[instrument(skip(self))]
    pub async fn table_exists(&self, table_name: &str) -> RepositoryResult<bool> {
        match self
            .client
            .describe_table()
            .table_name(table_name)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let sdk_error: aws_sdk_dynamodb::Error = e.into();
                if let aws_sdk_dynamodb::Error::ResourceNotFoundException(_) = &sdk_error {
                    return Ok(false);
                }
                Err(RepositoryError::AwsSdk {
                    message: sdk_error.to_string(),
                })
            }
        }
    }

    /// Delete a table
    #[instrument(skip(self))]
    pub async fn delete_table(&self, table_name: &str) -> RepositoryResult<()> {
        info!("Deleting table {}", table_name);

        self.client
            .delete_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(|e| RepositoryError::AwsSdk {
                message: aws_sdk_dynamodb::Error::from(e).to_string(),
            })?;

        Ok(())
    }

    async fn create_table_if_missing(&self, table_name: &str) -> RepositoryResult<bool> {
        if self.table_exists(table_name).await? {
            info!("Table {} already exists", table_name);
            return Ok(false);
        }

        info!("Creating table {}", table_name);

        // Both tables are keyed by a single string id attribute
        let key_attribute = AttributeDefinition::builder()
            .attribute_name("id")
            .attribute_type(ScalarAttributeType::S)
            .build()
            .map_err(|e| RepositoryError::InvalidQuery {
                message: e.to_string(),
            })?;

        let key_schema = KeySchemaElement::builder()
            .attribute_name("id")
            .key_type(KeyType::Hash)
            .build()
            .map_err(|e| RepositoryError::InvalidQuery {
                message: e.to_string(),
            })?;

        self.client
            .create_table()
            .table_name(table_name)
            .attribute_definitions(key_attribute)
            .key_schema(key_schema)
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await
            .map_err(|e| RepositoryError::AwsSdk {
                message: aws_sdk_dynamodb::Error::from(e).to_string(),
            })?;

        Ok(true)
    }

    /// Poll until the table reports ACTIVE status
    async fn wait_for_table_active(&self, table_name: &str) -> RepositoryResult<()> {
        for attempt in 1..=TABLE_ACTIVE_MAX_ATTEMPTS {
            let response = self
                .client
                .describe_table()
                .table_name(table_name)
                .send()
                .await
                .map_err(|e| RepositoryError::AwsSdk {
                    message: aws_sdk_dynamodb::Error::from(e).to_string(),
                })?;

            if let Some(table) = response.table {
                if table.table_status == Some(TableStatus::Active) {
                    info!("Table {} is active", table_name);
                    return Ok(());
                }
            }

            warn!(
                "Table {} not active yet (attempt {}/{})",
                table_name, attempt, TABLE_ACTIVE_MAX_ATTEMPTS
            );
            tokio::time::sleep(TABLE_ACTIVE_POLL_INTERVAL).await;
        }

        Err(RepositoryError::Timeout)
    }
}
