use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading error: {message}")]
    LoadError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Environment variable missing: {name}")]
    MissingEnvironmentVariable { name: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub aws: AwsConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_max_request_size")]
    pub max_request_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_dishes_table")]
    pub dishes_table_name: String,
    #[serde(default = "default_bookings_table")]
    pub bookings_table_name: String,
    #[serde(default = "default_region")]
    pub region: String,
}

#[derive(Debug, Clone)]
pub struct AwsConfig {
    pub region: String,
    pub dynamodb_client: DynamoDbClient,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_service_version")]
    pub service_version: String,
    #[serde(default = "default_otlp_endpoint_option")]
    pub otlp_endpoint: Option<String>,
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_enable_json_logging")]
    pub enable_json_logging: bool,
}

impl Config {
    pub async fn from_environment() -> Result<Self, ConfigError> {
        info!("Loading configuration from environment");

        let server = ServerConfig::from_env()?;
        let database = DatabaseConfig::from_env()?;
        let observability = ObservabilityConfig::from_env()?;

        // Initialize AWS configuration
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(database.region.clone()))
            .load()
            .await;

        let dynamodb_client = DynamoDbClient::new(&aws_config);

        let aws = AwsConfig {
            region: database.region.clone(),
            dynamodb_client,
        };

        let config = Config {
            server,
            database,
            aws,
            observability,
        };

        config.validate()?;

        info!("Configuration loaded successfully");
        debug!("Configuration: {:?}", config);

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        info!("Validating configuration");

        // Validate server configuration
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError {
                message: "Server port cannot be 0".to_string(),
            });
        }

        if self.server.request_timeout_seconds == 0 {
            return Err(ConfigError::ValidationError {
                message: "Request timeout cannot be 0".to_string(),
            });
        }

        // Validate database configuration
        if self.database.dishes_table_name.is_empty() {
            return Err(ConfigError::ValidationError {
                message: "Dishes table name cannot be empty".to_string(),
            });
        }

        if self.database.bookings_table_name.is_empty() {
            return Err(ConfigError::ValidationError {
                message: "Bookings table name cannot be empty".to_string(),
            });
        }

        info!("Configuration validation completed");
        Ok(())
    }
}

impl ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix("DINEBOOK"))
            .build()
            .map_err(|e| ConfigError::LoadError {
                message: format!("Failed to load server config: {}", e),
            })?;

        settings
            .try_deserialize()
            .map_err(|e| ConfigError::LoadError {
                message: format!("Failed to deserialize server config: {}", e),
            })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl DatabaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix("DINEBOOK"))
            .build()
            .map_err(|e| ConfigError::LoadError {
                message: format!("Failed to load database config: {}", e),
            })?;

        settings
            .try_deserialize()
            .map_err(|e| ConfigError::LoadError {
                message: format!("Failed to deserialize database config: {}", e),
            })
    }
}

impl ObservabilityConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix("DINEBOOK"))
            .build()
            .map_err(|e| ConfigError::LoadError {
                message: format!("Failed to load observability config: {}", e),
            })?;

        settings
            .try_deserialize()
            .map_err(|e| ConfigError::LoadError {
                message: format!("Failed to deserialize observability config: {}", e),
            })
    }
}

// Default value functions
pub(crate) fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub(crate) fn default_port() -> u16 {
    8080
}

pub(crate) fn default_timeout() -> u64 {
    30
}

pub(crate) fn default_max_request_size() -> usize {
    1024 * 1024 // 1MB
}

pub(crate) fn default_dishes_table() -> String {
    "Dishes".to_string()
}

pub(crate) fn default_bookings_table() -> String {
    "Bookings".to_string()
}

pub(crate) fn default_region() -> String {
    "us-west-2".to_string()
}

pub(crate) fn default_service_name() -> String {
    "dinebook-rs".to_string()
}

pub(crate) fn default_service_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

pub(crate) fn default_otlp_endpoint_option() -> Option<String> {
    std::env::var("DINEBOOK_OTLP_ENDPOINT").ok()
}

pub(crate) fn default_enable_json_logging() -> bool {
    std::env::var("DINEBOOK_ENABLE_JSON_LOGGING")
        .map(|v| v.to_lowercase() == "true")
        .unwrap_or(false)
}

pub(crate) fn default_metrics_port() -> u16 {
    9090
}

pub(crate) fn default_log_level() -> String {
    "info".to_string()
}
