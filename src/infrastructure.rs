//! Infrastructure layer for configuration, logging and external integrations
//!
//! Source collectors, HTTP access with pacing and retries, and the catalog
//! ingestion client.

pub mod collectors;
pub mod config;
pub mod http_client;
pub mod ingestion_client;
pub mod logging;
pub mod request_pacer;
pub mod retry_policy;

// Re-export commonly used items
pub use collectors::build_collectors;
pub use config::{AppConfig, ConfigError};
pub use http_client::{HttpClient, HttpClientConfig, HttpError};
pub use ingestion_client::IngestionClient;
pub use logging::{init_logging, init_logging_with_config};
pub use request_pacer::RequestPacer;
pub use retry_policy::{RetryPolicy, RetryPolicyError};
