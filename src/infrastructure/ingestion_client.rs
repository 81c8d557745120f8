//! Catalog ingestion client
//!
//! Sends the unified catalog to the downstream price database in fixed-size
//! batches with a pause between batches. A batch that cannot be delivered
//! counts all of its products as failed; later batches are still sent.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::application::dto::{BatchMetadata, BatchResponse, IngestionBatch, IngestionProduct, IngestionReport};
use crate::domain::product::UnifiedProduct;
use crate::infrastructure::config::{IngestionConfig, defaults};
use crate::infrastructure::http_client::{HttpClient, HttpClientConfig, HttpError};
use crate::infrastructure::retry_policy::RetryPolicy;

/// Delivers one batch to the ingestion endpoint
#[async_trait]
pub trait BatchTransport: Send + Sync {
    async fn send(&self, batch: &IngestionBatch<'_>) -> Result<BatchResponse, HttpError>;
}

/// JSON over HTTP with an optional bearer token
#[derive(Debug)]
pub struct HttpBatchTransport {
    http: HttpClient,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpBatchTransport {
    pub fn new(config: &IngestionConfig, retry: RetryPolicy) -> Result<Self, HttpError> {
        let endpoint = url::Url::parse(&config.base_url)
            .and_then(|base| base.join(defaults::INGESTION_ENDPOINT))
            .map_err(|e| HttpError::Build(format!("invalid ingestion URL: {e}")))?;

        Ok(Self {
            http: HttpClient::new(&HttpClientConfig::default(), retry)?,
            endpoint: endpoint.to_string(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl BatchTransport for HttpBatchTransport {
    async fn send(&self, batch: &IngestionBatch<'_>) -> Result<BatchResponse, HttpError> {
        self.http
            .post_json(&self.endpoint, batch, self.api_key.as_deref())
            .await
    }
}

pub struct IngestionClient {
    transport: Arc<dyn BatchTransport>,
    batch_size: usize,
    batch_delay: Duration,
}

impl IngestionClient {
    pub fn new(transport: Arc<dyn BatchTransport>, batch_size: usize, batch_delay: Duration) -> Self {
        Self {
            transport,
            batch_size: batch_size.max(1),
            batch_delay,
        }
    }

    pub fn from_config(config: &IngestionConfig, retry: RetryPolicy) -> Result<Self, HttpError> {
        let transport = HttpBatchTransport::new(config, retry)?;
        info!("📤 Ingestion endpoint: {}", transport.endpoint());
        Ok(Self::new(
            Arc::new(transport),
            config.batch_size,
            Duration::from_millis(config.batch_delay_ms),
        ))
    }

    pub async fn ingest(&self, session_id: &str, products: &[UnifiedProduct]) -> IngestionReport {
        let payload: Vec<IngestionProduct> = products.iter().map(IngestionProduct::from).collect();
        let mut report = IngestionReport::default();
        let batch_count = payload.len().div_ceil(self.batch_size);

        info!("📤 Ingesting {} products in {} batches", payload.len(), batch_count);

        for (index, chunk) in payload.chunks(self.batch_size).enumerate() {
            if index > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }

            let batch = IngestionBatch {
                products: chunk,
                batch_metadata: BatchMetadata {
                    batch_size: chunk.len(),
                    extraction_timestamp: Utc::now(),
                    session_id: session_id.to_string(),
                },
            };

            match self.transport.send(&batch).await {
                Ok(response) => {
                    info!(
                        "✅ Batch {}/{}: {} ok, {} failed",
                        index + 1,
                        batch_count,
                        response.successful,
                        response.failed
                    );
                    report.absorb(&response);
                }
                Err(e) => {
                    warn!("❌ Batch {}/{} failed: {}", index + 1, batch_count, e);
                    report.batch_failed(index, chunk.len(), e);
                }
            }
        }

        info!(
            "📊 Ingestion finished: {} successful, {} failed, {} new",
            report.successful, report.failed, report.newly_created
        );
        report
    }
}
