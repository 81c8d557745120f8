//! Data Transfer Objects for session reports and catalog ingestion

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::product::UnifiedProduct;
use crate::domain::records::SourceId;
use crate::domain::session::{PerformanceMetrics, ScrapingSession};

/// Externally visible summary of one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub scrapers_run: Vec<SourceId>,
    pub total_products: usize,
    pub validation_score: f64,
    pub errors: Vec<String>,
    pub performance_metrics: PerformanceMetrics,
}

impl From<&ScrapingSession> for SessionReport {
    fn from(session: &ScrapingSession) -> Self {
        Self {
            id: session.id.clone(),
            start_time: session.start_time,
            end_time: session.end_time,
            scrapers_run: session.scrapers_run.clone(),
            total_products: session.total_products,
            validation_score: session.validation_score,
            errors: session.errors.clone(),
            performance_metrics: session.performance_metrics.clone(),
        }
    }
}

/// One catalog entry in the shape the ingestion endpoint expects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionProduct {
    pub external_id: String,
    pub name: String,
    pub price_per_unit: f64,
    pub category: String,
    #[serde(rename = "sourcePrices")]
    pub source_prices: BTreeMap<SourceId, f64>,
    pub confidence: f64,
}

impl From<&UnifiedProduct> for IngestionProduct {
    fn from(product: &UnifiedProduct) -> Self {
        Self {
            external_id: product.id.clone(),
            name: product.display_name.clone(),
            price_per_unit: product.reference_price,
            category: product.category.to_string(),
            source_prices: product.source_prices.clone(),
            confidence: product.best_confidence,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchMetadata {
    pub batch_size: usize,
    pub extraction_timestamp: DateTime<Utc>,
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestionBatch<'a> {
    pub products: &'a [IngestionProduct],
    pub batch_metadata: BatchMetadata,
}

/// Per-batch counts returned by the ingestion endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BatchResponse {
    #[serde(default, alias = "successful_ingests")]
    pub successful: usize,
    #[serde(default, alias = "failed_ingests")]
    pub failed: usize,
    #[serde(default)]
    pub linked_to_existing: usize,
    #[serde(default, alias = "new_products_created")]
    pub newly_created: usize,
}

/// Totals over every batch of one ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionReport {
    pub successful: usize,
    pub failed: usize,
    pub linked_to_existing: usize,
    pub newly_created: usize,
    pub errors: Vec<String>,
}

impl IngestionReport {
    pub fn absorb(&mut self, response: &BatchResponse) {
        self.successful += response.successful;
        self.failed += response.failed;
        self.linked_to_existing += response.linked_to_existing;
        self.newly_created += response.newly_created;
    }

    /// Counts every product of a batch that could not be delivered as failed
    pub fn batch_failed(&mut self, batch_index: usize, batch_len: usize, error: impl std::fmt::Display) {
        self.failed += batch_len;
        self.errors.push(format!("batch {}: {error}", batch_index + 1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::{PriceRange, ProductMetadata};
    use crate::domain::taxonomy::{MeatCategory, MeatCut, ProcessingMethod, QualityGrade};

    fn entrecote() -> UnifiedProduct {
        let source_prices: BTreeMap<SourceId, f64> =
            [(SourceId::new("mega"), 49.90), (SourceId::new("victory"), 55.90)].into();
        UnifiedProduct {
            id: "אנטריקוט_בקר".to_string(),
            display_name: "אנטריקוט בקר".to_string(),
            english_name: "entrecote beef".to_string(),
            category: MeatCategory::Beef,
            cut: MeatCut::Entrecote,
            quality_grade: QualityGrade::Regular,
            processing_method: ProcessingMethod::Fresh,
            contributing_sources: source_prices.keys().cloned().collect(),
            price_range: PriceRange::from_prices(source_prices.values().copied()).unwrap(),
            source_prices,
            reference_price: 49.90,
            best_confidence: 0.9,
            member_count: 2,
            metadata: ProductMetadata::default(),
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn test_ingestion_product_shape() {
        let product = IngestionProduct::from(&entrecote());
        let json = serde_json::to_value(&product).unwrap();

        assert_eq!(json["external_id"], "אנטריקוט_בקר");
        assert_eq!(json["category"], "beef");
        assert_eq!(json["price_per_unit"], 49.90);
        assert_eq!(json["sourcePrices"]["victory"], 55.90);
        assert!(json.get("source_prices").is_none());
    }

    #[test]
    fn test_batch_response_accepts_service_field_names() {
        let response: BatchResponse = serde_json::from_str(
            r#"{"successful_ingests": 18, "failed_ingests": 2, "linked_to_existing": 11, "new_products_created": 7}"#,
        )
        .unwrap();

        let mut report = IngestionReport::default();
        report.absorb(&response);
        report.batch_failed(1, 20, "HTTP 503");

        assert_eq!(report.successful, 18);
        assert_eq!(report.failed, 22);
        assert_eq!(report.linked_to_existing, 11);
        assert_eq!(report.newly_created, 7);
        assert_eq!(report.errors, vec!["batch 2: HTTP 503".to_string()]);
    }
}
