//! Mega reference adapter
//!
//! Mega lists the same product under several category pages, so listings are
//! reduced to one per normalized id before they leave the adapter.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::domain::errors::{CollectorError, CollectorErrorKind};
use crate::domain::records::{RawRecord, SourceId};
use crate::domain::services::collector::SourceCollector;
use crate::domain::services::text_normalizer::{TextNormalizer, has_hebrew};
use crate::infrastructure::collectors::fixture::{FixtureSource, category_listings};
use crate::infrastructure::request_pacer::RequestPacer;

pub const MEGA_CATEGORIES: &[&str] = &[
    "/categories/meat",
    "/categories/poultry",
    "/categories/fresh-meat",
    "/categories/processed-meat",
];

const BUNDLED_LISTINGS: &str = include_str!("../../../fixtures/mega.json");

#[derive(Debug, Clone, Deserialize)]
pub struct MegaListing {
    pub title: String,
    pub current_price: String,
    #[serde(default)]
    pub original_price: Option<String>,
    #[serde(default, alias = "weight")]
    pub unit: Option<String>,
    #[serde(default, alias = "manufacturer")]
    pub brand: Option<String>,
    #[serde(default)]
    pub availability: Option<MegaAvailability>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MegaAvailability {
    #[serde(default)]
    pub branches: usize,
}

impl MegaListing {
    /// Listings without availability data are sold at the general branch only
    pub fn branch_count(&self) -> usize {
        self.availability.map_or(1, |a| a.branches)
    }
}

pub struct MegaCollector {
    source_id: SourceId,
    categories: Vec<String>,
    fixture: FixtureSource,
    pacer: RequestPacer,
    timeout: Duration,
    normalizer: TextNormalizer,
}

impl MegaCollector {
    pub fn new(
        source_id: SourceId,
        categories: Vec<String>,
        fixture_path: Option<PathBuf>,
        request_delay: Duration,
        timeout: Duration,
    ) -> Self {
        let categories = if categories.is_empty() {
            MEGA_CATEGORIES.iter().map(ToString::to_string).collect()
        } else {
            categories
        };
        Self {
            source_id,
            categories,
            fixture: FixtureSource::new(BUNDLED_LISTINGS, fixture_path),
            pacer: RequestPacer::new(request_delay),
            timeout,
            normalizer: TextNormalizer::new(),
        }
    }

    /// Base 0.5, plus 0.15 for a Hebrew name, 0.15 for a price between 8 and
    /// 400, 0.1 for an explicit package weight and 0.02 per branch (at most 0.1)
    #[allow(clippy::cast_precision_loss)]
    pub fn source_confidence(&self, listing: &MegaListing) -> f64 {
        let mut score: f64 = 0.5;
        if has_hebrew(&listing.title) {
            score += 0.15;
        }
        if self
            .normalizer
            .extract_price(&listing.current_price)
            .is_some_and(|price| price > 8.0 && price < 400.0)
        {
            score += 0.15;
        }
        if listing
            .unit
            .as_deref()
            .is_some_and(|text| self.normalizer.extract_weight(text).is_known())
        {
            score += 0.1;
        }
        score += (listing.branch_count() as f64 * 0.02).min(0.1);
        score.min(1.0)
    }

    fn to_record(&self, listing: MegaListing, category: &str) -> RawRecord {
        let confidence = self.source_confidence(&listing);
        let branches = listing.branch_count();
        let mut record = RawRecord::new(self.source_id.clone(), listing.title, listing.current_price)
            .with_category_hint(category.rsplit('/').next().unwrap_or(category))
            .with_source_confidence(confidence)
            .with_extra("branch_count", branches.to_string());
        if let Some(unit) = listing.unit {
            record = record.with_weight(unit);
        }
        if let Some(original) = listing.original_price {
            record = record.with_original_price(original);
        }
        if let Some(brand) = listing.brand {
            record = record.with_brand(brand);
        }
        if branches <= 1 {
            record = record.with_branch("mega-general");
        }
        record
    }

    /// Keeps the higher source-confidence listing per normalized id, first seen on ties
    pub fn deduplicate(&self, records: Vec<RawRecord>) -> Vec<RawRecord> {
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut unique: Vec<RawRecord> = Vec::with_capacity(records.len());

        for record in records {
            let id = self.normalizer.normalize(&record.name).normalized_id;
            match positions.get(&id) {
                Some(&index) => {
                    let kept = unique[index].source_confidence.unwrap_or(0.0);
                    if record.source_confidence.unwrap_or(0.0) > kept {
                        debug!("🔁 {} replaces duplicate listing {}", self.source_id, id);
                        unique[index] = record;
                    }
                }
                None => {
                    positions.insert(id, unique.len());
                    unique.push(record);
                }
            }
        }
        unique
    }

    fn error(&self, kind: CollectorErrorKind) -> CollectorError {
        CollectorError::new(self.source_id.clone(), kind)
    }
}

#[async_trait]
impl SourceCollector for MegaCollector {
    fn source_id(&self) -> &SourceId {
        &self.source_id
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>, CollectorError> {
        let pages = self
            .fixture
            .load()
            .await
            .map_err(|e| self.error(CollectorErrorKind::Fixture { message: e.to_string() }))?;

        let mut records = Vec::new();
        let mut failed = 0;
        let mut last_error = String::new();

        for category in &self.categories {
            self.pacer.ready().await;
            match category_listings::<MegaListing>(&pages, category) {
                Ok(listings) => {
                    debug!("🔍 {} {}: {} listings", self.source_id, category, listings.len());
                    records.extend(listings.into_iter().map(|l| self.to_record(l, category)));
                }
                Err(e) => {
                    warn!("⚠️ {} category {} failed: {}", self.source_id, category, e);
                    failed += 1;
                    last_error = e.to_string();
                }
            }
        }

        if failed > 0 && failed == self.categories.len() {
            return Err(self.error(CollectorErrorKind::AllCategoriesFailed {
                attempted: failed,
                last_error,
            }));
        }

        let total = records.len();
        let unique = self.deduplicate(records);
        info!(
            "✅ {} collected {} listings ({} duplicates removed)",
            self.source_id,
            unique.len(),
            total - unique.len()
        );
        Ok(unique)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector() -> MegaCollector {
        MegaCollector::new(
            SourceId::new("mega"),
            Vec::new(),
            None,
            Duration::ZERO,
            Duration::from_secs(5),
        )
    }

    fn listing(title: &str, price: &str, branches: usize) -> MegaListing {
        MegaListing {
            title: title.to_string(),
            current_price: price.to_string(),
            original_price: None,
            unit: Some("1 ק\"ג".to_string()),
            brand: None,
            availability: Some(MegaAvailability { branches }),
        }
    }

    #[tokio::test]
    async fn test_bundled_listings() {
        let records = collector().fetch().await.unwrap();
        assert_eq!(records.len(), 11);

        let entrecote = &records[0];
        assert_eq!(entrecote.brand.as_deref(), Some("מעדני יהודה"));
        assert_eq!(entrecote.original_price_text.as_deref(), Some("₪68.90"));
        assert_eq!(entrecote.extra.get("branch_count").map(String::as_str), Some("5"));
    }

    #[test]
    fn test_branch_coverage_is_capped() {
        let collector = collector();
        let few = collector.source_confidence(&listing("חזה עוף", "₪28.90", 2));
        let many = collector.source_confidence(&listing("חזה עוף", "₪28.90", 8));
        assert!((few - 0.94).abs() < 1e-9);
        assert!((many - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_duplicates_keep_higher_confidence() {
        let collector = collector();
        let low = collector.to_record(listing("חזה עוף טרי", "₪28.90", 1), "/categories/poultry");
        let high = collector.to_record(listing("חזה  עוף טרי מגא", "₪27.90", 5), "/categories/meat");
        let other = collector.to_record(listing("כנפי עוף", "₪24.90", 3), "/categories/poultry");

        let unique = collector.deduplicate(vec![low, other, high]);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].price_text, "₪27.90");
        assert_eq!(unique[1].name, "כנפי עוף");
    }

    #[test]
    fn test_missing_availability_means_general_branch() {
        let collector = collector();
        let mut without = listing("נקניק בקר", "₪45.90", 0);
        without.availability = None;
        let record = collector.to_record(without, "/categories/processed-meat");
        assert_eq!(record.branch.as_deref(), Some("mega-general"));
    }
}
