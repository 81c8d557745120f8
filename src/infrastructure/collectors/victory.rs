//! Victory reference adapter
//!
//! Reads Victory listing pages (bundled snapshot or a configured fixture file)
//! category by category, paced by the source's request delay.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::domain::errors::{CollectorError, CollectorErrorKind};
use crate::domain::records::{RawRecord, SourceId};
use crate::domain::services::collector::SourceCollector;
use crate::domain::services::text_normalizer::{TextNormalizer, has_hebrew};
use crate::infrastructure::collectors::fixture::{FixtureSource, category_listings};
use crate::infrastructure::request_pacer::RequestPacer;

pub const VICTORY_CATEGORIES: &[&str] = &[
    "/categories/meat-beef",
    "/categories/meat-chicken",
    "/categories/meat-lamb",
    "/categories/meat-processed",
];

const BUNDLED_LISTINGS: &str = include_str!("../../../fixtures/victory.json");

/// One product tile as Victory renders it
#[derive(Debug, Clone, Deserialize)]
pub struct VictoryListing {
    pub title: String,
    pub price: String,
    #[serde(default)]
    pub original_price: Option<String>,
    #[serde(default, alias = "unit")]
    pub weight: Option<String>,
    #[serde(default)]
    pub kosher_badge: Option<String>,
    #[serde(default = "in_stock_by_default")]
    pub in_stock: bool,
}

const fn in_stock_by_default() -> bool {
    true
}

pub struct VictoryCollector {
    source_id: SourceId,
    categories: Vec<String>,
    fixture: FixtureSource,
    pacer: RequestPacer,
    timeout: Duration,
    normalizer: TextNormalizer,
}

impl VictoryCollector {
    pub fn new(
        source_id: SourceId,
        categories: Vec<String>,
        fixture_path: Option<std::path::PathBuf>,
        request_delay: Duration,
        timeout: Duration,
    ) -> Self {
        let categories = if categories.is_empty() {
            VICTORY_CATEGORIES.iter().map(ToString::to_string).collect()
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

    /// Base 0.5, plus 0.2 for a Hebrew name, 0.2 for a price between 10 and
    /// 300, and 0.1 for an explicit package weight
    pub fn source_confidence(&self, listing: &VictoryListing) -> f64 {
        let mut score: f64 = 0.5;
        if has_hebrew(&listing.title) {
            score += 0.2;
        }
        if self
            .normalizer
            .extract_price(&listing.price)
            .is_some_and(|price| price > 10.0 && price < 300.0)
        {
            score += 0.2;
        }
        if listing
            .weight
            .as_deref()
            .is_some_and(|text| self.normalizer.extract_weight(text).is_known())
        {
            score += 0.1;
        }
        score.min(1.0)
    }

    fn to_record(&self, listing: VictoryListing, category: &str) -> RawRecord {
        let confidence = self.source_confidence(&listing);
        let mut record = RawRecord::new(self.source_id.clone(), listing.title, listing.price)
            .with_category_hint(category.rsplit('/').next().unwrap_or(category))
            .with_source_confidence(confidence)
            .with_extra("in_stock", listing.in_stock.to_string());
        if let Some(weight) = listing.weight {
            record = record.with_weight(weight);
        }
        if let Some(original) = listing.original_price {
            record = record.with_original_price(original);
        }
        if let Some(badge) = listing.kosher_badge {
            record = record.with_kosher(badge);
        }
        record
    }

    fn error(&self, kind: CollectorErrorKind) -> CollectorError {
        CollectorError::new(self.source_id.clone(), kind)
    }
}

#[async_trait]
impl SourceCollector for VictoryCollector {
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
            match category_listings::<VictoryListing>(&pages, category) {
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

        info!("✅ {} collected {} listings", self.source_id, records.len());
        Ok(records)
    }
}
