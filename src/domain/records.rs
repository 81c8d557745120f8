//! Raw listings as delivered by a source collector

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a retail source (e.g. `victory`, `mega`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SourceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One product listing exactly as a source presented it.
///
/// Collectors only copy what the retailer shows; every interpretation
/// (price parsing, taxonomy, weight) happens downstream in the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub source_id: SourceId,
    pub name: String,
    pub price_text: String,
    pub weight_text: Option<String>,
    /// Pre-sale price when the listing shows a discount
    pub original_price_text: Option<String>,
    pub brand: Option<String>,
    pub kosher_text: Option<String>,
    pub branch: Option<String>,
    pub category_hint: Option<String>,
    /// Source-side plausibility score in `[0, 1]`, when the collector computes one
    pub source_confidence: Option<f64>,
    pub extra: BTreeMap<String, String>,
    pub fetched_at: DateTime<Utc>,
}

impl RawRecord {
    pub fn new(
        source_id: SourceId,
        name: impl Into<String>,
        price_text: impl Into<String>,
    ) -> Self {
        Self {
            source_id,
            name: name.into(),
            price_text: price_text.into(),
            weight_text: None,
            original_price_text: None,
            brand: None,
            kosher_text: None,
            branch: None,
            category_hint: None,
            source_confidence: None,
            extra: BTreeMap::new(),
            fetched_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_weight(mut self, weight_text: impl Into<String>) -> Self {
        self.weight_text = Some(weight_text.into());
        self
    }

    #[must_use]
    pub fn with_original_price(mut self, original_price_text: impl Into<String>) -> Self {
        self.original_price_text = Some(original_price_text.into());
        self
    }

    #[must_use]
    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    #[must_use]
    pub fn with_kosher(mut self, kosher_text: impl Into<String>) -> Self {
        self.kosher_text = Some(kosher_text.into());
        self
    }

    #[must_use]
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    #[must_use]
    pub fn with_category_hint(mut self, hint: impl Into<String>) -> Self {
        self.category_hint = Some(hint.into());
        self
    }

    #[must_use]
    pub fn with_source_confidence(mut self, confidence: f64) -> Self {
        self.source_confidence = Some(confidence);
        self
    }

    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_fetched_at(mut self, fetched_at: DateTime<Utc>) -> Self {
        self.fetched_at = fetched_at;
        self
    }
}
