//! Normalized, validated and unified product representations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::records::{RawRecord, SourceId};
use crate::domain::services::validator::ValidationIssue;
use crate::domain::taxonomy::{
    KosherCertification, MeatCategory, MeatCut, ProcessingMethod, QualityGrade,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightUnit {
    Kilogram,
    Gram,
    Unit,
}

/// Package weight extracted from listing text.
///
/// When nothing parseable is found the placeholder (`1kg`, `placeholder:
/// true`) is used so downstream code always has a weight to display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weight {
    pub amount: f64,
    pub unit: WeightUnit,
    pub placeholder: bool,
}

impl Weight {
    pub const fn new(amount: f64, unit: WeightUnit) -> Self {
        Self { amount, unit, placeholder: false }
    }

    pub const fn placeholder() -> Self {
        Self { amount: 1.0, unit: WeightUnit::Kilogram, placeholder: true }
    }

    pub const fn is_known(&self) -> bool {
        !self.placeholder
    }

    /// Canonical textual form, e.g. `1kg`, `800g`, `4 units`
    pub fn canonical(&self) -> String {
        match self.unit {
            WeightUnit::Kilogram => format!("{}kg", self.amount),
            WeightUnit::Gram => format!("{}g", self.amount),
            WeightUnit::Unit if (self.amount - 1.0).abs() < f64::EPSILON => "1 unit".to_string(),
            WeightUnit::Unit => format!("{} units", self.amount),
        }
    }

    /// Mass in kilograms, `None` for piece counts
    pub fn kilograms(&self) -> Option<f64> {
        match self.unit {
            WeightUnit::Kilogram => Some(self.amount),
            WeightUnit::Gram => Some(self.amount / 1000.0),
            WeightUnit::Unit => None,
        }
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// Output of the text normalizer for one product name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedAttributes {
    pub normalized_name: String,
    pub english_name: String,
    pub category: MeatCategory,
    pub cut: MeatCut,
    pub quality_grade: QualityGrade,
    pub processing_method: ProcessingMethod,
    /// Identity key shared by every listing of the same product
    pub normalized_id: String,
}

/// A raw record that passed the acceptance gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedRecord {
    pub raw: RawRecord,
    pub attributes: NormalizedAttributes,
    pub price: f64,
    pub original_price: Option<f64>,
    pub weight: Weight,
    pub kosher: Option<KosherCertification>,
    pub brand: Option<String>,
    /// Validator confidence scaled by the source confidence, in `[0, 1]`
    pub confidence: f64,
    pub issues: Vec<ValidationIssue>,
}

impl ValidatedRecord {
    pub fn source_id(&self) -> &SourceId {
        &self.raw.source_id
    }

    pub fn normalized_id(&self) -> &str {
        &self.attributes.normalized_id
    }

    /// Discount relative to the pre-sale price, rounded to whole percent
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn discount_percentage(&self) -> Option<u32> {
        let original = self.original_price?;
        if original <= self.price || original <= 0.0 {
            return None;
        }
        let pct = ((original - self.price) / original * 100.0).round();
        // 0 < pct <= 100 after the guards above
        Some(pct as u32)
    }
}

/// Min/max/average over the per-source prices of one unified product
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

impl PriceRange {
    /// Computes the range, `None` for an empty input.
    ///
    /// The average is rounded to agorot and kept inside `[min, max]`.
    pub fn from_prices<I>(prices: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut count = 0usize;

        for price in prices {
            min = min.min(price);
            max = max.max(price);
            sum += price;
            count += 1;
        }

        if count == 0 {
            return None;
        }

        let avg = ((sum / count as f64) * 100.0).round() / 100.0;
        Some(Self { min, max, avg: avg.max(min).min(max) })
    }

    pub fn is_consistent(&self) -> bool {
        [self.min, self.max, self.avg].iter().all(|v| v.is_finite() && *v >= 0.0)
            && self.min <= self.avg
            && self.avg <= self.max
    }
}

/// Descriptive fields carried over from the record a product was based on
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductMetadata {
    pub weight: String,
    pub weight_is_placeholder: bool,
    pub brand: Option<String>,
    pub kosher: Option<KosherCertification>,
    pub branch: Option<String>,
    pub discount_percentage: Option<u32>,
    pub extra: BTreeMap<String, String>,
}

/// One product identity merged across every source that lists it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedProduct {
    pub id: String,
    pub display_name: String,
    pub english_name: String,
    pub category: MeatCategory,
    pub cut: MeatCut,
    pub quality_grade: QualityGrade,
    pub processing_method: ProcessingMethod,
    pub source_prices: BTreeMap<SourceId, f64>,
    pub price_range: PriceRange,
    /// Price of the record chosen as the base of the merge
    pub reference_price: f64,
    pub best_confidence: f64,
    pub member_count: usize,
    pub contributing_sources: Vec<SourceId>,
    pub metadata: ProductMetadata,
    pub last_updated: DateTime<Utc>,
}
