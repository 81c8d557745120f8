//! Cross-source merge of validated records into unified products
//!
//! Records are grouped by `normalized_id`. Each group yields one
//! [`UnifiedProduct`] based on its best record (highest confidence, then most
//! complete), carrying one price per contributing source. The merge is a pure
//! function of its input: the same records in any order give the same catalog.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use tracing::{debug, error};

use crate::domain::errors::MergeInconsistency;
use crate::domain::product::{PriceRange, ProductMetadata, UnifiedProduct, ValidatedRecord};
use crate::domain::records::SourceId;
use crate::domain::services::text_normalizer::has_hebrew;
use crate::domain::taxonomy::{MeatCut, QualityGrade};

const COMPLETENESS_FIELDS: f64 = 8.0;

/// Result of one merge pass.
///
/// Inconsistent groups are excluded from `products` and reported here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    pub products: Vec<UnifiedProduct>,
    pub inconsistencies: Vec<MergeInconsistency>,
}

/// Share of descriptive fields present on a record, in `[0, 1]`
pub fn completeness_score(record: &ValidatedRecord) -> f64 {
    let attrs = &record.attributes;
    let present = [
        has_hebrew(&attrs.normalized_name),
        !attrs.english_name.is_empty() && attrs.english_name != attrs.normalized_name,
        record.price.is_finite() && record.price > 0.0,
        record.weight.is_known(),
        attrs.category.is_known(),
        attrs.cut != MeatCut::Unknown,
        attrs.quality_grade != QualityGrade::Regular,
        !record.raw.extra.is_empty() || record.brand.is_some() || record.kosher.is_some(),
    ];
    present.iter().filter(|p| **p).count() as f64 / COMPLETENESS_FIELDS
}

/// Total order used to pick a group's base record; `Greater` means preferred
fn preference(a: &ValidatedRecord, b: &ValidatedRecord) -> Ordering {
    a.confidence
        .total_cmp(&b.confidence)
        .then_with(|| completeness_score(a).total_cmp(&completeness_score(b)))
        .then_with(|| b.source_id().cmp(a.source_id()))
        .then_with(|| b.price.total_cmp(&a.price))
        .then_with(|| b.attributes.normalized_name.cmp(&a.attributes.normalized_name))
        .then_with(|| b.raw.fetched_at.cmp(&a.raw.fetched_at))
}

#[derive(Debug, Clone, Copy)]
struct PriceEntry {
    price: f64,
    confidence: f64,
}

/// Offers one source price; a conflicting price from the same source is
/// replaced only by a higher-confidence record, or an equally confident lower price.
fn offer_price(book: &mut BTreeMap<SourceId, PriceEntry>, record: &ValidatedRecord) {
    let candidate = PriceEntry { price: record.price, confidence: record.confidence };
    match book.entry(record.source_id().clone()) {
        Entry::Vacant(slot) => {
            slot.insert(candidate);
        }
        Entry::Occupied(mut slot) => {
            let current = *slot.get();
            let replaces = candidate.confidence > current.confidence
                || (candidate.confidence.total_cmp(&current.confidence) == Ordering::Equal
                    && candidate.price < current.price);
            if replaces {
                debug!(
                    "Price conflict for {} in '{}': {} -> {}",
                    record.source_id(),
                    record.normalized_id(),
                    current.price,
                    candidate.price
                );
                slot.insert(candidate);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Unifier;

impl Unifier {
    pub const fn new() -> Self {
        Self
    }

    pub fn merge(&self, records: &[ValidatedRecord]) -> MergeOutcome {
        let mut groups: BTreeMap<&str, Vec<&ValidatedRecord>> = BTreeMap::new();
        for record in records {
            groups.entry(record.normalized_id()).or_default().push(record);
        }

        let mut outcome = MergeOutcome::default();
        for (normalized_id, members) in groups {
            match Self::merge_group(normalized_id, &members) {
                Ok(product) => outcome.products.push(product),
                Err(inconsistency) => {
                    error!("❌ {}", inconsistency);
                    outcome.inconsistencies.push(inconsistency);
                }
            }
        }

        outcome.products.sort_by(|a, b| {
            b.best_confidence
                .total_cmp(&a.best_confidence)
                .then_with(|| a.display_name.cmp(&b.display_name))
                .then_with(|| a.id.cmp(&b.id))
        });
        outcome
    }

    fn merge_group(
        normalized_id: &str,
        members: &[&ValidatedRecord],
    ) -> Result<UnifiedProduct, MergeInconsistency> {
        let inconsistent = |reason: String| MergeInconsistency {
            normalized_id: normalized_id.to_string(),
            reason,
        };

        let base = members
            .iter()
            .copied()
            .max_by(|a, b| preference(a, b))
            .ok_or_else(|| inconsistent("empty merge group".to_string()))?;

        if let Some(bad) = members.iter().find(|r| !(r.price.is_finite() && r.price > 0.0)) {
            return Err(inconsistent(format!(
                "non-positive price {} from {}",
                bad.price,
                bad.source_id()
            )));
        }

        // Fold in preference order so repeated sources resolve the same way for any input order
        let mut ordered = members.to_vec();
        ordered.sort_by(|a, b| preference(b, a));
        let mut book = BTreeMap::new();
        for record in &ordered {
            offer_price(&mut book, record);
        }

        let source_prices: BTreeMap<SourceId, f64> =
            book.into_iter().map(|(source, entry)| (source, entry.price)).collect();
        let price_range = PriceRange::from_prices(source_prices.values().copied())
            .ok_or_else(|| inconsistent("no source prices".to_string()))?;
        if !price_range.is_consistent() {
            return Err(inconsistent(format!(
                "price range out of order (min {}, avg {}, max {})",
                price_range.min, price_range.avg, price_range.max
            )));
        }

        let last_updated = members
            .iter()
            .map(|r| r.raw.fetched_at)
            .max()
            .unwrap_or(base.raw.fetched_at);

        Ok(UnifiedProduct {
            id: normalized_id.to_string(),
            display_name: base.attributes.normalized_name.clone(),
            english_name: base.attributes.english_name.clone(),
            category: base.attributes.category,
            cut: base.attributes.cut,
            quality_grade: base.attributes.quality_grade,
            processing_method: base.attributes.processing_method,
            contributing_sources: source_prices.keys().cloned().collect(),
            source_prices,
            price_range,
            reference_price: base.price,
            best_confidence: base.confidence,
            member_count: members.len(),
            metadata: ProductMetadata {
                weight: base.weight.canonical(),
                weight_is_placeholder: !base.weight.is_known(),
                brand: base.brand.clone(),
                kosher: base.kosher,
                branch: base.raw.branch.clone(),
                discount_percentage: base.discount_percentage(),
                extra: base.raw.extra.clone(),
            },
            last_updated,
        })
    }
}
