//! 정규화 + 통합 성능 벤치마크
//!
//! Normalizes a synthetic multi-retailer listing set and merges it into the
//! unified catalog.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use basarometer_core::domain::product::ValidatedRecord;
use basarometer_core::domain::services::{TextNormalizer, Unifier};
use basarometer_core::{RawRecord, SourceId};

const SOURCES: &[&str] = &["victory", "mega", "shufersal", "rami-levy", "yochananof"];

const NAMES: &[&str] = &[
    "אנטריקוט בקר פרימיום",
    "פילה בקר",
    "חזה עוף טרי",
    "ירכיים עוף",
    "כנפי עוף",
    "קוטלט כבש",
    "כתף כבש ללא עצם",
    "שניצל הודו",
    "בשר בקר טחון",
    "סטייק סינטה בקר",
];

fn listings(count: usize) -> Vec<RawRecord> {
    (0..count)
        .map(|i| {
            let source = SOURCES[i % SOURCES.len()];
            let name = format!("{} {}", NAMES[i % NAMES.len()], i / NAMES.len());
            RawRecord::new(SourceId::new(source), name, format!("₪{}.90", 20 + i % 80))
                .with_weight("1 ק\"ג")
        })
        .collect()
}

fn validate(normalizer: &TextNormalizer, raw: &[RawRecord]) -> Vec<ValidatedRecord> {
    raw.iter()
        .map(|record| ValidatedRecord {
            attributes: normalizer.normalize(&record.name),
            price: normalizer.extract_price(&record.price_text).unwrap_or_default(),
            original_price: None,
            weight: normalizer.extract_weight(record.weight_text.as_deref().unwrap_or_default()),
            kosher: None,
            brand: None,
            confidence: 0.9,
            issues: Vec::new(),
            raw: record.clone(),
        })
        .collect()
}

fn bench_normalize(c: &mut Criterion) {
    let normalizer = TextNormalizer::new();
    c.bench_function("normalize_name", |b| {
        b.iter(|| normalizer.normalize(black_box("  אנטריקוט  בקר פרימיום ויקטורי ₪68.90 ")));
    });
}

fn bench_merge(c: &mut Criterion) {
    let normalizer = TextNormalizer::new();
    let unifier = Unifier::new();
    let mut group = c.benchmark_group("unifier_merge");

    for size in [100usize, 1_000, 5_000] {
        let records = validate(&normalizer, &listings(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &records, |b, records| {
            b.iter(|| unifier.merge(black_box(records)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_normalize, bench_merge);
criterion_main!(benches);
