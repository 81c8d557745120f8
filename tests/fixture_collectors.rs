//! End-to-end session over the bundled Victory and Mega listings

use std::sync::Arc;
use std::time::Duration;

use basarometer_core::infrastructure::build_collectors;
use basarometer_core::infrastructure::config::AppConfig;
use basarometer_core::{Coordinator, SessionRegistry, SourceId};

fn unpaced_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.coordinator.stagger_offset_ms = 0;
    for collector in &mut config.collectors {
        collector.request_delay_ms = Some(0);
    }
    config
}

#[tokio::test]
async fn test_reference_sources_unify_shared_products() {
    let config = unpaced_config();
    let coordinator = Coordinator::new(build_collectors(&config).unwrap(), config.coordinator_settings())
        .with_registry(Arc::new(SessionRegistry::new()));

    let outcome = coordinator.run_session().await.unwrap();
    let session = &outcome.session;

    assert_eq!(session.scrapers_run, vec![SourceId::new("victory"), SourceId::new("mega")]);
    assert!(session.errors.is_empty());
    assert_eq!(session.statistics.raw_records, 21);
    assert_eq!(session.statistics.rejected_records, 0);
    assert_eq!(outcome.catalog.len(), 18);

    let entrecote = outcome
        .catalog
        .iter()
        .find(|p| p.display_name == "אנטריקוט בקר פרימיום")
        .unwrap();
    assert_eq!(entrecote.member_count, 2);
    assert_eq!(entrecote.source_prices.get(&SourceId::new("victory")), Some(&68.90));
    assert_eq!(entrecote.source_prices.get(&SourceId::new("mega")), Some(&59.90));
    assert_eq!(entrecote.category.as_str(), "beef");
    assert_eq!(entrecote.quality_grade.as_str(), "premium");

    let sausage = outcome.catalog.iter().find(|p| p.display_name == "נקניק בקר").unwrap();
    assert_eq!(sausage.contributing_sources.len(), 2);

    let quality = session.performance_metrics.data_quality_score;
    assert!(quality > 0.6 && quality <= 1.0);
    assert!(session.performance_metrics.avg_response_time < Duration::from_secs(5).as_secs_f64() * 1000.0);
}

#[tokio::test]
async fn test_missing_fixture_is_isolated_to_its_source() {
    let mut config = unpaced_config();
    config.collectors[0].fixture_path = Some("/nonexistent/victory.json".into());
    let coordinator = Coordinator::new(build_collectors(&config).unwrap(), config.coordinator_settings())
        .with_registry(Arc::new(SessionRegistry::new()));

    let outcome = coordinator.run_session().await.unwrap();

    assert_eq!(outcome.session.scrapers_run, vec![SourceId::new("mega")]);
    assert_eq!(outcome.session.errors.len(), 1);
    assert!(outcome.session.errors[0].contains("fixture unavailable"));
    assert_eq!(outcome.catalog.len(), 11);
}
