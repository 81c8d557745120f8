//! 스크래핑 세션 코디네이터
//!
//! Runs one session end to end: fan out to every registered collector
//! (staggered start, bounded concurrency, per-collector timeout), fan the
//! results back in, then normalize, validate and unify them into the catalog.
//!
//! State machine: `Idle -> Running -> Completed | Failed`. A collector failure
//! is recorded in the session and never aborts it; only a [`PipelineError`]
//! moves a running session to `Failed`.

use futures::future::join_all;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex as AsyncMutex, Semaphore, watch};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::application::session_registry::{SessionRegistry, session_registry};
use crate::domain::errors::{
    CollectorError, CollectorErrorKind, PipelineError, SessionConflictError, ValidationRejection,
};
use crate::domain::product::{UnifiedProduct, ValidatedRecord, Weight};
use crate::domain::records::{RawRecord, SourceId};
use crate::domain::services::collector::SourceCollector;
use crate::domain::services::text_normalizer::TextNormalizer;
use crate::domain::services::unifier::Unifier;
use crate::domain::services::validator::Validator;
use crate::domain::session::{PerformanceMetrics, ScrapingSession, SessionStatistics};
use crate::infrastructure::config::defaults;

/// Keeps at least `offset` between the actual starts of consecutive collectors,
/// including collectors that waited on the concurrency cap
struct StartGate {
    offset: Duration,
    last_start: AsyncMutex<Option<Instant>>,
}

impl StartGate {
    fn new(offset: Duration) -> Self {
        Self { offset, last_start: AsyncMutex::new(None) }
    }

    async fn admit(&self) {
        let mut last_start = self.last_start.lock().await;
        if let Some(previous) = *last_start {
            tokio::time::sleep_until(previous + self.offset).await;
        }
        *last_start = Some(Instant::now());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorSettings {
    /// Delay between the starts of consecutive collectors
    pub stagger_offset: Duration,
    /// Overrides every collector's own timeout when set
    pub collector_timeout: Option<Duration>,
    pub max_concurrent_collectors: usize,
    pub acceptance_threshold: f64,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            stagger_offset: Duration::from_millis(defaults::STAGGER_OFFSET_MS),
            collector_timeout: None,
            max_concurrent_collectors: defaults::MAX_CONCURRENT_COLLECTORS,
            acceptance_threshold: defaults::ACCEPTANCE_THRESHOLD,
        }
    }
}

impl CoordinatorSettings {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.max_concurrent_collectors == 0 {
            return Err(PipelineError::InvalidSettings {
                message: "max_concurrent_collectors must be greater than 0".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.acceptance_threshold) {
            return Err(PipelineError::InvalidSettings {
                message: format!(
                    "acceptance_threshold must be within [0, 1], got {}",
                    self.acceptance_threshold
                ),
            });
        }
        if self.collector_timeout.is_some_and(|t| t.is_zero()) {
            return Err(PipelineError::InvalidSettings {
                message: "collector_timeout must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CoordinatorState {
    Idle,
    Running { session_id: String },
    Completed { session_id: String },
    Failed { session_id: String, error: String },
}

#[derive(Error, Debug)]
pub enum CoordinatorError {
    #[error(transparent)]
    Conflict(#[from] SessionConflictError),

    #[error("session '{}' failed: {source}", .session.id)]
    SessionFailed {
        session: Box<ScrapingSession>,
        source: PipelineError,
    },
}

/// A completed session and the catalog it produced
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub session: ScrapingSession,
    pub catalog: Vec<UnifiedProduct>,
}

/// Result of one collector task
struct CollectorRun {
    source_id: SourceId,
    result: Result<Vec<RawRecord>, CollectorError>,
    elapsed: Duration,
}

pub struct Coordinator {
    collectors: Vec<Arc<dyn SourceCollector>>,
    settings: CoordinatorSettings,
    normalizer: TextNormalizer,
    validator: Validator,
    unifier: Unifier,
    registry: Arc<SessionRegistry>,
    state: watch::Sender<CoordinatorState>,
    last_session: Mutex<Option<ScrapingSession>>,
}

impl Coordinator {
    /// Coordinator bound to the process-wide session registry
    pub fn new(collectors: Vec<Arc<dyn SourceCollector>>, settings: CoordinatorSettings) -> Self {
        Self {
            collectors,
            validator: Validator::new(settings.acceptance_threshold),
            settings,
            normalizer: TextNormalizer::new(),
            unifier: Unifier::new(),
            registry: session_registry(),
            state: watch::channel(CoordinatorState::Idle).0,
            last_session: Mutex::new(None),
        }
    }

    /// Uses a private registry instead of the process-wide one
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<SessionRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn state(&self) -> CoordinatorState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CoordinatorState> {
        self.state.subscribe()
    }

    pub fn last_session(&self) -> Option<ScrapingSession> {
        self.last_session
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Runs one full session.
    ///
    /// Fails fast with [`CoordinatorError::Conflict`] when another session is
    /// running; in that case no state is touched.
    pub async fn run_session(&self) -> Result<SessionOutcome, CoordinatorError> {
        let session_id = ScrapingSession::generate_id();
        let lease = self.registry.try_acquire(&session_id).map_err(|conflict| {
            warn!("⚠️ Session request rejected: {}", conflict);
            conflict
        })?;

        let mut session = ScrapingSession::start(lease.session_id());
        self.state.send_replace(CoordinatorState::Running {
            session_id: session.id.clone(),
        });
        info!(
            "🚀 Starting scraping session {} with {} collectors",
            session.id,
            self.collectors.len()
        );

        let result = self.execute(&mut session).await;

        let (final_state, outcome) = match result {
            Ok(catalog) => {
                session.complete();
                info!(
                    "🎯 Session {} completed: {} products from {}/{} sources (quality {:.2})",
                    session.id,
                    session.total_products,
                    session.scrapers_run.len(),
                    self.collectors.len(),
                    session.performance_metrics.data_quality_score
                );
                (
                    CoordinatorState::Completed { session_id: session.id.clone() },
                    Ok(SessionOutcome { session: session.clone(), catalog }),
                )
            }
            Err(source) => {
                error!("💥 Session {} failed: {}", session.id, source);
                session.fail(&source);
                (
                    CoordinatorState::Failed {
                        session_id: session.id.clone(),
                        error: source.to_string(),
                    },
                    Err(CoordinatorError::SessionFailed {
                        session: Box::new(session.clone()),
                        source,
                    }),
                )
            }
        };

        *self
            .last_session
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(session);
        drop(lease);
        self.state.send_replace(final_state);
        outcome
    }

    async fn execute(
        &self,
        session: &mut ScrapingSession,
    ) -> Result<Vec<UnifiedProduct>, PipelineError> {
        self.settings.validate()?;

        let runs = self.collect_all().await?;
        let total_collectors = runs.len();
        let mut raw_records = Vec::new();
        let mut response_time_total_ms = 0.0;

        for run in runs {
            let elapsed_ms = u64::try_from(run.elapsed.as_millis()).unwrap_or(u64::MAX);
            response_time_total_ms += run.elapsed.as_secs_f64() * 1000.0;
            match run.result {
                Ok(records) => {
                    info!(
                        "✅ {} returned {} records in {}ms",
                        run.source_id,
                        records.len(),
                        elapsed_ms
                    );
                    session.record_success(&run.source_id, records.len(), elapsed_ms);
                    raw_records.extend(records);
                }
                Err(err) => {
                    warn!("❌ {}", err);
                    session.record_failure(&run.source_id, &err.kind, elapsed_ms);
                }
            }
        }

        let validated = self.validate_records(raw_records, &mut session.statistics);
        let merged = self.unifier.merge(&validated);
        session.statistics.merge_inconsistencies = merged.inconsistencies.len();
        session.total_products = merged.products.len();
        session.validation_score = mean(validated.iter().map(|r| r.confidence));
        session.performance_metrics = PerformanceMetrics {
            avg_response_time: if total_collectors == 0 {
                0.0
            } else {
                response_time_total_ms / total_collectors as f64
            },
            success_rate: if total_collectors == 0 {
                0.0
            } else {
                session.scrapers_run.len() as f64 / total_collectors as f64
            },
            data_quality_score: mean(merged.products.iter().map(|p| p.best_confidence)),
        };

        Ok(merged.products)
    }

    /// Fan-out/fan-in over every collector
    async fn collect_all(&self) -> Result<Vec<CollectorRun>, PipelineError> {
        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrent_collectors));
        let gate = Arc::new(StartGate::new(self.settings.stagger_offset));
        let mut tasks = Vec::with_capacity(self.collectors.len());

        for (index, collector) in self.collectors.iter().enumerate() {
            let collector = Arc::clone(collector);
            let semaphore = Arc::clone(&semaphore);
            let gate = Arc::clone(&gate);
            let source_id = collector.source_id().clone();
            let start_delay = self
                .settings
                .stagger_offset
                .saturating_mul(u32::try_from(index).unwrap_or(u32::MAX));
            let limit = self.settings.collector_timeout.unwrap_or_else(|| collector.timeout());

            let task = tokio::spawn(async move {
                if !start_delay.is_zero() {
                    tokio::time::sleep(start_delay).await;
                }
                let _permit = semaphore.acquire_owned().await.map_err(|e| e.to_string())?;
                gate.admit().await;
                debug!("🔓 {} started (timeout {:?})", collector.source_id(), limit);

                let started = Instant::now();
                let result = match tokio::time::timeout(limit, collector.fetch()).await {
                    Ok(result) => result,
                    Err(_) => Err(CollectorError::new(
                        collector.source_id().clone(),
                        CollectorErrorKind::Timeout(limit),
                    )),
                };
                Ok::<_, String>(CollectorRun {
                    source_id: collector.source_id().clone(),
                    result,
                    elapsed: started.elapsed(),
                })
            });
            tasks.push((source_id, task));
        }

        let (source_ids, handles): (Vec<_>, Vec<_>) = tasks.into_iter().unzip();
        let joined = join_all(handles).await;

        let mut runs = Vec::with_capacity(joined.len());
        for (source_id, joined) in source_ids.into_iter().zip(joined) {
            match joined {
                Ok(Ok(run)) => runs.push(run),
                Ok(Err(message)) => return Err(PipelineError::Scheduler { message }),
                Err(join_error) => {
                    error!("❌ Collector task {} aborted: {}", source_id, join_error);
                    runs.push(CollectorRun {
                        result: Err(CollectorError::new(source_id.clone(), CollectorErrorKind::Panicked)),
                        source_id,
                        elapsed: Duration::ZERO,
                    });
                }
            }
        }
        Ok(runs)
    }

    /// Normalizes and validates raw records, keeping only those that pass the gate
    fn validate_records(
        &self,
        raw_records: Vec<RawRecord>,
        stats: &mut SessionStatistics,
    ) -> Vec<ValidatedRecord> {
        stats.raw_records += raw_records.len();
        let mut accepted = Vec::with_capacity(raw_records.len());

        for raw in raw_records {
            match self.validate_record(raw) {
                Ok(record) => accepted.push(record),
                Err(rejection) => {
                    stats.rejected_records += 1;
                    debug!("🚫 {}", rejection);
                }
            }
        }

        stats.accepted_records += accepted.len();
        accepted
    }

    fn validate_record(&self, raw: RawRecord) -> Result<ValidatedRecord, ValidationRejection> {
        let mut attributes = self.normalizer.normalize(&raw.name);
        if !attributes.category.is_known() {
            if let Some(hint) = raw.category_hint.as_deref() {
                attributes.category = self.normalizer.category_of(&hint.to_lowercase());
            }
        }

        let price = self.normalizer.extract_price(&raw.price_text);
        let weight = self.resolve_weight(&raw);
        let outcome = self.validator.validate(
            &attributes.normalized_name,
            price,
            Some(&weight),
            attributes.category,
        );

        let price = match price {
            Some(price) if self.validator.accepts(&outcome) => price,
            _ => {
                return Err(ValidationRejection {
                    name: raw.name,
                    confidence: outcome.confidence,
                    issues: outcome.issues,
                });
            }
        };

        let source_confidence = raw
            .source_confidence
            .filter(|c| c.is_finite())
            .map_or(1.0, |c| c.clamp(0.0, 1.0));

        Ok(ValidatedRecord {
            original_price: raw
                .original_price_text
                .as_deref()
                .and_then(|text| self.normalizer.extract_price(text)),
            kosher: raw
                .kosher_text
                .as_deref()
                .and_then(|text| self.normalizer.extract_kosher(text)),
            brand: raw.brand.as_deref().and_then(|text| self.normalizer.map_brand(text)),
            attributes,
            price,
            weight,
            confidence: outcome.confidence * source_confidence,
            issues: outcome.issues,
            raw,
        })
    }

    /// Weight from the dedicated field, falling back to the product name
    fn resolve_weight(&self, raw: &RawRecord) -> Weight {
        raw.weight_text
            .as_deref()
            .map(|text| self.normalizer.extract_weight(text))
            .filter(Weight::is_known)
            .unwrap_or_else(|| self.normalizer.extract_weight(&raw.name))
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::WeightUnit;

    fn coordinator() -> Coordinator {
        Coordinator::new(Vec::new(), CoordinatorSettings::default())
            .with_registry(Arc::new(SessionRegistry::new()))
    }

    #[test]
    fn test_settings_validation() {
        assert!(CoordinatorSettings::default().validate().is_ok());

        let zero_concurrency = CoordinatorSettings {
            max_concurrent_collectors: 0,
            ..CoordinatorSettings::default()
        };
        assert!(zero_concurrency.validate().is_err());

        let bad_threshold = CoordinatorSettings {
            acceptance_threshold: 1.5,
            ..CoordinatorSettings::default()
        };
        assert!(bad_threshold.validate().is_err());
    }

    #[test]
    fn test_record_pipeline_scales_by_source_confidence() {
        let raw = RawRecord::new(SourceId::new("victory"), "אנטריקוט בקר", "₪68.90")
            .with_weight("1 ק\"ג")
            .with_kosher("מהדרין")
            .with_source_confidence(0.9);

        let record = coordinator().validate_record(raw).unwrap();
        assert!((record.price - 68.90).abs() < 1e-9);
        assert_eq!(record.weight, Weight::new(1.0, WeightUnit::Kilogram));
        assert!((record.confidence - 0.9).abs() < 1e-9);
        assert!(record.kosher.is_some());
    }

    #[test]
    fn test_rejected_records_are_counted() {
        let mut stats = SessionStatistics::default();
        let records = vec![
            RawRecord::new(SourceId::new("mega"), "", "0"),
            RawRecord::new(SourceId::new("mega"), "שוקיים עוף", "₪24.90"),
        ];
        let accepted = coordinator().validate_records(records, &mut stats);

        assert_eq!(accepted.len(), 1);
        assert_eq!(stats.raw_records, 2);
        assert_eq!(stats.accepted_records, 1);
        assert_eq!(stats.rejected_records, 1);
    }

    #[test]
    fn test_category_hint_fills_unknown_category() {
        let raw = RawRecord::new(SourceId::new("victory"), "אנטריקוט פרימיום", "₪99.90")
            .with_category_hint("meat-beef");
        let record = coordinator().validate_record(raw).unwrap();
        assert_eq!(record.attributes.category.as_str(), "beef");
    }

    #[test]
    fn test_weight_falls_back_to_name() {
        let raw = RawRecord::new(SourceId::new("mega"), "קבב טלה 400 גרם", "₪32");
        let weight = coordinator().resolve_weight(&raw);
        assert_eq!(weight, Weight::new(400.0, WeightUnit::Gram));
    }
}
