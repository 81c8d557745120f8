//! 스크래핑 세션 모델
//!
//! One coordinator run. The session is owned and mutated only by the
//! coordinator task; collectors hand back plain results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::records::SourceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Running,
    Completed,
    Failed,
}

/// Run-level quality and timing figures
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Mean collector response time in milliseconds
    pub avg_response_time: f64,
    /// Fraction of collectors that succeeded, in `[0, 1]`
    pub success_rate: f64,
    /// Mean best confidence over the unified catalog
    pub data_quality_score: f64,
}

/// Per-session counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStatistics {
    pub raw_records: usize,
    pub accepted_records: usize,
    pub rejected_records: usize,
    pub merge_inconsistencies: usize,
    pub records_per_source: BTreeMap<SourceId, usize>,
    pub response_time_ms: BTreeMap<SourceId, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapingSession {
    pub id: String,
    pub status: SessionStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub scrapers_run: Vec<SourceId>,
    pub failed_sources: Vec<SourceId>,
    pub total_products: usize,
    pub validation_score: f64,
    pub errors: Vec<String>,
    pub performance_metrics: PerformanceMetrics,
    pub statistics: SessionStatistics,
}

impl ScrapingSession {
    /// Generates a session id of the form `session_<millis>_<suffix>`
    pub fn generate_id() -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("session_{}_{}", Utc::now().timestamp_millis(), &suffix[..8])
    }

    pub fn start(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: SessionStatus::Running,
            start_time: Utc::now(),
            end_time: None,
            scrapers_run: Vec::new(),
            failed_sources: Vec::new(),
            total_products: 0,
            validation_score: 0.0,
            errors: Vec::new(),
            performance_metrics: PerformanceMetrics::default(),
            statistics: SessionStatistics::default(),
        }
    }

    pub fn record_success(&mut self, source_id: &SourceId, records: usize, elapsed_ms: u64) {
        self.scrapers_run.push(source_id.clone());
        self.statistics.records_per_source.insert(source_id.clone(), records);
        self.statistics.response_time_ms.insert(source_id.clone(), elapsed_ms);
    }

    pub fn record_failure(&mut self, source_id: &SourceId, error: impl std::fmt::Display, elapsed_ms: u64) {
        self.failed_sources.push(source_id.clone());
        self.errors.push(format!("{source_id}: {error}"));
        self.statistics.response_time_ms.insert(source_id.clone(), elapsed_ms);
    }

    pub fn complete(&mut self) {
        self.status = SessionStatus::Completed;
        self.end_time = Some(Utc::now());
    }

    pub fn fail(&mut self, error: impl std::fmt::Display) {
        self.status = SessionStatus::Failed;
        self.errors.push(error.to_string());
        self.end_time = Some(Utc::now());
    }

    pub const fn is_finished(&self) -> bool {
        !matches!(self.status, SessionStatus::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_lifecycle() {
        let mut session = ScrapingSession::start(ScrapingSession::generate_id());
        assert!(session.id.starts_with("session_"));
        assert_eq!(session.status, SessionStatus::Running);
        assert!(session.end_time.is_none());

        let victory = SourceId::new("victory");
        let mega = SourceId::new("mega");
        session.record_success(&victory, 12, 340);
        session.record_failure(&mega, "timed out after 60s", 60_000);
        session.complete();

        assert!(session.is_finished());
        assert!(session.end_time.is_some());
        assert_eq!(session.scrapers_run, vec![victory.clone()]);
        assert_eq!(session.failed_sources, vec![mega]);
        assert_eq!(session.errors, vec!["mega: timed out after 60s".to_string()]);
        assert_eq!(session.statistics.records_per_source.get(&victory), Some(&12));
    }

    #[test]
    fn test_failed_session_keeps_error() {
        let mut session = ScrapingSession::start("session_test");
        session.fail("invalid coordinator settings");
        assert_eq!(session.status, SessionStatus::Failed);
        assert!(session.end_time.is_some());
        assert_eq!(session.errors.len(), 1);
    }
}
