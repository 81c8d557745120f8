//! Domain error types
//!
//! Collector failures and merge inconsistencies are isolated (recorded in the
//! session, never fatal). Only [`PipelineError`] aborts a running session.

use std::time::Duration;
use thiserror::Error;

use crate::domain::records::SourceId;
use crate::domain::services::validator::ValidationIssue;

/// A source collector run that produced no usable output
#[derive(Error, Debug)]
#[error("collector '{source_id}' failed: {kind}")]
pub struct CollectorError {
    pub source_id: SourceId,
    #[source]
    pub kind: CollectorErrorKind,
}

impl CollectorError {
    pub const fn new(source_id: SourceId, kind: CollectorErrorKind) -> Self {
        Self { source_id, kind }
    }

    pub const fn is_timeout(&self) -> bool {
        matches!(self.kind, CollectorErrorKind::Timeout(_))
    }
}

#[derive(Error, Debug)]
pub enum CollectorErrorKind {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP request failed: {message}")]
    Http { message: String },

    #[error("failed to parse listing: {message}")]
    Parse { message: String },

    #[error("all {attempted} categories failed (last error: {last_error})")]
    AllCategoriesFailed { attempted: usize, last_error: String },

    #[error("fixture unavailable: {message}")]
    Fixture { message: String },

    #[error("collector task panicked")]
    Panicked,
}

/// A record that did not pass the acceptance gate.
///
/// Rejections are counted in the session statistics, never returned as `Err`.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("rejected '{name}' (confidence {confidence:.2}): {}", describe_issues(.issues))]
pub struct ValidationRejection {
    pub name: String,
    pub confidence: f64,
    pub issues: Vec<ValidationIssue>,
}

fn describe_issues(issues: &[ValidationIssue]) -> String {
    if issues.is_empty() {
        return "below acceptance threshold".to_string();
    }
    issues
        .iter()
        .map(ValidationIssue::description)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Another session already holds the single-session slot
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("scraping session '{active_session_id}' is already running")]
pub struct SessionConflictError {
    pub active_session_id: String,
}

/// A merge group whose prices cannot form a coherent unified product
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("inconsistent merge for '{normalized_id}': {reason}")]
pub struct MergeInconsistency {
    pub normalized_id: String,
    pub reason: String,
}

/// Coordinator-internal failure that turns a running session into `Failed`
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid coordinator settings: {message}")]
    InvalidSettings { message: String },

    #[error("collector scheduling failed: {message}")]
    Scheduler { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_error_display_includes_source() {
        let err = CollectorError::new(
            SourceId::new("victory"),
            CollectorErrorKind::Timeout(Duration::from_secs(60)),
        );
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "collector 'victory' failed: timed out after 60s");
    }

    #[test]
    fn test_rejection_lists_issues() {
        let rejection = ValidationRejection {
            name: String::new(),
            confidence: 0.5,
            issues: vec![ValidationIssue::MissingHebrewName, ValidationIssue::InvalidPrice],
        };
        let text = rejection.to_string();
        assert!(text.contains("0.50"));
        assert!(text.contains("Missing or invalid Hebrew name"));
        assert!(text.contains("Invalid price"));
    }
}
