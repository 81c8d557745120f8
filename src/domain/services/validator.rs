//! Record validation and confidence scoring
//!
//! Confidence starts at 1.0 and every detected issue subtracts its fixed cost,
//! never going below zero. A record is accepted only when it has no issues
//! and its confidence is strictly above the acceptance threshold.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::product::Weight;
use crate::domain::services::text_normalizer::has_hebrew;
use crate::domain::taxonomy::MeatCategory;

pub const DEFAULT_ACCEPTANCE_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationIssue {
    MissingHebrewName,
    InvalidPrice,
    MissingWeight,
    UnknownCategory,
}

impl ValidationIssue {
    pub const fn cost(self) -> f64 {
        match self {
            Self::MissingHebrewName => 0.3,
            Self::InvalidPrice => 0.2,
            Self::MissingWeight => 0.1,
            Self::UnknownCategory => 0.2,
        }
    }

    pub const fn description(&self) -> &'static str {
        match self {
            Self::MissingHebrewName => "Missing or invalid Hebrew name",
            Self::InvalidPrice => "Invalid price",
            Self::MissingWeight => "Missing weight information",
            Self::UnknownCategory => "Unable to determine meat category",
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub is_valid: bool,
    pub confidence: f64,
    pub issues: Vec<ValidationIssue>,
}

impl Default for ValidationOutcome {
    fn default() -> Self {
        Self { is_valid: true, confidence: 1.0, issues: Vec::new() }
    }
}

impl ValidationOutcome {
    /// Records an issue; confidence only ever goes down
    pub fn push_issue(&mut self, issue: ValidationIssue) {
        self.confidence = (self.confidence - issue.cost()).max(0.0);
        self.issues.push(issue);
        self.is_valid = false;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Validator {
    acceptance_threshold: f64,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(DEFAULT_ACCEPTANCE_THRESHOLD)
    }
}

impl Validator {
    pub const fn new(acceptance_threshold: f64) -> Self {
        Self { acceptance_threshold }
    }

    pub const fn acceptance_threshold(&self) -> f64 {
        self.acceptance_threshold
    }

    pub fn validate(
        &self,
        name: &str,
        price: Option<f64>,
        weight: Option<&Weight>,
        category: MeatCategory,
    ) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::default();

        if name.trim().is_empty() || !has_hebrew(name) {
            outcome.push_issue(ValidationIssue::MissingHebrewName);
        }
        if !price.is_some_and(|p| p.is_finite() && p > 0.0) {
            outcome.push_issue(ValidationIssue::InvalidPrice);
        }
        if weight.is_none() {
            outcome.push_issue(ValidationIssue::MissingWeight);
        }
        if !category.is_known() {
            outcome.push_issue(ValidationIssue::UnknownCategory);
        }

        outcome
    }

    /// The acceptance gate
    pub fn accepts(&self, outcome: &ValidationOutcome) -> bool {
        outcome.is_valid && outcome.confidence > self.acceptance_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::WeightUnit;

    #[test]
    fn test_clean_record_is_accepted() {
        let validator = Validator::default();
        let weight = Weight::new(1.0, WeightUnit::Kilogram);
        let outcome = validator.validate("אנטריקוט בקר", Some(55.90), Some(&weight), MeatCategory::Beef);

        assert!(outcome.is_valid);
        assert!((outcome.confidence - 1.0).abs() < f64::EPSILON);
        assert!(validator.accepts(&outcome));
    }

    #[test]
    fn test_empty_name_and_zero_price_rejected() {
        let validator = Validator::default();
        let weight = Weight::placeholder();
        let outcome = validator.validate("", None, Some(&weight), MeatCategory::Unknown);

        assert!(!outcome.is_valid);
        assert_eq!(
            outcome.issues,
            vec![
                ValidationIssue::MissingHebrewName,
                ValidationIssue::InvalidPrice,
                ValidationIssue::UnknownCategory,
            ]
        );
        assert!((outcome.confidence - 0.3).abs() < 1e-9);
        assert!(!validator.accepts(&outcome));
    }

    #[test]
    fn test_confidence_never_negative() {
        let outcome = Validator::default().validate("beef", Some(-3.0), None, MeatCategory::Unknown);
        assert_eq!(outcome.issues.len(), 4);
        assert!(outcome.confidence >= 0.0);
        assert!(outcome.confidence < 0.2 + 1e-9);
    }

    #[test]
    fn test_gate_requires_no_issues_even_above_threshold() {
        let validator = Validator::new(0.5);
        let outcome = validator.validate("עוף", Some(20.0), None, MeatCategory::Chicken);
        assert!(outcome.confidence > 0.5);
        assert!(!validator.accepts(&outcome));
    }

    #[test]
    fn test_threshold_is_strict() {
        let validator = Validator::new(1.0);
        let weight = Weight::placeholder();
        let outcome = validator.validate("עוף", Some(20.0), Some(&weight), MeatCategory::Chicken);
        assert!(outcome.is_valid);
        assert!(!validator.accepts(&outcome));
    }
}
