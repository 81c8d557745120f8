//! Domain services
//!
//! Pure, synchronous processing stages plus the async collector contract.

pub mod collector;
pub mod term_tables;
pub mod text_normalizer;
pub mod unifier;
pub mod validator;

pub use collector::SourceCollector;
pub use text_normalizer::TextNormalizer;
pub use unifier::{MergeOutcome, Unifier};
pub use validator::{ValidationIssue, ValidationOutcome, Validator};
