//! Domain module - Core business logic and entities
//!
//! Records flowing through the pipeline, the canonical taxonomy, the session
//! model and the pure services (normalizer, validator, unifier) together with
//! the collector contract every retail source implements.

pub mod errors;
pub mod product;
pub mod records;
pub mod services;
pub mod session;
pub mod taxonomy;

// Re-export commonly used items for convenience
pub use errors::{
    CollectorError, CollectorErrorKind, MergeInconsistency, PipelineError, SessionConflictError,
    ValidationRejection,
};
pub use product::{
    NormalizedAttributes, PriceRange, ProductMetadata, UnifiedProduct, ValidatedRecord, Weight,
    WeightUnit,
};
pub use records::{RawRecord, SourceId};
pub use session::{PerformanceMetrics, ScrapingSession, SessionStatistics, SessionStatus};
pub use taxonomy::{KosherCertification, MeatCategory, MeatCut, ProcessingMethod, QualityGrade};
