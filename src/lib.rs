//! Basarometer core - cross-retailer meat price catalog
//!
//! Collects raw product listings from Israeli retail sources, normalizes the
//! Hebrew product names into a canonical meat taxonomy, validates them and
//! merges listings of the same product into a unified catalog carrying one
//! price per retailer.

// Module declarations
pub mod domain;
pub mod application;
pub mod infrastructure;

// Re-export the main entry points
pub use application::coordinator::{
    Coordinator, CoordinatorError, CoordinatorSettings, CoordinatorState, SessionOutcome,
};
pub use application::session_registry::{SessionLease, SessionRegistry};
pub use domain::records::{RawRecord, SourceId};
pub use domain::product::{UnifiedProduct, ValidatedRecord};
pub use domain::services::collector::SourceCollector;
