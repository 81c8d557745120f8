//! Application layer module
//!
//! Session orchestration and the data transfer objects produced for callers.

pub mod coordinator;
pub mod dto;
pub mod session_registry;

pub use coordinator::{Coordinator, CoordinatorError, CoordinatorSettings, CoordinatorState, SessionOutcome};
pub use dto::{IngestionProduct, IngestionReport, SessionReport};
pub use session_registry::{SessionLease, SessionRegistry, session_registry};
