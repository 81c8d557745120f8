//! Process-wide single-active-session guard
//!
//! At most one scraping session runs per process. A coordinator acquires a
//! [`SessionLease`] before touching any state; the slot is released when the
//! lease is dropped, whichever way the session ended.

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use crate::domain::errors::SessionConflictError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    active: Mutex<Option<ActiveSession>>,
}

static SESSION_REGISTRY: OnceCell<Arc<SessionRegistry>> = OnceCell::new();

/// The registry shared by every coordinator in this process
pub fn session_registry() -> Arc<SessionRegistry> {
    SESSION_REGISTRY
        .get_or_init(|| Arc::new(SessionRegistry::new()))
        .clone()
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<ActiveSession>> {
        // the slot holds plain data, a poisoned lock is still usable
        self.active.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Claims the slot for `session_id`, failing fast if another session holds it
    pub fn try_acquire(
        self: &Arc<Self>,
        session_id: &str,
    ) -> Result<SessionLease, SessionConflictError> {
        let mut slot = self.slot();
        if let Some(active) = slot.as_ref() {
            return Err(SessionConflictError {
                active_session_id: active.session_id.clone(),
            });
        }
        *slot = Some(ActiveSession {
            session_id: session_id.to_string(),
            started_at: Utc::now(),
        });
        debug!("Session slot acquired by {}", session_id);

        Ok(SessionLease {
            registry: Arc::clone(self),
            session_id: session_id.to_string(),
        })
    }

    pub fn active_session(&self) -> Option<ActiveSession> {
        self.slot().clone()
    }

    pub fn is_idle(&self) -> bool {
        self.slot().is_none()
    }

    fn release(&self, session_id: &str) {
        let mut slot = self.slot();
        if slot.as_ref().is_some_and(|active| active.session_id == session_id) {
            *slot = None;
            debug!("Session slot released by {}", session_id);
        }
    }
}

/// Holds the single-session slot until dropped
#[derive(Debug)]
pub struct SessionLease {
    registry: Arc<SessionRegistry>,
    session_id: String,
}

impl SessionLease {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        self.registry.release(&self.session_id);
    }
}
