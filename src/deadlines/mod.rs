//! External deadlines, drafted documents and contacts.

mod contacts;
mod documents;
mod manager;
pub mod priority;

pub use contacts::{EmergencyContacts, PUBLIC_SUPPORT_RESOURCES};
pub use documents::{application_template, email_template, Draft};
pub use priority::{DeadlineStats, FocusTask, TodayFocus};

use crate::core::ServiceCore;
use crate::error::{AppError, StorageError};

/// Deadline, document and contact service.
#[derive(Clone)]
pub struct DeadlineService {
    core: ServiceCore,
}

impl DeadlineService {
    /// Create a new deadline service.
    pub fn new(core: ServiceCore) -> Self {
        Self { core }
    }
}

/// Map a missing-row storage error onto `AppError::NotFound`.
fn not_found(entity: &'static str) -> impl FnOnce(StorageError) -> AppError {
    move |err| match err {
        StorageError::RecordNotFound { id, .. } => AppError::NotFound { entity, id },
        other => AppError::Storage(other),
    }
}
