//! Core infrastructure shared by all services.
//!
//! This module provides the [`ServiceCore`] struct that centralizes common
//! dependencies (storage and message pipeline) used across the life-support,
//! deadline and research services.

use crate::llm::MessagePipeline;
use crate::storage::SqliteStorage;

/// Core infrastructure shared by all services.
///
/// # Example
///
/// ```ignore
/// pub struct MyService {
///     core: ServiceCore,
/// }
///
/// impl MyService {
///     pub async fn run(&self) -> AppResult<()> {
///         let logs = self.core.storage().get_life_logs_since(day).await?;
///         let reply = self.core.pipeline().generate(&request).await;
///         Ok(())
///     }
/// }
/// ```
#[derive(Clone)]
pub struct ServiceCore {
    /// Storage backend for persisting data.
    storage: SqliteStorage,
    /// Fallback chain used for every generated text.
    pipeline: MessagePipeline,
}

impl ServiceCore {
    /// Create a new core with the given storage and pipeline.
    pub fn new(storage: SqliteStorage, pipeline: MessagePipeline) -> Self {
        Self { storage, pipeline }
    }

    /// Get a reference to the storage backend.
    #[inline]
    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    /// Get a reference to the message pipeline.
    #[inline]
    pub fn pipeline(&self) -> &MessagePipeline {
        &self.pipeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_core_accessors() {
        let storage = SqliteStorage::new_in_memory().await.unwrap();
        let core = ServiceCore::new(storage, MessagePipeline::new(Vec::new()));
        assert!(core.pipeline().strategy_names().is_empty());

        let cloned = core.clone();
        assert!(cloned.storage().pool().acquire().await.is_ok());
    }
}
