//! Shared application state.

use tracing::info;

use crate::config::Config;
use crate::core::ServiceCore;
use crate::deadlines::DeadlineService;
use crate::error::AppResult;
use crate::life::LifeSupport;
use crate::llm::MessagePipeline;
use crate::research::ResearchMemory;
use crate::storage::SqliteStorage;

/// Everything a command or scheduled job needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// SQLite storage backend.
    pub storage: SqliteStorage,
    /// Message generation chain.
    pub pipeline: MessagePipeline,
    /// Wellbeing logging and crisis support.
    pub life: LifeSupport,
    /// Deadlines, drafts and contacts.
    pub deadlines: DeadlineService,
    /// Research fragments and themes.
    pub research: ResearchMemory,
}

impl AppState {
    /// Create new application state
    pub fn new(config: Config, storage: SqliteStorage, pipeline: MessagePipeline) -> Self {
        info!(
            strategies = ?pipeline.strategy_names(),
            database = %config.database.path.display(),
            "AppState initializing"
        );

        let core = ServiceCore::new(storage.clone(), pipeline.clone());

        Self {
            life: LifeSupport::new(core.clone()),
            deadlines: DeadlineService::new(core.clone()),
            research: ResearchMemory::new(core),
            config,
            storage,
            pipeline,
        }
    }

    /// Open the database and build the pipeline described by `config`.
    pub async fn from_config(config: Config) -> AppResult<Self> {
        let storage = SqliteStorage::new(&config.database).await?;
        let pipeline = MessagePipeline::from_config(&config)?;
        Ok(Self::new(config, storage, pipeline))
    }
}
