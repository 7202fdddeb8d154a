use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Rejected user input. Nothing is persisted when one of these is returned.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} - {reason}")]
    Field { field: String, reason: String },

    #[error("{}", .0.join("; "))]
    Multiple(Vec<String>),
}

/// Storage layer errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database connection failed: {message}")]
    Connection { message: String },

    #[error("Query failed: {message}")]
    Query { message: String },

    #[error("Record not found: {table}/{id}")]
    RecordNotFound { table: &'static str, id: String },

    #[error("Migration failed: {message}")]
    Migration { message: String },

    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Errors from the message generation backends.
///
/// Strategy-level variants never reach end users: the pipeline logs them and
/// moves on to the next strategy. `Exhausted` is the terminal case returned
/// when every model strategy has been tried.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Endpoint unreachable: {endpoint}")]
    Unreachable { endpoint: String },

    #[error("Backend not configured: {backend}")]
    NotConfigured { backend: String },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("All model strategies failed (attempted: {})", attempted.join(", "))]
    Exhausted { attempted: Vec<String> },
}

impl ValidationError {
    /// Shorthand for a single-field violation.
    pub fn field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::Field {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Individual messages, for displaying one per line.
    pub fn messages(&self) -> Vec<String> {
        match self {
            ValidationError::Field { field, reason } => vec![format!("{}: {}", field, reason)],
            ValidationError::Multiple(messages) => messages.clone(),
        }
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for generation backends
pub type LlmResult<T> = Result<T, LlmError>;
