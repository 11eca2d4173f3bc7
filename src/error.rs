//! Error types for the expense tracker library.

/// All errors that can occur when using the expense tracker.
#[derive(Debug, thiserror::Error)]
pub enum ExpenseError {
    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Key-value storage backend failed.
    #[error("storage error: {0}")]
    Storage(Box<dyn core::error::Error + Send + Sync>),

    /// A monthly budget must be a finite amount greater than zero.
    #[error("invalid monthly budget {0}: must be greater than zero")]
    InvalidBudget(f64),

    /// Required configuration could not be resolved.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, ExpenseError>;
