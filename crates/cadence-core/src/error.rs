use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("Migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Series {0} does not recur; occurrence operations need a recurring series.")]
    NotRecurring(Uuid),

    #[error("Concurrent modification: {0}")]
    Conflict(String),
}

impl CoreError {
    /// Input was rejected before any state change.
    pub fn is_validation(&self) -> bool {
        matches!(self, CoreError::InvalidInput(_) | CoreError::NotRecurring(_))
    }

    /// The failure came from the store rather than from the request.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            CoreError::Database(_) | CoreError::Migration(_) | CoreError::Io(_) | CoreError::Conflict(_)
        )
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        CoreError::InvalidInput(reason.into())
    }

    pub(crate) fn series_not_found(id: Uuid) -> Self {
        CoreError::NotFound(format!("Series with id {} not found", id))
    }
}
