use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum HorreumError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("{0} is retired; write through the per-guild operations instead")]
    LegacyPath(&'static str),
}

pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for HorreumError {
    fn is_retryable(&self) -> bool {
        match self {
            HorreumError::DatabaseError(e) => {
                matches!(e, sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut)
            }
            HorreumError::IoError(_) => true,
            _ => false,
        }
    }
}
