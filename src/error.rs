use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenServiceError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("row is missing column '{0}'")]
    MissingColumn(String),

    #[error("column '{column}' is not of type {expected}")]
    UnexpectedType {
        column: String,
        expected: &'static str,
    },

    #[error("column '{column}' holds unknown status value {value}")]
    InvalidStatus {
        column: String,
        value: i64,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl TokenServiceError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }
}

pub type Result<T, E = TokenServiceError> = std::result::Result<T, E>;
