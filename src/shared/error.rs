use thiserror::Error;
use serde::Serialize;

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "detail")]
pub enum AppError {
    /// Rejected locally, never reaches the network
    #[error("Validation Error: {0}")]
    Validation(String),

    /// Completion provider (or the backend mirroring it) answered with a non-success status
    #[error("Provider Error ({status}): {message}")]
    Provider {
        status: u16,
        message: String,
        details: Option<String>,
    },

    /// A success response whose payload does not carry the expected field
    #[error("Malformed Response: {0}")]
    MalformedResponse(String),

    #[error("Transport Error: {0}")]
    Transport(String),

    #[error("Persistence Error: {0}")]
    Persistence(String),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("I/O Error: {0}")]
    Io(String),

    #[error("Unknown Error: {0}")]
    Unknown(String),
}

impl AppError {
    /// Message without the category prefix, used for notices and HTTP bodies
    pub fn message(&self) -> &str {
        match self {
            AppError::Validation(msg)
            | AppError::MalformedResponse(msg)
            | AppError::Transport(msg)
            | AppError::Persistence(msg)
            | AppError::Config(msg)
            | AppError::Io(msg)
            | AppError::Unknown(msg) => msg,
            AppError::Provider { message, .. } => message,
        }
    }
}

// Implement conversion from standard errors
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AppError::MalformedResponse(err.to_string())
        } else {
            AppError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedResponse(format!("Serialization error: {}", err))
    }
}

impl From<redb::DatabaseError> for AppError {
    fn from(err: redb::DatabaseError) -> Self {
        AppError::Persistence(err.to_string())
    }
}

impl From<redb::TransactionError> for AppError {
    fn from(err: redb::TransactionError) -> Self {
        AppError::Persistence(err.to_string())
    }
}

impl From<redb::TableError> for AppError {
    fn from(err: redb::TableError) -> Self {
        AppError::Persistence(err.to_string())
    }
}

impl From<redb::StorageError> for AppError {
    fn from(err: redb::StorageError) -> Self {
        AppError::Persistence(err.to_string())
    }
}

impl From<redb::CommitError> for AppError {
    fn from(err: redb::CommitError) -> Self {
        AppError::Persistence(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
