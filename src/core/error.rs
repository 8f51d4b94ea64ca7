use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

/// Error type shared by the catalog, order and storage layers
#[derive(Debug, Error)]
pub enum StoreError {
    /// Request body or parameter failed validation
    #[error("Validation error: {0}")]
    Validation(String),
    /// Requested row does not exist
    #[error("{0} not found")]
    NotFound(String),
    /// Write would break a uniqueness or reference rule
    #[error("Conflict: {0}")]
    Conflict(String),
    /// Missing or invalid admin session
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// SQLite failure
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Anything else
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        StoreError::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        StoreError::NotFound(what.into())
    }

    /// Machine-readable code carried in JSON error bodies
    pub fn error_code(&self) -> &'static str {
        match self {
            StoreError::Validation(_) => "VALIDATION_FAILED",
            StoreError::NotFound(_) => "NOT_FOUND",
            StoreError::Conflict(_) => "CONFLICT",
            StoreError::Unauthorized(_) => "UNAUTHORIZED",
            StoreError::Storage(_) => "STORAGE_FAILED",
            StoreError::Io(_) => "IO_FAILED",
            StoreError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub error_code: String,
}

impl ResponseError for StoreError {
    fn status_code(&self) -> StatusCode {
        match self {
            StoreError::Validation(_) => StatusCode::BAD_REQUEST,
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::Conflict(_) => StatusCode::CONFLICT,
            StoreError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            StoreError::Storage(_) | StoreError::Io(_) | StoreError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Storage internals stay in the log, not in the response
        let error = match self {
            StoreError::Storage(e) => {
                log::error!("Storage failure: {}", e);
                "Storage failure".to_string()
            }
            StoreError::Io(e) => {
                log::error!("I/O failure: {}", e);
                "File storage failure".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            success: false,
            error,
            error_code: self.error_code().to_string(),
        })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
