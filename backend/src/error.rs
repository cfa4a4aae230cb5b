//! Error types for the admin server.

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdminError>;

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Row {id} not found in table {table}")]
    RowNotFound { table: String, id: String },

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Invalid row: {0}")]
    InvalidRow(String),

    #[error("Upload rejected: {0}")]
    Upload(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Worker pool unavailable: {0}")]
    Blocking(#[from] actix_web::error::BlockingError),
}

impl AdminError {
    /// Builds the error response the handlers return, `Error: <message>` with
    /// the matching status.
    pub fn to_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).body(format!("Error: {}", self))
    }

    /// HTTP status used by the handlers when this error reaches the client.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AdminError::TableNotFound(_) | AdminError::RowNotFound { .. } => StatusCode::NOT_FOUND,
            AdminError::InvalidIdentifier(_)
            | AdminError::InvalidRow(_)
            | AdminError::Upload(_) => StatusCode::BAD_REQUEST,
            AdminError::Storage(_)
            | AdminError::Csv(_)
            | AdminError::Io(_)
            | AdminError::Blocking(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
