//! Error types for the library server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Error codes reported in the response body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    DbFailure = 3,
    NoSuchData = 5,
    BookNotAvailable = 7,
    Duplicate = 8,
    BadValue = 18,
    MailFailure = 22,
}

/// Catalog rules a request can break
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusinessRule {
    #[error("Isbn already registered.")]
    DuplicateIsbn,
    #[error("Book already loaned")]
    BookAlreadyLoaned,
    #[error("Book has loans and cannot be deleted")]
    BookHasLoans,
}

impl BusinessRule {
    pub fn code(self) -> ErrorCode {
        match self {
            BusinessRule::DuplicateIsbn => ErrorCode::Duplicate,
            BusinessRule::BookAlreadyLoaned => ErrorCode::BookNotAvailable,
            BusinessRule::BookHasLoans => ErrorCode::Failure,
        }
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Business rule violation: {0}")]
    BusinessRule(#[from] BusinessRule),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Mail error: {0}")]
    Mail(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn duplicate_isbn() -> Self {
        BusinessRule::DuplicateIsbn.into()
    }

    pub fn book_already_loaned() -> Self {
        BusinessRule::BookAlreadyLoaned.into()
    }

    pub fn book_has_loans() -> Self {
        BusinessRule::BookHasLoans.into()
    }

    /// Messages reported to the caller, in the shape used for every error
    pub fn messages(&self) -> Vec<String> {
        match self {
            AppError::Validation(messages) => messages.clone(),
            AppError::NotFound(msg) | AppError::BadRequest(msg) => vec![msg.clone()],
            AppError::BusinessRule(rule) => vec![rule.to_string()],
            AppError::Mail(_) => vec!["Mail delivery failed".to_string()],
            AppError::Database(_) => vec!["Database error".to_string()],
            AppError::InvalidArgument(_) | AppError::Internal(_) => {
                vec!["Internal server error".to_string()]
            }
        }
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub errors: Vec<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchData),
            AppError::Validation(_) | AppError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue)
            }
            AppError::BusinessRule(rule) => (StatusCode::BAD_REQUEST, rule.code()),
            AppError::InvalidArgument(msg) => {
                tracing::error!("Invalid argument: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::Failure)
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::DbFailure)
            }
            AppError::Mail(msg) => {
                tracing::error!("Mail error: {}", msg);
                (StatusCode::BAD_GATEWAY, ErrorCode::MailFailure)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::Failure)
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            errors: self.messages(),
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
