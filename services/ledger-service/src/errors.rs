use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Ledger(#[from] ledger_engine::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let error_message = self.to_string();

        HttpResponse::build(status_code).json(json!({
            "error": {
                "code": status_code.as_u16(),
                "message": error_message,
                "type": self.error_type()
            }
        }))
    }

    fn status_code(&self) -> StatusCode {
        use ledger_engine::Error as LedgerError;

        match self {
            ApiError::Ledger(err) => match err {
                LedgerError::InvalidRequest(_)
                | LedgerError::InvalidAmount(_)
                | LedgerError::InvalidDirection(_) => StatusCode::BAD_REQUEST,
                LedgerError::AccountNotFound(_) | LedgerError::TransactionNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                LedgerError::Unbalanced { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                LedgerError::DuplicateTransaction(_) | LedgerError::ConcurrencyConflict { .. } => {
                    StatusCode::CONFLICT
                }
                LedgerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Database(_) | ApiError::Migration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    fn error_type(&self) -> &str {
        match self {
            ApiError::Ledger(err) => err.kind(),
            ApiError::Database(_) => "database_error",
            ApiError::Migration(_) => "migration_error",
            ApiError::Validation(_) => "validation_error",
            ApiError::Internal(_) => "internal_error",
        }
    }
}
