use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Duplicate pending request: {0}")]
    DuplicatePending(String),

    #[error("Double booked: {0}")]
    DoubleBooked(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    #[error("Self swap: {0}")]
    SelfSwap(String),

    #[error("Inactive: {0}")]
    Inactive(String),

    #[error("In use: {0}")]
    InUse(String),

    #[error("{0}")]
    Internal(String),

    #[error("{0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Validation(String),
}

impl AppError {
    /// Stable machine-readable kind, used in response bodies and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::InvalidState(_) => "INVALID_STATE",
            AppError::DuplicatePending(_) => "DUPLICATE_PENDING",
            AppError::DoubleBooked(_) => "DOUBLE_BOOKED",
            AppError::Conflict(_) => "CONFLICT",
            AppError::DuplicateName(_) => "DUPLICATE_NAME",
            AppError::SelfSwap(_) => "SELF_SWAP",
            AppError::Inactive(_) => "INACTIVE",
            AppError::InUse(_) => "IN_USE",
            AppError::Internal(_) => "INTERNAL",
            AppError::Database(_) => "DATABASE",
            AppError::Validation(_) => "VALIDATION",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::SelfSwap(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidState(_)
            | AppError::DuplicatePending(_)
            | AppError::DoubleBooked(_)
            | AppError::Conflict(_)
            | AppError::DuplicateName(_)
            | AppError::Inactive(_)
            | AppError::InUse(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();
        let message = match self {
            AppError::Database(e) => {
                tracing::error!(error = %e, "Database error");
                e.to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": message,
            "kind": kind
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Maps a unique-constraint violation on the work schedule table to `DoubleBooked`.
pub fn map_unique_violation(e: sqlx::Error, context: impl FnOnce() -> String) -> AppError {
    let is_unique = e
        .as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == "23505")
        .unwrap_or(false);

    if is_unique {
        AppError::DoubleBooked(context())
    } else {
        AppError::Database(e)
    }
}
