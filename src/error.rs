use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    InvalidName(String),
    /// `None` when nothing matched a system-wide listing.
    EntryNotFound(Option<String>),
    TagNotFound { entry: String, tag: String },
    DuplicateTag(String),
    TagNameMismatch { path: String, body: String },
    Database(sqlx::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::EntryNotFound(_) | AppError::TagNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::InvalidName(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DuplicateTag(_)
            | AppError::TagNameMismatch { .. }
            | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidName(name) => write!(
                f,
                "invalid name {name:?}: only letters, digits, '-' and '_' are allowed"
            ),
            AppError::EntryNotFound(Some(name)) => write!(f, "entry {name:?} not found"),
            AppError::EntryNotFound(None) => write!(f, "no entries found"),
            AppError::TagNotFound { entry, tag } => {
                write!(f, "tag {tag:?} not found on entry {entry:?}")
            }
            AppError::DuplicateTag(name) => write!(f, "duplicate tag name {name:?} in request"),
            AppError::TagNameMismatch { path, body } => {
                write!(f, "tag name {body:?} does not match {path:?} in path")
            }
            AppError::Database(e) => write!(f, "database error: {e}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Database(e) => Some(e),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Database(e)
    }
}
