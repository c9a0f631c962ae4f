use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use jansou_common::error::JansouError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("table is full")]
    TableFull,
    #[error("store error: {0}")]
    Store(String),
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db_err) = e.as_database_error() {
            if db_err.is_unique_violation() {
                return AppError::Conflict("record already exists".into());
            }
            if db_err.is_foreign_key_violation() {
                return AppError::NotFound("referenced record not found".into());
            }
        }
        if matches!(e, sqlx::Error::RowNotFound) {
            return AppError::NotFound("record not found".into());
        }
        tracing::debug!("database error: {e}");
        AppError::Store("database error".into())
    }
}

impl From<JansouError> for AppError {
    fn from(e: JansouError) -> Self {
        match e {
            JansouError::Validation(msg) => AppError::Validation(msg),
            JansouError::NotSeated => AppError::Forbidden("not seated at this table".into()),
            JansouError::TableFull => AppError::TableFull,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::MethodNotAllowed => {
                (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".into())
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::TableFull => (StatusCode::CONFLICT, "table is full".into()),
            AppError::Store(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };
        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}
