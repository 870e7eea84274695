use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Download error: {0}")]
    Download(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Sanity check failed: {0}")]
    SanityCheck(String),

    #[error("Persist error: {0}")]
    Persist(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Short machine-readable tag for the error body
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Download(_) => "download",
            AppError::Parse(_) => "parse",
            AppError::SanityCheck(_) => "sanity_check",
            AppError::Persist(_) => "persist",
            AppError::NotFound(_) => "not_found",
            AppError::Internal(_) => "internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Download(_) => StatusCode::BAD_GATEWAY,
            AppError::Parse(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::SanityCheck(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Persist(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Config(msg)
            | AppError::Unauthorized(msg)
            | AppError::Download(msg)
            | AppError::Parse(msg)
            | AppError::SanityCheck(msg)
            | AppError::Persist(msg)
            | AppError::NotFound(msg)
            | AppError::Internal(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("❌ {}", self);
        }

        let body = Json(json!({
            "error": self.message(),
            "kind": self.kind(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
