use crate::validation::ValidationDetails;
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid payload")]
    InvalidPayload(ValidationDetails),

    #[error("Invalid features")]
    InvalidFeatures(ValidationDetails),

    #[error("Email and password are required")]
    MissingCredentials,

    #[error("User already exists")]
    UserExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing authorization token")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Model service returned status {status}")]
    UpstreamStatus { status: u16, body: String },

    #[error("Invalid JSON from model service")]
    InvalidModelResponse,

    #[error("Model service unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Internal(format!("JSON serialization error: {}", err))
    }
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();

        match self {
            ApiError::InvalidPayload(details) | ApiError::InvalidFeatures(details) => {
                HttpResponse::build(status_code).json(json!({
                    "error": self.to_string(),
                    "details": details
                }))
            }
            ApiError::UpstreamStatus { body, .. } => HttpResponse::build(status_code)
                .content_type("text/plain; charset=utf-8")
                .body(body.clone()),
            ApiError::InvalidModelResponse => HttpResponse::build(status_code)
                .content_type("text/plain; charset=utf-8")
                .body(self.to_string()),
            ApiError::ModelUnavailable(_) => {
                HttpResponse::build(status_code).json(json!({"error": "Model service unavailable"}))
            }
            ApiError::Database(_)
            | ApiError::PasswordHash(_)
            | ApiError::Token(_)
            | ApiError::Internal(_) => {
                error!("Request failed: {}", self);
                HttpResponse::build(status_code).json(json!({"error": "Internal Server Error"}))
            }
            _ => HttpResponse::build(status_code).json(json!({"error": self.to_string()})),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidFeatures(_) => StatusCode::BAD_REQUEST,
            ApiError::MissingCredentials => StatusCode::BAD_REQUEST,
            ApiError::UserExists => StatusCode::CONFLICT,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::MissingToken => StatusCode::UNAUTHORIZED,
            ApiError::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiError::UpstreamStatus { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ApiError::InvalidModelResponse => StatusCode::BAD_GATEWAY,
            ApiError::ModelUnavailable(_) => StatusCode::BAD_GATEWAY,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
