// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::auth::JwtError;
use crate::database::DatabaseError;

/// Everything a handler or middleware can fail with.
///
/// Turning an `ApiError` into a response has two independent effects: one
/// diagnostic event through `report`, and the JSON body from `to_json`.
#[derive(Debug)]
pub enum ApiError {
    // 400 with `{ error }`
    BadRequest(String),
    InvalidJson(String),
    Database(DatabaseError),

    // Domain rejection with `{ message }`, usually 400
    Rejected { status: StatusCode, message: String },

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 501 Not Implemented
    NotImplemented(String),

    // 500 Internal Server Error
    InternalServerError(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            ApiError::Database(_) => StatusCode::BAD_REQUEST,
            ApiError::Rejected { status, .. } => *status,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::InvalidJson(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotImplemented(msg)
            | ApiError::InternalServerError(msg) => msg.clone(),
            ApiError::Rejected { message, .. } => message.clone(),
            ApiError::Database(err) => err.to_string(),
        }
    }

    /// Response body: rejections carry `message`, failures carry `error`.
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::Rejected { message, .. } => json!({ "message": message }),
            _ => json!({ "error": self.message() }),
        }
    }

    /// Emits the diagnostic event for this error.
    pub fn report(&self) {
        let status = self.status_code().as_u16();
        match self {
            ApiError::Database(err) => {
                tracing::error!(status, error = %err, "persistence operation failed");
            }
            ApiError::InternalServerError(msg) => {
                tracing::error!(status, error = %msg, "internal error");
            }
            ApiError::Unauthorized(msg) | ApiError::Forbidden(msg) => {
                tracing::warn!(status, reason = %msg, "request denied");
            }
            ApiError::Rejected { message, .. } => {
                tracing::info!(status, detail = %message, "request rejected");
            }
            ApiError::BadRequest(msg) | ApiError::InvalidJson(msg) | ApiError::NotImplemented(msg) => {
                tracing::info!(status, error = %msg, "bad request");
            }
        }
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    /// 400 with a `{ message }` body
    pub fn rejected(message: impl Into<String>) -> Self {
        ApiError::Rejected {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_implemented(message: impl Into<String>) -> Self {
        ApiError::NotImplemented(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        ApiError::Database(err)
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::InvalidToken(msg) => ApiError::unauthorized(format!("Invalid JWT token: {}", msg)),
            JwtError::TokenGeneration(_) | JwtError::InvalidSecret | JwtError::PasswordHashing(_) => {
                ApiError::internal_server_error(err.to_string())
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        self.report();
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
