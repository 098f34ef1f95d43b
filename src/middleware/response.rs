use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Success envelope: `{ data?, message? }`
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub message: Option<String>,
    pub status_code: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 OK carrying `data`
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            message: None,
            status_code: StatusCode::OK,
        }
    }

    /// 201 Created carrying `data`
    pub fn created(data: T) -> Self {
        Self::success(data).with_status(StatusCode::CREATED)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_status(mut self, status_code: StatusCode) -> Self {
        self.status_code = status_code;
        self
    }
}

impl ApiResponse<()> {
    /// 200 OK with only a `message`
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            data: None,
            message: Some(message.into()),
            status_code: StatusCode::OK,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let mut envelope = Map::new();

        if let Some(data) = &self.data {
            match serde_json::to_value(data) {
                Ok(value) => {
                    envelope.insert("data".into(), value);
                }
                Err(e) => {
                    tracing::error!("Failed to serialize response data: {}", e);
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({ "error": "Failed to serialize response data" })),
                    )
                        .into_response();
                }
            }
        }

        if let Some(message) = self.message {
            envelope.insert("message".into(), Value::String(message));
        }

        (self.status_code, Json(Value::Object(envelope))).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_sets_status_and_message() {
        let response = ApiResponse::created(json!({ "title": "Dune" })).with_message("ok");
        assert_eq!(response.status_code, StatusCode::CREATED);
        assert_eq!(response.message.as_deref(), Some("ok"));
        assert_eq!(response.into_response().status(), StatusCode::CREATED);
    }

    #[test]
    fn message_only_has_no_data() {
        let response = ApiResponse::message("Movie not found!");
        assert!(response.data.is_none());
        assert_eq!(response.status_code, StatusCode::OK);
    }
}
