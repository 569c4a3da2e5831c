use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Success envelope: `{"success": true, "message"?: ..., <key>: <data>...}`
#[derive(Debug)]
pub struct ApiResponse {
    fields: Map<String, Value>,
    serialize_error: Option<serde_json::Error>,
}

impl ApiResponse {
    /// Create a successful 200 response
    pub fn success() -> Self {
        let mut fields = Map::new();
        fields.insert("success".to_string(), Value::Bool(true));
        Self {
            fields,
            serialize_error: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.fields
            .insert("message".to_string(), Value::String(message.into()));
        self
    }

    /// Attach `data` under `key`
    pub fn with_data<T: Serialize>(mut self, key: &str, data: T) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => {
                self.fields.insert(key.to_string(), value);
            }
            Err(e) => self.serialize_error = Some(e),
        }
        self
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        if let Some(e) = self.serialize_error {
            tracing::error!("Failed to serialize response data: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": "Failed to serialize response data",
                    "code": "INTERNAL_SERVER_ERROR"
                })),
            )
                .into_response();
        }

        (StatusCode::OK, Json(Value::Object(self.fields))).into_response()
    }
}

pub type ApiResult = Result<ApiResponse, crate::error::ApiError>;
