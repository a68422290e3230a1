//! HTTP request/response models

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

// ============= Cancel =============

/// Either an explicit operation key, or the project location and task the
/// key is derived from.
#[derive(Debug, Default, Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub project_dir: Option<String>,
    #[serde(default)]
    pub task: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub success: bool,
    /// Whether an in-flight operation was registered under the key.
    pub found: bool,
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct CancelAllResponse {
    pub success: bool,
    pub cancelled: usize,
}

// ============= Health =============

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub session_id: String,
    pub uptime_seconds: f64,
    pub requests_handled: u64,
    pub in_flight: usize,
    /// Keys of the operations currently registered, sorted.
    pub operations: Vec<String>,
    pub timestamp: String,
}

// ============= Error Handling =============

#[derive(Debug)]
pub enum HttpServerError {
    InvalidRequest(String),
    Internal(String),
}

impl IntoResponse for HttpServerError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            Self::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
        };

        let body = serde_json::json!({
            "success": false,
            "error": message,
            "error_code": error_code,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_request_accepts_either_shape() {
        let req: CancelRequest = serde_json::from_str(r#"{"key":"/p:build"}"#).unwrap();
        assert_eq!(req.key.as_deref(), Some("/p:build"));
        assert!(req.project_dir.is_none());

        let req: CancelRequest =
            serde_json::from_str(r#"{"project_dir":"/p","task":":build"}"#).unwrap();
        assert!(req.key.is_none());
        assert_eq!(req.task.as_deref(), Some(":build"));
    }

    #[test]
    fn test_cancel_response_serialize() {
        let resp = CancelResponse {
            success: true,
            found: false,
            key: "k".into(),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "found": false, "key": "k"}));
    }

    #[tokio::test]
    async fn test_error_response_shape() {
        let resp = HttpServerError::InvalidRequest("Task is not set".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Task is not set");
        assert_eq!(json["error_code"], "INVALID_REQUEST");
    }
}
