use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

use super::types::now_ms;

/// JSON error response body returned by the REST surface.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TunelinkError {
    /// Unix timestamp in milliseconds.
    pub timestamp: u64,
    /// HTTP status code.
    pub status: u16,
    /// HTTP status reason phrase (e.g. "Bad Request").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
    /// The request path that caused the error.
    pub path: String,
}

impl TunelinkError {
    fn with_status(status: StatusCode, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            timestamp: now_ms(),
            status: status.as_u16(),
            error: status
                .canonical_reason()
                .unwrap_or("Unknown")
                .to_string(),
            message: message.into(),
            path: path.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, message, path)
    }

    pub fn not_found(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, message, path)
    }

    pub fn conflict(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::with_status(StatusCode::CONFLICT, message, path)
    }

    pub fn bad_gateway(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::with_status(StatusCode::BAD_GATEWAY, message, path)
    }

    pub fn internal(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, message, path)
    }
}

impl IntoResponse for TunelinkError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_status() {
        let err = TunelinkError::conflict("pinned", "/v1/guilds/1/leave");
        assert_eq!(err.status, 409);
        assert_eq!(err.error, "Conflict");
    }

    #[test]
    fn test_error_body_shape() {
        let err = TunelinkError::not_found("Session not found", "/v1/guilds/1");
        let value = serde_json::to_value(&err).expect("serialize");

        assert_eq!(value["status"], 404);
        assert_eq!(value["error"], "Not Found");
        assert_eq!(value["message"], "Session not found");
        assert_eq!(value["path"], "/v1/guilds/1");
        assert!(value["timestamp"].as_u64().unwrap_or(0) > 0);
    }
}
