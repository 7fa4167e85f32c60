use http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum SyncError {
    #[error("Device is offline")]
    Offline,

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Remote sync failed: {0}")]
    Remote(String),

    #[error("Remote returned status {status}: {message}")]
    RemoteStatus { status: u16, message: String },

    #[error("Store locked by another process: {0}")]
    StoreLocked(String),

    #[error("Workout session not found: {0}")]
    SessionNotFound(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;

impl From<std::io::Error> for SyncError {
    fn from(e: std::io::Error) -> Self {
        SyncError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        SyncError::Json(e.to_string())
    }
}

impl SyncError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SyncError::Offline => StatusCode::SERVICE_UNAVAILABLE,
            SyncError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            SyncError::Remote(_) => StatusCode::BAD_GATEWAY,
            SyncError::RemoteStatus { .. } => StatusCode::BAD_GATEWAY,
            SyncError::StoreLocked(_) => StatusCode::CONFLICT,
            SyncError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            SyncError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SyncError::Json(_) => StatusCode::BAD_REQUEST,
            SyncError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            SyncError::Offline => "offline",
            SyncError::InvalidPayload(_) => "invalid_payload",
            SyncError::Remote(_) => "remote_error",
            SyncError::RemoteStatus { .. } => "remote_status",
            SyncError::StoreLocked(_) => "store_locked",
            SyncError::SessionNotFound(_) => "session_not_found",
            SyncError::Io(_) => "io_error",
            SyncError::Json(_) => "json_error",
            SyncError::Config(_) => "config_error",
        }
    }
}

// Axum IntoResponse implementation (feature-gated)
#[cfg(feature = "axum-support")]
use axum::response::{IntoResponse, Json, Response};
#[cfg(feature = "axum-support")]
use serde::Serialize;

#[cfg(feature = "axum-support")]
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[cfg(feature = "axum-support")]
impl IntoResponse for SyncError {
    fn into_response(self) -> Response {
        let suggestion = match &self {
            SyncError::Offline => Some(
                "Queued mutations are kept and will sync automatically once online".to_string(),
            ),
            SyncError::InvalidPayload(_) => {
                Some("Check the payload shape for the given mutation type".to_string())
            }
            SyncError::StoreLocked(_) => {
                Some("Only one fitsync process may own a data directory".to_string())
            }
            SyncError::SessionNotFound(_) => {
                Some("Start a session first with POST /1/sessions".to_string())
            }
            _ => None,
        };

        let body = ErrorResponse {
            error: self.code().to_string(),
            message: self.to_string(),
            request_id: format!("req_fs_{}", uuid::Uuid::new_v4()),
            suggestion,
        };

        let mut response = (self.status_code(), Json(body)).into_response();
        if matches!(self, SyncError::Offline) {
            response
                .headers_mut()
                .insert(http::header::RETRY_AFTER, http::HeaderValue::from_static("30"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            SyncError::Offline.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            SyncError::InvalidPayload("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            SyncError::SessionNotFound("s1".into()).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_io_conversion() {
        let err: SyncError = std::io::Error::new(std::io::ErrorKind::Other, "disk full").into();
        assert!(matches!(err, SyncError::Io(ref m) if m.contains("disk full")));
        assert_eq!(err.code(), "io_error");
    }
}
