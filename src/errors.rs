use axum::http::StatusCode;
use thiserror::Error;

/// Failures of the event store and its persistence backends.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Remote storage selected without complete credentials
    #[error("storage is not configured: {0}")]
    ConfigurationMissing(String),

    /// The remote file does not exist yet
    #[error("not found: {0}")]
    NotFound(String),

    /// The write carried a stale revision; reload and retry
    #[error("conflict: {0}")]
    Conflict(String),

    /// Network or HTTP failure, timeouts included
    #[error("transport error: {0}")]
    Transport(String),

    /// The log could not be read at startup; writes wait for a reload
    #[error("event log not loaded: {0}")]
    Unloaded(String),

    /// Rejected input; nothing was changed
    #[error("{0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Conflict(_) | StoreError::Transport(_))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        let status = match &err {
            StoreError::ConfigurationMissing(_) | StoreError::Unloaded(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::Conflict(_) => StatusCode::CONFLICT,
            StoreError::Transport(_) => StatusCode::BAD_GATEWAY,
            StoreError::Validation(_) => StatusCode::BAD_REQUEST,
            StoreError::Io(_) | StoreError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicts_and_transport_failures_are_retryable() {
        assert!(StoreError::Conflict("stale".into()).is_retryable());
        assert!(StoreError::Transport("timed out".into()).is_retryable());
        assert!(!StoreError::Validation("bad".into()).is_retryable());
        assert!(!StoreError::ConfigurationMissing("token".into()).is_retryable());
    }

    #[test]
    fn store_errors_map_to_http_statuses() {
        let conflict = AppError::from(StoreError::Conflict("stale revision".into()));
        assert_eq!(conflict.status, StatusCode::CONFLICT);
        assert!(conflict.message.contains("stale revision"));

        let missing = AppError::from(StoreError::ConfigurationMissing("token".into()));
        assert_eq!(missing.status, StatusCode::SERVICE_UNAVAILABLE);

        let unloaded = AppError::from(StoreError::Unloaded("trailing characters".into()));
        assert_eq!(unloaded.status, StatusCode::SERVICE_UNAVAILABLE);

        let invalid = AppError::from(StoreError::Validation("unknown category".into()));
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
        assert_eq!(invalid.message, "unknown category");
    }
}
