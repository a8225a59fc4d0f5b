//! Unified error handling for the scan server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use scantrace_core::ScanOutcome;

use crate::models::BatchSummary;
use crate::scan::{EngineError, StoreError};

/// Application-level error type for the scan server.
///
/// Per-code scan problems never surface here; they travel inside scan
/// results with a rejection outcome. This type covers request-level
/// failures only.
#[derive(Debug, Error)]
pub enum AppError {
    /// Store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request lacks valid scan actor headers.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<EngineError> for AppError {
    fn from(error: EngineError) -> Self {
        match error {
            EngineError::SessionNotFound(id) => Self::NotFound(format!("session {id}")),
            EngineError::CodeNotFound(code) => Self::NotFound(format!("code {code}")),
            EngineError::InvalidCode(e) => Self::BadRequest(e.to_string()),
            EngineError::Pipeline => Self::Internal("scan pipeline produced no result".to_owned()),
            EngineError::Store(e) => Self::Store(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if matches!(self, Self::Store(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Scan request error"
            );
        }

        let status = match &self {
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Store(_) | Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// HTTP status a single scan result responds with.
///
/// Duplicates stay 200: the scanner already holds the goods and the session
/// already counts them, so the terminal treats it as a soft confirmation.
#[must_use]
pub const fn scan_status(outcome: ScanOutcome) -> StatusCode {
    match outcome {
        ScanOutcome::Shipped | ScanOutcome::Duplicate => StatusCode::OK,
        ScanOutcome::InvalidFormat => StatusCode::BAD_REQUEST,
        ScanOutcome::WrongWarehouse => StatusCode::FORBIDDEN,
        ScanOutcome::NotFound => StatusCode::NOT_FOUND,
        ScanOutcome::AlreadyShipped | ScanOutcome::InvalidStatus | ScanOutcome::SessionClosed => {
            StatusCode::CONFLICT
        }
        ScanOutcome::Error => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// HTTP status for a whole batch: 207 when any scan hit an infrastructure
/// error, 200 otherwise. Rejections are normal batch content, not errors.
#[must_use]
pub const fn batch_status(summary: &BatchSummary) -> StatusCode {
    if summary.errors > 0 {
        StatusCode::MULTI_STATUS
    } else {
        StatusCode::OK
    }
}

/// Set the Sentry user context from a scan actor's user ID.
pub fn set_sentry_user(user_id: i32) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}
