//! HTTP route handlers for the scan server.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (database ping)
//!
//! # Sessions
//! POST /sessions                        - Open a shipment session
//! GET  /sessions/{id}                   - Session with scan aggregate
//!
//! # Scanning (requires x-user-id / x-warehouse-org headers)
//! POST /sessions/{id}/scan              - Process one scanned value
//! POST /sessions/{id}/scan/batch        - Process a batch of scans
//! POST /sessions/{id}/scan/batch/stream - Batch with NDJSON progress stream
//!
//! # Codes
//! GET  /codes/{code}/movements          - Movement history for a code
//! ```

pub mod movements;
pub mod scan;
pub mod sessions;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the session routes router.
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(sessions::create))
        .route("/{id}", get(sessions::show))
        .route("/{id}/scan", post(scan::scan_code))
        .route("/{id}/scan/batch", post(scan::scan_batch))
        .route("/{id}/scan/batch/stream", post(scan::scan_batch_stream))
}

/// Create the code routes router.
pub fn code_routes() -> Router<AppState> {
    Router::new().route("/{code}/movements", get(movements::list))
}

/// Create the combined application router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/sessions", session_routes())
        .nest("/codes", code_routes())
}
