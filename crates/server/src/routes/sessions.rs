//! Shipment session routes.
//!
//! Sessions are the unit of reconciliation: one session per physical
//! shipment leaving a warehouse for a distributor. Scans are recorded
//! against a session until its totals are reviewed and approved.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use scantrace_core::types::SessionId;

use crate::error::AppError;
use crate::models::{CreateSessionInput, ShipmentSession};
use crate::state::AppState;

/// Open a new shipment session in `pending` status.
///
/// POST /sessions
///
/// # Errors
///
/// Returns `AppError` if the session cannot be persisted.
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateSessionInput>,
) -> Result<(StatusCode, Json<ShipmentSession>), AppError> {
    let session = state.engine().create_session(&input).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// Fetch a session with its running quantities and discrepancy report.
///
/// GET /sessions/{id}
///
/// # Errors
///
/// Returns 404 if the session does not exist.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ShipmentSession>, AppError> {
    let session = state.engine().session(SessionId::new(id)).await?;
    Ok(Json(session))
}
