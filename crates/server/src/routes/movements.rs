//! Movement history routes.

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;

use crate::error::AppError;
use crate::models::MovementLogEntry;
use crate::state::AppState;

/// Movement history for one code.
#[derive(Debug, Serialize)]
pub struct MovementListResponse {
    /// Code value as submitted.
    pub code: String,
    /// Movement entries, newest first.
    pub movements: Vec<MovementLogEntry>,
}

/// List movement history for a code, newest first.
///
/// GET /codes/{code}/movements
///
/// The path segment accepts the raw scanned value; it is normalized the
/// same way scan submissions are.
///
/// # Errors
///
/// Returns 400 if the value does not normalize, 404 if no code matches.
pub async fn list(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<MovementListResponse>, AppError> {
    let movements = state.engine().code_movements(&code).await?;

    Ok(Json(MovementListResponse { code, movements }))
}
