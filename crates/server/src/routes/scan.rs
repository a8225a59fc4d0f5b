//! Scan processing routes.
//!
//! The outcome of each scan maps to an HTTP status so handheld scanners can
//! color their feedback without parsing the body. Batch endpoints return one
//! result per submitted scan, in submission order.

use axum::Json;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use serde::Serialize;
use std::convert::Infallible;

use async_stream::stream;

use scantrace_core::types::SessionId;

use crate::error::{AppError, batch_status, scan_status};
use crate::middleware::RequireActor;
use crate::models::{BatchOutcome, BatchScanRequest, BatchSummary, ScanRequest, ScanResult};
use crate::state::AppState;

/// Process one scanned value against a session.
///
/// POST /sessions/{id}/scan
///
/// The response status reflects the scan outcome (200 for shipped or
/// duplicate, 4xx for rejections, 500 when processing failed).
///
/// # Errors
///
/// Returns 404 if the session does not exist.
pub async fn scan_code(
    State(state): State<AppState>,
    RequireActor(actor): RequireActor,
    Path(id): Path<i32>,
    Json(request): Json<ScanRequest>,
) -> Result<(StatusCode, Json<ScanResult>), AppError> {
    let result = state
        .engine()
        .scan_code(&actor, SessionId::new(id), request)
        .await?;

    Ok((scan_status(result.outcome), Json(result)))
}

/// Process a batch of scans in submission order.
///
/// POST /sessions/{id}/scan/batch
///
/// Returns 200 when no scan errored, 207 Multi-Status otherwise. Individual
/// outcomes are carried per result.
///
/// # Errors
///
/// Returns 404 if the session does not exist.
pub async fn scan_batch(
    State(state): State<AppState>,
    RequireActor(actor): RequireActor,
    Path(id): Path<i32>,
    Json(request): Json<BatchScanRequest>,
) -> Result<(StatusCode, Json<BatchOutcome>), AppError> {
    let outcome = state
        .engine()
        .scan_batch(&actor, SessionId::new(id), &request)
        .await?;

    Ok((batch_status(&outcome.summary), Json(outcome)))
}

/// One line of the NDJSON batch stream.
#[derive(Debug, Serialize)]
#[serde(tag = "record", rename_all = "snake_case")]
enum StreamRecord {
    /// Outcome of one scan, in submission order.
    Result(ScanResult),
    /// Final line: batch totals.
    Summary(BatchSummary),
}

/// Serialize a stream record as one newline-terminated JSON line.
fn ndjson_line(record: &StreamRecord) -> String {
    let json = serde_json::to_string(record).unwrap_or_else(|_| {
        r#"{"record":"error","message":"failed to serialize record"}"#.to_string()
    });
    format!("{json}\n")
}

/// Process a batch of scans, streaming results as NDJSON.
///
/// POST /sessions/{id}/scan/batch/stream
///
/// Emits one `result` record per scan followed by a final `summary` record.
/// The response status is always 200; per-scan outcomes are carried in the
/// records themselves.
///
/// # Errors
///
/// Returns 404 if the session does not exist.
pub async fn scan_batch_stream(
    State(state): State<AppState>,
    RequireActor(actor): RequireActor,
    Path(id): Path<i32>,
    Json(request): Json<BatchScanRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state
        .engine()
        .scan_batch(&actor, SessionId::new(id), &request)
        .await?;

    let lines = stream! {
        for result in outcome.results {
            yield Ok::<_, Infallible>(ndjson_line(&StreamRecord::Result(result)));
        }
        yield Ok(ndjson_line(&StreamRecord::Summary(outcome.summary)));
    };

    Ok((
        [(header::CONTENT_TYPE, "application/x-ndjson")],
        Body::from_stream(lines),
    ))
}
