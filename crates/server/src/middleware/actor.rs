//! Actor extraction for scan endpoints.
//!
//! Scanning stations authenticate upstream (device gateway) and forward the
//! operator identity as headers. Handlers that mutate inventory require both:
//!
//! - `x-user-id` - numeric ID of the operator
//! - `x-warehouse-org` - numeric ID of the warehouse the station belongs to

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;

use scantrace_core::types::{OrgId, UserId};

use crate::error::{AppError, set_sentry_user};
use crate::scan::ScanActor;

/// Header carrying the operator's user ID.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the warehouse organization ID of the scanning station.
pub const WAREHOUSE_ORG_HEADER: &str = "x-warehouse-org";

/// Extractor that requires a scanning operator identity.
///
/// Rejects with 401 Unauthorized when either header is missing or not a
/// valid integer.
///
/// # Example
///
/// ```rust,ignore
/// async fn scan_handler(
///     RequireActor(actor): RequireActor,
/// ) -> impl IntoResponse {
///     format!("scan recorded by user {}", actor.user_id)
/// }
/// ```
#[derive(Debug)]
pub struct RequireActor(pub ScanActor);

impl<S> FromRequestParts<S> for RequireActor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header_id(&parts.headers, USER_ID_HEADER)?;
        let warehouse_org_id = header_id(&parts.headers, WAREHOUSE_ORG_HEADER)?;

        // Tag error reports with the operator for triage
        set_sentry_user(user_id);

        Ok(Self(ScanActor {
            user_id: UserId::new(user_id),
            warehouse_org_id: OrgId::new(warehouse_org_id),
        }))
    }
}

/// Parse a numeric ID header, rejecting the request when absent or malformed.
fn header_id(headers: &HeaderMap, name: &str) -> Result<i32, AppError> {
    let value = headers
        .get(name)
        .ok_or_else(|| AppError::Unauthorized(format!("missing {name} header")))?;

    value
        .to_str()
        .ok()
        .and_then(|raw| raw.trim().parse::<i32>().ok())
        .ok_or_else(|| AppError::Unauthorized(format!("invalid {name} header")))
}
