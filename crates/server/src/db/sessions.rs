//! Database operations for shipment sessions.
//!
//! The scan aggregate travels as two JSONB documents (`quantities` and
//! `discrepancy`) plus two text arrays for the scanned code sets. The
//! engine owns merging; this store only loads and replaces whole rows.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use scantrace_core::{OrgId, SessionId};

use crate::models::{CreateSessionInput, DiscrepancyReport, ScannedQuantities, ShipmentSession};
use crate::scan::store::{SessionStore, StoreError};

/// Internal row type for session queries.
#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    id: i32,
    source_warehouse_id: i32,
    destination_distributor_id: i32,
    status: String,
    scanned_case_codes: Vec<String>,
    scanned_unit_codes: Vec<String>,
    quantities: serde_json::Value,
    discrepancy: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SessionRow> for ShipmentSession {
    type Error = StoreError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse()
            .map_err(|e| StoreError::DataCorruption(format!("session {}: {e}", row.id)))?;
        let quantities: ScannedQuantities = serde_json::from_value(row.quantities)
            .map_err(|e| StoreError::DataCorruption(format!("session {} quantities: {e}", row.id)))?;
        let discrepancy: DiscrepancyReport = serde_json::from_value(row.discrepancy)
            .map_err(|e| StoreError::DataCorruption(format!("session {} discrepancy: {e}", row.id)))?;

        Ok(Self {
            id: SessionId::new(row.id),
            source_warehouse_id: OrgId::new(row.source_warehouse_id),
            destination_distributor_id: OrgId::new(row.destination_distributor_id),
            status,
            scanned_case_codes: row.scanned_case_codes.into_iter().collect::<BTreeSet<_>>(),
            scanned_unit_codes: row.scanned_unit_codes.into_iter().collect::<BTreeSet<_>>(),
            quantities,
            discrepancy,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn to_json<T: serde::Serialize>(value: &T, what: &str) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(value)
        .map_err(|e| StoreError::DataCorruption(format!("serializing {what}: {e}")))
}

/// Repository for shipment session persistence.
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    /// Create a new session store over the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SessionStore for PgSessionStore {
    async fn create(&self, input: &CreateSessionInput) -> Result<ShipmentSession, StoreError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r"
            INSERT INTO scantrace.shipment_sessions (
                source_warehouse_id, destination_distributor_id, status,
                scanned_case_codes, scanned_unit_codes, quantities, discrepancy
            )
            VALUES ($1, $2, 'pending', '{}', '{}', $3, $4)
            RETURNING
                id, source_warehouse_id, destination_distributor_id, status,
                scanned_case_codes, scanned_unit_codes, quantities, discrepancy,
                created_at, updated_at
            ",
        )
        .bind(input.source_warehouse_id)
        .bind(input.destination_distributor_id)
        .bind(to_json(&ScannedQuantities::default(), "quantities")?)
        .bind(to_json(&DiscrepancyReport::default(), "discrepancy")?)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn get(&self, id: SessionId) -> Result<Option<ShipmentSession>, StoreError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r"
            SELECT
                id, source_warehouse_id, destination_distributor_id, status,
                scanned_case_codes, scanned_unit_codes, quantities, discrepancy,
                created_at, updated_at
            FROM scantrace.shipment_sessions
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ShipmentSession::try_from).transpose()
    }

    async fn replace(&self, session: &ShipmentSession) -> Result<(), StoreError> {
        let case_codes: Vec<String> = session.scanned_case_codes.iter().cloned().collect();
        let unit_codes: Vec<String> = session.scanned_unit_codes.iter().cloned().collect();

        let updated = sqlx::query(
            r"
            UPDATE scantrace.shipment_sessions
            SET status = $2,
                scanned_case_codes = $3,
                scanned_unit_codes = $4,
                quantities = $5,
                discrepancy = $6,
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(session.id)
        .bind(session.status.as_str())
        .bind(&case_codes)
        .bind(&unit_codes)
        .bind(to_json(&session.quantities, "quantities")?)
        .bind(to_json(&session.discrepancy, "discrepancy")?)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
