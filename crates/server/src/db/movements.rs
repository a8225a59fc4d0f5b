//! Database operations for the code movement audit log.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use scantrace_core::{CodeId, OrgId, UserId};

use crate::models::MovementLogEntry;
use crate::scan::store::{MovementLog, StoreError};

/// Internal row type for movement queries.
#[derive(Debug, sqlx::FromRow)]
struct MovementRow {
    id: Uuid,
    code_id: i32,
    from_org_id: i32,
    to_org_id: i32,
    resulting_status: String,
    recorded_by: i32,
    recorded_at: DateTime<Utc>,
    notes: Option<String>,
}

impl TryFrom<MovementRow> for MovementLogEntry {
    type Error = StoreError;

    fn try_from(row: MovementRow) -> Result<Self, Self::Error> {
        let resulting_status = row
            .resulting_status
            .parse()
            .map_err(|e| StoreError::DataCorruption(format!("movement {}: {e}", row.id)))?;

        Ok(Self {
            id: row.id,
            code_id: CodeId::new(row.code_id),
            from_org_id: OrgId::new(row.from_org_id),
            to_org_id: OrgId::new(row.to_org_id),
            resulting_status,
            recorded_by: UserId::new(row.recorded_by),
            recorded_at: row.recorded_at,
            notes: row.notes,
        })
    }
}

/// Repository for movement history.
pub struct PgMovementLog {
    pool: PgPool,
}

impl PgMovementLog {
    /// Create a new movement log over the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl MovementLog for PgMovementLog {
    async fn record(&self, entries: &[MovementLogEntry]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        for entry in entries {
            sqlx::query(
                r"
                INSERT INTO scantrace.code_movements (
                    id, code_id, from_org_id, to_org_id,
                    resulting_status, recorded_by, recorded_at, notes
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ",
            )
            .bind(entry.id)
            .bind(entry.code_id)
            .bind(entry.from_org_id)
            .bind(entry.to_org_id)
            .bind(entry.resulting_status.as_str())
            .bind(entry.recorded_by)
            .bind(entry.recorded_at)
            .bind(entry.notes.as_deref())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn movements_for_code(
        &self,
        code_id: CodeId,
    ) -> Result<Vec<MovementLogEntry>, StoreError> {
        let rows = sqlx::query_as::<_, MovementRow>(
            r"
            SELECT
                id, code_id, from_org_id, to_org_id,
                resulting_status, recorded_by, recorded_at, notes
            FROM scantrace.code_movements
            WHERE code_id = $1
            ORDER BY recorded_at DESC
            ",
        )
        .bind(code_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(MovementLogEntry::try_from).collect()
    }
}
