//! Database operations for case and unit codes.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use scantrace_core::{CodeId, CodeStatus, OrderId, OrgId, VariantId};

use crate::models::Code;
use crate::scan::store::{CodeStore, StoreError};

/// Internal row type for code queries.
#[derive(Debug, sqlx::FromRow)]
struct CodeRow {
    id: i32,
    code: String,
    kind: String,
    status: String,
    location_org_id: i32,
    variant_id: Option<i32>,
    parent_case_id: Option<i32>,
    order_id: Option<i32>,
    child_count: i32,
    case_sequence: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CodeRow> for Code {
    type Error = StoreError;

    fn try_from(row: CodeRow) -> Result<Self, Self::Error> {
        let kind = row
            .kind
            .parse()
            .map_err(|e| StoreError::DataCorruption(format!("code {}: {e}", row.code)))?;
        let status = row
            .status
            .parse()
            .map_err(|e| StoreError::DataCorruption(format!("code {}: {e}", row.code)))?;

        Ok(Self {
            id: CodeId::new(row.id),
            code: row.code,
            kind,
            status,
            location_org_id: OrgId::new(row.location_org_id),
            variant_id: row.variant_id.map(VariantId::new),
            parent_case_id: row.parent_case_id.map(CodeId::new),
            order_id: row.order_id.map(OrderId::new),
            child_count: row.child_count,
            case_sequence: row.case_sequence,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for code lookups and transitions.
pub struct PgCodeStore {
    pool: PgPool,
}

impl PgCodeStore {
    /// Create a new code store over the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CodeStore for PgCodeStore {
    async fn find_by_code(&self, code: &str) -> Result<Option<Code>, StoreError> {
        let row = sqlx::query_as::<_, CodeRow>(
            r"
            SELECT
                id, code, kind, status, location_org_id,
                variant_id, parent_case_id, order_id,
                child_count, case_sequence,
                created_at, updated_at
            FROM scantrace.codes
            WHERE code = $1
            ",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Code::try_from).transpose()
    }

    async fn find_by_codes(&self, lookup: &[String]) -> Result<Vec<Code>, StoreError> {
        let rows = sqlx::query_as::<_, CodeRow>(
            r"
            SELECT
                id, code, kind, status, location_org_id,
                variant_id, parent_case_id, order_id,
                child_count, case_sequence,
                created_at, updated_at
            FROM scantrace.codes
            WHERE code = ANY($1)
            ",
        )
        .bind(lookup)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Code::try_from).collect()
    }

    async fn children_of_cases(&self, case_ids: &[CodeId]) -> Result<Vec<Code>, StoreError> {
        let ids: Vec<i32> = case_ids.iter().map(CodeId::as_i32).collect();
        let rows = sqlx::query_as::<_, CodeRow>(
            r"
            SELECT
                id, code, kind, status, location_org_id,
                variant_id, parent_case_id, order_id,
                child_count, case_sequence,
                created_at, updated_at
            FROM scantrace.codes
            WHERE parent_case_id = ANY($1)
            ORDER BY id
            ",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Code::try_from).collect()
    }

    async fn set_status_and_location(
        &self,
        ids: &[CodeId],
        status: CodeStatus,
        location: OrgId,
    ) -> Result<(), StoreError> {
        let ids: Vec<i32> = ids.iter().map(CodeId::as_i32).collect();
        sqlx::query(
            r"
            UPDATE scantrace.codes
            SET status = $2, location_org_id = $3, updated_at = NOW()
            WHERE id = ANY($1)
            ",
        )
        .bind(&ids)
        .bind(status.as_str())
        .bind(location)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn detach_from_parents(&self, ids: &[CodeId]) -> Result<(), StoreError> {
        let ids: Vec<i32> = ids.iter().map(CodeId::as_i32).collect();
        sqlx::query(
            r"
            UPDATE scantrace.codes
            SET parent_case_id = NULL, updated_at = NOW()
            WHERE id = ANY($1)
            ",
        )
        .bind(&ids)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
