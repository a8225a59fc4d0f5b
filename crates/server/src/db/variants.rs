//! Database operations for product variant metadata.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::PgPool;

use scantrace_core::VariantId;

use crate::models::VariantMeta;
use crate::scan::store::{StoreError, VariantStore};

/// Internal row type for variant queries.
#[derive(Debug, sqlx::FromRow)]
struct VariantRow {
    id: i32,
    display_name: String,
    units_per_case: Option<Decimal>,
}

/// Repository for variant display names and pack sizes.
pub struct PgVariantStore {
    pool: PgPool,
}

impl PgVariantStore {
    /// Create a new variant store over the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl VariantStore for PgVariantStore {
    async fn fetch_meta(
        &self,
        ids: &[VariantId],
    ) -> Result<HashMap<VariantId, VariantMeta>, StoreError> {
        let lookup: Vec<i32> = ids.iter().map(VariantId::as_i32).collect();
        let rows = sqlx::query_as::<_, VariantRow>(
            r"
            SELECT id, display_name, units_per_case
            FROM scantrace.product_variants
            WHERE id = ANY($1)
            ",
        )
        .bind(&lookup)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                (
                    VariantId::new(row.id),
                    VariantMeta {
                        display_name: row.display_name,
                        units_per_case: row.units_per_case,
                    },
                )
            })
            .collect())
    }
}
