//! Database operations for on-hand inventory.

use std::collections::HashMap;

use sqlx::PgPool;

use scantrace_core::{OrgId, VariantId};

use crate::scan::store::{InventoryStore, StoreError};

/// Internal row type for inventory queries.
#[derive(Debug, sqlx::FromRow)]
struct QuantityRow {
    variant_id: i32,
    quantity: i64,
}

/// Repository for per-organization inventory quantities.
pub struct PgInventoryStore {
    pool: PgPool,
}

impl PgInventoryStore {
    /// Create a new inventory store over the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl InventoryStore for PgInventoryStore {
    async fn quantities_on_hand(
        &self,
        org: OrgId,
        variants: &[VariantId],
    ) -> Result<HashMap<VariantId, i64>, StoreError> {
        let ids: Vec<i32> = variants.iter().map(VariantId::as_i32).collect();
        let rows = sqlx::query_as::<_, QuantityRow>(
            r"
            SELECT variant_id, quantity
            FROM scantrace.product_inventory
            WHERE org_id = $1 AND variant_id = ANY($2)
            ",
        )
        .bind(org)
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (VariantId::new(row.variant_id), row.quantity))
            .collect())
    }

    async fn apply_deltas(
        &self,
        org: OrgId,
        deltas: &[(VariantId, i64)],
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        for &(variant, delta) in deltas {
            sqlx::query(
                r"
                INSERT INTO scantrace.product_inventory (org_id, variant_id, quantity)
                VALUES ($1, $2, $3)
                ON CONFLICT (org_id, variant_id)
                DO UPDATE SET
                    quantity = product_inventory.quantity + EXCLUDED.quantity,
                    updated_at = NOW()
                ",
            )
            .bind(org)
            .bind(variant)
            .bind(delta)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
