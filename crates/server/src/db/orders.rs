//! Database operations for order lines.

use sqlx::PgPool;

use scantrace_core::{OrderId, VariantId};

use crate::models::OrderLine;
use crate::scan::store::{OrderLineSource, StoreError};

/// Internal row type for order item queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    variant_id: i32,
    quantity: i32,
}

/// Repository backing the order-line tally fallback.
pub struct PgOrderLineSource {
    pool: PgPool,
}

impl PgOrderLineSource {
    /// Create a new order line source over the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl OrderLineSource for PgOrderLineSource {
    async fn lines_for_order(&self, order_id: OrderId) -> Result<Vec<OrderLine>, StoreError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT variant_id, quantity
            FROM scantrace.order_items
            WHERE order_id = $1
            ORDER BY id
            ",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| OrderLine {
                variant_id: VariantId::new(row.variant_id),
                quantity: row.quantity,
            })
            .collect())
    }
}
