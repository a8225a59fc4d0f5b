//! Database operations for the scan engine's `PostgreSQL` backend.
//!
//! # Schema: `scantrace`
//!
//! ## Tables
//!
//! - `organizations` - Manufacturers, warehouses, and distributors
//! - `product_variants` - Sellable variants with per-case pack sizes
//! - `product_inventory` - On-hand quantity per organization and variant
//! - `orders` / `order_items` - Order lines backing the case tally fallback
//! - `codes` - Case and unit codes with status and location
//! - `shipment_sessions` - Scan aggregates per warehouse-to-distributor run
//! - `code_movements` - Audit log of code custody changes
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p scantrace-cli -- migrate
//! ```
//!
//! Each store trait from [`crate::scan::store`] has one `Pg*` implementation
//! here; the engine only ever sees the traits.

pub mod codes;
pub mod inventory;
pub mod movements;
pub mod orders;
pub mod sessions;
pub mod variants;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub use codes::PgCodeStore;
pub use inventory::PgInventoryStore;
pub use movements::PgMovementLog;
pub use orders::PgOrderLineSource;
pub use sessions::PgSessionStore;
pub use variants::PgVariantStore;

use crate::scan::Stores;

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Wire every Postgres store over one shared pool.
#[must_use]
pub fn postgres_stores(pool: &PgPool) -> Stores {
    Stores {
        codes: std::sync::Arc::new(PgCodeStore::new(pool.clone())),
        sessions: std::sync::Arc::new(PgSessionStore::new(pool.clone())),
        inventory: std::sync::Arc::new(PgInventoryStore::new(pool.clone())),
        variants: std::sync::Arc::new(PgVariantStore::new(pool.clone())),
        orders: std::sync::Arc::new(PgOrderLineSource::new(pool.clone())),
        movements: std::sync::Arc::new(PgMovementLog::new(pool.clone())),
    }
}
