//! Seed the database with a demo dataset for local development.
//!
//! Creates two organizations (a warehouse and a distributor), a small
//! product catalog with on-hand inventory, an order, one packed case with
//! linked unit codes, a few loose units, and a pending shipment session to
//! scan against.
//!
//! Re-running the command resets code statuses and inventory to their
//! seeded values and opens a fresh session.
//!
//! # Environment Variables
//!
//! - `SCANTRACE_DATABASE_URL` - `PostgreSQL` connection string (falls back
//!   to `DATABASE_URL`)

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use scantrace_core::{CodeKind, CodeStatus};
use scantrace_server::db;

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Seed the demo dataset.
///
/// # Errors
///
/// Returns an error if the database URL is missing or a query fails.
pub async fn run() -> Result<(), SeedError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("SCANTRACE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| SeedError::MissingEnvVar("SCANTRACE_DATABASE_URL"))?;

    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let warehouse = upsert_org(&pool, "Central Warehouse", "warehouse").await?;
    let distributor = upsert_org(&pool, "Northside Distribution", "distributor").await?;
    info!(warehouse, distributor, "Organizations ready");

    let citrus = upsert_variant(&pool, "SKU-CITRUS-12", "Sparkling Citrus 12oz", Some(24)).await?;
    let ginger = upsert_variant(&pool, "SKU-GINGER-12", "Ginger Brew 12oz", Some(24)).await?;
    let sampler = upsert_variant(&pool, "SKU-SAMPLER", "Variety Sampler", None).await?;

    set_inventory(&pool, warehouse, citrus, 480).await?;
    set_inventory(&pool, warehouse, ginger, 120).await?;
    set_inventory(&pool, warehouse, sampler, 36).await?;
    info!("Catalog and inventory ready");

    let order = upsert_order(&pool, "PO-2026-0815", distributor).await?;
    replace_order_items(&pool, order, &[(citrus, 24), (ginger, 12)]).await?;

    // A packed case with 24 linked units
    let case = upsert_code(
        &pool,
        "MC-1001",
        CodeKind::Case,
        CodeStatus::WarehousePacked,
        warehouse,
        Some(citrus),
        None,
        Some(order),
        24,
    )
    .await?;
    for sequence in 1..=24 {
        upsert_unit(
            &pool,
            &format!("PROD-1001-{sequence:02}"),
            warehouse,
            citrus,
            Some(case),
            Some(sequence),
        )
        .await?;
    }

    // A case with no linked units; its contents come from the order lines
    upsert_code(
        &pool,
        "MC-2002",
        CodeKind::Case,
        CodeStatus::ReadyToShip,
        warehouse,
        None,
        None,
        Some(order),
        36,
    )
    .await?;

    // Loose units with no parent case
    for sequence in 1..=4 {
        upsert_unit(
            &pool,
            &format!("PROD-2002-{sequence:02}"),
            warehouse,
            ginger,
            None,
            None,
        )
        .await?;
    }

    let session = open_session(&pool, warehouse, distributor).await?;

    info!(session, "Demo dataset ready; scan against session {session}");
    Ok(())
}

async fn upsert_org(pool: &PgPool, name: &str, kind: &str) -> Result<i32, SeedError> {
    let id = sqlx::query_scalar::<_, i32>(
        r"
        INSERT INTO scantrace.organizations (name, kind)
        VALUES ($1, $2)
        ON CONFLICT (name) DO UPDATE SET kind = EXCLUDED.kind
        RETURNING id
        ",
    )
    .bind(name)
    .bind(kind)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

async fn upsert_variant(
    pool: &PgPool,
    sku: &str,
    display_name: &str,
    units_per_case: Option<i32>,
) -> Result<i32, SeedError> {
    let id = sqlx::query_scalar::<_, i32>(
        r"
        INSERT INTO scantrace.product_variants (sku, display_name, units_per_case)
        VALUES ($1, $2, $3)
        ON CONFLICT (sku) DO UPDATE
            SET display_name = EXCLUDED.display_name,
                units_per_case = EXCLUDED.units_per_case
        RETURNING id
        ",
    )
    .bind(sku)
    .bind(display_name)
    .bind(units_per_case)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

async fn set_inventory(
    pool: &PgPool,
    org_id: i32,
    variant_id: i32,
    quantity: i64,
) -> Result<(), SeedError> {
    sqlx::query(
        r"
        INSERT INTO scantrace.product_inventory (org_id, variant_id, quantity)
        VALUES ($1, $2, $3)
        ON CONFLICT (org_id, variant_id) DO UPDATE
            SET quantity = EXCLUDED.quantity,
                updated_at = NOW()
        ",
    )
    .bind(org_id)
    .bind(variant_id)
    .bind(quantity)
    .execute(pool)
    .await?;
    Ok(())
}

async fn upsert_order(
    pool: &PgPool,
    reference: &str,
    distributor_org_id: i32,
) -> Result<i32, SeedError> {
    let id = sqlx::query_scalar::<_, i32>(
        r"
        INSERT INTO scantrace.orders (reference, distributor_org_id)
        VALUES ($1, $2)
        ON CONFLICT (reference) DO UPDATE SET distributor_org_id = EXCLUDED.distributor_org_id
        RETURNING id
        ",
    )
    .bind(reference)
    .bind(distributor_org_id)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

async fn replace_order_items(
    pool: &PgPool,
    order_id: i32,
    items: &[(i32, i32)],
) -> Result<(), SeedError> {
    sqlx::query("DELETE FROM scantrace.order_items WHERE order_id = $1")
        .bind(order_id)
        .execute(pool)
        .await?;

    for (variant_id, quantity) in items {
        sqlx::query(
            r"
            INSERT INTO scantrace.order_items (order_id, variant_id, quantity)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(order_id)
        .bind(variant_id)
        .bind(quantity)
        .execute(pool)
        .await?;
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn upsert_code(
    pool: &PgPool,
    code: &str,
    kind: CodeKind,
    status: CodeStatus,
    location_org_id: i32,
    variant_id: Option<i32>,
    parent_case_id: Option<i32>,
    order_id: Option<i32>,
    child_count: i32,
) -> Result<i32, SeedError> {
    let id = sqlx::query_scalar::<_, i32>(
        r"
        INSERT INTO scantrace.codes
            (code, kind, status, location_org_id, variant_id, parent_case_id, order_id, child_count)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (code) DO UPDATE
            SET status = EXCLUDED.status,
                location_org_id = EXCLUDED.location_org_id,
                parent_case_id = EXCLUDED.parent_case_id,
                updated_at = NOW()
        RETURNING id
        ",
    )
    .bind(code)
    .bind(kind.as_str())
    .bind(status.as_str())
    .bind(location_org_id)
    .bind(variant_id)
    .bind(parent_case_id)
    .bind(order_id)
    .bind(child_count)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

async fn upsert_unit(
    pool: &PgPool,
    code: &str,
    location_org_id: i32,
    variant_id: i32,
    parent_case_id: Option<i32>,
    case_sequence: Option<i32>,
) -> Result<(), SeedError> {
    sqlx::query(
        r"
        INSERT INTO scantrace.codes
            (code, kind, status, location_org_id, variant_id, parent_case_id, case_sequence)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (code) DO UPDATE
            SET status = EXCLUDED.status,
                location_org_id = EXCLUDED.location_org_id,
                parent_case_id = EXCLUDED.parent_case_id,
                updated_at = NOW()
        ",
    )
    .bind(code)
    .bind(CodeKind::Unit.as_str())
    .bind(CodeStatus::ReceivedWarehouse.as_str())
    .bind(location_org_id)
    .bind(variant_id)
    .bind(parent_case_id)
    .bind(case_sequence)
    .execute(pool)
    .await?;
    Ok(())
}

async fn open_session(
    pool: &PgPool,
    source_warehouse_id: i32,
    destination_distributor_id: i32,
) -> Result<i32, SeedError> {
    let id = sqlx::query_scalar::<_, i32>(
        r"
        INSERT INTO scantrace.shipment_sessions (source_warehouse_id, destination_distributor_id)
        VALUES ($1, $2)
        RETURNING id
        ",
    )
    .bind(source_warehouse_id)
    .bind(destination_distributor_id)
    .fetch_one(pool)
    .await?;
    Ok(id)
}
