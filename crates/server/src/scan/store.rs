//! Storage traits the scan engine runs against.
//!
//! The engine never talks to `PostgreSQL` directly; it goes through these
//! traits so the same logic runs against the production database, and against
//! the in-memory implementation in tests and local development.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use scantrace_core::{CodeId, CodeStatus, OrderId, OrgId, SessionId, VariantId};

use crate::models::{
    Code, CreateSessionInput, MovementLogEntry, OrderLine, ShipmentSession, VariantMeta,
};

/// Errors surfaced by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate code string).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Read and transition scannable codes.
#[async_trait::async_trait]
pub trait CodeStore: Send + Sync {
    /// Look up one code by its scanned string.
    async fn find_by_code(&self, code: &str) -> Result<Option<Code>, StoreError>;

    /// Look up many codes by their scanned strings in one round trip.
    /// Unknown strings are simply absent from the result.
    async fn find_by_codes(&self, codes: &[String]) -> Result<Vec<Code>, StoreError>;

    /// All unit codes whose `parent_case_id` is one of the given cases.
    async fn children_of_cases(&self, case_ids: &[CodeId]) -> Result<Vec<Code>, StoreError>;

    /// Move the given codes to a status and location in one statement.
    async fn set_status_and_location(
        &self,
        ids: &[CodeId],
        status: CodeStatus,
        location: OrgId,
    ) -> Result<(), StoreError>;

    /// Clear `parent_case_id` on the given unit codes.
    async fn detach_from_parents(&self, ids: &[CodeId]) -> Result<(), StoreError>;
}

/// Shipment session persistence.
///
/// `replace` writes the whole session document. Two scanners racing on one
/// session serialize only at this write, last one wins; the scan flow reads
/// the session fresh at the start of each request to keep the window small.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a new pending session.
    async fn create(&self, input: &CreateSessionInput) -> Result<ShipmentSession, StoreError>;

    /// Fetch a session by ID.
    async fn get(&self, id: SessionId) -> Result<Option<ShipmentSession>, StoreError>;

    /// Persist the full session state.
    async fn replace(&self, session: &ShipmentSession) -> Result<(), StoreError>;
}

/// On-hand inventory counts per warehouse and variant.
#[async_trait::async_trait]
pub trait InventoryStore: Send + Sync {
    /// Current on-hand quantity for each variant at a warehouse.
    /// Variants with no inventory row are absent from the map.
    async fn quantities_on_hand(
        &self,
        warehouse: OrgId,
        variants: &[VariantId],
    ) -> Result<HashMap<VariantId, i64>, StoreError>;

    /// Apply signed quantity deltas (negative = removal) at a warehouse.
    /// Creates missing inventory rows as needed.
    async fn apply_deltas(
        &self,
        warehouse: OrgId,
        deltas: &[(VariantId, i64)],
    ) -> Result<(), StoreError>;
}

/// Variant metadata lookup. Callers should go through the variant cache
/// rather than hitting this directly on the scan path.
#[async_trait::async_trait]
pub trait VariantStore: Send + Sync {
    /// Metadata for each of the given variants. Unknown IDs are absent.
    async fn fetch_meta(
        &self,
        ids: &[VariantId],
    ) -> Result<HashMap<VariantId, VariantMeta>, StoreError>;
}

/// Order line items, consulted when a case has no linked unit codes.
#[async_trait::async_trait]
pub trait OrderLineSource: Send + Sync {
    /// Line items of one order.
    async fn lines_for_order(&self, order_id: OrderId) -> Result<Vec<OrderLine>, StoreError>;
}

/// Append-only movement audit log.
#[async_trait::async_trait]
pub trait MovementLog: Send + Sync {
    /// Record entries, many at a time.
    async fn record(&self, entries: &[MovementLogEntry]) -> Result<(), StoreError>;

    /// Entries for one code, newest first.
    async fn movements_for_code(&self, code_id: CodeId)
    -> Result<Vec<MovementLogEntry>, StoreError>;
}

/// Bundle of store handles the engine is built over.
#[derive(Clone)]
pub struct Stores {
    /// Code lookup and transitions.
    pub codes: Arc<dyn CodeStore>,
    /// Session persistence.
    pub sessions: Arc<dyn SessionStore>,
    /// On-hand inventory.
    pub inventory: Arc<dyn InventoryStore>,
    /// Variant metadata.
    pub variants: Arc<dyn VariantStore>,
    /// Order line fallback.
    pub orders: Arc<dyn OrderLineSource>,
    /// Movement audit log.
    pub movements: Arc<dyn MovementLog>,
}

impl Stores {
    /// Build a bundle from one backend implementing every store trait.
    pub fn from_backend<S>(backend: Arc<S>) -> Self
    where
        S: CodeStore
            + SessionStore
            + InventoryStore
            + VariantStore
            + OrderLineSource
            + MovementLog
            + 'static,
    {
        Self {
            codes: backend.clone(),
            sessions: backend.clone(),
            inventory: backend.clone(),
            variants: backend.clone(),
            orders: backend.clone(),
            movements: backend,
        }
    }
}
