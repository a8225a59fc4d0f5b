//! Shipment scanning engine.
//!
//! Turns raw scanned values into inventory movements: codes are normalized,
//! classified, validated against the session's source warehouse, tallied,
//! and deducted from on-hand stock, with every accepted scan merged into the
//! session aggregate and recorded in the movement log.

pub mod adjust;
pub mod aggregate;
mod batch;
pub mod cache;
pub mod handler;
pub mod memory;
pub mod normalize;
pub mod store;

use std::time::Duration;

use thiserror::Error;
use tracing::instrument;

use scantrace_core::{OrgId, SessionId, UserId};

use crate::models::{
    BatchOutcome, BatchScanRequest, CreateSessionInput, MovementLogEntry, ScanRequest, ScanResult,
    ShipmentSession,
};
use crate::scan::cache::VariantMetaCache;

pub use crate::scan::store::{StoreError, Stores};

/// Who is scanning, taken from the authenticated request.
#[derive(Debug, Clone, Copy)]
pub struct ScanActor {
    /// Operator performing the scan, recorded on movement entries.
    pub user_id: UserId,
    /// Warehouse organization the operator is signed in under.
    pub warehouse_org_id: OrgId,
}

/// Failures the engine surfaces to its callers. Per-code problems are not
/// errors; they come back as scan results with a rejection outcome.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The target session does not exist.
    #[error("session {0} not found")]
    SessionNotFound(SessionId),
    /// No code row matches the requested code.
    #[error("code {0:?} not found")]
    CodeNotFound(String),
    /// The requested code failed normalization.
    #[error(transparent)]
    InvalidCode(#[from] normalize::NormalizeError),
    /// The pipeline returned fewer results than scans. Indicates a bug.
    #[error("scan pipeline produced no result")]
    Pipeline,
    /// A store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The engine: store handles plus a read-through variant metadata cache.
///
/// Cheap to clone via the shared store handles; one instance serves all
/// requests.
#[derive(Clone)]
pub struct ScanEngine {
    stores: Stores,
    cache: VariantMetaCache,
}

impl ScanEngine {
    /// Build an engine over the given stores. Variant metadata is cached
    /// read-through for `variant_cache_ttl`.
    #[must_use]
    pub fn new(stores: Stores, variant_cache_ttl: Duration) -> Self {
        let cache = VariantMetaCache::new(stores.variants.clone(), variant_cache_ttl);
        Self { stores, cache }
    }

    /// Open a shipment session from a warehouse to a distributor.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be persisted.
    #[instrument(skip(self), fields(warehouse = %input.source_warehouse_id, distributor = %input.destination_distributor_id))]
    pub async fn create_session(
        &self,
        input: &CreateSessionInput,
    ) -> Result<ShipmentSession, EngineError> {
        let session = self.stores.sessions.create(input).await?;
        tracing::info!(session_id = %session.id, "shipment session opened");
        Ok(session)
    }

    /// Fetch a session with its scan aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SessionNotFound`] if no such session exists,
    /// or an error if the store fails.
    pub async fn session(&self, id: SessionId) -> Result<ShipmentSession, EngineError> {
        self.stores
            .sessions
            .get(id)
            .await?
            .ok_or(EngineError::SessionNotFound(id))
    }

    /// Process one scanned value against a session.
    ///
    /// Every per-code problem is reported in the result's outcome; an `Err`
    /// here means the session is missing or a store failed outright.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SessionNotFound`] if the session does not
    /// exist, or an error if the session could not be read.
    #[instrument(skip(self, request), fields(session_id = %session_id, user_id = %actor.user_id))]
    pub async fn scan_code(
        &self,
        actor: &ScanActor,
        session_id: SessionId,
        request: ScanRequest,
    ) -> Result<ScanResult, EngineError> {
        let outcome = batch::run(
            &self.stores,
            &self.cache,
            actor,
            session_id,
            std::slice::from_ref(&request),
        )
        .await?;

        let mut results = outcome.results;
        let result = match results.pop() {
            Some(result) if results.is_empty() => result,
            _ => return Err(EngineError::Pipeline),
        };
        tracing::info!(outcome = %result.outcome, "scan processed");
        Ok(result)
    }

    /// Process a batch of scans in submission order.
    ///
    /// Outcomes match what the same scans would produce issued one at a
    /// time against the same starting state.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SessionNotFound`] if the session does not
    /// exist, or an error if the session could not be read.
    #[instrument(skip(self, request), fields(session_id = %session_id, user_id = %actor.user_id, scans = request.scans.len()))]
    pub async fn scan_batch(
        &self,
        actor: &ScanActor,
        session_id: SessionId,
        request: &BatchScanRequest,
    ) -> Result<BatchOutcome, EngineError> {
        let outcome = batch::run(
            &self.stores,
            &self.cache,
            actor,
            session_id,
            &request.scans,
        )
        .await?;
        tracing::info!(
            total = outcome.summary.total,
            success = outcome.summary.success,
            duplicates = outcome.summary.duplicates,
            errors = outcome.summary.errors,
            "batch processed"
        );
        Ok(outcome)
    }

    /// Movement history for a code, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidCode`] if the value does not normalize,
    /// [`EngineError::CodeNotFound`] if no code row matches, or an error if
    /// a store fails.
    #[instrument(skip(self))]
    pub async fn code_movements(&self, raw: &str) -> Result<Vec<MovementLogEntry>, EngineError> {
        let token = normalize::normalize(raw)?;
        let code = self
            .stores
            .codes
            .find_by_code(&token)
            .await?
            .ok_or_else(|| EngineError::CodeNotFound(token))?;
        Ok(self.stores.movements.movements_for_code(code.id).await?)
    }
}
