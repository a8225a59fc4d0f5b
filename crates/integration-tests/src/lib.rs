//! Integration tests for Scantrace.
//!
//! The suites under `tests/` drive the scan engine end-to-end through its
//! public API over the in-memory store backend, so they run without a
//! database.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p scantrace-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `scan_shortfalls` - shortfall accounting when stock runs out
//! - `scan_case_contents` - how case contents are resolved and tallied
//! - `scan_rejections` - every rejection outcome and its side-effect freedom
//! - `scan_batches` - batch processing vs. one-at-a-time scanning
//! - `scan_outages` - store failures and how far their blast radius reaches
//! - `session_lifecycle` - session aggregate, closure, movement history

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;

use scantrace_core::{
    CodeId, CodeKind, CodeStatus, OrderId, OrgId, SessionId, SessionStatus, UserId, VariantId,
};
use scantrace_server::models::{
    BatchOutcome, BatchScanRequest, Code, CreateSessionInput, MovementLogEntry, OrderLine,
    ScanRequest, ScanResult, ShipmentSession, VariantMeta,
};
use scantrace_server::scan::memory::InMemoryStore;
use scantrace_server::scan::store::{
    CodeStore, InventoryStore, MovementLog, OrderLineSource, SessionStore, StoreError,
    VariantStore,
};
use scantrace_server::scan::{ScanActor, ScanEngine, Stores};

/// Warehouse organization every harness session ships from.
pub const WAREHOUSE: OrgId = OrgId::new(10);
/// Distributor organization every harness session ships to.
pub const DISTRIBUTOR: OrgId = OrgId::new(20);
/// Operator recorded on movement entries.
pub const OPERATOR: UserId = UserId::new(7);

/// A scan engine wired over a seeded in-memory backend.
///
/// Seeding goes through the helpers here; assertions can reach the backend
/// directly for snapshots of codes, inventory, and movements.
pub struct ScanHarness {
    pub engine: ScanEngine,
    pub backend: Arc<InMemoryStore>,
    next_code_id: AtomicI32,
}

/// Failure switches for a harness built with [`ScanHarness::with_outages`].
///
/// Each switch makes the matching store call fail from the moment it is
/// thrown, so a test can seed and scan normally and then take one backend
/// concern down.
#[derive(Default)]
pub struct Outages {
    code_lookups: AtomicBool,
    child_lookups: AtomicBool,
    order_lines: AtomicBool,
    transitions: AtomicBool,
}

impl Outages {
    /// Fail bulk code lookups.
    pub fn fail_code_lookups(&self) {
        self.code_lookups.store(true, Ordering::SeqCst);
    }

    /// Fail case-children lookups.
    pub fn fail_child_lookups(&self) {
        self.child_lookups.store(true, Ordering::SeqCst);
    }

    /// Fail order line reads.
    pub fn fail_order_lines(&self) {
        self.order_lines.store(true, Ordering::SeqCst);
    }

    /// Fail code status transitions.
    pub fn fail_transitions(&self) {
        self.transitions.store(true, Ordering::SeqCst);
    }

    /// Bring every failed concern back up.
    pub fn restore(&self) {
        self.code_lookups.store(false, Ordering::SeqCst);
        self.child_lookups.store(false, Ordering::SeqCst);
        self.order_lines.store(false, Ordering::SeqCst);
        self.transitions.store(false, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::DataCorruption("store offline".to_owned()))
        } else {
            Ok(())
        }
    }
}

/// An [`InMemoryStore`] whose calls can be made to fail on demand.
struct OutageBackend {
    inner: Arc<InMemoryStore>,
    outages: Arc<Outages>,
}

#[async_trait::async_trait]
impl CodeStore for OutageBackend {
    async fn find_by_code(&self, code: &str) -> Result<Option<Code>, StoreError> {
        self.inner.find_by_code(code).await
    }

    async fn find_by_codes(&self, codes: &[String]) -> Result<Vec<Code>, StoreError> {
        Outages::check(&self.outages.code_lookups)?;
        self.inner.find_by_codes(codes).await
    }

    async fn children_of_cases(&self, case_ids: &[CodeId]) -> Result<Vec<Code>, StoreError> {
        Outages::check(&self.outages.child_lookups)?;
        self.inner.children_of_cases(case_ids).await
    }

    async fn set_status_and_location(
        &self,
        ids: &[CodeId],
        status: CodeStatus,
        location: OrgId,
    ) -> Result<(), StoreError> {
        Outages::check(&self.outages.transitions)?;
        self.inner.set_status_and_location(ids, status, location).await
    }

    async fn detach_from_parents(&self, ids: &[CodeId]) -> Result<(), StoreError> {
        self.inner.detach_from_parents(ids).await
    }
}

#[async_trait::async_trait]
impl SessionStore for OutageBackend {
    async fn create(&self, input: &CreateSessionInput) -> Result<ShipmentSession, StoreError> {
        self.inner.create(input).await
    }

    async fn get(&self, id: SessionId) -> Result<Option<ShipmentSession>, StoreError> {
        self.inner.get(id).await
    }

    async fn replace(&self, session: &ShipmentSession) -> Result<(), StoreError> {
        self.inner.replace(session).await
    }
}

#[async_trait::async_trait]
impl InventoryStore for OutageBackend {
    async fn quantities_on_hand(
        &self,
        warehouse: OrgId,
        variants: &[VariantId],
    ) -> Result<HashMap<VariantId, i64>, StoreError> {
        self.inner.quantities_on_hand(warehouse, variants).await
    }

    async fn apply_deltas(
        &self,
        warehouse: OrgId,
        deltas: &[(VariantId, i64)],
    ) -> Result<(), StoreError> {
        self.inner.apply_deltas(warehouse, deltas).await
    }
}

#[async_trait::async_trait]
impl VariantStore for OutageBackend {
    async fn fetch_meta(
        &self,
        ids: &[VariantId],
    ) -> Result<HashMap<VariantId, VariantMeta>, StoreError> {
        self.inner.fetch_meta(ids).await
    }
}

#[async_trait::async_trait]
impl OrderLineSource for OutageBackend {
    async fn lines_for_order(&self, order_id: OrderId) -> Result<Vec<OrderLine>, StoreError> {
        Outages::check(&self.outages.order_lines)?;
        self.inner.lines_for_order(order_id).await
    }
}

#[async_trait::async_trait]
impl MovementLog for OutageBackend {
    async fn record(&self, entries: &[MovementLogEntry]) -> Result<(), StoreError> {
        self.inner.record(entries).await
    }

    async fn movements_for_code(
        &self,
        code_id: CodeId,
    ) -> Result<Vec<MovementLogEntry>, StoreError> {
        self.inner.movements_for_code(code_id).await
    }
}

impl ScanHarness {
    /// Create a harness with an empty backend.
    #[must_use]
    pub fn new() -> Self {
        let backend = Arc::new(InMemoryStore::new());
        let stores = Stores::from_backend(backend.clone());
        Self {
            engine: ScanEngine::new(stores, Duration::from_secs(300)),
            backend,
            next_code_id: AtomicI32::new(0),
        }
    }

    /// Create a harness whose backend fails on demand. Seeding and
    /// assertions still go through the inner store directly, so they work
    /// even while an outage is active.
    #[must_use]
    pub fn with_outages() -> (Self, Arc<Outages>) {
        let backend = Arc::new(InMemoryStore::new());
        let outages = Arc::new(Outages::default());
        let stores = Stores::from_backend(Arc::new(OutageBackend {
            inner: backend.clone(),
            outages: outages.clone(),
        }));
        (
            Self {
                engine: ScanEngine::new(stores, Duration::from_secs(300)),
                backend,
                next_code_id: AtomicI32::new(0),
            },
            outages,
        )
    }

    /// The operator submitting scans, signed in at [`WAREHOUSE`].
    #[must_use]
    pub const fn actor(&self) -> ScanActor {
        ScanActor {
            user_id: OPERATOR,
            warehouse_org_id: WAREHOUSE,
        }
    }

    /// Seed a variant with a display name and optional units-per-case.
    pub fn variant(&self, id: i32, name: &str, units_per_case: Option<i64>) {
        self.backend.insert_variant(
            VariantId::new(id),
            VariantMeta {
                display_name: name.to_owned(),
                units_per_case: units_per_case.map(Decimal::from),
            },
        );
    }

    /// Seed on-hand stock at the warehouse.
    pub fn stock(&self, variant: i32, quantity: i64) {
        self.backend
            .set_inventory(WAREHOUSE, VariantId::new(variant), quantity);
    }

    /// On-hand stock at the warehouse, for assertions.
    #[must_use]
    pub fn on_hand(&self, variant: i32) -> i64 {
        self.backend.on_hand(WAREHOUSE, VariantId::new(variant))
    }

    /// Seed order line items.
    pub fn order(&self, order_id: i32, lines: &[(i32, i32)]) {
        self.backend.insert_order_lines(
            OrderId::new(order_id),
            lines
                .iter()
                .map(|&(variant, quantity)| OrderLine {
                    variant_id: VariantId::new(variant),
                    quantity,
                })
                .collect(),
        );
    }

    /// A blank code at the warehouse with a freshly minted ID. Tests adjust
    /// fields before handing it to [`Self::add_code`].
    #[must_use]
    pub fn code(&self, token: &str, kind: CodeKind, status: CodeStatus) -> Code {
        Code {
            id: CodeId::new(self.next_code_id.fetch_add(1, Ordering::SeqCst) + 1),
            code: token.to_owned(),
            kind,
            status,
            location_org_id: WAREHOUSE,
            variant_id: None,
            parent_case_id: None,
            order_id: None,
            child_count: 0,
            case_sequence: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// Seed an arbitrary code.
    pub fn add_code(&self, code: Code) -> CodeId {
        let id = code.id;
        self.backend.insert_code(code);
        id
    }

    /// Seed a case in `received_warehouse` status.
    pub fn add_case(&self, token: &str, order_id: Option<i32>, child_count: i32) -> CodeId {
        self.add_code(Code {
            order_id: order_id.map(OrderId::new),
            child_count,
            ..self.code(token, CodeKind::Case, CodeStatus::ReceivedWarehouse)
        })
    }

    /// Seed a loose unit in `received_warehouse` status.
    pub fn add_unit(&self, token: &str, variant: i32) -> CodeId {
        self.add_code(Code {
            variant_id: Some(VariantId::new(variant)),
            ..self.code(token, CodeKind::Unit, CodeStatus::ReceivedWarehouse)
        })
    }

    /// Seed a unit linked into a case.
    pub fn add_unit_in_case(
        &self,
        token: &str,
        variant: i32,
        parent: CodeId,
        sequence: i32,
    ) -> CodeId {
        self.add_code(Code {
            variant_id: Some(VariantId::new(variant)),
            parent_case_id: Some(parent),
            case_sequence: Some(sequence),
            ..self.code(token, CodeKind::Unit, CodeStatus::ReceivedWarehouse)
        })
    }

    /// Open a pending session from [`WAREHOUSE`] to [`DISTRIBUTOR`].
    ///
    /// # Panics
    ///
    /// Panics if the session cannot be created.
    pub async fn open_session(&self) -> SessionId {
        self.engine
            .create_session(&CreateSessionInput {
                source_warehouse_id: WAREHOUSE,
                destination_distributor_id: DISTRIBUTOR,
            })
            .await
            .expect("create session")
            .id
    }

    /// Fetch a session.
    ///
    /// # Panics
    ///
    /// Panics if the session does not exist.
    pub async fn session(&self, id: SessionId) -> ShipmentSession {
        self.engine.session(id).await.expect("fetch session")
    }

    /// Mark a session approved so further scans are rejected.
    ///
    /// # Panics
    ///
    /// Panics if the session does not exist.
    pub async fn approve_session(&self, id: SessionId) {
        let mut session = self.session(id).await;
        session.status = SessionStatus::Approved;
        self.backend
            .replace(&session)
            .await
            .expect("replace session");
    }

    /// Scan one raw value against a session.
    ///
    /// # Panics
    ///
    /// Panics if the engine reports a processing failure (not a per-code
    /// rejection).
    pub async fn scan(&self, session: SessionId, raw: &str) -> ScanResult {
        self.engine
            .scan_code(
                &self.actor(),
                session,
                ScanRequest {
                    code: raw.to_owned(),
                    kind_hint: None,
                },
            )
            .await
            .expect("scan")
    }

    /// Scan a batch of raw values against a session.
    ///
    /// # Panics
    ///
    /// Panics if the engine reports a processing failure.
    pub async fn scan_batch(&self, session: SessionId, raws: &[&str]) -> BatchOutcome {
        let request = BatchScanRequest {
            scans: raws
                .iter()
                .map(|raw| ScanRequest {
                    code: (*raw).to_owned(),
                    kind_hint: None,
                })
                .collect(),
        };
        self.engine
            .scan_batch(&self.actor(), session, &request)
            .await
            .expect("scan batch")
    }
}

impl Default for ScanHarness {
    fn default() -> Self {
        Self::new()
    }
}
