//! In-memory store backend.
//!
//! Backs the engine in tests and local development. Not optimized; every
//! collection sits behind a plain `RwLock`, which is fine because locks are
//! only held for the duration of a synchronous map operation.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};

use chrono::Utc;

use scantrace_core::{CodeId, CodeStatus, OrderId, OrgId, SessionId, SessionStatus, VariantId};

use crate::models::{
    Code, CreateSessionInput, DiscrepancyReport, MovementLogEntry, OrderLine, ScannedQuantities,
    ShipmentSession, VariantMeta,
};

use super::store::{
    CodeStore, InventoryStore, MovementLog, OrderLineSource, SessionStore, StoreError,
    VariantStore,
};

fn poisoned() -> StoreError {
    StoreError::DataCorruption("lock poisoned".to_owned())
}

/// One backend implementing every store trait.
///
/// The fetch counters exist so tests can assert how often the engine
/// actually hit the store (cache effectiveness, batched reads).
#[derive(Default)]
pub struct InMemoryStore {
    codes: RwLock<HashMap<String, Code>>,
    sessions: RwLock<HashMap<SessionId, ShipmentSession>>,
    next_session_id: AtomicI32,
    inventory: RwLock<HashMap<(OrgId, VariantId), i64>>,
    variants: RwLock<HashMap<VariantId, VariantMeta>>,
    order_lines: RwLock<HashMap<OrderId, Vec<OrderLine>>>,
    movements: RwLock<Vec<MovementLogEntry>>,
    variant_fetches: AtomicUsize,
    inventory_reads: AtomicUsize,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a code.
    ///
    /// # Panics
    ///
    /// Panics if the code lock is poisoned.
    pub fn insert_code(&self, code: Code) {
        self.codes
            .write()
            .expect("codes lock")
            .insert(code.code.clone(), code);
    }

    /// Seed on-hand inventory for a warehouse and variant.
    ///
    /// # Panics
    ///
    /// Panics if the inventory lock is poisoned.
    pub fn set_inventory(&self, warehouse: OrgId, variant: VariantId, quantity: i64) {
        self.inventory
            .write()
            .expect("inventory lock")
            .insert((warehouse, variant), quantity);
    }

    /// Seed variant metadata.
    ///
    /// # Panics
    ///
    /// Panics if the variant lock is poisoned.
    pub fn insert_variant(&self, id: VariantId, meta: VariantMeta) {
        self.variants.write().expect("variants lock").insert(id, meta);
    }

    /// Seed order line items.
    ///
    /// # Panics
    ///
    /// Panics if the order lock is poisoned.
    pub fn insert_order_lines(&self, order_id: OrderId, lines: Vec<OrderLine>) {
        self.order_lines
            .write()
            .expect("orders lock")
            .insert(order_id, lines);
    }

    /// Current state of a code, for assertions.
    ///
    /// # Panics
    ///
    /// Panics if the code lock is poisoned.
    #[must_use]
    pub fn code_snapshot(&self, code: &str) -> Option<Code> {
        self.codes.read().expect("codes lock").get(code).cloned()
    }

    /// Current on-hand quantity, for assertions. Missing rows read as zero.
    ///
    /// # Panics
    ///
    /// Panics if the inventory lock is poisoned.
    #[must_use]
    pub fn on_hand(&self, warehouse: OrgId, variant: VariantId) -> i64 {
        self.inventory
            .read()
            .expect("inventory lock")
            .get(&(warehouse, variant))
            .copied()
            .unwrap_or(0)
    }

    /// Recorded movement entries, for assertions.
    ///
    /// # Panics
    ///
    /// Panics if the movement lock is poisoned.
    #[must_use]
    pub fn movement_count(&self) -> usize {
        self.movements.read().expect("movements lock").len()
    }

    /// How many times `fetch_meta` hit this store.
    #[must_use]
    pub fn variant_fetch_count(&self) -> usize {
        self.variant_fetches.load(Ordering::SeqCst)
    }

    /// How many times `quantities_on_hand` hit this store.
    #[must_use]
    pub fn inventory_read_count(&self) -> usize {
        self.inventory_reads.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl CodeStore for InMemoryStore {
    async fn find_by_code(&self, code: &str) -> Result<Option<Code>, StoreError> {
        let codes = self.codes.read().map_err(|_| poisoned())?;
        Ok(codes.get(code).cloned())
    }

    async fn find_by_codes(&self, lookup: &[String]) -> Result<Vec<Code>, StoreError> {
        let codes = self.codes.read().map_err(|_| poisoned())?;
        Ok(lookup.iter().filter_map(|c| codes.get(c).cloned()).collect())
    }

    async fn children_of_cases(&self, case_ids: &[CodeId]) -> Result<Vec<Code>, StoreError> {
        let codes = self.codes.read().map_err(|_| poisoned())?;
        let mut children: Vec<Code> = codes
            .values()
            .filter(|code| code.parent_case_id.is_some_and(|p| case_ids.contains(&p)))
            .cloned()
            .collect();
        children.sort_by_key(|code| code.id);
        Ok(children)
    }

    async fn set_status_and_location(
        &self,
        ids: &[CodeId],
        status: CodeStatus,
        location: OrgId,
    ) -> Result<(), StoreError> {
        let mut codes = self.codes.write().map_err(|_| poisoned())?;
        for code in codes.values_mut() {
            if ids.contains(&code.id) {
                code.status = status;
                code.location_org_id = location;
                code.updated_at = Utc::now();
            }
        }
        Ok(())
    }

    async fn detach_from_parents(&self, ids: &[CodeId]) -> Result<(), StoreError> {
        let mut codes = self.codes.write().map_err(|_| poisoned())?;
        for code in codes.values_mut() {
            if ids.contains(&code.id) {
                code.parent_case_id = None;
                code.updated_at = Utc::now();
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl SessionStore for InMemoryStore {
    async fn create(&self, input: &CreateSessionInput) -> Result<ShipmentSession, StoreError> {
        let id = SessionId::new(self.next_session_id.fetch_add(1, Ordering::SeqCst) + 1);
        let now = Utc::now();
        let session = ShipmentSession {
            id,
            source_warehouse_id: input.source_warehouse_id,
            destination_distributor_id: input.destination_distributor_id,
            status: SessionStatus::Pending,
            scanned_case_codes: std::collections::BTreeSet::new(),
            scanned_unit_codes: std::collections::BTreeSet::new(),
            quantities: ScannedQuantities::default(),
            discrepancy: DiscrepancyReport::default(),
            created_at: now,
            updated_at: now,
        };
        self.sessions
            .write()
            .map_err(|_| poisoned())?
            .insert(id, session.clone());
        Ok(session)
    }

    async fn get(&self, id: SessionId) -> Result<Option<ShipmentSession>, StoreError> {
        let sessions = self.sessions.read().map_err(|_| poisoned())?;
        Ok(sessions.get(&id).cloned())
    }

    async fn replace(&self, session: &ShipmentSession) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().map_err(|_| poisoned())?;
        if !sessions.contains_key(&session.id) {
            return Err(StoreError::NotFound);
        }
        sessions.insert(session.id, session.clone());
        Ok(())
    }
}

#[async_trait::async_trait]
impl InventoryStore for InMemoryStore {
    async fn quantities_on_hand(
        &self,
        warehouse: OrgId,
        variants: &[VariantId],
    ) -> Result<HashMap<VariantId, i64>, StoreError> {
        self.inventory_reads.fetch_add(1, Ordering::SeqCst);
        let inventory = self.inventory.read().map_err(|_| poisoned())?;
        Ok(variants
            .iter()
            .filter_map(|&v| inventory.get(&(warehouse, v)).map(|&q| (v, q)))
            .collect())
    }

    async fn apply_deltas(
        &self,
        warehouse: OrgId,
        deltas: &[(VariantId, i64)],
    ) -> Result<(), StoreError> {
        let mut inventory = self.inventory.write().map_err(|_| poisoned())?;
        for &(variant, delta) in deltas {
            *inventory.entry((warehouse, variant)).or_insert(0) += delta;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl VariantStore for InMemoryStore {
    async fn fetch_meta(
        &self,
        ids: &[VariantId],
    ) -> Result<HashMap<VariantId, VariantMeta>, StoreError> {
        self.variant_fetches.fetch_add(1, Ordering::SeqCst);
        let variants = self.variants.read().map_err(|_| poisoned())?;
        Ok(ids
            .iter()
            .filter_map(|id| variants.get(id).map(|meta| (*id, meta.clone())))
            .collect())
    }
}

#[async_trait::async_trait]
impl OrderLineSource for InMemoryStore {
    async fn lines_for_order(&self, order_id: OrderId) -> Result<Vec<OrderLine>, StoreError> {
        let orders = self.order_lines.read().map_err(|_| poisoned())?;
        Ok(orders.get(&order_id).cloned().unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl MovementLog for InMemoryStore {
    async fn record(&self, entries: &[MovementLogEntry]) -> Result<(), StoreError> {
        let mut movements = self.movements.write().map_err(|_| poisoned())?;
        movements.extend(entries.iter().cloned());
        Ok(())
    }

    async fn movements_for_code(
        &self,
        code_id: CodeId,
    ) -> Result<Vec<MovementLogEntry>, StoreError> {
        let movements = self.movements.read().map_err(|_| poisoned())?;
        let mut history: Vec<MovementLogEntry> = movements
            .iter()
            .filter(|entry| entry.code_id == code_id)
            .cloned()
            .collect();
        history.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        Ok(history)
    }
}
