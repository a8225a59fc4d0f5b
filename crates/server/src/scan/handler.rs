//! Per-kind shipment handlers.
//!
//! A handler turns one found code into a decision: reject with an outcome, or
//! ship with a concrete plan (adjustments, transitions, audit entry). Deciding
//! is pure and works over a [`WorkingSet`] snapshot; committing a plan mutates
//! the working set so later codes in the same batch observe earlier effects
//! exactly as sequential scans would.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use scantrace_core::{CodeId, CodeKind, CodeStatus, OrderId, OrgId, ScanOutcome, UserId, VariantId};

use crate::models::{
    Adjustment, Code, MovementLogEntry, OrderLine, ShipmentSession, ShortfallEntry, VariantMeta,
};
use crate::scan::adjust::{self, AdjustmentRequest};
use crate::scan::aggregate::{self, AcceptedScan};

/// Unit statuses that count toward a case's child tally.
const TALLY_STATUSES: [CodeStatus; 2] = [CodeStatus::ReceivedWarehouse, CodeStatus::WarehousePacked];

/// Everything a scan decision reads, plus the evolving effects of scans
/// committed earlier in the same request.
pub struct WorkingSet {
    /// Warehouse the session ships from.
    pub warehouse: OrgId,
    /// The session, with earlier accepted scans already merged in.
    pub session: ShipmentSession,
    /// User performing the scans, recorded on movement entries.
    pub recorded_by: UserId,
    /// All codes the request touches, by ID. Statuses here reflect
    /// committed plans, not yet the database.
    pub codes: HashMap<CodeId, Code>,
    /// Scanned token to code ID.
    pub by_token: HashMap<String, CodeId>,
    /// Case ID to its child unit IDs (all statuses).
    pub children: HashMap<CodeId, Vec<CodeId>>,
    /// Prefetched order lines for cases that may need the fallback tally.
    pub order_lines: HashMap<OrderId, Vec<OrderLine>>,
    /// Orders whose line fetch failed. A case that needs one of these for
    /// its tally reports an error instead of silently claiming nothing.
    pub failed_orders: HashSet<OrderId>,
    /// Variant metadata for every variant the request may touch.
    pub meta: HashMap<VariantId, VariantMeta>,
    /// Working copy of on-hand quantities at the warehouse, decremented as
    /// plans commit.
    pub inventory: HashMap<VariantId, i64>,
}

impl WorkingSet {
    /// Commit a ship plan: transition codes, detach loose units, deduct the
    /// working inventory, and merge the scan into the session aggregate.
    pub fn commit(&mut self, plan: &ShipPlan) {
        for id in &plan.transition_ids {
            if let Some(code) = self.codes.get_mut(id) {
                code.status = CodeStatus::WarehousePacked;
                code.location_org_id = self.warehouse;
            }
        }
        for id in &plan.detach_ids {
            if let Some(code) = self.codes.get_mut(id) {
                code.parent_case_id = None;
            }
        }
        for adjustment in &plan.adjustments {
            if let Some(variant) = adjustment.variant_id
                && adjustment.units_removed != 0
            {
                *self.inventory.entry(variant).or_insert(0) -= adjustment.units_removed;
            }
        }
        aggregate::merge(
            &mut self.session,
            &AcceptedScan {
                kind: plan.kind,
                code: &plan.token,
                adjustments: &plan.adjustments,
                shortfalls: &plan.shortfalls,
                warnings: &plan.warnings,
            },
        );
    }

    fn variant_name(&self, variant: VariantId) -> String {
        self.meta.get(&variant).map_or_else(
            || format!("variant {variant}"),
            |meta| meta.display_name.clone(),
        )
    }

    fn on_hand(&self, variant: VariantId) -> i64 {
        self.inventory.get(&variant).copied().unwrap_or(0)
    }

    fn units_per_case(&self, variant: VariantId) -> Option<Decimal> {
        self.meta.get(&variant).and_then(|meta| meta.units_per_case)
    }
}

/// What a handler decided for one code.
pub enum ScanDecision {
    /// Rejected before any mutation.
    Reject {
        /// Why.
        outcome: ScanOutcome,
        /// Operator-facing explanation.
        message: String,
    },
    /// Accepted; the plan describes every effect.
    Ship(Box<ShipPlan>),
}

/// Concrete effects of one accepted scan.
pub struct ShipPlan {
    /// Scanned token.
    pub token: String,
    /// Kind of the scanned code.
    pub kind: CodeKind,
    /// Codes to move to `warehouse_packed` at the warehouse: the scanned
    /// code plus, for cases, the children counted in its tally.
    pub transition_ids: Vec<CodeId>,
    /// Loose units to detach from their parent case.
    pub detach_ids: Vec<CodeId>,
    /// Inventory adjustments, one per variant.
    pub adjustments: Vec<Adjustment>,
    /// Shortfall entries this scan introduces.
    pub shortfalls: Vec<ShortfallEntry>,
    /// Warnings this scan raises.
    pub warnings: Vec<String>,
    /// Audit entry for the scanned code.
    pub movement: MovementLogEntry,
    /// Operator-facing summary.
    pub message: String,
}

/// Kind-specific scan behavior behind a common seam.
pub trait ShipmentHandler: Send + Sync {
    /// Decide what scanning this code does. Pure with respect to stores;
    /// reads only the working set.
    fn decide(&self, ws: &WorkingSet, code_id: CodeId) -> ScanDecision;
}

/// Handler for case codes.
pub struct CaseHandler;

/// Handler for unit codes.
pub struct UnitHandler;

/// Dispatch on the stored kind of a code.
#[must_use]
pub fn handler_for(kind: CodeKind) -> &'static dyn ShipmentHandler {
    match kind {
        CodeKind::Case => &CaseHandler,
        CodeKind::Unit => &UnitHandler,
    }
}

/// Rejections shared by both kinds, in precedence order: location, terminal
/// status, session membership, then the kind's legality set.
fn common_rejection(ws: &WorkingSet, code: &Code) -> Option<(ScanOutcome, String)> {
    if !code.located_at(ws.session.source_warehouse_id) {
        return Some((
            ScanOutcome::WrongWarehouse,
            format!(
                "{} {} is not at the session's source warehouse",
                code.kind, code.code
            ),
        ));
    }
    if code.status == CodeStatus::ShippedDistributor {
        return Some((
            ScanOutcome::AlreadyShipped,
            format!("{} {} was already shipped to a distributor", code.kind, code.code),
        ));
    }
    if ws.session.contains_code(&code.code) {
        return Some((
            ScanOutcome::Duplicate,
            format!("{} {} was already scanned in this session", code.kind, code.code),
        ));
    }
    if !code.status.warehouse_shippable(code.kind) {
        return Some((
            ScanOutcome::InvalidStatus,
            format!(
                "{} {} cannot ship from status {}",
                code.kind, code.code, code.status
            ),
        ));
    }
    None
}

fn movement_for(ws: &WorkingSet, code: &Code) -> MovementLogEntry {
    MovementLogEntry {
        id: Uuid::new_v4(),
        code_id: code.id,
        from_org_id: code.location_org_id,
        to_org_id: ws.session.destination_distributor_id,
        resulting_status: CodeStatus::WarehousePacked,
        recorded_by: ws.recorded_by,
        recorded_at: Utc::now(),
        notes: Some(format!("shipment session {}", ws.session.id)),
    }
}

/// Size adjustments for a per-variant tally, collecting shortfall entries
/// and warnings as it goes.
fn adjust_tally(
    ws: &WorkingSet,
    token: &str,
    tally: &BTreeMap<VariantId, i64>,
    single_variant_case: bool,
) -> (Vec<Adjustment>, Vec<ShortfallEntry>, Vec<String>) {
    let mut adjustments = Vec::with_capacity(tally.len());
    let mut shortfalls = Vec::new();
    let mut warnings = Vec::new();

    for (&variant, &requested) in tally {
        let adjustment = adjust::compute(&AdjustmentRequest {
            variant_id: variant,
            requested_units: requested,
            quantity_before: ws.on_hand(variant),
            units_per_case: ws.units_per_case(variant),
            single_variant_case,
        });

        if adjustment.shortfall > 0 {
            warnings.push(format!(
                "{} short by {} units of {}",
                token,
                adjustment.shortfall,
                ws.variant_name(variant)
            ));
            shortfalls.push(ShortfallEntry {
                variant_key: adjustment.variant_key(),
                code: token.to_owned(),
                requested: adjustment.requested_units,
                units_removed: adjustment.units_removed,
                shortfall: adjustment.shortfall,
            });
        }
        adjustments.push(adjustment);
    }

    (adjustments, shortfalls, warnings)
}

impl ShipmentHandler for CaseHandler {
    fn decide(&self, ws: &WorkingSet, code_id: CodeId) -> ScanDecision {
        let Some(code) = ws.codes.get(&code_id) else {
            return ScanDecision::Reject {
                outcome: ScanOutcome::Error,
                message: "case disappeared from the working set".to_owned(),
            };
        };
        if let Some((outcome, message)) = common_rejection(ws, code) {
            return ScanDecision::Reject { outcome, message };
        }

        // Tally cascade: linked children, then the originating order's
        // lines, then the recorded child count as an unknown bucket. The
        // parent check matters within a batch: a loose unit shipped moments
        // ago has already been detached in the working set.
        let eligible: Vec<&Code> = ws
            .children
            .get(&code_id)
            .into_iter()
            .flatten()
            .filter_map(|id| ws.codes.get(id))
            .filter(|child| {
                child.parent_case_id == Some(code_id) && TALLY_STATUSES.contains(&child.status)
            })
            .collect();

        let mut warnings = Vec::new();
        let mut tally: BTreeMap<VariantId, i64> = BTreeMap::new();
        let mut unlinked_children = 0_i64;
        for child in &eligible {
            match child.variant_id {
                Some(variant) => *tally.entry(variant).or_insert(0) += 1,
                None => unlinked_children += 1,
            }
        }
        if unlinked_children > 0 {
            warnings.push(format!(
                "{}: {unlinked_children} linked units carry no variant and were not tallied",
                code.code
            ));
        }

        let mut transition_ids = vec![code.id];
        let (adjustments, shortfalls, tally_warnings) = if tally.is_empty() {
            if let Some(order) = code.order_id
                && ws.failed_orders.contains(&order)
            {
                return ScanDecision::Reject {
                    outcome: ScanOutcome::Error,
                    message: format!("{}: order lines could not be read", code.code),
                };
            }
            let from_order = code
                .order_id
                .and_then(|order| ws.order_lines.get(&order))
                .map(|lines| {
                    let mut order_tally: BTreeMap<VariantId, i64> = BTreeMap::new();
                    for line in lines {
                        *order_tally.entry(line.variant_id).or_insert(0) +=
                            i64::from(line.quantity);
                    }
                    order_tally
                })
                .filter(|order_tally| !order_tally.is_empty());

            if let Some(order_tally) = from_order {
                let single = order_tally.len() == 1;
                adjust_tally(ws, &code.code, &order_tally, single)
            } else {
                // Contents unresolvable; claim the recorded child count
                // without touching inventory.
                warnings.push(format!(
                    "{}: contents unknown, claimed recorded child count of {}",
                    code.code, code.child_count
                ));
                (
                    vec![adjust::unresolved_case(i64::from(code.child_count))],
                    Vec::new(),
                    Vec::new(),
                )
            }
        } else {
            // Children counted in the tally travel with the case.
            transition_ids.extend(eligible.iter().map(|child| child.id));
            let single = tally.len() == 1 && unlinked_children == 0;
            adjust_tally(ws, &code.code, &tally, single)
        };
        warnings.extend(tally_warnings);

        let total_units: i64 = adjustments.iter().map(|a| a.requested_units).sum();
        let message = format!(
            "case {} shipped: {} units across {} variant(s)",
            code.code,
            total_units,
            adjustments.len()
        );

        ScanDecision::Ship(Box::new(ShipPlan {
            token: code.code.clone(),
            kind: CodeKind::Case,
            transition_ids,
            detach_ids: Vec::new(),
            adjustments,
            shortfalls,
            warnings,
            movement: movement_for(ws, code),
            message,
        }))
    }
}

impl ShipmentHandler for UnitHandler {
    fn decide(&self, ws: &WorkingSet, code_id: CodeId) -> ScanDecision {
        let Some(code) = ws.codes.get(&code_id) else {
            return ScanDecision::Reject {
                outcome: ScanOutcome::Error,
                message: "unit disappeared from the working set".to_owned(),
            };
        };
        if let Some((outcome, message)) = common_rejection(ws, code) {
            return ScanDecision::Reject { outcome, message };
        }

        let mut warnings = Vec::new();
        let mut shortfalls = Vec::new();
        let adjustment = match code.variant_id {
            Some(variant) => {
                let adjustment = adjust::compute(&AdjustmentRequest {
                    variant_id: variant,
                    requested_units: 1,
                    quantity_before: ws.on_hand(variant),
                    units_per_case: None,
                    single_variant_case: false,
                });
                if adjustment.shortfall > 0 {
                    warnings.push(format!(
                        "{} short by 1 unit of {}",
                        code.code,
                        ws.variant_name(variant)
                    ));
                    shortfalls.push(ShortfallEntry {
                        variant_key: adjustment.variant_key(),
                        code: code.code.clone(),
                        requested: 1,
                        units_removed: adjustment.units_removed,
                        shortfall: adjustment.shortfall,
                    });
                }
                adjustment
            }
            None => {
                warnings.push(format!(
                    "{}: unit carries no variant, claimed without inventory adjustment",
                    code.code
                ));
                Adjustment {
                    variant_id: None,
                    requested_units: 1,
                    units_removed: 1,
                    cases_removed: Decimal::ZERO,
                    quantity_before: 0,
                    quantity_after: 0,
                    shortfall: 0,
                }
            }
        };

        // A loose unit leaves its case behind so a later scan of the case
        // cannot count it again.
        let detach_ids = if code.parent_case_id.is_some() {
            vec![code.id]
        } else {
            Vec::new()
        };

        let message = format!("unit {} shipped", code.code);
        ScanDecision::Ship(Box::new(ShipPlan {
            token: code.code.clone(),
            kind: CodeKind::Unit,
            transition_ids: vec![code.id],
            detach_ids,
            adjustments: vec![adjustment],
            shortfalls,
            warnings,
            movement: movement_for(ws, code),
            message,
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use scantrace_core::{OrderId, SessionId, SessionStatus};

    use crate::models::{DiscrepancyReport, ScannedQuantities, VariantMeta};

    use super::*;

    const WAREHOUSE: OrgId = OrgId::new(10);
    const DISTRIBUTOR: OrgId = OrgId::new(20);

    fn code(id: i32, token: &str, kind: CodeKind, status: CodeStatus) -> Code {
        Code {
            id: CodeId::new(id),
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

    fn unit(id: i32, token: &str, variant: i32, parent: Option<i32>) -> Code {
        Code {
            variant_id: Some(VariantId::new(variant)),
            parent_case_id: parent.map(CodeId::new),
            ..code(id, token, CodeKind::Unit, CodeStatus::ReceivedWarehouse)
        }
    }

    fn working_set() -> WorkingSet {
        WorkingSet {
            warehouse: WAREHOUSE,
            session: ShipmentSession {
                id: SessionId::new(1),
                source_warehouse_id: WAREHOUSE,
                destination_distributor_id: DISTRIBUTOR,
                status: SessionStatus::Pending,
                scanned_case_codes: std::collections::BTreeSet::new(),
                scanned_unit_codes: std::collections::BTreeSet::new(),
                quantities: ScannedQuantities::default(),
                discrepancy: DiscrepancyReport::default(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            recorded_by: UserId::new(99),
            codes: HashMap::new(),
            by_token: HashMap::new(),
            children: HashMap::new(),
            order_lines: HashMap::new(),
            failed_orders: HashSet::new(),
            meta: HashMap::new(),
            inventory: HashMap::new(),
        }
    }

    fn add_code(ws: &mut WorkingSet, code: Code) {
        ws.by_token.insert(code.code.clone(), code.id);
        ws.codes.insert(code.id, code);
    }

    fn ship(decision: ScanDecision) -> Box<ShipPlan> {
        match decision {
            ScanDecision::Ship(plan) => plan,
            ScanDecision::Reject { outcome, message } => {
                panic!("expected ship, got {outcome}: {message}")
            }
        }
    }

    fn reject(decision: ScanDecision) -> (ScanOutcome, String) {
        match decision {
            ScanDecision::Reject { outcome, message } => (outcome, message),
            ScanDecision::Ship(_) => panic!("expected rejection"),
        }
    }

    #[test]
    fn wrong_warehouse_beats_status_problems() {
        let mut ws = working_set();
        let mut case = code(1, "MC-1", CodeKind::Case, CodeStatus::Pending);
        case.location_org_id = OrgId::new(55);
        add_code(&mut ws, case);

        let (outcome, _) = reject(CaseHandler.decide(&ws, CodeId::new(1)));
        assert_eq!(outcome, ScanOutcome::WrongWarehouse);
    }

    #[test]
    fn shipped_code_reports_already_shipped_even_if_in_session() {
        let mut ws = working_set();
        add_code(
            &mut ws,
            code(1, "MC-1", CodeKind::Case, CodeStatus::ShippedDistributor),
        );
        ws.session.scanned_case_codes.insert("MC-1".to_owned());

        let (outcome, _) = reject(CaseHandler.decide(&ws, CodeId::new(1)));
        assert_eq!(outcome, ScanOutcome::AlreadyShipped);
    }

    #[test]
    fn session_membership_reports_duplicate() {
        let mut ws = working_set();
        add_code(
            &mut ws,
            code(1, "MC-1", CodeKind::Case, CodeStatus::ReceivedWarehouse),
        );
        ws.session.scanned_case_codes.insert("MC-1".to_owned());

        let (outcome, _) = reject(CaseHandler.decide(&ws, CodeId::new(1)));
        assert_eq!(outcome, ScanOutcome::Duplicate);
    }

    #[test]
    fn pre_warehouse_status_is_invalid() {
        let mut ws = working_set();
        add_code(&mut ws, code(1, "MC-1", CodeKind::Case, CodeStatus::Printed));

        let (outcome, message) = reject(CaseHandler.decide(&ws, CodeId::new(1)));
        assert_eq!(outcome, ScanOutcome::InvalidStatus);
        assert!(message.contains("printed"));
    }

    #[test]
    fn case_tallies_eligible_children_and_propagates() {
        let mut ws = working_set();
        let mut case = code(1, "MC-1", CodeKind::Case, CodeStatus::ReceivedWarehouse);
        case.child_count = 3;
        add_code(&mut ws, case);
        add_code(&mut ws, unit(2, "U-1", 7, Some(1)));
        add_code(&mut ws, unit(3, "U-2", 7, Some(1)));
        // Already past the warehouse; stays out of the tally and the
        // propagation list.
        let mut gone = unit(4, "U-3", 7, Some(1));
        gone.status = CodeStatus::ShippedDistributor;
        add_code(&mut ws, gone);
        ws.children.insert(
            CodeId::new(1),
            vec![CodeId::new(2), CodeId::new(3), CodeId::new(4)],
        );
        ws.inventory.insert(VariantId::new(7), 50);
        ws.meta.insert(
            VariantId::new(7),
            VariantMeta {
                display_name: "Widget".to_owned(),
                units_per_case: Some(Decimal::from(2)),
            },
        );

        let plan = ship(CaseHandler.decide(&ws, CodeId::new(1)));
        assert_eq!(plan.adjustments.len(), 1);
        assert_eq!(plan.adjustments[0].requested_units, 2);
        assert_eq!(plan.adjustments[0].units_removed, 2);
        // Single known variant: one case regardless of the per-case ratio.
        assert_eq!(plan.adjustments[0].cases_removed, Decimal::ONE);
        assert_eq!(
            plan.transition_ids,
            vec![CodeId::new(1), CodeId::new(2), CodeId::new(3)]
        );
        assert!(plan.detach_ids.is_empty());
    }

    #[test]
    fn case_without_children_falls_back_to_order_lines() {
        let mut ws = working_set();
        let mut case = code(1, "MC-1", CodeKind::Case, CodeStatus::ReceivedWarehouse);
        case.order_id = Some(OrderId::new(500));
        add_code(&mut ws, case);
        ws.order_lines.insert(
            OrderId::new(500),
            vec![
                OrderLine {
                    variant_id: VariantId::new(7),
                    quantity: 30,
                },
                OrderLine {
                    variant_id: VariantId::new(8),
                    quantity: 20,
                },
            ],
        );
        ws.inventory.insert(VariantId::new(7), 100);
        ws.inventory.insert(VariantId::new(8), 5);

        let plan = ship(CaseHandler.decide(&ws, CodeId::new(1)));
        assert_eq!(plan.adjustments.len(), 2);
        // Only the case itself transitions; there are no linked children.
        assert_eq!(plan.transition_ids, vec![CodeId::new(1)]);
        // Variant 8 is short: 20 requested, 5 on hand.
        let short = plan
            .adjustments
            .iter()
            .find(|a| a.variant_id == Some(VariantId::new(8)))
            .unwrap();
        assert_eq!(short.shortfall, 15);
        assert_eq!(plan.shortfalls.len(), 1);
    }

    #[test]
    fn case_with_nothing_resolvable_claims_child_count() {
        let mut ws = working_set();
        let mut case = code(1, "MC-1", CodeKind::Case, CodeStatus::ReadyToShip);
        case.child_count = 36;
        add_code(&mut ws, case);

        let plan = ship(CaseHandler.decide(&ws, CodeId::new(1)));
        assert_eq!(plan.adjustments.len(), 1);
        assert_eq!(plan.adjustments[0].variant_id, None);
        assert_eq!(plan.adjustments[0].units_removed, 36);
        assert_eq!(plan.adjustments[0].cases_removed, Decimal::ONE);
        assert!(plan.warnings.iter().any(|w| w.contains("contents unknown")));
        assert!(plan.shortfalls.is_empty());
    }

    #[test]
    fn unit_requests_exactly_one() {
        let mut ws = working_set();
        add_code(&mut ws, unit(2, "PROD-7742", 7, None));
        ws.inventory.insert(VariantId::new(7), 10);

        let plan = ship(UnitHandler.decide(&ws, CodeId::new(2)));
        assert_eq!(plan.adjustments.len(), 1);
        assert_eq!(plan.adjustments[0].requested_units, 1);
        assert_eq!(plan.adjustments[0].units_removed, 1);
        assert_eq!(plan.adjustments[0].cases_removed, Decimal::ZERO);
        assert!(plan.detach_ids.is_empty());
    }

    #[test]
    fn zero_stock_unit_ships_with_shortfall() {
        let mut ws = working_set();
        add_code(&mut ws, unit(2, "PROD-7742", 7, None));

        let plan = ship(UnitHandler.decide(&ws, CodeId::new(2)));
        assert_eq!(plan.adjustments[0].units_removed, 0);
        assert_eq!(plan.adjustments[0].shortfall, 1);
        assert_eq!(plan.shortfalls.len(), 1);
        assert!(!plan.warnings.is_empty());
    }

    #[test]
    fn loose_unit_detaches_from_its_case() {
        let mut ws = working_set();
        let mut child = unit(2, "PROD-1", 7, Some(1));
        child.status = CodeStatus::Packed;
        add_code(&mut ws, child);
        ws.inventory.insert(VariantId::new(7), 10);

        let plan = ship(UnitHandler.decide(&ws, CodeId::new(2)));
        assert_eq!(plan.detach_ids, vec![CodeId::new(2)]);

        let mut ws = ws;
        ws.commit(&plan);
        assert_eq!(ws.codes.get(&CodeId::new(2)).unwrap().parent_case_id, None);
        assert_eq!(
            ws.codes.get(&CodeId::new(2)).unwrap().status,
            CodeStatus::WarehousePacked
        );
        assert_eq!(ws.inventory.get(&VariantId::new(7)), Some(&9));
        assert!(ws.session.scanned_unit_codes.contains("PROD-1"));
    }

    #[test]
    fn ready_to_ship_case_is_shippable() {
        let mut ws = working_set();
        let mut case = code(1, "MC-1", CodeKind::Case, CodeStatus::ReadyToShip);
        case.child_count = 1;
        add_code(&mut ws, case);

        assert!(matches!(
            CaseHandler.decide(&ws, CodeId::new(1)),
            ScanDecision::Ship(_)
        ));
    }

    #[test]
    fn packed_unit_is_shippable_but_packed_case_is_not() {
        let mut ws = working_set();
        let mut loose = unit(2, "PROD-1", 7, None);
        loose.status = CodeStatus::Packed;
        add_code(&mut ws, loose);
        add_code(&mut ws, code(1, "MC-1", CodeKind::Case, CodeStatus::Packed));
        ws.inventory.insert(VariantId::new(7), 10);

        assert!(matches!(
            UnitHandler.decide(&ws, CodeId::new(2)),
            ScanDecision::Ship(_)
        ));
        let (outcome, _) = reject(CaseHandler.decide(&ws, CodeId::new(1)));
        assert_eq!(outcome, ScanOutcome::InvalidStatus);
    }

    #[test]
    fn movement_entry_targets_the_distributor() {
        let mut ws = working_set();
        add_code(&mut ws, unit(2, "PROD-1", 7, None));
        ws.inventory.insert(VariantId::new(7), 10);

        let plan = ship(UnitHandler.decide(&ws, CodeId::new(2)));
        assert_eq!(plan.movement.from_org_id, WAREHOUSE);
        assert_eq!(plan.movement.to_org_id, DISTRIBUTOR);
        assert_eq!(plan.movement.resulting_status, CodeStatus::WarehousePacked);
        assert_eq!(plan.movement.recorded_by, UserId::new(99));
    }
}
