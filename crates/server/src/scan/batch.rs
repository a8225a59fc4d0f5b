//! The scan pipeline shared by single and batch requests.
//!
//! Four phases: prepare (normalize and classify every raw value), prefetch
//! (bulk-read every row the batch can touch), decide (sequential, pure, over
//! the working set), apply (grouped writes). A single scan runs the same
//! pipeline with one element, so batch outcomes match what the same scans
//! would produce issued one at a time.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use futures::future;

use scantrace_core::{CodeId, CodeKind, CodeStatus, OrderId, ScanOutcome, SessionId, VariantId};

use crate::models::{
    BatchOutcome, BatchSummary, MovementLogEntry, OrderLine, ScanRequest, ScanResult,
    ShipmentSession,
};
use crate::scan::cache::VariantMetaCache;
use crate::scan::handler::{handler_for, ScanDecision, ShipPlan, WorkingSet};
use crate::scan::store::Stores;
use crate::scan::{aggregate, normalize, EngineError, ScanActor};

/// One raw scan after the prepare phase.
enum Prepared {
    /// Resolved without touching a store.
    Done(ScanResult),
    /// Normalized and classified, waiting on a decision.
    Pending {
        raw: String,
        token: String,
        kind: CodeKind,
    },
}

/// Writes accumulated while decisions commit to the working set.
#[derive(Default)]
struct PendingWrites {
    transition_ids: Vec<CodeId>,
    detach_ids: Vec<CodeId>,
    deltas: BTreeMap<VariantId, i64>,
    movements: Vec<MovementLogEntry>,
}

impl PendingWrites {
    fn absorb(&mut self, plan: &ShipPlan) {
        self.transition_ids.extend_from_slice(&plan.transition_ids);
        self.detach_ids.extend_from_slice(&plan.detach_ids);
        for adjustment in &plan.adjustments {
            if let Some(variant) = adjustment.variant_id
                && adjustment.units_removed != 0
            {
                *self.deltas.entry(variant).or_insert(0) -= adjustment.units_removed;
            }
        }
        self.movements.push(plan.movement.clone());
    }

    fn is_empty(&self) -> bool {
        self.transition_ids.is_empty()
    }
}

fn prepare(request: &ScanRequest) -> Prepared {
    match normalize::normalize(&request.code) {
        Ok(normalized) => {
            let classified = normalize::classify(normalized, request.kind_hint);
            Prepared::Pending {
                raw: request.code.clone(),
                token: classified.code,
                kind: classified.kind,
            }
        }
        Err(error) => Prepared::Done(ScanResult::invalid_format(
            request.code.clone(),
            error.to_string(),
        )),
    }
}

fn finish(results: Vec<ScanResult>, session: ShipmentSession) -> BatchOutcome {
    let mut summary = BatchSummary::default();
    for result in &results {
        summary.record(result.outcome);
    }
    BatchOutcome {
        results,
        summary,
        session,
    }
}

/// Fail every still-pending scan with an error outcome. Used when a bulk
/// read fails: issued one at a time, each scan would have hit the same
/// error, so the batch reports it per code rather than aborting.
fn fail_all(prepared: Vec<Prepared>, session: ShipmentSession, reason: &str) -> BatchOutcome {
    let results = prepared
        .into_iter()
        .map(|entry| match entry {
            Prepared::Done(result) => result,
            Prepared::Pending { raw, token, kind } => {
                ScanResult::rejected(raw, Some(token), Some(kind), ScanOutcome::Error, reason)
            }
        })
        .collect();
    finish(results, session)
}

pub(super) async fn run(
    stores: &Stores,
    cache: &VariantMetaCache,
    actor: &ScanActor,
    session_id: SessionId,
    scans: &[ScanRequest],
) -> Result<BatchOutcome, EngineError> {
    let session = stores
        .sessions
        .get(session_id)
        .await?
        .ok_or(EngineError::SessionNotFound(session_id))?;

    let prepared: Vec<Prepared> = scans.iter().map(prepare).collect();

    // A closed session takes no scans at all, valid or otherwise.
    if session.status.is_closed() {
        let message = format!("session {session_id} is closed to further scans");
        let results = prepared
            .into_iter()
            .map(|entry| {
                let (raw, token, kind) = match entry {
                    Prepared::Done(result) => (result.code, None, None),
                    Prepared::Pending { raw, token, kind } => (raw, Some(token), Some(kind)),
                };
                ScanResult::rejected(raw, token, kind, ScanOutcome::SessionClosed, message.clone())
            })
            .collect();
        return Ok(finish(results, session));
    }

    // ===========================================================================
    // Prefetch: every row a decision might read, one bulk read per concern
    // ===========================================================================

    let mut tokens: Vec<String> = Vec::new();
    let mut seen = HashSet::new();
    for entry in &prepared {
        if let Prepared::Pending { token, .. } = entry
            && seen.insert(token.clone())
        {
            tokens.push(token.clone());
        }
    }

    let found = match stores.codes.find_by_codes(&tokens).await {
        Ok(found) => found,
        Err(error) => {
            tracing::error!(%error, "code lookup failed");
            return Ok(fail_all(prepared, session, "code lookup failed"));
        }
    };

    let case_ids: Vec<CodeId> = found
        .iter()
        .filter(|code| code.kind == CodeKind::Case)
        .map(|code| code.id)
        .collect();
    let (children, children_failed) = if case_ids.is_empty() {
        (Vec::new(), false)
    } else {
        match stores.codes.children_of_cases(&case_ids).await {
            Ok(children) => (children, false),
            Err(error) => {
                tracing::error!(%error, "child lookup failed");
                (Vec::new(), true)
            }
        }
    };

    // Order lines back up the tally for any case that ends up with no
    // eligible children, which cannot be known until decisions run. The
    // fetches are independent reads, so they fan out.
    let order_ids: BTreeSet<OrderId> = found
        .iter()
        .filter(|code| code.kind == CodeKind::Case)
        .filter_map(|code| code.order_id)
        .collect();
    let line_fetches = future::join_all(order_ids.iter().map(|&order_id| async move {
        (order_id, stores.orders.lines_for_order(order_id).await)
    }))
    .await;
    let mut order_lines: HashMap<OrderId, Vec<OrderLine>> = HashMap::new();
    let mut failed_orders: HashSet<OrderId> = HashSet::new();
    for (order_id, fetched) in line_fetches {
        match fetched {
            Ok(lines) => {
                order_lines.insert(order_id, lines);
            }
            Err(error) => {
                tracing::warn!(%error, %order_id, "order line lookup failed");
                failed_orders.insert(order_id);
            }
        }
    }

    let variant_union: BTreeSet<VariantId> = found
        .iter()
        .chain(children.iter())
        .filter_map(|code| code.variant_id)
        .chain(
            order_lines
                .values()
                .flatten()
                .map(|line| line.variant_id),
        )
        .collect();
    let variant_union: Vec<VariantId> = variant_union.into_iter().collect();

    let meta = match cache.resolve(&variant_union).await {
        Ok(meta) => meta,
        Err(error) => {
            tracing::error!(%error, "variant lookup failed");
            return Ok(fail_all(prepared, session, "variant lookup failed"));
        }
    };
    let inventory = match stores
        .inventory
        .quantities_on_hand(session.source_warehouse_id, &variant_union)
        .await
    {
        Ok(inventory) => inventory,
        Err(error) => {
            tracing::error!(%error, "inventory lookup failed");
            return Ok(fail_all(prepared, session, "inventory lookup failed"));
        }
    };

    let mut by_token = HashMap::with_capacity(found.len());
    let mut codes = HashMap::with_capacity(found.len() + children.len());
    let mut children_by_case: HashMap<CodeId, Vec<CodeId>> = HashMap::new();
    for code in found {
        by_token.insert(code.code.clone(), code.id);
        codes.insert(code.id, code);
    }
    for child in children {
        if let Some(parent) = child.parent_case_id {
            children_by_case.entry(parent).or_default().push(child.id);
        }
        // A directly scanned unit may also arrive as somebody's child; keep
        // the single copy already indexed by token.
        codes.entry(child.id).or_insert(child);
    }

    let warehouse = session.source_warehouse_id;
    let pristine = session.clone();
    let mut ws = WorkingSet {
        warehouse,
        session,
        recorded_by: actor.user_id,
        codes,
        by_token,
        children: children_by_case,
        order_lines,
        failed_orders,
        meta,
        inventory,
    };

    // ===========================================================================
    // Decide: sequential over the working set, merging as scans land
    // ===========================================================================

    let mut results = Vec::with_capacity(prepared.len());
    let mut writes = PendingWrites::default();
    for entry in prepared {
        let (raw, token, classified_kind) = match entry {
            Prepared::Done(result) => {
                results.push(result);
                continue;
            }
            Prepared::Pending { raw, token, kind } => (raw, token, kind),
        };

        let Some(&code_id) = ws.by_token.get(&token) else {
            let message = format!("no {classified_kind} code matches {token}");
            results.push(ScanResult::rejected(
                raw,
                Some(token),
                Some(classified_kind),
                ScanOutcome::NotFound,
                message,
            ));
            continue;
        };

        // The stored kind wins over whatever classification guessed.
        let Some(stored_kind) = ws.codes.get(&code_id).map(|code| code.kind) else {
            results.push(ScanResult::rejected(
                raw,
                Some(token),
                Some(classified_kind),
                ScanOutcome::Error,
                "code record missing from working set",
            ));
            continue;
        };

        if children_failed && stored_kind == CodeKind::Case {
            results.push(ScanResult::rejected(
                raw,
                Some(token),
                Some(stored_kind),
                ScanOutcome::Error,
                "case contents could not be read",
            ));
            continue;
        }

        match handler_for(stored_kind).decide(&ws, code_id) {
            ScanDecision::Reject { outcome, message } => {
                results.push(ScanResult::rejected(
                    raw,
                    Some(token),
                    Some(stored_kind),
                    outcome,
                    message,
                ));
            }
            ScanDecision::Ship(plan) => {
                ws.commit(&plan);
                writes.absorb(&plan);
                let plan = *plan;
                results.push(ScanResult {
                    code: raw,
                    normalized_code: Some(token),
                    code_type: Some(stored_kind),
                    outcome: ScanOutcome::Shipped,
                    message: plan.message,
                    adjustments: plan.adjustments,
                    warnings: plan.warnings,
                    discrepancies: plan.shortfalls,
                    session_update: Some(aggregate::session_update(&ws.session)),
                });
            }
        }
    }

    if writes.is_empty() {
        return Ok(finish(results, ws.session));
    }

    let committed = apply(stores, &mut results, &ws, writes).await;
    let session = if committed { ws.session } else { pristine };
    Ok(finish(results, session))
}

// ===========================================================================
// Apply: grouped writes
// ===========================================================================

/// Persist the accumulated writes. Returns whether the status transitions
/// landed; if they did not, nothing was persisted and the accepted results
/// are downgraded. Failures after that point leave the codes moved, so the
/// scans stay accepted and only gain a warning.
async fn apply(
    stores: &Stores,
    results: &mut [ScanResult],
    ws: &WorkingSet,
    writes: PendingWrites,
) -> bool {
    if let Err(error) = stores
        .codes
        .set_status_and_location(&writes.transition_ids, CodeStatus::WarehousePacked, ws.warehouse)
        .await
    {
        tracing::error!(%error, "status transition failed, no batch effects persisted");
        for result in shipped(results) {
            result.outcome = ScanOutcome::Error;
            result.message = "scan accepted but nothing was persisted".to_owned();
            result.session_update = None;
        }
        return false;
    }

    if !writes.detach_ids.is_empty()
        && let Err(error) = stores.codes.detach_from_parents(&writes.detach_ids).await
    {
        tracing::error!(%error, "loose unit detachment failed");
        push_warning(results, "loose units were not detached from their cases");
    }

    let deltas: Vec<(VariantId, i64)> = writes.deltas.into_iter().collect();
    if !deltas.is_empty()
        && let Err(error) = stores.inventory.apply_deltas(ws.warehouse, &deltas).await
    {
        tracing::error!(%error, "inventory decrement failed");
        push_warning(results, "inventory adjustments were not persisted");
    }

    if let Err(error) = stores.movements.record(&writes.movements).await {
        tracing::error!(%error, "movement log insert failed");
        push_warning(results, "movement history entries were not recorded");
    }

    // The codes are already moved; a stale aggregate catches up on the next
    // successful persist rather than failing the scans.
    if let Err(error) = stores.sessions.replace(&ws.session).await {
        tracing::error!(%error, "session aggregate not persisted");
        push_warning(results, "session totals were not persisted");
    }

    true
}

fn shipped(results: &mut [ScanResult]) -> impl Iterator<Item = &mut ScanResult> {
    results
        .iter_mut()
        .filter(|result| result.outcome == ScanOutcome::Shipped)
}

fn push_warning(results: &mut [ScanResult], warning: &str) {
    for result in shipped(results) {
        result.warnings.push(warning.to_owned());
    }
}
