//! Folding accepted scans into the running session aggregate.
//!
//! Pure mutation of an in-memory [`ShipmentSession`]; persistence is the
//! caller's problem. Only `shipped` results reach this module.

use chrono::Utc;

use scantrace_core::{CodeKind, SessionStatus};

use crate::models::{Adjustment, SessionUpdate, ShipmentSession, ShortfallEntry};

/// One accepted scan, reduced to what the session aggregate needs.
#[derive(Debug)]
pub struct AcceptedScan<'a> {
    /// Kind of the scanned code, deciding which code set it joins.
    pub kind: CodeKind,
    /// Normalized code string.
    pub code: &'a str,
    /// Adjustments the scan applied.
    pub adjustments: &'a [Adjustment],
    /// Shortfall entries the scan introduced.
    pub shortfalls: &'a [ShortfallEntry],
    /// Warnings the scan raised.
    pub warnings: &'a [String],
}

/// Merge one accepted scan into the session.
///
/// Quantities use claimed semantics: a scan counts its full requested size
/// (`units_removed + shortfall`) so the session reflects what was physically
/// scanned even when inventory fell short; the gap lives in the discrepancy
/// report. Warnings deduplicate by value. A shortfall flips the session to
/// `discrepancy`, and that status never reverts.
pub fn merge(session: &mut ShipmentSession, scan: &AcceptedScan<'_>) {
    let codes = match scan.kind {
        CodeKind::Case => &mut session.scanned_case_codes,
        CodeKind::Unit => &mut session.scanned_unit_codes,
    };
    codes.insert(scan.code.to_owned());

    for adjustment in scan.adjustments {
        let claimed_units = adjustment.units_removed + adjustment.shortfall;
        session.quantities.total_units += claimed_units;
        session.quantities.total_cases += adjustment.cases_removed;

        let per_variant = session
            .quantities
            .per_variant
            .entry(adjustment.variant_key())
            .or_default();
        per_variant.units += claimed_units;
        per_variant.cases += adjustment.cases_removed;
    }

    session
        .discrepancy
        .shortfalls
        .extend(scan.shortfalls.iter().cloned());
    for warning in scan.warnings {
        if !session.discrepancy.warnings.contains(warning) {
            session.discrepancy.warnings.push(warning.clone());
        }
    }

    if !scan.shortfalls.is_empty() {
        session.status = SessionStatus::Discrepancy;
    }
    session.updated_at = Utc::now();
}

/// Snapshot the session into the update echoed back to the scanner.
#[must_use]
pub fn session_update(session: &ShipmentSession) -> SessionUpdate {
    SessionUpdate {
        session_id: session.id,
        status: session.status,
        total_units: session.quantities.total_units,
        total_cases: session.quantities.total_cases,
        case_count: session.scanned_case_codes.len(),
        unit_count: session.scanned_unit_codes.len(),
    }
}
