//! Shipment session domain models.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use scantrace_core::{OrgId, SessionId, SessionStatus};

/// Per-variant key used when a case's contents could not be resolved to a
/// known variant.
pub const UNKNOWN_VARIANT_KEY: &str = "unknown";

/// A shipment session: one warehouse-to-distributor handoff in progress.
///
/// The scanned sets and quantity totals are the running aggregate of every
/// accepted scan; they are replaced wholesale on each persist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentSession {
    /// Unique session ID.
    pub id: SessionId,
    /// Warehouse the goods leave from. Scans are validated against it.
    pub source_warehouse_id: OrgId,
    /// Distributor the goods are headed to.
    pub destination_distributor_id: OrgId,
    /// Current session status.
    pub status: SessionStatus,
    /// Case codes accepted into this session.
    pub scanned_case_codes: BTreeSet<String>,
    /// Unit codes accepted into this session.
    pub scanned_unit_codes: BTreeSet<String>,
    /// Aggregated scanned quantities.
    pub quantities: ScannedQuantities,
    /// Shortfalls and warnings accumulated so far.
    pub discrepancy: DiscrepancyReport,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session was last updated.
    pub updated_at: DateTime<Utc>,
}

impl ShipmentSession {
    /// Whether a code string was already scanned into this session,
    /// regardless of kind.
    #[must_use]
    pub fn contains_code(&self, code: &str) -> bool {
        self.scanned_case_codes.contains(code) || self.scanned_unit_codes.contains(code)
    }
}

/// Running quantity totals for a session.
///
/// Totals use claimed quantities: a scan that fell short of on-hand stock
/// still counts its full requested size here, with the gap recorded in the
/// discrepancy report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScannedQuantities {
    /// Total units across all scans.
    pub total_units: i64,
    /// Total cases across all scans. Fractional when loose units partially
    /// fill a case.
    pub total_cases: Decimal,
    /// Per-variant breakdown, keyed by decimal variant ID or
    /// [`UNKNOWN_VARIANT_KEY`].
    pub per_variant: BTreeMap<String, VariantQuantity>,
}

/// Scanned quantity for one variant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariantQuantity {
    /// Units scanned.
    pub units: i64,
    /// Cases scanned.
    pub cases: Decimal,
}

/// Shortfalls and warnings attached to a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscrepancyReport {
    /// One entry per scan that requested more than was on hand.
    pub shortfalls: Vec<ShortfallEntry>,
    /// Deduplicated warning messages.
    pub warnings: Vec<String>,
}

impl DiscrepancyReport {
    /// Whether any shortfall has been recorded.
    #[must_use]
    pub fn has_shortfalls(&self) -> bool {
        !self.shortfalls.is_empty()
    }
}

/// Record of one scan that could not be fully covered by on-hand stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortfallEntry {
    /// Variant key (decimal variant ID or [`UNKNOWN_VARIANT_KEY`]).
    pub variant_key: String,
    /// The code whose scan fell short.
    pub code: String,
    /// Units the scan asked to remove.
    pub requested: i64,
    /// Units actually removed.
    pub units_removed: i64,
    /// The gap between the two.
    pub shortfall: i64,
}

/// Input for creating a new shipment session.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSessionInput {
    /// Warehouse the goods leave from.
    pub source_warehouse_id: OrgId,
    /// Distributor the goods are headed to.
    pub destination_distributor_id: OrgId,
}
