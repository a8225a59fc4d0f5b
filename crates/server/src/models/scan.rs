//! Scan request and result models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use scantrace_core::{CodeKind, ScanOutcome, SessionId, SessionStatus, VariantId};

use super::session::{ShortfallEntry, UNKNOWN_VARIANT_KEY};

/// One raw scan submitted by a client.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanRequest {
    /// The scanned value exactly as captured.
    pub code: String,
    /// Optional caller-supplied kind, e.g. from a dedicated scan screen.
    /// Wins over classification heuristics.
    #[serde(default)]
    pub kind_hint: Option<CodeKind>,
}

/// A batch of raw scans processed as one request.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchScanRequest {
    /// Scans in client capture order. Order is preserved in the results.
    pub scans: Vec<ScanRequest>,
}

/// Inventory consequence of one scan for one variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Adjustment {
    /// Variant adjusted, or `None` for the unknown bucket.
    pub variant_id: Option<VariantId>,
    /// Units the scan asked to remove.
    pub requested_units: i64,
    /// Units actually removed from on-hand stock.
    pub units_removed: i64,
    /// Case equivalent of the removal.
    pub cases_removed: Decimal,
    /// On-hand quantity before the removal.
    pub quantity_before: i64,
    /// On-hand quantity after the removal. Never negative.
    pub quantity_after: i64,
    /// Units requested but not covered by on-hand stock.
    pub shortfall: i64,
}

impl Adjustment {
    /// Session aggregation key for this adjustment's variant.
    #[must_use]
    pub fn variant_key(&self) -> String {
        self.variant_id
            .map_or_else(|| UNKNOWN_VARIANT_KEY.to_owned(), |id| id.to_string())
    }
}

/// Session state echoed back to the scanner after a merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUpdate {
    /// Session the scan merged into.
    pub session_id: SessionId,
    /// Session status after the merge.
    pub status: SessionStatus,
    /// Total units scanned so far.
    pub total_units: i64,
    /// Total cases scanned so far.
    pub total_cases: Decimal,
    /// Distinct case codes scanned so far.
    pub case_count: usize,
    /// Distinct unit codes scanned so far.
    pub unit_count: usize,
}

/// Full outcome of scanning one code.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    /// The scanned value exactly as submitted.
    pub code: String,
    /// Normalized form, when normalization succeeded.
    pub normalized_code: Option<String>,
    /// Kind the code resolved (or was guessed) to.
    pub code_type: Option<CodeKind>,
    /// What happened.
    pub outcome: ScanOutcome,
    /// Human-readable explanation.
    pub message: String,
    /// Inventory adjustments applied, one per variant touched.
    pub adjustments: Vec<Adjustment>,
    /// Warnings raised by this scan.
    pub warnings: Vec<String>,
    /// Shortfall entries introduced by this scan.
    pub discrepancies: Vec<ShortfallEntry>,
    /// Session state after merging, for accepted scans.
    pub session_update: Option<SessionUpdate>,
}

impl ScanResult {
    /// A scan rejected before any inventory work.
    #[must_use]
    pub fn rejected(
        code: impl Into<String>,
        normalized_code: Option<String>,
        code_type: Option<CodeKind>,
        outcome: ScanOutcome,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            normalized_code,
            code_type,
            outcome,
            message: message.into(),
            adjustments: Vec::new(),
            warnings: Vec::new(),
            discrepancies: Vec::new(),
            session_update: None,
        }
    }

    /// A raw value that could not be normalized into a code.
    #[must_use]
    pub fn invalid_format(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::rejected(code, None, None, ScanOutcome::InvalidFormat, message)
    }
}

/// Per-batch tally of result outcomes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    /// Scans submitted.
    pub total: usize,
    /// Scans that shipped goods.
    pub success: usize,
    /// Scans rejected as duplicates.
    pub duplicates: usize,
    /// Scans that failed on infrastructure errors.
    pub errors: usize,
}

impl BatchSummary {
    /// Fold one result outcome into the tally.
    pub fn record(&mut self, outcome: ScanOutcome) {
        self.total += 1;
        match outcome {
            ScanOutcome::Shipped => self.success += 1,
            ScanOutcome::Duplicate => self.duplicates += 1,
            ScanOutcome::Error => self.errors += 1,
            _ => {}
        }
    }
}

/// Everything a batch scan produced.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    /// Per-scan results, in submission order.
    pub results: Vec<ScanResult>,
    /// Outcome tally.
    pub summary: BatchSummary,
    /// The session after all merges.
    pub session: super::session::ShipmentSession,
}
