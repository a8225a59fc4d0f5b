//! Inventory adjustment arithmetic.
//!
//! Everything here is pure. Reads and writes of actual inventory rows happen
//! in the handlers; this module only decides how much a scan removes and how
//! much it falls short.

use rust_decimal::Decimal;

use scantrace_core::VariantId;

use crate::models::Adjustment;

/// Inputs for sizing one variant's adjustment.
#[derive(Debug, Clone)]
pub struct AdjustmentRequest {
    /// Variant being removed.
    pub variant_id: VariantId,
    /// Units the scan wants to remove.
    pub requested_units: i64,
    /// On-hand quantity before the scan. May be negative if upstream
    /// systems drove the count below zero.
    pub quantity_before: i64,
    /// Units per full case for this variant, when known.
    pub units_per_case: Option<Decimal>,
    /// Whether the scanned case holds exactly one known variant. A full
    /// single-variant case always counts as one case regardless of its size.
    pub single_variant_case: bool,
}

/// Size one adjustment.
///
/// Removal never exceeds what is on hand (clamped at zero for negative
/// counts); the remainder becomes the shortfall. The on-hand count after
/// the removal is floored at zero.
#[must_use]
pub fn compute(req: &AdjustmentRequest) -> Adjustment {
    let available = req.quantity_before.max(0);
    let shortfall = (req.requested_units - available).max(0);
    let units_removed = req.requested_units - shortfall;

    let cases_removed = if req.single_variant_case && units_removed > 0 {
        Decimal::ONE
    } else {
        match req.units_per_case {
            Some(per_case) if per_case > Decimal::ZERO => {
                (Decimal::from(units_removed) / per_case).round_dp(2)
            }
            _ => Decimal::ZERO,
        }
    };

    Adjustment {
        variant_id: Some(req.variant_id),
        requested_units: req.requested_units,
        units_removed,
        cases_removed,
        quantity_before: req.quantity_before,
        quantity_after: (req.quantity_before - units_removed).max(0),
        shortfall,
    }
}

/// Adjustment for a case whose contents could not be resolved to any
/// variant.
///
/// The recorded child count is claimed into session totals as-is and the
/// case counts as one case, but no inventory row is touched, so before and
/// after are zero and there is no shortfall to report.
#[must_use]
pub fn unresolved_case(child_count: i64) -> Adjustment {
    Adjustment {
        variant_id: None,
        requested_units: child_count,
        units_removed: child_count,
        cases_removed: Decimal::ONE,
        quantity_before: 0,
        quantity_after: 0,
        shortfall: 0,
    }
}
