//! Catalog reference data consulted during scans.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use scantrace_core::VariantId;

/// Metadata about a product variant needed to size adjustments.
///
/// Served through the variant cache; see `scan::cache`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantMeta {
    /// Human-readable name for messages and logs.
    pub display_name: String,
    /// How many units one full case of this variant holds, when known.
    pub units_per_case: Option<Decimal>,
}

/// One line of an order, used as the fallback tally for case codes whose
/// unit children were never linked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    /// Variant ordered.
    pub variant_id: VariantId,
    /// Units ordered.
    pub quantity: i32,
}
