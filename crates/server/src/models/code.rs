//! Scannable code domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use scantrace_core::{CodeId, CodeKind, CodeStatus, OrderId, OrgId, VariantId};

/// A scannable code attached to physical goods.
///
/// One row covers both kinds: a case code groups many unit codes, a unit
/// code identifies a single item. Kind-specific fields are optional and
/// populated according to `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Code {
    /// Unique code ID.
    pub id: CodeId,
    /// The scanned string itself. Unique across both kinds.
    pub code: String,
    /// Whether this is a case or a unit code.
    pub kind: CodeKind,
    /// Current lifecycle status.
    pub status: CodeStatus,
    /// Organization currently holding the goods.
    pub location_org_id: OrgId,
    /// Product variant this code's goods belong to. Unit codes always carry
    /// one; case codes only when the case was printed for a single variant.
    pub variant_id: Option<VariantId>,
    /// For unit codes: the case this unit was packed into, if any.
    pub parent_case_id: Option<CodeId>,
    /// For case codes: the order this case was printed for, if any.
    pub order_id: Option<OrderId>,
    /// For case codes: number of unit codes printed into this case.
    pub child_count: i32,
    /// For case codes: 1-based position within the order's case run.
    pub case_sequence: Option<i32>,
    /// When the code was created.
    pub created_at: DateTime<Utc>,
    /// When the code was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Code {
    /// Whether the code currently sits at the given warehouse.
    #[must_use]
    pub fn located_at(&self, warehouse: OrgId) -> bool {
        self.location_org_id == warehouse
    }
}
