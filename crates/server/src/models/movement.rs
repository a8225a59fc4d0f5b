//! Movement audit log models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use scantrace_core::{CodeId, CodeStatus, OrgId, UserId};

/// One entry in the append-only movement log.
///
/// A row is recorded for every successful code transition. IDs are minted by
/// the writer so batches can insert many entries in one statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementLogEntry {
    /// Unique entry ID.
    pub id: Uuid,
    /// Code that moved.
    pub code_id: CodeId,
    /// Organization holding the goods before the transition.
    pub from_org_id: OrgId,
    /// Organization the goods are bound for.
    pub to_org_id: OrgId,
    /// Code status after the transition.
    pub resulting_status: CodeStatus,
    /// User who performed the scan.
    pub recorded_by: UserId,
    /// When the transition was recorded.
    pub recorded_at: DateTime<Utc>,
    /// Free-form context, e.g. the session the scan belonged to.
    pub notes: Option<String>,
}
