//! Status enums for codes, shipment sessions, and scan results.
//!
//! The stringly forms (serde, `Display`, `FromStr`) are the wire and storage
//! forms: codes and sessions persist their status as snake_case text, and the
//! scan API reports outcomes with the same spelling.

use serde::{Deserialize, Serialize};

/// Error returned when a stored or scanned value does not match any known
/// variant of the target enum.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized {what}: {value:?}")]
pub struct UnknownValue {
    /// Name of the enum being parsed.
    pub what: &'static str,
    /// The offending input.
    pub value: String,
}

impl UnknownValue {
    fn new(what: &'static str, value: &str) -> Self {
        Self {
            what,
            value: value.to_owned(),
        }
    }
}

/// Kind of scannable code.
///
/// A case code identifies a shipping case that groups many unit codes; a
/// unit code identifies one physical item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeKind {
    Case,
    Unit,
}

impl CodeKind {
    /// The snake_case storage form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Case => "case",
            Self::Unit => "unit",
        }
    }
}

impl std::fmt::Display for CodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CodeKind {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "case" => Ok(Self::Case),
            "unit" => Ok(Self::Unit),
            _ => Err(UnknownValue::new("code kind", s)),
        }
    }
}

/// Lifecycle status of a code.
///
/// Case codes move forward through `pending → printed → packed →
/// received_warehouse → warehouse_packed → shipped_distributor →
/// received_distributor → opened`, with `ready_to_ship` as an optional
/// staging stop before shipment. Unit codes share the same vocabulary but
/// use `packed` (packed into a case at the warehouse) instead of
/// `ready_to_ship`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeStatus {
    Pending,
    Printed,
    Packed,
    ReceivedWarehouse,
    WarehousePacked,
    ReadyToShip,
    ShippedDistributor,
    ReceivedDistributor,
    Opened,
}

impl CodeStatus {
    /// The snake_case storage form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Printed => "printed",
            Self::Packed => "packed",
            Self::ReceivedWarehouse => "received_warehouse",
            Self::WarehousePacked => "warehouse_packed",
            Self::ReadyToShip => "ready_to_ship",
            Self::ShippedDistributor => "shipped_distributor",
            Self::ReceivedDistributor => "received_distributor",
            Self::Opened => "opened",
        }
    }

    /// Whether a code of the given kind may be scanned into an outbound
    /// warehouse shipment from this status.
    ///
    /// Everything else is either not yet at the warehouse (`pending`,
    /// `printed`, and for cases `packed`) or already past it.
    #[must_use]
    pub const fn warehouse_shippable(self, kind: CodeKind) -> bool {
        match kind {
            CodeKind::Case => matches!(
                self,
                Self::ReceivedWarehouse | Self::WarehousePacked | Self::ReadyToShip
            ),
            CodeKind::Unit => matches!(
                self,
                Self::ReceivedWarehouse | Self::Packed | Self::WarehousePacked
            ),
        }
    }
}

impl std::fmt::Display for CodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CodeStatus {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "printed" => Ok(Self::Printed),
            "packed" => Ok(Self::Packed),
            "received_warehouse" => Ok(Self::ReceivedWarehouse),
            "warehouse_packed" => Ok(Self::WarehousePacked),
            "ready_to_ship" => Ok(Self::ReadyToShip),
            "shipped_distributor" => Ok(Self::ShippedDistributor),
            "received_distributor" => Ok(Self::ReceivedDistributor),
            "opened" => Ok(Self::Opened),
            _ => Err(UnknownValue::new("code status", s)),
        }
    }
}

/// Lifecycle status of a shipment session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Open for scanning; nothing reconciled yet.
    #[default]
    Pending,
    /// Reconciled with no shortfalls.
    Matched,
    /// At least one scan fell short of on-hand inventory.
    Discrepancy,
    /// Signed off; no further scans accepted.
    Approved,
}

impl SessionStatus {
    /// The snake_case storage form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Matched => "matched",
            Self::Discrepancy => "discrepancy",
            Self::Approved => "approved",
        }
    }

    /// Whether the session has been approved and no longer accepts scans.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Approved)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "matched" => Ok(Self::Matched),
            "discrepancy" => Ok(Self::Discrepancy),
            "approved" => Ok(Self::Approved),
            _ => Err(UnknownValue::new("session status", s)),
        }
    }
}

/// Outcome of scanning one code against a shipment session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanOutcome {
    /// Accepted; inventory adjusted and the session updated.
    Shipped,
    /// The code was already at `shipped_distributor` before this scan.
    AlreadyShipped,
    /// No code row matches the scanned value.
    NotFound,
    /// The code exists but its status does not allow outbound shipment.
    InvalidStatus,
    /// The raw scan could not be normalized into a code.
    InvalidFormat,
    /// The code is not located at the session's source warehouse.
    WrongWarehouse,
    /// The session is approved and accepts no further scans.
    SessionClosed,
    /// The code was already scanned into this session.
    Duplicate,
    /// An infrastructure failure prevented processing this code.
    Error,
}

impl ScanOutcome {
    /// The snake_case wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shipped => "shipped",
            Self::AlreadyShipped => "already_shipped",
            Self::NotFound => "not_found",
            Self::InvalidStatus => "invalid_status",
            Self::InvalidFormat => "invalid_format",
            Self::WrongWarehouse => "wrong_warehouse",
            Self::SessionClosed => "session_closed",
            Self::Duplicate => "duplicate",
            Self::Error => "error",
        }
    }

    /// Whether the scan moved goods (only `shipped` does).
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Shipped)
    }
}

impl std::fmt::Display for ScanOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    const ALL_CODE_STATUSES: [CodeStatus; 9] = [
        CodeStatus::Pending,
        CodeStatus::Printed,
        CodeStatus::Packed,
        CodeStatus::ReceivedWarehouse,
        CodeStatus::WarehousePacked,
        CodeStatus::ReadyToShip,
        CodeStatus::ShippedDistributor,
        CodeStatus::ReceivedDistributor,
        CodeStatus::Opened,
    ];

    #[test]
    fn code_status_display_round_trips() {
        for status in ALL_CODE_STATUSES {
            assert_eq!(CodeStatus::from_str(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn code_status_serde_matches_storage_form() {
        let json = serde_json::to_string(&CodeStatus::ShippedDistributor).unwrap();
        assert_eq!(json, "\"shipped_distributor\"");
        let status: CodeStatus = serde_json::from_str("\"ready_to_ship\"").unwrap();
        assert_eq!(status, CodeStatus::ReadyToShip);
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = CodeStatus::from_str("teleported").unwrap_err();
        assert_eq!(err.what, "code status");
        assert_eq!(err.value, "teleported");
    }

    #[test]
    fn case_shippable_statuses() {
        let allowed = [
            CodeStatus::ReceivedWarehouse,
            CodeStatus::WarehousePacked,
            CodeStatus::ReadyToShip,
        ];
        for status in ALL_CODE_STATUSES {
            assert_eq!(
                status.warehouse_shippable(CodeKind::Case),
                allowed.contains(&status),
                "case from {status}"
            );
        }
    }

    #[test]
    fn unit_shippable_statuses() {
        let allowed = [
            CodeStatus::ReceivedWarehouse,
            CodeStatus::Packed,
            CodeStatus::WarehousePacked,
        ];
        for status in ALL_CODE_STATUSES {
            assert_eq!(
                status.warehouse_shippable(CodeKind::Unit),
                allowed.contains(&status),
                "unit from {status}"
            );
        }
    }

    #[test]
    fn only_approved_sessions_are_closed() {
        assert!(SessionStatus::Approved.is_closed());
        assert!(!SessionStatus::Pending.is_closed());
        assert!(!SessionStatus::Matched.is_closed());
        assert!(!SessionStatus::Discrepancy.is_closed());
    }

    #[test]
    fn only_shipped_counts_as_success() {
        assert!(ScanOutcome::Shipped.is_success());
        assert!(!ScanOutcome::Duplicate.is_success());
        assert!(!ScanOutcome::Error.is_success());
    }

    #[test]
    fn outcome_wire_form_is_snake_case() {
        assert_eq!(
            serde_json::to_string(&ScanOutcome::AlreadyShipped).unwrap(),
            "\"already_shipped\""
        );
        assert_eq!(ScanOutcome::WrongWarehouse.as_str(), "wrong_warehouse");
    }
}
