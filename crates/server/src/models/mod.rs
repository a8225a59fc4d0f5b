//! Domain models for the scan and reconciliation engine.

pub mod catalog;
pub mod code;
pub mod movement;
pub mod scan;
pub mod session;

pub use catalog::{OrderLine, VariantMeta};
pub use code::Code;
pub use movement::MovementLogEntry;
pub use scan::{
    Adjustment, BatchOutcome, BatchScanRequest, BatchSummary, ScanRequest, ScanResult,
    SessionUpdate,
};
pub use session::{
    CreateSessionInput, DiscrepancyReport, ScannedQuantities, ShipmentSession, ShortfallEntry,
    UNKNOWN_VARIANT_KEY, VariantQuantity,
};
