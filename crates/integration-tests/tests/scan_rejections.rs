//! Every rejection outcome and its side-effect freedom.
//!
//! Rejections are business outcomes, not errors: each one is reported on
//! the result and leaves codes, inventory, the movement log, and the
//! session aggregate untouched.

use scantrace_core::{CodeKind, CodeStatus, OrgId, ScanOutcome};
use scantrace_integration_tests::{ScanHarness, WAREHOUSE};

#[tokio::test]
async fn unknown_code_is_not_found() {
    let h = ScanHarness::new();
    let session = h.open_session().await;

    let result = h.scan(session, "MC-9999").await;
    assert_eq!(result.outcome, ScanOutcome::NotFound);
    assert_eq!(result.normalized_code.as_deref(), Some("MC-9999"));
    assert!(result.adjustments.is_empty());
    assert_eq!(h.backend.movement_count(), 0);
}

#[tokio::test]
async fn blank_scan_is_invalid_format() {
    let h = ScanHarness::new();
    let session = h.open_session().await;

    let result = h.scan(session, "   ").await;
    assert_eq!(result.outcome, ScanOutcome::InvalidFormat);
    assert_eq!(result.normalized_code, None);
    assert_eq!(result.code_type, None);
}

#[tokio::test]
async fn code_at_another_warehouse_is_rejected_untouched() {
    let h = ScanHarness::new();
    let mut case = h.code("MC-0001", CodeKind::Case, CodeStatus::ReceivedWarehouse);
    case.location_org_id = OrgId::new(99);
    h.add_code(case);
    let session = h.open_session().await;

    let result = h.scan(session, "MC-0001").await;
    assert_eq!(result.outcome, ScanOutcome::WrongWarehouse);

    let snapshot = h.backend.code_snapshot("MC-0001").expect("seeded code");
    assert_eq!(snapshot.location_org_id, OrgId::new(99));
    assert_eq!(snapshot.status, CodeStatus::ReceivedWarehouse);
    assert_eq!(h.session(session).await.quantities.total_units, 0);
}

#[tokio::test]
async fn already_shipped_code_mutates_nothing() {
    let h = ScanHarness::new();
    h.add_code(h.code("MC-0001", CodeKind::Case, CodeStatus::ShippedDistributor));
    let session = h.open_session().await;

    let result = h.scan(session, "MC-0001").await;
    assert_eq!(result.outcome, ScanOutcome::AlreadyShipped);
    assert!(result.adjustments.is_empty());
    assert!(result.session_update.is_none());

    let session = h.session(session).await;
    assert!(session.scanned_case_codes.is_empty());
    assert_eq!(session.quantities.total_units, 0);
    assert_eq!(h.backend.movement_count(), 0);
}

#[tokio::test]
async fn premature_status_is_invalid_with_the_status_named() {
    let h = ScanHarness::new();
    h.add_code(h.code("MC-0001", CodeKind::Case, CodeStatus::Printed));
    let session = h.open_session().await;

    let result = h.scan(session, "MC-0001").await;
    assert_eq!(result.outcome, ScanOutcome::InvalidStatus);
    assert!(result.message.contains("printed"), "{}", result.message);

    let snapshot = h.backend.code_snapshot("MC-0001").expect("seeded code");
    assert_eq!(snapshot.status, CodeStatus::Printed);
}

#[tokio::test]
async fn second_scan_is_a_duplicate_with_one_deduction() {
    let h = ScanHarness::new();
    h.variant(7, "Sparkling Citrus 12oz", Some(24));
    h.stock(7, 10);
    h.add_unit("PROD-0001", 7);
    let session = h.open_session().await;

    let first = h.scan(session, "PROD-0001").await;
    assert_eq!(first.outcome, ScanOutcome::Shipped);

    let second = h.scan(session, "PROD-0001").await;
    assert_eq!(second.outcome, ScanOutcome::Duplicate);
    assert!(second.adjustments.is_empty());

    assert_eq!(h.on_hand(7), 9);
    assert_eq!(h.backend.movement_count(), 1);
    let session = h.session(session).await;
    assert_eq!(session.quantities.total_units, 1);
    assert_eq!(session.scanned_unit_codes.len(), 1);
}

#[tokio::test]
async fn approved_session_rejects_every_scan() {
    let h = ScanHarness::new();
    h.variant(7, "Sparkling Citrus 12oz", Some(24));
    h.stock(7, 10);
    h.add_unit("PROD-0001", 7);
    let session = h.open_session().await;
    h.approve_session(session).await;

    let result = h.scan(session, "PROD-0001").await;
    assert_eq!(result.outcome, ScanOutcome::SessionClosed);
    assert_eq!(h.on_hand(7), 10);
    assert_eq!(
        h.backend
            .code_snapshot("PROD-0001")
            .expect("seeded unit")
            .status,
        CodeStatus::ReceivedWarehouse
    );
}

#[tokio::test]
async fn rejections_never_reach_the_movement_log() {
    let h = ScanHarness::new();
    h.add_code(h.code("MC-0001", CodeKind::Case, CodeStatus::Pending));
    h.add_code(h.code("MC-0002", CodeKind::Case, CodeStatus::ShippedDistributor));
    let mut elsewhere = h.code("MC-0003", CodeKind::Case, CodeStatus::ReceivedWarehouse);
    elsewhere.location_org_id = OrgId::new(55);
    h.add_code(elsewhere);
    let session = h.open_session().await;

    for raw in ["MC-0001", "MC-0002", "MC-0003", "MC-0404", "  "] {
        let result = h.scan(session, raw).await;
        assert_ne!(result.outcome, ScanOutcome::Shipped, "{raw}");
    }
    assert_eq!(h.backend.movement_count(), 0);
    assert_eq!(h.session(session).await.quantities.total_units, 0);
}

#[tokio::test]
async fn codes_ship_from_the_session_source_warehouse_only() {
    // The session's source warehouse is what matters, and all harness
    // sessions ship from WAREHOUSE; a code seeded there is accepted.
    let h = ScanHarness::new();
    h.variant(7, "Sparkling Citrus 12oz", Some(24));
    h.stock(7, 5);
    let unit = h.code("PROD-0001", CodeKind::Unit, CodeStatus::ReceivedWarehouse);
    assert_eq!(unit.location_org_id, WAREHOUSE);
    h.add_code(scantrace_server::models::Code {
        variant_id: Some(scantrace_core::VariantId::new(7)),
        ..unit
    });
    let session = h.open_session().await;

    let result = h.scan(session, "PROD-0001").await;
    assert_eq!(result.outcome, ScanOutcome::Shipped);
}
