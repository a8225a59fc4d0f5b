//! The shipment session as an aggregate: creation, accumulation across
//! scans, closure, and the movement history behind accepted scans.

use rust_decimal::Decimal;

use scantrace_core::{CodeStatus, ScanOutcome, SessionStatus};
use scantrace_integration_tests::{DISTRIBUTOR, OPERATOR, ScanHarness, WAREHOUSE};

#[tokio::test]
async fn fresh_session_starts_empty_and_pending() {
    let h = ScanHarness::new();
    let id = h.open_session().await;

    let session = h.session(id).await;
    assert_eq!(session.source_warehouse_id, WAREHOUSE);
    assert_eq!(session.destination_distributor_id, DISTRIBUTOR);
    assert_eq!(session.status, SessionStatus::Pending);
    assert!(session.scanned_case_codes.is_empty());
    assert!(session.scanned_unit_codes.is_empty());
    assert_eq!(session.quantities.total_units, 0);
    assert_eq!(session.quantities.total_cases, Decimal::ZERO);
    assert!(session.discrepancy.shortfalls.is_empty());
}

#[tokio::test]
async fn session_accumulates_across_scans() {
    let h = ScanHarness::new();
    h.variant(7, "Sparkling Citrus 12oz", Some(24));
    h.stock(7, 100);
    let case = h.add_case("MC-0001", None, 2);
    h.add_unit_in_case("PROD-0001", 7, case, 1);
    h.add_unit_in_case("PROD-0002", 7, case, 2);
    h.add_unit("PROD-0003", 7);
    let session = h.open_session().await;

    h.scan(session, "MC-0001").await;
    h.scan(session, "PROD-0003").await;

    let session = h.session(session).await;
    assert_eq!(session.scanned_case_codes.len(), 1);
    assert_eq!(session.scanned_unit_codes.len(), 1);
    assert_eq!(session.quantities.total_units, 3);
    // One full case plus a loose unit's fraction of a 24-pack.
    assert_eq!(
        session.quantities.total_cases,
        Decimal::ONE + Decimal::new(4, 2)
    );
    let tally = session
        .quantities
        .per_variant
        .get("7")
        .expect("variant 7 tally");
    assert_eq!(tally.units, 3);
}

#[tokio::test]
async fn scan_results_echo_running_totals() {
    let h = ScanHarness::new();
    h.variant(7, "Sparkling Citrus 12oz", Some(24));
    h.stock(7, 100);
    h.add_unit("PROD-0001", 7);
    h.add_unit("PROD-0002", 7);
    let session = h.open_session().await;

    let first = h.scan(session, "PROD-0001").await;
    let update = first.session_update.expect("accepted scan update");
    assert_eq!(update.session_id, session);
    assert_eq!(update.total_units, 1);
    assert_eq!(update.unit_count, 1);

    let second = h.scan(session, "PROD-0002").await;
    let update = second.session_update.expect("accepted scan update");
    assert_eq!(update.total_units, 2);
    assert_eq!(update.unit_count, 2);
    assert_eq!(update.case_count, 0);
    assert_eq!(update.status, SessionStatus::Pending);
}

#[tokio::test]
async fn approved_session_is_terminal() {
    let h = ScanHarness::new();
    h.variant(7, "Sparkling Citrus 12oz", Some(24));
    h.stock(7, 10);
    h.add_unit("PROD-0001", 7);
    let session = h.open_session().await;
    h.approve_session(session).await;

    let result = h.scan(session, "PROD-0001").await;
    assert_eq!(result.outcome, ScanOutcome::SessionClosed);
    assert_eq!(h.session(session).await.status, SessionStatus::Approved);
}

#[tokio::test]
async fn movement_history_records_each_transition() {
    let h = ScanHarness::new();
    h.variant(7, "Sparkling Citrus 12oz", Some(24));
    h.stock(7, 10);
    h.add_unit("PROD-0001", 7);
    let session = h.open_session().await;

    let result = h.scan(session, "PROD-0001").await;
    assert_eq!(result.outcome, ScanOutcome::Shipped);

    let movements = h
        .engine
        .code_movements("PROD-0001")
        .await
        .expect("movement history");
    assert_eq!(movements.len(), 1);
    let entry = &movements[0];
    assert_eq!(entry.from_org_id, WAREHOUSE);
    assert_eq!(entry.to_org_id, DISTRIBUTOR);
    assert_eq!(entry.resulting_status, CodeStatus::WarehousePacked);
    assert_eq!(entry.recorded_by, OPERATOR);
}

#[tokio::test]
async fn case_scan_logs_movements_for_children_too() {
    let h = ScanHarness::new();
    h.variant(7, "Sparkling Citrus 12oz", Some(24));
    h.stock(7, 100);
    let case = h.add_case("MC-0001", None, 2);
    h.add_unit_in_case("PROD-0001", 7, case, 1);
    h.add_unit_in_case("PROD-0002", 7, case, 2);
    let session = h.open_session().await;

    h.scan(session, "MC-0001").await;
    assert_eq!(h.backend.movement_count(), 3);
    for token in ["PROD-0001", "PROD-0002"] {
        let movements = h
            .engine
            .code_movements(token)
            .await
            .expect("movement history");
        assert_eq!(movements.len(), 1, "{token}");
    }
}

#[tokio::test]
async fn movement_lookup_normalizes_the_raw_value() {
    let h = ScanHarness::new();
    h.variant(7, "Sparkling Citrus 12oz", Some(24));
    h.stock(7, 10);
    h.add_unit("PROD-0001", 7);
    let session = h.open_session().await;
    h.scan(session, "PROD-0001").await;

    // Scanning the tracking URL printed on the label resolves to the
    // same code.
    let movements = h
        .engine
        .code_movements("https://track.example.com/c/PROD-0001")
        .await
        .expect("movement history");
    assert_eq!(movements.len(), 1);
}

#[tokio::test]
async fn structured_payload_scans_resolve_the_embedded_code() {
    let h = ScanHarness::new();
    h.variant(7, "Sparkling Citrus 12oz", Some(24));
    h.stock(7, 10);
    h.add_unit("PROD-0001", 7);
    let session = h.open_session().await;

    // Printed QR labels wrap the code in a JSON payload.
    let payload = serde_json::json!({"kind": "unit", "code": "PROD-0001"}).to_string();
    let result = h.scan(session, &payload).await;
    assert_eq!(result.outcome, ScanOutcome::Shipped);
    assert_eq!(result.normalized_code.as_deref(), Some("PROD-0001"));
    assert_eq!(h.on_hand(7), 9);
}

#[tokio::test]
async fn discrepancy_report_collects_shortfalls_across_scans() {
    let h = ScanHarness::new();
    h.variant(7, "Sparkling Citrus 12oz", Some(24));
    h.variant(8, "Ginger Brew 12oz", Some(24));
    h.stock(7, 0);
    h.stock(8, 0);
    h.add_unit("PROD-0001", 7);
    h.add_unit("PROD-0002", 8);
    let session = h.open_session().await;

    h.scan(session, "PROD-0001").await;
    h.scan(session, "PROD-0002").await;

    let session = h.session(session).await;
    assert_eq!(session.status, SessionStatus::Discrepancy);
    assert_eq!(session.discrepancy.shortfalls.len(), 2);
    let keys: Vec<&str> = session
        .discrepancy
        .shortfalls
        .iter()
        .map(|s| s.variant_key.as_str())
        .collect();
    assert_eq!(keys, ["7", "8"]);
    for entry in &session.discrepancy.shortfalls {
        assert_eq!(entry.requested, 1);
        assert_eq!(entry.units_removed, 0);
        assert_eq!(entry.shortfall, 1);
    }
    assert!(!session.discrepancy.warnings.is_empty());
}

#[tokio::test]
async fn unknown_bucket_accumulates_across_cases() {
    let h = ScanHarness::new();
    h.add_case("MC-0001", None, 12);
    h.add_case("MC-0002", None, 12);
    let session = h.open_session().await;

    let first = h.scan(session, "MC-0001").await;
    let second = h.scan(session, "MC-0002").await;
    assert_eq!(first.outcome, ScanOutcome::Shipped);
    assert_eq!(second.outcome, ScanOutcome::Shipped);

    let session = h.session(session).await;
    let unknown = session
        .quantities
        .per_variant
        .get("unknown")
        .expect("unknown bucket");
    assert_eq!(unknown.units, 24);
    assert_eq!(session.quantities.total_units, 24);
    assert_eq!(session.quantities.total_cases, Decimal::TWO);
    // Each unresolvable case leaves its own warning.
    assert_eq!(session.discrepancy.warnings.len(), 2);
}
