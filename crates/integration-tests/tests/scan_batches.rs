//! Batch scanning against one-at-a-time scanning.
//!
//! A batch prefetches its reads in bulk and then decides each scan in
//! submission order over a shared working set, so its results must match
//! what the same scans produce when submitted individually.

use rust_decimal::Decimal;

use scantrace_core::ScanOutcome;
use scantrace_integration_tests::ScanHarness;

/// Seed both harnesses identically so batch and sequential runs start
/// from the same world.
fn seed(h: &ScanHarness) {
    h.variant(7, "Sparkling Citrus 12oz", Some(24));
    h.variant(8, "Ginger Brew 12oz", Some(24));
    h.stock(7, 2);
    h.stock(8, 50);
    let case = h.add_case("MC-0001", None, 2);
    h.add_unit_in_case("PROD-0001", 7, case, 1);
    h.add_unit_in_case("PROD-0002", 7, case, 2);
    h.add_unit("PROD-0003", 7);
    h.add_unit("PROD-0004", 8);
}

#[tokio::test]
async fn batch_matches_sequential_processing() {
    // Loose child before its case, a shortfall on variant 7, one garbage
    // value, and a plain unit. Every interaction the pipeline has to get
    // right in order.
    let raws = ["PROD-0001", "MC-0001", "PROD-0003", "???", "PROD-0004"];

    let batched = ScanHarness::new();
    seed(&batched);
    let batch_session = batched.open_session().await;
    let outcome = batched.scan_batch(batch_session, &raws).await;

    let sequential = ScanHarness::new();
    seed(&sequential);
    let seq_session = sequential.open_session().await;
    let mut seq_results = Vec::new();
    for raw in raws {
        seq_results.push(sequential.scan(seq_session, raw).await);
    }

    assert_eq!(outcome.results.len(), seq_results.len());
    for (batch, seq) in outcome.results.iter().zip(&seq_results) {
        assert_eq!(batch.outcome, seq.outcome, "{}", batch.code);
        assert_eq!(batch.adjustments.len(), seq.adjustments.len(), "{}", batch.code);
        for (a, b) in batch.adjustments.iter().zip(&seq.adjustments) {
            assert_eq!(a.variant_id, b.variant_id);
            assert_eq!(a.units_removed, b.units_removed);
            assert_eq!(a.shortfall, b.shortfall);
            assert_eq!(a.cases_removed, b.cases_removed);
        }
    }

    for variant in [7, 8] {
        assert_eq!(batched.on_hand(variant), sequential.on_hand(variant), "{variant}");
    }

    let seq_session = sequential.session(seq_session).await;
    assert_eq!(outcome.session.quantities.total_units, seq_session.quantities.total_units);
    assert_eq!(outcome.session.quantities.total_cases, seq_session.quantities.total_cases);
    assert_eq!(outcome.session.status, seq_session.status);
    assert_eq!(
        outcome.session.discrepancy.shortfalls.len(),
        seq_session.discrepancy.shortfalls.len()
    );
}

#[tokio::test]
async fn duplicate_within_one_batch_deducts_once() {
    let h = ScanHarness::new();
    h.variant(7, "Sparkling Citrus 12oz", Some(24));
    h.stock(7, 10);
    h.add_unit("PROD-0001", 7);
    let session = h.open_session().await;

    let outcome = h.scan_batch(session, &["PROD-0001", "PROD-0001"]).await;
    assert_eq!(outcome.results[0].outcome, ScanOutcome::Shipped);
    assert_eq!(outcome.results[1].outcome, ScanOutcome::Duplicate);
    assert_eq!(outcome.summary.success, 1);
    assert_eq!(outcome.summary.duplicates, 1);

    assert_eq!(h.on_hand(7), 9);
    assert_eq!(h.backend.movement_count(), 1);
    assert_eq!(outcome.session.quantities.total_units, 1);
}

#[tokio::test]
async fn invalid_values_do_not_abort_the_rest() {
    let h = ScanHarness::new();
    h.variant(7, "Sparkling Citrus 12oz", Some(24));
    h.stock(7, 10);
    h.add_unit("PROD-0001", 7);
    h.add_unit("PROD-0002", 7);
    let session = h.open_session().await;

    let outcome = h
        .scan_batch(session, &["PROD-0001", "", "MC-4040", "PROD-0002"])
        .await;
    assert_eq!(outcome.results[0].outcome, ScanOutcome::Shipped);
    assert_eq!(outcome.results[1].outcome, ScanOutcome::InvalidFormat);
    assert_eq!(outcome.results[2].outcome, ScanOutcome::NotFound);
    assert_eq!(outcome.results[3].outcome, ScanOutcome::Shipped);
    assert_eq!(h.on_hand(7), 8);
}

#[tokio::test]
async fn summary_tallies_outcomes() {
    let h = ScanHarness::new();
    seed(&h);
    let session = h.open_session().await;

    let outcome = h
        .scan_batch(session, &["PROD-0003", "PROD-0003", "PROD-0004", "nope"])
        .await;
    assert_eq!(outcome.summary.total, 4);
    assert_eq!(outcome.summary.success, 2);
    assert_eq!(outcome.summary.duplicates, 1);
    assert_eq!(outcome.summary.errors, 0);
}

#[tokio::test]
async fn batch_results_preserve_submission_order() {
    let h = ScanHarness::new();
    seed(&h);
    let session = h.open_session().await;

    let raws = ["PROD-0004", "MC-0001", "bogus", "PROD-0003"];
    let outcome = h.scan_batch(session, &raws).await;
    let echoed: Vec<&str> = outcome.results.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(echoed, raws);
}

#[tokio::test]
async fn bulk_reads_cover_cases_and_children() {
    let h = ScanHarness::new();
    h.variant(7, "Sparkling Citrus 12oz", Some(24));
    h.variant(8, "Ginger Brew 12oz", Some(24));
    h.stock(7, 50);
    h.stock(8, 50);
    let first = h.add_case("MC-0001", None, 2);
    h.add_unit_in_case("PROD-0001", 7, first, 1);
    h.add_unit_in_case("PROD-0002", 8, first, 2);
    let second = h.add_case("MC-0002", None, 1);
    h.add_unit_in_case("PROD-0003", 7, second, 1);
    let session = h.open_session().await;

    let outcome = h.scan_batch(session, &["MC-0001", "MC-0002"]).await;
    assert_eq!(outcome.summary.success, 2);

    // Both cases and all their children resolve on one inventory read and
    // one variant metadata fetch.
    assert_eq!(h.backend.inventory_read_count(), 1);
    assert_eq!(h.backend.variant_fetch_count(), 1);
}

#[tokio::test]
async fn second_batch_hits_the_variant_cache() {
    let h = ScanHarness::new();
    h.variant(7, "Sparkling Citrus 12oz", Some(24));
    h.stock(7, 50);
    h.add_unit("PROD-0001", 7);
    h.add_unit("PROD-0002", 7);
    let session = h.open_session().await;

    h.scan_batch(session, &["PROD-0001"]).await;
    assert_eq!(h.backend.variant_fetch_count(), 1);

    h.scan_batch(session, &["PROD-0002"]).await;
    // Same variant, cached metadata; the store is not asked again.
    assert_eq!(h.backend.variant_fetch_count(), 1);
}

#[tokio::test]
async fn single_variant_case_in_a_batch_counts_one_case() {
    let h = ScanHarness::new();
    h.variant(7, "Sparkling Citrus 12oz", Some(24));
    h.stock(7, 50);
    let case = h.add_case("MC-0001", None, 2);
    h.add_unit_in_case("PROD-0001", 7, case, 1);
    h.add_unit_in_case("PROD-0002", 7, case, 2);
    let session = h.open_session().await;

    let outcome = h.scan_batch(session, &["MC-0001"]).await;
    assert_eq!(outcome.session.quantities.total_cases, Decimal::ONE);
    assert_eq!(outcome.session.quantities.total_units, 2);
}
