//! Contract Test: Record Reconciliation
//!
//! Constraints verified:
//! - One lookup per record name, in input order
//! - No update for a record that already publishes the desired address
//! - Exactly one update, with the right content and type, for a stale record
//! - Missing records are counted and skipped, never created
//! - Refused updates are counted and do not stop the run
//! - Transport failures abort the run

mod common;

use cfddns_core::{
    Error, IpVersion, RecordType, Reconciler, RunStatus, UpdateOutcome, UpdateRequest,
};
use common::*;

#[tokio::test]
async fn one_lookup_per_name_in_input_order() {
    let provider = MockDnsProvider::new()
        .with_record("c.example.com", "1.2.3.4")
        .with_record("a.example.com", "1.2.3.4")
        .with_record("b.example.com", "1.2.3.4");

    let reconciler = Reconciler::new(provider.boxed(), ZONE);
    let request = v4_request(&["c.example.com", "a.example.com", "b.example.com"], "1.2.3.4");

    reconciler.reconcile(&request).await.unwrap();

    assert_eq!(
        provider.looked_up(),
        vec!["c.example.com", "a.example.com", "b.example.com"]
    );
    assert!(provider
        .lookups()
        .iter()
        .all(|l| l.zone_id == ZONE && l.record_type == RecordType::A));
}

#[tokio::test]
async fn duplicate_names_are_looked_up_twice() {
    let provider = MockDnsProvider::new().with_record("a.example.com", "1.2.3.4");
    let reconciler = Reconciler::new(provider.boxed(), ZONE);
    let request = v4_request(&["a.example.com", "a.example.com"], "1.2.3.4");

    reconciler.reconcile(&request).await.unwrap();

    assert_eq!(provider.looked_up().len(), 2);
}

#[tokio::test]
async fn empty_record_list_is_nothing_to_do() {
    let provider = MockDnsProvider::new();
    let reconciler = Reconciler::new(provider.boxed(), ZONE);
    let request = v4_request(&[], "1.2.3.4");

    let report = reconciler.reconcile(&request).await.unwrap();

    assert_eq!(report.status(), RunStatus::Success);
    assert!(report.outcomes().is_empty());
    assert!(provider.looked_up().is_empty());
}

#[tokio::test]
async fn unchanged_address_performs_zero_updates() {
    let provider = MockDnsProvider::new()
        .with_record("a.example.com", "1.2.3.4")
        .with_record("b.example.com", "1.2.3.4");
    let reconciler = Reconciler::new(provider.boxed(), ZONE);
    let request = v4_request(&["a.example.com", "b.example.com"], "1.2.3.4");

    let first = reconciler.reconcile(&request).await.unwrap();
    let second = reconciler.reconcile(&request).await.unwrap();

    assert_eq!(provider.update_call_count(), 0);
    assert_eq!(first, second);
    assert!(first
        .outcomes()
        .iter()
        .all(|r| r.outcome == UpdateOutcome::UpToDate));
}

#[tokio::test]
async fn mixed_records_update_only_the_stale_one() {
    let provider = MockDnsProvider::new()
        .with_record("a.example.com", "1.2.3.4")
        .with_record("b.example.com", "9.9.9.9");
    let reconciler = Reconciler::new(provider.boxed(), ZONE);
    let request = v4_request(&["a.example.com", "b.example.com"], "1.2.3.4");

    let report = reconciler.reconcile(&request).await.unwrap();

    assert_eq!(report.status(), RunStatus::Success);
    assert_eq!(report.updated_count(), 1);

    let updates = provider.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].zone_id, ZONE);
    assert_eq!(updates[0].record_id, record_id("b.example.com"));
    assert_eq!(updates[0].payload.content, "1.2.3.4");
    assert_eq!(updates[0].payload.record_type, RecordType::A);
    assert_eq!(updates[0].payload.name, "b.example.com");
    assert_eq!(updates[0].payload.ttl, 1);
    assert!(!updates[0].payload.proxied);
}

#[tokio::test]
async fn aaaa_update_carries_proxy_flag() {
    let provider = MockDnsProvider::new().with_record("v6.example.com", "2001:db8::1");
    let reconciler = Reconciler::new(provider.boxed(), ZONE);
    let request = UpdateRequest::new(
        vec!["v6.example.com".to_string()],
        IpVersion::V6,
        "2001:db8::2".parse().unwrap(),
        true,
    )
    .unwrap();

    reconciler.reconcile(&request).await.unwrap();

    assert_eq!(provider.lookups()[0].record_type, RecordType::Aaaa);
    let updates = provider.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].payload.record_type, RecordType::Aaaa);
    assert_eq!(updates[0].payload.content, "2001:db8::2");
    assert!(updates[0].payload.proxied);
}

#[tokio::test]
async fn missing_record_is_counted_and_skipped() {
    let provider = MockDnsProvider::new().with_record("b.example.com", "9.9.9.9");
    let reconciler = Reconciler::new(provider.boxed(), ZONE);
    let request = v4_request(&["missing.example.com", "b.example.com"], "1.2.3.4");

    let report = reconciler.reconcile(&request).await.unwrap();

    assert_eq!(report.status(), RunStatus::Success);
    assert_eq!(report.not_found_count(), 1);
    assert_eq!(report.outcomes()[0].outcome, UpdateOutcome::NotFound);
    assert_eq!(report.outcomes()[1].outcome, UpdateOutcome::Updated);
    assert_eq!(provider.looked_up().len(), 2);

    // Only the found record was updated
    let updates = provider.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].payload.name, "b.example.com");
}

#[tokio::test]
async fn rejected_update_is_partial_failure_and_run_continues() {
    let provider = MockDnsProvider::new()
        .with_record("a.example.com", "9.9.9.9")
        .with_record("b.example.com", "9.9.9.9")
        .with_update_behavior(
            "a.example.com",
            UpdateBehavior::Reject("Authentication error".to_string()),
        );
    let reconciler = Reconciler::new(provider.boxed(), ZONE);
    let request = v4_request(&["a.example.com", "b.example.com"], "1.2.3.4");

    let report = reconciler.reconcile(&request).await.unwrap();

    assert_eq!(report.status(), RunStatus::PartialFailure);
    assert_eq!(report.failed_count(), 1);
    assert_eq!(
        report.outcomes()[0].outcome,
        UpdateOutcome::Failed("Authentication error".to_string())
    );
    assert_eq!(report.outcomes()[1].outcome, UpdateOutcome::Updated);
    assert_eq!(provider.update_call_count(), 2);
}

#[tokio::test]
async fn update_transport_failure_aborts_run() {
    let provider = MockDnsProvider::new()
        .with_record("a.example.com", "9.9.9.9")
        .with_record("b.example.com", "9.9.9.9")
        .with_update_behavior("a.example.com", UpdateBehavior::TransportFailure);
    let reconciler = Reconciler::new(provider.boxed(), ZONE);
    let request = v4_request(&["a.example.com", "b.example.com"], "1.2.3.4");

    let result = reconciler.reconcile(&request).await;

    assert!(matches!(result, Err(Error::Provider { .. })));
    // b.example.com was never looked up
    assert_eq!(provider.looked_up(), vec!["a.example.com"]);
    assert_eq!(provider.update_call_count(), 1);
}

#[tokio::test]
async fn lookup_transport_failure_aborts_run() {
    let provider = MockDnsProvider::new()
        .with_record("b.example.com", "9.9.9.9")
        .with_failing_lookup("a.example.com");
    let reconciler = Reconciler::new(provider.boxed(), ZONE);
    let request = v4_request(&["a.example.com", "b.example.com"], "1.2.3.4");

    let result = reconciler.reconcile(&request).await;

    assert!(matches!(result, Err(Error::Provider { .. })));
    assert_eq!(provider.looked_up(), vec!["a.example.com"]);
    assert_eq!(provider.update_call_count(), 0);
}

#[tokio::test]
async fn equivalent_ipv6_spelling_is_up_to_date() {
    let provider = MockDnsProvider::new().with_record("v6.example.com", "2001:0db8:0000:0000::0001");
    let reconciler = Reconciler::new(provider.boxed(), ZONE);
    let request = UpdateRequest::new(
        vec!["v6.example.com".to_string()],
        IpVersion::V6,
        "2001:db8::1".parse().unwrap(),
        false,
    )
    .unwrap();

    let report = reconciler.reconcile(&request).await.unwrap();

    assert_eq!(report.outcomes()[0].outcome, UpdateOutcome::UpToDate);
    assert_eq!(provider.update_call_count(), 0);
}

#[tokio::test]
async fn dry_run_is_carried_into_the_report() {
    let provider = MockDnsProvider::new()
        .with_record("a.example.com", "1.2.3.4")
        .with_record("b.example.com", "9.9.9.9")
        .with_dry_run();
    let reconciler = Reconciler::new(provider.boxed(), ZONE);
    let request = v4_request(&["a.example.com", "b.example.com"], "1.2.3.4");

    let report = reconciler.reconcile(&request).await.unwrap();

    assert!(report.is_dry_run());
    assert_eq!(report.updated_count(), 1);
    assert_eq!(report.status(), RunStatus::Success);
}

#[tokio::test]
async fn live_run_report_is_not_dry_run() {
    let provider = MockDnsProvider::new().with_record("a.example.com", "9.9.9.9");
    let reconciler = Reconciler::new(provider.boxed(), ZONE);
    let request = v4_request(&["a.example.com"], "1.2.3.4");

    let report = reconciler.reconcile(&request).await.unwrap();

    assert!(!report.is_dry_run());
    assert_eq!(report.updated_count(), 1);
}
