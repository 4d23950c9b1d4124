// crates/stamp-verifier-providers/tests/provider_scenarios.rs
// ============================================================================
// Module: Provider Scenario Tests
// Description: Verdicts of the address-based families over in-memory lookups.
// Purpose: Pin registry, allow-list, handle, and threshold verdict shapes.
// ============================================================================

//! Address-based provider family tests.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::missing_docs_in_private_items,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use bigdecimal::BigDecimal;
use stamp_verifier_core::Dispatcher;
use stamp_verifier_core::FailureKind;
use stamp_verifier_core::Provider;
use stamp_verifier_core::ProviderAccessPolicy;
use stamp_verifier_core::ProviderContext;
use stamp_verifier_core::ProviderError;
use stamp_verifier_core::ProviderId;
use stamp_verifier_core::ProviderRegistry;
use stamp_verifier_core::RequestPayload;
use stamp_verifier_core::address_record;
use stamp_verifier_providers::AllowListProvider;
use stamp_verifier_providers::HandleLengthProvider;
use stamp_verifier_providers::HumanityRegistryProvider;
use stamp_verifier_providers::ThresholdProviderBuilder;
use stamp_verifier_providers::allow_list::ALLOW_LIST_PROOF_KEY;

use crate::common::ADDRESS;
use crate::common::FakeAllowList;
use crate::common::FakeBalance;
use crate::common::FakeHandles;
use crate::common::FakeRegistrations;

// ============================================================================
// SECTION: Humanity Registry
// ============================================================================

#[tokio::test]
async fn registered_address_is_valid_with_address_record() {
    let provider = HumanityRegistryProvider::new(Arc::new(FakeRegistrations::with(&[ADDRESS])));

    let verdict = provider
        .verify(&RequestPayload::new("HumanityRegistry", ADDRESS), &ProviderContext::new(ADDRESS))
        .await
        .unwrap();

    assert!(verdict.valid);
    assert_eq!(verdict.record, Some(address_record(ADDRESS)));
    assert!(verdict.errors.is_empty());
}

#[tokio::test]
async fn unregistered_address_is_invalid() {
    let provider = HumanityRegistryProvider::new(Arc::new(FakeRegistrations::with(&[])));

    let verdict = provider
        .verify(&RequestPayload::new("HumanityRegistry", ADDRESS), &ProviderContext::new(ADDRESS))
        .await
        .unwrap();

    assert!(!verdict.valid);
    assert_eq!(verdict.errors.len(), 1);
    assert!(verdict.errors[0].contains("not registered"));
}

// ============================================================================
// SECTION: Allow List
// ============================================================================

fn allow_list_payload(list: &str) -> RequestPayload {
    RequestPayload::new("AllowList", ADDRESS).with_proof(ALLOW_LIST_PROOF_KEY, list)
}

#[tokio::test]
async fn listed_address_is_valid() {
    let lookup = Arc::new(FakeAllowList::replying(Ok(true)));
    let provider = AllowListProvider::new(lookup.clone());

    let verdict =
        provider.verify(&allow_list_payload("vip"), &ProviderContext::new(ADDRESS)).await.unwrap();

    assert!(verdict.valid);
    assert_eq!(verdict.record, Some(address_record(ADDRESS)));
    assert_eq!(lookup.lists.lock().unwrap().as_slice(), ["vip".to_string()]);
}

#[tokio::test]
async fn unlisted_address_is_invalid_but_keeps_record() {
    let provider = AllowListProvider::new(Arc::new(FakeAllowList::replying(Ok(false))));

    let verdict =
        provider.verify(&allow_list_payload("vip"), &ProviderContext::new(ADDRESS)).await.unwrap();

    assert!(!verdict.valid);
    assert_eq!(verdict.record, Some(address_record(ADDRESS)));
}

#[tokio::test]
async fn allow_list_upstream_failure_is_external() {
    let provider = AllowListProvider::new(Arc::new(FakeAllowList::replying(Err(
        ProviderError::external("list service down"),
    ))));

    let error = provider
        .verify(&allow_list_payload("vip"), &ProviderContext::new(ADDRESS))
        .await
        .unwrap_err();

    assert_eq!(error, ProviderError::external("list service down"));
}

#[tokio::test]
async fn parameterized_request_routes_list_name_through_registry() {
    let lookup = Arc::new(FakeAllowList::replying(Ok(true)));
    let mut registry = ProviderRegistry::new(ProviderAccessPolicy::allow_all());
    registry
        .register_parameterized(AllowListProvider::new(lookup.clone()), &[ALLOW_LIST_PROOF_KEY])
        .unwrap();
    let dispatcher = Dispatcher::new(Arc::new(registry));

    let outcomes = dispatcher
        .verify(&RequestPayload::new("AllowList#builders", ADDRESS))
        .await
        .unwrap();

    assert_eq!(outcomes[0].provider_type.as_str(), "AllowList#builders");
    assert!(outcomes[0].is_valid());
    assert_eq!(lookup.lists.lock().unwrap().as_slice(), ["builders".to_string()]);
}

#[tokio::test]
async fn allow_list_without_list_name_is_invalid() {
    let lookup = Arc::new(FakeAllowList::replying(Ok(true)));
    let provider = AllowListProvider::new(lookup.clone());

    let verdict = provider
        .verify(&RequestPayload::new("AllowList", ADDRESS), &ProviderContext::new(ADDRESS))
        .await
        .unwrap();

    assert!(!verdict.valid);
    assert!(lookup.lists.lock().unwrap().is_empty());
}

// ============================================================================
// SECTION: Handle Length Tiers
// ============================================================================

async fn handle_tiers(handle: Option<&str>) -> (bool, bool, Vec<String>, usize) {
    let lookup = Arc::new(FakeHandles::with(handle));
    let mut registry = ProviderRegistry::new(ProviderAccessPolicy::allow_all());
    registry.register_provider(HandleLengthProvider::premium(lookup.clone())).unwrap();
    registry.register_provider(HandleLengthProvider::paid(lookup.clone())).unwrap();
    let dispatcher = Dispatcher::new(Arc::new(registry));
    let payload = RequestPayload::new("CyberProfilePremium", ADDRESS).with_types(vec![
        ProviderId::new("CyberProfilePremium"),
        ProviderId::new("CyberProfilePaid"),
    ]);

    let outcomes = dispatcher.verify(&payload).await.unwrap();

    let errors = outcomes
        .iter()
        .filter_map(|outcome| outcome.payload())
        .flat_map(|payload| payload.errors.clone())
        .collect();
    (outcomes[0].is_valid(), outcomes[1].is_valid(), errors, lookup.calls.load(Ordering::SeqCst))
}

#[tokio::test]
async fn short_handle_is_premium_only() {
    let (premium, paid, _, calls) = handle_tiers(Some("abc")).await;

    assert!(premium);
    assert!(!paid);
    assert_eq!(calls, 1);
}

#[tokio::test]
async fn medium_handle_is_paid_only() {
    let (premium, paid, _, calls) = handle_tiers(Some("abcdefghi")).await;

    assert!(!premium);
    assert!(paid);
    assert_eq!(calls, 1);
}

#[tokio::test]
async fn missing_handle_fails_every_tier() {
    let (premium, paid, errors, _) = handle_tiers(None).await;

    assert!(!premium);
    assert!(!paid);
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|error| error.to_ascii_lowercase().contains("no primary handle")));
}

#[tokio::test]
async fn empty_handle_counts_as_missing() {
    let (premium, paid, errors, _) = handle_tiers(Some("")).await;

    assert!(!premium);
    assert!(!paid);
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|error| error.to_ascii_lowercase().contains("no primary handle")));
}

#[tokio::test]
async fn long_handle_fits_no_tier() {
    let (premium, paid, _, _) = handle_tiers(Some("abcdefghijklmnop")).await;

    assert!(!premium);
    assert!(!paid);
}

// ============================================================================
// SECTION: Threshold Family
// ============================================================================

#[tokio::test]
async fn threshold_family_reads_metric_once_per_request() {
    let lookup = Arc::new(FakeBalance::with("25.5"));
    let builder = ThresholdProviderBuilder::new("ethPossessionsGte", lookup.clone());
    let mut registry = ProviderRegistry::new(ProviderAccessPolicy::allow_all());
    for threshold in ["1", "10", "100"] {
        let provider = builder.build(BigDecimal::from_str(threshold).unwrap());
        registry.register_provider(provider).unwrap();
    }
    let dispatcher = Dispatcher::new(Arc::new(registry));
    let types: Vec<ProviderId> = ["1", "10", "100"]
        .into_iter()
        .map(|threshold| ProviderId::new(format!("ethPossessionsGte#{threshold}")))
        .collect();
    let payload = RequestPayload::new(types[0].clone(), ADDRESS).with_types(types);

    let outcomes = dispatcher.verify(&payload).await.unwrap();

    let verdicts: Vec<bool> = outcomes.iter().map(|outcome| outcome.is_valid()).collect();
    assert_eq!(verdicts, vec![true, true, false]);
    assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
    let record = outcomes[1].payload().unwrap().record.clone().unwrap();
    assert_eq!(record.get("ethPossessionsGte").map(String::as_str), Some("10"));
    assert_eq!(record.get("address").map(String::as_str), Some(ADDRESS));
}

#[tokio::test]
async fn threshold_families_with_distinct_namespaces_do_not_share_metrics() {
    let eth = Arc::new(FakeBalance::with("5"));
    let gtc = Arc::new(FakeBalance::with("500"));
    let eth_builder = ThresholdProviderBuilder::new("ethGte", eth.clone()).namespace("eth:balance");
    let gtc_builder = ThresholdProviderBuilder::new("gtcGte", gtc.clone()).namespace("gtc:balance");
    let ctx = ProviderContext::new(ADDRESS);
    let payload = RequestPayload::new("ethGte#10", ADDRESS);

    let eth_verdict = eth_builder
        .build(BigDecimal::from(10))
        .verify(&payload, &ctx)
        .await
        .unwrap();
    let gtc_verdict = gtc_builder
        .build(BigDecimal::from(10))
        .verify(&payload, &ctx)
        .await
        .unwrap();

    assert!(!eth_verdict.valid);
    assert!(gtc_verdict.valid);
    assert_eq!(eth.calls.load(Ordering::SeqCst), 1);
    assert_eq!(gtc.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn blocked_threshold_never_reads_metric() {
    let lookup = Arc::new(FakeBalance::with("25"));
    let builder = ThresholdProviderBuilder::new("ethPossessionsGte", lookup.clone());
    let mut denylist = std::collections::BTreeSet::new();
    denylist.insert("ethPossessionsGte".to_string());
    let mut registry = ProviderRegistry::new(ProviderAccessPolicy {
        allowlist: None,
        denylist,
    });
    registry.register_provider(builder.build(BigDecimal::from(1))).unwrap();
    let dispatcher = Dispatcher::new(Arc::new(registry));

    let outcomes = dispatcher
        .verify(&RequestPayload::new("ethPossessionsGte#1", ADDRESS))
        .await
        .unwrap();

    assert_eq!(outcomes[0].failure().unwrap().kind, FailureKind::Blocked);
    assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
}
