// crates/stamp-verifier-providers/tests/builtin_registry.rs
// ============================================================================
// Module: Built-in Registry Tests
// Description: Assembly of configured platforms and end-to-end scans.
// Purpose: Ensure configured families register, validate, and scan together.
// ============================================================================

//! Built-in registry assembly tests.

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

use std::sync::Arc;

use serde_json::json;
use stamp_verifier_core::Aggregator;
use stamp_verifier_core::Dispatcher;
use stamp_verifier_core::PlatformId;
use stamp_verifier_core::ProviderAccessPolicy;
use stamp_verifier_core::ProviderId;
use stamp_verifier_core::RegistryError;
use stamp_verifier_core::RequestPayload;
use stamp_verifier_core::ScanRequest;
use stamp_verifier_providers::BalancePlatformConfig;
use stamp_verifier_providers::BuiltinPlatformConfigs;
use stamp_verifier_providers::BuiltinRegistryError;
use stamp_verifier_providers::GithubPlatformConfig;
use stamp_verifier_providers::RestPlatformConfig;
use stamp_verifier_providers::builtin_registry;

use crate::common::ADDRESS;
use crate::common::Route;
use crate::common::StubUpstream;
use crate::common::local_http_config;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn all_platforms(base_url: &str) -> BuiltinPlatformConfigs {
    let rest = RestPlatformConfig {
        base_url: base_url.to_string(),
    };
    BuiltinPlatformConfigs {
        http: local_http_config(),
        humanity: Some(rest.clone()),
        allow_list: Some(rest.clone()),
        handle: Some(rest),
        balance: Some(BalancePlatformConfig::new(base_url, vec![
            "1".to_string(),
            "10".to_string(),
        ])),
        github: Some(GithubPlatformConfig::default()),
    }
}

// ============================================================================
// SECTION: Assembly
// ============================================================================

#[test]
fn configured_platforms_register_in_order() {
    let registry =
        builtin_registry(&all_platforms("http://127.0.0.1:9"), ProviderAccessPolicy::allow_all())
            .unwrap();

    let platforms: Vec<&str> =
        registry.platforms().iter().map(|platform| platform.spec.platform.as_str()).collect();
    assert_eq!(platforms, vec!["HumanityRegistry", "AllowList", "CyberConnect", "ETH", "Github"]);
    assert!(registry.is_implemented(&ProviderId::new("AllowList#vip")));
    assert!(registry.is_implemented(&ProviderId::new("ethPossessionsGte#10")));
    assert!(registry.is_implemented(&ProviderId::new("GithubFollowersGte#50")));
    assert!(registry.is_implemented(&ProviderId::new("GithubReposGte#5")));
    assert_eq!(
        registry.platform_of(&ProviderId::new("CyberProfilePaid")),
        Some(&PlatformId::new("CyberConnect"))
    );
}

#[test]
fn absent_sections_leave_platforms_unregistered() {
    let configs = BuiltinPlatformConfigs {
        humanity: Some(RestPlatformConfig {
            base_url: "https://registry.test".to_string(),
        }),
        ..BuiltinPlatformConfigs::default()
    };

    let registry = builtin_registry(&configs, ProviderAccessPolicy::allow_all()).unwrap();

    assert_eq!(registry.platforms().len(), 1);
    assert_eq!(registry.provider_count(), 1);
}

#[test]
fn malformed_threshold_is_rejected() {
    let configs = BuiltinPlatformConfigs {
        balance: Some(BalancePlatformConfig::new("https://balances.test", vec![
            "ten".to_string(),
        ])),
        ..BuiltinPlatformConfigs::default()
    };

    let error = builtin_registry(&configs, ProviderAccessPolicy::allow_all()).unwrap_err();

    assert_eq!(error, BuiltinRegistryError::InvalidThreshold("ten".to_string()));
}

#[test]
fn duplicate_threshold_is_a_registry_error() {
    let configs = BuiltinPlatformConfigs {
        balance: Some(BalancePlatformConfig::new("https://balances.test", vec![
            "5".to_string(),
            "5".to_string(),
        ])),
        ..BuiltinPlatformConfigs::default()
    };

    let error = builtin_registry(&configs, ProviderAccessPolicy::allow_all()).unwrap_err();

    assert!(matches!(error, BuiltinRegistryError::Registry(RegistryError::Duplicate { .. })));
}

#[test]
fn malformed_base_url_is_rejected() {
    let configs = BuiltinPlatformConfigs {
        handle: Some(RestPlatformConfig {
            base_url: "not a url".to_string(),
        }),
        ..BuiltinPlatformConfigs::default()
    };

    let error = builtin_registry(&configs, ProviderAccessPolicy::allow_all()).unwrap_err();

    assert!(matches!(error, BuiltinRegistryError::Upstream(_)));
}

// ============================================================================
// SECTION: End-to-End
// ============================================================================

#[tokio::test]
async fn scan_over_builtin_platforms_keeps_only_valid_ones() {
    let stub = StubUpstream::start(vec![
        Route::json(&format!("/registrations/{ADDRESS}"), &json!({"registered": true})),
        Route::json(&format!("/profiles/{ADDRESS}"), &json!({"handle": "abcdefghijklmnop"})),
        Route::json(&format!("/balances/{ADDRESS}"), &json!({"balance": "0.5"})),
    ]);
    let registry =
        builtin_registry(&all_platforms(&stub.base_url), ProviderAccessPolicy::allow_all())
            .unwrap();
    let aggregator = Aggregator::new(Dispatcher::new(Arc::new(registry)));

    let report = aggregator.scan(&ScanRequest::new(ADDRESS)).await.unwrap();

    let retained: Vec<&str> =
        report.platforms.iter().map(|platform| platform.platform.as_str()).collect();
    assert_eq!(retained, vec!["HumanityRegistry"]);
    assert_eq!(report.evaluated, 6);
    assert!(report.failures.is_empty());
    let balance_reads = stub.urls().iter().filter(|url| url.starts_with("/balances/")).count();
    assert_eq!(balance_reads, 1);
}

#[tokio::test]
async fn targeted_allow_list_request_hits_named_list() {
    let stub = StubUpstream::start(vec![Route::json(
        &format!("/lists/builders/addresses/{ADDRESS}"),
        &json!({"on_list": true}),
    )]);
    let registry =
        builtin_registry(&all_platforms(&stub.base_url), ProviderAccessPolicy::allow_all())
            .unwrap();
    let dispatcher = Dispatcher::new(Arc::new(registry));

    let payload = RequestPayload::new("AllowList#builders", ADDRESS);

    let outcomes = dispatcher.verify(&payload).await.unwrap();

    assert!(outcomes[0].is_valid());
    assert_eq!(stub.urls(), vec![format!("/lists/builders/addresses/{ADDRESS}")]);
}
