// crates/stamp-verifier-providers/src/tests.rs
// ============================================================================
// Module: Providers Unit Tests
// Description: Unit tests for URL building, throttling, and tier rules.
// Purpose: Pin pure helpers used by every provider family.
// Dependencies: stamp-verifier-providers
// ============================================================================

//! ## Overview
//! Unit tests for helpers that need no upstream. Provider behavior against
//! fake and local HTTP upstreams lives under `tests/`.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

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
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use reqwest::Url;
use stamp_verifier_core::Provider;
use stamp_verifier_core::ProviderError;

use crate::AccountMetric;
use crate::AccountMetricProvider;
use crate::BalanceLookup;
use crate::GithubOAuthConfig;
use crate::GithubPlatformConfig;
use crate::ThresholdProviderBuilder;
use crate::UpstreamThrottle;
use crate::account::AccountLookup;
use crate::account::AccountProfile;
use crate::account::RepoSummary;
use crate::http::endpoint;
use crate::http::parse_base_url;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Balance lookup that must never be called.
struct UnusedBalance;

#[async_trait]
impl BalanceLookup for UnusedBalance {
    async fn balance(&self, _address: &str) -> Result<BigDecimal, ProviderError> {
        Err(ProviderError::external("unused"))
    }
}

/// Account lookup that must never be called.
struct UnusedAccount;

#[async_trait]
impl AccountLookup for UnusedAccount {
    async fn exchange_code(&self, _code: &str) -> Result<String, ProviderError> {
        Err(ProviderError::external("unused"))
    }

    async fn profile(&self, _token: &str) -> Result<AccountProfile, ProviderError> {
        Err(ProviderError::external("unused"))
    }

    async fn owned_repos(&self, _token: &str) -> Result<Vec<RepoSummary>, ProviderError> {
        Err(ProviderError::external("unused"))
    }
}

// ============================================================================
// SECTION: URL Building
// ============================================================================

#[test]
fn endpoint_appends_encoded_segments() {
    let base = Url::parse("https://upstream.test/api/").unwrap();

    let url = endpoint(&base, &["lists", "vip guests", "addresses", "0xabc"]).unwrap();

    assert_eq!(url.as_str(), "https://upstream.test/api/lists/vip%20guests/addresses/0xabc");
}

#[test]
fn endpoint_keeps_base_query_free_paths() {
    let base = Url::parse("https://upstream.test").unwrap();

    let url = endpoint(&base, &["profiles", "0xabc"]).unwrap();

    assert_eq!(url.as_str(), "https://upstream.test/profiles/0xabc");
}

#[test]
fn endpoint_rejects_cannot_be_a_base_urls() {
    let base = Url::parse("mailto:ops@upstream.test").unwrap();

    assert!(endpoint(&base, &["x"]).is_err());
}

#[test]
fn malformed_base_url_is_external_failure() {
    let error = parse_base_url("not a url").unwrap_err();

    assert!(matches!(error, ProviderError::ExternalVerification(_)));
}

// ============================================================================
// SECTION: Throttle
// ============================================================================

#[tokio::test(start_paused = true)]
async fn throttle_lets_first_call_through_and_spaces_later_ones() {
    let throttle = UpstreamThrottle::new(Duration::from_millis(1_000));
    let started = tokio::time::Instant::now();

    throttle.wait().await;
    assert_eq!(started.elapsed(), Duration::ZERO);

    throttle.wait().await;
    throttle.wait().await;
    assert!(started.elapsed() >= Duration::from_millis(2_000));
    assert!(started.elapsed() < Duration::from_millis(2_100));
}

#[tokio::test(start_paused = true)]
async fn throttle_does_not_wait_when_spacing_already_elapsed() {
    let throttle = UpstreamThrottle::new(Duration::from_millis(100));

    throttle.wait().await;
    tokio::time::sleep(Duration::from_millis(500)).await;
    let before = tokio::time::Instant::now();
    throttle.wait().await;

    assert_eq!(before.elapsed(), Duration::ZERO);
}

// ============================================================================
// SECTION: Tier Rules
// ============================================================================

#[test]
fn threshold_types_embed_the_threshold() {
    let builder = ThresholdProviderBuilder::new("ethPossessionsGte", Arc::new(UnusedBalance));

    let provider = builder.build(BigDecimal::from_str("10").unwrap());

    assert_eq!(provider.provider_type().as_str(), "ethPossessionsGte#10");
}

#[test]
fn threshold_evaluate_is_inclusive_and_exact() {
    let builder = ThresholdProviderBuilder::new("gtcGte", Arc::new(UnusedBalance))
        .error_message("Not enough GTC");
    let provider = builder.build(BigDecimal::from_str("0.1").unwrap());

    let at = provider.evaluate("0xabc", &BigDecimal::from_str("0.10").unwrap());
    let below = provider.evaluate("0xabc", &BigDecimal::from_str("0.0999999999").unwrap());

    assert!(at.valid);
    let record = at.record.unwrap();
    assert_eq!(record.get("address").map(String::as_str), Some("0xabc"));
    assert_eq!(record.get("gtcGte").map(String::as_str), Some("0.1"));
    assert!(!below.valid);
    assert!(below.errors[0].starts_with("Not enough GTC"));
}

#[test]
fn account_tiers_use_metric_prefixes() {
    let lookup: Arc<dyn AccountLookup> = Arc::new(UnusedAccount);
    let followers = AccountMetricProvider::new(
        AccountMetric::Followers,
        10,
        Arc::clone(&lookup),
        Duration::ZERO,
    );
    let repos = AccountMetricProvider::new(AccountMetric::OwnedRepos, 5, lookup, Duration::ZERO);

    assert_eq!(followers.provider_type().as_str(), "GithubFollowersGte#10");
    assert_eq!(repos.provider_type().as_str(), "GithubReposGte#5");
}

// ============================================================================
// SECTION: Secret Hygiene
// ============================================================================

#[test]
fn oauth_debug_output_redacts_client_secret() {
    let config = GithubOAuthConfig {
        token_url: Url::parse("https://github.test/token").unwrap(),
        api_url: Url::parse("https://api.github.test").unwrap(),
        client_id: "client".to_string(),
        client_secret: Some("hunter2".to_string()),
    };
    let platform = GithubPlatformConfig {
        client_secret: Some("hunter2".to_string()),
        ..GithubPlatformConfig::default()
    };

    let rendered = format!("{config:?} {platform:?}");

    assert!(!rendered.contains("hunter2"));
    assert!(rendered.contains("[redacted]"));
}
