// crates/stamp-verifier-providers/src/registry.rs
// ============================================================================
// Module: Built-in Registry
// Description: Assembly of the built-in platforms into a provider registry.
// Purpose: Register configured provider families with their platform groups.
// Dependencies: stamp-verifier-core, bigdecimal, thiserror
// ============================================================================

//! ## Overview
//! [`builtin_registry`] turns a [`BuiltinPlatformConfigs`] bundle into a
//! validated [`ProviderRegistry`]. A platform whose section is absent is not
//! registered. All families share one [`UpstreamHttpClient`], so limits and
//! scheme policy apply uniformly to every upstream collaborator.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use bigdecimal::BigDecimal;
use stamp_verifier_core::PlatformAuth;
use stamp_verifier_core::PlatformGroupSpec;
use stamp_verifier_core::PlatformSpec;
use stamp_verifier_core::Provider;
use stamp_verifier_core::ProviderAccessPolicy;
use stamp_verifier_core::ProviderError;
use stamp_verifier_core::ProviderRegistry;
use stamp_verifier_core::ProviderSpec;
use stamp_verifier_core::RegistryError;
use thiserror::Error;

use crate::account::AccountLookup;
use crate::account::AccountMetric;
use crate::account::AccountMetricProvider;
use crate::account::DEFAULT_THROTTLE_MS;
use crate::account::GithubOAuthConfig;
use crate::account::GithubUpstream;
use crate::allow_list::ALLOW_LIST_PROOF_KEY;
use crate::allow_list::ALLOW_LIST_TYPE;
use crate::allow_list::AllowListProvider;
use crate::handle::HandleLengthProvider;
use crate::handle::PAID_HANDLE_TYPE;
use crate::handle::PREMIUM_HANDLE_TYPE;
use crate::http::UpstreamHttpClient;
use crate::http::UpstreamHttpConfig;
use crate::http::parse_base_url;
use crate::humanity::HUMANITY_REGISTRY_TYPE;
use crate::humanity::HumanityRegistryProvider;
use crate::threshold::DEFAULT_BALANCE_ATTRIBUTE;
use crate::threshold::ThresholdProviderBuilder;
use crate::upstream::RestUpstream;

// ============================================================================
// SECTION: Built-in Config
// ============================================================================

/// Upstream location of an address-based platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestPlatformConfig {
    /// Base URL of the upstream collaborator.
    pub base_url: String,
}

/// Balance threshold family settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalancePlatformConfig {
    /// Base URL of the balance collaborator.
    pub base_url: String,
    /// Decimal thresholds, one provider each.
    pub thresholds: Vec<String>,
    /// Record attribute and type prefix.
    pub record_attribute: String,
}

impl BalancePlatformConfig {
    /// Creates settings with the default attribute.
    #[must_use]
    pub fn new(base_url: impl Into<String>, thresholds: Vec<String>) -> Self {
        Self {
            base_url: base_url.into(),
            thresholds,
            record_attribute: DEFAULT_BALANCE_ATTRIBUTE.to_string(),
        }
    }
}

/// Account platform settings.
#[derive(Clone, PartialEq, Eq)]
pub struct GithubPlatformConfig {
    /// Token exchange endpoint.
    pub token_url: String,
    /// REST API root.
    pub api_url: String,
    /// OAuth client identifier.
    pub client_id: String,
    /// Resolved OAuth client secret, when available.
    pub client_secret: Option<String>,
    /// Spacing between sequential upstream calls, in milliseconds.
    pub throttle_ms: u64,
    /// Follower tiers.
    pub follower_thresholds: Vec<u64>,
    /// Owned repository tiers.
    pub repo_thresholds: Vec<u64>,
}

impl fmt::Debug for GithubPlatformConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubPlatformConfig")
            .field("token_url", &self.token_url)
            .field("api_url", &self.api_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[redacted]"))
            .field("throttle_ms", &self.throttle_ms)
            .field("follower_thresholds", &self.follower_thresholds)
            .field("repo_thresholds", &self.repo_thresholds)
            .finish()
    }
}

impl Default for GithubPlatformConfig {
    fn default() -> Self {
        Self {
            token_url: "https://github.com/login/oauth/access_token".to_string(),
            api_url: "https://api.github.com".to_string(),
            client_id: String::new(),
            client_secret: None,
            throttle_ms: DEFAULT_THROTTLE_MS,
            follower_thresholds: vec![10, 50],
            repo_thresholds: vec![5],
        }
    }
}

/// Configuration bundle for built-in platforms.
///
/// # Invariants
/// - `None` sections leave the platform unregistered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuiltinPlatformConfigs {
    /// Shared upstream client settings.
    pub http: UpstreamHttpConfig,
    /// Humanity registry platform.
    pub humanity: Option<RestPlatformConfig>,
    /// Allow list platform.
    pub allow_list: Option<RestPlatformConfig>,
    /// Handle length platform.
    pub handle: Option<RestPlatformConfig>,
    /// Balance threshold platform.
    pub balance: Option<BalancePlatformConfig>,
    /// Account platform.
    pub github: Option<GithubPlatformConfig>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failures while assembling the built-in registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuiltinRegistryError {
    /// The upstream client or a base URL could not be prepared.
    #[error("upstream setup failed: {0}")]
    Upstream(#[from] ProviderError),
    /// Registration or validation failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// A configured threshold is not a decimal.
    #[error("invalid threshold: {0}")]
    InvalidThreshold(String),
}

// ============================================================================
// SECTION: Assembly
// ============================================================================

/// Platform identifier of the humanity registry.
pub const HUMANITY_PLATFORM: &str = "HumanityRegistry";
/// Platform identifier of curated allow lists.
pub const ALLOW_LIST_PLATFORM: &str = "AllowList";
/// Platform identifier of profile handles.
pub const HANDLE_PLATFORM: &str = "CyberConnect";
/// Platform identifier of balance thresholds.
pub const BALANCE_PLATFORM: &str = "ETH";
/// Platform identifier of the OAuth account platform.
pub const GITHUB_PLATFORM: &str = "Github";

/// Builds a validated registry from the configured built-in platforms.
///
/// # Errors
///
/// Returns [`BuiltinRegistryError`] when the client cannot be built, a URL or
/// threshold is malformed, or registration fails.
pub fn builtin_registry(
    configs: &BuiltinPlatformConfigs,
    policy: ProviderAccessPolicy,
) -> Result<ProviderRegistry, BuiltinRegistryError> {
    let client = Arc::new(UpstreamHttpClient::new(configs.http.clone())?);
    let mut registry = ProviderRegistry::new(policy);

    if let Some(humanity) = &configs.humanity {
        let upstream = rest_upstream(&client, &humanity.base_url)?;
        registry.register_provider(HumanityRegistryProvider::new(upstream))?;
        registry.register_platform(
            PlatformSpec::new(
                HUMANITY_PLATFORM,
                "Humanity Registry",
                "Registered as a unique human.",
                PlatformAuth::Address,
            ),
            vec![PlatformGroupSpec::new("Registration", vec![ProviderSpec::new(
                HUMANITY_REGISTRY_TYPE,
                "Registered in the humanity registry",
            )])],
        )?;
    }

    if let Some(allow_list) = &configs.allow_list {
        let upstream = rest_upstream(&client, &allow_list.base_url)?;
        registry
            .register_parameterized(AllowListProvider::new(upstream), &[ALLOW_LIST_PROOF_KEY])?;
        registry.register_platform(
            PlatformSpec::new(
                ALLOW_LIST_PLATFORM,
                "Guest List",
                "Listed on a curated allow list.",
                PlatformAuth::Address,
            ),
            vec![PlatformGroupSpec::new("Guest List", vec![ProviderSpec::new(
                ALLOW_LIST_TYPE,
                "Member of an allow list",
            )])],
        )?;
    }

    if let Some(handle) = &configs.handle {
        let upstream = rest_upstream(&client, &handle.base_url)?;
        registry.register_provider(HandleLengthProvider::premium(upstream.clone()))?;
        registry.register_provider(HandleLengthProvider::paid(upstream))?;
        registry.register_platform(
            PlatformSpec::new(
                HANDLE_PLATFORM,
                "CyberConnect",
                "Owns a primary profile handle.",
                PlatformAuth::Address,
            ),
            vec![PlatformGroupSpec::new("CyberProfile", vec![
                ProviderSpec::new(PREMIUM_HANDLE_TYPE, "Premium handle (1-6 characters)"),
                ProviderSpec::new(PAID_HANDLE_TYPE, "Paid handle (7-12 characters)"),
            ])],
        )?;
    }

    if let Some(balance) = &configs.balance {
        let upstream = rest_upstream(&client, &balance.base_url)?;
        let builder = ThresholdProviderBuilder::new(balance.record_attribute.as_str(), upstream)
            .error_message("Balance is below the required threshold");
        let mut entries = Vec::with_capacity(balance.thresholds.len());
        for raw in &balance.thresholds {
            let threshold = BigDecimal::from_str(raw.trim())
                .map_err(|_| BuiltinRegistryError::InvalidThreshold(raw.clone()))?;
            let provider = builder.build(threshold);
            entries.push(ProviderSpec::new(
                provider.provider_type().clone(),
                format!("Holds at least {raw}"),
            ));
            registry.register_provider(provider)?;
        }
        registry.register_platform(
            PlatformSpec::new(
                BALANCE_PLATFORM,
                "Ethereum",
                "Holds on-chain assets above a threshold.",
                PlatformAuth::Address,
            ),
            vec![PlatformGroupSpec::new("Possessions", entries)],
        )?;
    }

    if let Some(github) = &configs.github {
        let upstream: Arc<dyn AccountLookup> =
            Arc::new(GithubUpstream::new(Arc::clone(&client), GithubOAuthConfig {
                token_url: parse_base_url(&github.token_url)?,
                api_url: parse_base_url(&github.api_url)?,
                client_id: github.client_id.clone(),
                client_secret: github.client_secret.clone(),
            }));
        let spacing = Duration::from_millis(github.throttle_ms);
        let mut groups = Vec::new();
        for (metric, label, thresholds) in [
            (AccountMetric::Followers, "Followers", &github.follower_thresholds),
            (AccountMetric::OwnedRepos, "Repositories", &github.repo_thresholds),
        ] {
            let mut entries = Vec::with_capacity(thresholds.len());
            for threshold in thresholds {
                let provider =
                    AccountMetricProvider::new(metric, *threshold, Arc::clone(&upstream), spacing);
                entries.push(ProviderSpec::new(
                    provider.provider_type().clone(),
                    format!("At least {threshold} {}", label.to_ascii_lowercase()),
                ));
                registry.register_provider(provider)?;
            }
            if !entries.is_empty() {
                groups.push(PlatformGroupSpec::new(label, entries));
            }
        }
        registry.register_platform(
            PlatformSpec::new(
                GITHUB_PLATFORM,
                "GitHub",
                "Connects a GitHub account.",
                PlatformAuth::OAuth,
            ),
            groups,
        )?;
    }

    registry.validate()?;
    Ok(registry)
}

/// Builds a REST collaborator over the shared client.
fn rest_upstream(
    client: &Arc<UpstreamHttpClient>,
    base_url: &str,
) -> Result<Arc<RestUpstream>, BuiltinRegistryError> {
    Ok(Arc::new(RestUpstream::new(Arc::clone(client), parse_base_url(base_url)?)))
}
