// crates/stamp-verifier-providers/src/account.rs
// ============================================================================
// Module: Account Metric Providers
// Description: OAuth-backed account tiers (followers, owned repositories).
// Purpose: Share one code exchange and one profile fetch across all tiers.
// Dependencies: stamp-verifier-core, async-trait, reqwest, serde, serde_json
// ============================================================================

//! ## Overview
//! Every tier of the account family exchanges the same OAuth `code` proof.
//! The token, profile, and repository list are memoized in the request's
//! provider context, so a request for several tiers costs one exchange and
//! one fetch of each resource. Upstream calls share an [`UpstreamThrottle`]
//! stored in the same context: the first call passes immediately and later
//! ones keep the configured spacing.
//!
//! Secrets never reach error text: the client secret, OAuth code, and access
//! token are redacted from every upstream failure message.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;
use stamp_verifier_core::Provider;
use stamp_verifier_core::ProviderContext;
use stamp_verifier_core::ProviderError;
use stamp_verifier_core::ProviderId;
use stamp_verifier_core::Record;
use stamp_verifier_core::RequestPayload;
use stamp_verifier_core::VerifiedPayload;

use crate::http::UpstreamHttpClient;
use crate::http::endpoint;
use crate::throttle::UpstreamThrottle;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Context namespace holding the exchanged access token.
pub const TOKEN_NAMESPACE: &str = "github:token";

/// Context namespace holding the account profile.
pub const PROFILE_NAMESPACE: &str = "github:profile";

/// Context namespace holding owned repositories.
pub const REPOS_NAMESPACE: &str = "github:repos";

/// Context namespace holding the request's upstream throttle.
pub const THROTTLE_NAMESPACE: &str = "github:throttle";

/// Proof key carrying the OAuth authorization code.
pub const CODE_PROOF_KEY: &str = "code";

/// Default spacing between sequential account API calls.
pub const DEFAULT_THROTTLE_MS: u64 = 1_000;

/// Page size used when listing owned repositories.
const REPOS_PAGE_SIZE: &str = "100";

// ============================================================================
// SECTION: Upstream Model
// ============================================================================

/// Account profile returned by the upstream API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountProfile {
    /// Stable numeric account identifier.
    pub id: u64,
    /// Account login.
    pub login: String,
    /// Follower count.
    #[serde(default)]
    pub followers: u64,
}

/// Repository summary returned by the upstream API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepoSummary {
    /// Repository name.
    pub name: String,
    /// True when the repository is a fork.
    #[serde(default)]
    pub fork: bool,
}

/// OAuth account API used by the account family.
#[async_trait]
pub trait AccountLookup: Send + Sync {
    /// Exchanges an authorization code for an access token.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the exchange fails or is unconfigured.
    async fn exchange_code(&self, code: &str) -> Result<String, ProviderError>;

    /// Fetches the authenticated account profile.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the upstream cannot answer.
    async fn profile(&self, token: &str) -> Result<AccountProfile, ProviderError>;

    /// Lists repositories owned by the authenticated account, forks excluded.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the upstream cannot answer.
    async fn owned_repos(&self, token: &str) -> Result<Vec<RepoSummary>, ProviderError>;
}

// ============================================================================
// SECTION: GitHub Upstream
// ============================================================================

/// OAuth application settings for the GitHub upstream.
#[derive(Clone, PartialEq, Eq)]
pub struct GithubOAuthConfig {
    /// Token exchange endpoint.
    pub token_url: Url,
    /// REST API root.
    pub api_url: Url,
    /// OAuth client identifier.
    pub client_id: String,
    /// OAuth client secret, when configured.
    pub client_secret: Option<String>,
}

impl fmt::Debug for GithubOAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubOAuthConfig")
            .field("token_url", &self.token_url.as_str())
            .field("api_url", &self.api_url.as_str())
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

/// Token exchange reply.
#[derive(Deserialize)]
struct TokenReply {
    /// Issued access token.
    #[serde(default)]
    access_token: Option<String>,
    /// Error code reported instead of a token.
    #[serde(default)]
    error: Option<String>,
}

/// Account API reached through the bounded upstream client.
#[derive(Debug, Clone)]
pub struct GithubUpstream {
    /// Shared bounded client.
    client: Arc<UpstreamHttpClient>,
    /// OAuth application settings.
    config: GithubOAuthConfig,
}

impl GithubUpstream {
    /// Creates the upstream over a shared client.
    #[must_use]
    pub const fn new(client: Arc<UpstreamHttpClient>, config: GithubOAuthConfig) -> Self {
        Self {
            client,
            config,
        }
    }
}

#[async_trait]
impl AccountLookup for GithubUpstream {
    async fn exchange_code(&self, code: &str) -> Result<String, ProviderError> {
        let Some(secret) = self.config.client_secret.as_deref().filter(|secret| !secret.is_empty())
        else {
            return Err(ProviderError::external("GitHub client secret is not configured"));
        };
        let body = json!({
            "client_id": self.config.client_id,
            "client_secret": secret,
            "code": code,
        });
        let reply: TokenReply = self
            .client
            .post_json(&self.config.token_url, &body)
            .await
            .map_err(|error| redact(error, &[secret, code]))?;
        match reply.access_token.filter(|token| !token.is_empty()) {
            Some(token) => Ok(token),
            None => Err(ProviderError::external_redacted(
                format!(
                    "GitHub token exchange rejected: {}",
                    reply.error.as_deref().unwrap_or("no access token")
                ),
                &[secret, code],
            )),
        }
    }

    async fn profile(&self, token: &str) -> Result<AccountProfile, ProviderError> {
        let url = endpoint(&self.config.api_url, &["user"])?;
        self.client.get_json(&url, Some(token)).await.map_err(|error| redact(error, &[token]))
    }

    async fn owned_repos(&self, token: &str) -> Result<Vec<RepoSummary>, ProviderError> {
        let mut url = endpoint(&self.config.api_url, &["user", "repos"])?;
        url.query_pairs_mut().append_pair("per_page", REPOS_PAGE_SIZE).append_pair("type", "owner");
        let repos: Vec<RepoSummary> =
            self.client.get_json(&url, Some(token)).await.map_err(|error| redact(error, &[token]))?;
        Ok(repos.into_iter().filter(|repo| !repo.fork).collect())
    }
}

/// Removes secrets from an external failure message.
fn redact(error: ProviderError, secrets: &[&str]) -> ProviderError {
    match error {
        ProviderError::ExternalVerification(message) => {
            ProviderError::external_redacted(message, secrets)
        }
        other @ ProviderError::ContextTypeMismatch { .. } => other,
    }
}

// ============================================================================
// SECTION: Provider
// ============================================================================

/// Account metric compared by a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountMetric {
    /// Follower count of the account.
    Followers,
    /// Number of non-fork repositories owned by the account.
    OwnedRepos,
}

impl AccountMetric {
    /// Type prefix of tiers over this metric.
    #[must_use]
    pub const fn type_prefix(self) -> &'static str {
        match self {
            Self::Followers => "GithubFollowersGte",
            Self::OwnedRepos => "GithubReposGte",
        }
    }

    /// Suffix of the record identifier of tiers over this metric.
    const fn record_suffix(self) -> &'static str {
        match self {
            Self::Followers => "GithubFollowers",
            Self::OwnedRepos => "GithubRepos",
        }
    }

    /// Human-readable metric name.
    const fn label(self) -> &'static str {
        match self {
            Self::Followers => "followers",
            Self::OwnedRepos => "owned repositories",
        }
    }
}

/// Verifies that an account metric reaches a tier threshold.
pub struct AccountMetricProvider {
    /// Registry key, `{prefix}#{threshold}`.
    provider_type: ProviderId,
    /// Compared metric.
    metric: AccountMetric,
    /// Minimum accepted metric value.
    threshold: u64,
    /// Upstream account API.
    lookup: Arc<dyn AccountLookup>,
    /// Spacing between sequential upstream calls.
    spacing: Duration,
}

impl AccountMetricProvider {
    /// Creates a tier over `metric` with the given threshold.
    #[must_use]
    pub fn new(
        metric: AccountMetric,
        threshold: u64,
        lookup: Arc<dyn AccountLookup>,
        spacing: Duration,
    ) -> Self {
        Self {
            provider_type: ProviderId::new(format!("{}#{threshold}", metric.type_prefix())),
            metric,
            threshold,
            lookup,
            spacing,
        }
    }

    /// Returns the request's throttle, creating it on first use.
    async fn throttle(
        &self,
        ctx: &ProviderContext,
    ) -> Result<Arc<UpstreamThrottle>, ProviderError> {
        let spacing = self.spacing;
        ctx.get_or_compute(THROTTLE_NAMESPACE, move || async move {
            Ok(UpstreamThrottle::new(spacing))
        })
        .await
    }

    /// Reads the compared metric, fetching shared resources at most once.
    async fn read_metric(
        &self,
        code: &str,
        ctx: &ProviderContext,
    ) -> Result<(Arc<AccountProfile>, u64), ProviderError> {
        let throttle = self.throttle(ctx).await?;
        let throttle = throttle.as_ref();
        let lookup = self.lookup.as_ref();
        let token = ctx
            .get_or_compute(TOKEN_NAMESPACE, move || async move {
                throttle.wait().await;
                lookup.exchange_code(code).await
            })
            .await?;
        let token = token.as_str();
        let profile = ctx
            .get_or_compute(PROFILE_NAMESPACE, move || async move {
                throttle.wait().await;
                lookup.profile(token).await
            })
            .await?;
        let value = match self.metric {
            AccountMetric::Followers => profile.followers,
            AccountMetric::OwnedRepos => {
                let repos = ctx
                    .get_or_compute(REPOS_NAMESPACE, move || async move {
                        throttle.wait().await;
                        lookup.owned_repos(token).await
                    })
                    .await?;
                u64::try_from(repos.len()).unwrap_or(u64::MAX)
            }
        };
        Ok((profile, value))
    }
}

#[async_trait]
impl Provider for AccountMetricProvider {
    fn provider_type(&self) -> &ProviderId {
        &self.provider_type
    }

    async fn verify(
        &self,
        payload: &RequestPayload,
        ctx: &ProviderContext,
    ) -> Result<VerifiedPayload, ProviderError> {
        let code = payload.proofs.get(CODE_PROOF_KEY).map(|code| code.trim()).unwrap_or_default();
        if code.is_empty() {
            return Ok(VerifiedPayload::invalid("OAuth code is missing"));
        }
        let (profile, value) = self.read_metric(code, ctx).await?;
        if value < self.threshold {
            return Ok(VerifiedPayload::invalid(format!(
                "Account has {value} {}, at least {} required",
                self.metric.label(),
                self.threshold
            )));
        }
        let mut record = Record::new();
        record.insert(
            "id".to_string(),
            format!("{}gte{}{}", profile.id, self.threshold, self.metric.record_suffix()),
        );
        Ok(VerifiedPayload::valid(record))
    }
}
