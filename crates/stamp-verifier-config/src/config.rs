// crates/stamp-verifier-config/src/config.rs
// ============================================================================
// Module: Stamp Verifier Configuration
// Description: Configuration loading and validation for the verifier.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: stamp-verifier-core, stamp-verifier-providers, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Missing or invalid configuration fails closed. Each upstream platform has
//! its own optional section; an omitted section leaves that platform
//! unregistered. Secrets never live in the file: `[github]` names the
//! environment variable holding the client secret, resolved at load time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde::Serialize;
use stamp_verifier_core::AuditSink;
use stamp_verifier_core::FileAuditSink;
use stamp_verifier_core::NoopAuditSink;
use stamp_verifier_core::ProviderAccessPolicy;
use stamp_verifier_core::StderrAuditSink;
use stamp_verifier_providers::BalancePlatformConfig;
use stamp_verifier_providers::BuiltinPlatformConfigs;
use stamp_verifier_providers::GithubPlatformConfig;
use stamp_verifier_providers::RestPlatformConfig;
use stamp_verifier_providers::UpstreamHttpConfig;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "stamp-verifier.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "STAMP_VERIFIER_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Minimum upstream timeout in milliseconds.
pub(crate) const MIN_HTTP_TIMEOUT_MS: u64 = 100;
/// Maximum upstream timeout in milliseconds.
pub(crate) const MAX_HTTP_TIMEOUT_MS: u64 = 30_000;
/// Maximum upstream response size in bytes.
pub(crate) const MAX_HTTP_RESPONSE_BYTES: usize = 8 * 1024 * 1024;
/// Maximum length of the outbound user agent.
pub(crate) const MAX_USER_AGENT_LENGTH: usize = 256;
/// Maximum number of allowlist or denylist entries.
pub(crate) const MAX_POLICY_RULES: usize = 256;
/// Maximum number of thresholds per provider family.
pub(crate) const MAX_THRESHOLDS: usize = 64;
/// Maximum length of a URL setting.
pub(crate) const MAX_URL_LENGTH: usize = 2048;
/// Maximum spacing between throttled upstream calls in milliseconds.
pub(crate) const MAX_THROTTLE_MS: u64 = 60_000;
/// Default environment variable holding the GitHub client secret.
pub(crate) const DEFAULT_GITHUB_SECRET_ENV: &str = "GITHUB_CLIENT_SECRET";

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Stamp verifier configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StampVerifierConfig {
    /// Upstream HTTP client settings.
    #[serde(default)]
    pub http: UpstreamHttpConfig,
    /// Provider access policy.
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Audit sink selection.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Humanity registry upstream.
    #[serde(default)]
    pub humanity: Option<UpstreamSection>,
    /// Allow list upstream.
    #[serde(default)]
    pub allow_list: Option<UpstreamSection>,
    /// Profile handle upstream.
    #[serde(default)]
    pub handle: Option<UpstreamSection>,
    /// Balance threshold upstream.
    #[serde(default)]
    pub balance: Option<BalanceSection>,
    /// GitHub OAuth platform.
    #[serde(default)]
    pub github: Option<GithubSection>,
}

impl StampVerifierConfig {
    /// Loads configuration using CLI path, env override, or default path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config = Self::parse(content)?;
        config.resolve_secrets(|name| env::var(name).ok());
        Ok(config)
    }

    /// Parses and validates configuration text without touching secrets.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Fills secrets named by the config from `lookup`.
    ///
    /// A secret the lookup cannot provide stays unset; providers that need
    /// it fail per request instead of failing the whole configuration.
    pub fn resolve_secrets(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(github) = &mut self.github {
            github.client_secret =
                lookup(&github.client_secret_env).filter(|secret| !secret.trim().is_empty());
        }
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_http(&self.http)?;
        self.policy.validate()?;
        self.audit.validate()?;
        let allow_http = self.http.allow_http;
        for (name, section) in [
            ("humanity", &self.humanity),
            ("allow_list", &self.allow_list),
            ("handle", &self.handle),
        ] {
            if let Some(section) = section {
                validate_url(&format!("{name}.base_url"), &section.base_url, allow_http)?;
            }
        }
        if let Some(balance) = &self.balance {
            balance.validate(allow_http)?;
        }
        if let Some(github) = &self.github {
            github.validate(allow_http)?;
        }
        Ok(())
    }

    /// Returns the built-in platform settings for registry assembly.
    #[must_use]
    pub fn platform_configs(&self) -> BuiltinPlatformConfigs {
        let rest = |section: &UpstreamSection| RestPlatformConfig {
            base_url: section.base_url.trim().to_string(),
        };
        BuiltinPlatformConfigs {
            http: self.http.clone(),
            humanity: self.humanity.as_ref().map(rest),
            allow_list: self.allow_list.as_ref().map(rest),
            handle: self.handle.as_ref().map(rest),
            balance: self.balance.as_ref().map(|balance| BalancePlatformConfig {
                base_url: balance.base_url.trim().to_string(),
                thresholds: balance.thresholds.clone(),
                record_attribute: balance.record_attribute.clone(),
            }),
            github: self.github.as_ref().map(|github| GithubPlatformConfig {
                token_url: github.token_url.trim().to_string(),
                api_url: github.api_url.trim().to_string(),
                client_id: github.client_id.clone(),
                client_secret: github.client_secret.clone(),
                throttle_ms: github.throttle_ms,
                follower_thresholds: github.follower_thresholds.clone(),
                repo_thresholds: github.repo_thresholds.clone(),
            }),
        }
    }

    /// Returns the provider access policy.
    #[must_use]
    pub fn access_policy(&self) -> ProviderAccessPolicy {
        let collect = |entries: &[String]| -> BTreeSet<String> {
            entries.iter().map(|entry| entry.trim().to_string()).collect()
        };
        ProviderAccessPolicy {
            allowlist: self.policy.allowlist.as_deref().map(collect),
            denylist: collect(&self.policy.denylist),
        }
    }

    /// Opens the configured audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the audit file cannot be opened.
    pub fn audit_sink(&self) -> Result<Arc<dyn AuditSink>, ConfigError> {
        match (self.audit.sink, &self.audit.path) {
            (AuditSinkKind::None, _) => Ok(Arc::new(NoopAuditSink)),
            (AuditSinkKind::Stderr, _) => Ok(Arc::new(StderrAuditSink)),
            (AuditSinkKind::File, Some(path)) => {
                let sink = FileAuditSink::new(Path::new(path.trim()))
                    .map_err(|err| ConfigError::Io(err.to_string()))?;
                Ok(Arc::new(sink))
            }
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("audit.path is required for file sink".to_string()))
            }
        }
    }
}

/// Provider access policy configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PolicyConfig {
    /// Optional allowlist of provider types; absent permits every type.
    #[serde(default)]
    pub allowlist: Option<Vec<String>>,
    /// Denied provider types; wins over the allowlist.
    #[serde(default)]
    pub denylist: Vec<String>,
}

impl PolicyConfig {
    /// Validates policy entries.
    fn validate(&self) -> Result<(), ConfigError> {
        let allowlist = self.allowlist.as_deref().unwrap_or_default();
        if allowlist.len() > MAX_POLICY_RULES || self.denylist.len() > MAX_POLICY_RULES {
            return Err(ConfigError::Invalid("too many policy entries".to_string()));
        }
        if allowlist.iter().chain(self.denylist.iter()).any(|entry| entry.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "policy allowlist/denylist entries must be non-empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Audit sink kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// Discard audit events.
    #[default]
    None,
    /// JSON lines on stderr.
    Stderr,
    /// JSON lines appended to a file.
    File,
}

/// Audit logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AuditConfig {
    /// Sink receiving audit events.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// Audit log path (required for the file sink).
    #[serde(default)]
    pub path: Option<String>,
}

impl AuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match (&self.sink, &self.path) {
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("audit.path is required for file sink".to_string()))
            }
            (_, Some(path)) => validate_path_string("audit.path", path),
            _ => Ok(()),
        }
    }
}

/// Upstream location of an address-based platform.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpstreamSection {
    /// Base URL of the upstream collaborator.
    pub base_url: String,
}

/// Balance threshold platform configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BalanceSection {
    /// Base URL of the balance collaborator.
    pub base_url: String,
    /// Decimal thresholds, one provider each.
    pub thresholds: Vec<String>,
    /// Record attribute and provider type prefix.
    #[serde(default = "default_record_attribute")]
    pub record_attribute: String,
}

impl BalanceSection {
    /// Validates balance configuration.
    fn validate(&self, allow_http: bool) -> Result<(), ConfigError> {
        validate_url("balance.base_url", &self.base_url, allow_http)?;
        let attribute = self.record_attribute.trim();
        if attribute.is_empty() || attribute.contains('#') {
            return Err(ConfigError::Invalid(
                "balance.record_attribute must be non-empty and must not contain '#'".to_string(),
            ));
        }
        if self.thresholds.is_empty() || self.thresholds.len() > MAX_THRESHOLDS {
            return Err(ConfigError::Invalid(format!(
                "balance.thresholds must list between 1 and {MAX_THRESHOLDS} values"
            )));
        }
        let mut seen = BTreeSet::new();
        for raw in &self.thresholds {
            let threshold = BigDecimal::from_str(raw.trim()).map_err(|_| {
                ConfigError::Invalid(format!("balance.thresholds entry is not a decimal: {raw}"))
            })?;
            if threshold < BigDecimal::from(0) {
                return Err(ConfigError::Invalid(format!(
                    "balance.thresholds entry must not be negative: {raw}"
                )));
            }
            if !seen.insert(threshold.normalized()) {
                return Err(ConfigError::Invalid(format!(
                    "balance.thresholds entry is duplicated: {raw}"
                )));
            }
        }
        Ok(())
    }
}

/// GitHub OAuth platform configuration.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct GithubSection {
    /// Token exchange endpoint.
    #[serde(default = "default_github_token_url")]
    pub token_url: String,
    /// REST API root.
    #[serde(default = "default_github_api_url")]
    pub api_url: String,
    /// OAuth client identifier.
    pub client_id: String,
    /// Environment variable holding the client secret.
    #[serde(default = "default_github_secret_env")]
    pub client_secret_env: String,
    /// Spacing between sequential upstream calls, in milliseconds.
    #[serde(default = "default_github_throttle_ms")]
    pub throttle_ms: u64,
    /// Follower tiers.
    #[serde(default = "default_follower_thresholds")]
    pub follower_thresholds: Vec<u64>,
    /// Owned repository tiers.
    #[serde(default = "default_repo_thresholds")]
    pub repo_thresholds: Vec<u64>,
    /// Client secret resolved from `client_secret_env` at load time.
    #[serde(skip)]
    pub client_secret: Option<String>,
}

impl GithubSection {
    /// Validates GitHub configuration.
    fn validate(&self, allow_http: bool) -> Result<(), ConfigError> {
        validate_url("github.token_url", &self.token_url, allow_http)?;
        validate_url("github.api_url", &self.api_url, allow_http)?;
        if self.client_id.trim().is_empty() {
            return Err(ConfigError::Invalid("github.client_id must be non-empty".to_string()));
        }
        if self.client_secret_env.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "github.client_secret_env must be non-empty".to_string(),
            ));
        }
        if self.throttle_ms > MAX_THROTTLE_MS {
            return Err(ConfigError::Invalid(format!(
                "github.throttle_ms must be at most {MAX_THROTTLE_MS}"
            )));
        }
        validate_tiers("github.follower_thresholds", &self.follower_thresholds)?;
        validate_tiers("github.repo_thresholds", &self.repo_thresholds)?;
        if self.follower_thresholds.is_empty() && self.repo_thresholds.is_empty() {
            return Err(ConfigError::Invalid(
                "github must configure at least one follower or repo threshold".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for GithubSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubSection")
            .field("token_url", &self.token_url)
            .field("api_url", &self.api_url)
            .field("client_id", &self.client_id)
            .field("client_secret_env", &self.client_secret_env)
            .field("throttle_ms", &self.throttle_ms)
            .field("follower_thresholds", &self.follower_thresholds)
            .field("repo_thresholds", &self.repo_thresholds)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates the shared upstream client settings.
fn validate_http(http: &UpstreamHttpConfig) -> Result<(), ConfigError> {
    if !(MIN_HTTP_TIMEOUT_MS ..= MAX_HTTP_TIMEOUT_MS).contains(&http.timeout_ms) {
        return Err(ConfigError::Invalid(format!(
            "http.timeout_ms must be between {MIN_HTTP_TIMEOUT_MS} and {MAX_HTTP_TIMEOUT_MS}"
        )));
    }
    if http.max_response_bytes == 0 || http.max_response_bytes > MAX_HTTP_RESPONSE_BYTES {
        return Err(ConfigError::Invalid(format!(
            "http.max_response_bytes must be between 1 and {MAX_HTTP_RESPONSE_BYTES}"
        )));
    }
    let user_agent = http.user_agent.trim();
    if user_agent.is_empty() || user_agent.len() > MAX_USER_AGENT_LENGTH {
        return Err(ConfigError::Invalid(format!(
            "http.user_agent must be 1 to {MAX_USER_AGENT_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validates an upstream URL setting's scheme and length.
fn validate_url(field: &str, value: &str, allow_http: bool) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_URL_LENGTH {
        return Err(ConfigError::Invalid(format!(
            "{field} must be 1 to {MAX_URL_LENGTH} characters"
        )));
    }
    let (scheme, rest) = trimmed
        .split_once("://")
        .ok_or_else(|| ConfigError::Invalid(format!("{field} must be an absolute url")))?;
    match scheme.to_ascii_lowercase().as_str() {
        "https" => {}
        "http" if allow_http => {}
        "http" => {
            return Err(ConfigError::Invalid(format!(
                "{field} uses http but http.allow_http is false"
            )));
        }
        _ => return Err(ConfigError::Invalid(format!("{field} has unsupported scheme"))),
    }
    if rest.is_empty() || rest.starts_with('/') {
        return Err(ConfigError::Invalid(format!("{field} requires a host")));
    }
    Ok(())
}

/// Validates an account tier list.
fn validate_tiers(field: &str, tiers: &[u64]) -> Result<(), ConfigError> {
    if tiers.len() > MAX_THRESHOLDS {
        return Err(ConfigError::Invalid(format!(
            "{field} must list at most {MAX_THRESHOLDS} values"
        )));
    }
    let mut seen = BTreeSet::new();
    for tier in tiers {
        if *tier == 0 {
            return Err(ConfigError::Invalid(format!("{field} entries must be positive")));
        }
        if !seen.insert(*tier) {
            return Err(ConfigError::Invalid(format!("{field} entry is duplicated: {tier}")));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default balance record attribute.
fn default_record_attribute() -> String {
    BalancePlatformConfig::new(String::new(), Vec::new()).record_attribute
}

/// Default GitHub token exchange endpoint.
fn default_github_token_url() -> String {
    GithubPlatformConfig::default().token_url
}

/// Default GitHub API root.
fn default_github_api_url() -> String {
    GithubPlatformConfig::default().api_url
}

/// Default environment variable holding the client secret.
fn default_github_secret_env() -> String {
    DEFAULT_GITHUB_SECRET_ENV.to_string()
}

/// Default throttle spacing.
fn default_github_throttle_ms() -> u64 {
    GithubPlatformConfig::default().throttle_ms
}

/// Default follower tiers.
fn default_follower_thresholds() -> Vec<u64> {
    GithubPlatformConfig::default().follower_thresholds
}

/// Default repository tiers.
fn default_repo_thresholds() -> Vec<u64> {
    GithubPlatformConfig::default().repo_thresholds
}
