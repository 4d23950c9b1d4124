// crates/stamp-verifier-providers/src/lib.rs
// ============================================================================
// Module: Stamp Verifier Providers
// Description: Built-in provider families and registry assembly.
// Purpose: Provide identity checks backed by bounded upstream collaborators.
// Dependencies: stamp-verifier-core, async-trait, bigdecimal, reqwest, tokio
// ============================================================================

//! ## Overview
//! This crate ships the built-in provider families (humanity registry, allow
//! list, handle length, balance threshold, account metric) and assembles
//! them into a [`stamp_verifier_core::ProviderRegistry`] through
//! [`builtin_registry`]. Each family reads its facts through a lookup trait,
//! implemented over HTTP by [`RestUpstream`] and [`GithubUpstream`].
//! Invariants:
//! - Upstream responses are bounded and fail closed as external failures.
//! - Shared upstream reads go through the request's provider context.
//! - Secrets never appear in failure messages.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod account;
pub mod allow_list;
pub mod handle;
pub mod http;
pub mod humanity;
pub mod registry;
pub mod threshold;
pub mod throttle;
pub mod upstream;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use account::AccountLookup;
pub use account::AccountMetric;
pub use account::AccountMetricProvider;
pub use account::AccountProfile;
pub use account::GithubOAuthConfig;
pub use account::GithubUpstream;
pub use account::RepoSummary;
pub use allow_list::AllowListProvider;
pub use handle::HandleLengthProvider;
pub use http::UpstreamHttpClient;
pub use http::UpstreamHttpConfig;
pub use humanity::HumanityRegistryProvider;
pub use registry::BalancePlatformConfig;
pub use registry::BuiltinPlatformConfigs;
pub use registry::BuiltinRegistryError;
pub use registry::GithubPlatformConfig;
pub use registry::RestPlatformConfig;
pub use registry::builtin_registry;
pub use threshold::ThresholdProvider;
pub use threshold::ThresholdProviderBuilder;
pub use throttle::UpstreamThrottle;
pub use upstream::AllowListLookup;
pub use upstream::BalanceLookup;
pub use upstream::HandleLookup;
pub use upstream::RegistrationLookup;
pub use upstream::RestUpstream;

#[cfg(test)]
mod tests;
