// crates/stamp-verifier-core/src/interfaces/mod.rs
// ============================================================================
// Module: Stamp Verifier Interfaces
// Description: Provider contract and per-provider error taxonomy.
// Purpose: Define the surface every identity check implements.
// Dependencies: crate::{core, runtime::context}, async-trait, thiserror
// ============================================================================

//! ## Overview
//! Every identity check implements [`Provider`]. A provider reports the
//! business outcome of its check as a [`VerifiedPayload`]; only upstream or
//! configuration failures are raised as [`ProviderError`]. Providers are
//! constructed once and reused across requests, so they must not keep
//! per-request state; shared upstream reads go through the
//! [`ProviderContext`] handed to every call.
//!
//! Security posture: providers consume untrusted proofs and upstream data.
//! Error text must never carry secrets; see [`ProviderError::external_redacted`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use thiserror::Error;

use crate::core::identifiers::ProviderId;
use crate::core::payload::RequestPayload;
use crate::core::payload::VerifiedPayload;
use crate::runtime::context::ProviderContext;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Replacement text for redacted secrets.
const REDACTED: &str = "[redacted]";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Provider failures distinct from business-invalid verdicts.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Values are cheap to clone so a memoized failure can be replayed to every
///   provider reading the same context namespace.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Upstream dependency unreachable, non-2xx, malformed, or unconfigured.
    #[error("external verification error: {0}")]
    ExternalVerification(String),
    /// A context namespace was read back as a different type than written.
    #[error("context namespace {namespace} holds a different value type")]
    ContextTypeMismatch {
        /// Namespace that was read with the wrong type.
        namespace: String,
    },
}

impl ProviderError {
    /// Builds an external verification error.
    #[must_use]
    pub fn external(message: impl Into<String>) -> Self {
        Self::ExternalVerification(message.into())
    }

    /// Builds an external verification error with every secret occurrence removed.
    #[must_use]
    pub fn external_redacted(message: impl Into<String>, secrets: &[&str]) -> Self {
        let mut message = message.into();
        for secret in secrets.iter().filter(|secret| !secret.is_empty()) {
            message = message.replace(secret, REDACTED);
        }
        Self::ExternalVerification(message)
    }
}

// ============================================================================
// SECTION: Provider Contract
// ============================================================================

/// Pluggable identity check.
///
/// # Invariants
/// - `provider_type` is stable for the lifetime of the instance.
/// - Given an unchanged context entry, repeated calls with the same payload
///   return the same verdict.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Returns the registry key and credential tag of this provider.
    fn provider_type(&self) -> &ProviderId;

    /// Evaluates the provider condition for the payload address.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the check cannot complete. Conditions
    /// that simply do not hold are reported as `valid = false` verdicts.
    async fn verify(
        &self,
        payload: &RequestPayload,
        ctx: &ProviderContext,
    ) -> Result<VerifiedPayload, ProviderError>;
}
