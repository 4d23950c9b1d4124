// crates/stamp-verifier-core/src/core/outcome.rs
// ============================================================================
// Module: Stamp Verifier Outcomes
// Description: Per-provider results reported by the dispatcher.
// Purpose: Keep verdicts and captured failures keyed by provider identity.
// Dependencies: crate::core::{identifiers, payload}, serde
// ============================================================================

//! ## Overview
//! A [`ProviderOutcome`] pairs a requested provider type with either its
//! verdict or a captured failure. Failures cover external verification
//! errors, unknown or blocked provider types, and panicking provider tasks.
//! Outcomes are what the dispatcher returns for every requested type, so a
//! batch always reports one entry per request item.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ProviderId;
use crate::core::payload::VerifiedPayload;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum length of a joined error summary.
pub const MAX_ERROR_SUMMARY_CHARS: usize = 1000;
/// Summary used when an invalid verdict carries no reasons.
pub const DEFAULT_ERROR_SUMMARY: &str = "Unable to verify provider";
/// User-facing message for failed (not business-invalid) providers.
pub const RETRY_MESSAGE: &str = "Could not verify, try again.";
/// Message recorded for provider tasks that panicked.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "There was an unexpected error during verification.";
/// Message recorded for provider types with no registered implementation.
pub const MISSING_PROVIDER_MESSAGE: &str = "Missing provider";
/// Status code for business-invalid verdicts.
pub const STATUS_INVALID: u16 = 403;
/// Status code for failed verifications.
pub const STATUS_FAILED: u16 = 400;

// ============================================================================
// SECTION: Failures
// ============================================================================

/// Classification of a captured provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Upstream dependency failed (network, non-2xx, malformed, missing secret).
    External,
    /// No provider is registered for the requested type.
    UnknownProvider,
    /// The access policy blocks the requested type.
    Blocked,
    /// The provider task ended abnormally.
    Unexpected,
}

impl FailureKind {
    /// Returns a stable label for audit events.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::External => "external",
            Self::UnknownProvider => "unknown_provider",
            Self::Blocked => "blocked",
            Self::Unexpected => "unexpected",
        }
    }
}

/// Failure captured at the dispatcher boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderFailure {
    /// Failure classification.
    pub kind: FailureKind,
    /// Failure detail suitable for logs (secrets already redacted).
    pub message: String,
}

impl ProviderFailure {
    /// Creates a failure entry.
    #[must_use]
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Either a verdict or a captured failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProviderResult {
    /// The provider completed and produced a verdict.
    Verified {
        /// Provider verdict.
        payload: VerifiedPayload,
    },
    /// The provider could not produce a verdict.
    Failed {
        /// Captured failure.
        error: ProviderFailure,
    },
}

/// Result for one requested provider type.
///
/// # Invariants
/// - `provider_type` is the type as requested, including any parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderOutcome {
    /// Requested provider type.
    pub provider_type: ProviderId,
    /// Verdict or failure.
    pub result: ProviderResult,
}

impl ProviderOutcome {
    /// Builds an outcome carrying a verdict.
    #[must_use]
    pub const fn verified(provider_type: ProviderId, payload: VerifiedPayload) -> Self {
        Self {
            provider_type,
            result: ProviderResult::Verified {
                payload,
            },
        }
    }

    /// Builds an outcome carrying a failure.
    #[must_use]
    pub fn failed(
        provider_type: ProviderId,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            provider_type,
            result: ProviderResult::Failed {
                error: ProviderFailure::new(kind, message),
            },
        }
    }

    /// Returns true when the provider produced a valid verdict.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(&self.result, ProviderResult::Verified { payload } if payload.valid)
    }

    /// Returns the verdict when one was produced.
    #[must_use]
    pub const fn payload(&self) -> Option<&VerifiedPayload> {
        match &self.result {
            ProviderResult::Verified {
                payload,
            } => Some(payload),
            ProviderResult::Failed {
                ..
            } => None,
        }
    }

    /// Returns the captured failure when the provider did not complete.
    #[must_use]
    pub const fn failure(&self) -> Option<&ProviderFailure> {
        match &self.result {
            ProviderResult::Failed {
                error,
            } => Some(error),
            ProviderResult::Verified {
                ..
            } => None,
        }
    }

    /// Returns the status code handed to the issuance layer.
    ///
    /// `None` for valid verdicts, 403 for business-invalid, 400 for failures.
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match &self.result {
            ProviderResult::Verified {
                payload,
            } => {
                if payload.valid {
                    None
                } else {
                    Some(STATUS_INVALID)
                }
            }
            ProviderResult::Failed {
                ..
            } => Some(STATUS_FAILED),
        }
    }

    /// Returns the error summary for non-valid outcomes.
    ///
    /// Business-invalid reasons are joined with `", "` and truncated; failures
    /// report the generic summary so upstream detail stays in logs.
    #[must_use]
    pub fn error_summary(&self) -> Option<String> {
        match &self.result {
            ProviderResult::Verified {
                payload,
            } => {
                if payload.valid {
                    return None;
                }
                let joined = payload.errors.join(", ");
                if joined.is_empty() {
                    return Some(DEFAULT_ERROR_SUMMARY.to_string());
                }
                Some(joined.chars().take(MAX_ERROR_SUMMARY_CHARS).collect())
            }
            ProviderResult::Failed {
                ..
            } => Some(DEFAULT_ERROR_SUMMARY.to_string()),
        }
    }

    /// Returns the message shown to the user for non-valid outcomes.
    #[must_use]
    pub fn user_message(&self) -> Option<String> {
        match &self.result {
            ProviderResult::Verified {
                ..
            } => self.error_summary(),
            ProviderResult::Failed {
                ..
            } => Some(RETRY_MESSAGE.to_string()),
        }
    }
}
