// crates/stamp-verifier-core/src/core/payload.rs
// ============================================================================
// Module: Stamp Verifier Payloads
// Description: Request and verdict payloads exchanged with providers.
// Purpose: Define the immutable verification input and per-provider output.
// Dependencies: crate::core::identifiers, serde, thiserror
// ============================================================================

//! ## Overview
//! A [`RequestPayload`] is the immutable input of one verification call. The
//! address is case-insensitive and normalized once per request through
//! [`RequestPayload::normalized`]. A [`VerifiedPayload`] is the verdict of one
//! provider invocation: business-rule failures are expressed here with
//! `valid = false` and human-readable `errors`, never as errors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::ProviderId;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Opaque proof strings supplied by the wallet/OAuth layer.
pub type Proofs = BTreeMap<String, String>;

/// Credential attributes produced by a provider.
pub type Record = BTreeMap<String, String>;

/// Length of an EVM address including the `0x` prefix.
const EVM_ADDRESS_LEN: usize = 42;

/// Payload validation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    /// The payload carries no usable address.
    #[error("request payload is missing an address")]
    MissingAddress,
}

// ============================================================================
// SECTION: Request Payload
// ============================================================================

/// Immutable input to a verification call.
///
/// # Invariants
/// - `address` is lowercased and trimmed after [`RequestPayload::normalized`].
/// - `proofs` values are opaque strings and never interpreted by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPayload {
    /// Primary provider type of the request.
    #[serde(rename = "type")]
    pub provider_type: ProviderId,
    /// Optional list of requested provider types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<ProviderId>>,
    /// Address the stamps are requested for.
    pub address: String,
    /// Payload version string.
    #[serde(default)]
    pub version: String,
    /// Opaque proofs (OAuth code, signed messages, list names, ...).
    #[serde(default)]
    pub proofs: Proofs,
    /// Optional RPC endpoint override for on-chain reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<String>,
}

impl RequestPayload {
    /// Creates a payload for a single provider type and address.
    #[must_use]
    pub fn new(provider_type: impl Into<ProviderId>, address: impl Into<String>) -> Self {
        Self {
            provider_type: provider_type.into(),
            types: None,
            address: address.into(),
            version: "0.0.0".to_string(),
            proofs: Proofs::new(),
            rpc_url: None,
        }
    }

    /// Returns a copy with the requested type list set.
    #[must_use]
    pub fn with_types(mut self, types: Vec<ProviderId>) -> Self {
        self.types = Some(types);
        self
    }

    /// Returns a copy with an additional proof entry.
    #[must_use]
    pub fn with_proof(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.proofs.insert(key.into(), value.into());
        self
    }

    /// Returns a copy whose address is trimmed and lowercased.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::MissingAddress`] when the address is blank.
    pub fn normalized(&self) -> Result<Self, PayloadError> {
        let address = normalize_address(&self.address).ok_or(PayloadError::MissingAddress)?;
        Ok(Self {
            address,
            ..self.clone()
        })
    }

    /// Returns the requested provider types.
    ///
    /// Uses `types` when it holds at least one non-blank entry, otherwise the
    /// single `type` of the payload. Blank entries are dropped.
    #[must_use]
    pub fn requested_types(&self) -> Vec<ProviderId> {
        let listed: Vec<ProviderId> = self
            .types
            .iter()
            .flatten()
            .filter(|provider_type| !provider_type.is_blank())
            .cloned()
            .collect();
        if !listed.is_empty() {
            return listed;
        }
        if self.provider_type.is_blank() { Vec::new() } else { vec![self.provider_type.clone()] }
    }

    /// Returns a copy with the given proof entries layered over existing ones.
    #[must_use]
    pub fn with_proof_overlay(&self, overlay: &Proofs) -> Self {
        if overlay.is_empty() {
            return self.clone();
        }
        let mut proofs = self.proofs.clone();
        proofs.extend(overlay.iter().map(|(key, value)| (key.clone(), value.clone())));
        Self {
            proofs,
            ..self.clone()
        }
    }
}

// ============================================================================
// SECTION: Verified Payload
// ============================================================================

/// Verdict of one provider invocation.
///
/// # Invariants
/// - `valid = false` with `errors` describes a business-rule failure.
/// - `record` becomes part of the issued credential when `valid` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedPayload {
    /// Whether the checked condition holds.
    pub valid: bool,
    /// Credential attributes (or diagnostic data for invalid verdicts).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<Record>,
    /// Human-readable reasons for an invalid verdict.
    #[serde(default)]
    pub errors: Vec<String>,
    /// Optional credential lifetime override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in_seconds: Option<u64>,
}

impl VerifiedPayload {
    /// Builds a valid verdict carrying the given record.
    #[must_use]
    pub fn valid(record: Record) -> Self {
        Self {
            valid: true,
            record: Some(record),
            errors: Vec::new(),
            expires_in_seconds: None,
        }
    }

    /// Builds an invalid verdict with a single reason.
    #[must_use]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            record: None,
            errors: vec![reason.into()],
            expires_in_seconds: None,
        }
    }

    /// Returns a copy with the record replaced.
    #[must_use]
    pub fn with_record(mut self, record: Record) -> Self {
        self.record = Some(record);
        self
    }

    /// Returns a copy with a credential lifetime override.
    #[must_use]
    pub fn with_expiry(mut self, seconds: u64) -> Self {
        self.expires_in_seconds = Some(seconds);
        self
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Trims and lowercases an address; returns `None` when blank.
#[must_use]
pub fn normalize_address(address: &str) -> Option<String> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_ascii_lowercase())
}

/// Returns true for a `0x`-prefixed, 40 hex digit address.
#[must_use]
pub fn is_evm_address(address: &str) -> bool {
    let address = address.trim();
    if address.len() != EVM_ADDRESS_LEN {
        return false;
    }
    let Some(digits) = address.strip_prefix("0x").or_else(|| address.strip_prefix("0X")) else {
        return false;
    };
    digits.chars().all(|ch| ch.is_ascii_hexdigit())
}

/// Builds a record holding only the address attribute.
#[must_use]
pub fn address_record(address: &str) -> Record {
    let mut record = Record::new();
    record.insert("address".to_string(), address.to_string());
    record
}
