// crates/stamp-verifier-core/src/runtime/issuance.rs
// ============================================================================
// Module: Issuance Hand-off
// Description: Per-provider items handed to the credential issuance service.
// Purpose: Shape dispatcher outcomes into issue/reject instructions.
// Dependencies: crate::core, serde
// ============================================================================

//! ## Overview
//! The engine never signs credentials. [`issuance_items`] turns a batch of
//! outcomes into the records an external issuer signs (valid verdicts) and
//! the rejections it reports back (everything else). A provider record that
//! carries a `pii` attribute widens the credential type to `Type#<pii>`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::PROVIDER_PARAM_SEPARATOR;
use crate::core::identifiers::ProviderId;
use crate::core::outcome::DEFAULT_ERROR_SUMMARY;
use crate::core::outcome::ProviderOutcome;
use crate::core::outcome::STATUS_FAILED;
use crate::core::payload::Record;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Record attribute widening the credential type.
pub const PII_ATTRIBUTE: &str = "pii";

// ============================================================================
// SECTION: Items
// ============================================================================

/// One instruction for the issuance service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum IssuanceItem {
    /// Sign a credential over `record`.
    Issue {
        /// Requested provider type.
        provider_type: ProviderId,
        /// Credential record (`type`, `version`, then provider attributes).
        record: Record,
        /// Optional credential lifetime override.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expires_in_seconds: Option<u64>,
    },
    /// Report the provider as not issued.
    Reject {
        /// Requested provider type.
        provider_type: ProviderId,
        /// Status code (403 business-invalid, 400 failed).
        code: u16,
        /// Error summary.
        error: String,
    },
}

impl IssuanceItem {
    /// Returns the requested provider type.
    #[must_use]
    pub const fn provider_type(&self) -> &ProviderId {
        match self {
            Self::Issue {
                provider_type, ..
            }
            | Self::Reject {
                provider_type, ..
            } => provider_type,
        }
    }
}

/// Maps outcomes onto issuance items in input order.
#[must_use]
pub fn issuance_items(outcomes: &[ProviderOutcome], version: &str) -> Vec<IssuanceItem> {
    outcomes.iter().map(|outcome| issuance_item(outcome, version)).collect()
}

/// Maps one outcome onto an issuance item.
fn issuance_item(outcome: &ProviderOutcome, version: &str) -> IssuanceItem {
    match (outcome.payload(), outcome.status_code()) {
        (Some(payload), None) => {
            let provider_record = payload.record.clone().unwrap_or_default();
            let credential_type = match provider_record.get(PII_ATTRIBUTE) {
                Some(pii) if !pii.is_empty() => {
                    format!("{}{PROVIDER_PARAM_SEPARATOR}{pii}", outcome.provider_type)
                }
                _ => outcome.provider_type.to_string(),
            };
            let mut record = Record::new();
            record.insert("type".to_string(), credential_type);
            record.insert("version".to_string(), version.to_string());
            record.extend(provider_record);
            IssuanceItem::Issue {
                provider_type: outcome.provider_type.clone(),
                record,
                expires_in_seconds: payload.expires_in_seconds,
            }
        }
        (_, code) => IssuanceItem::Reject {
            provider_type: outcome.provider_type.clone(),
            code: code.unwrap_or(STATUS_FAILED),
            error: outcome.error_summary().unwrap_or_else(|| DEFAULT_ERROR_SUMMARY.to_string()),
        },
    }
}
