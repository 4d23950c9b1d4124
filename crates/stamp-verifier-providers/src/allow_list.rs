// crates/stamp-verifier-providers/src/allow_list.rs
// ============================================================================
// Module: Allow List Provider
// Description: Verifies membership of an address in a named allow list.
// Purpose: Issue per-list stamps such as `AllowList#vip`.
// Dependencies: stamp-verifier-core, async-trait
// ============================================================================

//! ## Overview
//! [`AllowListProvider`] is registered as a parameterized base type: a
//! request for `AllowList#vip` reaches it with `proofs.allowList = "vip"`.
//! The verdict always records the address, whether or not it is listed, and
//! carries no reason for an unlisted address.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use stamp_verifier_core::Provider;
use stamp_verifier_core::ProviderContext;
use stamp_verifier_core::ProviderError;
use stamp_verifier_core::ProviderId;
use stamp_verifier_core::RequestPayload;
use stamp_verifier_core::VerifiedPayload;
use stamp_verifier_core::address_record;

use crate::upstream::AllowListLookup;

// ============================================================================
// SECTION: Provider
// ============================================================================

/// Base provider type of allow-list stamps.
pub const ALLOW_LIST_TYPE: &str = "AllowList";

/// Proof key carrying the list name.
pub const ALLOW_LIST_PROOF_KEY: &str = "allowList";

/// Verifies membership in the allow list named by the request.
pub struct AllowListProvider {
    /// Registry key of this provider.
    provider_type: ProviderId,
    /// Upstream membership lookup.
    lookup: Arc<dyn AllowListLookup>,
}

impl AllowListProvider {
    /// Creates the provider over a membership lookup.
    #[must_use]
    pub fn new(lookup: Arc<dyn AllowListLookup>) -> Self {
        Self {
            provider_type: ProviderId::new(ALLOW_LIST_TYPE),
            lookup,
        }
    }
}

#[async_trait]
impl Provider for AllowListProvider {
    fn provider_type(&self) -> &ProviderId {
        &self.provider_type
    }

    async fn verify(
        &self,
        payload: &RequestPayload,
        _ctx: &ProviderContext,
    ) -> Result<VerifiedPayload, ProviderError> {
        let record = address_record(&payload.address);
        let list = payload
            .proofs
            .get(ALLOW_LIST_PROOF_KEY)
            .map(|list| list.trim())
            .filter(|list| !list.is_empty());
        let Some(list) = list else {
            return Ok(VerifiedPayload::invalid("Allow list name is missing").with_record(record));
        };
        let listed = self.lookup.is_listed(list, &payload.address).await?;
        Ok(VerifiedPayload {
            valid: listed,
            record: Some(record),
            errors: Vec::new(),
            expires_in_seconds: None,
        })
    }
}
