// crates/stamp-verifier-providers/src/handle.rs
// ============================================================================
// Module: Handle Length Providers
// Description: Tiered stamps derived from the length of a profile handle.
// Purpose: Issue premium/paid profile stamps from one cached handle read.
// Dependencies: stamp-verifier-core, async-trait
// ============================================================================

//! ## Overview
//! Handle-length tiers share one upstream read per request: the primary
//! handle is memoized under [`HANDLE_NAMESPACE`], so checking the premium and
//! paid tiers together costs a single lookup. An address without a primary
//! handle is invalid for every tier.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::ops::RangeInclusive;
use std::sync::Arc;

use async_trait::async_trait;
use stamp_verifier_core::Provider;
use stamp_verifier_core::ProviderContext;
use stamp_verifier_core::ProviderError;
use stamp_verifier_core::ProviderId;
use stamp_verifier_core::RequestPayload;
use stamp_verifier_core::VerifiedPayload;
use stamp_verifier_core::address_record;

use crate::upstream::HandleLookup;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Context namespace holding the primary handle.
pub const HANDLE_NAMESPACE: &str = "cyberprofile:handle";

/// Provider type of the short-handle tier.
pub const PREMIUM_HANDLE_TYPE: &str = "CyberProfilePremium";

/// Provider type of the medium-handle tier.
pub const PAID_HANDLE_TYPE: &str = "CyberProfilePaid";

/// Reason reported when the address owns no handle.
const NO_PRIMARY_HANDLE: &str = "Address has no primary handle";

// ============================================================================
// SECTION: Provider
// ============================================================================

/// Verifies that the primary handle length falls inside a tier.
pub struct HandleLengthProvider {
    /// Registry key of this tier.
    provider_type: ProviderId,
    /// Accepted handle lengths, in characters.
    lengths: RangeInclusive<usize>,
    /// Upstream handle lookup.
    lookup: Arc<dyn HandleLookup>,
}

impl HandleLengthProvider {
    /// Creates a tier accepting handles whose length is within `lengths`.
    #[must_use]
    pub fn new(
        provider_type: impl Into<ProviderId>,
        lengths: RangeInclusive<usize>,
        lookup: Arc<dyn HandleLookup>,
    ) -> Self {
        Self {
            provider_type: provider_type.into(),
            lengths,
            lookup,
        }
    }

    /// Tier for handles of 1 to 6 characters.
    #[must_use]
    pub fn premium(lookup: Arc<dyn HandleLookup>) -> Self {
        Self::new(PREMIUM_HANDLE_TYPE, 1 ..= 6, lookup)
    }

    /// Tier for handles of 7 to 12 characters.
    #[must_use]
    pub fn paid(lookup: Arc<dyn HandleLookup>) -> Self {
        Self::new(PAID_HANDLE_TYPE, 7 ..= 12, lookup)
    }
}

#[async_trait]
impl Provider for HandleLengthProvider {
    fn provider_type(&self) -> &ProviderId {
        &self.provider_type
    }

    async fn verify(
        &self,
        payload: &RequestPayload,
        ctx: &ProviderContext,
    ) -> Result<VerifiedPayload, ProviderError> {
        let lookup = self.lookup.as_ref();
        let address = payload.address.as_str();
        let handle = ctx
            .get_or_compute(HANDLE_NAMESPACE, move || async move {
                lookup.primary_handle(address).await
            })
            .await?;
        let Some(handle) = handle.as_deref().filter(|handle| !handle.is_empty()) else {
            return Ok(VerifiedPayload::invalid(NO_PRIMARY_HANDLE));
        };
        let length = handle.chars().count();
        if !self.lengths.contains(&length) {
            return Ok(VerifiedPayload::invalid(format!(
                "Primary handle length {length} is outside {}..={}",
                self.lengths.start(),
                self.lengths.end()
            )));
        }
        let mut record = address_record(address);
        record.insert("userHandle".to_string(), handle.to_string());
        Ok(VerifiedPayload::valid(record))
    }
}
