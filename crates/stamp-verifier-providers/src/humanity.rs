// crates/stamp-verifier-providers/src/humanity.rs
// ============================================================================
// Module: Humanity Registry Provider
// Description: Verifies that an address is registered as a unique human.
// Purpose: Issue the registry stamp from an upstream registration lookup.
// Dependencies: stamp-verifier-core, async-trait
// ============================================================================

//! ## Overview
//! [`HumanityRegistryProvider`] asks a [`RegistrationLookup`] whether the
//! payload address is registered. A registered address yields a valid
//! verdict recording the address; an unregistered one is business-invalid.

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

use crate::upstream::RegistrationLookup;

// ============================================================================
// SECTION: Provider
// ============================================================================

/// Provider type of the humanity registry stamp.
pub const HUMANITY_REGISTRY_TYPE: &str = "HumanityRegistry";

/// Reason reported for unregistered addresses.
const NOT_REGISTERED: &str = "Address is not registered in the humanity registry";

/// Verifies registration in a unique-human registry.
pub struct HumanityRegistryProvider {
    /// Registry key of this provider.
    provider_type: ProviderId,
    /// Upstream registration lookup.
    lookup: Arc<dyn RegistrationLookup>,
}

impl HumanityRegistryProvider {
    /// Creates the provider over a registration lookup.
    #[must_use]
    pub fn new(lookup: Arc<dyn RegistrationLookup>) -> Self {
        Self {
            provider_type: ProviderId::new(HUMANITY_REGISTRY_TYPE),
            lookup,
        }
    }
}

#[async_trait]
impl Provider for HumanityRegistryProvider {
    fn provider_type(&self) -> &ProviderId {
        &self.provider_type
    }

    async fn verify(
        &self,
        payload: &RequestPayload,
        _ctx: &ProviderContext,
    ) -> Result<VerifiedPayload, ProviderError> {
        if self.lookup.is_registered(&payload.address).await? {
            Ok(VerifiedPayload::valid(address_record(&payload.address)))
        } else {
            Ok(VerifiedPayload::invalid(NOT_REGISTERED))
        }
    }
}
