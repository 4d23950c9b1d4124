// crates/stamp-verifier-core/src/core/spec.rs
// ============================================================================
// Module: Stamp Verifier Platform Specs
// Description: Static descriptive metadata for platforms, groups, and providers.
// Purpose: Describe the read-only platform -> group -> provider registry shape.
// Dependencies: crate::core::identifiers, serde
// ============================================================================

//! ## Overview
//! Platform specs are static metadata consumed by the registry. A platform
//! holds ordered groups; each group lists the providers displayed together.
//! Whether a platform can be checked from an address alone (and therefore
//! participates in address-wide scans) is captured by [`PlatformAuth`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::PlatformId;
use crate::core::identifiers::ProviderId;

// ============================================================================
// SECTION: Specs
// ============================================================================

/// How a platform obtains the evidence its providers check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformAuth {
    /// Checks need only the address (eligible for address-wide scans).
    Address,
    /// Checks need an OAuth code or other interactive proof.
    OAuth,
}

/// Descriptive metadata for one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformSpec {
    /// Platform identifier.
    pub platform: PlatformId,
    /// Display name.
    pub name: String,
    /// Short description.
    pub description: String,
    /// Evidence acquisition mode.
    pub auth: PlatformAuth,
}

impl PlatformSpec {
    /// Creates a platform spec.
    #[must_use]
    pub fn new(
        platform: impl Into<PlatformId>,
        name: impl Into<String>,
        description: impl Into<String>,
        auth: PlatformAuth,
    ) -> Self {
        Self {
            platform: platform.into(),
            name: name.into(),
            description: description.into(),
            auth,
        }
    }

    /// Returns true when the platform is checked from an address alone.
    #[must_use]
    pub fn is_address_based(&self) -> bool {
        self.auth == PlatformAuth::Address
    }
}

/// Descriptive metadata for one provider entry in a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSpec {
    /// Provider type identifier.
    pub name: ProviderId,
    /// Display title.
    pub title: String,
}

impl ProviderSpec {
    /// Creates a provider spec.
    #[must_use]
    pub fn new(name: impl Into<ProviderId>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
        }
    }
}

/// Labeled subset of providers within a platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformGroupSpec {
    /// Group label.
    pub platform_group: String,
    /// Providers in display order.
    pub providers: Vec<ProviderSpec>,
}

impl PlatformGroupSpec {
    /// Creates a group spec.
    #[must_use]
    pub fn new(label: impl Into<String>, providers: Vec<ProviderSpec>) -> Self {
        Self {
            platform_group: label.into(),
            providers,
        }
    }
}
