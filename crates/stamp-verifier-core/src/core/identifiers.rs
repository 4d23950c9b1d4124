// crates/stamp-verifier-core/src/core/identifiers.rs
// ============================================================================
// Module: Stamp Verifier Identifiers
// Description: Opaque identifiers for providers and platforms.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Provider and platform identifiers are opaque strings that serialize
//! transparently. Provider identifiers may carry `#`-separated parameters
//! (`AllowList#vip`, `ethPossessionsGte#10`); helpers here split them without
//! interpreting their meaning, which is left to the registry.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Separator between a provider base type and its parameters.
pub const PROVIDER_PARAM_SEPARATOR: char = '#';

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Provider type identifier used for registry lookup and credential tagging.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(String);

impl ProviderId {
    /// Creates a new provider identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the base type (everything before the first `#`).
    #[must_use]
    pub fn base(&self) -> &str {
        self.0.split(PROVIDER_PARAM_SEPARATOR).next().unwrap_or_default()
    }

    /// Returns the `#`-separated parameters following the base type.
    #[must_use]
    pub fn params(&self) -> Vec<&str> {
        self.0.split(PROVIDER_PARAM_SEPARATOR).skip(1).collect()
    }

    /// Returns true when the identifier is empty or whitespace only.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ProviderId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ProviderId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Platform identifier grouping one or more provider groups.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformId(String);

impl PlatformId {
    /// Creates a new platform identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for PlatformId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PlatformId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
