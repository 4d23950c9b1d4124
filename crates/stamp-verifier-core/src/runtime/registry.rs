// crates/stamp-verifier-core/src/runtime/registry.rs
// ============================================================================
// Module: Provider Registry
// Description: Platform -> group -> provider registry with access policy.
// Purpose: Resolve requested provider types to shared provider instances.
// Dependencies: crate::{core, interfaces}, thiserror
// ============================================================================

//! ## Overview
//! The registry maps provider types to provider instances and platforms to
//! their ordered groups. Lookups by platform and provider type are O(1).
//! Exactly one provider is registered per type; a base type may be declared
//! parameterized, in which case `Base#a#b` resolves to the `Base` provider
//! with its `#` segments copied into named proof entries.
//!
//! Access policy is enforced on every resolution: a denied type is reported
//! as blocked instead of running.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::core::identifiers::PlatformId;
use crate::core::identifiers::ProviderId;
use crate::core::payload::Proofs;
use crate::core::payload::RequestPayload;
use crate::core::spec::PlatformGroupSpec;
use crate::core::spec::PlatformSpec;
use crate::interfaces::Provider;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Registry construction and validation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// An identifier was registered twice.
    #[error("duplicate {kind} registration: {id}")]
    Duplicate {
        /// Kind of entry (`platform`, `provider`, `group provider`).
        kind: &'static str,
        /// Offending identifier.
        id: String,
    },
    /// A platform referenced by a lookup is not registered.
    #[error("platform not registered: {0}")]
    UnknownPlatform(PlatformId),
    /// A platform group lists a provider type with no implementation.
    #[error("platform {platform} lists unregistered provider {provider}")]
    UnknownProvider {
        /// Platform owning the group.
        platform: PlatformId,
        /// Provider type without an implementation.
        provider: ProviderId,
    },
    /// A registration cannot be resolved as declared.
    #[error("provider {provider} cannot be registered: {reason}")]
    Unresolvable {
        /// Provider type.
        provider: ProviderId,
        /// Reason.
        reason: String,
    },
}

/// Per-item resolution failures reported by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No provider is registered for the type.
    #[error("provider not registered: {0}")]
    UnknownProvider(ProviderId),
    /// The access policy blocks the type.
    #[error("provider blocked by policy: {0}")]
    Blocked(ProviderId),
    /// The type names a parameterized provider with the wrong parameters.
    #[error("provider {provider_type} expects {expected} parameter(s), got {actual}")]
    ParameterMismatch {
        /// Requested provider type.
        provider_type: ProviderId,
        /// Declared parameter count.
        expected: usize,
        /// Supplied parameter count.
        actual: usize,
    },
}

// ============================================================================
// SECTION: Access Policy
// ============================================================================

/// Access policy controlling which provider types may run.
///
/// # Invariants
/// - `denylist` overrides `allowlist` when both are present.
/// - If `allowlist` is `None`, all providers are allowed unless denied.
/// - Entries match either the full requested type or its base type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderAccessPolicy {
    /// Optional allowlist of provider types.
    pub allowlist: Option<BTreeSet<String>>,
    /// Explicit denylist of provider types.
    pub denylist: BTreeSet<String>,
}

impl ProviderAccessPolicy {
    /// Returns a policy that permits all providers.
    #[must_use]
    pub const fn allow_all() -> Self {
        Self {
            allowlist: None,
            denylist: BTreeSet::new(),
        }
    }

    /// Returns true when the provider type is allowed by policy.
    #[must_use]
    pub fn is_allowed(&self, provider_type: &ProviderId) -> bool {
        let full = provider_type.as_str();
        let base = provider_type.base();
        if self.denylist.contains(full) || self.denylist.contains(base) {
            return false;
        }
        if let Some(allowlist) = &self.allowlist {
            return allowlist.contains(full) || allowlist.contains(base);
        }
        true
    }
}

impl Default for ProviderAccessPolicy {
    fn default() -> Self {
        Self::allow_all()
    }
}

// ============================================================================
// SECTION: Registered Entries
// ============================================================================

/// A registered platform with its ordered groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredPlatform {
    /// Platform metadata.
    pub spec: PlatformSpec,
    /// Groups in display order.
    pub groups: Vec<PlatformGroupSpec>,
}

impl RegisteredPlatform {
    /// Returns every provider type listed by the platform, in group order.
    #[must_use]
    pub fn provider_types(&self) -> Vec<ProviderId> {
        self.groups
            .iter()
            .flat_map(|group| group.providers.iter().map(|provider| provider.name.clone()))
            .collect()
    }
}

/// A requested type resolved to its provider instance.
#[derive(Clone)]
pub struct ResolvedProvider {
    /// Type as requested, parameters included.
    pub requested: ProviderId,
    /// Owning platform when known.
    pub platform: Option<PlatformId>,
    /// Shared provider instance.
    pub provider: Arc<dyn Provider>,
    /// Proof entries derived from the requested type's parameters.
    pub proof_overlay: Proofs,
}

impl ResolvedProvider {
    /// Returns the payload handed to the provider.
    #[must_use]
    pub fn payload_for(&self, payload: &RequestPayload) -> RequestPayload {
        payload.with_proof_overlay(&self.proof_overlay)
    }
}

impl fmt::Debug for ResolvedProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedProvider")
            .field("requested", &self.requested)
            .field("platform", &self.platform)
            .field("provider", self.provider.provider_type())
            .field("proof_overlay", &self.proof_overlay.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ============================================================================
// SECTION: Provider Registry
// ============================================================================

/// Provider registry with policy enforcement.
///
/// # Invariants
/// - Provider types and platform identifiers are unique.
/// - A provider type is listed by at most one platform.
/// - Access policy is enforced on every resolution.
pub struct ProviderRegistry {
    /// Platforms in registration order.
    platforms: Vec<RegisteredPlatform>,
    /// Platform index by identifier.
    platform_index: HashMap<PlatformId, usize>,
    /// Owning platform by listed provider type.
    owners: HashMap<ProviderId, PlatformId>,
    /// Provider implementations by type.
    providers: HashMap<ProviderId, Arc<dyn Provider>>,
    /// Ordered proof keys of parameterized base types.
    parameterized: HashMap<ProviderId, Vec<String>>,
    /// Access control policy.
    policy: ProviderAccessPolicy,
}

impl ProviderRegistry {
    /// Creates an empty registry with the provided policy.
    #[must_use]
    pub fn new(policy: ProviderAccessPolicy) -> Self {
        Self {
            platforms: Vec::new(),
            platform_index: HashMap::new(),
            owners: HashMap::new(),
            providers: HashMap::new(),
            parameterized: HashMap::new(),
            policy,
        }
    }

    /// Registers a platform and its groups.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] when the platform is already
    /// registered or a listed provider type belongs to another platform.
    pub fn register_platform(
        &mut self,
        spec: PlatformSpec,
        groups: Vec<PlatformGroupSpec>,
    ) -> Result<(), RegistryError> {
        if self.platform_index.contains_key(&spec.platform) {
            return Err(RegistryError::Duplicate {
                kind: "platform",
                id: spec.platform.to_string(),
            });
        }
        let mut listed = BTreeSet::new();
        for provider in groups.iter().flat_map(|group| &group.providers) {
            if self.owners.contains_key(&provider.name) || !listed.insert(provider.name.clone()) {
                return Err(RegistryError::Duplicate {
                    kind: "group provider",
                    id: provider.name.to_string(),
                });
            }
        }
        for provider_type in listed {
            self.owners.insert(provider_type, spec.platform.clone());
        }
        self.platform_index.insert(spec.platform.clone(), self.platforms.len());
        self.platforms.push(RegisteredPlatform {
            spec,
            groups,
        });
        Ok(())
    }

    /// Registers a provider under its own type.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the type is blank or already registered.
    pub fn register_provider(
        &mut self,
        provider: impl Provider + 'static,
    ) -> Result<(), RegistryError> {
        self.register_shared(Arc::new(provider))
    }

    /// Registers an already shared provider under its own type.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the type is blank or already registered.
    pub fn register_shared(&mut self, provider: Arc<dyn Provider>) -> Result<(), RegistryError> {
        let provider_type = provider.provider_type().clone();
        if provider_type.is_blank() {
            return Err(RegistryError::Unresolvable {
                provider: provider_type,
                reason: "provider type is blank".to_string(),
            });
        }
        if self.providers.contains_key(&provider_type) {
            return Err(RegistryError::Duplicate {
                kind: "provider",
                id: provider_type.to_string(),
            });
        }
        self.providers.insert(provider_type, provider);
        Ok(())
    }

    /// Registers a provider whose requested types carry `#` parameters.
    ///
    /// `proof_keys` names the proof entry each parameter is copied into, in
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when no proof keys are given, the type
    /// already carries parameters, or the type is already registered.
    pub fn register_parameterized(
        &mut self,
        provider: impl Provider + 'static,
        proof_keys: &[&str],
    ) -> Result<(), RegistryError> {
        let provider_type = provider.provider_type().clone();
        if proof_keys.is_empty() || !provider_type.params().is_empty() {
            return Err(RegistryError::Unresolvable {
                provider: provider_type,
                reason: "parameterized providers need a plain base type and proof keys"
                    .to_string(),
            });
        }
        self.register_provider(provider)?;
        self.parameterized
            .insert(provider_type, proof_keys.iter().map(|key| (*key).to_string()).collect());
        Ok(())
    }

    /// Resolves a requested type to its provider instance.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] when the type is blocked, unknown, or carries
    /// the wrong number of parameters.
    pub fn resolve(&self, requested: &ProviderId) -> Result<ResolvedProvider, ResolveError> {
        if !self.policy.is_allowed(requested) {
            return Err(ResolveError::Blocked(requested.clone()));
        }
        if let Some(provider) = self.providers.get(requested) {
            return Ok(ResolvedProvider {
                requested: requested.clone(),
                platform: self.platform_of(requested).cloned(),
                provider: Arc::clone(provider),
                proof_overlay: Proofs::new(),
            });
        }
        let base = ProviderId::new(requested.base());
        let keys = self.parameterized.get(&base);
        let (Some(keys), Some(provider)) = (keys, self.providers.get(&base)) else {
            return Err(ResolveError::UnknownProvider(requested.clone()));
        };
        let params = requested.params();
        if params.len() != keys.len() || params.iter().any(|param| param.trim().is_empty()) {
            return Err(ResolveError::ParameterMismatch {
                provider_type: requested.clone(),
                expected: keys.len(),
                actual: params.len(),
            });
        }
        let proof_overlay =
            keys.iter().cloned().zip(params.iter().map(|param| (*param).to_string())).collect();
        Ok(ResolvedProvider {
            requested: requested.clone(),
            platform: self.platform_of(requested).cloned(),
            provider: Arc::clone(provider),
            proof_overlay,
        })
    }

    /// Checks that every provider type listed by a platform resolves.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownProvider`] for the first listed type
    /// without an implementation.
    pub fn validate(&self) -> Result<(), RegistryError> {
        for platform in &self.platforms {
            for provider_type in platform.provider_types() {
                if !self.is_implemented(&provider_type) {
                    return Err(RegistryError::UnknownProvider {
                        platform: platform.spec.platform.clone(),
                        provider: provider_type,
                    });
                }
            }
        }
        Ok(())
    }

    /// Returns true when a provider implementation exists for the type.
    #[must_use]
    pub fn is_implemented(&self, provider_type: &ProviderId) -> bool {
        if self.providers.contains_key(provider_type) {
            return true;
        }
        let base = ProviderId::new(provider_type.base());
        self.parameterized.contains_key(&base)
    }

    /// Returns the platform listing the type (exact match, then base type).
    #[must_use]
    pub fn platform_of(&self, provider_type: &ProviderId) -> Option<&PlatformId> {
        self.owners
            .get(provider_type)
            .or_else(|| self.owners.get(&ProviderId::new(provider_type.base())))
    }

    /// Returns a registered platform.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownPlatform`] when the platform is unknown.
    pub fn platform(&self, platform: &PlatformId) -> Result<&RegisteredPlatform, RegistryError> {
        self.platform_index
            .get(platform)
            .and_then(|index| self.platforms.get(*index))
            .ok_or_else(|| RegistryError::UnknownPlatform(platform.clone()))
    }

    /// Returns registered platforms in registration order.
    #[must_use]
    pub fn platforms(&self) -> &[RegisteredPlatform] {
        &self.platforms
    }

    /// Groups requested types by owning platform.
    ///
    /// Platforms appear in registration order; types no platform lists land
    /// in a trailing `None` group. Order within a group follows the request.
    #[must_use]
    pub fn group_types_by_platform(
        &self,
        types: &[ProviderId],
    ) -> Vec<(Option<PlatformId>, Vec<ProviderId>)> {
        let mut by_platform: Vec<Vec<ProviderId>> = vec![Vec::new(); self.platforms.len()];
        let mut generic = Vec::new();
        for provider_type in types {
            let index = self
                .platform_of(provider_type)
                .and_then(|platform| self.platform_index.get(platform))
                .copied();
            match index.and_then(|index| by_platform.get_mut(index)) {
                Some(bucket) => bucket.push(provider_type.clone()),
                None => generic.push(provider_type.clone()),
            }
        }
        let mut grouped: Vec<(Option<PlatformId>, Vec<ProviderId>)> = self
            .platforms
            .iter()
            .zip(by_platform)
            .filter(|(_, bucket)| !bucket.is_empty())
            .map(|(platform, bucket)| (Some(platform.spec.platform.clone()), bucket))
            .collect();
        if !generic.is_empty() {
            grouped.push((None, generic));
        }
        grouped
    }

    /// Returns the configured policy.
    #[must_use]
    pub const fn policy(&self) -> &ProviderAccessPolicy {
        &self.policy
    }

    /// Returns the number of registered provider implementations.
    #[must_use]
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut providers: Vec<&str> = self.providers.keys().map(ProviderId::as_str).collect();
        providers.sort_unstable();
        f.debug_struct("ProviderRegistry")
            .field("platforms", &self.platforms.len())
            .field("providers", &providers)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
