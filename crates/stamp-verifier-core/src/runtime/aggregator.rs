// crates/stamp-verifier-core/src/runtime/aggregator.rs
// ============================================================================
// Module: Group/Platform Aggregator
// Description: Targeted platform verification and address-wide scans.
// Purpose: Fold per-provider outcomes into group and platform validity.
// Dependencies: crate::{core, runtime}, serde
// ============================================================================

//! ## Overview
//! The aggregator runs the dispatcher and maps outcomes back onto the
//! platform -> group -> provider shape. Results are keyed by provider type,
//! never by position, so independent failures cannot shift verdicts between
//! providers.
//!
//! Group validity is the OR of its providers' verdicts; platform validity is
//! the OR of its groups. An address-wide scan evaluates every provider of
//! every address-based platform concurrently against one shared context and
//! keeps only platforms with at least one valid provider.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::collections::HashMap;
use std::time::Instant;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::PlatformId;
use crate::core::identifiers::ProviderId;
use crate::core::outcome::ProviderOutcome;
use crate::core::payload::Proofs;
use crate::core::payload::RequestPayload;
use crate::core::payload::is_evm_address;
use crate::runtime::audit::ScanAuditEvent;
use crate::runtime::context::ProviderContext;
use crate::runtime::dispatcher::Dispatcher;
use crate::runtime::dispatcher::EngineError;
use crate::runtime::registry::RegisteredPlatform;

// ============================================================================
// SECTION: Result Shapes
// ============================================================================

/// Outcome of one provider placed in its group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderVerification {
    /// Display title from the group spec.
    pub title: String,
    /// Provider outcome.
    pub outcome: ProviderOutcome,
}

impl ProviderVerification {
    /// Returns true when the provider produced a valid verdict.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.outcome.is_valid()
    }
}

/// Evaluated providers of one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupVerification {
    /// Group label.
    pub platform_group: String,
    /// Evaluated providers in group order.
    pub providers: Vec<ProviderVerification>,
}

impl GroupVerification {
    /// Returns true when any provider in the group is valid.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.providers.iter().any(ProviderVerification::is_valid)
    }
}

/// Evaluated groups of one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformVerification {
    /// Platform identifier.
    pub platform: PlatformId,
    /// Platform display name.
    pub name: String,
    /// Groups with at least one evaluated provider, in display order.
    pub groups: Vec<GroupVerification>,
    /// Requested outcomes that no group of the platform lists.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unmatched: Vec<ProviderOutcome>,
}

impl PlatformVerification {
    /// Returns true when any group of the platform is valid.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.groups.iter().any(GroupVerification::is_valid)
    }

    /// Returns the valid providers only, or `None` when nothing is valid.
    #[must_use]
    pub fn actionable(&self) -> Option<Self> {
        let groups: Vec<GroupVerification> = self
            .groups
            .iter()
            .filter_map(|group| {
                let providers: Vec<ProviderVerification> = group
                    .providers
                    .iter()
                    .filter(|provider| provider.is_valid())
                    .cloned()
                    .collect();
                (!providers.is_empty()).then(|| GroupVerification {
                    platform_group: group.platform_group.clone(),
                    providers,
                })
            })
            .collect();
        (!groups.is_empty()).then(|| Self {
            platform: self.platform.clone(),
            name: self.name.clone(),
            groups,
            unmatched: Vec::new(),
        })
    }

    /// Returns every outcome of the platform, grouped ones first.
    pub fn outcomes(&self) -> impl Iterator<Item = &ProviderOutcome> {
        self.groups
            .iter()
            .flat_map(|group| group.providers.iter().map(|provider| &provider.outcome))
            .chain(self.unmatched.iter())
    }
}

// ============================================================================
// SECTION: Scan Request/Report
// ============================================================================

/// Input of an address-wide scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    /// Address to scan.
    pub address: String,
    /// Opaque proofs forwarded to every provider.
    #[serde(default)]
    pub proofs: Proofs,
    /// Optional RPC endpoint override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<String>,
    /// Provider types the address already holds.
    #[serde(default)]
    pub held: BTreeSet<ProviderId>,
    /// Re-evaluate held providers too.
    #[serde(default)]
    pub reissue: bool,
}

impl ScanRequest {
    /// Creates a scan request for an address.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    /// Returns a copy marking the given types as already held.
    #[must_use]
    pub fn with_held(mut self, held: impl IntoIterator<Item = ProviderId>) -> Self {
        self.held.extend(held);
        self
    }

    /// Returns a copy with `reissue` set.
    #[must_use]
    pub const fn with_reissue(mut self, reissue: bool) -> Self {
        self.reissue = reissue;
        self
    }

    /// Returns true when the type should be evaluated.
    fn wants(&self, provider_type: &ProviderId) -> bool {
        self.reissue || !self.held.contains(provider_type)
    }
}

/// Output of an address-wide scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Normalized address that was scanned.
    pub address: String,
    /// Platforms with at least one valid provider, trimmed to valid entries.
    pub platforms: Vec<PlatformVerification>,
    /// Providers that failed rather than producing a verdict.
    pub failures: Vec<ProviderOutcome>,
    /// Number of providers evaluated.
    pub evaluated: usize,
}

// ============================================================================
// SECTION: Aggregator
// ============================================================================

/// Group/platform aggregator over a dispatcher.
#[derive(Clone)]
pub struct Aggregator {
    /// Dispatcher running the providers.
    dispatcher: Dispatcher,
}

impl Aggregator {
    /// Creates an aggregator.
    #[must_use]
    pub const fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
        }
    }

    /// Returns the underlying dispatcher.
    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Verifies a caller-selected subset of one platform's providers.
    ///
    /// Only `types` are evaluated; results are placed in the platform's
    /// groups, and types the platform does not list are kept as unmatched.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the platform is unknown or the request is
    /// corrupted.
    pub async fn verify_platform(
        &self,
        platform: &PlatformId,
        types: &[ProviderId],
        payload: &RequestPayload,
        ctx: &ProviderContext,
    ) -> Result<PlatformVerification, EngineError> {
        let registered = self.dispatcher.registry().platform(platform)?;
        let outcomes = self.dispatcher.dispatch(types, payload, ctx).await?;
        Ok(fold_platform(registered, outcomes))
    }

    /// Scans every address-based platform for providers the address satisfies.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidRequest`] when the address is not an EVM
    /// address.
    pub async fn scan(&self, request: &ScanRequest) -> Result<ScanReport, EngineError> {
        if !is_evm_address(&request.address) {
            return Err(EngineError::InvalidRequest("Invalid address".to_string()));
        }
        let started = Instant::now();
        let registry = self.dispatcher.registry();
        let platforms: Vec<&RegisteredPlatform> = registry
            .platforms()
            .iter()
            .filter(|platform| platform.spec.is_address_based())
            .collect();

        let mut seen = BTreeSet::new();
        let types: Vec<ProviderId> = platforms
            .iter()
            .flat_map(|platform| platform.provider_types())
            .filter(|provider_type| request.wants(provider_type))
            .filter(|provider_type| seen.insert(provider_type.clone()))
            .collect();

        let Some(first) = types.first() else {
            let report = ScanReport {
                address: request.address.trim().to_ascii_lowercase(),
                platforms: Vec::new(),
                failures: Vec::new(),
                evaluated: 0,
            };
            self.record_scan(platforms.len(), &report, started);
            return Ok(report);
        };

        let mut payload = RequestPayload::new(first.clone(), request.address.as_str())
            .with_types(types.clone())
            .normalized()
            .map_err(|error| EngineError::InvalidRequest(error.to_string()))?;
        payload.proofs.clone_from(&request.proofs);
        payload.rpc_url.clone_from(&request.rpc_url);
        let ctx = ProviderContext::new(&payload.address);
        let outcomes = self.dispatcher.dispatch(&types, &payload, &ctx).await?;

        let failures: Vec<ProviderOutcome> =
            outcomes.iter().filter(|outcome| outcome.failure().is_some()).cloned().collect();
        let evaluated = outcomes.len();
        let mut by_type: HashMap<ProviderId, ProviderOutcome> = outcomes
            .into_iter()
            .map(|outcome| (outcome.provider_type.clone(), outcome))
            .collect();

        let retained = platforms
            .iter()
            .filter_map(|platform| {
                let owned: Vec<ProviderOutcome> = platform
                    .provider_types()
                    .iter()
                    .filter_map(|provider_type| by_type.remove(provider_type))
                    .collect();
                fold_platform(platform, owned).actionable()
            })
            .collect();

        let report = ScanReport {
            address: payload.address,
            platforms: retained,
            failures,
            evaluated,
        };
        self.record_scan(platforms.len(), &report, started);
        Ok(report)
    }

    /// Emits the scan audit event.
    fn record_scan(&self, considered: usize, report: &ScanReport, started: Instant) {
        self.dispatcher.audit().record_scan(&ScanAuditEvent::new(
            considered,
            report.evaluated,
            report.platforms.len(),
            report.failures.len(),
            started.elapsed().as_millis(),
        ));
    }
}

// ============================================================================
// SECTION: Folding
// ============================================================================

/// Places outcomes into the platform's groups by provider type.
///
/// A parameterized request (`Base#x`) lands on the group entry listing
/// `Base`; outcomes no entry claims are kept as unmatched.
fn fold_platform(
    platform: &RegisteredPlatform,
    outcomes: Vec<ProviderOutcome>,
) -> PlatformVerification {
    let mut remaining: Vec<Option<ProviderOutcome>> = outcomes.into_iter().map(Some).collect();
    let mut groups = Vec::new();
    for group in &platform.groups {
        let mut providers = Vec::new();
        for spec in &group.providers {
            for slot in &mut remaining {
                let claimed =
                    slot.as_ref().is_some_and(|outcome| lists(&spec.name, &outcome.provider_type));
                if claimed && let Some(outcome) = slot.take() {
                    providers.push(ProviderVerification {
                        title: spec.title.clone(),
                        outcome,
                    });
                }
            }
        }
        if !providers.is_empty() {
            groups.push(GroupVerification {
                platform_group: group.platform_group.clone(),
                providers,
            });
        }
    }
    PlatformVerification {
        platform: platform.spec.platform.clone(),
        name: platform.spec.name.clone(),
        groups,
        unmatched: remaining.into_iter().flatten().collect(),
    }
}

/// Returns true when a group entry covers the requested type.
fn lists(entry: &ProviderId, requested: &ProviderId) -> bool {
    requested == entry || (!requested.params().is_empty() && requested.base() == entry.as_str())
}
