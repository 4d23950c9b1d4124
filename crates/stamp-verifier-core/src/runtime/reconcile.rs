// crates/stamp-verifier-core/src/runtime/reconcile.rs
// ============================================================================
// Module: Stamp Reconciliation
// Description: Set difference between held and freshly verified stamps.
// Purpose: Tell the caller which credentials to add and which to remove.
// Dependencies: crate::core, serde
// ============================================================================

//! ## Overview
//! Reconciliation is a pure function of two provider-type sets: `added` is
//! fresh minus previous, `removed` is previous minus fresh.

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ProviderId;
use crate::core::outcome::ProviderOutcome;

/// Credentials to add and remove after a verification pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampDiff {
    /// Types verified now but not held before.
    pub added: BTreeSet<ProviderId>,
    /// Types held before but not verified now.
    pub removed: BTreeSet<ProviderId>,
}

impl StampDiff {
    /// Computes the diff between previously held and freshly verified types.
    #[must_use]
    pub fn between(previous: &BTreeSet<ProviderId>, fresh: &BTreeSet<ProviderId>) -> Self {
        Self {
            added: fresh.difference(previous).cloned().collect(),
            removed: previous.difference(fresh).cloned().collect(),
        }
    }

    /// Computes the diff against the valid types of a batch of outcomes.
    #[must_use]
    pub fn from_outcomes(previous: &BTreeSet<ProviderId>, outcomes: &[ProviderOutcome]) -> Self {
        let fresh = outcomes
            .iter()
            .filter(|outcome| outcome.is_valid())
            .map(|outcome| outcome.provider_type.clone())
            .collect();
        Self::between(previous, &fresh)
    }

    /// Returns true when nothing changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}
