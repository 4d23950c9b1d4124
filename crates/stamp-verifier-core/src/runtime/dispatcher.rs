// crates/stamp-verifier-core/src/runtime/dispatcher.rs
// ============================================================================
// Module: Verification Dispatcher
// Description: Concurrent, settle-all invocation of requested providers.
// Purpose: Run providers for one payload and capture every outcome per item.
// Dependencies: crate::{core, interfaces, runtime}, thiserror, tokio
// ============================================================================

//! ## Overview
//! The dispatcher resolves each requested type through the registry, spawns
//! every resolved provider onto a [`JoinSet`] with a clone of the shared
//! [`ProviderContext`], and waits for all of them. Unknown, blocked, failing,
//! and panicking providers each become a per-item failure; none of them stop
//! the rest of the batch. Outcomes are returned in request order regardless of
//! completion order.
//!
//! Only a corrupted request (no address, or a context bound to another
//! address) fails the whole batch.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::task::JoinSet;

use crate::core::identifiers::PlatformId;
use crate::core::identifiers::ProviderId;
use crate::core::outcome::FailureKind;
use crate::core::outcome::MISSING_PROVIDER_MESSAGE;
use crate::core::outcome::ProviderOutcome;
use crate::core::outcome::UNEXPECTED_ERROR_MESSAGE;
use crate::core::payload::RequestPayload;
use crate::interfaces::ProviderError;
use crate::runtime::audit::AuditSink;
use crate::runtime::audit::NoopAuditSink;
use crate::runtime::audit::VerificationAuditEvent;
use crate::runtime::context::ProviderContext;
use crate::runtime::registry::ProviderRegistry;
use crate::runtime::registry::RegistryError;
use crate::runtime::registry::ResolveError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Whole-batch failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The request cannot be evaluated at all.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// The context is bound to a different address than the payload.
    #[error("provider context is bound to a different address")]
    ContextMismatch,
    /// The targeted platform is not registered.
    #[error("platform not registered: {0}")]
    UnknownPlatform(PlatformId),
}

impl From<RegistryError> for EngineError {
    fn from(error: RegistryError) -> Self {
        match error {
            RegistryError::UnknownPlatform(platform) => Self::UnknownPlatform(platform),
            other => Self::InvalidRequest(other.to_string()),
        }
    }
}

// ============================================================================
// SECTION: Dispatcher
// ============================================================================

/// Per-task bookkeeping kept outside the spawned future.
struct PendingItem {
    /// Position in the request.
    index: usize,
    /// Requested type.
    provider_type: ProviderId,
    /// Owning platform.
    platform: Option<PlatformId>,
}

/// Concurrent provider dispatcher.
///
/// # Invariants
/// - Exactly one outcome is returned per requested type, in request order.
/// - All invocations of one call share the caller's context.
#[derive(Clone)]
pub struct Dispatcher {
    /// Registry used for resolution.
    registry: Arc<ProviderRegistry>,
    /// Audit sink receiving one event per item.
    audit: Arc<dyn AuditSink>,
}

impl Dispatcher {
    /// Creates a dispatcher with a no-op audit sink.
    #[must_use]
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            audit: Arc::new(NoopAuditSink),
        }
    }

    /// Returns a copy recording audit events to `audit`.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Returns the registry used for resolution.
    #[must_use]
    pub const fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Returns the audit sink.
    #[must_use]
    pub const fn audit(&self) -> &Arc<dyn AuditSink> {
        &self.audit
    }

    /// Verifies the payload's requested types with a fresh context.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidRequest`] when the payload has no address.
    pub async fn verify(
        &self,
        payload: &RequestPayload,
    ) -> Result<Vec<ProviderOutcome>, EngineError> {
        let payload = normalize(payload)?;
        let ctx = ProviderContext::new(&payload.address);
        self.dispatch(&payload.requested_types(), &payload, &ctx).await
    }

    /// Runs every requested type concurrently against one shared context.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the payload has no address or the context
    /// is bound to another address. Per-provider failures never error here.
    pub async fn dispatch(
        &self,
        types: &[ProviderId],
        payload: &RequestPayload,
        ctx: &ProviderContext,
    ) -> Result<Vec<ProviderOutcome>, EngineError> {
        let payload = normalize(payload)?;
        if ctx.address() != payload.address {
            return Err(EngineError::ContextMismatch);
        }

        let mut outcomes: Vec<Option<ProviderOutcome>> = vec![None; types.len()];
        let mut pending = HashMap::new();
        let mut tasks = JoinSet::new();
        let started = Instant::now();

        for (index, provider_type) in types.iter().enumerate() {
            let resolved = match self.registry.resolve(provider_type) {
                Ok(resolved) => resolved,
                Err(error) => {
                    let outcome = resolve_failure(provider_type, &error);
                    let platform = self.registry.platform_of(provider_type).cloned();
                    self.audit.record(&VerificationAuditEvent::from_outcome(&outcome, platform, 0));
                    if let Some(slot) = outcomes.get_mut(index) {
                        *slot = Some(outcome);
                    }
                    continue;
                }
            };
            let provider_payload = resolved.payload_for(&payload);
            let provider = Arc::clone(&resolved.provider);
            let task_ctx = ctx.clone();
            let handle = tasks.spawn(async move {
                let begun = Instant::now();
                let result = provider.verify(&provider_payload, &task_ctx).await;
                (result, begun.elapsed().as_millis())
            });
            pending.insert(handle.id(), PendingItem {
                index,
                provider_type: resolved.requested,
                platform: resolved.platform,
            });
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            let (id, settled) = match joined {
                Ok((id, (result, elapsed_ms))) => (id, Ok((result, elapsed_ms))),
                Err(error) => (error.id(), Err(())),
            };
            let Some(item) = pending.remove(&id) else {
                continue;
            };
            let (outcome, elapsed_ms) = match settled {
                Ok((Ok(verified), elapsed_ms)) => {
                    (ProviderOutcome::verified(item.provider_type, verified), elapsed_ms)
                }
                Ok((Err(error), elapsed_ms)) => {
                    (provider_failure(item.provider_type, &error), elapsed_ms)
                }
                Err(()) => (
                    ProviderOutcome::failed(
                        item.provider_type,
                        FailureKind::Unexpected,
                        UNEXPECTED_ERROR_MESSAGE,
                    ),
                    started.elapsed().as_millis(),
                ),
            };
            self.audit.record(&VerificationAuditEvent::from_outcome(
                &outcome,
                item.platform,
                elapsed_ms,
            ));
            if let Some(slot) = outcomes.get_mut(item.index) {
                *slot = Some(outcome);
            }
        }

        Ok(outcomes
            .into_iter()
            .zip(types)
            .map(|(outcome, provider_type)| {
                outcome.unwrap_or_else(|| {
                    ProviderOutcome::failed(
                        provider_type.clone(),
                        FailureKind::Unexpected,
                        UNEXPECTED_ERROR_MESSAGE,
                    )
                })
            })
            .collect())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Normalizes the payload address or fails the batch.
fn normalize(payload: &RequestPayload) -> Result<RequestPayload, EngineError> {
    payload.normalized().map_err(|error| EngineError::InvalidRequest(error.to_string()))
}

/// Maps a resolution failure onto a per-item outcome.
fn resolve_failure(provider_type: &ProviderId, error: &ResolveError) -> ProviderOutcome {
    let (kind, message) = match error {
        ResolveError::UnknownProvider(_) | ResolveError::ParameterMismatch { .. } => {
            (FailureKind::UnknownProvider, format!("{MISSING_PROVIDER_MESSAGE}: {error}"))
        }
        ResolveError::Blocked(_) => (FailureKind::Blocked, error.to_string()),
    };
    ProviderOutcome::failed(provider_type.clone(), kind, message)
}

/// Maps a provider error onto a per-item outcome.
fn provider_failure(provider_type: ProviderId, error: &ProviderError) -> ProviderOutcome {
    ProviderOutcome::failed(provider_type, FailureKind::External, error.to_string())
}
