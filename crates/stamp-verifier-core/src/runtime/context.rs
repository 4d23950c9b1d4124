// crates/stamp-verifier-core/src/runtime/context.rs
// ============================================================================
// Module: Provider Context Cache
// Description: Request-scoped, write-once-per-namespace memo store.
// Purpose: Deduplicate upstream reads shared by providers in one request.
// Dependencies: crate::{core, interfaces}, tokio
// ============================================================================

//! ## Overview
//! A [`ProviderContext`] is created for exactly one verification request and
//! one normalized address. Providers call [`ProviderContext::get_or_compute`]
//! with a namespace naming the upstream dependency they need. The first caller
//! installs a cell for that namespace before any await point; every other
//! caller, concurrent or later, waits on the same cell, so the compute future
//! runs at most once per namespace while it succeeds.
//!
//! Failure policy is explicit through [`CachePolicy`]: by default a failed
//! compute is memoized for the rest of the request so rate-limited upstreams
//! are not hammered by retries; [`CachePolicy::RetryFailures`] leaves the
//! namespace empty so a later reader recomputes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use tokio::sync::OnceCell;

use crate::core::payload::normalize_address;
use crate::interfaces::ProviderError;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Type-erased cached value.
type CachedValue = Arc<dyn Any + Send + Sync>;

/// Stored outcome of one namespace compute.
type CachedEntry = Result<CachedValue, ProviderError>;

/// Write-once slot for one namespace.
type Slot = Arc<OnceCell<CachedEntry>>;

/// How failed computes are retained within a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CachePolicy {
    /// A failed compute is replayed to every later reader of the namespace.
    #[default]
    MemoizeFailures,
    /// A failed compute leaves the namespace empty; the next reader retries.
    RetryFailures,
}

/// Shared state behind a context handle.
struct ContextInner {
    /// Normalized address the context is bound to.
    address: String,
    /// Failure retention policy.
    policy: CachePolicy,
    /// Namespace slots.
    slots: Mutex<HashMap<String, Slot>>,
}

// ============================================================================
// SECTION: Provider Context
// ============================================================================

/// Request-scoped cache shared by every provider invoked for one request.
///
/// # Invariants
/// - Bound to one normalized address for its whole lifetime.
/// - Each namespace is computed at most once while computes succeed.
/// - Clones share the same slots; nothing is shared across contexts.
#[derive(Clone)]
pub struct ProviderContext {
    /// Shared inner state.
    inner: Arc<ContextInner>,
}

impl ProviderContext {
    /// Creates a context for the given address with failure memoization.
    #[must_use]
    pub fn new(address: &str) -> Self {
        Self::with_policy(address, CachePolicy::default())
    }

    /// Creates a context for the given address and failure policy.
    #[must_use]
    pub fn with_policy(address: &str, policy: CachePolicy) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                address: normalize_address(address).unwrap_or_default(),
                policy,
                slots: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Returns the normalized address this context is bound to.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.inner.address
    }

    /// Returns the configured failure policy.
    #[must_use]
    pub fn policy(&self) -> CachePolicy {
        self.inner.policy
    }

    /// Returns true when the namespace holds a settled value or failure.
    #[must_use]
    pub fn contains(&self, namespace: &str) -> bool {
        self.lock_slots().get(namespace).is_some_and(|slot| slot.initialized())
    }

    /// Returns the number of namespaces with a settled value or failure.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock_slots().values().filter(|slot| slot.initialized()).count()
    }

    /// Returns true when no namespace has settled yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the cached value for `namespace`, computing it on first access.
    ///
    /// Concurrent first accesses share one in-flight compute. The compute is
    /// never awaited while the slot map is locked.
    ///
    /// # Errors
    ///
    /// Returns the compute's [`ProviderError`] (memoized or not per
    /// [`CachePolicy`]) or [`ProviderError::ContextTypeMismatch`] when the
    /// namespace already holds a value of another type.
    pub async fn get_or_compute<T, F, Fut>(
        &self,
        namespace: &str,
        compute: F,
    ) -> Result<Arc<T>, ProviderError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, ProviderError>> + Send,
    {
        let slot = self.slot(namespace);
        let entry = match self.inner.policy {
            CachePolicy::MemoizeFailures => {
                slot.get_or_init(|| async move { compute().await.map(erase) }).await
            }
            CachePolicy::RetryFailures => {
                slot.get_or_try_init(|| async move {
                    compute().await.map(|value| Ok(erase(value)))
                })
                .await?
            }
        };
        let value = entry.clone()?;
        value.downcast::<T>().map_err(|_| ProviderError::ContextTypeMismatch {
            namespace: namespace.to_string(),
        })
    }

    /// Returns the slot for a namespace, inserting an empty one if needed.
    fn slot(&self, namespace: &str) -> Slot {
        let mut slots = self.lock_slots();
        Arc::clone(slots.entry(namespace.to_string()).or_default())
    }

    /// Locks the slot map, recovering from poisoning.
    fn lock_slots(&self) -> std::sync::MutexGuard<'_, HashMap<String, Slot>> {
        self.inner.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ProviderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderContext")
            .field("policy", &self.inner.policy)
            .field("namespaces", &self.len())
            .finish_non_exhaustive()
    }
}

/// Erases a computed value for storage.
fn erase<T: Send + Sync + 'static>(value: T) -> CachedValue {
    Arc::new(value)
}
