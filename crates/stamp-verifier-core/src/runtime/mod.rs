// crates/stamp-verifier-core/src/runtime/mod.rs
// ============================================================================
// Module: Stamp Verifier Runtime
// Description: Context cache, registry, dispatcher, and aggregator.
// Purpose: Execute providers for a request and reduce their outcomes.
// Dependencies: crate::{core, interfaces}, tokio
// ============================================================================

//! ## Overview
//! The runtime wires the provider contract into a request: a
//! [`ProviderContext`] scopes shared upstream reads, the [`ProviderRegistry`]
//! resolves types, the [`Dispatcher`] runs them with settle-all semantics,
//! and the [`Aggregator`] folds outcomes into platforms.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod aggregator;
pub mod audit;
pub mod context;
pub mod dispatcher;
pub mod issuance;
pub mod reconcile;
pub mod registry;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use aggregator::Aggregator;
pub use aggregator::GroupVerification;
pub use aggregator::PlatformVerification;
pub use aggregator::ProviderVerification;
pub use aggregator::ScanReport;
pub use aggregator::ScanRequest;
pub use audit::AuditSink;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::ScanAuditEvent;
pub use audit::StderrAuditSink;
pub use audit::VerificationAuditEvent;
pub use context::CachePolicy;
pub use context::ProviderContext;
pub use dispatcher::Dispatcher;
pub use dispatcher::EngineError;
pub use issuance::IssuanceItem;
pub use issuance::issuance_items;
pub use reconcile::StampDiff;
pub use registry::ProviderAccessPolicy;
pub use registry::ProviderRegistry;
pub use registry::RegisteredPlatform;
pub use registry::RegistryError;
pub use registry::ResolveError;
pub use registry::ResolvedProvider;
