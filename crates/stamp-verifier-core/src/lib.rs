// crates/stamp-verifier-core/src/lib.rs
// ============================================================================
// Module: Stamp Verifier Core Library
// Description: Public API surface for the provider verification engine.
// Purpose: Expose core types, the provider contract, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Stamp Verifier core evaluates identity providers for an address and
//! aggregates their verdicts into group and platform validity. It defines the
//! pluggable [`Provider`] contract, the request-scoped [`ProviderContext`]
//! cache shared by providers invoked together, the [`ProviderRegistry`], the
//! concurrent [`Dispatcher`], and the [`Aggregator`]. It performs no network
//! I/O itself; upstream access lives in provider implementations.
//!
//! Invariants:
//! - Exactly one provider is registered per provider type.
//! - Business-invalid verdicts are values; external failures are errors.
//! - One failing provider never prevents the rest of a batch from reporting.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::Provider;
pub use interfaces::ProviderError;
pub use runtime::Aggregator;
pub use runtime::AuditSink;
pub use runtime::CachePolicy;
pub use runtime::Dispatcher;
pub use runtime::EngineError;
pub use runtime::FileAuditSink;
pub use runtime::GroupVerification;
pub use runtime::IssuanceItem;
pub use runtime::NoopAuditSink;
pub use runtime::PlatformVerification;
pub use runtime::ProviderAccessPolicy;
pub use runtime::ProviderContext;
pub use runtime::ProviderRegistry;
pub use runtime::ProviderVerification;
pub use runtime::RegisteredPlatform;
pub use runtime::RegistryError;
pub use runtime::ResolveError;
pub use runtime::ResolvedProvider;
pub use runtime::ScanAuditEvent;
pub use runtime::ScanReport;
pub use runtime::ScanRequest;
pub use runtime::StampDiff;
pub use runtime::StderrAuditSink;
pub use runtime::VerificationAuditEvent;
pub use runtime::issuance_items;
