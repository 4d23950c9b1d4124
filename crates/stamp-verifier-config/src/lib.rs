// crates/stamp-verifier-config/src/lib.rs
// ============================================================================
// Module: Stamp Verifier Config Library
// Description: Canonical config model, validation, and example generation.
// Purpose: Single source of truth for stamp-verifier.toml semantics.
// Dependencies: stamp-verifier-core, stamp-verifier-providers, serde, toml
// ============================================================================

//! ## Overview
//! `stamp-verifier-config` defines the canonical configuration model for the
//! verification engine. It provides strict, fail-closed validation and turns
//! a validated file into the registry inputs the runtime needs: built-in
//! platform settings, the provider access policy, and the audit sink.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
