// crates/stamp-verifier-core/src/core/mod.rs
// ============================================================================
// Module: Stamp Verifier Core Types
// Description: Identifiers, payloads, specs, and outcomes.
// Purpose: Group the serializable data model of the verification engine.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Core types are plain data: no I/O and no shared state. The runtime module
//! builds on them to resolve, run, and aggregate providers.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod identifiers;
pub mod outcome;
pub mod payload;
pub mod spec;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use identifiers::*;
pub use outcome::*;
pub use payload::*;
pub use spec::*;
