// crates/stamp-verifier-core/src/runtime/audit.rs
// ============================================================================
// Module: Verification Audit Logging
// Description: Structured audit events for provider verification and scans.
// Purpose: Emit redacted JSON-line audit records without a global logger.
// Dependencies: crate::core, serde, serde_json
// ============================================================================

//! ## Overview
//! The dispatcher records one [`VerificationAuditEvent`] per requested
//! provider type and the aggregator one [`ScanAuditEvent`] per address-wide
//! scan. Events carry identifiers, outcome labels, and timings only: the
//! address and proofs are never part of an event. Sinks route events to
//! stderr, an append-only file, or nowhere.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::core::identifiers::PlatformId;
use crate::core::identifiers::ProviderId;
use crate::core::outcome::ProviderOutcome;
use crate::core::outcome::ProviderResult;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Audit event for one provider invocation.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Requested provider type.
    pub provider_type: ProviderId,
    /// Owning platform when the type is registered.
    pub platform: Option<PlatformId>,
    /// Outcome label: `valid`, `invalid`, or `failed`.
    pub outcome: &'static str,
    /// Failure kind label for failed outcomes.
    pub failure_kind: Option<&'static str>,
    /// Number of business-invalid reasons reported.
    pub error_count: usize,
    /// Wall-clock duration of the invocation in milliseconds.
    pub duration_ms: u128,
}

impl VerificationAuditEvent {
    /// Builds an event from a finished outcome.
    #[must_use]
    pub fn from_outcome(
        outcome: &ProviderOutcome,
        platform: Option<PlatformId>,
        duration_ms: u128,
    ) -> Self {
        let (label, failure_kind, error_count) = match &outcome.result {
            ProviderResult::Verified {
                payload,
            } => (if payload.valid { "valid" } else { "invalid" }, None, payload.errors.len()),
            ProviderResult::Failed {
                error,
            } => ("failed", Some(error.kind.as_str()), 0),
        };
        Self {
            event: "provider_verification",
            timestamp_ms: now_ms(),
            provider_type: outcome.provider_type.clone(),
            platform,
            outcome: label,
            failure_kind,
            error_count,
            duration_ms,
        }
    }
}

/// Audit event for one address-wide scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Address-based platforms considered.
    pub platforms_considered: usize,
    /// Providers actually invoked.
    pub providers_evaluated: usize,
    /// Platforms retained in the report.
    pub platforms_retained: usize,
    /// Providers that failed rather than producing a verdict.
    pub failures: usize,
    /// Wall-clock duration of the scan in milliseconds.
    pub duration_ms: u128,
}

impl ScanAuditEvent {
    /// Builds a scan event with a consistent timestamp.
    #[must_use]
    pub fn new(
        platforms_considered: usize,
        providers_evaluated: usize,
        platforms_retained: usize,
        failures: usize,
        duration_ms: u128,
    ) -> Self {
        Self {
            event: "address_scan",
            timestamp_ms: now_ms(),
            platforms_considered,
            providers_evaluated,
            platforms_retained,
            failures,
            duration_ms,
        }
    }
}

/// Returns the current time in milliseconds since the epoch.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for verification events.
pub trait AuditSink: Send + Sync {
    /// Record a provider verification event.
    fn record(&self, event: &VerificationAuditEvent);

    /// Record an address scan event.
    fn record_scan(&self, _event: &ScanAuditEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &VerificationAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }

    fn record_scan(&self, event: &ScanAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    pub(crate) file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends one serialized line.
    fn append(&self, payload: &str) {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writeln!(file, "{payload}");
        let _ = file.flush();
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &VerificationAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.append(&payload);
        }
    }

    fn record_scan(&self, event: &ScanAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.append(&payload);
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &VerificationAuditEvent) {}

    fn record_scan(&self, _event: &ScanAuditEvent) {}
}
