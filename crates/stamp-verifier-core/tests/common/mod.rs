// crates/stamp-verifier-core/tests/common/mod.rs
// ============================================================================
// Module: Core Test Fixtures
// Description: Scripted providers and recording sinks for runtime tests.
// Purpose: Share deterministic fixtures across integration test binaries.
// Dependencies: stamp-verifier-core, async-trait, tokio
// ============================================================================

//! Shared fixtures for core integration tests.

#![allow(
    dead_code,
    clippy::missing_docs_in_private_items,
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Fixtures are shared across test binaries that use different subsets."
)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use stamp_verifier_core::AuditSink;
use stamp_verifier_core::PlatformAuth;
use stamp_verifier_core::PlatformGroupSpec;
use stamp_verifier_core::PlatformSpec;
use stamp_verifier_core::Provider;
use stamp_verifier_core::ProviderContext;
use stamp_verifier_core::ProviderError;
use stamp_verifier_core::ProviderId;
use stamp_verifier_core::ProviderSpec;
use stamp_verifier_core::RequestPayload;
use stamp_verifier_core::ScanAuditEvent;
use stamp_verifier_core::VerificationAuditEvent;
use stamp_verifier_core::VerifiedPayload;
use stamp_verifier_core::address_record;

/// Address used by most tests.
pub const ADDRESS: &str = "0x00000000000000000000000000000000000000aa";

// ============================================================================
// SECTION: Scripted Providers
// ============================================================================

/// What a scripted provider does when invoked.
#[derive(Clone)]
pub enum Script {
    /// Return a valid verdict with the address record.
    Valid,
    /// Return an invalid verdict with the reason.
    Invalid(&'static str),
    /// Raise an external failure.
    Fail(&'static str),
    /// Panic inside the provider task.
    Panic,
}

/// Provider returning a scripted verdict after an optional delay.
pub struct ScriptedProvider {
    provider_type: ProviderId,
    script: Script,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    pub fn new(provider_type: &str, script: Script) -> Self {
        Self {
            provider_type: ProviderId::new(provider_type),
            script,
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn provider_type(&self) -> &ProviderId {
        &self.provider_type
    }

    async fn verify(
        &self,
        payload: &RequestPayload,
        _ctx: &ProviderContext,
    ) -> Result<VerifiedPayload, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.script {
            Script::Valid => Ok(VerifiedPayload::valid(address_record(&payload.address))),
            Script::Invalid(reason) => Ok(VerifiedPayload::invalid(*reason)),
            Script::Fail(message) => Err(ProviderError::external(*message)),
            Script::Panic => panic!("scripted provider panic"),
        }
    }
}

/// Provider echoing one proof entry into its record.
pub struct ProofEchoProvider {
    provider_type: ProviderId,
    keys: Vec<&'static str>,
}

impl ProofEchoProvider {
    pub fn new(provider_type: &str, keys: &[&'static str]) -> Self {
        Self {
            provider_type: ProviderId::new(provider_type),
            keys: keys.to_vec(),
        }
    }
}

#[async_trait]
impl Provider for ProofEchoProvider {
    fn provider_type(&self) -> &ProviderId {
        &self.provider_type
    }

    async fn verify(
        &self,
        payload: &RequestPayload,
        _ctx: &ProviderContext,
    ) -> Result<VerifiedPayload, ProviderError> {
        let mut record = address_record(&payload.address);
        for key in &self.keys {
            let Some(value) = payload.proofs.get(*key) else {
                return Ok(VerifiedPayload::invalid(format!("missing proof {key}")));
            };
            record.insert((*key).to_string(), value.clone());
        }
        Ok(VerifiedPayload::valid(record))
    }
}

/// Provider reading a shared namespace and comparing it with a threshold.
pub struct SharedReadProvider {
    provider_type: ProviderId,
    namespace: &'static str,
    threshold: u64,
    upstream_calls: Arc<AtomicUsize>,
    upstream_value: Option<u64>,
}

impl SharedReadProvider {
    pub fn new(
        provider_type: &str,
        namespace: &'static str,
        threshold: u64,
        upstream_calls: Arc<AtomicUsize>,
        upstream_value: Option<u64>,
    ) -> Self {
        Self {
            provider_type: ProviderId::new(provider_type),
            namespace,
            threshold,
            upstream_calls,
            upstream_value,
        }
    }
}

#[async_trait]
impl Provider for SharedReadProvider {
    fn provider_type(&self) -> &ProviderId {
        &self.provider_type
    }

    async fn verify(
        &self,
        payload: &RequestPayload,
        ctx: &ProviderContext,
    ) -> Result<VerifiedPayload, ProviderError> {
        let calls = Arc::clone(&self.upstream_calls);
        let value = self.upstream_value;
        let metric = ctx
            .get_or_compute(self.namespace, || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                value.ok_or_else(|| ProviderError::external("upstream unavailable"))
            })
            .await?;
        if *metric >= self.threshold {
            Ok(VerifiedPayload::valid(address_record(&payload.address)))
        } else {
            Ok(VerifiedPayload::invalid(format!("metric below {}", self.threshold)))
        }
    }
}

// ============================================================================
// SECTION: Registry Helpers
// ============================================================================

/// Builds a platform spec with one group per `(label, types)` entry.
pub fn platform(
    id: &str,
    auth: PlatformAuth,
    groups: &[(&str, &[&str])],
) -> (PlatformSpec, Vec<PlatformGroupSpec>) {
    let spec = PlatformSpec::new(id, id, format!("{id} platform"), auth);
    let groups = groups
        .iter()
        .map(|(label, types)| {
            PlatformGroupSpec::new(
                *label,
                types
                    .iter()
                    .map(|name| ProviderSpec::new(*name, format!("{name} title")))
                    .collect(),
            )
        })
        .collect();
    (spec, groups)
}

// ============================================================================
// SECTION: Audit
// ============================================================================

/// Audit sink keeping events in memory.
#[derive(Default)]
pub struct RecordingAuditSink {
    pub events: Mutex<Vec<VerificationAuditEvent>>,
    pub scans: Mutex<Vec<ScanAuditEvent>>,
}

impl AuditSink for RecordingAuditSink {
    fn record(&self, event: &VerificationAuditEvent) {
        self.events.lock().unwrap().push(event.clone());
    }

    fn record_scan(&self, event: &ScanAuditEvent) {
        self.scans.lock().unwrap().push(event.clone());
    }
}
