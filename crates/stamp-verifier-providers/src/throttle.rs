// crates/stamp-verifier-providers/src/throttle.rs
// ============================================================================
// Module: Upstream Throttle
// Description: Minimum spacing between sequential upstream calls.
// Purpose: Keep rate-limited collaborators from rejecting bursts within a request.
// Dependencies: tokio
// ============================================================================

//! ## Overview
//! [`UpstreamThrottle`] spaces calls to one rate-limited collaborator. The
//! first call passes immediately; every later call waits until `spacing` has
//! elapsed since the previous one. Callers are serialized while waiting so
//! concurrent providers sharing a throttle still observe the spacing. A
//! throttle lives in the request's provider context, so spacing never leaks
//! across requests.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

// ============================================================================
// SECTION: Throttle
// ============================================================================

/// Enforces a minimum delay between consecutive upstream calls.
#[derive(Debug)]
pub struct UpstreamThrottle {
    /// Minimum spacing between calls.
    spacing: Duration,
    /// Start time of the previous call, if any.
    last: Mutex<Option<Instant>>,
}

impl UpstreamThrottle {
    /// Creates a throttle with the given minimum spacing.
    #[must_use]
    pub fn new(spacing: Duration) -> Self {
        Self {
            spacing,
            last: Mutex::new(None),
        }
    }

    /// Returns the configured spacing.
    #[must_use]
    pub const fn spacing(&self) -> Duration {
        self.spacing
    }

    /// Waits until the next call may start and marks it as started.
    pub async fn wait(&self) {
        let mut last = self.last.lock().await;
        if let Some(previous) = *last {
            tokio::time::sleep_until(previous + self.spacing).await;
        }
        *last = Some(Instant::now());
    }
}
