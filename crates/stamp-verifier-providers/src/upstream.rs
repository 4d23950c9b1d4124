// crates/stamp-verifier-providers/src/upstream.rs
// ============================================================================
// Module: Upstream Collaborators
// Description: Lookup seams for address-based provider families.
// Purpose: Decouple provider rules from the upstream services they query.
// Dependencies: stamp-verifier-core, async-trait, bigdecimal, reqwest, serde
// ============================================================================

//! ## Overview
//! Each address-based provider family reads one fact about an address from
//! an upstream collaborator. The lookups are traits so the verification
//! rules can be exercised against in-memory fakes; [`RestUpstream`] is the
//! production implementation backed by [`UpstreamHttpClient`].
//!
//! Wire shapes:
//! - `GET {base}/registrations/{address}` -> `{"registered": bool}`
//! - `GET {base}/lists/{list}/addresses/{address}` -> `{"on_list": bool}`
//! - `GET {base}/profiles/{address}` -> `{"handle": string | null}`
//! - `GET {base}/balances/{address}` -> `{"balance": "<decimal>"}`

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use reqwest::Url;
use serde::Deserialize;
use stamp_verifier_core::ProviderError;

use crate::http::UpstreamHttpClient;
use crate::http::endpoint;

// ============================================================================
// SECTION: Lookup Traits
// ============================================================================

/// Reads whether an address is registered as a unique human.
#[async_trait]
pub trait RegistrationLookup: Send + Sync {
    /// Returns true when the address is registered.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the upstream cannot answer.
    async fn is_registered(&self, address: &str) -> Result<bool, ProviderError>;
}

/// Reads membership of an address in a named allow list.
#[async_trait]
pub trait AllowListLookup: Send + Sync {
    /// Returns true when the address is on the list.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the upstream cannot answer.
    async fn is_listed(&self, list: &str, address: &str) -> Result<bool, ProviderError>;
}

/// Reads the primary profile handle owned by an address.
#[async_trait]
pub trait HandleLookup: Send + Sync {
    /// Returns the primary handle, or `None` when the address has none.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the upstream cannot answer.
    async fn primary_handle(&self, address: &str) -> Result<Option<String>, ProviderError>;
}

/// Reads a decimal metric (balance, possessions) for an address.
#[async_trait]
pub trait BalanceLookup: Send + Sync {
    /// Returns the metric value.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the upstream cannot answer or the value
    /// is not a decimal.
    async fn balance(&self, address: &str) -> Result<BigDecimal, ProviderError>;
}

// ============================================================================
// SECTION: Wire Shapes
// ============================================================================

/// Registration lookup reply.
#[derive(Debug, Deserialize)]
struct RegistrationReply {
    /// Registration flag.
    registered: bool,
}

/// Allow-list lookup reply.
#[derive(Debug, Deserialize)]
struct ListReply {
    /// Membership flag.
    on_list: bool,
}

/// Profile lookup reply.
#[derive(Debug, Deserialize)]
struct HandleReply {
    /// Primary handle, when one exists.
    #[serde(default)]
    handle: Option<String>,
}

/// Balance lookup reply.
#[derive(Debug, Deserialize)]
struct BalanceReply {
    /// Decimal metric encoded as a string.
    balance: String,
}

// ============================================================================
// SECTION: REST Implementation
// ============================================================================

/// Upstream collaborator reached over JSON/HTTP under one base URL.
#[derive(Debug, Clone)]
pub struct RestUpstream {
    /// Shared bounded client.
    client: Arc<UpstreamHttpClient>,
    /// Base URL every lookup path is appended to.
    base: Url,
}

impl RestUpstream {
    /// Creates a collaborator rooted at `base`.
    #[must_use]
    pub const fn new(client: Arc<UpstreamHttpClient>, base: Url) -> Self {
        Self {
            client,
            base,
        }
    }

    /// Returns the base URL.
    #[must_use]
    pub const fn base(&self) -> &Url {
        &self.base
    }
}

#[async_trait]
impl RegistrationLookup for RestUpstream {
    async fn is_registered(&self, address: &str) -> Result<bool, ProviderError> {
        let url = endpoint(&self.base, &["registrations", address])?;
        let reply: RegistrationReply = self.client.get_json(&url, None).await?;
        Ok(reply.registered)
    }
}

#[async_trait]
impl AllowListLookup for RestUpstream {
    async fn is_listed(&self, list: &str, address: &str) -> Result<bool, ProviderError> {
        let url = endpoint(&self.base, &["lists", list, "addresses", address])?;
        let reply: ListReply = self.client.get_json(&url, None).await?;
        Ok(reply.on_list)
    }
}

#[async_trait]
impl HandleLookup for RestUpstream {
    async fn primary_handle(&self, address: &str) -> Result<Option<String>, ProviderError> {
        let url = endpoint(&self.base, &["profiles", address])?;
        let reply: HandleReply = self.client.get_json(&url, None).await?;
        Ok(reply.handle.filter(|handle| !handle.is_empty()))
    }
}

#[async_trait]
impl BalanceLookup for RestUpstream {
    async fn balance(&self, address: &str) -> Result<BigDecimal, ProviderError> {
        let url = endpoint(&self.base, &["balances", address])?;
        let reply: BalanceReply = self.client.get_json(&url, None).await?;
        BigDecimal::from_str(reply.balance.trim())
            .map_err(|_| ProviderError::external("upstream balance is not a decimal"))
    }
}
