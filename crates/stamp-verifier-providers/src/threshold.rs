// crates/stamp-verifier-providers/src/threshold.rs
// ============================================================================
// Module: Threshold Providers
// Description: Decimal metric comparisons parameterized by threshold.
// Purpose: Build one registry entry per threshold from a shared factory.
// Dependencies: stamp-verifier-core, async-trait, bigdecimal
// ============================================================================

//! ## Overview
//! A [`ThresholdProviderBuilder`] captures the attribute, error message, and
//! metric source shared by a family; [`ThresholdProviderBuilder::build`]
//! produces a [`ThresholdProvider`] typed `{attribute}#{threshold}`. The
//! metric is read once per request under the builder's context namespace,
//! and compared exactly with [`BigDecimal`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use stamp_verifier_core::Provider;
use stamp_verifier_core::ProviderContext;
use stamp_verifier_core::ProviderError;
use stamp_verifier_core::ProviderId;
use stamp_verifier_core::RequestPayload;
use stamp_verifier_core::VerifiedPayload;
use stamp_verifier_core::address_record;

use crate::upstream::BalanceLookup;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default context namespace holding the metric.
pub const BALANCE_NAMESPACE: &str = "balance:metric";

/// Default attribute of balance threshold stamps.
pub const DEFAULT_BALANCE_ATTRIBUTE: &str = "ethPossessionsGte";

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Factory for threshold providers sharing one metric source.
#[derive(Clone)]
pub struct ThresholdProviderBuilder {
    /// Record attribute and type prefix.
    attribute: String,
    /// Reason prefix for verdicts below the threshold.
    error_message: String,
    /// Context namespace holding the metric.
    namespace: String,
    /// Upstream metric lookup.
    lookup: Arc<dyn BalanceLookup>,
}

impl ThresholdProviderBuilder {
    /// Starts a family for `attribute` reading metrics from `lookup`.
    #[must_use]
    pub fn new(attribute: impl Into<String>, lookup: Arc<dyn BalanceLookup>) -> Self {
        let attribute = attribute.into();
        Self {
            error_message: format!("{attribute} threshold not met"),
            attribute,
            namespace: BALANCE_NAMESPACE.to_string(),
            lookup,
        }
    }

    /// Sets the reason prefix for verdicts below the threshold.
    #[must_use]
    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = message.into();
        self
    }

    /// Sets the context namespace holding the metric.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Builds the provider for one threshold.
    #[must_use]
    pub fn build(&self, threshold: BigDecimal) -> ThresholdProvider {
        ThresholdProvider {
            provider_type: ProviderId::new(format!("{}#{threshold}", self.attribute)),
            threshold,
            attribute: self.attribute.clone(),
            error_message: self.error_message.clone(),
            namespace: self.namespace.clone(),
            lookup: Arc::clone(&self.lookup),
        }
    }
}

// ============================================================================
// SECTION: Provider
// ============================================================================

/// Verifies that a decimal metric reaches a threshold.
pub struct ThresholdProvider {
    /// Registry key, `{attribute}#{threshold}`.
    provider_type: ProviderId,
    /// Minimum accepted metric value.
    threshold: BigDecimal,
    /// Record attribute.
    attribute: String,
    /// Reason prefix for verdicts below the threshold.
    error_message: String,
    /// Context namespace holding the metric.
    namespace: String,
    /// Upstream metric lookup.
    lookup: Arc<dyn BalanceLookup>,
}

impl ThresholdProvider {
    /// Returns the threshold of this provider.
    #[must_use]
    pub const fn threshold(&self) -> &BigDecimal {
        &self.threshold
    }

    /// Applies the threshold rule to an already fetched metric.
    #[must_use]
    pub fn evaluate(&self, address: &str, metric: &BigDecimal) -> VerifiedPayload {
        if *metric >= self.threshold {
            let mut record = address_record(address);
            record.insert(self.attribute.clone(), self.threshold.to_string());
            VerifiedPayload::valid(record)
        } else {
            VerifiedPayload::invalid(format!(
                "{}: {metric} is below {}",
                self.error_message, self.threshold
            ))
        }
    }
}

#[async_trait]
impl Provider for ThresholdProvider {
    fn provider_type(&self) -> &ProviderId {
        &self.provider_type
    }

    async fn verify(
        &self,
        payload: &RequestPayload,
        ctx: &ProviderContext,
    ) -> Result<VerifiedPayload, ProviderError> {
        let lookup = self.lookup.as_ref();
        let address = payload.address.as_str();
        let metric = ctx
            .get_or_compute(&self.namespace, move || async move { lookup.balance(address).await })
            .await?;
        Ok(self.evaluate(address, &metric))
    }
}
