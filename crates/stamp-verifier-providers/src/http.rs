// crates/stamp-verifier-providers/src/http.rs
// ============================================================================
// Module: Upstream HTTP Client
// Description: Bounded async HTTP client shared by built-in providers.
// Purpose: Issue JSON requests to upstream collaborators with strict limits.
// Dependencies: stamp-verifier-core, reqwest, serde, serde_json
// ============================================================================

//! ## Overview
//! Every built-in provider talks to its upstream collaborator through
//! [`UpstreamHttpClient`]. The client enforces scheme restrictions, rejects
//! URLs with embedded credentials, never follows redirects, and bounds the
//! response body before decoding it. Any transport failure, non-2xx status,
//! or malformed body surfaces as [`ProviderError::ExternalVerification`] so
//! the dispatcher can report it per item.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use reqwest::Client;
use reqwest::RequestBuilder;
use reqwest::Response;
use reqwest::Url;
use reqwest::header::ACCEPT;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use stamp_verifier_core::ProviderError;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Media type sent and accepted for upstream JSON exchanges.
const JSON_MEDIA_TYPE: &str = "application/json";

/// Configuration for the upstream HTTP client.
///
/// # Invariants
/// - `allow_http = false` blocks cleartext `http://` URLs.
/// - `max_response_bytes` is a hard upper bound on response bodies.
/// - `timeout_ms` applies to the full request lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UpstreamHttpConfig {
    /// Allow cleartext HTTP (disabled by default).
    pub allow_http: bool,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum response size allowed, in bytes.
    pub max_response_bytes: usize,
    /// User agent string for outbound requests.
    pub user_agent: String,
}

impl Default for UpstreamHttpConfig {
    fn default() -> Self {
        Self {
            allow_http: false,
            timeout_ms: 5_000,
            max_response_bytes: 1024 * 1024,
            user_agent: "stamp-verifier/0.1".to_string(),
        }
    }
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Async JSON client used by every built-in upstream collaborator.
///
/// # Invariants
/// - Redirects are not followed.
/// - Response bodies larger than the configured limit fail closed.
#[derive(Debug, Clone)]
pub struct UpstreamHttpClient {
    /// Client configuration, including limits and policy.
    config: UpstreamHttpConfig,
    /// Underlying connection-pooling client.
    client: Client,
}

impl UpstreamHttpClient {
    /// Creates a client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the HTTP client cannot be created.
    pub fn new(config: UpstreamHttpConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .redirect(Policy::none())
            .build()
            .map_err(|_| ProviderError::external("http client build failed"))?;
        Ok(Self {
            config,
            client,
        })
    }

    /// Returns the client configuration.
    #[must_use]
    pub const fn config(&self) -> &UpstreamHttpConfig {
        &self.config
    }

    /// Issues a GET request and decodes the JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the URL is rejected, the request fails,
    /// the status is not 2xx, or the body is oversized or malformed.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        bearer: Option<&str>,
    ) -> Result<T, ProviderError> {
        validate_url(url, &self.config)?;
        let mut request = self.client.get(url.clone()).header(ACCEPT, JSON_MEDIA_TYPE);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        self.send_json(url, request).await
    }

    /// Issues a POST request with a JSON body and decodes the JSON reply.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the URL is rejected, the request fails,
    /// the status is not 2xx, or the body is oversized or malformed.
    pub async fn post_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        body: &Value,
    ) -> Result<T, ProviderError> {
        validate_url(url, &self.config)?;
        let encoded = serde_json::to_vec(body)
            .map_err(|_| ProviderError::external("upstream request encoding failed"))?;
        let request = self
            .client
            .post(url.clone())
            .header(ACCEPT, JSON_MEDIA_TYPE)
            .header(CONTENT_TYPE, JSON_MEDIA_TYPE)
            .body(encoded);
        self.send_json(url, request).await
    }

    /// Sends a prepared request and decodes the bounded JSON reply.
    async fn send_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        request: RequestBuilder,
    ) -> Result<T, ProviderError> {
        let host = url.host_str().unwrap_or_default().to_string();
        let mut response = request
            .send()
            .await
            .map_err(|_| ProviderError::external(format!("upstream request to {host} failed")))?;
        let status = response.status();
        if status.is_redirection() {
            return Err(ProviderError::external("upstream redirect not allowed"));
        }
        if !status.is_success() {
            return Err(ProviderError::external(format!(
                "upstream {host} returned status {}",
                status.as_u16()
            )));
        }
        let body = read_response_limited(&mut response, self.config.max_response_bytes).await?;
        serde_json::from_slice(&body)
            .map_err(|_| ProviderError::external(format!("upstream {host} returned invalid json")))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Appends path segments to a base URL, percent-encoding each segment.
///
/// # Errors
///
/// Returns [`ProviderError`] when the base URL cannot carry a path.
pub fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, ProviderError> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| ProviderError::external("upstream base url cannot carry a path"))?;
        path.pop_if_empty().extend(segments);
    }
    Ok(url)
}

/// Parses a configured upstream base URL.
///
/// # Errors
///
/// Returns [`ProviderError`] when the URL is malformed.
pub fn parse_base_url(raw: &str) -> Result<Url, ProviderError> {
    Url::parse(raw).map_err(|_| ProviderError::external("invalid upstream base url"))
}

/// Validates URL scheme and credential policy.
fn validate_url(url: &Url, config: &UpstreamHttpConfig) -> Result<(), ProviderError> {
    match url.scheme() {
        "https" => {}
        "http" if config.allow_http => {}
        _ => return Err(ProviderError::external("unsupported url scheme")),
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(ProviderError::external("url credentials are not allowed"));
    }
    if url.host_str().is_none() {
        return Err(ProviderError::external("url host required"));
    }
    Ok(())
}

/// Reads the response body while enforcing a byte limit.
async fn read_response_limited(
    response: &mut Response,
    max_bytes: usize,
) -> Result<Vec<u8>, ProviderError> {
    let expected_len = response.content_length();
    let max_bytes_u64 = u64::try_from(max_bytes)
        .map_err(|_| ProviderError::external("response size limit exceeds u64"))?;
    if let Some(expected) = expected_len
        && expected > max_bytes_u64
    {
        return Err(ProviderError::external("upstream response exceeds size limit"));
    }
    let mut buf = Vec::new();
    while let Some(chunk) =
        response.chunk().await.map_err(|_| ProviderError::external("failed to read response"))?
    {
        if buf.len().saturating_add(chunk.len()) > max_bytes {
            return Err(ProviderError::external("upstream response exceeds size limit"));
        }
        buf.extend_from_slice(&chunk);
    }
    if let Some(expected) = expected_len {
        let expected = usize::try_from(expected)
            .map_err(|_| ProviderError::external("invalid response length"))?;
        if buf.len() < expected {
            return Err(ProviderError::external("upstream response truncated"));
        }
    }
    Ok(buf)
}
