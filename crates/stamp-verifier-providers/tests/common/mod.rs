// crates/stamp-verifier-providers/tests/common/mod.rs
// ============================================================================
// Module: Provider Test Fixtures
// Description: In-memory lookups and a local stub HTTP upstream.
// Purpose: Share deterministic upstream fixtures across test binaries.
// Dependencies: stamp-verifier-providers, tiny_http
// ============================================================================

//! Shared fixtures for provider integration tests.

#![allow(
    dead_code,
    clippy::missing_docs_in_private_items,
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Fixtures are shared across test binaries that use different subsets."
)]

use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::thread;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde_json::Value;
use stamp_verifier_core::ProviderError;
use stamp_verifier_providers::AccountLookup;
use stamp_verifier_providers::AccountProfile;
use stamp_verifier_providers::AllowListLookup;
use stamp_verifier_providers::BalanceLookup;
use stamp_verifier_providers::HandleLookup;
use stamp_verifier_providers::RegistrationLookup;
use stamp_verifier_providers::RepoSummary;
use stamp_verifier_providers::UpstreamHttpConfig;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;

/// Address used by most tests.
pub const ADDRESS: &str = "0x00000000000000000000000000000000000000aa";

// ============================================================================
// SECTION: In-Memory Lookups
// ============================================================================

/// Registration lookup over a fixed set of addresses.
pub struct FakeRegistrations {
    pub registered: BTreeSet<String>,
}

impl FakeRegistrations {
    pub fn with(addresses: &[&str]) -> Self {
        Self {
            registered: addresses.iter().map(|address| (*address).to_string()).collect(),
        }
    }
}

#[async_trait]
impl RegistrationLookup for FakeRegistrations {
    async fn is_registered(&self, address: &str) -> Result<bool, ProviderError> {
        Ok(self.registered.contains(address))
    }
}

/// Allow-list lookup returning a scripted reply and recording the list name.
pub struct FakeAllowList {
    pub reply: Result<bool, ProviderError>,
    pub lists: Mutex<Vec<String>>,
}

impl FakeAllowList {
    pub fn replying(reply: Result<bool, ProviderError>) -> Self {
        Self {
            reply,
            lists: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AllowListLookup for FakeAllowList {
    async fn is_listed(&self, list: &str, _address: &str) -> Result<bool, ProviderError> {
        self.lists.lock().unwrap().push(list.to_string());
        self.reply.clone()
    }
}

/// Handle lookup returning a fixed handle and counting calls.
pub struct FakeHandles {
    pub handle: Option<String>,
    pub calls: AtomicUsize,
}

impl FakeHandles {
    pub fn with(handle: Option<&str>) -> Self {
        Self {
            handle: handle.map(str::to_string),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl HandleLookup for FakeHandles {
    async fn primary_handle(&self, _address: &str) -> Result<Option<String>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        Ok(self.handle.clone())
    }
}

/// Balance lookup returning a fixed decimal and counting calls.
pub struct FakeBalance {
    pub value: BigDecimal,
    pub calls: AtomicUsize,
}

impl FakeBalance {
    pub fn with(value: &str) -> Self {
        Self {
            value: BigDecimal::from_str(value).unwrap(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl BalanceLookup for FakeBalance {
    async fn balance(&self, _address: &str) -> Result<BigDecimal, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.value.clone())
    }
}

/// Account lookup with per-call counters.
pub struct FakeAccount {
    pub profile: AccountProfile,
    pub repos: Vec<RepoSummary>,
    pub exchange_error: Option<ProviderError>,
    pub exchanges: AtomicUsize,
    pub profiles: AtomicUsize,
    pub repo_lists: AtomicUsize,
}

impl FakeAccount {
    pub fn with(followers: u64, repos: usize) -> Self {
        Self {
            profile: AccountProfile {
                id: 4242,
                login: "octo".to_string(),
                followers,
            },
            repos: (0 .. repos)
                .map(|index| RepoSummary {
                    name: format!("repo-{index}"),
                    fork: false,
                })
                .collect(),
            exchange_error: None,
            exchanges: AtomicUsize::new(0),
            profiles: AtomicUsize::new(0),
            repo_lists: AtomicUsize::new(0),
        }
    }

    pub fn failing_exchange(mut self, error: ProviderError) -> Self {
        self.exchange_error = Some(error);
        self
    }

    pub fn upstream_calls(&self) -> usize {
        self.exchanges.load(Ordering::SeqCst)
            + self.profiles.load(Ordering::SeqCst)
            + self.repo_lists.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccountLookup for FakeAccount {
    async fn exchange_code(&self, code: &str) -> Result<String, ProviderError> {
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        match &self.exchange_error {
            Some(error) => Err(error.clone()),
            None => Ok(format!("token-for-{code}")),
        }
    }

    async fn profile(&self, _token: &str) -> Result<AccountProfile, ProviderError> {
        self.profiles.fetch_add(1, Ordering::SeqCst);
        Ok(self.profile.clone())
    }

    async fn owned_repos(&self, _token: &str) -> Result<Vec<RepoSummary>, ProviderError> {
        self.repo_lists.fetch_add(1, Ordering::SeqCst);
        Ok(self.repos.clone())
    }
}

// ============================================================================
// SECTION: Stub HTTP Upstream
// ============================================================================

/// Canned response for one request path.
#[derive(Clone)]
pub struct Route {
    pub path: String,
    pub status: u16,
    pub body: String,
    pub headers: Vec<(String, String)>,
}

impl Route {
    pub fn json(path: &str, body: &Value) -> Self {
        Self::status(path, 200, body)
    }

    pub fn status(path: &str, status: u16, body: &Value) -> Self {
        Self {
            path: path.to_string(),
            status,
            body: body.to_string(),
            headers: Vec::new(),
        }
    }

    pub fn raw(path: &str, status: u16, body: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            status,
            body: body.into(),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// Request observed by the stub upstream.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub authorization: Option<String>,
    pub body: String,
}

/// Local upstream answering canned routes; unknown paths get 404.
pub struct StubUpstream {
    pub base_url: String,
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubUpstream {
    pub fn start(routes: Vec<Route>) -> Self {
        let server = Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&requests);
        thread::spawn(move || {
            for mut request in server.incoming_requests() {
                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                let url = request.url().to_string();
                let authorization = request
                    .headers()
                    .iter()
                    .find(|header| header.field.equiv("Authorization"))
                    .map(|header| header.value.as_str().to_string());
                log.lock().unwrap().push(RecordedRequest {
                    method: request.method().to_string(),
                    url: url.clone(),
                    authorization,
                    body,
                });
                let path = url.split('?').next().unwrap_or_default();
                let route = routes.iter().find(|route| route.path == path).cloned();
                let route = route.unwrap_or_else(|| Route::raw(path, 404, "{}"));
                let mut response = Response::from_string(route.body)
                    .with_status_code(route.status)
                    .with_header(
                        Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap(),
                    );
                for (name, value) in &route.headers {
                    let header = Header::from_bytes(name.as_bytes(), value.as_bytes()).unwrap();
                    response = response.with_header(header);
                }
                let _ = request.respond(response);
            }
        });
        Self {
            base_url: format!("http://{addr}"),
            requests,
        }
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests.lock().unwrap().iter().map(|request| request.url.clone()).collect()
    }
}

/// Client settings allowing the local cleartext stub.
pub fn local_http_config() -> UpstreamHttpConfig {
    UpstreamHttpConfig {
        allow_http: true,
        timeout_ms: 5_000,
        ..UpstreamHttpConfig::default()
    }
}
