// crates/stamp-verifier-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic example for docs and tooling.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example for the verifier configuration. The output is static
//! and kept valid by the crate's tests.

/// Returns a canonical example `stamp-verifier.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[http]
allow_http = false
timeout_ms = 5000
max_response_bytes = 1048576
user_agent = "stamp-verifier/0.1"

[policy]
# allowlist = ["HumanityRegistry", "AllowList"]
denylist = []

[audit]
sink = "stderr"
# sink = "file"
# path = "stamp-verifier-audit.jsonl"

[humanity]
base_url = "https://registry.example.com/v1"

[allow_list]
base_url = "https://lists.example.com/v1"

[handle]
base_url = "https://profiles.example.com/v1"

[balance]
base_url = "https://balances.example.com/v1"
thresholds = ["0.01", "1", "10"]
record_attribute = "ethPossessionsGte"

[github]
client_id = "Iv1.example"
client_secret_env = "GITHUB_CLIENT_SECRET"
throttle_ms = 1000
follower_thresholds = [10, 50, 100]
repo_thresholds = [5, 20]
"#,
    )
}
