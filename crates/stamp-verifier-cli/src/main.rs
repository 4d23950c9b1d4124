// crates/stamp-verifier-cli/src/main.rs
// ============================================================================
// Module: Stamp Verifier CLI Entry Point
// Description: Command dispatcher for verification, scans, and config checks.
// Purpose: Run the verification engine against configured upstream platforms.
// Dependencies: clap, stamp-verifier-config, stamp-verifier-core, tokio
// ============================================================================

//! ## Overview
//! The `stamp-verifier` binary loads `stamp-verifier.toml`, assembles the
//! built-in registry, and runs either a targeted verification or an
//! address-wide scan. Results are printed as JSON on stdout; errors go to
//! stderr with a failure exit code. Proof values are never echoed back.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use serde::Serialize;
use stamp_verifier_config::StampVerifierConfig;
use stamp_verifier_config::config_toml_example;
use stamp_verifier_core::Aggregator;
use stamp_verifier_core::Dispatcher;
use stamp_verifier_core::IssuanceItem;
use stamp_verifier_core::PlatformAuth;
use stamp_verifier_core::PlatformGroupSpec;
use stamp_verifier_core::PlatformId;
use stamp_verifier_core::ProviderId;
use stamp_verifier_core::ProviderOutcome;
use stamp_verifier_core::ProviderRegistry;
use stamp_verifier_core::Proofs;
use stamp_verifier_core::RequestPayload;
use stamp_verifier_core::ScanRequest;
use stamp_verifier_core::issuance_items;
use stamp_verifier_providers::builtin_registry;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum number of provider types per verify request.
const MAX_REQUESTED_TYPES: usize = 128;
/// Maximum number of proof entries per request.
const MAX_PROOFS: usize = 32;
/// Maximum length of one proof value.
const MAX_PROOF_VALUE_LENGTH: usize = 4096;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "stamp-verifier", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Verify requested provider types for one address.
    Verify(VerifyCommand),
    /// Scan every address-based platform for stamps the address satisfies.
    Scan(ScanCommand),
    /// List registered platforms, groups, and provider types.
    Platforms(PlatformsCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a configuration file.
    Validate(ConfigArgs),
    /// Print a canonical example configuration.
    Example,
}

/// Shared config path argument.
#[derive(Args, Debug, Clone, Default)]
struct ConfigArgs {
    /// Optional config file path (defaults to stamp-verifier.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for `verify`.
#[derive(Args, Debug)]
struct VerifyCommand {
    /// Config location.
    #[command(flatten)]
    config: ConfigArgs,
    /// Address the stamps are requested for.
    #[arg(long, value_name = "ADDRESS")]
    address: String,
    /// Provider type to verify (repeatable).
    #[arg(long = "type", value_name = "TYPE", required = true)]
    types: Vec<String>,
    /// Proof entry as `key=value` (repeatable).
    #[arg(long = "proof", value_name = "KEY=VALUE")]
    proofs: Vec<String>,
    /// Credential version stamped into issued records.
    #[arg(long, value_name = "VERSION", default_value = "0.0.0")]
    credential_version: String,
}

/// Arguments for `scan`.
#[derive(Args, Debug)]
struct ScanCommand {
    /// Config location.
    #[command(flatten)]
    config: ConfigArgs,
    /// Address to scan.
    #[arg(long, value_name = "ADDRESS")]
    address: String,
    /// Provider type the address already holds (repeatable).
    #[arg(long, value_name = "TYPE")]
    held: Vec<String>,
    /// Re-evaluate held provider types too.
    #[arg(long)]
    reissue: bool,
    /// Proof entry as `key=value` (repeatable).
    #[arg(long = "proof", value_name = "KEY=VALUE")]
    proofs: Vec<String>,
}

/// Arguments for `platforms`.
#[derive(Args, Debug)]
struct PlatformsCommand {
    /// Config location.
    #[command(flatten)]
    config: ConfigArgs,
}

// ============================================================================
// SECTION: Output Shapes
// ============================================================================

/// Output of `verify`.
#[derive(Debug, Serialize)]
struct VerificationOutput {
    /// Normalized address.
    address: String,
    /// Per-provider outcomes in request order.
    outcomes: Vec<OutcomeOutput>,
    /// Issuance hand-off items in request order.
    issuance: Vec<IssuanceItem>,
}

/// One provider outcome with its classification.
#[derive(Debug, Serialize)]
struct OutcomeOutput {
    /// Requested provider type.
    provider_type: ProviderId,
    /// Whether the provider produced a valid verdict.
    valid: bool,
    /// Status code (absent when valid).
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<u16>,
    /// Message suitable for end users (absent when valid).
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    /// Raw outcome.
    outcome: ProviderOutcome,
}

/// One registered platform.
#[derive(Debug, Serialize)]
struct PlatformOutput {
    /// Platform identifier.
    platform: PlatformId,
    /// Display name.
    name: String,
    /// Evidence acquisition mode.
    auth: PlatformAuth,
    /// Groups in display order.
    groups: Vec<PlatformGroupSpec>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Verify(command) => command_verify(&command).await,
        Commands::Scan(command) => command_scan(&command).await,
        Commands::Platforms(command) => command_platforms(&command),
        Commands::Config {
            command,
        } => command_config(&command),
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes `verify`.
async fn command_verify(command: &VerifyCommand) -> CliResult<ExitCode> {
    let payload = verify_payload(command)?;
    let config = load_config(command.config.config.as_deref())?;
    let dispatcher = build_dispatcher(&config)?;
    let outcomes = dispatcher
        .verify(&payload)
        .await
        .map_err(|err| CliError::new(format!("verification failed: {err}")))?;
    let output = verification_output(&payload.address, outcomes, &command.credential_version);
    write_json(&output)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `scan`.
async fn command_scan(command: &ScanCommand) -> CliResult<ExitCode> {
    let request = scan_request(command)?;
    let config = load_config(command.config.config.as_deref())?;
    let aggregator = Aggregator::new(build_dispatcher(&config)?);
    let report = aggregator
        .scan(&request)
        .await
        .map_err(|err| CliError::new(format!("scan failed: {err}")))?;
    write_json(&report)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `platforms`.
fn command_platforms(command: &PlatformsCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.config.as_deref())?;
    let registry = build_registry(&config)?;
    write_json(&platforms_output(&registry))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `config` subcommands.
fn command_config(command: &ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(args) => {
            let config = load_config(args.config.as_deref())?;
            build_registry(&config)?;
            write_stdout_line("config ok")
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        }
        ConfigCommand::Example => {
            write_stdout_line(config_toml_example().trim_end())
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Engine Assembly
// ============================================================================

/// Loads and validates configuration.
fn load_config(path: Option<&Path>) -> CliResult<StampVerifierConfig> {
    StampVerifierConfig::load(path)
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

/// Builds the provider registry from configuration.
fn build_registry(config: &StampVerifierConfig) -> CliResult<ProviderRegistry> {
    builtin_registry(&config.platform_configs(), config.access_policy())
        .map_err(|err| CliError::new(format!("failed to build registry: {err}")))
}

/// Builds a dispatcher with the configured audit sink.
fn build_dispatcher(config: &StampVerifierConfig) -> CliResult<Dispatcher> {
    let registry = build_registry(config)?;
    let audit = config
        .audit_sink()
        .map_err(|err| CliError::new(format!("failed to open audit sink: {err}")))?;
    Ok(Dispatcher::new(Arc::new(registry)).with_audit(audit))
}

// ============================================================================
// SECTION: Input Parsing
// ============================================================================

/// Builds the verification payload from CLI inputs.
fn verify_payload(command: &VerifyCommand) -> CliResult<RequestPayload> {
    if command.types.len() > MAX_REQUESTED_TYPES {
        return Err(CliError::new(format!(
            "at most {MAX_REQUESTED_TYPES} provider types may be requested"
        )));
    }
    let types: Vec<ProviderId> =
        command.types.iter().map(|provider_type| ProviderId::new(provider_type.trim())).collect();
    let Some(primary) = types.first().cloned() else {
        return Err(CliError::new("at least one --type is required".to_string()));
    };
    let mut payload = RequestPayload::new(primary, command.address.as_str()).with_types(types);
    payload.version.clone_from(&command.credential_version);
    payload.proofs = parse_proofs(&command.proofs)?;
    Ok(payload)
}

/// Builds the scan request from CLI inputs.
fn scan_request(command: &ScanCommand) -> CliResult<ScanRequest> {
    let mut request = ScanRequest::new(command.address.as_str())
        .with_held(command.held.iter().map(|held| ProviderId::new(held.trim())))
        .with_reissue(command.reissue);
    request.proofs = parse_proofs(&command.proofs)?;
    Ok(request)
}

/// Parses `key=value` proof entries.
fn parse_proofs(values: &[String]) -> CliResult<Proofs> {
    if values.len() > MAX_PROOFS {
        return Err(CliError::new(format!("at most {MAX_PROOFS} proofs may be supplied")));
    }
    let mut proofs = Proofs::new();
    for entry in values {
        let Some((key, value)) = entry.split_once('=') else {
            return Err(CliError::new("invalid proof: expected KEY=VALUE".to_string()));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(CliError::new("invalid proof: key must be non-empty".to_string()));
        }
        if value.len() > MAX_PROOF_VALUE_LENGTH {
            return Err(CliError::new(format!("invalid proof: value for {key} is too long")));
        }
        if proofs.insert(key.to_string(), value.to_string()).is_some() {
            return Err(CliError::new(format!("invalid proof: duplicate key {key}")));
        }
    }
    Ok(proofs)
}

// ============================================================================
// SECTION: Output Rendering
// ============================================================================

/// Builds the `verify` output.
fn verification_output(
    address: &str,
    outcomes: Vec<ProviderOutcome>,
    credential_version: &str,
) -> VerificationOutput {
    let issuance = issuance_items(&outcomes, credential_version);
    let outcomes = outcomes
        .into_iter()
        .map(|outcome| OutcomeOutput {
            provider_type: outcome.provider_type.clone(),
            valid: outcome.is_valid(),
            code: outcome.status_code(),
            message: outcome.user_message(),
            outcome,
        })
        .collect();
    VerificationOutput {
        address: address.trim().to_ascii_lowercase(),
        outcomes,
        issuance,
    }
}

/// Builds the `platforms` output.
fn platforms_output(registry: &ProviderRegistry) -> Vec<PlatformOutput> {
    registry
        .platforms()
        .iter()
        .map(|platform| PlatformOutput {
            platform: platform.spec.platform.clone(),
            name: platform.spec.name.clone(),
            auth: platform.spec.auth,
            groups: platform.groups.clone(),
        })
        .collect()
}

/// Writes a value as pretty JSON to stdout.
fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("failed to render json: {err}")))?;
    write_stdout_line(&text).map_err(|err| CliError::new(output_error("stdout", &err)))
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
