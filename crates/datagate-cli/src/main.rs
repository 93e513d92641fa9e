// crates/datagate-cli/src/main.rs
// ============================================================================
// Module: Datagate CLI Entry Point
// Description: Operator commands for catalogs, history, and tenant seeding.
// Purpose: Inspect and seed admission state without running the server.
// Dependencies: clap, datagate-config, datagate-core, datagate-mcp,
//               datagate-store-sqlite, serde_json, tokio, tracing-subscriber
// ============================================================================

//! ## Overview
//! The `datagate` binary resolves a tenant's catalog exactly as the server
//! would, reads execution history, classifies raw backend error text,
//! validates configuration, and seeds tenant configuration rows. Results are
//! JSON on stdout; diagnostics go to stderr.
//!
//! Security posture: arguments are untrusted and parsed through the same
//! identifier and configuration validation the server uses.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use datagate_config::DatagateConfig;
use datagate_core::CapabilityGroup;
use datagate_core::CapabilityId;
use datagate_core::HistoryQuery;
use datagate_core::IdentityClass;
use datagate_core::SubOption;
use datagate_core::TenantId;
use datagate_core::classify_message;
use datagate_mcp::CatalogResolver;
use datagate_store_sqlite::SqliteTenantStore;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Default number of history entries to print.
const DEFAULT_HISTORY_LIMIT: usize = 20;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "datagate", version, disable_help_subcommand = true)]
struct Cli {
    /// Emit debug diagnostics on stderr.
    #[arg(long, action = ArgAction::SetTrue, global = true)]
    verbose: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve the tool catalog a caller would see.
    Catalog(CatalogCommand),
    /// Show recent execution history for a tenant.
    History(HistoryCommand),
    /// Classify raw backend error text.
    Classify(ClassifyCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Tenant configuration seeding.
    Tenant {
        /// Selected tenant subcommand.
        #[command(subcommand)]
        command: TenantCommand,
    },
}

/// Shared `--config` argument.
#[derive(Args, Debug, Clone)]
struct ConfigArg {
    /// Path to the configuration file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for `catalog`.
#[derive(Args, Debug)]
struct CatalogCommand {
    /// Tenant identifier.
    #[arg(long)]
    tenant: String,
    /// Resolve for an agent caller instead of a user.
    #[arg(long, action = ArgAction::SetTrue)]
    agent: bool,
    /// Configuration source.
    #[command(flatten)]
    config: ConfigArg,
}

/// Arguments for `history`.
#[derive(Args, Debug)]
struct HistoryCommand {
    /// Tenant identifier.
    #[arg(long)]
    tenant: String,
    /// Maximum entries to print, newest first.
    #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
    limit: usize,
    /// Restrict to one operation.
    #[arg(long)]
    operation: Option<String>,
    /// Restrict to failed executions.
    #[arg(long, action = ArgAction::SetTrue)]
    failures: bool,
    /// Configuration source.
    #[command(flatten)]
    config: ConfigArg,
}

/// Arguments for `classify`.
#[derive(Args, Debug)]
struct ClassifyCommand {
    /// Raw error text as reported by the backend.
    message: String,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a configuration file.
    Validate(ConfigArg),
}

/// Tenant subcommands.
#[derive(Subcommand, Debug)]
enum TenantCommand {
    /// Enable or disable a capability group.
    EnableGroup(EnableGroupCommand),
    /// Set or clear a sub-option on a group record.
    SetOption(SetOptionCommand),
    /// Record an installed capability.
    Install(InstallCommand),
    /// Set or clear the default datasource.
    SetDatasource(SetDatasourceCommand),
}

/// Arguments for `tenant enable-group`.
#[derive(Args, Debug)]
struct EnableGroupCommand {
    /// Tenant identifier.
    #[arg(long)]
    tenant: String,
    /// Capability group wire name.
    #[arg(long)]
    group: String,
    /// Disable instead of enable.
    #[arg(long, action = ArgAction::SetTrue)]
    disable: bool,
    /// Turn force mode on for the group.
    #[arg(long, action = ArgAction::SetTrue)]
    force: bool,
    /// Configuration source.
    #[command(flatten)]
    config: ConfigArg,
}

/// Arguments for `tenant set-option`.
#[derive(Args, Debug)]
struct SetOptionCommand {
    /// Tenant identifier.
    #[arg(long)]
    tenant: String,
    /// Capability group wire name holding the option.
    #[arg(long)]
    group: String,
    /// Sub-option wire name.
    #[arg(long)]
    option: String,
    /// Clear the option instead of setting it.
    #[arg(long, action = ArgAction::SetTrue)]
    unset: bool,
    /// Configuration source.
    #[command(flatten)]
    config: ConfigArg,
}

/// Arguments for `tenant install`.
#[derive(Args, Debug)]
struct InstallCommand {
    /// Tenant identifier.
    #[arg(long)]
    tenant: String,
    /// Capability identifier.
    #[arg(long)]
    capability: String,
    /// Configuration source.
    #[command(flatten)]
    config: ConfigArg,
}

/// Arguments for `tenant set-datasource`.
#[derive(Args, Debug)]
struct SetDatasourceCommand {
    /// Tenant identifier.
    #[arg(long)]
    tenant: String,
    /// Datasource identifier; omit to clear.
    #[arg(long)]
    datasource: Option<String>,
    /// Configuration source.
    #[command(flatten)]
    config: ConfigArg,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
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
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(&cli.command).await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Installs the stderr diagnostics subscriber.
fn init_tracing(verbose: bool) {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };
    tracing_subscriber::fmt().with_writer(std::io::stderr).with_max_level(level).init();
}

/// Executes the CLI command dispatcher.
async fn run(command: &Commands) -> CliResult<ExitCode> {
    match command {
        Commands::Catalog(command) => command_catalog(command).await,
        Commands::History(command) => command_history(command),
        Commands::Classify(command) => command_classify(command),
        Commands::Config {
            command: ConfigCommand::Validate(command),
        } => command_config_validate(command),
        Commands::Tenant {
            command,
        } => command_tenant(command),
    }
}

// ============================================================================
// SECTION: Catalog and History
// ============================================================================

/// Resolves and prints a tenant catalog.
async fn command_catalog(command: &CatalogCommand) -> CliResult<ExitCode> {
    let tenant_id = parse_tenant(&command.tenant)?;
    let store = open_store(&command.config)?;
    let identity = if command.agent { IdentityClass::Agent } else { IdentityClass::User };
    let operations = CatalogResolver::sqlite(store)
        .resolve_catalog(identity, Some(&tenant_id))
        .await
        .into_iter()
        .map(|op| op.as_str())
        .collect::<Vec<_>>();
    write_json(&json!({
        "tenant_id": tenant_id,
        "identity": identity,
        "operations": operations,
    }))?;
    Ok(ExitCode::SUCCESS)
}

/// Prints recent execution history.
fn command_history(command: &HistoryCommand) -> CliResult<ExitCode> {
    let tenant_id = parse_tenant(&command.tenant)?;
    let store = open_store(&command.config)?;
    let query = HistoryQuery {
        operation: command.operation.clone(),
        failures_only: command.failures,
        limit: command.limit,
    };
    let records =
        store.recent_history(&tenant_id, &query).map_err(|err| CliError::new(err.to_string()))?;
    write_json(&records)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Classification
// ============================================================================

/// Classifies raw error text and prints the result.
fn command_classify(command: &ClassifyCommand) -> CliResult<ExitCode> {
    write_json(&classification_report(&command.message))?;
    Ok(ExitCode::SUCCESS)
}

/// Builds the JSON report for one raw error message.
fn classification_report(message: &str) -> Value {
    classify_message(message).map_or_else(
        || json!({"user_actionable": false}),
        |classified| {
            json!({
                "user_actionable": true,
                "code": classified.code,
                "family": classified.family,
                "message": classified.message,
            })
        },
    )
}

// ============================================================================
// SECTION: Config
// ============================================================================

/// Validates a configuration file.
fn command_config_validate(command: &ConfigArg) -> CliResult<ExitCode> {
    let config = load_config(command)?;
    write_json(&json!({
        "valid": true,
        "store_path": config.store.path,
        "max_sessions": config.store.max_sessions,
    }))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Tenant Seeding
// ============================================================================

/// Dispatches tenant seeding commands.
fn command_tenant(command: &TenantCommand) -> CliResult<ExitCode> {
    match command {
        TenantCommand::EnableGroup(command) => command_enable_group(command),
        TenantCommand::SetOption(command) => command_set_option(command),
        TenantCommand::Install(command) => command_install(command),
        TenantCommand::SetDatasource(command) => command_set_datasource(command),
    }
}

/// Enables or disables a group, preserving its options.
fn command_enable_group(command: &EnableGroupCommand) -> CliResult<ExitCode> {
    let tenant_id = parse_tenant(&command.tenant)?;
    let group = parse_group(&command.group)?;
    let store = open_store(&command.config)?;
    let mut config = store
        .group_config(&tenant_id, group)
        .map_err(|err| CliError::new(err.to_string()))?
        .unwrap_or_default();
    config.enabled = !command.disable;
    config.force_mode = command.force;
    store
        .upsert_group_config(&tenant_id, group, &config)
        .map_err(|err| CliError::new(err.to_string()))?;
    write_json(&json!({"tenant_id": tenant_id, "group": group.as_str(), "config": config}))?;
    Ok(ExitCode::SUCCESS)
}

/// Sets or clears one sub-option on a group record.
fn command_set_option(command: &SetOptionCommand) -> CliResult<ExitCode> {
    let tenant_id = parse_tenant(&command.tenant)?;
    let group = parse_group(&command.group)?;
    let option = parse_option(&command.option)?;
    let store = open_store(&command.config)?;
    let mut config = store
        .group_config(&tenant_id, group)
        .map_err(|err| CliError::new(err.to_string()))?
        .unwrap_or_default();
    if command.unset {
        config.options.remove(&option);
    } else {
        config.options.insert(option);
    }
    store
        .upsert_group_config(&tenant_id, group, &config)
        .map_err(|err| CliError::new(err.to_string()))?;
    write_json(&json!({"tenant_id": tenant_id, "group": group.as_str(), "config": config}))?;
    Ok(ExitCode::SUCCESS)
}

/// Records an installed capability.
fn command_install(command: &InstallCommand) -> CliResult<ExitCode> {
    let tenant_id = parse_tenant(&command.tenant)?;
    let capability =
        CapabilityId::parse(&command.capability).map_err(|err| CliError::new(err.to_string()))?;
    let store = open_store(&command.config)?;
    store
        .install_capability(&tenant_id, &capability)
        .map_err(|err| CliError::new(err.to_string()))?;
    let installed =
        store.installed_capabilities(&tenant_id).map_err(|err| CliError::new(err.to_string()))?;
    write_json(&json!({"tenant_id": tenant_id, "installed": installed}))?;
    Ok(ExitCode::SUCCESS)
}

/// Sets or clears the default datasource.
fn command_set_datasource(command: &SetDatasourceCommand) -> CliResult<ExitCode> {
    let tenant_id = parse_tenant(&command.tenant)?;
    let store = open_store(&command.config)?;
    store
        .set_default_datasource(&tenant_id, command.datasource.as_deref())
        .map_err(|err| CliError::new(err.to_string()))?;
    write_json(&json!({"tenant_id": tenant_id, "default_datasource": command.datasource}))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads and validates configuration.
fn load_config(arg: &ConfigArg) -> CliResult<DatagateConfig> {
    DatagateConfig::load(arg.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

/// Opens the tenant store named by configuration.
fn open_store(arg: &ConfigArg) -> CliResult<SqliteTenantStore> {
    let config = load_config(arg)?;
    tracing::debug!(path = %config.store.path.display(), "opening tenant store");
    SqliteTenantStore::open(config.store.sqlite_config())
        .map_err(|err| CliError::new(format!("failed to open store: {err}")))
}

/// Parses a tenant identifier argument.
fn parse_tenant(raw: &str) -> CliResult<TenantId> {
    TenantId::parse(raw).map_err(|err| CliError::new(err.to_string()))
}

/// Parses a capability group argument.
fn parse_group(raw: &str) -> CliResult<CapabilityGroup> {
    CapabilityGroup::parse(raw).ok_or_else(|| {
        let known: Vec<&str> = CapabilityGroup::all().iter().map(|group| group.as_str()).collect();
        CliError::new(format!("unknown group {raw}; expected one of {}", known.join(", ")))
    })
}

/// Parses a sub-option argument.
fn parse_option(raw: &str) -> CliResult<SubOption> {
    SubOption::parse(raw).ok_or_else(|| {
        let known: Vec<&str> = SubOption::all().iter().map(|option| option.as_str()).collect();
        CliError::new(format!("unknown option {raw}; expected one of {}", known.join(", ")))
    })
}

/// Writes a value to stdout as pretty JSON.
fn write_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("failed to encode output: {err}")))?;
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{rendered}")
        .map_err(|err| CliError::new(format!("failed to write stdout: {err}")))
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let mut stderr = std::io::stderr();
    let _ = writeln!(&mut stderr, "{message}");
    ExitCode::FAILURE
}
