// crates/datagate-cli/tests/cli_commands.rs
// ============================================================================
// Module: CLI Command Tests
// Description: Integration tests for seeding, catalog, history, and config.
// Purpose: Ensure the binary resolves catalogs exactly as the server does.
// Dependencies: datagate-cli binary, tempfile
// ============================================================================
//! ## Overview
//! Runs the `datagate` binary against a temp `SQLite` store, seeding tenant
//! configuration through the CLI itself and reading it back.
//!
//! Security posture: malformed identifiers and invalid configuration must
//! fail closed with a non-zero exit.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;

use serde_json::Value;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn datagate_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_datagate"))
}

/// Temp workspace with a config pointing at a private store.
struct Workspace {
    root: TempDir,
    config_path: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let root = TempDir::new().expect("create temp dir");
        let config_path = root.path().join("datagate.toml");
        let store_path = root.path().join("datagate.db");
        let config = format!("[store]\npath = {:?}\n", store_path.to_string_lossy());
        fs::write(&config_path, config).expect("write config");
        Self {
            root,
            config_path,
        }
    }

    fn run(&self, args: &[&str]) -> Output {
        let config = self.config_path.to_string_lossy().to_string();
        let mut full: Vec<&str> = args.to_vec();
        full.extend(["--config", config.as_str()]);
        Command::new(datagate_bin()).args(&full).output().expect("run datagate")
    }

    fn run_json(&self, args: &[&str]) -> Value {
        let output = self.run(args);
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(output.status.success(), "command {args:?} failed: {stderr}");
        serde_json::from_slice(&output.stdout).expect("stdout is json")
    }

    fn path(&self) -> &Path {
        self.root.path()
    }
}

fn operations(catalog: &Value) -> Vec<String> {
    catalog["operations"]
        .as_array()
        .expect("operations array")
        .iter()
        .map(|op| op.as_str().expect("operation name").to_string())
        .collect()
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Verifies an unconfigured tenant resolves to the health check only.
#[test]
fn catalog_for_unconfigured_tenant_is_health_only() {
    let workspace = Workspace::new();
    let catalog = workspace.run_json(&["catalog", "--tenant", "acme"]);
    assert_eq!(catalog["tenant_id"], "acme");
    assert_eq!(catalog["identity"], "user");
    assert_eq!(operations(&catalog), vec!["health"]);
}

/// Verifies seeded groups and options flow into the resolved catalog.
#[test]
fn seeded_developer_tools_expose_execute_only_with_option() {
    let workspace = Workspace::new();
    workspace.run_json(&["tenant", "enable-group", "--tenant", "acme", "--group", "developer-tools"]);
    workspace.run_json(&["tenant", "set-datasource", "--tenant", "acme", "--datasource", "warehouse"]);

    let before = operations(&workspace.run_json(&["catalog", "--tenant", "acme"]));
    assert!(before.contains(&"query".to_string()));
    assert!(!before.contains(&"execute".to_string()));

    let seeded = workspace.run_json(&[
        "tenant",
        "set-option",
        "--tenant",
        "acme",
        "--group",
        "developer-tools",
        "--option",
        "enable_execute",
    ]);
    assert_eq!(seeded["config"]["enabled"], true);

    let after = operations(&workspace.run_json(&["catalog", "--tenant", "acme"]));
    assert!(after.contains(&"execute".to_string()));

    let agent = operations(&workspace.run_json(&["catalog", "--tenant", "acme", "--agent"]));
    assert_eq!(agent, vec!["health"]);
}

/// Verifies clearing the default datasource hides datasource operations.
#[test]
fn clearing_datasource_hides_query_operations() {
    let workspace = Workspace::new();
    workspace.run_json(&["tenant", "enable-group", "--tenant", "acme", "--group", "developer-tools"]);
    workspace.run_json(&["tenant", "set-datasource", "--tenant", "acme", "--datasource", "warehouse"]);
    let cleared = workspace.run_json(&["tenant", "set-datasource", "--tenant", "acme"]);
    assert_eq!(cleared["default_datasource"], Value::Null);

    let catalog = operations(&workspace.run_json(&["catalog", "--tenant", "acme"]));
    assert!(!catalog.contains(&"query".to_string()));
}

/// Verifies installs are idempotent and reported back.
#[test]
fn install_is_idempotent() {
    let workspace = Workspace::new();
    let args = ["tenant", "install", "--tenant", "acme", "--capability", "ai-data-liaison"];
    workspace.run_json(&args);
    let installed = workspace.run_json(&args);
    assert_eq!(installed["installed"], serde_json::json!(["ai-data-liaison"]));
}

/// Verifies malformed tenant ids fail before touching the store.
#[test]
fn malformed_tenant_fails_closed() {
    let workspace = Workspace::new();
    let output = workspace.run(&["catalog", "--tenant", "acme corp!"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

/// Verifies unknown groups are rejected with the accepted names.
#[test]
fn unknown_group_is_rejected() {
    let workspace = Workspace::new();
    let output =
        workspace.run(&["tenant", "enable-group", "--tenant", "acme", "--group", "root-access"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown group root-access"), "unexpected stderr: {stderr}");
}

// ============================================================================
// SECTION: History
// ============================================================================

/// Verifies an empty history prints an empty array.
#[test]
fn history_for_new_tenant_is_empty() {
    let workspace = Workspace::new();
    let history = workspace.run_json(&["history", "--tenant", "acme", "--failures"]);
    assert_eq!(history, serde_json::json!([]));
}

/// Verifies out-of-range limits are rejected.
#[test]
fn history_rejects_zero_limit() {
    let workspace = Workspace::new();
    let output = workspace.run(&["history", "--tenant", "acme", "--limit", "0"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("history limit"), "unexpected stderr: {stderr}");
}

// ============================================================================
// SECTION: Config
// ============================================================================

/// Verifies a valid config reports its store settings.
#[test]
fn config_validate_accepts_workspace_config() {
    let workspace = Workspace::new();
    let report = workspace.run_json(&["config", "validate"]);
    assert_eq!(report["valid"], true);
    let store_path = report["store_path"].as_str().unwrap();
    assert!(Path::new(store_path).starts_with(workspace.path()));
}

/// Verifies invalid configuration fails closed.
#[test]
fn config_validate_rejects_zero_sessions() {
    let workspace = Workspace::new();
    fs::write(&workspace.config_path, "[store]\nmax_sessions = 0\n").unwrap();
    let output = workspace.run(&["config", "validate"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("store.max_sessions"), "unexpected stderr: {stderr}");
}

// ============================================================================
// SECTION: Classify
// ============================================================================

/// Verifies classification needs no configuration.
#[test]
fn classify_reports_sqlstate_codes() {
    let output = Command::new(datagate_bin())
        .args(["classify", "null value in column \"id\" violates not-null constraint (SQLSTATE 23502)"])
        .output()
        .expect("run datagate classify");
    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["code"], "not_null_violation");
}
