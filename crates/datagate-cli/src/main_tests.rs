// crates/datagate-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing and classification output.
// Purpose: Ensure operator input is validated before touching the store.
// Dependencies: datagate-cli main helpers
// ============================================================================

//! ## Overview
//! Validates identifier parsing helpers, clap wiring, and the JSON shape of
//! classification reports.
//!
//! Security posture: CLI inputs are untrusted; malformed identifiers must fail
//! closed.

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

use clap::CommandFactory;
use clap::Parser;
use datagate_core::CapabilityGroup;
use datagate_core::SubOption;
use serde_json::json;

use super::Cli;
use super::Commands;
use super::TenantCommand;
use super::classification_report;
use super::parse_group;
use super::parse_option;
use super::parse_tenant;

// ============================================================================
// SECTION: Parsing Helpers
// ============================================================================

#[test]
fn parse_tenant_rejects_malformed_ids() {
    assert_eq!(parse_tenant("acme").unwrap().as_str(), "acme");
    assert!(parse_tenant("").is_err());
    assert!(parse_tenant("acme corp!").is_err());
}

#[test]
fn parse_group_accepts_wire_names_only() {
    assert_eq!(parse_group("developer-tools").unwrap(), CapabilityGroup::DeveloperTools);
    let err = parse_group("developer_tools").unwrap_err();
    assert!(err.to_string().contains("expected one of developer-tools"));
}

#[test]
fn parse_option_lists_known_options_on_error() {
    assert_eq!(parse_option("enable_execute").unwrap(), SubOption::EnableExecute);
    let err = parse_option("sudo").unwrap_err();
    assert!(err.to_string().starts_with("unknown option sudo"));
}

// ============================================================================
// SECTION: Classification
// ============================================================================

#[test]
fn classification_report_marks_actionable_errors() {
    let report = classification_report(
        "ERROR: duplicate key value violates unique constraint \"orders_pkey\" (SQLSTATE 23505)",
    );
    assert_eq!(report["user_actionable"], json!(true));
    assert_eq!(report["code"], json!("unique_violation"));
    assert_eq!(report["family"], json!("integrity_constraint"));
}

#[test]
fn classification_report_hides_system_errors() {
    let report = classification_report("dial tcp 10.0.0.5:5432: connection refused");
    assert_eq!(report, json!({"user_actionable": false}));
}

// ============================================================================
// SECTION: Clap Wiring
// ============================================================================

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn tenant_set_datasource_without_value_clears() {
    let cli = Cli::try_parse_from(["datagate", "tenant", "set-datasource", "--tenant", "acme"])
        .unwrap();
    match cli.command {
        Commands::Tenant {
            command: TenantCommand::SetDatasource(command),
        } => assert_eq!(command.datasource, None),
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn history_limit_defaults_to_twenty() {
    let cli = Cli::try_parse_from(["datagate", "history", "--tenant", "acme"]).unwrap();
    match cli.command {
        Commands::History(command) => {
            assert_eq!(command.limit, 20);
            assert!(!command.failures);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}
