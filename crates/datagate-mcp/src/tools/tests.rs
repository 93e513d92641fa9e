// crates/datagate-mcp/src/tools/tests.rs
// ============================================================================
// Module: Tool Router Unit Tests
// Description: Tool definitions and structured error results.
// Purpose: Pin the shapes the transport serializes.
// Dependencies: datagate-mcp, datagate-core
// ============================================================================

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

use super::*;

#[test]
fn error_result_has_stable_shape() {
    let value = error_result("unique_violation", "duplicate key");
    assert_eq!(value, json!({"error": true, "code": "unique_violation", "message": "duplicate key"}));
}

#[test]
fn health_definition_has_no_group() {
    let definition = ToolDefinition::for_operation(OperationName::Health);
    assert_eq!(definition.name, "health");
    assert_eq!(definition.group, None);
    assert!(!definition.modifying);
}

#[test]
fn execute_definition_is_modifying() {
    let definition = ToolDefinition::for_operation(OperationName::Execute);
    assert_eq!(definition.group, Some("developer-tools"));
    assert!(definition.modifying);
    let value = serde_json::to_value(&definition).unwrap();
    assert_eq!(value["name"], "execute");
}

#[test]
fn outcome_new_leaves_counts_empty() {
    let outcome = OperationOutcome::new(json!({"rows": []}));
    assert_eq!(outcome.row_count, None);
    assert_eq!(outcome.affected_rows, None);
    assert_eq!(outcome.query_ref, None);
}

#[test]
fn system_tool_errors_carry_no_detail() {
    assert_eq!(ToolError::Internal.to_string(), "internal error");
}
