// crates/datagate-core/src/core/history/tests.rs
// ============================================================================
// Module: Execution History Record Tests
// Description: Entry construction, failure marking, and payload bounds.
// Purpose: Keep audit entries faithful to the executed operation.
// Dependencies: datagate-core, serde_json
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

use serde_json::json;

use super::*;
use crate::core::classify::classify_code;

fn tenant() -> TenantId {
    TenantId::parse("acme").unwrap()
}

#[test]
fn new_entry_takes_modifying_flag_from_catalog() {
    let read = AuditEntry::new(tenant(), OperationName::Query, json!({"sql": "select 1"}));
    assert!(!read.modifying);
    assert!(read.success);
    assert_eq!(read.operation, "query");

    let write = AuditEntry::new(tenant(), OperationName::Execute, json!({"sql": "delete from t"}));
    assert!(write.modifying);
}

#[test]
fn classified_failure_records_code_and_clean_message() {
    let mut entry = AuditEntry::new(tenant(), OperationName::Execute, Value::Null);
    let classified = classify_code("23505", "ERROR: duplicate key (SQLSTATE 23505)").unwrap();
    entry.fail_classified(&classified);
    assert!(!entry.success);
    assert_eq!(entry.error_code.as_deref(), Some("unique_violation"));
    assert_eq!(entry.error_message.as_deref(), Some("duplicate key"));
}

#[test]
fn system_failure_has_no_code() {
    let mut entry = AuditEntry::new(tenant(), OperationName::Query, Value::Null);
    entry.fail_system("backend unavailable");
    assert!(!entry.success);
    assert!(entry.error_code.is_none());
    assert_eq!(entry.error_message.as_deref(), Some("backend unavailable"));
}

#[test]
fn oversized_payload_is_replaced_by_marker() {
    let big = "x".repeat(256);
    let mut entry = AuditEntry::new(tenant(), OperationName::Query, json!({ "sql": big }));
    assert!(entry.bound_payload(64));
    assert_eq!(entry.payload["truncated"], json!(true));
    assert!(entry.payload["original_bytes"].as_u64().unwrap() > 256);

    let mut small = AuditEntry::new(tenant(), OperationName::Query, json!({"sql": "select 1"}));
    assert!(!small.bound_payload(64));
    assert_eq!(small.payload, json!({"sql": "select 1"}));
}
