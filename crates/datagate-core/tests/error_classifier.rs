// crates/datagate-core/tests/error_classifier.rs
// ============================================================================
// Module: Error Classifier Integration Tests
// Description: Classification stability across error transports.
// Purpose: Ensure callers see the same code however the failure arrives.
// ============================================================================

//! ## Overview
//! Exercises the public classifier surface with errors shaped the way a
//! datasource adapter produces them: structured, wrapped, and rendered to text.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions and helpers are permitted."
)]

use datagate_core::DatabaseError;
use datagate_core::ErrorFamily;
use datagate_core::classify;
use datagate_core::classify_message;
use proptest::prelude::*;
use thiserror::Error;

/// Adapter error in the shape a datasource driver wrapper would produce.
#[derive(Debug, Error)]
enum AdapterError {
    /// Query execution failed in the backend.
    #[error("failed to execute query: {0}")]
    Execute(#[source] DatabaseError),
    /// Transport failed before the backend answered.
    #[error("query failed: {0}")]
    Transport(String),
}

#[test]
fn wrapped_unique_violation_keeps_structured_code() {
    let error = AdapterError::Execute(DatabaseError::new(
        "23505",
        "duplicate key value violates unique constraint \"orders_pkey\"",
    ));
    let classified = classify(&error).expect("user actionable");
    assert_eq!(classified.code, "unique_violation");
    assert_eq!(classified.family, ErrorFamily::IntegrityConstraint);
    assert_eq!(classified.message, "duplicate key value violates unique constraint \"orders_pkey\"");
}

#[test]
fn rendered_and_structured_forms_agree() {
    let cases = [
        ("23505", "duplicate key value violates unique constraint \"k\""),
        ("23502", "null value in column \"id\" violates not-null constraint"),
        ("22012", "division by zero"),
        ("42703", "column \"nme\" does not exist"),
        ("42P01", "relation \"missing\" does not exist"),
        ("42P01", "relation \"column_stats\" does not exist"),
        ("23505", "duplicate key value violates unique constraint \"session_timeout_key\""),
        ("23503", "insert on table \"jobs\" violates foreign key constraint \"jobs_deadlock_detected_fk\""),
    ];
    for (code, message) in cases {
        let structured = AdapterError::Execute(DatabaseError::new(code, message));
        let rendered = structured.to_string();
        assert_eq!(classify(&structured), classify_message(&rendered), "{code}");
        let bare = classify_message(&format!("ERROR: {message}")).expect("pattern match");
        assert_eq!(Some(bare.code), classify(&structured).map(|c| c.code), "{code}");
    }
}

#[test]
fn transport_failures_are_system_errors() {
    for text in ["dial tcp: i/o timeout", "connection refused", "context canceled"] {
        assert!(classify(&AdapterError::Transport(text.to_string())).is_none(), "{text}");
    }
    let canceled = AdapterError::Execute(DatabaseError::new(
        "57014",
        "canceling statement due to statement timeout",
    ));
    assert!(classify(&canceled).is_none());
}

proptest! {
    #[test]
    fn timeout_text_is_never_user_actionable(prefix in "[a-z ]{0,20}", suffix in "[a-z ]{0,20}") {
        let text = format!("{prefix}timeout{suffix}");
        prop_assert!(classify_message(&text).is_none());
    }

    #[test]
    fn classifier_never_panics(text in ".{0,120}") {
        let _ = classify_message(&text);
    }
}
