// crates/datagate-core/src/core/classify/tests.rs
// ============================================================================
// Module: Backend Error Classifier Unit Tests
// Description: Code mapping, message cleanup, and system error detection.
// Purpose: Pin the classification table to concrete backend failures.
// Dependencies: datagate-core
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

use std::fmt;

use super::*;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Wrapper error that hides a structured cause behind a context message.
#[derive(Debug)]
struct Wrapped {
    context: &'static str,
    source: DatabaseError,
}

impl fmt::Display for Wrapped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.context)
    }
}

impl Error for Wrapped {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// Plain text error with no structure.
#[derive(Debug)]
struct Text(String);

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Error for Text {}

// ============================================================================
// SECTION: Structured Errors
// ============================================================================

#[test]
fn unique_violation_is_user_actionable() {
    let error = DatabaseError::new(
        "23505",
        "duplicate key value violates unique constraint \"users_email_key\"",
    );
    let classified = classify(&error).unwrap();
    assert_eq!(classified.code, "unique_violation");
    assert_eq!(classified.family, ErrorFamily::IntegrityConstraint);
    assert_eq!(
        classified.message,
        "duplicate key value violates unique constraint \"users_email_key\""
    );
}

#[test]
fn structured_cause_found_through_source_chain() {
    let error = Wrapped {
        context: "execution failed",
        source: DatabaseError::new("42P01", "relation \"orders\" does not exist"),
    };
    let classified = classify(&error).unwrap();
    assert_eq!(classified.code, "undefined_table");
    assert_eq!(classified.family, ErrorFamily::SyntaxOrAccessRule);
}

#[test]
fn unlisted_codes_fall_back_to_family_code() {
    assert_eq!(classify_code("23P01", "exclusion").unwrap().code, "integrity_constraint_violation");
    assert_eq!(classify_code("22023", "bad param").unwrap().code, "data_exception");
    assert_eq!(classify_code("42501", "permission denied").unwrap().code, "syntax_or_access_violation");
    assert_eq!(classify_code("44000", "check option").unwrap().code, "check_option_violation");
}

#[test]
fn system_classes_are_never_classified() {
    for code in ["08006", "40001", "40P01", "53300", "57014", "58030", "XX000"] {
        assert!(classify(&DatabaseError::new(code, "backend failure")).is_none(), "{code}");
    }
    assert!(classify_code("0A000", "feature not supported").is_none());
}

// ============================================================================
// SECTION: Stringified Errors
// ============================================================================

#[test]
fn stringified_form_matches_structured_form() {
    let structured = DatabaseError::new(
        "23503",
        "insert or update on table \"orders\" violates foreign key constraint \"orders_user_fk\"",
    );
    let rendered = format!("query failed: {structured}");
    let from_structure = classify(&structured).unwrap();
    let from_text = classify(&Text(rendered)).unwrap();
    assert_eq!(from_structure, from_text);
}

#[test]
fn pattern_detection_without_sqlstate() {
    let cases = [
        ("pq: duplicate key value violates unique constraint \"k\"", "unique_violation"),
        ("ERROR: null value in column \"id\" violates not-null constraint", "not_null_violation"),
        ("ERROR: division by zero", "division_by_zero"),
        ("invalid input syntax for type integer: \"abc\"", "invalid_input"),
        ("value too long for type character varying(10)", "value_too_long"),
        ("syntax error at or near \"SELEC\"", "syntax_error"),
        ("column \"nme\" does not exist", "undefined_column"),
        ("relation \"missing\" does not exist", "undefined_table"),
    ];
    for (text, code) in cases {
        assert_eq!(classify_message(text).map(|c| c.code), Some(code), "{text}");
    }
}

#[test]
fn timeouts_and_connection_failures_are_system_errors() {
    let cases = [
        "query failed: context deadline exceeded",
        "dial tcp 10.0.0.1:5432: connection refused",
        "read: connection reset by peer",
        "statement timeout",
        "context canceled",
        "ERROR: deadlock detected",
        "FATAL: sorry, too many connections for role",
        "column \"x\" does not exist: timeout while reading",
    ];
    for text in cases {
        assert!(classify_message(text).is_none(), "{text}");
    }
}

#[test]
fn quoted_identifiers_do_not_trigger_system_markers() {
    let structured = DatabaseError::new(
        "23505",
        "duplicate key value violates unique constraint \"session_timeout_key\"",
    );
    let rendered = format!("pq: {}", structured.message);
    assert_eq!(classify(&structured).map(|c| c.code), Some("unique_violation"));
    assert_eq!(classify_message(&rendered).map(|c| c.code), Some("unique_violation"));
    assert!(classify_message("connection to \"primary\" timed out").is_none());
}

#[test]
fn lookup_failures_match_on_object_kind_not_name() {
    let cases = [
        ("ERROR: relation \"column_stats\" does not exist", "undefined_table"),
        ("ERROR: relation \"public.\"\"odd\"\"\" does not exist", "undefined_table"),
        ("column \"relation_id\" does not exist", "undefined_column"),
        ("column \"nme\" of relation \"orders\" does not exist", "undefined_column"),
    ];
    for (text, code) in cases {
        assert_eq!(classify_message(text).map(|c| c.code), Some(code), "{text}");
    }
    assert!(classify_message("ERROR: column_stats refresh failed").is_none());
}

#[test]
fn unrecognized_text_is_a_system_error() {
    assert!(classify_message("something went wrong").is_none());
    assert!(classify(&Text(String::new())).is_none());
}

// ============================================================================
// SECTION: Message Cleanup
// ============================================================================

#[test]
fn cleanup_strips_prefixes_and_suffixes_repeatedly() {
    assert_eq!(
        clean_message("execution failed: ERROR: division by zero (SQLSTATE 22012)"),
        "division by zero"
    );
    assert_eq!(clean_message("Query Failed: pq: bad input (status 400)"), "bad input");
    assert_eq!(clean_message("  plain message  "), "plain message");
}

#[test]
fn cleanup_keeps_unrelated_parentheses() {
    assert_eq!(clean_message("value out of range (max 10)"), "value out of range (max 10)");
}
