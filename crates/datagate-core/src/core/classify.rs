// crates/datagate-core/src/core/classify.rs
// ============================================================================
// Module: Backend Error Classifier
// Description: Split backend failures into user-actionable and system errors.
// Purpose: Give callers stable short codes for failures they can fix.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! [`classify`] inspects a backend failure and returns a
//! [`ClassifiedError`] when the caller can plausibly fix it by changing the
//! request. `None` means a system error that must propagate opaquely.
//!
//! Structured [`DatabaseError`] values found anywhere in the source chain
//! take precedence. When the failure was stringified upstream, the rendered
//! text is scanned for an embedded `SQLSTATE` marker and then for known
//! PostgreSQL phrases. Quoted identifiers are blanked before either scan, so
//! a constraint or table name never decides the classification.
//!
//! ## Invariants
//! - Connection, timeout, cancellation, deadlock, and resource failures are
//!   never classified as user-actionable.
//! - The same constraint violation yields the same code in structured and
//!   stringified form.

use std::error::Error;

use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Structured backend error carrying a five-character SQLSTATE.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (SQLSTATE {code})")]
pub struct DatabaseError {
    /// Five-character SQLSTATE code.
    pub code: String,
    /// Backend message without transport decoration.
    pub message: String,
}

impl DatabaseError {
    /// Builds a structured backend error.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// User-actionable error family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorFamily {
    /// SQLSTATE class 23.
    IntegrityConstraint,
    /// SQLSTATE class 22.
    DataException,
    /// SQLSTATE class 42.
    SyntaxOrAccessRule,
    /// SQLSTATE class 44.
    CheckOption,
}

impl ErrorFamily {
    /// Maps a SQLSTATE class prefix to its family.
    fn from_class(class: &str) -> Option<Self> {
        match class {
            "23" => Some(Self::IntegrityConstraint),
            "22" => Some(Self::DataException),
            "42" => Some(Self::SyntaxOrAccessRule),
            "44" => Some(Self::CheckOption),
            _ => None,
        }
    }

    /// Generic code for unrecognized codes in this family.
    const fn fallback_code(self) -> &'static str {
        match self {
            Self::IntegrityConstraint => "integrity_constraint_violation",
            Self::DataException => "data_exception",
            Self::SyntaxOrAccessRule => "syntax_or_access_violation",
            Self::CheckOption => "check_option_violation",
        }
    }
}

/// User-actionable classification of a backend failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedError {
    /// Stable short code.
    pub code: &'static str,
    /// Error family.
    pub family: ErrorFamily,
    /// Cleaned, caller-facing message.
    pub message: String,
}

// ============================================================================
// SECTION: Code Tables
// ============================================================================

/// Exact SQLSTATE to short code mappings.
const SQLSTATE_CODES: &[(&str, &str)] = &[
    ("23505", "unique_violation"),
    ("23503", "foreign_key_violation"),
    ("23502", "not_null_violation"),
    ("23514", "check_violation"),
    ("22012", "division_by_zero"),
    ("22P02", "invalid_input"),
    ("22001", "value_too_long"),
    ("22003", "numeric_out_of_range"),
    ("22007", "invalid_datetime"),
    ("22008", "invalid_datetime"),
    ("42601", "syntax_error"),
    ("42P01", "undefined_table"),
    ("42703", "undefined_column"),
];

/// SQLSTATE classes that always denote system failures.
const SYSTEM_CLASSES: &[&str] = &["08", "40", "53", "57", "58", "XX"];

/// Lowercase text markers that always denote system failures.
const SYSTEM_MARKERS: &[&str] = &[
    "timeout",
    "timed out",
    "connection refused",
    "connection reset",
    "broken pipe",
    "context canceled",
    "context deadline exceeded",
    "deadlock detected",
    "too many connections",
    "canceling statement",
    "server closed the connection",
];

/// Lowercase PostgreSQL phrases mapped to their SQLSTATE, for stringified errors.
///
/// Matched against text whose double-quoted identifiers are emptied to `""`.
const TEXT_PATTERNS: &[(&str, &str)] = &[
    ("duplicate key value violates unique constraint", "23505"),
    ("violates foreign key constraint", "23503"),
    ("violates not-null constraint", "23502"),
    ("violates check constraint", "23514"),
    ("division by zero", "22012"),
    ("invalid input syntax", "22P02"),
    ("value too long for type", "22001"),
    ("out of range for type", "22003"),
    ("invalid input value for enum", "22P02"),
    ("date/time field value out of range", "22008"),
    ("syntax error at or near", "42601"),
    ("syntax error at end of input", "42601"),
    ("column \"\" of relation \"\" does not exist", "42703"),
    ("column \"\" does not exist", "42703"),
    ("relation \"\" does not exist", "42P01"),
    ("violates check option for view", "44000"),
];

/// Wrapping prefixes removed from messages (lowercase, matched case-insensitively).
const WRAPPING_PREFIXES: &[&str] =
    &["error: ", "pq: ", "query failed: ", "failed to execute query: ", "execution failed: "];

// ============================================================================
// SECTION: Classification
// ============================================================================

/// Classifies a backend failure. `None` means a system error.
#[must_use]
pub fn classify(error: &(dyn Error + 'static)) -> Option<ClassifiedError> {
    if let Some(database) = find_database_error(error) {
        return classify_code(&database.code, &database.message);
    }
    classify_message(&error.to_string())
}

/// Classifies a failure that only survives as rendered text.
#[must_use]
pub fn classify_message(text: &str) -> Option<ClassifiedError> {
    let unquoted = empty_quoted_identifiers(text);
    if let Some(code) = embedded_sqlstate(&unquoted) {
        return classify_code(code, text);
    }
    let lowered = unquoted.to_ascii_lowercase();
    if SYSTEM_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        return None;
    }
    let code = TEXT_PATTERNS
        .iter()
        .find(|(pattern, _)| lowered.contains(pattern))
        .map(|(_, code)| *code)?;
    classify_code(code, text)
}

/// Classifies a SQLSTATE code with its raw message.
#[must_use]
pub fn classify_code(code: &str, message: &str) -> Option<ClassifiedError> {
    let class = code.get(..2)?;
    if SYSTEM_CLASSES.contains(&class) {
        return None;
    }
    let family = ErrorFamily::from_class(class)?;
    let short = SQLSTATE_CODES
        .iter()
        .find(|(state, _)| *state == code)
        .map_or_else(|| family.fallback_code(), |(_, short)| *short);
    Some(ClassifiedError {
        code: short,
        family,
        message: clean_message(message),
    })
}

/// Strips transport suffixes and wrapping prefixes from a backend message.
#[must_use]
pub fn clean_message(message: &str) -> String {
    let mut text = message.trim();
    loop {
        let before = text;
        text = strip_parenthesized_suffix(text, "(sqlstate ");
        text = strip_parenthesized_suffix(text, "(status ");
        for prefix in WRAPPING_PREFIXES {
            if text.len() >= prefix.len()
                && text.is_char_boundary(prefix.len())
                && text[.. prefix.len()].eq_ignore_ascii_case(prefix)
            {
                text = text[prefix.len() ..].trim_start();
            }
        }
        if text == before {
            break;
        }
    }
    text.to_string()
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Walks the source chain looking for a structured backend error.
fn find_database_error<'a>(error: &'a (dyn Error + 'static)) -> Option<&'a DatabaseError> {
    let mut current: Option<&(dyn Error + 'static)> = Some(error);
    while let Some(candidate) = current {
        if let Some(database) = candidate.downcast_ref::<DatabaseError>() {
            return Some(database);
        }
        current = candidate.source();
    }
    None
}

/// Extracts a `SQLSTATE xxxxx` marker from rendered text.
fn embedded_sqlstate(text: &str) -> Option<&str> {
    let upper = text.to_ascii_uppercase();
    let index = upper.find("SQLSTATE")?;
    let rest = text.get(index + "SQLSTATE".len() ..)?;
    let rest = rest.trim_start_matches([' ', ':', '=']);
    let code = rest.get(.. 5)?;
    code.chars().all(|ch| ch.is_ascii_alphanumeric()).then_some(code)
}

/// Replaces every double-quoted identifier with `""`.
///
/// A doubled quote inside an identifier is an escaped quote. An unterminated
/// identifier swallows the rest of the text.
fn empty_quoted_identifiers(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '"' {
            output.push(ch);
            continue;
        }
        output.push_str("\"\"");
        while let Some(inner) = chars.next() {
            if inner == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    continue;
                }
                break;
            }
        }
    }
    output
}

/// Removes a trailing parenthesized suffix whose opening matches `opener`.
fn strip_parenthesized_suffix<'a>(text: &'a str, opener: &str) -> &'a str {
    if !text.ends_with(')') {
        return text;
    }
    let lowered = text.to_ascii_lowercase();
    lowered.rfind(opener).map_or(text, |index| text[.. index].trim_end())
}

#[cfg(test)]
mod tests;
