// crates/datagate-core/src/core/identifiers.rs
// ============================================================================
// Module: Datagate Identifiers
// Description: Tenant, capability, and caller identity identifiers.
// Purpose: Provide validated identifier types shared by every crate.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Identifiers used across admission, storage, and audit. Tenant identifiers
//! arrive from identity claims and are untrusted until parsed here.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum length of a tenant identifier.
pub const MAX_TENANT_ID_LENGTH: usize = 64;
/// Maximum length of an installed capability identifier.
pub const MAX_CAPABILITY_ID_LENGTH: usize = 128;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Identifier parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// Identifier was empty after trimming.
    #[error("{0} must be non-empty")]
    Empty(&'static str),
    /// Identifier exceeded its length limit.
    #[error("{0} exceeds max length")]
    TooLong(&'static str),
    /// Identifier contained a disallowed character.
    #[error("{0} contains invalid character {1:?}")]
    InvalidCharacter(&'static str, char),
}

// ============================================================================
// SECTION: Tenant Identifier
// ============================================================================

/// Tenant identifier scoping every configuration read and audit record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Parses a tenant identifier from untrusted input.
    ///
    /// Accepts ASCII alphanumerics, `-` and `_` only.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError`] when the value is empty, too long, or
    /// contains a disallowed character.
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(IdentifierError::Empty("tenant_id"));
        }
        if value.len() > MAX_TENANT_ID_LENGTH {
            return Err(IdentifierError::TooLong("tenant_id"));
        }
        if let Some(bad) =
            value.chars().find(|ch| !(ch.is_ascii_alphanumeric() || *ch == '-' || *ch == '_'))
        {
            return Err(IdentifierError::InvalidCharacter("tenant_id", bad));
        }
        Ok(Self(value.to_string()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Capability Identifier
// ============================================================================

/// Identifier of an externally installed optional capability package.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityId(String);

impl CapabilityId {
    /// Creates a capability identifier from a trusted static name.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parses a capability identifier from untrusted input.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError`] when the value is empty, too long, or
    /// contains whitespace or control characters.
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(IdentifierError::Empty("capability_id"));
        }
        if value.len() > MAX_CAPABILITY_ID_LENGTH {
            return Err(IdentifierError::TooLong("capability_id"));
        }
        if let Some(bad) = value.chars().find(|ch| ch.is_whitespace() || ch.is_control()) {
            return Err(IdentifierError::InvalidCharacter("capability_id", bad));
        }
        Ok(Self(value.to_string()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Caller Identity
// ============================================================================

/// Subject marker carried by identity claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    /// Human user or service account.
    User,
    /// Autonomous agent authenticated with an agent key.
    Agent,
}

/// Identity class used by the catalog policy resolver.
///
/// # Invariants
/// - `Unresolved` covers missing claims, bad tenant ids, and session failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityClass {
    /// Identity could not be resolved for this request.
    Unresolved,
    /// Autonomous agent caller.
    Agent,
    /// Human or service caller.
    User,
}

impl IdentityClass {
    /// Returns a stable label for audit events.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unresolved => "unresolved",
            Self::Agent => "agent",
            Self::User => "user",
        }
    }
}

impl From<SubjectKind> for IdentityClass {
    fn from(kind: SubjectKind) -> Self {
        match kind {
            SubjectKind::User => Self::User,
            SubjectKind::Agent => Self::Agent,
        }
    }
}
