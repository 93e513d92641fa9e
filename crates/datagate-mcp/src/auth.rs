// crates/datagate-mcp/src/auth.rs
// ============================================================================
// Module: Request Identity
// Description: Identity claims and per-request context for tool calls.
// Purpose: Carry authenticated caller identity into admission decisions.
// Dependencies: datagate-core, serde
// ============================================================================

//! ## Overview
//! Authentication happens upstream of this crate. The transport decodes a
//! request, verifies credentials, and hands over [`IdentityClaims`] inside a
//! [`RequestContext`]. Claims are immutable for the lifetime of the request.
//!
//! Security posture: a context without claims is treated as unauthenticated
//! and only ever sees the liveness probe.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use datagate_core::IdentityClass;
use datagate_core::SubjectKind;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identity Claims
// ============================================================================

/// Authenticated identity claims for one request.
///
/// The tenant identifier is kept raw; parsing happens at admission so an
/// invalid tenant is reported as such rather than as missing claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Tenant identifier as presented by the caller.
    pub tenant_id: String,
    /// Role labels granted to the caller.
    #[serde(default)]
    pub roles: BTreeSet<String>,
    /// Subject marker; absent means a human or service caller.
    #[serde(default)]
    pub subject_kind: Option<SubjectKind>,
    /// Stable subject identifier, recorded as the initiating identity.
    #[serde(default)]
    pub subject_id: Option<String>,
}

impl IdentityClaims {
    /// Builds claims for a tenant with no roles or subject marker.
    #[must_use]
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            roles: BTreeSet::new(),
            subject_kind: None,
            subject_id: None,
        }
    }

    /// Adds a role label.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    /// Sets the subject marker and identifier.
    #[must_use]
    pub fn with_subject(mut self, kind: SubjectKind, subject_id: impl Into<String>) -> Self {
        self.subject_kind = Some(kind);
        self.subject_id = Some(subject_id.into());
        self
    }

    /// Returns the identity class used by the catalog resolver.
    #[must_use]
    pub fn identity_class(&self) -> IdentityClass {
        self.subject_kind.map_or(IdentityClass::User, IdentityClass::from)
    }
}

// ============================================================================
// SECTION: Request Context
// ============================================================================

/// Per-request context handed to the tool router.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Optional request identifier for auditing.
    pub request_id: Option<String>,
    /// Authenticated claims, absent for anonymous callers.
    pub claims: Option<IdentityClaims>,
}

impl RequestContext {
    /// Builds a context for an unauthenticated caller.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Builds a context for an authenticated caller.
    #[must_use]
    pub const fn authenticated(claims: IdentityClaims) -> Self {
        Self {
            request_id: None,
            claims: Some(claims),
        }
    }

    /// Attaches a request identifier.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Returns the caller's identity class before tenant resolution.
    #[must_use]
    pub fn identity_class(&self) -> IdentityClass {
        self.claims.as_ref().map_or(IdentityClass::Unresolved, IdentityClaims::identity_class)
    }

    /// Returns the initiating subject identifier, when known.
    #[must_use]
    pub fn subject_id(&self) -> Option<&str> {
        self.claims.as_ref().and_then(|claims| claims.subject_id.as_deref())
    }
}
