// crates/datagate-mcp/src/gateway.rs
// ============================================================================
// Module: Admission Gateway
// Description: Per-call admission: identity, tenant session, and policy.
// Purpose: Decide whether a named operation may run for this request now.
// Dependencies: datagate-core, thiserror, tracing
// ============================================================================

//! ## Overview
//! Every operation handler passes through [`AdmissionGateway::admit`] first.
//! Admission extracts claims, parses the tenant, opens a tenant session,
//! loads policy inputs, and evaluates the same rule the listing path uses.
//!
//! ## Invariants
//! - The session is released on every denial path before the error returns.
//! - Dropping the admission future mid-flight drops any partially acquired
//!   session, which releases it.
//! - Session and store failures are system errors and never become
//!   user-facing denials.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use datagate_core::AdmissionDecision;
use datagate_core::DenialReason;
use datagate_core::IdentityClass;
use datagate_core::OperationName;
use datagate_core::TenantId;
use datagate_core::evaluate;
use thiserror::Error;

use crate::audit::AdmissionAuditSink;
use crate::audit::AdmissionEvent;
use crate::auth::IdentityClaims;
use crate::auth::RequestContext;
use crate::catalog::CatalogResolver;
use crate::session::TenantSession;
use crate::session::TenantSessionProvider;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Admission failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    /// Request carried no identity claims.
    #[error("authentication required")]
    AuthenticationRequired,
    /// Tenant identifier in the claims is malformed.
    #[error("invalid tenant: {0}")]
    InvalidTenant(String),
    /// No tenant session or policy inputs could be obtained.
    #[error("session unavailable: {0}")]
    SessionUnavailable(String),
    /// Policy denies the operation for this caller.
    #[error("policy denied {operation}: {}", .reason.message())]
    PolicyDenied {
        /// Requested operation name.
        operation: String,
        /// Structured denial reason.
        reason: DenialReason,
    },
}

impl AdmissionError {
    /// Returns the stable short code for the failure.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::AuthenticationRequired => "authentication_required",
            Self::InvalidTenant(_) => "invalid_tenant",
            Self::SessionUnavailable(_) => "session_unavailable",
            Self::PolicyDenied {
                reason, ..
            } => reason.code(),
        }
    }

    /// Returns true when the failure should be shown to the caller as a
    /// structured denial.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        !matches!(self, Self::SessionUnavailable(_))
    }

    /// Returns the caller-facing message.
    ///
    /// System failures yield a generic message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::AuthenticationRequired => "authentication required".to_string(),
            Self::InvalidTenant(_) => "invalid tenant identifier".to_string(),
            Self::SessionUnavailable(_) => "service temporarily unavailable".to_string(),
            Self::PolicyDenied {
                reason, ..
            } => reason.message(),
        }
    }
}

// ============================================================================
// SECTION: Admission
// ============================================================================

/// Successful admission handed to the operation handler.
#[derive(Debug)]
pub struct Admission {
    /// Admitted operation.
    pub operation: OperationName,
    /// Resolved tenant.
    pub tenant_id: TenantId,
    /// Identity class the decision was made for.
    pub identity: IdentityClass,
    /// Caller claims.
    pub claims: IdentityClaims,
    /// Tenant session owned by this request.
    session: TenantSession,
}

impl Admission {
    /// Returns the tenant session.
    #[must_use]
    pub const fn session(&self) -> &TenantSession {
        &self.session
    }

    /// Releases the tenant session. Safe to call more than once.
    pub fn release(&mut self) -> bool {
        self.session.release()
    }
}

// ============================================================================
// SECTION: Gateway
// ============================================================================

/// Admission gateway shared by every operation handler.
#[derive(Clone)]
pub struct AdmissionGateway {
    /// Tenant session source.
    sessions: Arc<dyn TenantSessionProvider>,
    /// Policy input loader.
    resolver: CatalogResolver,
    /// Admission event sink.
    events: Arc<dyn AdmissionAuditSink>,
}

impl AdmissionGateway {
    /// Builds a gateway.
    #[must_use]
    pub fn new(
        sessions: Arc<dyn TenantSessionProvider>,
        resolver: CatalogResolver,
        events: Arc<dyn AdmissionAuditSink>,
    ) -> Self {
        Self {
            sessions,
            resolver,
            events,
        }
    }

    /// Returns the catalog resolver used for admission.
    #[must_use]
    pub const fn resolver(&self) -> &CatalogResolver {
        &self.resolver
    }

    /// Admits one call to the named operation.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError`] when the caller is unauthenticated, the
    /// tenant is invalid, no session is available, or policy denies the
    /// operation.
    pub async fn admit(
        &self,
        context: &RequestContext,
        operation: &str,
    ) -> Result<Admission, AdmissionError> {
        let identity = context.identity_class();
        let result = self.admit_inner(context, operation, identity).await;
        match &result {
            Ok(admission) => self.events.record(&AdmissionEvent::admitted(
                context.request_id.clone(),
                admission.tenant_id.as_str(),
                operation,
                admission.identity,
            )),
            Err(err) => {
                if !err.is_user_facing() {
                    tracing::warn!(operation, error = %err, "admission failed with system error");
                }
                self.events.record(&AdmissionEvent::denied(
                    context.request_id.clone(),
                    context.claims.as_ref().map(|claims| claims.tenant_id.as_str()),
                    operation,
                    identity,
                    err.code(),
                    err.user_message(),
                ));
            }
        }
        result
    }

    /// Runs the admission steps without event emission.
    async fn admit_inner(
        &self,
        context: &RequestContext,
        operation: &str,
        identity: IdentityClass,
    ) -> Result<Admission, AdmissionError> {
        let claims = context.claims.as_ref().ok_or(AdmissionError::AuthenticationRequired)?;
        let tenant_id = TenantId::parse(&claims.tenant_id)
            .map_err(|err| AdmissionError::InvalidTenant(err.to_string()))?;
        let Some(op) = OperationName::parse(operation) else {
            return Err(AdmissionError::PolicyDenied {
                operation: operation.to_string(),
                reason: DenialReason::unknown_operation(operation),
            });
        };
        let mut session = self
            .sessions
            .open(&tenant_id)
            .await
            .map_err(|err| AdmissionError::SessionUnavailable(err.to_string()))?;
        let inputs = match self.resolver.load_inputs(&tenant_id).await {
            Ok(inputs) => inputs,
            Err(err) => {
                session.release();
                return Err(AdmissionError::SessionUnavailable(err.to_string()));
            }
        };
        if let AdmissionDecision::Deny(reason) = evaluate(op, identity, &inputs) {
            session.release();
            return Err(AdmissionError::PolicyDenied {
                operation: operation.to_string(),
                reason,
            });
        }
        Ok(Admission {
            operation: op,
            tenant_id,
            identity,
            claims: claims.clone(),
            session,
        })
    }
}
