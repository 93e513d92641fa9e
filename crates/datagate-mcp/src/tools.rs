// crates/datagate-mcp/src/tools.rs
// ============================================================================
// Module: Tool Router
// Description: Tool listing and tool call dispatch with admission and audit.
// Purpose: Wire the gateway, handlers, classifier, and recorder per call.
// Dependencies: async-trait, datagate-core, serde, serde_json, tracing
// ============================================================================

//! ## Overview
//! [`ToolRouter`] is the surface the transport calls into. Listing resolves
//! the caller's catalog; calling runs admission, dispatches to the registered
//! [`OperationHandler`], classifies failures, and hands an audit entry to the
//! recorder without waiting for it.
//!
//! Denials and user-actionable backend failures come back as structured tool
//! results `{"error": true, "code", "message"}`. System failures surface as
//! [`ToolError::Internal`] with no detail.
//!
//! Security posture: tool inputs are untrusted; every call except the
//! liveness probe passes admission before any handler runs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use datagate_core::AuditEntry;
use datagate_core::OperationName;
use datagate_core::TenantId;
use datagate_core::classify;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use crate::auth::RequestContext;
use crate::gateway::Admission;
use crate::gateway::AdmissionGateway;
use crate::recorder::ExecutionAuditRecorder;

// ============================================================================
// SECTION: Handler Interface
// ============================================================================

/// Boxed backend failure returned by operation handlers.
pub type OperationError = Box<dyn StdError + Send + Sync + 'static>;

/// Result of one successful operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationOutcome {
    /// Tool result returned to the caller.
    pub result: Value,
    /// Rows returned, for read operations.
    pub row_count: Option<u64>,
    /// Rows affected, for modifying operations.
    pub affected_rows: Option<u64>,
    /// Named query or object reference the call touched.
    pub query_ref: Option<String>,
}

impl OperationOutcome {
    /// Builds an outcome carrying only a result value.
    #[must_use]
    pub fn new(result: Value) -> Self {
        Self {
            result,
            ..Self::default()
        }
    }
}

/// Domain work for one operation, run after admission.
#[async_trait]
pub trait OperationHandler: Send + Sync {
    /// Runs the operation for an admitted call.
    ///
    /// # Errors
    ///
    /// Returns the backend failure unchanged; the router classifies it.
    async fn handle(
        &self,
        admission: &Admission,
        payload: Value,
    ) -> Result<OperationOutcome, OperationError>;
}

// ============================================================================
// SECTION: Tool Definitions
// ============================================================================

/// Catalog entry returned by tool listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolDefinition {
    /// Operation wire name.
    pub name: &'static str,
    /// Owning capability group, absent for always-on tools.
    pub group: Option<&'static str>,
    /// Whether the tool may modify data.
    pub modifying: bool,
}

impl ToolDefinition {
    /// Builds the definition for an operation.
    #[must_use]
    pub fn for_operation(op: OperationName) -> Self {
        let descriptor = op.descriptor();
        Self {
            name: op.as_str(),
            group: descriptor.group.map(|group| group.as_str()),
            modifying: descriptor.modifying,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Tool routing errors that are not shaped into tool results.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Admitted operation has no registered handler.
    #[error("tool not available: {0}")]
    Unavailable(String),
    /// System failure; details are logged, not returned.
    #[error("internal error")]
    Internal,
}

/// Builds a structured error tool result.
#[must_use]
pub fn error_result(code: &str, message: &str) -> Value {
    json!({
        "error": true,
        "code": code,
        "message": message,
    })
}

// ============================================================================
// SECTION: Router
// ============================================================================

/// Tool router over the admission gateway.
pub struct ToolRouter {
    /// Admission gateway.
    gateway: AdmissionGateway,
    /// Detached history writer.
    recorder: ExecutionAuditRecorder,
    /// Registered handlers keyed by operation.
    handlers: BTreeMap<OperationName, Arc<dyn OperationHandler>>,
}

impl ToolRouter {
    /// Builds a router with no handlers registered.
    #[must_use]
    pub const fn new(gateway: AdmissionGateway, recorder: ExecutionAuditRecorder) -> Self {
        Self {
            gateway,
            recorder,
            handlers: BTreeMap::new(),
        }
    }

    /// Registers the handler for an operation, replacing any previous one.
    #[must_use]
    pub fn with_handler(mut self, op: OperationName, handler: Arc<dyn OperationHandler>) -> Self {
        self.handlers.insert(op, handler);
        self
    }

    /// Lists the tools visible to the caller.
    ///
    /// Never fails; callers that cannot be resolved see the liveness probe.
    pub async fn list_tools(&self, context: &RequestContext) -> Vec<ToolDefinition> {
        let tenant_id =
            context.claims.as_ref().and_then(|claims| TenantId::parse(&claims.tenant_id).ok());
        self.gateway
            .resolver()
            .resolve_catalog(context.identity_class(), tenant_id.as_ref())
            .await
            .into_iter()
            .map(ToolDefinition::for_operation)
            .collect()
    }

    /// Calls a tool.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError`] for system failures. Denials and user-actionable
    /// failures are returned as structured results instead.
    pub async fn call_tool(
        &self,
        context: &RequestContext,
        name: &str,
        payload: Value,
    ) -> Result<Value, ToolError> {
        if name == OperationName::Health.as_str() {
            return Ok(json!({"status": "ok"}));
        }
        let mut admission = match self.gateway.admit(context, name).await {
            Ok(admission) => admission,
            Err(err) if err.is_user_facing() => {
                return Ok(error_result(err.code(), &err.user_message()));
            }
            Err(_) => return Err(ToolError::Internal),
        };

        let mut entry =
            AuditEntry::new(admission.tenant_id.clone(), admission.operation, payload.clone());
        entry.initiated_by.clone_from(&admission.claims.subject_id);

        let started = Instant::now();
        let outcome = match self.handlers.get(&admission.operation) {
            Some(handler) => Some(handler.handle(&admission, payload).await),
            None => None,
        };
        entry.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        admission.release();

        let response = match outcome {
            Some(Ok(outcome)) => {
                entry.row_count = outcome.row_count;
                entry.affected_rows = outcome.affected_rows;
                entry.query_ref = outcome.query_ref;
                Ok(outcome.result)
            }
            Some(Err(err)) => match classify(&*err) {
                Some(classified) => {
                    entry.fail_classified(&classified);
                    Ok(error_result(classified.code, &classified.message))
                }
                None => {
                    tracing::warn!(
                        tenant_id = %entry.tenant_id,
                        operation = %entry.operation,
                        error = %err,
                        "operation failed with system error"
                    );
                    entry.fail_system(err.to_string());
                    Err(ToolError::Internal)
                }
            },
            None => {
                entry.fail_system("no handler registered");
                Err(ToolError::Unavailable(name.to_string()))
            }
        };
        self.recorder.record_async(entry);
        response
    }
}

#[cfg(test)]
mod tests;
