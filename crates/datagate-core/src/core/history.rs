// crates/datagate-core/src/core/history.rs
// ============================================================================
// Module: Execution History Records
// Description: Audit record shape for executed operations.
// Purpose: Describe one attempted execution for the tenant history store.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! An [`AuditEntry`] captures one admitted execution: what ran, for whom, how
//! long it took, and whether it failed. Entries are written best-effort after
//! the response is produced, so every field is owned and cheap to move across
//! tasks.
//!
//! Payloads are bounded by [`AuditEntry::bound_payload`]. Oversized payloads
//! are replaced by a marker object carrying the original size.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

use crate::core::catalog::OperationName;
use crate::core::classify::ClassifiedError;
use crate::core::identifiers::TenantId;

// ============================================================================
// SECTION: Audit Entry
// ============================================================================

/// One executed operation as written to tenant history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Tenant the operation ran for.
    pub tenant_id: TenantId,
    /// Operation wire name.
    pub operation: String,
    /// Named query or object reference, when the operation has one.
    pub query_ref: Option<String>,
    /// Request arguments as received.
    pub payload: Value,
    /// Rows returned, for read operations.
    pub row_count: Option<u64>,
    /// Rows affected, for modifying operations.
    pub affected_rows: Option<u64>,
    /// Wall-clock execution duration in milliseconds.
    pub duration_ms: u64,
    /// Whether the operation modifies tenant data.
    pub modifying: bool,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Caller-facing failure message.
    pub error_message: Option<String>,
    /// Stable failure code, when the failure was classified.
    pub error_code: Option<String>,
    /// Completion time in unix milliseconds.
    pub created_at_ms: i64,
    /// Subject that initiated the call.
    pub initiated_by: Option<String>,
}

impl AuditEntry {
    /// Starts an entry for an operation with its request payload.
    #[must_use]
    pub fn new(tenant_id: TenantId, operation: OperationName, payload: Value) -> Self {
        Self {
            tenant_id,
            operation: operation.as_str().to_string(),
            query_ref: None,
            payload,
            row_count: None,
            affected_rows: None,
            duration_ms: 0,
            modifying: operation.descriptor().modifying,
            success: true,
            error_message: None,
            error_code: None,
            created_at_ms: 0,
            initiated_by: None,
        }
    }

    /// Marks the entry failed with a classified error.
    pub fn fail_classified(&mut self, error: &ClassifiedError) {
        self.success = false;
        self.error_code = Some(error.code.to_string());
        self.error_message = Some(error.message.clone());
    }

    /// Marks the entry failed with an opaque system error.
    pub fn fail_system(&mut self, message: impl Into<String>) {
        self.success = false;
        self.error_code = None;
        self.error_message = Some(message.into());
    }

    /// Replaces the payload with a size marker when it exceeds `max_bytes`.
    ///
    /// Returns true when the payload was replaced.
    pub fn bound_payload(&mut self, max_bytes: usize) -> bool {
        let size = serde_json::to_vec(&self.payload).map_or(usize::MAX, |bytes| bytes.len());
        if size <= max_bytes {
            return false;
        }
        self.payload = json!({
            "truncated": true,
            "original_bytes": size,
        });
        true
    }
}

// ============================================================================
// SECTION: Query Filters
// ============================================================================

/// Filter for reading tenant history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    /// Restrict to one operation wire name.
    pub operation: Option<String>,
    /// Restrict to failures only.
    pub failures_only: bool,
    /// Maximum entries to return, newest first.
    pub limit: usize,
}

#[cfg(test)]
mod tests;
