// crates/datagate-mcp/src/recorder.rs
// ============================================================================
// Module: Execution Audit Recorder
// Description: Detached, best-effort persistence of execution history.
// Purpose: Record every admitted execution without delaying the response.
// Dependencies: datagate-core, tokio, tracing
// ============================================================================

//! ## Overview
//! [`ExecutionAuditRecorder::record_async`] hands an [`AuditEntry`] to a
//! detached task. The task opens its own tenant session, so the caller's
//! session may already be gone, and runs under its own write timeout rather
//! than the caller's cancellation.
//!
//! ## Invariants
//! - One call to `record_async` is one write attempt. Failures are logged at
//!   warn level and never retried or surfaced to the caller.
//! - Modifying entries are copied to the compliance sink concurrently with the
//!   history write; neither outcome affects the other.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use datagate_config::AuditConfig;
use datagate_core::AuditEntry;
use tokio::task::JoinHandle;

use crate::audit::ComplianceRecord;
use crate::audit::ComplianceSink;
use crate::audit::now_ms;
use crate::session::TenantSessionProvider;

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Recorder limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecorderSettings {
    /// Upper bound for each write, including session acquisition.
    pub write_timeout: Duration,
    /// Payload snapshot cap in serialized bytes.
    pub max_payload_bytes: usize,
}

impl RecorderSettings {
    /// Reads recorder limits from audit configuration.
    #[must_use]
    pub const fn from_config(config: &AuditConfig) -> Self {
        Self {
            write_timeout: config.write_timeout(),
            max_payload_bytes: config.max_payload_bytes,
        }
    }
}

// ============================================================================
// SECTION: Recorder
// ============================================================================

/// Detached execution history writer.
#[derive(Clone)]
pub struct ExecutionAuditRecorder {
    /// Independent session source for history writes.
    sessions: Arc<dyn TenantSessionProvider>,
    /// Compliance sink for modifying operations.
    compliance: Arc<dyn ComplianceSink>,
    /// Write limits.
    settings: RecorderSettings,
}

impl ExecutionAuditRecorder {
    /// Builds a recorder.
    #[must_use]
    pub fn new(
        sessions: Arc<dyn TenantSessionProvider>,
        compliance: Arc<dyn ComplianceSink>,
        settings: RecorderSettings,
    ) -> Self {
        Self {
            sessions,
            compliance,
            settings,
        }
    }

    /// Records an entry in the background and forgets about it.
    pub fn record_async(&self, entry: AuditEntry) {
        drop(self.spawn_record(entry));
    }

    /// Records an entry in the background, returning the task handle.
    ///
    /// Dropping the handle detaches the task; it keeps running.
    #[must_use = "dropping the handle detaches the write; use record_async to detach explicitly"]
    pub fn spawn_record(&self, mut entry: AuditEntry) -> JoinHandle<()> {
        if entry.created_at_ms == 0 {
            entry.created_at_ms = i64::try_from(now_ms()).unwrap_or(i64::MAX);
        }
        if entry.bound_payload(self.settings.max_payload_bytes) {
            tracing::debug!(
                tenant_id = %entry.tenant_id,
                operation = %entry.operation,
                "audit payload replaced by size marker"
            );
        }
        let sessions = Arc::clone(&self.sessions);
        let compliance = Arc::clone(&self.compliance);
        let write_timeout = self.settings.write_timeout;
        tokio::spawn(async move {
            let compliance_record = entry.modifying.then(|| ComplianceRecord::from_entry(&entry));
            tokio::join!(
                write_history(sessions, entry, write_timeout),
                write_compliance(compliance, compliance_record, write_timeout),
            );
        })
    }
}

// ============================================================================
// SECTION: Writers
// ============================================================================

/// Writes one history row through an independent session.
async fn write_history(
    sessions: Arc<dyn TenantSessionProvider>,
    entry: AuditEntry,
    write_timeout: Duration,
) {
    let tenant_id = entry.tenant_id.clone();
    let operation = entry.operation.clone();
    let write = async move {
        let mut session = sessions.open(&entry.tenant_id).await.map_err(|err| err.to_string())?;
        let store = session.store().clone();
        let result = tokio::task::spawn_blocking(move || store.append_history(&entry))
            .await
            .map_err(|err| format!("history write join failed: {err}"))?
            .map_err(|err| err.to_string());
        session.release();
        result
    };
    match tokio::time::timeout(write_timeout, write).await {
        Ok(Ok(id)) => {
            tracing::debug!(%tenant_id, %operation, history_id = id, "execution history recorded");
        }
        Ok(Err(err)) => {
            tracing::warn!(%tenant_id, %operation, error = %err, "execution history write failed");
        }
        Err(_) => {
            tracing::warn!(
                %tenant_id,
                %operation,
                timeout_ms = write_timeout.as_millis(),
                "execution history write timed out"
            );
        }
    }
}

/// Sends the compliance copy of a modifying execution.
async fn write_compliance(
    sink: Arc<dyn ComplianceSink>,
    record: Option<ComplianceRecord>,
    write_timeout: Duration,
) {
    let Some(record) = record else {
        return;
    };
    let tenant_id = record.tenant_id.clone();
    let operation = record.operation.clone();
    let write = tokio::task::spawn_blocking(move || sink.record(&record));
    match tokio::time::timeout(write_timeout, write).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(err))) => {
            tracing::warn!(%tenant_id, %operation, error = %err, "compliance record failed");
        }
        Ok(Err(err)) => {
            tracing::warn!(%tenant_id, %operation, error = %err, "compliance task failed");
        }
        Err(_) => {
            tracing::warn!(%tenant_id, %operation, "compliance record timed out");
        }
    }
}
