// crates/datagate-mcp/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Shared stores, sinks, and handlers for gateway and router tests.
// Purpose: Build a real SQLite-backed runtime in a temp directory.
// Dependencies: datagate-core, datagate-mcp, datagate-store-sqlite, tempfile
// ============================================================================

//! ## Overview
//! Fixtures wire the admission gateway, recorder, and router over a real
//! `SQLite` store. Sinks capture events in memory for assertions.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use datagate_core::CapabilityGroup;
use datagate_core::GroupConfig;
use datagate_core::HistoryQuery;
use datagate_core::SubjectKind;
use datagate_core::TenantId;
use datagate_mcp::Admission;
use datagate_mcp::AdmissionAuditSink;
use datagate_mcp::AdmissionEvent;
use datagate_mcp::AdmissionGateway;
use datagate_mcp::CatalogResolver;
use datagate_mcp::ComplianceError;
use datagate_mcp::ComplianceRecord;
use datagate_mcp::ComplianceSink;
use datagate_mcp::ExecutionAuditRecorder;
use datagate_mcp::IdentityClaims;
use datagate_mcp::OperationError;
use datagate_mcp::OperationHandler;
use datagate_mcp::OperationOutcome;
use datagate_mcp::RecorderSettings;
use datagate_mcp::RequestContext;
use datagate_mcp::SqliteSessionProvider;
use datagate_mcp::ToolRouter;
use datagate_store_sqlite::HistoryRecord;
use datagate_store_sqlite::SqliteStoreConfig;
use datagate_store_sqlite::SqliteTenantStore;
use serde_json::Value;
use tempfile::TempDir;

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Admission sink that keeps events in memory.
#[derive(Default)]
pub struct MemoryAdmissionSink {
    pub events: Mutex<Vec<AdmissionEvent>>,
}

impl MemoryAdmissionSink {
    pub fn events(&self) -> Vec<AdmissionEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl AdmissionAuditSink for MemoryAdmissionSink {
    fn record(&self, event: &AdmissionEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Compliance sink that keeps records in memory.
#[derive(Default)]
pub struct MemoryComplianceSink {
    pub records: Mutex<Vec<ComplianceRecord>>,
}

impl MemoryComplianceSink {
    pub fn records(&self) -> Vec<ComplianceRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl ComplianceSink for MemoryComplianceSink {
    fn record(&self, record: &ComplianceRecord) -> Result<(), ComplianceError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Compliance sink that always fails.
pub struct FailingComplianceSink;

impl ComplianceSink for FailingComplianceSink {
    fn record(&self, _record: &ComplianceRecord) -> Result<(), ComplianceError> {
        Err(ComplianceError::Io("disk full".to_string()))
    }
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Handler that returns a fixed outcome.
pub struct StaticHandler {
    pub outcome: OperationOutcome,
}

#[async_trait]
impl OperationHandler for StaticHandler {
    async fn handle(
        &self,
        _admission: &Admission,
        _payload: Value,
    ) -> Result<OperationOutcome, OperationError> {
        Ok(self.outcome.clone())
    }
}

/// Handler that fails with an error built per call.
pub struct FailingHandler {
    pub make_error: fn() -> OperationError,
}

#[async_trait]
impl OperationHandler for FailingHandler {
    async fn handle(
        &self,
        _admission: &Admission,
        _payload: Value,
    ) -> Result<OperationOutcome, OperationError> {
        Err((self.make_error)())
    }
}

// ============================================================================
// SECTION: Fixture
// ============================================================================

/// Runtime wired over a temp `SQLite` store.
pub struct Fixture {
    pub temp: TempDir,
    pub store: SqliteTenantStore,
    pub sessions: Arc<SqliteSessionProvider>,
    pub events: Arc<MemoryAdmissionSink>,
    pub compliance: Arc<MemoryComplianceSink>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_sessions(4, Duration::from_millis(200))
    }

    pub fn with_sessions(max_sessions: usize, acquire_timeout: Duration) -> Self {
        let temp = TempDir::new().unwrap();
        let store =
            SqliteTenantStore::open(SqliteStoreConfig::new(temp.path().join("datagate.db")))
                .unwrap();
        let sessions =
            Arc::new(SqliteSessionProvider::new(store.clone(), max_sessions, acquire_timeout));
        Self {
            temp,
            store,
            sessions,
            events: Arc::new(MemoryAdmissionSink::default()),
            compliance: Arc::new(MemoryComplianceSink::default()),
        }
    }

    pub fn gateway(&self) -> AdmissionGateway {
        AdmissionGateway::new(
            self.sessions.clone(),
            CatalogResolver::sqlite(self.store.clone()),
            self.events.clone(),
        )
    }

    pub fn recorder(&self) -> ExecutionAuditRecorder {
        ExecutionAuditRecorder::new(
            self.sessions.clone(),
            self.compliance.clone(),
            RecorderSettings {
                write_timeout: Duration::from_secs(2),
                max_payload_bytes: 16 * 1024,
            },
        )
    }

    pub fn router(&self) -> ToolRouter {
        ToolRouter::new(self.gateway(), self.recorder())
    }

    /// Enables a group and gives the tenant a default datasource.
    pub fn enable(&self, tenant: &str, group: CapabilityGroup, config: &GroupConfig) {
        let tenant = tenant_id(tenant);
        self.store.upsert_group_config(&tenant, group, config).unwrap();
        self.store.set_default_datasource(&tenant, Some("warehouse")).unwrap();
    }

    pub fn history(&self, tenant: &str) -> Vec<HistoryRecord> {
        let query = HistoryQuery {
            limit: 100,
            ..HistoryQuery::default()
        };
        self.store.recent_history(&tenant_id(tenant), &query).unwrap()
    }

    /// Waits until at least `expected` history rows exist, then returns them.
    pub async fn wait_for_history(&self, tenant: &str, expected: usize) -> Vec<HistoryRecord> {
        for _ in 0 .. 200 {
            let records = self.history(tenant);
            if records.len() >= expected {
                return records;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.history(tenant)
    }
}

// ============================================================================
// SECTION: Contexts
// ============================================================================

pub fn tenant_id(raw: &str) -> TenantId {
    TenantId::parse(raw).unwrap()
}

pub fn user(tenant: &str) -> RequestContext {
    RequestContext::authenticated(
        IdentityClaims::new(tenant).with_subject(SubjectKind::User, "user-1"),
    )
    .with_request_id("req-1")
}

pub fn agent(tenant: &str) -> RequestContext {
    RequestContext::authenticated(
        IdentityClaims::new(tenant).with_subject(SubjectKind::Agent, "agent-1"),
    )
}
