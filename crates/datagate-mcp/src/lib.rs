// crates/datagate-mcp/src/lib.rs
// ============================================================================
// Module: Datagate MCP
// Description: Admission control and audit runtime for Datagate tool calls.
// Purpose: Expose tool listing and calling with consistent admission and
//          best-effort execution history.
// Dependencies: datagate-core, datagate-config, datagate-store-sqlite, tokio
// ============================================================================

//! ## Overview
//! Datagate MCP sits between the transport and the domain operation handlers.
//! It resolves tenant sessions, admits or denies each call with the catalog
//! policy from [`datagate_core`], classifies handler failures, and records
//! execution history in the background.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod auth;
pub mod catalog;
pub mod gateway;
pub mod recorder;
pub mod session;
pub mod stores;
pub mod tools;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AdmissionAuditSink;
pub use audit::AdmissionEvent;
pub use audit::AdmissionFileSink;
pub use audit::AdmissionNoopSink;
pub use audit::AdmissionOutcome;
pub use audit::AdmissionStderrSink;
pub use audit::ComplianceError;
pub use audit::ComplianceNoopSink;
pub use audit::ComplianceRecord;
pub use audit::ComplianceSink;
pub use audit::ComplianceStderrSink;
pub use audit::HashChainedComplianceSink;
pub use audit::admission_sink_from_config;
pub use audit::compliance_sink_from_config;
pub use audit::verify_chain;
pub use auth::IdentityClaims;
pub use auth::RequestContext;
pub use catalog::CatalogResolver;
pub use gateway::Admission;
pub use gateway::AdmissionError;
pub use gateway::AdmissionGateway;
pub use recorder::ExecutionAuditRecorder;
pub use recorder::RecorderSettings;
pub use session::SessionError;
pub use session::SqliteSessionProvider;
pub use session::TenantSession;
pub use session::TenantSessionProvider;
pub use stores::FeatureConfigStore;
pub use stores::InstalledCapabilities;
pub use stores::SqlitePolicyStore;
pub use stores::StoreAccessError;
pub use stores::TenantSettings;
pub use tools::OperationError;
pub use tools::OperationHandler;
pub use tools::OperationOutcome;
pub use tools::ToolDefinition;
pub use tools::ToolError;
pub use tools::ToolRouter;
pub use tools::error_result;
