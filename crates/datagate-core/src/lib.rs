// crates/datagate-core/src/lib.rs
// ============================================================================
// Module: Datagate Core
// Description: Admission policy, error classification, and audit records.
// Purpose: Provide the pure model behind tenant-scoped tool admission.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Datagate Core defines the operation catalog, the per-tenant feature
//! configuration model, the admission resolver that decides which operations
//! a caller may list and invoke, the backend error classifier, and the audit
//! entry written for each execution.
//! Invariants:
//! - Listing and calling share one admission rule ([`policy::evaluate`]).
//! - Force mode only removes operations from a catalog.
//! - System failures are never classified as user-actionable.
//!
//! Security posture: tenant identifiers arrive from untrusted claims and are
//! validated by [`TenantId::parse`] before use.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::catalog::AI_DATA_LIAISON;
pub use crate::core::catalog::CapabilityGroup;
pub use crate::core::catalog::OPERATIONS;
pub use crate::core::catalog::OperationDescriptor;
pub use crate::core::catalog::OperationName;
pub use crate::core::catalog::SubOption;
pub use crate::core::catalog::SubOptionScope;
pub use crate::core::classify::ClassifiedError;
pub use crate::core::classify::DatabaseError;
pub use crate::core::classify::ErrorFamily;
pub use crate::core::classify::classify;
pub use crate::core::classify::classify_message;
pub use crate::core::classify::clean_message;
pub use crate::core::feature::FeatureConfiguration;
pub use crate::core::feature::GroupConfig;
pub use crate::core::feature::PolicyInputs;
pub use crate::core::history::AuditEntry;
pub use crate::core::history::HistoryQuery;
pub use crate::core::identifiers::CapabilityId;
pub use crate::core::identifiers::IdentifierError;
pub use crate::core::identifiers::IdentityClass;
pub use crate::core::identifiers::SubjectKind;
pub use crate::core::identifiers::TenantId;
pub use crate::core::policy::AdmissionDecision;
pub use crate::core::policy::DenialReason;
pub use crate::core::policy::admissible;
pub use crate::core::policy::catalog;
pub use crate::core::policy::evaluate;
pub use crate::core::policy::evaluate_named;
