// crates/datagate-store-sqlite/src/lib.rs
// ============================================================================
// Module: Datagate SQLite Store
// Description: SQLite persistence for tenant configuration and history.
// Purpose: Provide the durable store behind admission reads and audit writes.
// Dependencies: datagate-core, rusqlite, serde, serde_json
// ============================================================================

//! ## Overview
//! This crate stores capability group records, installed capabilities,
//! tenant settings, and the append-only execution history in a single
//! `SQLite` database.
//! Invariants:
//! - Every query is scoped by tenant identifier.
//! - History rows are append-only.
//!
//! Security posture: database contents are untrusted and re-validated on read.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::HistoryRecord;
pub use store::MAX_HISTORY_LIMIT;
pub use store::MAX_PAYLOAD_BYTES;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteTenantStore;
