// crates/datagate-core/src/core/mod.rs
// ============================================================================
// Module: Datagate Core Model
// Description: Catalog, policy, classification, and history types.
// Purpose: Group the pure admission and audit model.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Deterministic building blocks with no I/O. Everything here can be
//! evaluated from a configuration snapshot alone.

pub mod catalog;
pub mod classify;
pub mod feature;
pub mod history;
pub mod identifiers;
pub mod policy;
