// crates/datagate-config/src/lib.rs
// ============================================================================
// Module: Datagate Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for datagate.toml semantics.
// Dependencies: datagate-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `datagate-config` defines the configuration model for the store, the
//! admission gateway, and the audit sinks. Validation is strict and fails
//! closed.
//!
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
