// crates/datagate-mcp/tests/policy_store.rs
// ============================================================================
// Module: Policy Store Adapter Tests
// Description: Async reads through the SQLite policy store adapter.
// Purpose: Ensure the async seams return what the tenant store holds.
// Dependencies: datagate-core, datagate-mcp, datagate-store-sqlite, tempfile
// ============================================================================

//! ## Overview
//! Exercises [`SqlitePolicyStore`] through its async trait interfaces over a
//! real `SQLite` store in a temp directory.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use datagate_core::CapabilityGroup;
use datagate_core::CapabilityId;
use datagate_core::GroupConfig;
use datagate_core::SubOption;
use datagate_core::TenantId;
use datagate_mcp::FeatureConfigStore;
use datagate_mcp::InstalledCapabilities;
use datagate_mcp::SqlitePolicyStore;
use datagate_mcp::TenantSettings;
use datagate_store_sqlite::SqliteStoreConfig;
use datagate_store_sqlite::SqliteTenantStore;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn open_store(temp: &TempDir) -> SqliteTenantStore {
    SqliteTenantStore::open(SqliteStoreConfig::new(temp.path().join("datagate.db"))).unwrap()
}

fn tenant(raw: &str) -> TenantId {
    TenantId::parse(raw).unwrap()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[tokio::test]
async fn group_reads_match_stored_records() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp);
    let acme = tenant("acme");
    let config = GroupConfig::enabled().with_option(SubOption::EnableExecute);
    store.upsert_group_config(&acme, CapabilityGroup::DeveloperTools, &config).unwrap();
    let adapter = SqlitePolicyStore::new(store);

    let loaded = adapter.get(&acme, CapabilityGroup::DeveloperTools).await.unwrap();
    assert_eq!(loaded, Some(config.clone()));
    assert_eq!(adapter.get(&acme, CapabilityGroup::AgentTools).await.unwrap(), None);
    assert_eq!(adapter.get(&tenant("globex"), CapabilityGroup::DeveloperTools).await.unwrap(), None);

    let all = adapter.get_all(&acme).await.unwrap();
    assert_eq!(all.get(CapabilityGroup::DeveloperTools), Some(&config));
}

#[tokio::test]
async fn installed_capability_reads_are_tenant_scoped() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp);
    let acme = tenant("acme");
    store.install_capability(&acme, &CapabilityId::new("ai-data-liaison")).unwrap();
    let adapter = SqlitePolicyStore::new(store);

    assert!(adapter.is_installed(&acme, "ai-data-liaison").await.unwrap());
    assert!(!adapter.is_installed(&acme, "reporting").await.unwrap());
    assert!(!adapter.is_installed(&tenant("globex"), "ai-data-liaison").await.unwrap());
    assert_eq!(adapter.installed(&acme).await.unwrap().len(), 1);
}

#[tokio::test]
async fn default_datasource_presence_follows_settings() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp);
    let acme = tenant("acme");
    let adapter = SqlitePolicyStore::new(store.clone());
    assert!(!adapter.has_default_datasource(&acme).await.unwrap());
    store.set_default_datasource(&acme, Some("warehouse")).unwrap();
    assert!(adapter.has_default_datasource(&acme).await.unwrap());
    store.set_default_datasource(&acme, None).unwrap();
    assert!(!adapter.has_default_datasource(&acme).await.unwrap());
}
