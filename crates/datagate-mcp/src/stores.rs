// crates/datagate-mcp/src/stores.rs
// ============================================================================
// Module: Policy Input Stores
// Description: Async read interfaces for tenant configuration and capabilities.
// Purpose: Feed the catalog resolver without binding it to one backend.
// Dependencies: async-trait, datagate-core, datagate-store-sqlite, tokio
// ============================================================================

//! ## Overview
//! Configuration, installed capabilities, and tenant settings are owned by
//! external services; this crate only reads them. Each read is a suspension
//! point, so the interfaces are async. [`SqlitePolicyStore`] adapts the
//! synchronous `SQLite` store by moving each read onto the blocking pool.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use async_trait::async_trait;
use datagate_core::CapabilityGroup;
use datagate_core::CapabilityId;
use datagate_core::FeatureConfiguration;
use datagate_core::GroupConfig;
use datagate_core::TenantId;
use datagate_store_sqlite::SqliteStoreError;
use datagate_store_sqlite::SqliteTenantStore;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while reading policy inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreAccessError {
    /// Backing store failure.
    #[error("policy store error: {0}")]
    Store(String),
    /// Blocking read task failed to complete.
    #[error("policy store task failed: {0}")]
    Join(String),
}

impl From<SqliteStoreError> for StoreAccessError {
    fn from(err: SqliteStoreError) -> Self {
        Self::Store(err.to_string())
    }
}

// ============================================================================
// SECTION: Interfaces
// ============================================================================

/// Per-tenant capability group configuration.
#[async_trait]
pub trait FeatureConfigStore: Send + Sync {
    /// Returns one group's configuration, `None` when no record exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreAccessError`] when the read fails.
    async fn get(
        &self,
        tenant_id: &TenantId,
        group: CapabilityGroup,
    ) -> Result<Option<GroupConfig>, StoreAccessError>;

    /// Returns every group record for the tenant.
    ///
    /// # Errors
    ///
    /// Returns [`StoreAccessError`] when the read fails.
    async fn get_all(&self, tenant_id: &TenantId) -> Result<FeatureConfiguration, StoreAccessError>;
}

/// Externally installed capability packages.
#[async_trait]
pub trait InstalledCapabilities: Send + Sync {
    /// Returns true when the capability is installed for the tenant.
    ///
    /// # Errors
    ///
    /// Returns [`StoreAccessError`] when the read fails.
    async fn is_installed(
        &self,
        tenant_id: &TenantId,
        capability: &str,
    ) -> Result<bool, StoreAccessError>;

    /// Returns a snapshot of every installed capability.
    ///
    /// # Errors
    ///
    /// Returns [`StoreAccessError`] when the read fails.
    async fn installed(
        &self,
        tenant_id: &TenantId,
    ) -> Result<BTreeSet<CapabilityId>, StoreAccessError>;
}

/// Tenant-level settings consulted by the resolver.
#[async_trait]
pub trait TenantSettings: Send + Sync {
    /// Returns true when the tenant has a default datasource configured.
    ///
    /// # Errors
    ///
    /// Returns [`StoreAccessError`] when the read fails.
    async fn has_default_datasource(&self, tenant_id: &TenantId) -> Result<bool, StoreAccessError>;
}

// ============================================================================
// SECTION: SQLite Adapter
// ============================================================================

/// Async adapter over [`SqliteTenantStore`].
#[derive(Debug, Clone)]
pub struct SqlitePolicyStore {
    /// Shared tenant store.
    store: SqliteTenantStore,
}

impl SqlitePolicyStore {
    /// Wraps a tenant store.
    #[must_use]
    pub const fn new(store: SqliteTenantStore) -> Self {
        Self { store }
    }

    /// Runs a store read on the blocking pool.
    async fn read<T, F>(&self, read: F) -> Result<T, StoreAccessError>
    where
        T: Send + 'static,
        F: FnOnce(&SqliteTenantStore) -> Result<T, SqliteStoreError> + Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || read(&store))
            .await
            .map_err(|err| StoreAccessError::Join(err.to_string()))?
            .map_err(StoreAccessError::from)
    }
}

#[async_trait]
impl FeatureConfigStore for SqlitePolicyStore {
    async fn get(
        &self,
        tenant_id: &TenantId,
        group: CapabilityGroup,
    ) -> Result<Option<GroupConfig>, StoreAccessError> {
        let tenant_id = tenant_id.clone();
        self.read(move |store| store.group_config(&tenant_id, group)).await
    }

    async fn get_all(&self, tenant_id: &TenantId) -> Result<FeatureConfiguration, StoreAccessError> {
        let tenant_id = tenant_id.clone();
        self.read(move |store| store.feature_configuration(&tenant_id)).await
    }
}

#[async_trait]
impl InstalledCapabilities for SqlitePolicyStore {
    async fn is_installed(
        &self,
        tenant_id: &TenantId,
        capability: &str,
    ) -> Result<bool, StoreAccessError> {
        let tenant_id = tenant_id.clone();
        let capability = capability.to_string();
        self.read(move |store| store.is_installed(&tenant_id, &capability)).await
    }

    async fn installed(
        &self,
        tenant_id: &TenantId,
    ) -> Result<BTreeSet<CapabilityId>, StoreAccessError> {
        let tenant_id = tenant_id.clone();
        self.read(move |store| store.installed_capabilities(&tenant_id)).await
    }
}

#[async_trait]
impl TenantSettings for SqlitePolicyStore {
    async fn has_default_datasource(&self, tenant_id: &TenantId) -> Result<bool, StoreAccessError> {
        let tenant_id = tenant_id.clone();
        self.read(move |store| store.default_datasource(&tenant_id).map(|id| id.is_some())).await
    }
}
