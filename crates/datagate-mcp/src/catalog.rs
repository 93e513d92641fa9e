// crates/datagate-mcp/src/catalog.rs
// ============================================================================
// Module: Catalog Resolution
// Description: Loads policy inputs and resolves a caller's tool catalog.
// Purpose: Serve the listing path with the same rule the call path uses.
// Dependencies: datagate-core, tracing
// ============================================================================

//! ## Overview
//! [`CatalogResolver`] gathers one [`PolicyInputs`] snapshot per request from
//! the configuration, capability, and settings stores, then defers to
//! [`datagate_core::catalog`]. The admission gateway uses the same loader, so
//! listing and calling always see the same inputs for the same snapshot.
//!
//! Security posture: when inputs cannot be loaded the caller is treated as
//! unresolved and sees only the liveness probe.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use datagate_core::IdentityClass;
use datagate_core::OperationName;
use datagate_core::PolicyInputs;
use datagate_core::TenantId;
use datagate_core::catalog;
use datagate_store_sqlite::SqliteTenantStore;

use crate::stores::FeatureConfigStore;
use crate::stores::InstalledCapabilities;
use crate::stores::SqlitePolicyStore;
use crate::stores::StoreAccessError;
use crate::stores::TenantSettings;

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Loads policy inputs and resolves catalogs.
#[derive(Clone)]
pub struct CatalogResolver {
    /// Capability group configuration source.
    features: Arc<dyn FeatureConfigStore>,
    /// Installed capability source.
    capabilities: Arc<dyn InstalledCapabilities>,
    /// Tenant settings source.
    settings: Arc<dyn TenantSettings>,
}

impl CatalogResolver {
    /// Builds a resolver over explicit input sources.
    #[must_use]
    pub fn new(
        features: Arc<dyn FeatureConfigStore>,
        capabilities: Arc<dyn InstalledCapabilities>,
        settings: Arc<dyn TenantSettings>,
    ) -> Self {
        Self {
            features,
            capabilities,
            settings,
        }
    }

    /// Builds a resolver reading every input from one `SQLite` store.
    #[must_use]
    pub fn sqlite(store: SqliteTenantStore) -> Self {
        let adapter = Arc::new(SqlitePolicyStore::new(store));
        Self::new(adapter.clone(), adapter.clone(), adapter)
    }

    /// Loads the policy inputs visible for the tenant right now.
    ///
    /// # Errors
    ///
    /// Returns [`StoreAccessError`] when any input cannot be read.
    pub async fn load_inputs(&self, tenant_id: &TenantId) -> Result<PolicyInputs, StoreAccessError> {
        let features = self.features.get_all(tenant_id).await?;
        let installed = self.capabilities.installed(tenant_id).await?;
        let has_default_datasource = self.settings.has_default_datasource(tenant_id).await?;
        Ok(PolicyInputs::new(features, installed, has_default_datasource))
    }

    /// Resolves the admissible catalog for a caller.
    ///
    /// A missing tenant, or inputs that fail to load, resolve as an
    /// unresolved identity.
    pub async fn resolve_catalog(
        &self,
        identity: IdentityClass,
        tenant_id: Option<&TenantId>,
    ) -> Vec<OperationName> {
        let unresolved = || catalog(IdentityClass::Unresolved, &PolicyInputs::default());
        let Some(tenant_id) = tenant_id else {
            return unresolved();
        };
        if identity == IdentityClass::Unresolved {
            return unresolved();
        }
        match self.load_inputs(tenant_id).await {
            Ok(inputs) => catalog(identity, &inputs),
            Err(err) => {
                tracing::warn!(%tenant_id, error = %err, "policy inputs unavailable; listing liveness only");
                unresolved()
            }
        }
    }
}
