// crates/datagate-mcp/src/session.rs
// ============================================================================
// Module: Tenant Sessions
// Description: Bounded, tenant-scoped data access sessions.
// Purpose: Acquire and release one session per admitted request.
// Dependencies: datagate-core, datagate-store-sqlite, tokio
// ============================================================================

//! ## Overview
//! A [`TenantSession`] is the request's handle on tenant-scoped storage. The
//! [`SqliteSessionProvider`] bounds how many sessions may be open at once with
//! a semaphore; waiting on that semaphore is the pool wait.
//!
//! ## Invariants
//! - A session holds exactly one permit until released.
//! - [`TenantSession::release`] is idempotent and `Drop` releases too, so an
//!   abandoned admission future never leaks a permit.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use datagate_core::TenantId;
use datagate_store_sqlite::SqliteTenantStore;
use thiserror::Error;
use tokio::sync::OwnedSemaphorePermit;
use tokio::sync::Semaphore;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while opening a tenant session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The session pool was closed.
    #[error("session pool closed")]
    Closed,
    /// No session became available in time.
    #[error("session acquisition timed out after {0} ms")]
    Timeout(u128),
    /// The backing store refused the session.
    #[error("session store error: {0}")]
    Store(String),
}

// ============================================================================
// SECTION: Session Handle
// ============================================================================

/// Tenant-scoped session owned by one request.
#[derive(Debug)]
pub struct TenantSession {
    /// Tenant the session is scoped to.
    tenant_id: TenantId,
    /// Store handle for tenant-scoped reads and writes.
    store: SqliteTenantStore,
    /// Pool permit, `None` once released.
    permit: Option<OwnedSemaphorePermit>,
}

impl TenantSession {
    /// Wraps a store handle and pool permit into a session.
    #[must_use]
    pub const fn new(
        tenant_id: TenantId,
        store: SqliteTenantStore,
        permit: OwnedSemaphorePermit,
    ) -> Self {
        Self {
            tenant_id,
            store,
            permit: Some(permit),
        }
    }

    /// Returns the tenant this session is scoped to.
    #[must_use]
    pub const fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    /// Returns the tenant store handle.
    #[must_use]
    pub const fn store(&self) -> &SqliteTenantStore {
        &self.store
    }

    /// Returns true until the session is released.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.permit.is_some()
    }

    /// Returns the session's permit to the pool.
    ///
    /// Returns true only on the call that actually released it.
    pub fn release(&mut self) -> bool {
        if self.permit.take().is_some() {
            tracing::trace!(tenant_id = %self.tenant_id, "tenant session released");
            return true;
        }
        false
    }
}

impl Drop for TenantSession {
    fn drop(&mut self) {
        self.release();
    }
}

// ============================================================================
// SECTION: Provider Interface
// ============================================================================

/// Opens tenant-scoped sessions.
#[async_trait]
pub trait TenantSessionProvider: Send + Sync {
    /// Opens a session for the tenant.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when no session can be opened.
    async fn open(&self, tenant_id: &TenantId) -> Result<TenantSession, SessionError>;
}

// ============================================================================
// SECTION: SQLite Provider
// ============================================================================

/// Session provider backed by a shared `SQLite` tenant store.
#[derive(Debug, Clone)]
pub struct SqliteSessionProvider {
    /// Shared tenant store.
    store: SqliteTenantStore,
    /// Pool bounding concurrent sessions.
    semaphore: Arc<Semaphore>,
    /// Maximum wait for a free session.
    acquire_timeout: Duration,
}

impl SqliteSessionProvider {
    /// Builds a provider allowing `max_sessions` concurrent sessions.
    #[must_use]
    pub fn new(store: SqliteTenantStore, max_sessions: usize, acquire_timeout: Duration) -> Self {
        Self {
            store,
            semaphore: Arc::new(Semaphore::new(max_sessions)),
            acquire_timeout,
        }
    }

    /// Returns the shared store handle.
    #[must_use]
    pub const fn store(&self) -> &SqliteTenantStore {
        &self.store
    }

    /// Returns the number of sessions that could be opened right now.
    #[must_use]
    pub fn available_sessions(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Closes the pool; pending and future opens fail.
    pub fn close(&self) {
        self.semaphore.close();
    }
}

#[async_trait]
impl TenantSessionProvider for SqliteSessionProvider {
    async fn open(&self, tenant_id: &TenantId) -> Result<TenantSession, SessionError> {
        let acquire = Arc::clone(&self.semaphore).acquire_owned();
        let permit = tokio::time::timeout(self.acquire_timeout, acquire)
            .await
            .map_err(|_| SessionError::Timeout(self.acquire_timeout.as_millis()))?
            .map_err(|_| SessionError::Closed)?;
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || store.readiness())
            .await
            .map_err(|err| SessionError::Store(format!("readiness join failed: {err}")))?
            .map_err(|err| SessionError::Store(err.to_string()))?;
        Ok(TenantSession::new(tenant_id.clone(), self.store.clone(), permit))
    }
}
