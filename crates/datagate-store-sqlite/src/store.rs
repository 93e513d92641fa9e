// crates/datagate-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Tenant Store
// Description: Durable tenant configuration and execution history on SQLite.
// Purpose: Back the configuration reads and audit writes of the gateway.
// Dependencies: datagate-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`SqliteTenantStore`] persists four tables: capability group records,
//! installed capabilities, per-tenant settings, and the append-only
//! execution history. Every read and write is scoped by tenant identifier.
//! Rows that fail to parse are reported as corruption rather than skipped,
//! except feature rows for group names this build does not know.
//! Security posture: database contents are untrusted; stored identifiers
//! are re-validated on read.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use datagate_core::AuditEntry;
use datagate_core::CapabilityGroup;
use datagate_core::CapabilityId;
use datagate_core::FeatureConfiguration;
use datagate_core::GroupConfig;
use datagate_core::HistoryQuery;
use datagate_core::SubOption;
use datagate_core::TenantId;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Current schema version.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout in milliseconds.
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of history rows returned by one query.
pub const MAX_HISTORY_LIMIT: usize = 1_000;
/// Maximum stored payload size per history row.
pub const MAX_PAYLOAD_BYTES: usize = 1024 * 1024;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode.
    #[default]
    Wal,
    /// Delete journal mode.
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// Configuration for the `SQLite` tenant store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
}

impl SqliteStoreConfig {
    /// Builds a config for a path with default settings.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages avoid embedding raw history payloads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Stored rows could not be parsed.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid input or configuration.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// History row as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRecord {
    /// Row identifier, increasing with insertion order.
    pub id: i64,
    /// Recorded entry.
    #[serde(flatten)]
    pub entry: AuditEntry,
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed tenant store.
///
/// # Invariants
/// - `SQLite` connection access is serialized through a mutex.
/// - History rows are never updated or deleted through this API.
#[derive(Debug, Clone)]
pub struct SqliteTenantStore {
    /// Store configuration.
    config: SqliteStoreConfig,
    /// Shared connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteTenantStore {
    /// Opens or creates the store at the configured path.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the path is invalid, the database
    /// cannot be opened, or the schema version is unsupported.
    pub fn open(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(&config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            config,
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Returns the store configuration.
    #[must_use]
    pub const fn config(&self) -> &SqliteStoreConfig {
        &self.config
    }

    /// Checks that the database answers a trivial query.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database is unavailable.
    pub fn readiness(&self) -> Result<(), SqliteStoreError> {
        let guard = self.lock()?;
        guard
            .query_row("SELECT 1", params![], |row| row.get::<_, i64>(0))
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }

    /// Locks the shared connection.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection
            .lock()
            .map_err(|_| SqliteStoreError::Db("connection mutex poisoned".to_string()))
    }

    // ------------------------------------------------------------------------
    // Feature configuration
    // ------------------------------------------------------------------------

    /// Loads one capability group record.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails or the row is corrupt.
    pub fn group_config(
        &self,
        tenant_id: &TenantId,
        group: CapabilityGroup,
    ) -> Result<Option<GroupConfig>, SqliteStoreError> {
        let guard = self.lock()?;
        let row: Option<(bool, String, bool)> = guard
            .query_row(
                "SELECT enabled, options_json, force_mode FROM feature_configs
                 WHERE tenant_id = ?1 AND group_name = ?2",
                params![tenant_id.as_str(), group.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        drop(guard);
        row.map(|(enabled, options, force_mode)| build_group_config(enabled, &options, force_mode))
            .transpose()
    }

    /// Loads every capability group record for a tenant. Rows naming an
    /// unknown group are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails or a row is corrupt.
    pub fn feature_configuration(
        &self,
        tenant_id: &TenantId,
    ) -> Result<FeatureConfiguration, SqliteStoreError> {
        let guard = self.lock()?;
        let mut stmt = guard
            .prepare(
                "SELECT group_name, enabled, options_json, force_mode FROM feature_configs
                 WHERE tenant_id = ?1",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let rows = stmt
            .query_map(params![tenant_id.as_str()], |row| {
                let group: String = row.get(0)?;
                let enabled: bool = row.get(1)?;
                let options: String = row.get(2)?;
                let force_mode: bool = row.get(3)?;
                Ok((group, enabled, options, force_mode))
            })
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let mut features = FeatureConfiguration::new();
        for row in rows {
            let (group_raw, enabled, options, force_mode) =
                row.map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            // Rows for retired groups stay readable for the rest of the tenant.
            let Some(group) = CapabilityGroup::parse(&group_raw) else {
                continue;
            };
            features.insert(group, build_group_config(enabled, &options, force_mode)?);
        }
        Ok(features)
    }

    /// Inserts or replaces one capability group record.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the write fails.
    pub fn upsert_group_config(
        &self,
        tenant_id: &TenantId,
        group: CapabilityGroup,
        config: &GroupConfig,
    ) -> Result<(), SqliteStoreError> {
        let options: Vec<&str> = config.options.iter().map(|option| option.as_str()).collect();
        let options_json =
            serde_json::to_string(&options).map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO feature_configs
                     (tenant_id, group_name, enabled, options_json, force_mode, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT (tenant_id, group_name) DO UPDATE SET
                     enabled = excluded.enabled,
                     options_json = excluded.options_json,
                     force_mode = excluded.force_mode,
                     updated_at = excluded.updated_at",
                params![
                    tenant_id.as_str(),
                    group.as_str(),
                    config.enabled,
                    options_json,
                    config.force_mode,
                    unix_millis()
                ],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Installed capabilities
    // ------------------------------------------------------------------------

    /// Returns true when the capability is installed for the tenant.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails.
    pub fn is_installed(
        &self,
        tenant_id: &TenantId,
        capability: &str,
    ) -> Result<bool, SqliteStoreError> {
        let guard = self.lock()?;
        let found: Option<i64> = guard
            .query_row(
                "SELECT 1 FROM installed_capabilities WHERE tenant_id = ?1 AND capability_id = ?2",
                params![tenant_id.as_str(), capability],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(found.is_some())
    }

    /// Returns every installed capability for the tenant.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails or a row is corrupt.
    pub fn installed_capabilities(
        &self,
        tenant_id: &TenantId,
    ) -> Result<BTreeSet<CapabilityId>, SqliteStoreError> {
        let guard = self.lock()?;
        let mut stmt = guard
            .prepare("SELECT capability_id FROM installed_capabilities WHERE tenant_id = ?1")
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let rows = stmt
            .query_map(params![tenant_id.as_str()], |row| row.get::<_, String>(0))
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let mut installed = BTreeSet::new();
        for row in rows {
            let raw = row.map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let capability = CapabilityId::parse(&raw)
                .map_err(|err| SqliteStoreError::Corrupt(format!("capability id: {err}")))?;
            installed.insert(capability);
        }
        Ok(installed)
    }

    /// Records a capability as installed. Installing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the write fails.
    pub fn install_capability(
        &self,
        tenant_id: &TenantId,
        capability: &CapabilityId,
    ) -> Result<(), SqliteStoreError> {
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT OR IGNORE INTO installed_capabilities (tenant_id, capability_id, installed_at)
                 VALUES (?1, ?2, ?3)",
                params![tenant_id.as_str(), capability.as_str(), unix_millis()],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Tenant settings
    // ------------------------------------------------------------------------

    /// Returns the tenant's default datasource identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails.
    pub fn default_datasource(&self, tenant_id: &TenantId) -> Result<Option<String>, SqliteStoreError> {
        let guard = self.lock()?;
        let value: Option<Option<String>> = guard
            .query_row(
                "SELECT default_datasource_id FROM tenant_settings WHERE tenant_id = ?1",
                params![tenant_id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(value.flatten())
    }

    /// Sets or clears the tenant's default datasource.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the identifier is blank or the write fails.
    pub fn set_default_datasource(
        &self,
        tenant_id: &TenantId,
        datasource_id: Option<&str>,
    ) -> Result<(), SqliteStoreError> {
        if datasource_id.is_some_and(|id| id.trim().is_empty()) {
            return Err(SqliteStoreError::Invalid("datasource id must be non-empty".to_string()));
        }
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO tenant_settings (tenant_id, default_datasource_id) VALUES (?1, ?2)
                 ON CONFLICT (tenant_id) DO UPDATE SET
                     default_datasource_id = excluded.default_datasource_id",
                params![tenant_id.as_str(), datasource_id.map(str::trim)],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Execution history
    // ------------------------------------------------------------------------

    /// Appends one history row and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the payload exceeds
    /// [`MAX_PAYLOAD_BYTES`] or the write fails.
    pub fn append_history(&self, entry: &AuditEntry) -> Result<i64, SqliteStoreError> {
        let payload =
            serde_json::to_vec(&entry.payload).map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        if payload.len() > MAX_PAYLOAD_BYTES {
            return Err(SqliteStoreError::Invalid(format!(
                "history payload exceeds size limit: {} bytes (max {MAX_PAYLOAD_BYTES})",
                payload.len()
            )));
        }
        let row_count = entry.row_count.map(to_sql_count).transpose()?;
        let affected_rows = entry.affected_rows.map(to_sql_count).transpose()?;
        let duration_ms = to_sql_count(entry.duration_ms)?;
        let created_at_ms = if entry.created_at_ms > 0 { entry.created_at_ms } else { unix_millis() };
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO tool_history (
                     tenant_id, operation, query_ref, payload_json, row_count, affected_rows,
                     duration_ms, is_modifying, success, error_message, error_code,
                     created_at_ms, initiated_by
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    entry.tenant_id.as_str(),
                    entry.operation,
                    entry.query_ref,
                    payload,
                    row_count,
                    affected_rows,
                    duration_ms,
                    entry.modifying,
                    entry.success,
                    entry.error_message,
                    entry.error_code,
                    created_at_ms,
                    entry.initiated_by,
                ],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(guard.last_insert_rowid())
    }

    /// Returns history rows for a tenant, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the limit is out of range, the query
    /// fails, or a row is corrupt.
    pub fn recent_history(
        &self,
        tenant_id: &TenantId,
        query: &HistoryQuery,
    ) -> Result<Vec<HistoryRecord>, SqliteStoreError> {
        if query.limit == 0 || query.limit > MAX_HISTORY_LIMIT {
            return Err(SqliteStoreError::Invalid(format!(
                "history limit must be between 1 and {MAX_HISTORY_LIMIT}"
            )));
        }
        let limit = i64::try_from(query.limit)
            .map_err(|_| SqliteStoreError::Invalid("history limit out of range".to_string()))?;
        let guard = self.lock()?;
        let mut stmt = guard
            .prepare(
                "SELECT id, operation, query_ref, payload_json, row_count, affected_rows,
                        duration_ms, is_modifying, success, error_message, error_code,
                        created_at_ms, initiated_by
                 FROM tool_history
                 WHERE tenant_id = ?1
                   AND (?2 IS NULL OR operation = ?2)
                   AND (?3 = 0 OR success = 0)
                 ORDER BY id DESC
                 LIMIT ?4",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let rows = stmt
            .query_map(
                params![tenant_id.as_str(), query.operation, query.failures_only, limit],
                |row| {
                    Ok(RawHistoryRow {
                        id: row.get(0)?,
                        operation: row.get(1)?,
                        query_ref: row.get(2)?,
                        payload: row.get(3)?,
                        row_count: row.get(4)?,
                        affected_rows: row.get(5)?,
                        duration_ms: row.get(6)?,
                        modifying: row.get(7)?,
                        success: row.get(8)?,
                        error_message: row.get(9)?,
                        error_code: row.get(10)?,
                        created_at_ms: row.get(11)?,
                        initiated_by: row.get(12)?,
                    })
                },
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let mut records = Vec::new();
        for row in rows {
            let raw = row.map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            records.push(raw.into_record(tenant_id.clone())?);
        }
        Ok(records)
    }
}

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

/// History row columns before validation.
struct RawHistoryRow {
    /// Row identifier.
    id: i64,
    /// Operation wire name.
    operation: String,
    /// Optional query reference.
    query_ref: Option<String>,
    /// Serialized payload bytes.
    payload: Vec<u8>,
    /// Rows returned.
    row_count: Option<i64>,
    /// Rows affected.
    affected_rows: Option<i64>,
    /// Duration in milliseconds.
    duration_ms: i64,
    /// Modifying flag.
    modifying: bool,
    /// Success flag.
    success: bool,
    /// Failure message.
    error_message: Option<String>,
    /// Failure code.
    error_code: Option<String>,
    /// Completion time.
    created_at_ms: i64,
    /// Initiating subject.
    initiated_by: Option<String>,
}

impl RawHistoryRow {
    /// Validates the row and converts it into a record.
    fn into_record(self, tenant_id: TenantId) -> Result<HistoryRecord, SqliteStoreError> {
        let payload = serde_json::from_slice(&self.payload)
            .map_err(|err| SqliteStoreError::Corrupt(format!("history payload: {err}")))?;
        Ok(HistoryRecord {
            id: self.id,
            entry: AuditEntry {
                tenant_id,
                operation: self.operation,
                query_ref: self.query_ref,
                payload,
                row_count: self.row_count.map(from_sql_count).transpose()?,
                affected_rows: self.affected_rows.map(from_sql_count).transpose()?,
                duration_ms: from_sql_count(self.duration_ms)?,
                modifying: self.modifying,
                success: self.success,
                error_message: self.error_message,
                error_code: self.error_code,
                created_at_ms: self.created_at_ms,
                initiated_by: self.initiated_by,
            },
        })
    }
}

/// Builds a group record from stored columns.
fn build_group_config(
    enabled: bool,
    options_json: &str,
    force_mode: bool,
) -> Result<GroupConfig, SqliteStoreError> {
    let names: Vec<String> = serde_json::from_str(options_json)
        .map_err(|err| SqliteStoreError::Corrupt(format!("options_json: {err}")))?;
    let mut options = BTreeSet::new();
    for name in names {
        let option = SubOption::parse(&name)
            .ok_or_else(|| SqliteStoreError::Corrupt(format!("unknown sub-option: {name}")))?;
        options.insert(option);
    }
    Ok(GroupConfig {
        enabled,
        options,
        force_mode,
    })
}

/// Converts a count into its stored representation.
fn to_sql_count(value: u64) -> Result<i64, SqliteStoreError> {
    i64::try_from(value).map_err(|_| SqliteStoreError::Invalid("count exceeds i64 range".to_string()))
}

/// Converts a stored count back into its unsigned form.
fn from_sql_count(value: i64) -> Result<u64, SqliteStoreError> {
    u64::try_from(value).map_err(|_| SqliteStoreError::Corrupt("negative stored count".to_string()))
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    if path.display().to_string().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with the configured pragmas.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(connection)
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS feature_configs (
                    tenant_id TEXT NOT NULL,
                    group_name TEXT NOT NULL,
                    enabled INTEGER NOT NULL,
                    options_json TEXT NOT NULL,
                    force_mode INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL,
                    PRIMARY KEY (tenant_id, group_name)
                );
                CREATE TABLE IF NOT EXISTS installed_capabilities (
                    tenant_id TEXT NOT NULL,
                    capability_id TEXT NOT NULL,
                    installed_at INTEGER NOT NULL,
                    PRIMARY KEY (tenant_id, capability_id)
                );
                CREATE TABLE IF NOT EXISTS tenant_settings (
                    tenant_id TEXT PRIMARY KEY,
                    default_datasource_id TEXT
                );
                CREATE TABLE IF NOT EXISTS tool_history (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    tenant_id TEXT NOT NULL,
                    operation TEXT NOT NULL,
                    query_ref TEXT,
                    payload_json BLOB NOT NULL,
                    row_count INTEGER,
                    affected_rows INTEGER,
                    duration_ms INTEGER NOT NULL,
                    is_modifying INTEGER NOT NULL,
                    success INTEGER NOT NULL,
                    error_message TEXT,
                    error_code TEXT,
                    created_at_ms INTEGER NOT NULL,
                    initiated_by TEXT
                );
                CREATE INDEX IF NOT EXISTS idx_tool_history_tenant
                    ON tool_history (tenant_id, id);",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Returns the current unix epoch in milliseconds.
fn unix_millis() -> i64 {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}
