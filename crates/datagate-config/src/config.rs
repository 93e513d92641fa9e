// crates/datagate-config/src/config.rs
// ============================================================================
// Module: Datagate Configuration
// Description: Configuration loading and validation for Datagate.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: datagate-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section has defaults, so an empty file is valid. Invalid values fail
//! closed rather than being clamped.
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use std::time::SystemTime;

use datagate_store_sqlite::MAX_PAYLOAD_BYTES;
use datagate_store_sqlite::SqliteStoreConfig;
use datagate_store_sqlite::SqliteStoreMode;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "datagate.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "DATAGATE_CONFIG";
/// Maximum configuration file size in bytes.
const MAX_CONFIG_FILE_SIZE: usize = 256 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default store filename.
const DEFAULT_STORE_PATH: &str = "datagate.db";
/// Default busy timeout for the store.
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Default number of concurrent tenant sessions.
const DEFAULT_MAX_SESSIONS: usize = 16;
/// Maximum number of concurrent tenant sessions.
pub const MAX_SESSIONS_LIMIT: usize = 1_024;
/// Default session acquisition timeout.
const DEFAULT_SESSION_ACQUIRE_TIMEOUT_MS: u64 = 2_000;
/// Maximum session acquisition timeout.
const MAX_SESSION_ACQUIRE_TIMEOUT_MS: u64 = 60_000;
/// Default audit write timeout.
const DEFAULT_AUDIT_WRITE_TIMEOUT_MS: u64 = 5_000;
/// Minimum audit write timeout.
pub const MIN_AUDIT_WRITE_TIMEOUT_MS: u64 = 100;
/// Maximum audit write timeout.
pub const MAX_AUDIT_WRITE_TIMEOUT_MS: u64 = 30_000;
/// Default audit payload snapshot cap.
const DEFAULT_AUDIT_MAX_PAYLOAD_BYTES: usize = 16 * 1024;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Datagate configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatagateConfig {
    /// Tenant store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Admission gateway configuration.
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Audit and event sink configuration.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Optional config source metadata (not serialized).
    #[serde(skip)]
    pub source_modified_at: Option<SystemTime>,
}

impl DatagateConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config = Self::from_toml(content)?;
        config.source_modified_at = fs::metadata(&resolved).and_then(|meta| meta.modified()).ok();
        Ok(config)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.store.validate()?;
        self.gateway.validate()?;
        self.audit.validate()?;
        Ok(())
    }
}

/// Tenant store configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// `SQLite` database path.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// Maximum number of concurrently open tenant sessions.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            max_sessions: default_max_sessions(),
        }
    }
}

impl StoreConfig {
    /// Validates store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("store.path", &self.path.to_string_lossy())?;
        if self.busy_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "store.busy_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.max_sessions == 0 || self.max_sessions > MAX_SESSIONS_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "store.max_sessions must be between 1 and {MAX_SESSIONS_LIMIT}"
            )));
        }
        Ok(())
    }

    /// Builds the `SQLite` store configuration.
    #[must_use]
    pub fn sqlite_config(&self) -> SqliteStoreConfig {
        SqliteStoreConfig {
            path: self.path.clone(),
            busy_timeout_ms: self.busy_timeout_ms,
            journal_mode: self.journal_mode,
        }
    }
}

/// Admission gateway configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Maximum wait for a tenant session, in milliseconds.
    #[serde(default = "default_session_acquire_timeout_ms")]
    pub session_acquire_timeout_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            session_acquire_timeout_ms: default_session_acquire_timeout_ms(),
        }
    }
}

impl GatewayConfig {
    /// Validates gateway configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_timeout_range(
            "gateway.session_acquire_timeout_ms",
            self.session_acquire_timeout_ms,
            1,
            MAX_SESSION_ACQUIRE_TIMEOUT_MS,
        )
    }

    /// Returns the session acquisition timeout.
    #[must_use]
    pub const fn session_acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.session_acquire_timeout_ms)
    }
}

/// Destination for admission decision events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionEventsMode {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to a file.
    File,
    /// Events are discarded.
    None,
}

/// Destination for compliance records of modifying operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceMode {
    /// Compliance records are discarded.
    #[default]
    None,
    /// JSON lines on stderr.
    Stderr,
    /// Hash-chained JSON lines appended to a file.
    File,
}

/// Audit and event sink configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Timeout for one background history write, in milliseconds.
    #[serde(default = "default_audit_write_timeout_ms")]
    pub write_timeout_ms: u64,
    /// Maximum serialized payload snapshot kept per history entry.
    #[serde(default = "default_audit_max_payload_bytes")]
    pub max_payload_bytes: usize,
    /// Admission event destination.
    #[serde(default)]
    pub admission_events: AdmissionEventsMode,
    /// Admission event file path when `admission_events = "file"`.
    #[serde(default)]
    pub admission_events_path: Option<String>,
    /// Compliance record destination.
    #[serde(default)]
    pub compliance: ComplianceMode,
    /// Compliance file path when `compliance = "file"`.
    #[serde(default)]
    pub compliance_path: Option<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            write_timeout_ms: default_audit_write_timeout_ms(),
            max_payload_bytes: default_audit_max_payload_bytes(),
            admission_events: AdmissionEventsMode::default(),
            admission_events_path: None,
            compliance: ComplianceMode::default(),
            compliance_path: None,
        }
    }
}

impl AuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_timeout_range(
            "audit.write_timeout_ms",
            self.write_timeout_ms,
            MIN_AUDIT_WRITE_TIMEOUT_MS,
            MAX_AUDIT_WRITE_TIMEOUT_MS,
        )?;
        if self.max_payload_bytes == 0 || self.max_payload_bytes > MAX_PAYLOAD_BYTES {
            return Err(ConfigError::Invalid(format!(
                "audit.max_payload_bytes must be between 1 and {MAX_PAYLOAD_BYTES}"
            )));
        }
        validate_sink_path(
            "audit.admission_events_path",
            self.admission_events == AdmissionEventsMode::File,
            self.admission_events_path.as_deref(),
        )?;
        validate_sink_path(
            "audit.compliance_path",
            self.compliance == ComplianceMode::File,
            self.compliance_path.as_deref(),
        )?;
        Ok(())
    }

    /// Returns the background write timeout.
    #[must_use]
    pub const fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a sink path against its mode.
fn validate_sink_path(field: &str, file_mode: bool, path: Option<&str>) -> Result<(), ConfigError> {
    match (file_mode, path) {
        (true, None) => Err(ConfigError::Invalid(format!("{field} is required for file mode"))),
        (true, Some(path)) => validate_path_string(field, path),
        (false, Some(_)) => Err(ConfigError::Invalid(format!("{field} is only valid for file mode"))),
        (false, None) => Ok(()),
    }
}

/// Validates a millisecond value against an inclusive range.
fn validate_timeout_range(
    field: &str,
    value_ms: u64,
    min_ms: u64,
    max_ms: u64,
) -> Result<(), ConfigError> {
    if value_ms < min_ms || value_ms > max_ms {
        return Err(ConfigError::Invalid(format!(
            "{field} must be between {min_ms} and {max_ms} milliseconds",
        )));
    }
    Ok(())
}

/// Default store path.
fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_PATH)
}

/// Default store busy timeout.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Default session pool size.
const fn default_max_sessions() -> usize {
    DEFAULT_MAX_SESSIONS
}

/// Default session acquisition timeout.
const fn default_session_acquire_timeout_ms() -> u64 {
    DEFAULT_SESSION_ACQUIRE_TIMEOUT_MS
}

/// Default audit write timeout.
const fn default_audit_write_timeout_ms() -> u64 {
    DEFAULT_AUDIT_WRITE_TIMEOUT_MS
}

/// Default audit payload snapshot cap.
const fn default_audit_max_payload_bytes() -> usize {
    DEFAULT_AUDIT_MAX_PAYLOAD_BYTES
}
