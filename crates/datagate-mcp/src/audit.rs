// crates/datagate-mcp/src/audit.rs
// ============================================================================
// Module: Admission and Compliance Audit Sinks
// Description: JSON-line event sinks for admission decisions and modifying
//              operations.
// Purpose: Emit structured audit records without hard logging dependencies.
// Dependencies: datagate-config, datagate-core, serde, sha2
// ============================================================================

//! ## Overview
//! Two event streams leave this crate. Admission events describe every
//! gateway decision. Compliance records duplicate each data-modifying
//! execution into a separate sink. Both serialize to one JSON object per line
//! so deployments can route them to their own pipeline.
//!
//! The file compliance sink chains each line to the previous one with
//! SHA-256, making truncation or in-place edits detectable.
//!
//! Security posture: events never carry credentials; compliance payloads are
//! bounded before they reach a sink.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use datagate_config::AdmissionEventsMode;
use datagate_config::AuditConfig;
use datagate_config::ComplianceMode;
use datagate_core::AuditEntry;
use datagate_core::IdentityClass;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Admission Events
// ============================================================================

/// Admission decision outcome label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionOutcome {
    /// The call was admitted.
    Admitted,
    /// The call was denied.
    Denied,
}

/// Admission decision audit event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdmissionEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Request identifier when provided.
    pub request_id: Option<String>,
    /// Tenant identifier as presented, when any.
    pub tenant_id: Option<String>,
    /// Requested operation name.
    pub operation: String,
    /// Identity class the decision was made for.
    pub identity: IdentityClass,
    /// Decision outcome.
    pub outcome: AdmissionOutcome,
    /// Stable denial code.
    pub code: Option<&'static str>,
    /// Human-readable denial message.
    pub message: Option<String>,
}

impl AdmissionEvent {
    /// Builds an admitted event.
    #[must_use]
    pub fn admitted(
        request_id: Option<String>,
        tenant_id: &str,
        operation: &str,
        identity: IdentityClass,
    ) -> Self {
        Self {
            event: "admission",
            timestamp_ms: now_ms(),
            request_id,
            tenant_id: Some(tenant_id.to_string()),
            operation: operation.to_string(),
            identity,
            outcome: AdmissionOutcome::Admitted,
            code: None,
            message: None,
        }
    }

    /// Builds a denied event.
    #[must_use]
    pub fn denied(
        request_id: Option<String>,
        tenant_id: Option<&str>,
        operation: &str,
        identity: IdentityClass,
        code: &'static str,
        message: String,
    ) -> Self {
        Self {
            event: "admission",
            timestamp_ms: now_ms(),
            request_id,
            tenant_id: tenant_id.map(ToString::to_string),
            operation: operation.to_string(),
            identity,
            outcome: AdmissionOutcome::Denied,
            code: Some(code),
            message: Some(message),
        }
    }
}

/// Admission audit sink interface.
pub trait AdmissionAuditSink: Send + Sync {
    /// Record an admission event.
    fn record(&self, event: &AdmissionEvent);
}

/// Admission sink that logs JSON lines to stderr.
pub struct AdmissionStderrSink;

impl AdmissionAuditSink for AdmissionStderrSink {
    fn record(&self, event: &AdmissionEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Admission sink that logs JSON lines to a file.
pub struct AdmissionFileSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl AdmissionFileSink {
    /// Opens the event log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AdmissionAuditSink for AdmissionFileSink {
    fn record(&self, event: &AdmissionEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op admission sink.
pub struct AdmissionNoopSink;

impl AdmissionAuditSink for AdmissionNoopSink {
    fn record(&self, _event: &AdmissionEvent) {}
}

// ============================================================================
// SECTION: Compliance Records
// ============================================================================

/// Compliance copy of one data-modifying execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceRecord {
    /// Event identifier.
    pub event: String,
    /// Tenant identifier.
    pub tenant_id: String,
    /// Operation wire name.
    pub operation: String,
    /// Named query or object reference.
    pub query_ref: Option<String>,
    /// Bounded request payload.
    pub payload: Value,
    /// Rows affected.
    pub affected_rows: Option<u64>,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Stable failure code.
    pub error_code: Option<String>,
    /// Completion time in unix milliseconds.
    pub created_at_ms: i64,
    /// Subject that initiated the call.
    pub initiated_by: Option<String>,
}

impl ComplianceRecord {
    /// Builds the compliance copy of an audit entry.
    #[must_use]
    pub fn from_entry(entry: &AuditEntry) -> Self {
        Self {
            event: "modifying_operation".to_string(),
            tenant_id: entry.tenant_id.as_str().to_string(),
            operation: entry.operation.clone(),
            query_ref: entry.query_ref.clone(),
            payload: entry.payload.clone(),
            affected_rows: entry.affected_rows,
            success: entry.success,
            error_code: entry.error_code.clone(),
            created_at_ms: entry.created_at_ms,
            initiated_by: entry.initiated_by.clone(),
        }
    }
}

/// Errors raised by compliance sinks.
#[derive(Debug, Error)]
pub enum ComplianceError {
    /// I/O error.
    #[error("compliance io error: {0}")]
    Io(String),
    /// Existing chain could not be parsed.
    #[error("compliance chain parse error: {0}")]
    Parse(String),
    /// Record could not be encoded.
    #[error("compliance encode error: {0}")]
    Encode(String),
}

/// Compliance sink interface.
pub trait ComplianceSink: Send + Sync {
    /// Record a compliance copy.
    ///
    /// # Errors
    ///
    /// Returns [`ComplianceError`] when the record could not be written.
    fn record(&self, record: &ComplianceRecord) -> Result<(), ComplianceError>;
}

/// Compliance sink that logs JSON lines to stderr.
pub struct ComplianceStderrSink;

impl ComplianceSink for ComplianceStderrSink {
    fn record(&self, record: &ComplianceRecord) -> Result<(), ComplianceError> {
        let payload =
            serde_json::to_string(record).map_err(|err| ComplianceError::Encode(err.to_string()))?;
        writeln!(std::io::stderr(), "{payload}").map_err(|err| ComplianceError::Io(err.to_string()))
    }
}

/// No-op compliance sink.
pub struct ComplianceNoopSink;

impl ComplianceSink for ComplianceNoopSink {
    fn record(&self, _record: &ComplianceRecord) -> Result<(), ComplianceError> {
        Ok(())
    }
}

// ============================================================================
// SECTION: Hash-Chained Compliance Log
// ============================================================================

/// Genesis value for an empty chain.
const CHAIN_GENESIS: &str = "0";

/// Hash-chained line envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainEnvelope {
    /// Embedded compliance payload.
    pub payload: Value,
    /// Hash of the previous line.
    pub prev_hash: String,
    /// Hash of `prev_hash` followed by the payload bytes.
    pub hash: String,
}

/// Append-only compliance log with hash chaining.
pub struct HashChainedComplianceSink {
    /// Open file handle for appending records.
    file: Mutex<std::fs::File>,
    /// Last recorded hash for chaining.
    last_hash: Mutex<String>,
}

impl HashChainedComplianceSink {
    /// Opens or creates a hash-chained compliance log.
    ///
    /// # Errors
    ///
    /// Returns [`ComplianceError`] when the file cannot be opened or an
    /// existing chain cannot be parsed.
    pub fn new(path: &Path) -> Result<Self, ComplianceError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)
            .map_err(|err| ComplianceError::Io(err.to_string()))?;
        let last_hash = load_last_hash(path)?;
        Ok(Self {
            file: Mutex::new(file),
            last_hash: Mutex::new(last_hash),
        })
    }
}

impl ComplianceSink for HashChainedComplianceSink {
    fn record(&self, record: &ComplianceRecord) -> Result<(), ComplianceError> {
        let payload =
            serde_json::to_value(record).map_err(|err| ComplianceError::Encode(err.to_string()))?;
        let mut hash_guard = self
            .last_hash
            .lock()
            .map_err(|_| ComplianceError::Io("chain state poisoned".to_string()))?;
        let prev_hash = hash_guard.clone();
        let hash = chain_hash(&prev_hash, &payload)?;
        let envelope = ChainEnvelope {
            payload,
            prev_hash,
            hash: hash.clone(),
        };
        let line =
            serde_json::to_string(&envelope).map_err(|err| ComplianceError::Encode(err.to_string()))?;
        let mut file =
            self.file.lock().map_err(|_| ComplianceError::Io("file handle poisoned".to_string()))?;
        writeln!(file, "{line}").map_err(|err| ComplianceError::Io(err.to_string()))?;
        file.flush().map_err(|err| ComplianceError::Io(err.to_string()))?;
        *hash_guard = hash;
        Ok(())
    }
}

/// Verifies every link of a hash-chained compliance log.
///
/// Returns the number of verified lines.
///
/// # Errors
///
/// Returns [`ComplianceError::Parse`] naming the first line that breaks the
/// chain.
pub fn verify_chain(path: &Path) -> Result<usize, ComplianceError> {
    let file = OpenOptions::new()
        .read(true)
        .open(path)
        .map_err(|err| ComplianceError::Io(err.to_string()))?;
    let mut expected_prev = CHAIN_GENESIS.to_string();
    let mut count = 0;
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|err| ComplianceError::Io(err.to_string()))?;
        if line.trim().is_empty() {
            continue;
        }
        let envelope: ChainEnvelope = serde_json::from_str(&line)
            .map_err(|err| ComplianceError::Parse(format!("line {}: {err}", index + 1)))?;
        if envelope.prev_hash != expected_prev
            || chain_hash(&envelope.prev_hash, &envelope.payload)? != envelope.hash
        {
            return Err(ComplianceError::Parse(format!("line {}: chain broken", index + 1)));
        }
        expected_prev = envelope.hash;
        count += 1;
    }
    Ok(count)
}

/// Loads the last hash from an existing log.
fn load_last_hash(path: &Path) -> Result<String, ComplianceError> {
    let file = OpenOptions::new()
        .read(true)
        .open(path)
        .map_err(|err| ComplianceError::Io(err.to_string()))?;
    let mut last_hash = CHAIN_GENESIS.to_string();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|err| ComplianceError::Io(err.to_string()))?;
        if line.trim().is_empty() {
            continue;
        }
        let envelope: ChainEnvelope =
            serde_json::from_str(&line).map_err(|err| ComplianceError::Parse(err.to_string()))?;
        last_hash = envelope.hash;
    }
    Ok(last_hash)
}

/// Computes `sha256(prev_hash || payload)` as lowercase hex.
fn chain_hash(prev_hash: &str, payload: &Value) -> Result<String, ComplianceError> {
    let payload_bytes =
        serde_json::to_vec(payload).map_err(|err| ComplianceError::Encode(err.to_string()))?;
    let mut hasher = Sha256::new();
    hasher.update(prev_hash.as_bytes());
    hasher.update(&payload_bytes);
    Ok(hex_encode(&hasher.finalize()))
}

/// Encodes bytes as lowercase hex.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(char::from(HEX[usize::from(byte >> 4)]));
        out.push(char::from(HEX[usize::from(byte & 0x0f)]));
    }
    out
}

// ============================================================================
// SECTION: Construction
// ============================================================================

/// Builds the admission sink selected by configuration.
///
/// # Errors
///
/// Returns an error when a file sink cannot be opened.
pub fn admission_sink_from_config(config: &AuditConfig) -> io::Result<Arc<dyn AdmissionAuditSink>> {
    match (config.admission_events, config.admission_events_path.as_deref()) {
        (AdmissionEventsMode::Stderr, _) => Ok(Arc::new(AdmissionStderrSink)),
        (AdmissionEventsMode::None, _) => Ok(Arc::new(AdmissionNoopSink)),
        (AdmissionEventsMode::File, Some(path)) => {
            Ok(Arc::new(AdmissionFileSink::new(Path::new(path))?))
        }
        (AdmissionEventsMode::File, None) => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "audit.admission_events_path required for file mode",
        )),
    }
}

/// Builds the compliance sink selected by configuration.
///
/// # Errors
///
/// Returns [`ComplianceError`] when a file sink cannot be opened.
pub fn compliance_sink_from_config(
    config: &AuditConfig,
) -> Result<Arc<dyn ComplianceSink>, ComplianceError> {
    match (config.compliance, config.compliance_path.as_deref()) {
        (ComplianceMode::None, _) => Ok(Arc::new(ComplianceNoopSink)),
        (ComplianceMode::Stderr, _) => Ok(Arc::new(ComplianceStderrSink)),
        (ComplianceMode::File, Some(path)) => {
            Ok(Arc::new(HashChainedComplianceSink::new(Path::new(path))?))
        }
        (ComplianceMode::File, None) => {
            Err(ComplianceError::Io("audit.compliance_path required for file mode".to_string()))
        }
    }
}

/// Returns the current time in unix milliseconds.
pub(crate) fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}
