//! Append-only audit log of past analyses
//!
//! Each analysis produces one [`AuditRecord`]. Records are written through an
//! [`AuditSink`] so the server can be given a JSON Lines file in production and
//! an in-memory log in tests.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::types::ContractAnalysis;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Audit log IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Audit record serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// One line of the audit log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// RFC 3339, UTC
    pub timestamp: String,
    pub filename: String,
    pub clause_count: usize,
    pub entity_count: usize,
    #[serde(default)]
    pub risk_count: usize,
    pub risk_score: u8,
    #[serde(default)]
    pub risk_level: String,
    pub contract_type: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub document_sha256: String,
}

impl AuditRecord {
    /// Summarize an analysis at the given time
    pub fn from_analysis(analysis: &ContractAnalysis, at: DateTime<Utc>) -> Self {
        Self {
            timestamp: at.to_rfc3339_opts(SecondsFormat::Secs, true),
            filename: analysis.filename.clone(),
            clause_count: analysis.clauses.len(),
            entity_count: analysis.entities.len(),
            risk_count: analysis.findings.len(),
            risk_score: analysis.risk.score,
            risk_level: analysis.risk.level.label().to_string(),
            contract_type: analysis.classification.contract_type.clone(),
            confidence: analysis.classification.confidence,
            document_sha256: analysis.document_sha256.clone(),
        }
    }

    /// Serialize as a single JSON line (no trailing newline)
    pub fn to_json_line(&self) -> Result<String, AuditError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Destination for audit records
pub trait AuditSink: Send + Sync {
    /// Append one record. A record is either fully written or not at all.
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError>;

    /// Up to `limit` most recent records, newest first
    fn recent(&self, limit: usize) -> Result<Vec<AuditRecord>, AuditError>;
}

/// JSON Lines audit log on disk
///
/// Appends are serialized through a mutex and each record is written with a
/// single `write_all` on a file opened in append mode.
#[derive(Debug)]
pub struct JsonlAuditLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlAuditLog {
    /// Open (or lazily create) the log at `path`, creating parent directories
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AuditError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for JsonlAuditLog {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let mut line = record.to_json_line()?;
        line.push('\n');

        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;

        tracing::debug!(path = %self.path.display(), filename = %record.filename, "audit record appended");
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<AuditRecord>, AuditError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AuditRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(line = line_no + 1, error = %e, "skipping malformed audit line")
                }
            }
        }

        Ok(records.into_iter().rev().take(limit).collect())
    }
}

/// In-memory audit log
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemoryAuditLog {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<AuditRecord>, AuditError> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        Ok(records.iter().rev().take(limit).cloned().collect())
    }
}

/// Compute SHA-256 hash of document bytes
pub fn hash_document(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: Document hash function is deterministic
        #[test]
        fn hash_document_deterministic(data in prop::collection::vec(any::<u8>(), 0..1024)) {
            let hash1 = hash_document(&data);
            let hash2 = hash_document(&data);
            prop_assert_eq!(&hash1, &hash2);
            prop_assert_eq!(hash1.len(), 64);
        }

        /// Property: recent(n) never returns more than n records
        #[test]
        fn recent_respects_limit(count in 0usize..30, limit in 0usize..40) {
            let log = MemoryAuditLog::new();
            for i in 0..count {
                log.append(&AuditRecord {
                    timestamp: format!("2026-01-01T00:00:{:02}Z", i % 60),
                    filename: format!("doc{}.txt", i),
                    clause_count: i,
                    entity_count: 0,
                    risk_count: 0,
                    risk_score: 0,
                    risk_level: "Low Risk".to_string(),
                    contract_type: "Unclassified".to_string(),
                    confidence: 0.0,
                    document_sha256: String::new(),
                }).unwrap();
            }
            let recent = log.recent(limit).unwrap();
            prop_assert_eq!(recent.len(), count.min(limit));
            if let Some(first) = recent.first() {
                prop_assert_eq!(first.clause_count, count - 1);
            }
        }
    }
}
