//! Diagnostics journal: one JSONL line per completed prediction cycle.
//!
//! The user only ever sees a generic failure message. The classified cause
//! (transport error text, rejected status and body, shape error) is
//! recorded here instead, together with latency and the headline figures of
//! successful cycles. Writes are best-effort: a journal that cannot be
//! written never affects the cycle itself.

use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::client::{PredictError, PredictionResult};

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// A single journal line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleLogEntry {
    pub timestamp: String,
    /// Identifies the runtime that produced the entry; unique per run.
    #[serde(default)]
    pub session_id: String,
    /// Ticket number of the cycle. Only unique within `session_id`.
    pub request_id: u64,
    /// `"success"` or `"failure"`.
    pub outcome: String,
    pub endpoint: String,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub crop_type: Option<String>,
    /// Failure kind (`transport`, `server_rejected`, `malformed_response`).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub failure_kind: Option<String>,
    /// Internal failure cause. Never shown to the user.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cause: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub yield_per_hectare: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub total_yield: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub yield_unit: Option<String>,
}

impl CycleLogEntry {
    /// Build an entry for a completed cycle.
    pub fn completed(
        session_id: &str,
        request_id: u64,
        endpoint: &str,
        latency_ms: u64,
        crop_type: Option<&str>,
        outcome: &Result<PredictionResult, PredictError>,
    ) -> Self {
        let mut entry = Self {
            timestamp: Utc::now().to_rfc3339(),
            session_id: session_id.to_string(),
            request_id,
            outcome: String::new(),
            endpoint: endpoint.to_string(),
            latency_ms,
            crop_type: crop_type.map(str::to_string),
            failure_kind: None,
            cause: None,
            yield_per_hectare: None,
            total_yield: None,
            yield_unit: None,
        };

        match outcome {
            Ok(result) => {
                entry.outcome = "success".to_string();
                entry.yield_per_hectare = Some(result.yield_per_hectare);
                entry.total_yield = Some(result.total_yield);
                entry.yield_unit = Some(result.yield_unit.clone());
            }
            Err(err) => {
                entry.outcome = "failure".to_string();
                entry.failure_kind = Some(err.kind().to_string());
                entry.cause = Some(err.to_string());
            }
        }

        entry
    }

    pub fn is_success(&self) -> bool {
        self.outcome == "success"
    }
}

/// A fresh session identifier: start time, process id and an in-process
/// counter, so runs sharing one journal never collide.
pub fn new_session_id() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!(
        "{}-{}-{n}",
        Utc::now().format("%Y%m%dT%H%M%S%.3fZ"),
        std::process::id()
    )
}

// ---------------------------------------------------------------------------
// Journal
// ---------------------------------------------------------------------------

/// Append-only JSONL file of cycle entries.
#[derive(Debug, Clone)]
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    /// Journal at `~/.yieldcast/prediction-log.jsonl`, if a home directory
    /// is known.
    pub fn default_location() -> Option<Self> {
        default_log_path().map(Self::at)
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry, creating the file and its directory as needed.
    pub fn append(&self, entry: &CycleLogEntry) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let json = serde_json::to_string(entry)?;
        writeln!(file, "{json}")?;

        Ok(())
    }

    /// All readable entries. Malformed lines are skipped; a missing file
    /// reads as empty.
    pub fn read_all(&self) -> Vec<CycleLogEntry> {
        let Ok(file) = fs::File::open(&self.path) else {
            return Vec::new();
        };

        BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .filter_map(|line| serde_json::from_str::<CycleLogEntry>(&line).ok())
            .collect()
    }

    /// Entries from the last `days` days, or all entries for `None`.
    pub fn read_since_days(&self, days: Option<u32>) -> Vec<CycleLogEntry> {
        let entries = self.read_all();

        let Some(days) = days else {
            return entries;
        };

        let cutoff = (Utc::now() - chrono::Duration::days(i64::from(days))).to_rfc3339();
        entries
            .into_iter()
            .filter(|e| e.timestamp >= cutoff)
            .collect()
    }
}

/// Default journal path.
pub fn default_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".yieldcast").join("prediction-log.jsonl"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
