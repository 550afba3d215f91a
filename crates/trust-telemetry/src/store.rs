//! Durable snapshot persistence
//!
//! The engine persists a bounded snapshot of its own state (last 1000
//! metrics, 500 logs, 100 alerts) under a single key in a local sled
//! database. The snapshot is loaded once at startup and overwritten on
//! every mutation; saving is best-effort and must never fail the caller.

use std::path::Path;

use crate::error::Result;
use crate::types::{Alert, LogEntry, Metric};

/// Single key holding the serialized snapshot
const SNAPSHOT_KEY: &[u8] = b"observability_state";
/// Probe key used by the durable-storage health check
const PROBE_KEY: &[u8] = b"observability_probe";

/// Snapshot bounds
pub const SNAPSHOT_METRICS: usize = 1000;
pub const SNAPSHOT_LOGS: usize = 500;
pub const SNAPSHOT_ALERTS: usize = 100;

/// The persisted slice of engine state
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct StateSnapshot {
    pub metrics: Vec<Metric>,
    pub logs: Vec<LogEntry>,
    pub alerts: Vec<Alert>,
}

/// sled-backed store for the bounded observability snapshot
pub struct SnapshotStore {
    db: sled::Db,
}

impl SnapshotStore {
    /// Open (or create) the store at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Load the snapshot persisted by a previous run, if any.
    ///
    /// Corrupt or unreadable snapshots are logged and discarded rather than
    /// propagated; startup proceeds with empty state.
    pub fn load(&self) -> Option<StateSnapshot> {
        let bytes = match self.db.get(SNAPSHOT_KEY) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read observability snapshot");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(error = %e, "discarding corrupt observability snapshot");
                None
            }
        }
    }

    /// Overwrite the snapshot. Best-effort: failures are logged, never
    /// returned, so telemetry persistence can never break a write path.
    pub fn save(&self, snapshot: &StateSnapshot) {
        let bytes = match serde_json::to_vec(snapshot) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize observability snapshot");
                return;
            }
        };
        if let Err(e) = self.db.insert(SNAPSHOT_KEY, bytes) {
            tracing::warn!(error = %e, "failed to persist observability snapshot");
        }
    }

    /// Write-and-read probe used by the durable-storage health check
    pub fn is_available(&self) -> bool {
        let stamp = chrono::Utc::now().to_rfc3339();
        if self.db.insert(PROBE_KEY, stamp.as_bytes()).is_err() {
            return false;
        }
        matches!(self.db.get(PROBE_KEY), Ok(Some(_)))
    }

    /// Flush pending writes to disk
    pub fn flush(&self) {
        if let Err(e) = self.db.flush() {
            tracing::warn!(error = %e, "failed to flush observability store");
        }
    }
}
