//! Append-only action log.
//!
//! Components write through the `AuditSink` trait and never read back; the
//! in-memory sink retains a bounded window for the `/api/audit` endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;

/// One recorded action. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Record id
    pub id: String,
    /// Who performed the action
    pub actor: String,
    /// Action kind, e.g. "set_level"
    pub action: String,
    /// The pin acted on, if any
    pub pin: Option<u8>,
    /// Opaque action detail
    pub detail: serde_json::Value,
    /// When the action happened
    pub timestamp: DateTime<Utc>,
}

impl AuditRecord {
    /// Create a record stamped with the current time.
    pub fn new(
        actor: impl Into<String>,
        action: impl Into<String>,
        pin: Option<u8>,
        detail: serde_json::Value,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            actor: actor.into(),
            action: action.into(),
            pin,
            detail,
            timestamp: Utc::now(),
        }
    }
}

/// Write-only sink for audit records.
pub trait AuditSink: Send + Sync {
    /// Append a record. Must not fail the calling mutation.
    fn record(&self, record: AuditRecord);
}

/// In-memory audit sink retaining the most recent records.
pub struct MemoryAuditSink {
    records: Mutex<VecDeque<AuditRecord>>,
    capacity: usize,
}

impl MemoryAuditSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// The most recent records, newest first, up to `limit`.
    pub fn recent(&self, limit: usize) -> Vec<AuditRecord> {
        let records = self.records.lock().expect("audit lock poisoned");
        records.iter().rev().take(limit).cloned().collect()
    }

    /// Total records currently retained.
    pub fn len(&self) -> usize {
        self.records.lock().expect("audit lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryAuditSink {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, record: AuditRecord) {
        let mut records = self.records.lock().expect("audit lock poisoned");
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_recent_is_newest_first() {
        let sink = MemoryAuditSink::new(10);
        sink.record(AuditRecord::new("alice", "set_level", Some(17), json!({})));
        sink.record(AuditRecord::new("bob", "set_mode", Some(4), json!({})));

        let recent = sink.recent(10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].actor, "bob");
        assert_eq!(recent[1].actor, "alice");
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let sink = MemoryAuditSink::new(2);
        for i in 0..3u8 {
            sink.record(AuditRecord::new("alice", "set_level", Some(i), json!({})));
        }
        let recent = sink.recent(10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].pin, Some(2));
        assert_eq!(recent[1].pin, Some(1));
    }
}
