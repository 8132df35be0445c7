//! Audit trail of recorded movements.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entry::{EntryKind, LedgerEntry};

/// One line of the audit trail, written alongside every ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub action: EntryKind,
    pub details: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn for_entry(entry: &LedgerEntry, recorded_at: DateTime<Utc>) -> serde_json::Result<Self> {
        Ok(Self {
            id: Uuid::now_v7(),
            action: entry.kind(),
            details: entry.details()?,
            recorded_at,
        })
    }
}
