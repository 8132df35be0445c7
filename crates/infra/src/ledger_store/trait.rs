use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use armory_core::{AssetTypeId, BaseId, EntryId};
use armory_ledger::{
    AssetType, AuditRecord, Base, BalanceFilter, EntryKind, EntryQuery, LedgerEntry, Movement,
};

use super::query::Pagination;

/// Ledger storage error.
///
/// These are **infrastructure errors** as opposed to domain errors (validation).
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated (e.g. duplicate base name).
    #[error("conflict: {0}")]
    Conflict(String),

    /// An entry referenced a base or asset type that does not exist.
    #[error("unknown reference: {0}")]
    UnknownReference(String),

    /// A stored record could not be decoded into a domain value.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// The backend failed (connection, lock poisoning, ...).
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Reference data: bases and asset types.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn create_base(&self, base: Base) -> Result<Base, StoreError>;
    /// All bases ordered by name.
    async fn list_bases(&self) -> Result<Vec<Base>, StoreError>;
    async fn get_base(&self, id: BaseId) -> Result<Option<Base>, StoreError>;

    async fn create_asset_type(&self, asset_type: AssetType) -> Result<AssetType, StoreError>;
    /// All asset types ordered by name.
    async fn list_asset_types(&self) -> Result<Vec<AssetType>, StoreError>;
    async fn get_asset_type(&self, id: AssetTypeId) -> Result<Option<AssetType>, StoreError>;
}

/// Append-only ledger of recorded movements.
///
/// Implementations must:
/// - reject entries referencing unknown bases or asset types
/// - write the entry and its audit record atomically
/// - never update or delete a recorded entry
/// - treat an empty match set as a zero sum
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Record a new entry and its audit record.
    async fn append(&self, entry: LedgerEntry) -> Result<LedgerEntry, StoreError>;

    /// Entries of one kind matching `query`, newest date first.
    async fn list_entries(&self, kind: EntryKind, query: &EntryQuery) -> Result<Vec<LedgerEntry>, StoreError>;

    async fn get_entry(&self, kind: EntryKind, id: EntryId) -> Result<Option<LedgerEntry>, StoreError>;

    /// Sum of quantities counting toward `movement` under `filter`.
    async fn sum(&self, movement: Movement, filter: &BalanceFilter) -> Result<i64, StoreError>;

    /// Audit records, newest first.
    async fn audit_trail(&self, pagination: Pagination) -> Result<Vec<AuditRecord>, StoreError>;
}

#[async_trait]
impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    async fn append(&self, entry: LedgerEntry) -> Result<LedgerEntry, StoreError> {
        (**self).append(entry).await
    }

    async fn list_entries(&self, kind: EntryKind, query: &EntryQuery) -> Result<Vec<LedgerEntry>, StoreError> {
        (**self).list_entries(kind, query).await
    }

    async fn get_entry(&self, kind: EntryKind, id: EntryId) -> Result<Option<LedgerEntry>, StoreError> {
        (**self).get_entry(kind, id).await
    }

    async fn sum(&self, movement: Movement, filter: &BalanceFilter) -> Result<i64, StoreError> {
        (**self).sum(movement, filter).await
    }

    async fn audit_trail(&self, pagination: Pagination) -> Result<Vec<AuditRecord>, StoreError> {
        (**self).audit_trail(pagination).await
    }
}

/// Everything the HTTP layer needs from storage, as one object-safe bound.
pub trait LedgerBackend: DirectoryStore + LedgerStore {}

impl<T> LedgerBackend for T where T: DirectoryStore + LedgerStore + ?Sized {}
