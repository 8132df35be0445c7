use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use armory_core::{AssetTypeId, BaseId, Entity, EntryId};
use armory_ledger::{
    AssetType, AuditRecord, Base, BalanceFilter, EntryKind, EntryQuery, LedgerEntry, Movement,
    MovementTotals,
};

use super::query::Pagination;
use super::r#trait::{DirectoryStore, LedgerStore, StoreError};

#[derive(Debug, Default)]
struct LedgerState {
    bases: Vec<Base>,
    asset_types: Vec<AssetType>,
    entries: Vec<LedgerEntry>,
    audit: Vec<AuditRecord>,
}

/// In-memory ledger store.
///
/// Intended for tests/dev. Not optimized for performance: every sum is a scan.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    state: RwLock<LedgerState>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every movement total for `filter` under a single read lock.
    pub fn totals(&self, filter: &BalanceFilter) -> Result<MovementTotals, StoreError> {
        let state = self.read()?;
        Ok(MovementTotals::tally(filter, &state.entries))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, LedgerState>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, LedgerState>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }
}

impl LedgerState {
    fn ensure_references(&self, entry: &LedgerEntry) -> Result<(), StoreError> {
        for base in entry.referenced_bases() {
            if !self.bases.iter().any(|b| b.id == base) {
                return Err(StoreError::UnknownReference(format!("base {base}")));
            }
        }
        let asset_type = entry.asset_type();
        if !self.asset_types.iter().any(|a| a.id == asset_type) {
            return Err(StoreError::UnknownReference(format!("asset type {asset_type}")));
        }
        Ok(())
    }
}

fn by_name<T>(items: &[T], name: impl Fn(&T) -> &str) -> Vec<T>
where
    T: Clone,
{
    let mut sorted = items.to_vec();
    sorted.sort_by(|a, b| name(a).cmp(name(b)));
    sorted
}

#[async_trait]
impl DirectoryStore for InMemoryLedgerStore {
    async fn create_base(&self, base: Base) -> Result<Base, StoreError> {
        let mut state = self.write()?;
        if state.bases.iter().any(|b| b.name == base.name) {
            return Err(StoreError::Conflict(format!("base '{}' already exists", base.name)));
        }
        state.bases.push(base.clone());
        Ok(base)
    }

    async fn list_bases(&self) -> Result<Vec<Base>, StoreError> {
        Ok(by_name(&self.read()?.bases, |b| b.name.as_str()))
    }

    async fn get_base(&self, id: BaseId) -> Result<Option<Base>, StoreError> {
        Ok(self.read()?.bases.iter().find(|b| b.id == id).cloned())
    }

    async fn create_asset_type(&self, asset_type: AssetType) -> Result<AssetType, StoreError> {
        let mut state = self.write()?;
        if state.asset_types.iter().any(|a| a.name == asset_type.name) {
            return Err(StoreError::Conflict(format!(
                "asset type '{}' already exists",
                asset_type.name
            )));
        }
        state.asset_types.push(asset_type.clone());
        Ok(asset_type)
    }

    async fn list_asset_types(&self) -> Result<Vec<AssetType>, StoreError> {
        Ok(by_name(&self.read()?.asset_types, |a| a.name.as_str()))
    }

    async fn get_asset_type(&self, id: AssetTypeId) -> Result<Option<AssetType>, StoreError> {
        Ok(self.read()?.asset_types.iter().find(|a| a.id == id).cloned())
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn append(&self, entry: LedgerEntry) -> Result<LedgerEntry, StoreError> {
        let record = AuditRecord::for_entry(&entry, Utc::now())
            .map_err(|e| StoreError::Corrupt(format!("audit details serialization failed: {e}")))?;

        let mut state = self.write()?;
        state.ensure_references(&entry)?;
        state.entries.push(entry.clone());
        state.audit.push(record);
        Ok(entry)
    }

    async fn list_entries(&self, kind: EntryKind, query: &EntryQuery) -> Result<Vec<LedgerEntry>, StoreError> {
        let state = self.read()?;
        let mut entries: Vec<LedgerEntry> = state
            .entries
            .iter()
            .filter(|e| e.kind() == kind && query.matches(e))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.date().cmp(&a.date()).then_with(|| b.id().cmp(&a.id())));
        Ok(entries)
    }

    async fn get_entry(&self, kind: EntryKind, id: EntryId) -> Result<Option<LedgerEntry>, StoreError> {
        Ok(self
            .read()?
            .entries
            .iter()
            .find(|e| e.kind() == kind && e.id() == id)
            .cloned())
    }

    async fn sum(&self, movement: Movement, filter: &BalanceFilter) -> Result<i64, StoreError> {
        Ok(filter.sum(movement, &self.read()?.entries))
    }

    async fn audit_trail(&self, pagination: Pagination) -> Result<Vec<AuditRecord>, StoreError> {
        let state = self.read()?;
        Ok(state
            .audit
            .iter()
            .rev()
            .skip(pagination.offset as usize)
            .take(pagination.limit as usize)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use armory_ledger::{NewPurchase, NewTransfer, Purchase, Transfer};
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    async fn seeded() -> (InMemoryLedgerStore, Base, Base, AssetType) {
        let store = InMemoryLedgerStore::new();
        let north = store.create_base(Base::register("North").unwrap()).await.unwrap();
        let south = store.create_base(Base::register("South").unwrap()).await.unwrap();
        let rifles = store.create_asset_type(AssetType::register("Rifle").unwrap()).await.unwrap();
        (store, north, south, rifles)
    }

    #[tokio::test]
    async fn duplicate_base_names_conflict() {
        let (store, _, _, _) = seeded().await;
        let err = store.create_base(Base::register("North").unwrap()).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn bases_are_listed_by_name() {
        let store = InMemoryLedgerStore::new();
        store.create_base(Base::register("Zulu").unwrap()).await.unwrap();
        store.create_base(Base::register("Alpha").unwrap()).await.unwrap();
        let names: Vec<String> = store.list_bases().await.unwrap().into_iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["Alpha", "Zulu"]);
    }

    #[tokio::test]
    async fn append_rejects_unknown_references() {
        let (store, north, _, _) = seeded().await;
        let entry = Purchase::record(NewPurchase {
            base: north.id,
            asset_type: AssetTypeId::new(),
            quantity: 1,
            date: d("2024-01-01"),
        })
        .unwrap();

        let err = store.append(entry.into()).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownReference(_)));
        assert!(store.audit_trail(Pagination::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn append_writes_audit_record() {
        let (store, north, south, rifles) = seeded().await;
        let transfer = Transfer::record(NewTransfer {
            from_base: north.id,
            to_base: south.id,
            asset_type: rifles.id,
            quantity: 30,
            date: d("2024-01-05"),
        })
        .unwrap();
        store.append(transfer.clone().into()).await.unwrap();

        let trail = store.audit_trail(Pagination::default()).await.unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].action, EntryKind::Transfer);
        assert_eq!(trail[0].details["quantity"], 30);
        assert_eq!(trail[0].details["to_base"], south.id.to_string());
    }

    #[tokio::test]
    async fn list_entries_is_scoped_to_kind_and_sorted_newest_first() {
        let (store, north, south, rifles) = seeded().await;
        for (qty, date) in [(5, "2024-01-01"), (6, "2024-03-01"), (7, "2024-02-01")] {
            let p = Purchase::record(NewPurchase {
                base: north.id,
                asset_type: rifles.id,
                quantity: qty,
                date: d(date),
            })
            .unwrap();
            store.append(p.into()).await.unwrap();
        }
        let t = Transfer::record(NewTransfer {
            from_base: north.id,
            to_base: south.id,
            asset_type: rifles.id,
            quantity: 1,
            date: d("2024-04-01"),
        })
        .unwrap();
        store.append(t.into()).await.unwrap();

        let purchases = store
            .list_entries(EntryKind::Purchase, &EntryQuery::default())
            .await
            .unwrap();
        let dates: Vec<NaiveDate> = purchases.iter().map(|e| e.date()).collect();
        assert_eq!(dates, vec![d("2024-03-01"), d("2024-02-01"), d("2024-01-01")]);

        let by_date = store
            .list_entries(
                EntryKind::Purchase,
                &EntryQuery { date: Some(d("2024-02-01")), ..Default::default() },
            )
            .await
            .unwrap();
        assert_eq!(by_date.len(), 1);
        assert_eq!(by_date[0].quantity().get(), 7);
    }

    #[tokio::test]
    async fn get_entry_respects_kind() {
        let (store, north, _, rifles) = seeded().await;
        let p = Purchase::record(NewPurchase {
            base: north.id,
            asset_type: rifles.id,
            quantity: 2,
            date: d("2024-01-01"),
        })
        .unwrap();
        let id = p.id;
        store.append(p.into()).await.unwrap();

        assert!(store.get_entry(EntryKind::Purchase, id).await.unwrap().is_some());
        assert!(store.get_entry(EntryKind::Transfer, id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn audit_trail_paginates_newest_first() {
        let (store, north, _, rifles) = seeded().await;
        for qty in 1..=3 {
            let p = Purchase::record(NewPurchase {
                base: north.id,
                asset_type: rifles.id,
                quantity: qty,
                date: d("2024-01-01"),
            })
            .unwrap();
            store.append(p.into()).await.unwrap();
        }

        let page = store.audit_trail(Pagination::new(Some(2), Some(1))).await.unwrap();
        let quantities: Vec<i64> = page.iter().map(|r| r.details["quantity"].as_i64().unwrap()).collect();
        assert_eq!(quantities, vec![2, 1]);
    }
}
