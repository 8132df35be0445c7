use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use armory_core::{AssetTypeId, BaseId, DomainError, Entity, EntryId};
use armory_infra::BalanceCalculator;
use armory_infra::ledger_store::{
    InMemoryLedgerStore, LedgerBackend, LedgerStore, Pagination, PostgresLedgerStore, StoreError,
};
use armory_ledger::{
    AssetType, AuditRecord, Base, BalanceFilter, BalanceReport, EntryKind, EntryQuery, LedgerEntry, MovementTotals,
};

use crate::config::StoreConfig;

/// Why a service call failed.
#[derive(Debug)]
pub enum ServiceError {
    Domain(DomainError),
    Store(StoreError),
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        ServiceError::Domain(err)
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        ServiceError::Store(err)
    }
}

/// An entry together with the display names of everything it references.
#[derive(Debug, Clone)]
pub struct ResolvedEntry {
    pub entry: LedgerEntry,
    pub base_name: Option<String>,
    pub from_base_name: Option<String>,
    pub to_base_name: Option<String>,
    pub asset_type_name: Option<String>,
}

/// Application services shared by every handler.
pub struct AppServices {
    store: Arc<dyn LedgerBackend>,
    balances: BalanceCalculator<Arc<dyn LedgerBackend>>,
}

impl AppServices {
    pub fn new(store: Arc<dyn LedgerBackend>) -> Self {
        Self {
            balances: BalanceCalculator::new(store.clone()),
            store,
        }
    }

    // -------------------------
    // Directory
    // -------------------------

    pub async fn create_base(&self, name: &str) -> Result<Base, ServiceError> {
        let base = Base::register(name)?;
        let base = self.store.create_base(base).await?;
        tracing::info!(base_id = %base.id, name = %base.name, "base created");
        Ok(base)
    }

    pub async fn list_bases(&self) -> Result<Vec<Base>, StoreError> {
        self.store.list_bases().await
    }

    pub async fn get_base(&self, id: BaseId) -> Result<Option<Base>, StoreError> {
        self.store.get_base(id).await
    }

    pub async fn create_asset_type(&self, name: &str) -> Result<AssetType, ServiceError> {
        let asset_type = AssetType::register(name)?;
        let asset_type = self.store.create_asset_type(asset_type).await?;
        tracing::info!(asset_type_id = %asset_type.id, name = %asset_type.name, "asset type created");
        Ok(asset_type)
    }

    pub async fn list_asset_types(&self) -> Result<Vec<AssetType>, StoreError> {
        self.store.list_asset_types().await
    }

    pub async fn get_asset_type(&self, id: AssetTypeId) -> Result<Option<AssetType>, StoreError> {
        self.store.get_asset_type(id).await
    }

    // -------------------------
    // Ledger
    // -------------------------

    pub async fn record(&self, entry: LedgerEntry) -> Result<ResolvedEntry, StoreError> {
        let entry = self.store.append(entry).await?;
        tracing::info!(
            kind = %entry.kind(),
            entry_id = %entry.id(),
            quantity = entry.quantity().get(),
            "ledger entry recorded"
        );
        self.resolve(entry).await
    }

    pub async fn list_entries(&self, kind: EntryKind, query: &EntryQuery) -> Result<Vec<ResolvedEntry>, StoreError> {
        let entries = self.store.list_entries(kind, query).await?;
        let names = self.names().await?;
        Ok(entries.into_iter().map(|e| names.resolve(e)).collect())
    }

    pub async fn get_entry(&self, kind: EntryKind, id: EntryId) -> Result<Option<ResolvedEntry>, StoreError> {
        match self.store.get_entry(kind, id).await? {
            Some(entry) => Ok(Some(self.resolve(entry).await?)),
            None => Ok(None),
        }
    }

    pub async fn audit_trail(&self, pagination: Pagination) -> Result<Vec<AuditRecord>, StoreError> {
        self.store.audit_trail(pagination).await
    }

    // -------------------------
    // Dashboard
    // -------------------------

    pub async fn balance_report(&self, filter: &BalanceFilter) -> Result<BalanceReport, StoreError> {
        self.balances.report(filter).await
    }

    pub async fn movement_totals(&self, filter: &BalanceFilter) -> Result<MovementTotals, StoreError> {
        self.balances.totals(filter).await
    }

    async fn resolve(&self, entry: LedgerEntry) -> Result<ResolvedEntry, StoreError> {
        Ok(self.names().await?.resolve(entry))
    }

    async fn names(&self) -> Result<NameIndex, StoreError> {
        Ok(NameIndex {
            bases: self.store.list_bases().await?,
            asset_types: self.store.list_asset_types().await?,
        })
    }
}

struct NameIndex {
    bases: Vec<Base>,
    asset_types: Vec<AssetType>,
}

impl NameIndex {
    fn base(&self, id: BaseId) -> Option<String> {
        self.bases.iter().find(|b| b.id == id).map(|b| b.name.clone())
    }

    fn resolve(&self, entry: LedgerEntry) -> ResolvedEntry {
        let (from_base_name, to_base_name) = match &entry {
            LedgerEntry::Transfer(t) => (self.base(t.from_base), self.base(t.to_base)),
            _ => (None, None),
        };
        let asset_type = entry.asset_type();
        ResolvedEntry {
            base_name: entry.base().and_then(|b| self.base(b)),
            from_base_name,
            to_base_name,
            asset_type_name: self
                .asset_types
                .iter()
                .find(|a| a.id == asset_type)
                .map(|a| a.name.clone()),
            entry,
        }
    }
}

/// Wire the configured store.
pub async fn build_services(store: &StoreConfig) -> Result<AppServices, StoreError> {
    match store {
        StoreConfig::InMemory => Ok(build_in_memory_services()),
        StoreConfig::Postgres {
            database_url,
            max_connections,
        } => {
            tracing::info!(max_connections, "connecting to postgres ledger store");
            let pool = PgPoolOptions::new()
                .max_connections(*max_connections)
                .connect(database_url)
                .await
                .map_err(|e| StoreError::Backend(format!("failed to connect to postgres: {e}")))?;
            Ok(AppServices::new(Arc::new(PostgresLedgerStore::new(pool))))
        }
    }
}

pub fn build_in_memory_services() -> AppServices {
    AppServices::new(Arc::new(InMemoryLedgerStore::new()))
}
