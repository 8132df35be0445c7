//! Postgres-backed ledger store.
//!
//! Tables are created by `sql/schema.sql`. Every aggregate uses
//! `COALESCE(SUM(quantity), 0)` so that an empty match set reads as zero.
//!
//! ## Error Mapping
//!
//! | PostgreSQL Error Code | StoreError | Scenario |
//! |-----------------------|------------|----------|
//! | `23505` (unique violation) | `Conflict` | Duplicate base / asset type name |
//! | `23503` (foreign key violation) | `UnknownReference` | Entry references a missing base or asset type |
//! | `23514` (check violation) | `Corrupt` | Non-positive quantity reached the database |
//! | anything else | `Backend` | Network errors, pool closed, ... |

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use tracing::instrument;
use uuid::Uuid;

use armory_core::{AssetTypeId, BaseId, Entity, EntryId};
use armory_ledger::{
    AssetType, Assignment, AuditRecord, Base, BalanceFilter, EntryKind, EntryQuery, Expenditure,
    LedgerEntry, Movement, Purchase, Quantity, Transfer,
};

use super::query::Pagination;
use super::r#trait::{DirectoryStore, LedgerStore, StoreError};

/// Postgres-backed ledger store.
///
/// `Send + Sync`; all operations go through the SQLx connection pool. Entry
/// appends run in a transaction together with their audit record.
#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    pool: Arc<PgPool>,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

fn table(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Purchase => "purchases",
        EntryKind::Transfer => "transfers",
        EntryKind::Assignment => "assignments",
        EntryKind::Expenditure => "expenditures",
    }
}

fn columns(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Purchase => "id, base_id, asset_type_id, quantity, date",
        EntryKind::Transfer => "id, from_base_id, to_base_id, asset_type_id, quantity, date",
        EntryKind::Assignment => "id, personnel_name, base_id, asset_type_id, quantity, date",
        EntryKind::Expenditure => "id, base_id, asset_type_id, quantity, date, reason",
    }
}

/// Column compared against the base filter for a movement.
fn base_column(movement: Movement) -> &'static str {
    match movement {
        Movement::TransferredIn => "to_base_id",
        Movement::TransferredOut => "from_base_id",
        Movement::Purchased | Movement::Assigned | Movement::Expended => "base_id",
    }
}

fn sum_sql(movement: Movement) -> String {
    format!(
        r#"
        SELECT COALESCE(SUM(quantity), 0)::BIGINT AS total
        FROM {table}
        WHERE ($1::uuid IS NULL OR {base} = $1)
          AND ($2::uuid IS NULL OR asset_type_id = $2)
          AND ($3::date IS NULL OR date >= $3)
          AND ($4::date IS NULL OR date <= $4)
        "#,
        table = table(movement.source()),
        base = base_column(movement),
    )
}

fn list_sql(kind: EntryKind) -> String {
    let filters = match kind {
        EntryKind::Transfer => {
            "($1::date IS NULL OR date = $1) \
             AND ($2::uuid IS NULL OR from_base_id = $2 OR to_base_id = $2) \
             AND ($3::uuid IS NULL OR asset_type_id = $3) \
             AND ($4::uuid IS NULL OR from_base_id = $4) \
             AND ($5::uuid IS NULL OR to_base_id = $5)"
        }
        _ => {
            "($1::date IS NULL OR date = $1) \
             AND ($2::uuid IS NULL OR base_id = $2) \
             AND ($3::uuid IS NULL OR asset_type_id = $3)"
        }
    };
    format!(
        "SELECT {columns} FROM {table} WHERE {filters} ORDER BY date DESC, id DESC",
        columns = columns(kind),
        table = table(kind),
    )
}

fn quantity(row: &PgRow) -> Result<Quantity, StoreError> {
    let raw: i64 = row.try_get("quantity").map_err(|e| map_sqlx_error("decode quantity", e))?;
    Quantity::try_from(raw).map_err(|e| StoreError::Corrupt(e.to_string()))
}

fn uuid_col(row: &PgRow, name: &str) -> Result<Uuid, StoreError> {
    row.try_get(name).map_err(|e| map_sqlx_error("decode row", e))
}

fn date_col(row: &PgRow) -> Result<NaiveDate, StoreError> {
    row.try_get("date").map_err(|e| map_sqlx_error("decode row", e))
}

fn text_col(row: &PgRow, name: &str) -> Result<String, StoreError> {
    row.try_get(name).map_err(|e| map_sqlx_error("decode row", e))
}

fn entry_from_row(kind: EntryKind, row: &PgRow) -> Result<LedgerEntry, StoreError> {
    let id = EntryId::from_uuid(uuid_col(row, "id")?);
    let asset_type = AssetTypeId::from_uuid(uuid_col(row, "asset_type_id")?);
    let quantity = quantity(row)?;
    let date = date_col(row)?;

    let entry = match kind {
        EntryKind::Purchase => LedgerEntry::Purchase(Purchase {
            id,
            base: BaseId::from_uuid(uuid_col(row, "base_id")?),
            asset_type,
            quantity,
            date,
        }),
        EntryKind::Transfer => LedgerEntry::Transfer(Transfer {
            id,
            from_base: BaseId::from_uuid(uuid_col(row, "from_base_id")?),
            to_base: BaseId::from_uuid(uuid_col(row, "to_base_id")?),
            asset_type,
            quantity,
            date,
        }),
        EntryKind::Assignment => LedgerEntry::Assignment(Assignment {
            id,
            personnel_name: text_col(row, "personnel_name")?,
            base: BaseId::from_uuid(uuid_col(row, "base_id")?),
            asset_type,
            quantity,
            date,
        }),
        EntryKind::Expenditure => LedgerEntry::Expenditure(Expenditure {
            id,
            base: BaseId::from_uuid(uuid_col(row, "base_id")?),
            asset_type,
            quantity,
            date,
            reason: text_col(row, "reason")?,
        }),
    };
    Ok(entry)
}

async fn insert_entry(tx: &mut Transaction<'_, Postgres>, entry: &LedgerEntry) -> Result<(), sqlx::Error> {
    let id = *entry.id().as_uuid();
    let asset_type = *entry.asset_type().as_uuid();
    let quantity = i64::from(entry.quantity());
    let date = entry.date();

    let query = match entry {
        LedgerEntry::Purchase(p) => sqlx::query(
            "INSERT INTO purchases (id, base_id, asset_type_id, quantity, date) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(*p.base.as_uuid())
        .bind(asset_type)
        .bind(quantity)
        .bind(date),
        LedgerEntry::Transfer(t) => sqlx::query(
            "INSERT INTO transfers (id, from_base_id, to_base_id, asset_type_id, quantity, date) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(*t.from_base.as_uuid())
        .bind(*t.to_base.as_uuid())
        .bind(asset_type)
        .bind(quantity)
        .bind(date),
        LedgerEntry::Assignment(a) => sqlx::query(
            "INSERT INTO assignments (id, personnel_name, base_id, asset_type_id, quantity, date) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(a.personnel_name.clone())
        .bind(*a.base.as_uuid())
        .bind(asset_type)
        .bind(quantity)
        .bind(date),
        LedgerEntry::Expenditure(x) => sqlx::query(
            "INSERT INTO expenditures (id, base_id, asset_type_id, quantity, date, reason) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(*x.base.as_uuid())
        .bind(asset_type)
        .bind(quantity)
        .bind(date)
        .bind(x.reason.clone()),
    };

    query.execute(&mut **tx).await?;
    Ok(())
}

#[async_trait]
impl DirectoryStore for PostgresLedgerStore {
    #[instrument(skip(self), fields(base_id = %base.id), err)]
    async fn create_base(&self, base: Base) -> Result<Base, StoreError> {
        sqlx::query("INSERT INTO bases (id, name) VALUES ($1, $2)")
            .bind(*base.id.as_uuid())
            .bind(&base.name)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("create_base", e))?;
        Ok(base)
    }

    #[instrument(skip(self), err)]
    async fn list_bases(&self) -> Result<Vec<Base>, StoreError> {
        let rows = sqlx::query("SELECT id, name FROM bases ORDER BY name")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_bases", e))?;
        rows.iter()
            .map(|r| -> Result<Base, StoreError> {
                Ok(Base {
                    id: BaseId::from_uuid(uuid_col(r, "id")?),
                    name: text_col(r, "name")?,
                })
            })
            .collect()
    }

    #[instrument(skip(self), err)]
    async fn get_base(&self, id: BaseId) -> Result<Option<Base>, StoreError> {
        let row = sqlx::query("SELECT id, name FROM bases WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_base", e))?;
        row.map(|r| -> Result<Base, StoreError> { Ok(Base { id, name: text_col(&r, "name")? }) })
            .transpose()
    }

    #[instrument(skip(self), fields(asset_type_id = %asset_type.id), err)]
    async fn create_asset_type(&self, asset_type: AssetType) -> Result<AssetType, StoreError> {
        sqlx::query("INSERT INTO asset_types (id, name) VALUES ($1, $2)")
            .bind(*asset_type.id.as_uuid())
            .bind(&asset_type.name)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("create_asset_type", e))?;
        Ok(asset_type)
    }

    #[instrument(skip(self), err)]
    async fn list_asset_types(&self) -> Result<Vec<AssetType>, StoreError> {
        let rows = sqlx::query("SELECT id, name FROM asset_types ORDER BY name")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_asset_types", e))?;
        rows.iter()
            .map(|r| -> Result<AssetType, StoreError> {
                Ok(AssetType {
                    id: AssetTypeId::from_uuid(uuid_col(r, "id")?),
                    name: text_col(r, "name")?,
                })
            })
            .collect()
    }

    #[instrument(skip(self), err)]
    async fn get_asset_type(&self, id: AssetTypeId) -> Result<Option<AssetType>, StoreError> {
        let row = sqlx::query("SELECT id, name FROM asset_types WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_asset_type", e))?;
        row.map(|r| -> Result<AssetType, StoreError> { Ok(AssetType { id, name: text_col(&r, "name")? }) })
            .transpose()
    }
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    #[instrument(skip(self, entry), fields(kind = %entry.kind(), entry_id = %entry.id()), err)]
    async fn append(&self, entry: LedgerEntry) -> Result<LedgerEntry, StoreError> {
        let record = AuditRecord::for_entry(&entry, Utc::now())
            .map_err(|e| StoreError::Corrupt(format!("audit details serialization failed: {e}")))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("append", e))?;

        insert_entry(&mut tx, &entry)
            .await
            .map_err(|e| map_sqlx_error("append", e))?;

        sqlx::query("INSERT INTO audit_log (id, action, details, recorded_at) VALUES ($1, $2, $3, $4)")
            .bind(record.id)
            .bind(record.action.audit_action())
            .bind(&record.details)
            .bind(record.recorded_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("append audit", e))?;

        tx.commit().await.map_err(|e| map_sqlx_error("append commit", e))?;
        Ok(entry)
    }

    #[instrument(skip(self), err)]
    async fn list_entries(&self, kind: EntryKind, query: &EntryQuery) -> Result<Vec<LedgerEntry>, StoreError> {
        let sql = list_sql(kind);
        let mut select = sqlx::query(&sql)
            .bind(query.date)
            .bind(query.base.map(Uuid::from))
            .bind(query.asset_type.map(Uuid::from));
        if kind == EntryKind::Transfer {
            select = select
                .bind(query.from_base.map(Uuid::from))
                .bind(query.to_base.map(Uuid::from));
        }
        let rows = select
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_entries", e))?;
        rows.iter().map(|r| entry_from_row(kind, r)).collect()
    }

    #[instrument(skip(self), err)]
    async fn get_entry(&self, kind: EntryKind, id: EntryId) -> Result<Option<LedgerEntry>, StoreError> {
        let sql = format!("SELECT {} FROM {} WHERE id = $1", columns(kind), table(kind));
        let row = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_entry", e))?;
        row.map(|r| entry_from_row(kind, &r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn sum(&self, movement: Movement, filter: &BalanceFilter) -> Result<i64, StoreError> {
        let row = sqlx::query(&sum_sql(movement))
            .bind(filter.base.map(Uuid::from))
            .bind(filter.asset_type.map(Uuid::from))
            .bind(filter.date_from)
            .bind(filter.date_to)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("sum", e))?;
        row.try_get("total").map_err(|e| map_sqlx_error("sum", e))
    }

    #[instrument(skip(self), err)]
    async fn audit_trail(&self, pagination: Pagination) -> Result<Vec<AuditRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, action, details, recorded_at
            FROM audit_log
            ORDER BY recorded_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(i64::from(pagination.limit))
        .bind(i64::from(pagination.offset))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("audit_trail", e))?;

        rows.iter()
            .map(|r| -> Result<AuditRecord, StoreError> {
                let action = text_col(r, "action")?;
                Ok(AuditRecord {
                    id: uuid_col(r, "id")?,
                    action: EntryKind::from_audit_action(&action)
                        .map_err(|e| StoreError::Corrupt(e.to_string()))?,
                    details: r.try_get("details").map_err(|e| map_sqlx_error("audit_trail", e))?,
                    recorded_at: r.try_get("recorded_at").map_err(|e| map_sqlx_error("audit_trail", e))?,
                })
            })
            .collect()
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                Some("23503") => StoreError::UnknownReference(msg),
                Some("23514") => StoreError::Corrupt(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => StoreError::Backend(format!("connection pool closed in {operation}")),
        sqlx::Error::ColumnNotFound(_) | sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::Corrupt(format!("{operation}: {err}"))
        }
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}
