use chrono::NaiveDate;
use serde::Deserialize;

use armory_core::{AssetTypeId, BaseId, DomainError, DomainResult};
use armory_infra::ledger_store::Pagination;
use armory_ledger::{
    AssetType, Assignment, AuditRecord, Base, BalanceFilter, EntryQuery, Expenditure, LedgerEntry, MovementTotals,
    NewAssignment, NewExpenditure, NewPurchase, NewTransfer, Purchase, Transfer,
};

use crate::app::services::ResolvedEntry;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateNamedRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatePurchaseRequest {
    pub base: String,
    pub asset_type: String,
    pub quantity: i64,
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateTransferRequest {
    pub from_base: String,
    pub to_base: String,
    pub asset_type: String,
    pub quantity: i64,
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateAssignmentRequest {
    pub personnel_name: String,
    pub base: String,
    pub asset_type: String,
    pub quantity: i64,
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateExpenditureRequest {
    pub base: String,
    pub asset_type: String,
    pub quantity: i64,
    pub date: String,
    #[serde(default)]
    pub reason: String,
}

impl CreatePurchaseRequest {
    pub fn into_entry(self) -> DomainResult<LedgerEntry> {
        Ok(Purchase::record(NewPurchase {
            base: self.base.parse()?,
            asset_type: self.asset_type.parse()?,
            quantity: parse_quantity(self.quantity)?,
            date: parse_date("date", &self.date)?,
        })?
        .into())
    }
}

impl CreateTransferRequest {
    pub fn into_entry(self) -> DomainResult<LedgerEntry> {
        Ok(Transfer::record(NewTransfer {
            from_base: self.from_base.parse()?,
            to_base: self.to_base.parse()?,
            asset_type: self.asset_type.parse()?,
            quantity: parse_quantity(self.quantity)?,
            date: parse_date("date", &self.date)?,
        })?
        .into())
    }
}

impl CreateAssignmentRequest {
    pub fn into_entry(self) -> DomainResult<LedgerEntry> {
        Ok(Assignment::record(NewAssignment {
            personnel_name: self.personnel_name,
            base: self.base.parse()?,
            asset_type: self.asset_type.parse()?,
            quantity: parse_quantity(self.quantity)?,
            date: parse_date("date", &self.date)?,
        })?
        .into())
    }
}

impl CreateExpenditureRequest {
    pub fn into_entry(self) -> DomainResult<LedgerEntry> {
        Ok(Expenditure::record(NewExpenditure {
            base: self.base.parse()?,
            asset_type: self.asset_type.parse()?,
            quantity: parse_quantity(self.quantity)?,
            date: parse_date("date", &self.date)?,
            reason: self.reason,
        })?
        .into())
    }
}

// -------------------------
// Query parameters
// -------------------------

/// Dashboard filters. Every parameter is an optional string; blanks mean "no filter".
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub base: Option<String>,
    pub asset_type: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

impl DashboardQuery {
    pub fn to_filter(&self) -> DomainResult<BalanceFilter> {
        Ok(BalanceFilter {
            base: parse_opt::<BaseId>(&self.base)?,
            asset_type: parse_opt::<AssetTypeId>(&self.asset_type)?,
            date_from: parse_opt_date("date_from", &self.date_from)?,
            date_to: parse_opt_date("date_to", &self.date_to)?,
        })
    }
}

/// List filters for entry collections.
#[derive(Debug, Default, Deserialize)]
pub struct EntryListQuery {
    pub date: Option<String>,
    pub base: Option<String>,
    pub from_base: Option<String>,
    pub to_base: Option<String>,
    pub asset_type: Option<String>,
}

impl EntryListQuery {
    pub fn to_query(&self) -> DomainResult<EntryQuery> {
        Ok(EntryQuery {
            date: parse_opt_date("date", &self.date)?,
            base: parse_opt::<BaseId>(&self.base)?,
            from_base: parse_opt::<BaseId>(&self.from_base)?,
            to_base: parse_opt::<BaseId>(&self.to_base)?,
            asset_type: parse_opt::<AssetTypeId>(&self.asset_type)?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AuditLogQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl AuditLogQuery {
    pub fn to_pagination(&self) -> DomainResult<Pagination> {
        let parse = |name: &str, raw: &Option<String>| -> DomainResult<Option<u32>> {
            match non_blank(raw) {
                None => Ok(None),
                Some(v) => v
                    .parse::<u32>()
                    .map(Some)
                    .map_err(|_| DomainError::validation(format!("{name} must be a non-negative integer"))),
            }
        };
        Ok(Pagination::new(parse("limit", &self.limit)?, parse("offset", &self.offset)?))
    }
}

fn non_blank(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_opt<T>(raw: &Option<String>) -> DomainResult<Option<T>>
where
    T: std::str::FromStr<Err = DomainError>,
{
    non_blank(raw).map(str::parse).transpose()
}

fn parse_opt_date(name: &str, raw: &Option<String>) -> DomainResult<Option<NaiveDate>> {
    non_blank(raw).map(|v| parse_date(name, v)).transpose()
}

pub fn parse_date(name: &str, raw: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| DomainError::validation(format!("{name} must be an ISO date (YYYY-MM-DD), got {raw:?}")))
}

fn parse_quantity(raw: i64) -> DomainResult<u32> {
    u32::try_from(raw).map_err(|_| DomainError::validation(format!("quantity must be a positive integer, got {raw}")))
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn base_to_json(base: Base) -> serde_json::Value {
    serde_json::json!({
        "id": base.id.to_string(),
        "name": base.name,
    })
}

pub fn asset_type_to_json(asset_type: AssetType) -> serde_json::Value {
    serde_json::json!({
        "id": asset_type.id.to_string(),
        "name": asset_type.name,
    })
}

pub fn entry_to_json(resolved: ResolvedEntry) -> serde_json::Value {
    let ResolvedEntry {
        entry,
        base_name,
        from_base_name,
        to_base_name,
        asset_type_name,
    } = resolved;

    match entry {
        LedgerEntry::Purchase(p) => serde_json::json!({
            "id": p.id.to_string(),
            "base": p.base.to_string(),
            "base_name": base_name,
            "asset_type": p.asset_type.to_string(),
            "asset_type_name": asset_type_name,
            "quantity": p.quantity.get(),
            "date": p.date.to_string(),
        }),
        LedgerEntry::Transfer(t) => serde_json::json!({
            "id": t.id.to_string(),
            "from_base": t.from_base.to_string(),
            "from_base_name": from_base_name,
            "to_base": t.to_base.to_string(),
            "to_base_name": to_base_name,
            "asset_type": t.asset_type.to_string(),
            "asset_type_name": asset_type_name,
            "quantity": t.quantity.get(),
            "date": t.date.to_string(),
        }),
        LedgerEntry::Assignment(a) => serde_json::json!({
            "id": a.id.to_string(),
            "personnel_name": a.personnel_name,
            "base": a.base.to_string(),
            "base_name": base_name,
            "asset_type": a.asset_type.to_string(),
            "asset_type_name": asset_type_name,
            "quantity": a.quantity.get(),
            "date": a.date.to_string(),
        }),
        LedgerEntry::Expenditure(x) => serde_json::json!({
            "id": x.id.to_string(),
            "base": x.base.to_string(),
            "base_name": base_name,
            "asset_type": x.asset_type.to_string(),
            "asset_type_name": asset_type_name,
            "quantity": x.quantity.get(),
            "date": x.date.to_string(),
            "reason": x.reason,
        }),
    }
}

pub fn movements_to_json(totals: MovementTotals) -> serde_json::Value {
    serde_json::json!({
        "purchased": totals.purchased,
        "transferred_in": totals.transferred_in,
        "transferred_out": totals.transferred_out,
        "assigned": totals.assigned,
        "expended": totals.expended,
        "net_movement": totals.net_movement(),
        "closing_balance": totals.closing_balance(),
    })
}

pub fn audit_record_to_json(record: AuditRecord) -> serde_json::Value {
    serde_json::json!({
        "id": record.id.to_string(),
        "action": record.action.audit_action(),
        "details": record.details,
        "recorded_at": record.recorded_at.to_rfc3339(),
    })
}
