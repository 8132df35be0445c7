//! Ledger entries: purchases, transfers, assignments and expenditures.
//!
//! Entries are append-only. Once recorded they are never mutated; the only way
//! to correct a mistake is to record a compensating movement.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use armory_core::{AssetTypeId, BaseId, DomainError, DomainResult, Entity, EntryId};

use crate::quantity::Quantity;

/// Assets bought and received at a base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: EntryId,
    pub base: BaseId,
    pub asset_type: AssetTypeId,
    pub quantity: Quantity,
    pub date: NaiveDate,
}

/// Assets moved from one base to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: EntryId,
    pub from_base: BaseId,
    pub to_base: BaseId,
    pub asset_type: AssetTypeId,
    pub quantity: Quantity,
    pub date: NaiveDate,
}

/// Assets handed to a named member of personnel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: EntryId,
    pub personnel_name: String,
    pub base: BaseId,
    pub asset_type: AssetTypeId,
    pub quantity: Quantity,
    pub date: NaiveDate,
}

/// Assets consumed at a base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expenditure {
    pub id: EntryId,
    pub base: BaseId,
    pub asset_type: AssetTypeId,
    pub quantity: Quantity,
    pub date: NaiveDate,
    #[serde(default)]
    pub reason: String,
}

/// Input for recording a purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPurchase {
    pub base: BaseId,
    pub asset_type: AssetTypeId,
    pub quantity: u32,
    pub date: NaiveDate,
}

/// Input for recording a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransfer {
    pub from_base: BaseId,
    pub to_base: BaseId,
    pub asset_type: AssetTypeId,
    pub quantity: u32,
    pub date: NaiveDate,
}

/// Input for recording an assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAssignment {
    pub personnel_name: String,
    pub base: BaseId,
    pub asset_type: AssetTypeId,
    pub quantity: u32,
    pub date: NaiveDate,
}

/// Input for recording an expenditure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExpenditure {
    pub base: BaseId,
    pub asset_type: AssetTypeId,
    pub quantity: u32,
    pub date: NaiveDate,
    pub reason: String,
}

impl Purchase {
    pub fn record(new: NewPurchase) -> DomainResult<Self> {
        Ok(Self {
            id: EntryId::new(),
            base: new.base,
            asset_type: new.asset_type,
            quantity: Quantity::new(new.quantity)?,
            date: new.date,
        })
    }
}

impl Transfer {
    pub fn record(new: NewTransfer) -> DomainResult<Self> {
        if new.from_base == new.to_base {
            return Err(DomainError::validation(
                "transfer source and destination must be different bases",
            ));
        }
        Ok(Self {
            id: EntryId::new(),
            from_base: new.from_base,
            to_base: new.to_base,
            asset_type: new.asset_type,
            quantity: Quantity::new(new.quantity)?,
            date: new.date,
        })
    }
}

const MAX_PERSONNEL_NAME_LEN: usize = 100;

impl Assignment {
    pub fn record(new: NewAssignment) -> DomainResult<Self> {
        let personnel_name = new.personnel_name.trim();
        if personnel_name.is_empty() {
            return Err(DomainError::validation("personnel_name cannot be empty"));
        }
        if personnel_name.chars().count() > MAX_PERSONNEL_NAME_LEN {
            return Err(DomainError::validation(format!(
                "personnel_name cannot exceed {MAX_PERSONNEL_NAME_LEN} characters"
            )));
        }
        Ok(Self {
            id: EntryId::new(),
            personnel_name: personnel_name.to_string(),
            base: new.base,
            asset_type: new.asset_type,
            quantity: Quantity::new(new.quantity)?,
            date: new.date,
        })
    }
}

impl Expenditure {
    pub fn record(new: NewExpenditure) -> DomainResult<Self> {
        Ok(Self {
            id: EntryId::new(),
            base: new.base,
            asset_type: new.asset_type,
            quantity: Quantity::new(new.quantity)?,
            date: new.date,
            reason: new.reason.trim().to_string(),
        })
    }
}

/// The four kinds of recorded entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Purchase,
    Transfer,
    Assignment,
    Expenditure,
}

impl EntryKind {
    pub const ALL: [EntryKind; 4] = [
        EntryKind::Purchase,
        EntryKind::Transfer,
        EntryKind::Assignment,
        EntryKind::Expenditure,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::Purchase => "purchase",
            EntryKind::Transfer => "transfer",
            EntryKind::Assignment => "assignment",
            EntryKind::Expenditure => "expenditure",
        }
    }

    /// Action code written to the audit trail.
    pub fn audit_action(self) -> &'static str {
        match self {
            EntryKind::Purchase => "PURCHASE",
            EntryKind::Transfer => "TRANSFER",
            EntryKind::Assignment => "ASSIGN",
            EntryKind::Expenditure => "EXPEND",
        }
    }

    pub fn from_audit_action(action: &str) -> DomainResult<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.audit_action() == action)
            .ok_or_else(|| DomainError::validation(format!("unknown audit action: {action}")))
    }
}

impl core::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded movement of assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEntry {
    Purchase(Purchase),
    Transfer(Transfer),
    Assignment(Assignment),
    Expenditure(Expenditure),
}

impl LedgerEntry {
    pub fn kind(&self) -> EntryKind {
        match self {
            LedgerEntry::Purchase(_) => EntryKind::Purchase,
            LedgerEntry::Transfer(_) => EntryKind::Transfer,
            LedgerEntry::Assignment(_) => EntryKind::Assignment,
            LedgerEntry::Expenditure(_) => EntryKind::Expenditure,
        }
    }

    pub fn asset_type(&self) -> AssetTypeId {
        match self {
            LedgerEntry::Purchase(e) => e.asset_type,
            LedgerEntry::Transfer(e) => e.asset_type,
            LedgerEntry::Assignment(e) => e.asset_type,
            LedgerEntry::Expenditure(e) => e.asset_type,
        }
    }

    pub fn quantity(&self) -> Quantity {
        match self {
            LedgerEntry::Purchase(e) => e.quantity,
            LedgerEntry::Transfer(e) => e.quantity,
            LedgerEntry::Assignment(e) => e.quantity,
            LedgerEntry::Expenditure(e) => e.quantity,
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            LedgerEntry::Purchase(e) => e.date,
            LedgerEntry::Transfer(e) => e.date,
            LedgerEntry::Assignment(e) => e.date,
            LedgerEntry::Expenditure(e) => e.date,
        }
    }

    /// The single base the entry is booked against; `None` for transfers.
    pub fn base(&self) -> Option<BaseId> {
        match self {
            LedgerEntry::Purchase(e) => Some(e.base),
            LedgerEntry::Transfer(_) => None,
            LedgerEntry::Assignment(e) => Some(e.base),
            LedgerEntry::Expenditure(e) => Some(e.base),
        }
    }

    /// Every base the entry references.
    pub fn referenced_bases(&self) -> Vec<BaseId> {
        match self {
            LedgerEntry::Transfer(t) => vec![t.from_base, t.to_base],
            other => other.base().into_iter().collect(),
        }
    }

    /// JSON representation of the entry as written to the audit trail.
    pub fn details(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            LedgerEntry::Purchase(e) => serde_json::to_value(e),
            LedgerEntry::Transfer(e) => serde_json::to_value(e),
            LedgerEntry::Assignment(e) => serde_json::to_value(e),
            LedgerEntry::Expenditure(e) => serde_json::to_value(e),
        }
    }
}

impl Entity for LedgerEntry {
    type Id = EntryId;

    fn id(&self) -> EntryId {
        match self {
            LedgerEntry::Purchase(e) => e.id,
            LedgerEntry::Transfer(e) => e.id,
            LedgerEntry::Assignment(e) => e.id,
            LedgerEntry::Expenditure(e) => e.id,
        }
    }
}

impl From<Purchase> for LedgerEntry {
    fn from(value: Purchase) -> Self {
        LedgerEntry::Purchase(value)
    }
}

impl From<Transfer> for LedgerEntry {
    fn from(value: Transfer) -> Self {
        LedgerEntry::Transfer(value)
    }
}

impl From<Assignment> for LedgerEntry {
    fn from(value: Assignment) -> Self {
        LedgerEntry::Assignment(value)
    }
}

impl From<Expenditure> for LedgerEntry {
    fn from(value: Expenditure) -> Self {
        LedgerEntry::Expenditure(value)
    }
}

/// List filter for entry collections.
///
/// `base` applies to purchases, assignments and expenditures (and to either
/// side of a transfer); `from_base`/`to_base` apply to transfers only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryQuery {
    pub date: Option<NaiveDate>,
    pub base: Option<BaseId>,
    pub from_base: Option<BaseId>,
    pub to_base: Option<BaseId>,
    pub asset_type: Option<AssetTypeId>,
}

impl EntryQuery {
    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        if self.date.is_some_and(|d| d != entry.date()) {
            return false;
        }
        if self.asset_type.is_some_and(|a| a != entry.asset_type()) {
            return false;
        }
        match entry {
            LedgerEntry::Transfer(t) => {
                self.base.is_none_or(|b| b == t.from_base || b == t.to_base)
                    && self.from_base.is_none_or(|b| b == t.from_base)
                    && self.to_base.is_none_or(|b| b == t.to_base)
            }
            other => self.base.is_none_or(|b| other.base() == Some(b)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn transfer_between_same_base_is_rejected() {
        let base = BaseId::new();
        let err = Transfer::record(NewTransfer {
            from_base: base,
            to_base: base,
            asset_type: AssetTypeId::new(),
            quantity: 5,
            date: d("2024-03-01"),
        })
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn zero_quantity_is_rejected_for_every_kind() {
        let base = BaseId::new();
        let asset_type = AssetTypeId::new();
        let date = d("2024-03-01");

        assert!(Purchase::record(NewPurchase { base, asset_type, quantity: 0, date }).is_err());
        assert!(
            Expenditure::record(NewExpenditure {
                base,
                asset_type,
                quantity: 0,
                date,
                reason: String::new(),
            })
            .is_err()
        );
        assert!(
            Assignment::record(NewAssignment {
                personnel_name: "Sgt. Reyes".into(),
                base,
                asset_type,
                quantity: 0,
                date,
            })
            .is_err()
        );
    }

    #[test]
    fn assignment_requires_personnel_name() {
        let err = Assignment::record(NewAssignment {
            personnel_name: "   ".into(),
            base: BaseId::new(),
            asset_type: AssetTypeId::new(),
            quantity: 1,
            date: d("2024-03-01"),
        })
        .unwrap_err();
        assert_eq!(err, DomainError::validation("personnel_name cannot be empty"));
    }

    #[test]
    fn assignment_personnel_name_is_capped_at_100_chars() {
        let new = |personnel_name: String| NewAssignment {
            personnel_name,
            base: BaseId::new(),
            asset_type: AssetTypeId::new(),
            quantity: 1,
            date: d("2024-03-01"),
        };
        assert!(Assignment::record(new("x".repeat(100))).is_ok());
        let err = Assignment::record(new("x".repeat(101))).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn audit_actions_round_trip() {
        for kind in EntryKind::ALL {
            assert_eq!(EntryKind::from_audit_action(kind.audit_action()).unwrap(), kind);
        }
        assert!(EntryKind::from_audit_action("DELETE").is_err());
    }

    #[test]
    fn details_serialize_the_inner_entry() {
        let purchase = Purchase::record(NewPurchase {
            base: BaseId::new(),
            asset_type: AssetTypeId::new(),
            quantity: 12,
            date: d("2024-05-06"),
        })
        .unwrap();
        let details = LedgerEntry::from(purchase.clone()).details().unwrap();
        assert_eq!(details["quantity"], 12);
        assert_eq!(details["date"], "2024-05-06");
        assert_eq!(details["base"], purchase.base.to_string());
    }

    #[test]
    fn entry_query_filters_transfers_by_direction() {
        let a = BaseId::new();
        let b = BaseId::new();
        let transfer: LedgerEntry = Transfer::record(NewTransfer {
            from_base: a,
            to_base: b,
            asset_type: AssetTypeId::new(),
            quantity: 3,
            date: d("2024-01-10"),
        })
        .unwrap()
        .into();

        assert!(EntryQuery { from_base: Some(a), ..Default::default() }.matches(&transfer));
        assert!(!EntryQuery { from_base: Some(b), ..Default::default() }.matches(&transfer));
        assert!(EntryQuery { to_base: Some(b), ..Default::default() }.matches(&transfer));
        assert!(EntryQuery { base: Some(a), ..Default::default() }.matches(&transfer));
        assert!(!EntryQuery { date: Some(d("2024-01-11")), ..Default::default() }.matches(&transfer));
    }

    #[test]
    fn entry_query_filters_by_base_and_asset_type() {
        let base = BaseId::new();
        let asset_type = AssetTypeId::new();
        let purchase: LedgerEntry = Purchase::record(NewPurchase {
            base,
            asset_type,
            quantity: 3,
            date: d("2024-01-10"),
        })
        .unwrap()
        .into();

        assert!(EntryQuery::default().matches(&purchase));
        assert!(EntryQuery { base: Some(base), asset_type: Some(asset_type), ..Default::default() }.matches(&purchase));
        assert!(!EntryQuery { base: Some(BaseId::new()), ..Default::default() }.matches(&purchase));
        assert!(!EntryQuery { asset_type: Some(AssetTypeId::new()), ..Default::default() }.matches(&purchase));
    }
}
