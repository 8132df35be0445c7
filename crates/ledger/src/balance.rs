//! Balance arithmetic for the dashboard.
//!
//! The store answers "how much moved" per [`Movement`]; this module decides
//! which entries count toward which movement and how the five totals combine
//! into a [`BalanceReport`].

use chrono::NaiveDate;
use serde::Serialize;

use armory_core::{AssetTypeId, BaseId};

use crate::entry::{EntryKind, LedgerEntry};

/// Opening balance of every report.
///
/// Historical balances are not carried forward; every window opens at zero.
pub const OPENING_BALANCE: i64 = 0;

/// Dashboard filter. Every dimension is optional and `None` means unconstrained.
///
/// Date bounds are inclusive on both ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BalanceFilter {
    pub base: Option<BaseId>,
    pub asset_type: Option<AssetTypeId>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

/// The five quantities summed to build a report.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Movement {
    Purchased,
    TransferredIn,
    TransferredOut,
    Assigned,
    Expended,
}

impl Movement {
    pub const ALL: [Movement; 5] = [
        Movement::Purchased,
        Movement::TransferredIn,
        Movement::TransferredOut,
        Movement::Assigned,
        Movement::Expended,
    ];

    /// Entry collection the movement is summed over.
    pub fn source(self) -> EntryKind {
        match self {
            Movement::Purchased => EntryKind::Purchase,
            Movement::TransferredIn | Movement::TransferredOut => EntryKind::Transfer,
            Movement::Assigned => EntryKind::Assignment,
            Movement::Expended => EntryKind::Expenditure,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Movement::Purchased => "purchased",
            Movement::TransferredIn => "transferred_in",
            Movement::TransferredOut => "transferred_out",
            Movement::Assigned => "assigned",
            Movement::Expended => "expended",
        }
    }
}

impl BalanceFilter {
    pub fn matches_date(&self, date: NaiveDate) -> bool {
        self.date_from.is_none_or(|from| date >= from) && self.date_to.is_none_or(|to| date <= to)
    }

    pub fn matches_asset_type(&self, asset_type: AssetTypeId) -> bool {
        self.asset_type.is_none_or(|a| a == asset_type)
    }

    pub fn matches_base(&self, base: BaseId) -> bool {
        self.base.is_none_or(|b| b == base)
    }

    /// Whether `entry` counts toward `movement` under this filter.
    ///
    /// Transfers are matched on their destination for `TransferredIn` and on
    /// their source for `TransferredOut`.
    pub fn counts_toward(&self, movement: Movement, entry: &LedgerEntry) -> bool {
        if entry.kind() != movement.source() {
            return false;
        }
        if !self.matches_date(entry.date()) || !self.matches_asset_type(entry.asset_type()) {
            return false;
        }
        match (movement, entry) {
            (Movement::TransferredIn, LedgerEntry::Transfer(t)) => self.matches_base(t.to_base),
            (Movement::TransferredOut, LedgerEntry::Transfer(t)) => self.matches_base(t.from_base),
            (_, other) => other.base().is_some_and(|b| self.matches_base(b)),
        }
    }

    /// Sum of quantities of `entries` counting toward `movement`. Zero when nothing matches.
    pub fn sum<'a>(&self, movement: Movement, entries: impl IntoIterator<Item = &'a LedgerEntry>) -> i64 {
        entries
            .into_iter()
            .filter(|e| self.counts_toward(movement, e))
            .fold(0i64, |acc, e| acc.saturating_add(i64::from(e.quantity())))
    }
}

/// Raw per-movement totals for one filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MovementTotals {
    pub purchased: i64,
    pub transferred_in: i64,
    pub transferred_out: i64,
    pub assigned: i64,
    pub expended: i64,
}

impl MovementTotals {
    /// Compute every total over an in-memory collection of entries.
    pub fn tally<'a>(filter: &BalanceFilter, entries: impl IntoIterator<Item = &'a LedgerEntry> + Clone) -> Self {
        let mut totals = Self::default();
        for movement in Movement::ALL {
            totals.set(movement, filter.sum(movement, entries.clone()));
        }
        totals
    }

    pub fn get(&self, movement: Movement) -> i64 {
        match movement {
            Movement::Purchased => self.purchased,
            Movement::TransferredIn => self.transferred_in,
            Movement::TransferredOut => self.transferred_out,
            Movement::Assigned => self.assigned,
            Movement::Expended => self.expended,
        }
    }

    pub fn set(&mut self, movement: Movement, total: i64) {
        let slot = match movement {
            Movement::Purchased => &mut self.purchased,
            Movement::TransferredIn => &mut self.transferred_in,
            Movement::TransferredOut => &mut self.transferred_out,
            Movement::Assigned => &mut self.assigned,
            Movement::Expended => &mut self.expended,
        };
        *slot = total;
    }

    /// Purchases plus incoming transfers minus outgoing transfers.
    pub fn net_movement(&self) -> i64 {
        self.purchased
            .saturating_add(self.transferred_in)
            .saturating_sub(self.transferred_out)
    }

    /// Net movement minus assigned and expended quantities.
    pub fn closing_balance(&self) -> i64 {
        OPENING_BALANCE
            .saturating_add(self.net_movement())
            .saturating_sub(self.assigned)
            .saturating_sub(self.expended)
    }
}

/// Dashboard figures returned to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalanceReport {
    pub opening_balance: i64,
    pub closing_balance: i64,
    pub net_movement: i64,
    pub assigned: i64,
    pub expended: i64,
}

impl BalanceReport {
    pub fn from_totals(totals: &MovementTotals) -> Self {
        Self {
            opening_balance: OPENING_BALANCE,
            closing_balance: totals.closing_balance(),
            net_movement: totals.net_movement(),
            assigned: totals.assigned,
            expended: totals.expended,
        }
    }
}
