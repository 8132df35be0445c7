//! Ledger domain module.
//!
//! Bases, asset types, the four recorded entry kinds and the balance
//! arithmetic, implemented as deterministic domain logic (no IO, no HTTP, no
//! storage).

pub mod audit;
pub mod balance;
pub mod directory;
pub mod entry;
pub mod quantity;

pub use audit::AuditRecord;
pub use balance::{BalanceFilter, BalanceReport, Movement, MovementTotals, OPENING_BALANCE};
pub use directory::{AssetType, Base};
pub use entry::{
    Assignment, EntryKind, EntryQuery, Expenditure, LedgerEntry, NewAssignment, NewExpenditure,
    NewPurchase, NewTransfer, Purchase, Transfer,
};
pub use quantity::Quantity;
