//! Infrastructure layer: ledger storage backends and the balance calculator.

pub mod balance;
pub mod ledger_store;

pub use balance::BalanceCalculator;
