//! Ledger storage boundary.
//!
//! The traits here are the only way the rest of the system reaches recorded
//! bases, asset types and entries. Implementations exist for tests/dev
//! (in-memory) and production (Postgres).

pub mod in_memory;
pub mod postgres;
pub mod query;
pub mod r#trait;

pub use in_memory::InMemoryLedgerStore;
pub use postgres::PostgresLedgerStore;
pub use query::Pagination;
pub use r#trait::{DirectoryStore, LedgerBackend, LedgerStore, StoreError};
