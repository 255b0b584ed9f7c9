//! Ownership-ledger client with precondition checks and gas fallback, the
//! reference in-memory ledger, and the advisory pending-transfer cache.

pub mod client;
pub mod memory;
pub mod pending;

pub use client::{
    LedgerBackend, LedgerClient, LedgerError, ReadErrorKind, CANCEL_GAS_LIMIT, CREATE_GAS_FALLBACK,
};
pub use memory::InMemoryLedger;
pub use pending::{CacheError, PendingTransferCache, SqlitePendingStore};
