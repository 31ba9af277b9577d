// lumen/core/execution/src/state/mod.rs

// State management module
// Per-evaluation staging areas and the in-memory ledger

pub mod balances;
pub mod changeset;
pub mod state_db;

pub use balances::{BalanceTransferLedger, TransferTotals};
pub use changeset::{ContractStorageChanges, StorageChangeSet};
pub use state_db::{StateDB, StateSnapshot};
