// lumen/core/primitives/src/lib.rs

// Shared ledger types for contract registration and invocation
pub mod address;
pub mod asset;
pub mod contract;
pub mod operation;
pub mod storage;

pub use address::{Address, PublicKey};
pub use asset::{Amount, Asset, AssetId};
pub use contract::{ContractCode, ContractInfo, ContractRecord};
pub use operation::{ContractInvokeOperation, ContractOperation, ContractRegisterOperation};
pub use storage::{DiffError, StorageChange, StorageDiff, StorageValue};
