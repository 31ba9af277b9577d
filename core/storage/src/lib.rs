// lumen/core/storage/src/lib.rs

// RocksDB-backed ledger for the contract engine
pub mod db;
pub mod ledger;

pub use db::RocksDB;
pub use ledger::RocksLedger;
