// lumen/core/storage/src/db/column_families.rs

/// Column family definitions for RocksDB
pub const CF_DEFAULT: &str = "default";
/// Contract address -> code and metadata
pub const CF_CONTRACTS: &str = "contracts";
/// Contract address ++ slot -> current value
pub const CF_STORAGE: &str = "storage";
/// Contract address ++ slot ++ sequence -> diff
pub const CF_STORAGE_CHANGES: &str = "storage_changes";
/// Contract address ++ slot -> number of logged changes
pub const CF_STORAGE_CHANGE_HEADS: &str = "storage_change_heads";
pub const CF_CONTRACT_BALANCES: &str = "contract_balances";
pub const CF_BALANCES: &str = "balances";

/// Get all column families
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        CF_DEFAULT,
        CF_CONTRACTS,
        CF_STORAGE,
        CF_STORAGE_CHANGES,
        CF_STORAGE_CHANGE_HEADS,
        CF_CONTRACT_BALANCES,
        CF_BALANCES,
    ]
}
