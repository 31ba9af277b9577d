// lumen/core/execution/src/ledger.rs

use lumen_primitives::{Address, Amount, Asset, AssetId, ContractRecord, StorageDiff, StorageValue};

/// Persistent ledger state the evaluators read from and apply into.
///
/// Evaluation only ever calls the read methods; the write methods are
/// reserved for the apply phase.
pub trait Ledger: Send + Sync {
    fn has_contract(&self, address: &Address) -> anyhow::Result<bool>;

    fn get_contract(&self, address: &Address) -> anyhow::Result<Option<ContractRecord>>;

    fn store_contract(&self, record: &ContractRecord) -> anyhow::Result<()>;

    /// Current value of a slot, null if never written or the contract is unknown
    fn get_contract_storage(&self, address: &Address, slot: &str) -> anyhow::Result<StorageValue>;

    /// Overwrite a slot of an existing contract
    fn set_contract_storage(
        &self,
        address: &Address,
        slot: &str,
        value: &StorageValue,
    ) -> anyhow::Result<()>;

    /// Append to the storage audit log
    fn add_contract_storage_change(
        &self,
        address: &Address,
        slot: &str,
        diff: &StorageDiff,
    ) -> anyhow::Result<()>;

    /// Audit log of a slot, oldest first
    fn get_contract_storage_changes(
        &self,
        address: &Address,
        slot: &str,
    ) -> anyhow::Result<Vec<StorageDiff>>;

    fn get_contract_balance(&self, address: &Address, asset_id: AssetId) -> anyhow::Result<Amount>;

    /// Add `delta` (possibly negative) to a contract balance
    fn adjust_contract_balance(&self, address: &Address, delta: Asset) -> anyhow::Result<()>;

    fn get_balance(&self, address: &Address, asset_id: AssetId) -> anyhow::Result<Amount>;

    /// Add `delta` (possibly negative) to an ordinary account balance
    fn adjust_balance(&self, address: &Address, delta: Asset) -> anyhow::Result<()>;
}

/// Apply `delta` to `current`, refusing overflow and negative results
pub fn adjusted_amount(current: Amount, delta: Amount) -> anyhow::Result<Amount> {
    let next = current
        .checked_add(delta)
        .ok_or_else(|| anyhow::anyhow!("balance overflow: {} + {}", current, delta))?;
    if next < 0 {
        anyhow::bail!("balance would become negative: {} + {}", current, delta);
    }
    Ok(next)
}
