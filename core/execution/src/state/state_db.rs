// lumen/core/execution/src/state/state_db.rs

// In-memory ledger state
use crate::ledger::{adjusted_amount, Ledger};
use dashmap::DashMap;
use lumen_primitives::{
    Address, Amount, Asset, AssetId, ContractRecord, StorageDiff, StorageValue,
};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

type SlotKey = (Address, String);
type BalanceKey = (Address, AssetId);

/// In-memory ledger used by tests and embedders without a disk backend
pub struct StateDB {
    /// Contract records, storage included
    contracts: Arc<DashMap<Address, ContractRecord>>,

    /// Storage audit log
    storage_changes: Arc<RwLock<BTreeMap<SlotKey, Vec<StorageDiff>>>>,

    contract_balances: Arc<DashMap<BalanceKey, Amount>>,

    /// Ordinary account balances
    balances: Arc<DashMap<BalanceKey, Amount>>,
}

impl StateDB {
    pub fn new() -> Self {
        Self {
            contracts: Arc::new(DashMap::new()),
            storage_changes: Arc::new(RwLock::new(BTreeMap::new())),
            contract_balances: Arc::new(DashMap::new()),
            balances: Arc::new(DashMap::new()),
        }
    }

    /// Seed a contract balance directly (genesis / tests)
    pub fn set_contract_balance(&self, address: Address, asset: Asset) {
        self.contract_balances
            .insert((address, asset.asset_id), asset.amount);
    }

    /// Seed an account balance directly (genesis / tests)
    pub fn set_balance(&self, address: Address, asset: Asset) {
        self.balances.insert((address, asset.asset_id), asset.amount);
    }

    /// Sum of every contract and account balance of one asset
    pub fn total_supply(&self, asset_id: AssetId) -> Amount {
        let contracts: Amount = self
            .contract_balances
            .iter()
            .filter(|e| e.key().1 == asset_id)
            .map(|e| *e.value())
            .sum();
        let accounts: Amount = self
            .balances
            .iter()
            .filter(|e| e.key().1 == asset_id)
            .map(|e| *e.value())
            .sum();
        contracts + accounts
    }

    pub fn contract_count(&self) -> usize {
        self.contracts.len()
    }

    /// Create snapshot for comparison or rollback
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            contracts: self
                .contracts
                .iter()
                .map(|e| (*e.key(), e.value().clone()))
                .collect(),
            storage_changes: self.storage_changes.read().clone(),
            contract_balances: self
                .contract_balances
                .iter()
                .map(|e| (*e.key(), *e.value()))
                .collect(),
            balances: self
                .balances
                .iter()
                .map(|e| (*e.key(), *e.value()))
                .collect(),
        }
    }

    /// Restore from snapshot
    pub fn restore(&self, snapshot: StateSnapshot) {
        self.contracts.clear();
        for (addr, record) in snapshot.contracts {
            self.contracts.insert(addr, record);
        }

        *self.storage_changes.write() = snapshot.storage_changes;

        self.contract_balances.clear();
        for (key, amount) in snapshot.contract_balances {
            self.contract_balances.insert(key, amount);
        }

        self.balances.clear();
        for (key, amount) in snapshot.balances {
            self.balances.insert(key, amount);
        }

        debug!("State restored from snapshot");
    }

    fn adjust(
        map: &DashMap<BalanceKey, Amount>,
        address: &Address,
        delta: Asset,
    ) -> anyhow::Result<()> {
        let key = (*address, delta.asset_id);
        let current = map.get(&key).map(|b| *b).unwrap_or(0);
        let next = adjusted_amount(current, delta.amount)?;
        map.insert(key, next);
        Ok(())
    }
}

impl Default for StateDB {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger for StateDB {
    fn has_contract(&self, address: &Address) -> anyhow::Result<bool> {
        Ok(self.contracts.contains_key(address))
    }

    fn get_contract(&self, address: &Address) -> anyhow::Result<Option<ContractRecord>> {
        Ok(self.contracts.get(address).map(|c| c.clone()))
    }

    fn store_contract(&self, record: &ContractRecord) -> anyhow::Result<()> {
        self.contracts.insert(record.contract_address, record.clone());
        debug!("Stored contract {}", record.contract_address);
        Ok(())
    }

    fn get_contract_storage(&self, address: &Address, slot: &str) -> anyhow::Result<StorageValue> {
        Ok(self
            .contracts
            .get(address)
            .map(|c| c.storage(slot))
            .unwrap_or_default())
    }

    fn set_contract_storage(
        &self,
        address: &Address,
        slot: &str,
        value: &StorageValue,
    ) -> anyhow::Result<()> {
        let mut contract = self
            .contracts
            .get_mut(address)
            .ok_or_else(|| anyhow::anyhow!("contract {} not found", address))?;
        contract.storages.insert(slot.to_string(), value.clone());
        Ok(())
    }

    fn add_contract_storage_change(
        &self,
        address: &Address,
        slot: &str,
        diff: &StorageDiff,
    ) -> anyhow::Result<()> {
        self.storage_changes
            .write()
            .entry((*address, slot.to_string()))
            .or_default()
            .push(diff.clone());
        Ok(())
    }

    fn get_contract_storage_changes(
        &self,
        address: &Address,
        slot: &str,
    ) -> anyhow::Result<Vec<StorageDiff>> {
        Ok(self
            .storage_changes
            .read()
            .get(&(*address, slot.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    fn get_contract_balance(&self, address: &Address, asset_id: AssetId) -> anyhow::Result<Amount> {
        Ok(self
            .contract_balances
            .get(&(*address, asset_id))
            .map(|b| *b)
            .unwrap_or(0))
    }

    fn adjust_contract_balance(&self, address: &Address, delta: Asset) -> anyhow::Result<()> {
        Self::adjust(&self.contract_balances, address, delta)
    }

    fn get_balance(&self, address: &Address, asset_id: AssetId) -> anyhow::Result<Amount> {
        Ok(self.balances.get(&(*address, asset_id)).map(|b| *b).unwrap_or(0))
    }

    fn adjust_balance(&self, address: &Address, delta: Asset) -> anyhow::Result<()> {
        Self::adjust(&self.balances, address, delta)
    }
}

/// Point-in-time copy of a [`StateDB`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSnapshot {
    contracts: BTreeMap<Address, ContractRecord>,
    storage_changes: BTreeMap<SlotKey, Vec<StorageDiff>>,
    contract_balances: BTreeMap<BalanceKey, Amount>,
    balances: BTreeMap<BalanceKey, Amount>,
}
