// lumen/core/execution/src/state/changeset.rs

// Uncommitted contract storage writes of one evaluation
use lumen_primitives::{Address, StorageChange, StorageValue};
use std::collections::HashMap;

/// Staged slots of one contract, in first-touch order
#[derive(Debug, Clone)]
pub struct ContractStorageChanges {
    pub address: Address,
    slots: Vec<(String, StorageChange)>,
    index: HashMap<String, usize>,
}

impl ContractStorageChanges {
    fn new(address: Address) -> Self {
        Self {
            address,
            slots: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StorageChange)> {
        self.slots.iter().map(|(slot, change)| (slot.as_str(), change))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Contract -> slot -> change, iterated in insertion order so every node
/// applies the same writes in the same sequence
#[derive(Debug, Clone, Default)]
pub struct StorageChangeSet {
    contracts: Vec<ContractStorageChanges>,
    index: HashMap<Address, usize>,
}

impl StorageChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a slot change. `before` is only used on the first touch;
    /// later writes replace `after` and the diff.
    pub fn record(
        &mut self,
        contract: Address,
        slot: &str,
        before: StorageValue,
        after: StorageValue,
    ) {
        let pos = match self.index.get(&contract) {
            Some(pos) => *pos,
            None => {
                self.contracts.push(ContractStorageChanges::new(contract));
                self.index.insert(contract, self.contracts.len() - 1);
                self.contracts.len() - 1
            }
        };
        let changes = &mut self.contracts[pos];

        match changes.index.get(slot) {
            Some(slot_pos) => changes.slots[*slot_pos].1.update(after),
            None => {
                changes
                    .slots
                    .push((slot.to_string(), StorageChange::new(before, after)));
                changes.index.insert(slot.to_string(), changes.slots.len() - 1);
            }
        }
    }

    pub fn get(&self, contract: &Address, slot: &str) -> Option<&StorageChange> {
        let changes = &self.contracts[*self.index.get(contract)?];
        changes.index.get(slot).map(|pos| &changes.slots[*pos].1)
    }

    /// Every staged change, contracts and slots in first-touch order
    pub fn iter(&self) -> impl Iterator<Item = (&Address, &str, &StorageChange)> {
        self.contracts.iter().flat_map(|changes| {
            changes
                .iter()
                .map(move |(slot, change)| (&changes.address, slot, change))
        })
    }

    pub fn contracts(&self) -> impl Iterator<Item = &ContractStorageChanges> {
        self.contracts.iter()
    }

    pub fn for_contract(&self, contract: &Address) -> Option<&ContractStorageChanges> {
        self.index.get(contract).map(|pos| &self.contracts[*pos])
    }

    /// Number of staged slot changes
    pub fn len(&self) -> usize {
        self.contracts.iter().map(|c| c.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    pub fn clear(&mut self) {
        self.contracts.clear();
        self.index.clear();
    }

    /// Move the staged changes out, leaving the set empty
    pub fn take(&mut self) -> StorageChangeSet {
        std::mem::take(self)
    }
}
