// lumen/core/storage/src/ledger.rs

use crate::db::{column_families::*, keys, RocksDB};
use anyhow::Result;
use lumen_execution::ledger::{adjusted_amount, Ledger};
use lumen_primitives::{
    Address, Amount, Asset, AssetId, ContractCode, ContractRecord, StorageDiff, StorageValue,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Contract record minus its storage, which lives in `CF_STORAGE`
#[derive(Debug, Serialize, Deserialize)]
struct StoredContract {
    contract_address: Address,
    code: ContractCode,
    owner_address: Address,
    create_time: u64,
}

/// Disk-backed [`Ledger`]
pub struct RocksLedger {
    db: RocksDB,
    /// Serializes read-modify-write updates (balances, change log heads)
    write_lock: Mutex<()>,
}

impl RocksLedger {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(RocksDB::open(path)?))
    }

    pub fn new(db: RocksDB) -> Self {
        Self {
            db,
            write_lock: Mutex::new(()),
        }
    }

    pub fn db(&self) -> &RocksDB {
        &self.db
    }

    /// Seed a contract balance directly (genesis)
    pub fn set_contract_balance(&self, address: &Address, asset: Asset) -> Result<()> {
        self.put_amount(CF_CONTRACT_BALANCES, address, asset)
    }

    /// Seed an account balance directly (genesis)
    pub fn set_balance(&self, address: &Address, asset: Asset) -> Result<()> {
        self.put_amount(CF_BALANCES, address, asset)
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()
    }

    fn put_amount(&self, cf: &str, address: &Address, asset: Asset) -> Result<()> {
        if asset.amount < 0 {
            anyhow::bail!("negative balance {} for {}", asset, address);
        }
        self.db.put_cf(
            cf,
            &keys::balance_key(address, asset.asset_id),
            &keys::encode_amount(asset.amount),
        )
    }

    fn get_amount(&self, cf: &str, address: &Address, asset_id: AssetId) -> Result<Amount> {
        match self.db.get_cf(cf, &keys::balance_key(address, asset_id))? {
            Some(bytes) => keys::decode_amount(&bytes),
            None => Ok(0),
        }
    }

    fn adjust_amount(&self, cf: &str, address: &Address, delta: Asset) -> Result<()> {
        let _guard = self.write_lock.lock();
        let current = self.get_amount(cf, address, delta.asset_id)?;
        let next = adjusted_amount(current, delta.amount)?;
        self.db.put_cf(
            cf,
            &keys::balance_key(address, delta.asset_id),
            &keys::encode_amount(next),
        )
    }
}

impl Ledger for RocksLedger {
    fn has_contract(&self, address: &Address) -> Result<bool> {
        self.db.exists_cf(CF_CONTRACTS, &keys::contract_key(address))
    }

    fn get_contract(&self, address: &Address) -> Result<Option<ContractRecord>> {
        let bytes = match self.db.get_cf(CF_CONTRACTS, &keys::contract_key(address))? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };
        let stored: StoredContract = bincode::deserialize(&bytes)?;
        let mut record = ContractRecord::new(
            stored.contract_address,
            stored.code,
            stored.owner_address,
            stored.create_time,
        );
        for (key, value) in self.db.prefix_scan_cf(CF_STORAGE, &keys::contract_key(address))? {
            let slot = keys::slot_of(&key)?;
            record.storages.insert(slot, StorageValue::from(value.as_ref()));
        }
        Ok(Some(record))
    }

    /// Record and storage land in one atomic batch
    fn store_contract(&self, record: &ContractRecord) -> Result<()> {
        let stored = StoredContract {
            contract_address: record.contract_address,
            code: record.code.clone(),
            owner_address: record.owner_address,
            create_time: record.create_time,
        };
        let address = &record.contract_address;

        let mut batch = self.db.batch();
        self.db.batch_put_cf(
            &mut batch,
            CF_CONTRACTS,
            &keys::contract_key(address),
            &bincode::serialize(&stored)?,
        )?;
        for (slot, value) in &record.storages {
            self.db.batch_put_cf(
                &mut batch,
                CF_STORAGE,
                &keys::storage_key(address, slot),
                value.as_bytes(),
            )?;
        }
        self.db.write_batch(batch)?;

        debug!(
            "Stored contract {} with {} slots",
            address,
            record.storages.len()
        );
        Ok(())
    }

    fn get_contract_storage(&self, address: &Address, slot: &str) -> Result<StorageValue> {
        Ok(self
            .db
            .get_cf(CF_STORAGE, &keys::storage_key(address, slot))?
            .map(StorageValue::from)
            .unwrap_or_default())
    }

    fn set_contract_storage(
        &self,
        address: &Address,
        slot: &str,
        value: &StorageValue,
    ) -> Result<()> {
        if !self.has_contract(address)? {
            anyhow::bail!("contract {} not found", address);
        }
        self.db
            .put_cf(CF_STORAGE, &keys::storage_key(address, slot), value.as_bytes())
    }

    fn add_contract_storage_change(
        &self,
        address: &Address,
        slot: &str,
        diff: &StorageDiff,
    ) -> Result<()> {
        let _guard = self.write_lock.lock();
        let head_key = keys::change_prefix(address, slot);
        let seq = match self.db.get_cf(CF_STORAGE_CHANGE_HEADS, &head_key)? {
            Some(bytes) => keys::decode_seq(&bytes)?,
            None => 0,
        };

        // entry and head move together
        let mut batch = self.db.batch();
        self.db.batch_put_cf(
            &mut batch,
            CF_STORAGE_CHANGES,
            &keys::change_key(address, slot, seq),
            &bincode::serialize(diff)?,
        )?;
        self.db.batch_put_cf(
            &mut batch,
            CF_STORAGE_CHANGE_HEADS,
            &head_key,
            &keys::encode_seq(seq + 1),
        )?;
        self.db.write_batch(batch)
    }

    fn get_contract_storage_changes(
        &self,
        address: &Address,
        slot: &str,
    ) -> Result<Vec<StorageDiff>> {
        self.db
            .prefix_scan_cf(CF_STORAGE_CHANGES, &keys::change_prefix(address, slot))?
            .into_iter()
            .map(|(_, value)| Ok(bincode::deserialize(&value)?))
            .collect()
    }

    fn get_contract_balance(&self, address: &Address, asset_id: AssetId) -> Result<Amount> {
        self.get_amount(CF_CONTRACT_BALANCES, address, asset_id)
    }

    fn adjust_contract_balance(&self, address: &Address, delta: Asset) -> Result<()> {
        self.adjust_amount(CF_CONTRACT_BALANCES, address, delta)
    }

    fn get_balance(&self, address: &Address, asset_id: AssetId) -> Result<Amount> {
        self.get_amount(CF_BALANCES, address, asset_id)
    }

    fn adjust_balance(&self, address: &Address, delta: Asset) -> Result<()> {
        self.adjust_amount(CF_BALANCES, address, delta)
    }
}
