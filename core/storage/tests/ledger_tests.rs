// Tests for the RocksDB-backed ledger

use lumen_execution::vm::ScriptedEngineBuilder;
use lumen_execution::{EngineConfig, ExecutionEnv, ExecutionError, Ledger};
use lumen_primitives::{
    Address, Asset, AssetId, ContractCode, ContractRecord, ContractRegisterOperation, PublicKey,
    StorageDiff, StorageValue,
};
use lumen_storage::db::{column_families::CF_STORAGE_CHANGE_HEADS, keys};
use lumen_storage::RocksLedger;
use std::sync::Arc;
use tempfile::TempDir;

fn create_test_address(num: u8) -> Address {
    let mut addr = [0u8; 20];
    addr[0] = num;
    Address(addr)
}

fn v(s: &str) -> StorageValue {
    StorageValue::from(s.as_bytes())
}

fn record(num: u8) -> ContractRecord {
    let mut record = ContractRecord::new(
        create_test_address(num),
        ContractCode::new(vec!["init".into(), "get".into()], vec![num, 0x60]),
        create_test_address(0xee),
        1_700_000_000,
    );
    record.storages.insert("a".into(), v("1"));
    record.storages.insert("b".into(), v("two"));
    record
}

#[cfg(test)]
mod rocks_ledger_tests {
    use super::*;

    #[test]
    fn test_contract_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let ledger = RocksLedger::open(temp_dir.path()).unwrap();
        let rec = record(1);

        assert!(!ledger.has_contract(&rec.contract_address).unwrap());
        assert!(ledger.get_contract(&rec.contract_address).unwrap().is_none());

        ledger.store_contract(&rec).unwrap();
        // a neighbouring contract must not leak into the slot scan
        ledger.store_contract(&record(2)).unwrap();

        assert!(ledger.has_contract(&rec.contract_address).unwrap());
        assert_eq!(ledger.get_contract(&rec.contract_address).unwrap(), Some(rec.clone()));
        assert_eq!(ledger.get_contract_storage(&rec.contract_address, "b").unwrap(), v("two"));
        assert!(ledger
            .get_contract_storage(&rec.contract_address, "missing")
            .unwrap()
            .is_null());
    }

    #[test]
    fn test_storage_writes_and_change_log() {
        let temp_dir = TempDir::new().unwrap();
        let ledger = RocksLedger::open(temp_dir.path()).unwrap();
        let rec = record(1);
        let addr = rec.contract_address;
        ledger.store_contract(&rec).unwrap();

        ledger.set_contract_storage(&addr, "a", &v("11")).unwrap();
        assert_eq!(ledger.get_contract_storage(&addr, "a").unwrap(), v("11"));
        assert!(ledger
            .set_contract_storage(&create_test_address(9), "a", &v("x"))
            .is_err());

        let d1 = StorageDiff::between(&v("1"), &v("11"));
        let d2 = StorageDiff::between(&v("11"), &v("111"));
        ledger.add_contract_storage_change(&addr, "a", &d1).unwrap();
        ledger.add_contract_storage_change(&addr, "a", &d2).unwrap();
        ledger
            .add_contract_storage_change(&addr, "ab", &StorageDiff::between(&v(""), &v("z")))
            .unwrap();

        assert_eq!(ledger.get_contract_storage_changes(&addr, "a").unwrap(), vec![d1, d2]);
        assert_eq!(ledger.get_contract_storage_changes(&addr, "ab").unwrap().len(), 1);
        assert!(ledger.get_contract_storage_changes(&addr, "b").unwrap().is_empty());
    }

    #[test]
    fn test_change_log_head_tracks_appends_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let addr = create_test_address(8);
        let diffs: Vec<StorageDiff> = (0..12)
            .map(|i| StorageDiff::between(&v(&i.to_string()), &v(&(i + 1).to_string())))
            .collect();
        let head = |ledger: &RocksLedger| {
            let bytes = ledger
                .db()
                .get_cf(CF_STORAGE_CHANGE_HEADS, &keys::change_prefix(&addr, "n"))
                .unwrap()
                .unwrap();
            keys::decode_seq(&bytes).unwrap()
        };
        {
            let ledger = RocksLedger::open(temp_dir.path()).unwrap();
            for diff in &diffs[..10] {
                ledger.add_contract_storage_change(&addr, "n", diff).unwrap();
            }
            assert_eq!(head(&ledger), 10);
            ledger.flush().unwrap();
        }

        let ledger = RocksLedger::open(temp_dir.path()).unwrap();
        for diff in &diffs[10..] {
            ledger.add_contract_storage_change(&addr, "n", diff).unwrap();
        }
        assert_eq!(head(&ledger), 12);
        assert_eq!(ledger.get_contract_storage_changes(&addr, "n").unwrap(), diffs);
    }

    #[test]
    fn test_balances() {
        let temp_dir = TempDir::new().unwrap();
        let ledger = RocksLedger::open(temp_dir.path()).unwrap();
        let contract = create_test_address(1);
        let user = create_test_address(2);
        let gold = AssetId(7);

        ledger.set_contract_balance(&contract, Asset::new(100, gold)).unwrap();
        ledger.adjust_contract_balance(&contract, Asset::new(-40, gold)).unwrap();
        ledger.adjust_balance(&user, Asset::new(40, gold)).unwrap();

        assert_eq!(ledger.get_contract_balance(&contract, gold).unwrap(), 60);
        assert_eq!(ledger.get_balance(&user, gold).unwrap(), 40);
        assert_eq!(ledger.get_balance(&user, AssetId::CORE).unwrap(), 0);

        assert!(ledger.adjust_contract_balance(&contract, Asset::new(-61, gold)).is_err());
        assert_eq!(ledger.get_contract_balance(&contract, gold).unwrap(), 60);
        assert!(ledger.set_balance(&user, Asset::new(-1, gold)).is_err());
    }

    #[test]
    fn test_state_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let rec = record(3);
        let addr = rec.contract_address;
        let diff = StorageDiff::between(&v("1"), &v("2"));
        {
            let ledger = RocksLedger::open(temp_dir.path()).unwrap();
            ledger.store_contract(&rec).unwrap();
            ledger.set_contract_storage(&addr, "a", &v("2")).unwrap();
            ledger.add_contract_storage_change(&addr, "a", &diff).unwrap();
            ledger.set_contract_balance(&addr, Asset::core(500)).unwrap();
            ledger.adjust_balance(&create_test_address(4), Asset::core(5)).unwrap();
            ledger.flush().unwrap();
        }

        let ledger = RocksLedger::open(temp_dir.path()).unwrap();
        let loaded = ledger.get_contract(&addr).unwrap().unwrap();
        assert_eq!(loaded.code, rec.code);
        assert_eq!(loaded.storage("a"), v("2"));
        assert_eq!(loaded.storage("b"), v("two"));
        assert_eq!(ledger.get_contract_storage_changes(&addr, "a").unwrap(), vec![diff]);
        assert_eq!(ledger.get_contract_balance(&addr, AssetId::CORE).unwrap(), 500);
        assert_eq!(ledger.get_balance(&create_test_address(4), AssetId::CORE).unwrap(), 5);
    }

    #[test]
    fn test_register_applies_to_disk() {
        let temp_dir = TempDir::new().unwrap();
        let ledger = Arc::new(RocksLedger::open(temp_dir.path()).unwrap());
        let builder = Arc::new(ScriptedEngineBuilder::new(|inv, host, meter| {
            meter.charge(10)?;
            host.set_storage(&inv.contract, "owner", StorageValue::from(b"set".as_slice()))?;
            if inv.api != "init" {
                return Err(ExecutionError::contract("constructor only"));
            }
            Ok(vec![])
        }));
        let env = Arc::new(
            ExecutionEnv::new(ledger.clone(), builder, EngineConfig::default()).unwrap(),
        );
        let contract = create_test_address(5);

        let op = ContractRegisterOperation {
            contract_id: contract,
            owner_pubkey: PublicKey::new([1; 32]),
            owner_addr: create_test_address(6),
            contract_code: ContractCode::new(vec!["init".into()], vec![0x01]),
            init_cost: 100,
            gas_price: 1,
            register_time: 42,
        };
        let mut evaluator = env.evaluator(op.into());
        let receipt = evaluator.evaluate().unwrap();
        assert!(!ledger.has_contract(&contract).unwrap());
        evaluator.apply(receipt).unwrap();

        let loaded = ledger.get_contract(&contract).unwrap().unwrap();
        assert_eq!(loaded.create_time, 42);
        assert_eq!(loaded.storage("owner"), StorageValue::from(b"set".as_slice()));
        assert_eq!(ledger.get_contract_storage_changes(&contract, "owner").unwrap().len(), 1);
    }
}
