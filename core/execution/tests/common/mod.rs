// Shared fixtures for the evaluator integration tests
#![allow(dead_code)]

use lumen_execution::vm::{GasMeter, Invocation, ScriptedEngineBuilder};
use lumen_execution::{ChainApi, EngineConfig, ExecutionEnv, ExecutionError, Ledger, StateDB};
use lumen_primitives::{
    Address, Asset, AssetId, ContractCode, ContractInvokeOperation, ContractRecord,
    ContractRegisterOperation, PublicKey, StorageValue,
};
use std::sync::Arc;

pub const OWNER: Address = Address([0xaa; 20]);
pub const CALLER: Address = Address([0xbb; 20]);
pub const ALICE: Address = Address([0xa1; 20]);
pub const BOB: Address = Address([0xb0; 20]);
pub const GOLD: AssetId = AssetId(7);

pub fn create_test_address(num: u8) -> Address {
    let mut addr = [0u8; 20];
    addr[0] = num;
    Address(addr)
}

pub fn counter_code() -> ContractCode {
    ContractCode::new(
        vec![
            "init".into(),
            "get".into(),
            "inc".into(),
            "inc_twice".into(),
            "pay".into(),
            "inc_pay".into(),
            "burn".into(),
            "poke".into(),
        ],
        vec![0x60, 0x80, 0x60, 0x40],
    )
}

fn json(value: u64) -> Result<StorageValue, ExecutionError> {
    StorageValue::from_json(&value).map_err(|e| ExecutionError::contract(e.to_string()))
}

fn read_count(host: &dyn ChainApi, contract: &Address) -> Result<u64, ExecutionError> {
    let value = host.get_storage(contract, "count")?;
    if value.is_null() {
        return Ok(0);
    }
    value
        .to_json::<u64>()
        .map_err(|e| ExecutionError::contract(e.to_string()))
}

fn pay(host: &mut dyn ChainApi, arg: &str) -> Result<(), ExecutionError> {
    let payments: Vec<serde_json::Value> =
        serde_json::from_str(arg).map_err(|e| ExecutionError::contract(e.to_string()))?;
    for payment in payments {
        let to = payment["to"]
            .as_str()
            .and_then(Address::from_hex)
            .ok_or_else(|| ExecutionError::contract("bad payee"))?;
        let amount = payment["amount"].as_i64().unwrap_or(0);
        let asset = AssetId(payment["asset"].as_u64().unwrap_or(0));
        host.transfer(Asset::new(amount, asset), &to)?;
    }
    Ok(())
}

/// A counter contract with a few extra entry points used by the tests
pub fn counter_script(
    inv: &Invocation,
    host: &mut dyn ChainApi,
    meter: &mut GasMeter,
) -> Result<Vec<u8>, ExecutionError> {
    let me = host.current_contract();
    if host.get_contract_info(&me)?.is_none() {
        return Err(ExecutionError::contract(format!("contract {} not found", me)));
    }
    match inv.api.as_str() {
        "init" => {
            meter.charge(50)?;
            host.set_storage(&me, "count", json(0)?)?;
            Ok(vec![])
        }
        "get" => Ok(read_count(host, &me)?.to_string().into_bytes()),
        "inc" => {
            meter.charge(20)?;
            let next = read_count(host, &me)? + 1;
            host.set_storage(&me, "count", json(next)?)?;
            Ok(next.to_string().into_bytes())
        }
        "inc_twice" => {
            meter.charge(40)?;
            let next = read_count(host, &me)? + 1;
            host.set_storage(&me, "count", json(next)?)?;
            host.set_storage(&me, "count", json(next + 1)?)?;
            Ok(vec![])
        }
        "pay" => {
            meter.charge(30)?;
            pay(host, &inv.arg)?;
            Ok(vec![])
        }
        "inc_pay" => {
            meter.charge(50)?;
            let next = read_count(host, &me)? + 1;
            host.set_storage(&me, "count", json(next)?)?;
            pay(host, &inv.arg)?;
            Ok(vec![])
        }
        "burn" => loop {
            meter.charge(10)?;
        },
        "poke" => {
            let other = Address::from_hex(&inv.arg)
                .ok_or_else(|| ExecutionError::contract("bad address"))?;
            host.set_storage(&other, "poked", StorageValue::from(b"yes".as_slice()))?;
            Ok(vec![])
        }
        other => Err(ExecutionError::contract(format!("unknown api {}", other))),
    }
}

/// Constructor that runs `api` of the counter script instead of `init`
pub fn constructor_running(api: &'static str) -> ScriptedEngineBuilder {
    ScriptedEngineBuilder::new(move |inv, host, meter| {
        let mut inv = inv.clone();
        if inv.is_constructor() {
            inv.api = api.to_string();
        }
        counter_script(&inv, host, meter)
    })
}

pub fn setup() -> (Arc<StateDB>, Arc<ScriptedEngineBuilder>, Arc<ExecutionEnv>) {
    setup_with(ScriptedEngineBuilder::new(counter_script))
}

pub fn setup_with(
    builder: ScriptedEngineBuilder,
) -> (Arc<StateDB>, Arc<ScriptedEngineBuilder>, Arc<ExecutionEnv>) {
    let db = Arc::new(StateDB::new());
    let builder = Arc::new(builder);
    let env = ExecutionEnv::new(db.clone(), builder.clone(), EngineConfig::default())
        .expect("default config is valid");
    (db, builder, Arc::new(env))
}

pub fn register_op(contract: Address) -> ContractRegisterOperation {
    ContractRegisterOperation {
        contract_id: contract,
        owner_pubkey: PublicKey::new([0xaa; 32]),
        owner_addr: OWNER,
        contract_code: counter_code(),
        init_cost: 1_000,
        gas_price: 5,
        register_time: 1_700_000_000,
    }
}

pub fn invoke_op(contract: Address, api: &str, arg: &str) -> ContractInvokeOperation {
    ContractInvokeOperation {
        contract_id: contract,
        caller_pubkey: PublicKey::new([0xbb; 32]),
        caller_addr: CALLER,
        contract_api: api.to_string(),
        contract_arg: arg.to_string(),
        invoke_cost: 1_000,
        gas_price: 2,
    }
}

/// Put a counter contract directly on the ledger
pub fn deploy(db: &StateDB, contract: Address, count: u64) {
    let mut record = ContractRecord::new(contract, counter_code(), OWNER, 1);
    record
        .storages
        .insert("count".into(), StorageValue::from_json(&count).unwrap());
    db.store_contract(&record).unwrap();
}

pub fn payments(list: &[(Address, i64, AssetId)]) -> String {
    let items: Vec<serde_json::Value> = list
        .iter()
        .map(|(to, amount, asset)| {
            serde_json::json!({ "to": to.to_string(), "amount": amount, "asset": asset.0 })
        })
        .collect();
    serde_json::Value::Array(items).to_string()
}
