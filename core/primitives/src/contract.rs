// lumen/core/primitives/src/contract.rs

use crate::address::Address;
use crate::storage::StorageValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Contract bytecode together with its ABI
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCode {
    /// Callable APIs
    pub abi: Vec<String>,
    /// APIs that may only be called off-chain (no state change)
    pub offline_abi: Vec<String>,
    /// Events the contract may emit
    pub events: Vec<String>,
    pub bytecode: Vec<u8>,
}

impl ContractCode {
    pub fn new(abi: Vec<String>, bytecode: Vec<u8>) -> Self {
        Self {
            abi,
            offline_abi: Vec::new(),
            events: Vec::new(),
            bytecode,
        }
    }

    /// Keccak-256 of the bytecode
    pub fn code_hash(&self) -> [u8; 32] {
        use sha3::{Digest, Keccak256};
        let mut hasher = Keccak256::new();
        hasher.update(&self.bytecode);
        hasher.finalize().into()
    }

    pub fn has_api(&self, name: &str) -> bool {
        self.abi.iter().any(|api| api == name)
    }
}

/// API surface of a contract as seen by the VM
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractInfo {
    pub apis: Vec<String>,
    pub offline_apis: Vec<String>,
}

impl From<&ContractCode> for ContractInfo {
    fn from(code: &ContractCode) -> Self {
        Self {
            apis: code.abi.clone(),
            offline_apis: code.offline_abi.clone(),
        }
    }
}

/// Persisted contract, keyed by its address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractRecord {
    pub contract_address: Address,
    pub code: ContractCode,
    pub owner_address: Address,
    pub create_time: u64,
    /// Slot name -> current value
    pub storages: BTreeMap<String, StorageValue>,
}

impl ContractRecord {
    pub fn new(
        contract_address: Address,
        code: ContractCode,
        owner_address: Address,
        create_time: u64,
    ) -> Self {
        Self {
            contract_address,
            code,
            owner_address,
            create_time,
            storages: BTreeMap::new(),
        }
    }

    pub fn info(&self) -> ContractInfo {
        ContractInfo::from(&self.code)
    }

    /// Current value of a slot; null when never written
    pub fn storage(&self, slot: &str) -> StorageValue {
        self.storages.get(slot).cloned().unwrap_or_default()
    }
}
