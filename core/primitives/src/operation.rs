// lumen/core/primitives/src/operation.rs

// Contract operations submitted to the ledger
use crate::address::{Address, PublicKey};
use crate::contract::ContractCode;
use serde::{Deserialize, Serialize};

/// Register a new contract and run its constructor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractRegisterOperation {
    pub contract_id: Address,
    pub owner_pubkey: PublicKey,
    pub owner_addr: Address,
    pub contract_code: ContractCode,
    /// Gas limit for the constructor
    pub init_cost: i64,
    pub gas_price: i64,
    pub register_time: u64,
}

/// Call a named API of an existing contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractInvokeOperation {
    pub contract_id: Address,
    pub caller_pubkey: PublicKey,
    pub caller_addr: Address,
    pub contract_api: String,
    pub contract_arg: String,
    /// Gas limit for the call
    pub invoke_cost: i64,
    pub gas_price: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractOperation {
    Register(ContractRegisterOperation),
    Invoke(ContractInvokeOperation),
}

impl ContractOperation {
    pub fn contract_id(&self) -> &Address {
        match self {
            ContractOperation::Register(op) => &op.contract_id,
            ContractOperation::Invoke(op) => &op.contract_id,
        }
    }

    pub fn caller(&self) -> (&PublicKey, &Address) {
        match self {
            ContractOperation::Register(op) => (&op.owner_pubkey, &op.owner_addr),
            ContractOperation::Invoke(op) => (&op.caller_pubkey, &op.caller_addr),
        }
    }

    /// Gas limit the operation is willing to pay for
    pub fn cost_limit(&self) -> i64 {
        match self {
            ContractOperation::Register(op) => op.init_cost,
            ContractOperation::Invoke(op) => op.invoke_cost,
        }
    }

    pub fn gas_price(&self) -> i64 {
        match self {
            ContractOperation::Register(op) => op.gas_price,
            ContractOperation::Invoke(op) => op.gas_price,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ContractOperation::Register(_) => "register",
            ContractOperation::Invoke(_) => "invoke",
        }
    }
}

impl From<ContractRegisterOperation> for ContractOperation {
    fn from(op: ContractRegisterOperation) -> Self {
        ContractOperation::Register(op)
    }
}

impl From<ContractInvokeOperation> for ContractOperation {
    fn from(op: ContractInvokeOperation) -> Self {
        ContractOperation::Invoke(op)
    }
}
