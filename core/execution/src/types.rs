// lumen/core/execution/src/types.rs

// Error taxonomy and gas accounting shared by the evaluators
use lumen_primitives::{Address, Amount, AssetId};
use serde::{Deserialize, Serialize};

/// Rejections raised before any VM execution
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Contract address must be unique: {0} already exists")]
    ContractAlreadyExists(Address),

    #[error("Cost limit must be positive, got {0}")]
    NonPositiveCostLimit(i64),

    #[error("Gas price must not be negative, got {0}")]
    NegativeGasPrice(i64),
}

/// Execution error
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Executor internal error: {0}")]
    Internal(String),

    #[error("Gas used {gas_used} outside of (0, {limit}]")]
    GasOutOfBounds { gas_used: u64, limit: u64 },

    #[error("Ledger error: {0:#}")]
    Ledger(#[from] anyhow::Error),

    #[error("Contract ran out of gas (limit {limit})")]
    OutOfGas { limit: u64 },

    #[error("Contract error: {0}")]
    ContractRuntime(String),

    #[error("Insufficient contract balance of {asset_id}: need {need}, have {have}")]
    InsufficientBalance {
        asset_id: AssetId,
        need: Amount,
        have: Amount,
    },
}

/// Coarse classification of [`ExecutionError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Internal,
    OutOfGas,
    ContractRuntime,
    InsufficientBalance,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Internal => "internal",
            ErrorKind::OutOfGas => "out_of_gas",
            ErrorKind::ContractRuntime => "contract_error",
            ErrorKind::InsufficientBalance => "insufficient_balance",
        }
    }
}

impl ExecutionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExecutionError::Validation(_) => ErrorKind::Validation,
            ExecutionError::Internal(_)
            | ExecutionError::GasOutOfBounds { .. }
            | ExecutionError::Ledger(_) => ErrorKind::Internal,
            ExecutionError::OutOfGas { .. } => ErrorKind::OutOfGas,
            ExecutionError::ContractRuntime(_) => ErrorKind::ContractRuntime,
            ExecutionError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ExecutionError::Internal(msg.into())
    }

    pub fn contract(msg: impl Into<String>) -> Self {
        ExecutionError::ContractRuntime(msg.into())
    }
}

/// Gas metering of one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasAccount {
    pub gas_used: u64,
    pub cost_limit: u64,
    pub gas_price: Amount,
}

impl GasAccount {
    /// Accept the VM's metering only if `0 < gas_used <= cost_limit`
    pub fn checked(gas_used: u64, cost_limit: u64, gas_price: Amount) -> Result<Self, ExecutionError> {
        if gas_used == 0 || gas_used > cost_limit {
            return Err(ExecutionError::GasOutOfBounds {
                gas_used,
                limit: cost_limit,
            });
        }
        Ok(Self {
            gas_used,
            cost_limit,
            gas_price,
        })
    }
}
