// lumen/core/execution/src/gas.rs

// Conversion of metered gas into ledger fees
use crate::types::ExecutionError;
use lumen_primitives::{Amount, ContractCode};
use serde::{Deserialize, Serialize};

/// Gas units billed as one fee unit
pub const GAS_PER_FEE_UNIT: u64 = 100;

/// Flat fee charged for every contract registration
pub const CONTRACT_REGISTER_FEE: Amount = 10;

/// Fee schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GasSchedule {
    pub gas_per_fee_unit: u64,
    pub contract_register_fee: Amount,
}

impl Default for GasSchedule {
    fn default() -> Self {
        Self {
            gas_per_fee_unit: GAS_PER_FEE_UNIT,
            contract_register_fee: CONTRACT_REGISTER_FEE,
        }
    }
}

impl GasSchedule {
    /// Every started block of `gas_per_fee_unit` gas costs `gas_price`
    pub fn gas_fee(&self, gas_price: Amount, gas_used: u64) -> Result<Amount, ExecutionError> {
        if self.gas_per_fee_unit == 0 {
            return Err(ExecutionError::internal("gas_per_fee_unit must be positive"));
        }
        let units = gas_used.div_ceil(self.gas_per_fee_unit);
        let fee = Amount::try_from(units)
            .ok()
            .and_then(|units| units.checked_mul(gas_price))
            .ok_or_else(|| {
                ExecutionError::internal(format!(
                    "gas fee overflow: {} gas at price {}",
                    gas_used, gas_price
                ))
            })?;
        if fee < 0 {
            return Err(ExecutionError::internal(format!("negative gas fee {}", fee)));
        }
        Ok(fee)
    }

    pub fn register_fee(&self, _code: &ContractCode) -> Amount {
        self.contract_register_fee
    }

    /// Metered fee plus the flat registration fee
    pub fn total_register_fee(
        &self,
        gas_price: Amount,
        gas_used: u64,
        code: &ContractCode,
    ) -> Result<Amount, ExecutionError> {
        self.gas_fee(gas_price, gas_used)?
            .checked_add(self.register_fee(code))
            .ok_or_else(|| ExecutionError::internal("register fee overflow"))
    }
}

/// Fee under the default schedule
pub fn count_gas_fee(gas_price: Amount, gas_used: u64) -> Result<Amount, ExecutionError> {
    GasSchedule::default().gas_fee(gas_price, gas_used)
}
