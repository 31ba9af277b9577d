// lumen/core/execution/src/host.rs

// Chain API the VM calls back into while a contract runs
use crate::ledger::Ledger;
use crate::state::{BalanceTransferLedger, StorageChangeSet};
use crate::types::ExecutionError;
use lumen_primitives::{Address, Asset, ContractCode, ContractInfo, StorageValue};
use tracing::trace;

/// Capability surface exposed to a running contract.
///
/// Every read resolves against what the current evaluation has staged
/// before falling back to the ledger; every write is staged only.
pub trait ChainApi {
    /// Contract whose code is executing
    fn current_contract(&self) -> Address;

    fn get_contract_info(&self, contract: &Address) -> Result<Option<ContractInfo>, ExecutionError>;

    fn get_contract_code(&self, contract: &Address) -> Result<Option<ContractCode>, ExecutionError>;

    fn get_storage(&self, contract: &Address, slot: &str) -> Result<StorageValue, ExecutionError>;

    fn set_storage(
        &mut self,
        contract: &Address,
        slot: &str,
        value: StorageValue,
    ) -> Result<(), ExecutionError>;

    /// Move `amount` from the executing contract to `to`
    fn transfer(&mut self, amount: Asset, to: &Address) -> Result<(), ExecutionError>;
}

/// Contract being registered by the current operation; not yet on the ledger
#[derive(Debug, Clone, Copy)]
pub struct PendingContract<'a> {
    pub address: &'a Address,
    pub code: &'a ContractCode,
}

/// [`ChainApi`] for exactly one VM invocation, borrowing the evaluator's
/// staging state for that call only
pub struct HostContext<'a> {
    ledger: &'a dyn Ledger,
    contract: Address,
    pending: Option<PendingContract<'a>>,
    changes: &'a mut StorageChangeSet,
    transfers: &'a mut BalanceTransferLedger,
}

impl<'a> HostContext<'a> {
    pub fn new(
        ledger: &'a dyn Ledger,
        contract: Address,
        changes: &'a mut StorageChangeSet,
        transfers: &'a mut BalanceTransferLedger,
    ) -> Self {
        Self {
            ledger,
            contract,
            pending: None,
            changes,
            transfers,
        }
    }

    /// Resolve lookups for `pending` against the operation instead of the ledger
    pub fn with_pending(mut self, pending: PendingContract<'a>) -> Self {
        self.pending = Some(pending);
        self
    }

    fn pending_code(&self, contract: &Address) -> Option<&'a ContractCode> {
        self.pending
            .filter(|p| p.address == contract)
            .map(|p| p.code)
    }

    /// Value before this evaluation touched the slot
    fn committed_storage(&self, contract: &Address, slot: &str) -> Result<StorageValue, ExecutionError> {
        if self.pending_code(contract).is_some() {
            return Ok(StorageValue::null());
        }
        Ok(self.ledger.get_contract_storage(contract, slot)?)
    }
}

impl ChainApi for HostContext<'_> {
    fn current_contract(&self) -> Address {
        self.contract
    }

    fn get_contract_info(&self, contract: &Address) -> Result<Option<ContractInfo>, ExecutionError> {
        if let Some(code) = self.pending_code(contract) {
            return Ok(Some(ContractInfo::from(code)));
        }
        Ok(self.ledger.get_contract(contract)?.map(|c| c.info()))
    }

    fn get_contract_code(&self, contract: &Address) -> Result<Option<ContractCode>, ExecutionError> {
        if let Some(code) = self.pending_code(contract) {
            return Ok(Some(code.clone()));
        }
        Ok(self.ledger.get_contract(contract)?.map(|c| c.code))
    }

    fn get_storage(&self, contract: &Address, slot: &str) -> Result<StorageValue, ExecutionError> {
        if let Some(change) = self.changes.get(contract, slot) {
            return Ok(change.after.clone());
        }
        self.committed_storage(contract, slot)
    }

    fn set_storage(
        &mut self,
        contract: &Address,
        slot: &str,
        value: StorageValue,
    ) -> Result<(), ExecutionError> {
        let before = match self.changes.get(contract, slot) {
            Some(change) => change.before.clone(),
            None => {
                if self.pending_code(contract).is_none() && !self.ledger.has_contract(contract)? {
                    return Err(ExecutionError::contract(format!(
                        "storage write to unknown contract {}",
                        contract
                    )));
                }
                self.committed_storage(contract, slot)?
            }
        };
        trace!("Staged storage {}:{} = {:?}", contract, slot, value);
        self.changes.record(*contract, slot, before, value);
        Ok(())
    }

    fn transfer(&mut self, amount: Asset, to: &Address) -> Result<(), ExecutionError> {
        self.transfers.transfer(self.ledger, amount, to)
    }
}
