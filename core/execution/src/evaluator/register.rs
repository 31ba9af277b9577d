// lumen/core/execution/src/evaluator/register.rs

use super::{check_cost_limit, check_gas_price, EvaluationReceipt, EvaluatorState, ExecutionEnv, Lifecycle};
use crate::host::{HostContext, PendingContract};
use crate::metrics::{record_evaluation, CONTRACT_GAS_USED, STORAGE_CHANGES_APPLIED_TOTAL};
use crate::state::{BalanceTransferLedger, StorageChangeSet};
use crate::types::{ExecutionError, GasAccount, ValidationError};
use lumen_primitives::{ContractRecord, ContractRegisterOperation};
use std::sync::Arc;
use tracing::{debug, info, info_span, warn};

/// Evaluates a contract registration: runs the constructor against
/// staged state and, on apply, persists the new contract.
pub struct ContractRegisterEvaluator {
    env: Arc<ExecutionEnv>,
    op: ContractRegisterOperation,
    lifecycle: Lifecycle,
    changes: StorageChangeSet,
    transfers: BalanceTransferLedger,
    /// Record persisted on apply
    staged: Option<ContractRecord>,
}

impl ContractRegisterEvaluator {
    pub fn new(env: Arc<ExecutionEnv>, op: ContractRegisterOperation) -> Self {
        let transfers = BalanceTransferLedger::new(op.contract_id);
        Self {
            env,
            op,
            lifecycle: Lifecycle::default(),
            changes: StorageChangeSet::new(),
            transfers,
            staged: None,
        }
    }

    pub fn operation(&self) -> &ContractRegisterOperation {
        &self.op
    }

    pub fn state(&self) -> EvaluatorState {
        self.lifecycle.state
    }

    /// Storage staged by the last evaluation
    pub fn changes(&self) -> &StorageChangeSet {
        &self.changes
    }

    pub fn staged_record(&self) -> Option<&ContractRecord> {
        self.staged.as_ref()
    }

    /// Validate the operation and run the constructor. Persisted state is
    /// never touched; on success the returned receipt authorizes [`apply`].
    ///
    /// [`apply`]: Self::apply
    pub fn evaluate(&mut self) -> Result<EvaluationReceipt, ExecutionError> {
        let span = info_span!("register.evaluate", contract = %self.op.contract_id);
        let _enter = span.enter();

        self.lifecycle.restart()?;
        self.reset_staging();

        match self.validate().and_then(|limit| self.execute(limit)) {
            Ok(receipt) => {
                self.lifecycle.succeed(&receipt);
                record_evaluation("register", "success");
                CONTRACT_GAS_USED.observe(receipt.gas().gas_used as f64);
                info!(
                    "Contract {} registration evaluated: gas_used={}, fee={}",
                    self.op.contract_id,
                    receipt.gas().gas_used,
                    receipt.fee()
                );
                Ok(receipt)
            }
            Err(e) => {
                self.reset_staging();
                self.lifecycle.fail();
                record_evaluation("register", e.kind().as_str());
                warn!("Contract {} registration failed: {}", self.op.contract_id, e);
                Err(e)
            }
        }
    }

    fn reset_staging(&mut self) {
        self.changes.clear();
        self.transfers.clear();
        self.staged = None;
    }

    fn validate(&mut self) -> Result<u64, ExecutionError> {
        if self.env.ledger().has_contract(&self.op.contract_id)? {
            return Err(ValidationError::ContractAlreadyExists(self.op.contract_id).into());
        }
        let limit = check_cost_limit(self.op.init_cost)?;
        check_gas_price(self.op.gas_price)?;

        self.lifecycle.state = EvaluatorState::Validated;
        Ok(limit)
    }

    fn execute(&mut self, cost_limit: u64) -> Result<EvaluationReceipt, ExecutionError> {
        self.lifecycle.state = EvaluatorState::Executing;

        let mut engine = self.env.engines().build();
        engine.set_caller(&self.op.owner_pubkey, &self.op.owner_addr);
        engine.clear_exceptions();
        engine.set_gas_limit(cost_limit);
        self.changes.clear();

        let address = self.op.contract_id;
        {
            let mut host = HostContext::new(
                self.env.ledger(),
                address,
                &mut self.changes,
                &mut self.transfers,
            )
            .with_pending(PendingContract {
                address: &self.op.contract_id,
                code: &self.op.contract_code,
            });
            engine.execute_constructor(&address, &mut host)?;
        }

        let gas = GasAccount::checked(engine.gas_used(), cost_limit, self.op.gas_price)?;
        let fee = self.env.config().gas.total_register_fee(
            gas.gas_price,
            gas.gas_used,
            &self.op.contract_code,
        )?;

        self.staged = Some(ContractRecord::new(
            address,
            self.op.contract_code.clone(),
            self.op.owner_addr,
            self.op.register_time,
        ));
        debug!(
            "Constructor of {} staged {} storage changes",
            address,
            self.changes.len()
        );
        Ok(EvaluationReceipt::new(gas, fee, Vec::new()))
    }

    /// Commit the evaluated registration. Slots of the new contract go
    /// straight into its record; slots of other contracts are written
    /// through the ledger. Every diff is logged.
    pub fn apply(&mut self, receipt: EvaluationReceipt) -> Result<(), ExecutionError> {
        let span = info_span!("register.apply", contract = %self.op.contract_id);
        let _enter = span.enter();

        self.lifecycle.redeem(&receipt)?;
        match self.commit() {
            Ok(written) => {
                self.lifecycle.state = EvaluatorState::Applied;
                STORAGE_CHANGES_APPLIED_TOTAL.inc_by(written as u64);
                info!(
                    "Contract {} registered by {} ({} storage changes)",
                    self.op.contract_id, self.op.owner_addr, written
                );
                Ok(())
            }
            Err(e) => {
                self.lifecycle.fail();
                warn!("Applying registration of {} failed: {}", self.op.contract_id, e);
                Err(e)
            }
        }
    }

    fn commit(&mut self) -> Result<usize, ExecutionError> {
        let mut record = self
            .staged
            .take()
            .ok_or_else(|| ExecutionError::internal("no contract record staged"))?;
        let ledger = self.env.ledger();
        self.transfers.verify(ledger)?;
        let changes = self.changes.take();

        for (contract, slot, change) in changes.iter() {
            if *contract == record.contract_address {
                record.storages.insert(slot.to_string(), change.after.clone());
            }
        }
        ledger.store_contract(&record)?;

        for (contract, slot, change) in changes.iter() {
            if *contract != record.contract_address {
                ledger.set_contract_storage(contract, slot, &change.after)?;
            }
            ledger.add_contract_storage_change(contract, slot, &change.diff)?;
        }

        // the new contract starts with no balance, so nothing can be staged here
        self.transfers.apply_balances(ledger)?;
        Ok(changes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::ledger::Ledger;
    use crate::state::StateDB;
    use crate::vm::ScriptedEngineBuilder;
    use lumen_primitives::{Address, ContractCode, PublicKey, StorageValue};

    fn op(init_cost: i64) -> ContractRegisterOperation {
        ContractRegisterOperation {
            contract_id: Address([0x11; 20]),
            owner_pubkey: PublicKey([1; 32]),
            owner_addr: Address([0x22; 20]),
            contract_code: ContractCode::new(vec!["init".into(), "inc".into()], vec![0x60]),
            init_cost,
            gas_price: 2,
            register_time: 1_700_000_000,
        }
    }

    #[test]
    fn test_register_stages_record_and_storage() {
        let db = Arc::new(StateDB::new());
        let builder = Arc::new(
            ScriptedEngineBuilder::new(|inv, host, _| {
                assert!(inv.is_constructor());
                host.set_storage(&inv.contract, "count", StorageValue::from(b"0".as_slice()))?;
                Ok(vec![])
            })
            .reporting_gas(150),
        );
        let env = Arc::new(ExecutionEnv::new(db.clone(), builder, EngineConfig::default()).unwrap());
        let mut evaluator = ContractRegisterEvaluator::new(env, op(1000));

        let receipt = evaluator.evaluate().unwrap();
        assert_eq!(evaluator.state(), EvaluatorState::Succeeded);
        // ceil(150 / 100) * 2 + 10
        assert_eq!(receipt.fee(), 14);
        assert_eq!(evaluator.changes().len(), 1);
        assert!(evaluator.staged_record().is_some());
        assert!(!db.has_contract(&Address([0x11; 20])).unwrap());

        evaluator.apply(receipt).unwrap();
        assert_eq!(evaluator.state(), EvaluatorState::Applied);
        assert_eq!(
            db.get_contract_storage(&Address([0x11; 20]), "count").unwrap(),
            StorageValue::from(b"0".as_slice())
        );
    }

    #[test]
    fn test_failed_constructor_clears_staging() {
        let db = Arc::new(StateDB::new());
        let builder = Arc::new(ScriptedEngineBuilder::new(|inv, host, _| {
            host.set_storage(&inv.contract, "a", StorageValue::from(b"1".as_slice()))?;
            Err(ExecutionError::contract("boom"))
        }));
        let env = Arc::new(ExecutionEnv::new(db, builder, EngineConfig::default()).unwrap());
        let mut evaluator = ContractRegisterEvaluator::new(env, op(1000));

        let err = evaluator.evaluate().unwrap_err();
        assert!(matches!(err, ExecutionError::ContractRuntime(_)));
        assert_eq!(evaluator.state(), EvaluatorState::Failed);
        assert!(evaluator.changes().is_empty());
        assert!(evaluator.staged_record().is_none());
    }
}
