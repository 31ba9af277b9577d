// lumen/core/execution/src/evaluator/invoke.rs

use super::{check_cost_limit, check_gas_price, EvaluationReceipt, EvaluatorState, ExecutionEnv, Lifecycle};
use crate::host::HostContext;
use crate::metrics::{record_evaluation, CONTRACT_GAS_USED, STORAGE_CHANGES_APPLIED_TOTAL};
use crate::state::{BalanceTransferLedger, StorageChangeSet};
use crate::types::{ExecutionError, GasAccount};
use lumen_primitives::ContractInvokeOperation;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn};

/// Evaluates a call to an existing contract's API
pub struct ContractInvokeEvaluator {
    env: Arc<ExecutionEnv>,
    op: ContractInvokeOperation,
    lifecycle: Lifecycle,
    changes: StorageChangeSet,
    transfers: BalanceTransferLedger,
}

impl ContractInvokeEvaluator {
    pub fn new(env: Arc<ExecutionEnv>, op: ContractInvokeOperation) -> Self {
        let transfers = BalanceTransferLedger::new(op.contract_id);
        Self {
            env,
            op,
            lifecycle: Lifecycle::default(),
            changes: StorageChangeSet::new(),
            transfers,
        }
    }

    pub fn operation(&self) -> &ContractInvokeOperation {
        &self.op
    }

    pub fn state(&self) -> EvaluatorState {
        self.lifecycle.state
    }

    pub fn changes(&self) -> &StorageChangeSet {
        &self.changes
    }

    pub fn transfers(&self) -> &BalanceTransferLedger {
        &self.transfers
    }

    pub fn evaluate(&mut self) -> Result<EvaluationReceipt, ExecutionError> {
        let span = info_span!(
            "invoke.evaluate",
            contract = %self.op.contract_id,
            api = %self.op.contract_api
        );
        let _enter = span.enter();

        self.lifecycle.restart()?;
        self.reset_staging();

        match self.validate().and_then(|limit| self.execute(limit)) {
            Ok(receipt) => {
                self.lifecycle.succeed(&receipt);
                record_evaluation("invoke", "success");
                CONTRACT_GAS_USED.observe(receipt.gas().gas_used as f64);
                info!(
                    "Invoke {}.{} evaluated: gas_used={}, fee={}",
                    self.op.contract_id,
                    self.op.contract_api,
                    receipt.gas().gas_used,
                    receipt.fee()
                );
                Ok(receipt)
            }
            Err(e) => {
                self.reset_staging();
                self.lifecycle.fail();
                record_evaluation("invoke", e.kind().as_str());
                warn!(
                    "Invoke {}.{} failed: {}",
                    self.op.contract_id, self.op.contract_api, e
                );
                Err(e)
            }
        }
    }

    fn reset_staging(&mut self) {
        self.changes.clear();
        self.transfers.clear();
    }

    fn validate(&mut self) -> Result<u64, ExecutionError> {
        let limit = check_cost_limit(self.op.invoke_cost)?;
        check_gas_price(self.op.gas_price)?;
        self.lifecycle.state = EvaluatorState::Validated;
        Ok(limit)
    }

    fn execute(&mut self, cost_limit: u64) -> Result<EvaluationReceipt, ExecutionError> {
        self.lifecycle.state = EvaluatorState::Executing;

        let mut engine = self.env.engines().build();
        engine.set_caller(&self.op.caller_pubkey, &self.op.caller_addr);
        engine.clear_exceptions();
        engine.set_gas_limit(cost_limit);
        self.changes.clear();

        let contract = self.op.contract_id;
        let output = {
            let mut host = HostContext::new(
                self.env.ledger(),
                contract,
                &mut self.changes,
                &mut self.transfers,
            );
            engine.execute_api(&contract, &self.op.contract_api, &self.op.contract_arg, &mut host)?
        };

        let gas = GasAccount::checked(engine.gas_used(), cost_limit, self.op.gas_price)?;
        let fee = self.env.config().gas.gas_fee(gas.gas_price, gas.gas_used)?;

        let totals = self.transfers.totals();
        if !totals.is_balanced() {
            return Err(ExecutionError::internal(format!(
                "unbalanced transfers: withdrawn {:?}, deposited {:?}",
                totals.withdrawn, totals.deposited
            )));
        }
        debug!(
            "Invoke {}.{} staged {} storage changes, transfers {:?}",
            contract,
            self.op.contract_api,
            self.changes.len(),
            totals.withdrawn
        );
        Ok(EvaluationReceipt::new(gas, fee, output))
    }

    /// Commit the evaluated call: storage writes and diffs first, then
    /// the staged balance transfers. Transfers are checked against the
    /// ledger before anything is written.
    pub fn apply(&mut self, receipt: EvaluationReceipt) -> Result<(), ExecutionError> {
        let span = info_span!("invoke.apply", contract = %self.op.contract_id);
        let _enter = span.enter();

        self.lifecycle.redeem(&receipt)?;
        match self.commit() {
            Ok(written) => {
                self.lifecycle.state = EvaluatorState::Applied;
                STORAGE_CHANGES_APPLIED_TOTAL.inc_by(written as u64);
                info!(
                    "Invoke {}.{} by {} applied ({} storage changes)",
                    self.op.contract_id, self.op.contract_api, self.op.caller_addr, written
                );
                Ok(())
            }
            Err(e) => {
                self.lifecycle.fail();
                warn!("Applying invoke of {} failed: {}", self.op.contract_id, e);
                Err(e)
            }
        }
    }

    fn commit(&mut self) -> Result<usize, ExecutionError> {
        let ledger = self.env.ledger();
        self.transfers.verify(ledger)?;
        let changes = self.changes.take();

        for (contract, slot, change) in changes.iter() {
            ledger.set_contract_storage(contract, slot, &change.after)?;
            ledger.add_contract_storage_change(contract, slot, &change.diff)?;
        }
        self.transfers.apply_balances(ledger)?;
        Ok(changes.len())
    }
}
