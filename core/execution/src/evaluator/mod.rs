// lumen/core/execution/src/evaluator/mod.rs

// Two-phase (evaluate, then apply) processing of contract operations
pub mod invoke;
pub mod register;

use crate::config::EngineConfig;
use crate::ledger::Ledger;
use crate::types::{ExecutionError, GasAccount, ValidationError};
use crate::vm::ContractEngineBuilder;
use lumen_primitives::{Amount, ContractOperation};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub use invoke::ContractInvokeEvaluator;
pub use register::ContractRegisterEvaluator;

/// Process-wide collaborators shared by every evaluator.
///
/// Built once at startup and read-only afterwards.
pub struct ExecutionEnv {
    ledger: Arc<dyn Ledger>,
    engines: Arc<dyn ContractEngineBuilder>,
    config: EngineConfig,
}

impl ExecutionEnv {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        engines: Arc<dyn ContractEngineBuilder>,
        config: EngineConfig,
    ) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self {
            ledger,
            engines,
            config,
        })
    }

    pub fn ledger(&self) -> &dyn Ledger {
        self.ledger.as_ref()
    }

    pub fn engines(&self) -> &dyn ContractEngineBuilder {
        self.engines.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Evaluator for one operation
    pub fn evaluator(self: &Arc<Self>, operation: ContractOperation) -> ContractEvaluator {
        ContractEvaluator::new(Arc::clone(self), operation)
    }
}

/// Lifecycle of one evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvaluatorState {
    #[default]
    Created,
    Validated,
    Executing,
    Succeeded,
    Failed,
    Applied,
}

static NEXT_TICKET: AtomicU64 = AtomicU64::new(1);

/// Proof of a successful evaluate, consumed by the matching apply
#[derive(Debug)]
pub struct EvaluationReceipt {
    ticket: u64,
    gas: GasAccount,
    fee: Amount,
    output: Vec<u8>,
}

impl EvaluationReceipt {
    fn new(gas: GasAccount, fee: Amount, output: Vec<u8>) -> Self {
        Self {
            ticket: NEXT_TICKET.fetch_add(1, Ordering::Relaxed),
            gas,
            fee,
            output,
        }
    }

    pub fn gas(&self) -> GasAccount {
        self.gas
    }

    /// Fee owed by the submitter; withdrawal happens outside the engine
    pub fn fee(&self) -> Amount {
        self.fee
    }

    /// Result bytes of an invoked API (empty for registrations)
    pub fn output(&self) -> &[u8] {
        &self.output
    }
}

/// State plus the ticket of the receipt `apply` will accept
#[derive(Debug, Default)]
struct Lifecycle {
    state: EvaluatorState,
    ticket: Option<u64>,
}

impl Lifecycle {
    /// Begin a new evaluation. `Applied` is terminal.
    fn restart(&mut self) -> Result<(), ExecutionError> {
        if self.state == EvaluatorState::Applied {
            return Err(ExecutionError::internal("operation already applied"));
        }
        self.state = EvaluatorState::Created;
        self.ticket = None;
        Ok(())
    }

    fn succeed(&mut self, receipt: &EvaluationReceipt) {
        self.state = EvaluatorState::Succeeded;
        self.ticket = Some(receipt.ticket);
    }

    fn fail(&mut self) {
        self.state = EvaluatorState::Failed;
        self.ticket = None;
    }

    /// Accept `receipt` for apply. The ticket is spent even if apply later fails.
    fn redeem(&mut self, receipt: &EvaluationReceipt) -> Result<(), ExecutionError> {
        match self.state {
            EvaluatorState::Applied => Err(ExecutionError::internal("operation already applied")),
            EvaluatorState::Succeeded if self.ticket == Some(receipt.ticket) => {
                self.ticket = None;
                Ok(())
            }
            EvaluatorState::Succeeded => Err(ExecutionError::internal(
                "receipt does not belong to the latest evaluation",
            )),
            state => Err(ExecutionError::internal(format!(
                "cannot apply an evaluator in state {:?}",
                state
            ))),
        }
    }
}

fn check_cost_limit(cost: i64) -> Result<u64, ValidationError> {
    if cost <= 0 {
        return Err(ValidationError::NonPositiveCostLimit(cost));
    }
    Ok(cost as u64)
}

fn check_gas_price(price: Amount) -> Result<(), ValidationError> {
    if price < 0 {
        return Err(ValidationError::NegativeGasPrice(price));
    }
    Ok(())
}

/// Evaluator for either kind of contract operation
pub enum ContractEvaluator {
    Register(ContractRegisterEvaluator),
    Invoke(ContractInvokeEvaluator),
}

impl ContractEvaluator {
    pub fn new(env: Arc<ExecutionEnv>, operation: ContractOperation) -> Self {
        match operation {
            ContractOperation::Register(op) => {
                ContractEvaluator::Register(ContractRegisterEvaluator::new(env, op))
            }
            ContractOperation::Invoke(op) => {
                ContractEvaluator::Invoke(ContractInvokeEvaluator::new(env, op))
            }
        }
    }

    pub fn evaluate(&mut self) -> Result<EvaluationReceipt, ExecutionError> {
        match self {
            ContractEvaluator::Register(e) => e.evaluate(),
            ContractEvaluator::Invoke(e) => e.evaluate(),
        }
    }

    pub fn apply(&mut self, receipt: EvaluationReceipt) -> Result<(), ExecutionError> {
        match self {
            ContractEvaluator::Register(e) => e.apply(receipt),
            ContractEvaluator::Invoke(e) => e.apply(receipt),
        }
    }

    pub fn state(&self) -> EvaluatorState {
        match self {
            ContractEvaluator::Register(e) => e.state(),
            ContractEvaluator::Invoke(e) => e.state(),
        }
    }
}
