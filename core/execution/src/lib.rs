// lumen/core/execution/src/lib.rs

// Contract evaluation and two-phase commit engine
pub mod config;
pub mod evaluator;
pub mod gas;
pub mod host;
pub mod ledger;
pub mod logging;
pub mod metrics;
pub mod state;
pub mod types;
pub mod vm;

pub use config::EngineConfig;
pub use evaluator::{
    ContractEvaluator, ContractInvokeEvaluator, ContractRegisterEvaluator, EvaluationReceipt,
    EvaluatorState, ExecutionEnv,
};
pub use gas::{count_gas_fee, GasSchedule};
pub use host::{ChainApi, HostContext, PendingContract};
pub use ledger::Ledger;
pub use state::{BalanceTransferLedger, StateDB, StorageChangeSet};
pub use types::{ErrorKind, ExecutionError, GasAccount, ValidationError};
pub use vm::{ContractEngine, ContractEngineBuilder};
