// lumen/core/execution/src/vm/scripted.rs

// Engine whose contracts are Rust closures; used for dry runs and tests
use super::{ContractEngine, ContractEngineBuilder, CONSTRUCTOR_API};
use crate::host::ChainApi;
use crate::types::ExecutionError;
use lumen_primitives::{Address, PublicKey};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// What the engine was asked to run
#[derive(Debug, Clone)]
pub struct Invocation {
    pub contract: Address,
    pub api: String,
    pub arg: String,
    pub caller: Option<(PublicKey, Address)>,
}

impl Invocation {
    pub fn is_constructor(&self) -> bool {
        self.api == CONSTRUCTOR_API
    }
}

/// Gas meter bounded by the engine's gas limit
#[derive(Debug, Clone, Default)]
pub struct GasMeter {
    limit: u64,
    used: u64,
}

impl GasMeter {
    pub fn new(limit: u64) -> Self {
        Self { limit, used: 0 }
    }

    /// Consume gas; exceeding the limit exhausts the meter
    pub fn charge(&mut self, gas: u64) -> Result<(), ExecutionError> {
        match self.used.checked_add(gas) {
            Some(total) if total <= self.limit => {
                self.used = total;
                Ok(())
            }
            _ => {
                self.used = self.limit;
                Err(ExecutionError::OutOfGas { limit: self.limit })
            }
        }
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }
}

pub type Script = Arc<
    dyn Fn(&Invocation, &mut dyn ChainApi, &mut GasMeter) -> Result<Vec<u8>, ExecutionError>
        + Send
        + Sync,
>;

/// Builder handing out [`ScriptedEngine`]s that all run the same script
pub struct ScriptedEngineBuilder {
    script: Script,
    base_cost: u64,
    reported_gas: Option<u64>,
    builds: Arc<AtomicUsize>,
}

impl ScriptedEngineBuilder {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&Invocation, &mut dyn ChainApi, &mut GasMeter) -> Result<Vec<u8>, ExecutionError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            script: Arc::new(script),
            base_cost: 1,
            reported_gas: None,
            builds: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Gas charged before the script runs
    pub fn with_base_cost(mut self, gas: u64) -> Self {
        self.base_cost = gas;
        self
    }

    /// Report a fixed `gas_used` regardless of metering
    pub fn reporting_gas(mut self, gas: u64) -> Self {
        self.reported_gas = Some(gas);
        self
    }

    /// Number of engines built so far
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl ContractEngineBuilder for ScriptedEngineBuilder {
    fn build(&self) -> Box<dyn ContractEngine> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        Box::new(ScriptedEngine {
            script: self.script.clone(),
            base_cost: self.base_cost,
            reported_gas: self.reported_gas,
            caller: None,
            meter: GasMeter::default(),
            last_error: None,
        })
    }
}

pub struct ScriptedEngine {
    script: Script,
    base_cost: u64,
    reported_gas: Option<u64>,
    caller: Option<(PublicKey, Address)>,
    meter: GasMeter,
    last_error: Option<String>,
}

impl ScriptedEngine {
    /// Message of the last failed execution, until cleared
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn run(
        &mut self,
        contract: &Address,
        api: &str,
        arg: &str,
        host: &mut dyn ChainApi,
    ) -> Result<Vec<u8>, ExecutionError> {
        let invocation = Invocation {
            contract: *contract,
            api: api.to_string(),
            arg: arg.to_string(),
            caller: self.caller,
        };
        let result = self
            .meter
            .charge(self.base_cost)
            .and_then(|_| (self.script)(&invocation, host, &mut self.meter));

        if let Err(e) = &result {
            debug!("Scripted {} of {} failed: {}", api, contract, e);
            self.last_error = Some(e.to_string());
        }
        result
    }
}

impl ContractEngine for ScriptedEngine {
    fn set_caller(&mut self, pubkey: &PublicKey, address: &Address) {
        self.caller = Some((*pubkey, *address));
    }

    fn set_gas_limit(&mut self, limit: u64) {
        self.meter = GasMeter::new(limit);
    }

    fn clear_exceptions(&mut self) {
        self.last_error = None;
    }

    fn execute_constructor(
        &mut self,
        contract: &Address,
        host: &mut dyn ChainApi,
    ) -> Result<(), ExecutionError> {
        self.run(contract, CONSTRUCTOR_API, "", host).map(|_| ())
    }

    fn execute_api(
        &mut self,
        contract: &Address,
        api: &str,
        arg: &str,
        host: &mut dyn ChainApi,
    ) -> Result<Vec<u8>, ExecutionError> {
        self.run(contract, api, arg, host)
    }

    fn gas_used(&self) -> u64 {
        self.reported_gas.unwrap_or_else(|| self.meter.used())
    }
}
