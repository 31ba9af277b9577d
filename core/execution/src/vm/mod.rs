// lumen/core/execution/src/vm/mod.rs

// Contract virtual machine seam
pub mod scripted;

use crate::host::ChainApi;
use crate::types::ExecutionError;
use lumen_primitives::{Address, PublicKey};

pub use scripted::{GasMeter, Invocation, ScriptedEngine, ScriptedEngineBuilder};

/// Name of the constructor entry point run on registration
pub const CONSTRUCTOR_API: &str = "init";

/// A gas-metered contract VM instance, used for one operation.
///
/// The host capability is lent for the duration of a single execute call;
/// engines must not retain it.
pub trait ContractEngine {
    fn set_caller(&mut self, pubkey: &PublicKey, address: &Address);

    fn set_gas_limit(&mut self, limit: u64);

    fn clear_exceptions(&mut self);

    /// Run the constructor of `contract`
    fn execute_constructor(
        &mut self,
        contract: &Address,
        host: &mut dyn ChainApi,
    ) -> Result<(), ExecutionError>;

    /// Run a named API of `contract`, returning its result bytes
    fn execute_api(
        &mut self,
        contract: &Address,
        api: &str,
        arg: &str,
        host: &mut dyn ChainApi,
    ) -> Result<Vec<u8>, ExecutionError>;

    /// Gas consumed by the last execution
    fn gas_used(&self) -> u64;
}

/// Produces a fresh engine per operation
pub trait ContractEngineBuilder: Send + Sync {
    fn build(&self) -> Box<dyn ContractEngine>;
}
