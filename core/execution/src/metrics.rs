// lumen/core/execution/src/metrics.rs

// Metrics for tracking contract evaluation and apply
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram, register_int_counter, CounterVec, Histogram,
    IntCounter,
};

pub static CONTRACT_EVALUATIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "lumen_contract_evaluations_total",
        "Number of contract operation evaluations",
        &["operation", "outcome"]
    )
    .expect("register lumen_contract_evaluations_total")
});

pub static CONTRACT_GAS_USED: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "lumen_contract_gas_used",
        "Gas used by successful contract evaluations"
    )
    .expect("register lumen_contract_gas_used")
});

pub static STORAGE_CHANGES_APPLIED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "lumen_storage_changes_applied_total",
        "Storage slots written by applied contract operations"
    )
    .expect("register lumen_storage_changes_applied_total")
});

/// Count one evaluation; `outcome` is "success" or an error kind
pub(crate) fn record_evaluation(operation: &str, outcome: &str) {
    CONTRACT_EVALUATIONS_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
}
