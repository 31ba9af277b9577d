// lumen/core/primitives/src/asset.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ledger amount in the asset's minimum precision.
///
/// Signed so that a single ledger adjustment can carry a withdrawal.
pub type Amount = i64;

/// Asset identifier; `AssetId::CORE` is the base asset fees are paid in
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AssetId(pub u64);

impl AssetId {
    pub const CORE: AssetId = AssetId(0);
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "asset#{}", self.0)
    }
}

/// An amount of a given asset
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub amount: Amount,
    pub asset_id: AssetId,
}

impl Asset {
    pub fn new(amount: Amount, asset_id: AssetId) -> Self {
        Self { amount, asset_id }
    }

    pub fn core(amount: Amount) -> Self {
        Self::new(amount, AssetId::CORE)
    }

    /// Same asset, negated amount
    pub fn negated(&self) -> Self {
        Self::new(-self.amount, self.asset_id)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.asset_id)
    }
}
