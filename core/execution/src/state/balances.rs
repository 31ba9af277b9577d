// lumen/core/execution/src/state/balances.rs

// Asset transfers requested by contract code, staged until apply
use crate::ledger::{adjusted_amount, Ledger};
use crate::types::ExecutionError;
use lumen_primitives::{Address, Amount, Asset, AssetId};
use std::collections::BTreeMap;
use tracing::debug;

/// Withdrawals from the executing contract and deposits to their
/// destinations, with a lazily seeded balance cache
#[derive(Debug, Clone)]
pub struct BalanceTransferLedger {
    contract: Address,
    /// Known balance of the contract, only ever decremented
    balance_cache: BTreeMap<AssetId, Amount>,
    withdrawals: BTreeMap<AssetId, Amount>,
    deposits: BTreeMap<Address, BTreeMap<AssetId, Amount>>,
    /// Destination balances after the staged deposits
    projected: BTreeMap<(Address, AssetId), Amount>,
}

/// Per-asset sums of a transfer ledger
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferTotals {
    pub withdrawn: BTreeMap<AssetId, Amount>,
    pub deposited: BTreeMap<AssetId, Amount>,
}

impl TransferTotals {
    /// Every withdrawn unit has a destination
    pub fn is_balanced(&self) -> bool {
        self.withdrawn == self.deposited
    }
}

impl BalanceTransferLedger {
    pub fn new(contract: Address) -> Self {
        Self {
            contract,
            balance_cache: BTreeMap::new(),
            withdrawals: BTreeMap::new(),
            deposits: BTreeMap::new(),
            projected: BTreeMap::new(),
        }
    }

    pub fn contract(&self) -> &Address {
        &self.contract
    }

    /// Stage a transfer of `amount` from the contract to `to`.
    ///
    /// Fails without touching any staged state when the cached balance
    /// cannot cover the amount or the deposit would overflow the
    /// destination balance.
    pub fn transfer(
        &mut self,
        ledger: &dyn Ledger,
        amount: Asset,
        to: &Address,
    ) -> Result<(), ExecutionError> {
        if amount.amount <= 0 {
            return Err(ExecutionError::contract(format!(
                "transfer amount must be positive, got {}",
                amount.amount
            )));
        }
        if *to == self.contract {
            return Err(ExecutionError::contract(format!(
                "contract {} cannot transfer to itself",
                self.contract
            )));
        }

        let asset_id = amount.asset_id;
        let have = match self.balance_cache.get(&asset_id) {
            Some(balance) => *balance,
            None => {
                let balance = ledger.get_contract_balance(&self.contract, asset_id)?;
                self.balance_cache.insert(asset_id, balance);
                balance
            }
        };
        if amount.amount > have {
            return Err(ExecutionError::InsufficientBalance {
                asset_id,
                need: amount.amount,
                have,
            });
        }

        let dest_key = (*to, asset_id);
        let dest_balance = match self.projected.get(&dest_key) {
            Some(balance) => *balance,
            None => ledger.get_balance(to, asset_id)?,
        };
        let dest_after = dest_balance.checked_add(amount.amount).ok_or_else(|| {
            ExecutionError::contract(format!(
                "deposit of {} would overflow the balance of {}",
                amount, to
            ))
        })?;

        *self.withdrawals.entry(asset_id).or_insert(0) += amount.amount;
        *self
            .deposits
            .entry(*to)
            .or_default()
            .entry(asset_id)
            .or_insert(0) += amount.amount;
        self.balance_cache.insert(asset_id, have - amount.amount);
        self.projected.insert(dest_key, dest_after);

        debug!(
            "Staged transfer of {} from {} to {}",
            amount, self.contract, to
        );
        Ok(())
    }

    /// Cached balance, if the asset has been referenced in this evaluation
    pub fn cached_balance(&self, asset_id: AssetId) -> Option<Amount> {
        self.balance_cache.get(&asset_id).copied()
    }

    pub fn withdrawal(&self, asset_id: AssetId) -> Amount {
        self.withdrawals.get(&asset_id).copied().unwrap_or(0)
    }

    pub fn deposit(&self, to: &Address, asset_id: AssetId) -> Amount {
        self.deposits
            .get(to)
            .and_then(|assets| assets.get(&asset_id))
            .copied()
            .unwrap_or(0)
    }

    pub fn totals(&self) -> TransferTotals {
        let mut deposited = BTreeMap::new();
        for assets in self.deposits.values() {
            for (asset_id, amount) in assets {
                *deposited.entry(*asset_id).or_insert(0) += *amount;
            }
        }
        TransferTotals {
            withdrawn: self.withdrawals.clone(),
            deposited,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.withdrawals.is_empty() && self.deposits.is_empty()
    }

    /// Drop staged transfers and the cache
    pub fn clear(&mut self) {
        self.balance_cache.clear();
        self.withdrawals.clear();
        self.deposits.clear();
        self.projected.clear();
    }

    /// Check every staged adjustment against the ledger as it is now.
    /// Nothing is written.
    pub fn verify(&self, ledger: &dyn Ledger) -> Result<(), ExecutionError> {
        for (asset_id, amount) in &self.withdrawals {
            let have = ledger.get_contract_balance(&self.contract, *asset_id)?;
            if *amount > have {
                return Err(ExecutionError::InsufficientBalance {
                    asset_id: *asset_id,
                    need: *amount,
                    have,
                });
            }
        }
        for (to, assets) in &self.deposits {
            for (asset_id, amount) in assets {
                adjusted_amount(ledger.get_balance(to, *asset_id)?, *amount)?;
            }
        }
        Ok(())
    }

    /// Commit staged transfers: every withdrawal first, then every deposit.
    /// Runs [`verify`](Self::verify) before the first write.
    pub fn apply_balances(&mut self, ledger: &dyn Ledger) -> Result<(), ExecutionError> {
        self.verify(ledger)?;
        for (asset_id, amount) in &self.withdrawals {
            if *amount == 0 {
                continue;
            }
            ledger.adjust_contract_balance(&self.contract, Asset::new(-*amount, *asset_id))?;
        }
        for (to, assets) in &self.deposits {
            for (asset_id, amount) in assets {
                ledger.adjust_balance(to, Asset::new(*amount, *asset_id))?;
            }
        }

        debug!(
            "Applied {} withdrawals and deposits to {} addresses for {}",
            self.withdrawals.len(),
            self.deposits.len(),
            self.contract
        );
        self.clear();
        Ok(())
    }
}
