//! The custody ledger: every piece of mutable state a settlement touches.
//!
//! Fungible balances, total supply, allowances and per-account storage
//! words all live here so that one [`Ledger::transact`] call can commit or
//! discard them together. External collaborators (vaults, routers,
//! channels, the relay) are stateless handles that read and write through
//! a `&mut Ledger` they are handed.
//!
//! Invariant, checked by [`Ledger::verify_supply`]:
//! ```text
//! ∀ asset: Σ balance_of(asset, holder) == total_supply(asset)
//! ```

use std::collections::HashMap;

use alloy_primitives::{Address, B256, Keccak256, U256};
use crosspool_types::{AssetId, CrosspoolError, Result};

/// Transactional world state.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    balances: HashMap<(AssetId, Address), U256>,
    supply: HashMap<AssetId, U256>,
    allowances: HashMap<(AssetId, Address, Address), U256>,
    storage: HashMap<(Address, B256), U256>,
}

impl Ledger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage slot for `key` inside `namespace`.
    #[must_use]
    pub fn slot(namespace: &str, key: U256) -> B256 {
        let mut hasher = Keccak256::new();
        hasher.update(namespace.as_bytes());
        hasher.update(key.to_be_bytes::<32>());
        hasher.finalize()
    }

    // ── balances ────────────────────────────────────────────────────

    #[must_use]
    pub fn balance_of(&self, asset: AssetId, holder: Address) -> U256 {
        self.balances
            .get(&(asset, holder))
            .copied()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn total_supply(&self, asset: AssetId) -> U256 {
        self.supply.get(&asset).copied().unwrap_or_default()
    }

    /// Create `amount` of `asset` out of thin air for `to`.
    pub fn mint(&mut self, asset: AssetId, to: Address, amount: U256) -> Result<()> {
        let supply = self.total_supply(asset);
        let new_supply = supply
            .checked_add(amount)
            .ok_or(CrosspoolError::ArithmeticOverflow)?;
        let balance = self.balance_of(asset, to);
        // Σ balances ≤ supply, so this cannot overflow once supply did not.
        self.balances.insert((asset, to), balance + amount);
        self.supply.insert(asset, new_supply);
        Ok(())
    }

    /// Destroy `amount` of `asset` held by `from`.
    pub fn burn(&mut self, asset: AssetId, from: Address, amount: U256) -> Result<()> {
        self.debit(asset, from, amount)?;
        let supply = self.total_supply(asset);
        self.supply.insert(asset, supply.saturating_sub(amount));
        Ok(())
    }

    pub fn transfer(
        &mut self,
        asset: AssetId,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<()> {
        self.debit(asset, from, amount)?;
        let balance = self.balance_of(asset, to);
        self.balances.insert((asset, to), balance + amount);
        Ok(())
    }

    fn debit(&mut self, asset: AssetId, holder: Address, amount: U256) -> Result<()> {
        let available = self.balance_of(asset, holder);
        if available < amount {
            return Err(CrosspoolError::InsufficientBalance {
                asset,
                holder,
                needed: amount,
                available,
            });
        }
        self.balances.insert((asset, holder), available - amount);
        Ok(())
    }

    // ── allowances ──────────────────────────────────────────────────

    /// Set (not add to) the allowance `owner` grants `spender`.
    pub fn approve(&mut self, asset: AssetId, owner: Address, spender: Address, amount: U256) {
        self.allowances.insert((asset, owner, spender), amount);
    }

    #[must_use]
    pub fn allowance(&self, asset: AssetId, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(asset, owner, spender))
            .copied()
            .unwrap_or_default()
    }

    /// Move `amount` from `from` to `to` on behalf of `spender`.
    ///
    /// An allowance of `U256::MAX` is treated as unlimited and never
    /// decremented.
    pub fn transfer_from(
        &mut self,
        asset: AssetId,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<()> {
        if spender != from {
            let allowed = self.allowance(asset, from, spender);
            if allowed < amount {
                return Err(CrosspoolError::InsufficientAllowance {
                    asset,
                    owner: from,
                    spender,
                    needed: amount,
                    available: allowed,
                });
            }
            if allowed != U256::MAX {
                self.approve(asset, from, spender, allowed - amount);
            }
        }
        self.transfer(asset, from, to, amount)
    }

    // ── storage ─────────────────────────────────────────────────────

    #[must_use]
    pub fn load(&self, account: Address, slot: B256) -> U256 {
        self.storage
            .get(&(account, slot))
            .copied()
            .unwrap_or_default()
    }

    /// Write a storage word. Writing zero clears the slot.
    pub fn store(&mut self, account: Address, slot: B256, value: U256) {
        if value.is_zero() {
            self.storage.remove(&(account, slot));
        } else {
            self.storage.insert((account, slot), value);
        }
    }

    // ── invariants and transactions ─────────────────────────────────

    /// Check that the balances of `asset` add up to its total supply.
    ///
    /// # Errors
    /// Returns [`CrosspoolError::SupplyInvariantViolation`] on mismatch.
    pub fn verify_supply(&self, asset: AssetId) -> Result<()> {
        let mut actual = U256::ZERO;
        for ((held, _), balance) in &self.balances {
            if *held == asset {
                actual = actual
                    .checked_add(*balance)
                    .ok_or(CrosspoolError::ArithmeticOverflow)?;
            }
        }
        let expected = self.total_supply(asset);
        if actual != expected {
            return Err(CrosspoolError::SupplyInvariantViolation {
                reason: format!("{asset}: balances sum to {actual}, supply is {expected}"),
            });
        }
        Ok(())
    }

    /// Run `f` against a working copy and commit it only if `f` succeeds.
    ///
    /// On error the ledger is left exactly as it was. Calls nest: an inner
    /// `transact` that fails rolls back only its own writes.
    pub fn transact<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Ledger) -> Result<T>,
    {
        let mut working = self.clone();
        let value = f(&mut working)?;
        *self = working;
        Ok(value)
    }
}
