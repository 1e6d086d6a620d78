//! Yield strategies.
//!
//! A strategy adapts one underlying asset to one yield-bearing asset through
//! an external venue. It custodies only the yield asset: deposits are
//! prepared here but executed by the pooling manager, and withdrawals pay
//! the realized underlying straight back to the manager.

mod swap;
mod vault;

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use crosspool_types::{Amount, AssetId, ChannelId, CrosspoolError, Result, StrategyId};

pub use swap::SwapStrategy;
pub use vault::VaultStrategy;

use crate::{Ledger, PreparedCall, Venue};

/// The capability set every strategy adapter exposes.
///
/// Read accessors return `Result` because a strategy is an external
/// contract that may not answer them.
pub trait Strategy: Send + Sync {
    /// The strategy's own account.
    fn id(&self) -> StrategyId;

    fn underlying_asset(&self) -> Result<AssetId>;

    fn yield_asset(&self) -> Result<AssetId>;

    /// Channel carrying the underlying asset between ledgers.
    fn channel(&self) -> Result<ChannelId>;

    /// The only account allowed to call [`Strategy::withdraw`].
    fn pooling_manager(&self) -> Result<Address>;

    /// Venue the manager must allow to spend its underlying.
    fn address_to_approve(&self) -> Result<Address>;

    /// Handle on the venue prepared calls target.
    fn venue(&self) -> Result<Arc<dyn Venue>>;

    fn underlying_to_yield(&self, ledger: &Ledger, amount: Amount) -> Result<Amount>;

    fn yield_to_underlying(&self, ledger: &Ledger, amount: Amount) -> Result<Amount>;

    /// Describe the venue call that deposits `amount` of underlying from
    /// the manager's balance. Nothing moves until the manager executes it.
    fn deposit_preparation(&self, ledger: &Ledger, amount: Amount) -> Result<PreparedCall>;

    /// Withdraw up to `amount` of underlying to the manager and return what
    /// was actually realized. Never fails for lack of yield balance; it
    /// withdraws everything available instead.
    fn withdraw(&self, ledger: &mut Ledger, caller: Address, amount: Amount) -> Result<Amount>;

    /// Yield asset held by the strategy.
    fn yield_balance(&self, ledger: &Ledger) -> Result<Amount> {
        Ok(ledger.balance_of(self.yield_asset()?, self.id().address()))
    }

    /// Net asset value in underlying units.
    fn nav(&self, ledger: &Ledger) -> Result<Amount> {
        self.yield_to_underlying(ledger, self.yield_balance(ledger)?)
    }

    /// Current minimum-received factor, for strategies that swap.
    fn min_received_factor(&self) -> Option<U256> {
        None
    }

    /// Update the minimum-received factor. Strategies without slippage
    /// protection reject the call.
    fn set_min_received_factor(&mut self, caller: Address, factor: U256) -> Result<()> {
        let _ = (caller, factor);
        Err(CrosspoolError::InvalidStrategyContract {
            strategy: self.id(),
            reason: "strategy has no slippage setting".into(),
        })
    }
}

/// Reject callers other than the pooling manager.
pub(crate) fn ensure_manager(manager: Address, caller: Address) -> Result<()> {
    if caller == manager {
        Ok(())
    } else {
        Err(CrosspoolError::InvalidCaller { caller })
    }
}
