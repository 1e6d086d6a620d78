//! Ratio-based strategy over a tokenized vault.

use std::sync::Arc;

use alloy_primitives::Address;
use crosspool_types::{Amount, AssetId, ChannelId, Result, StrategyId};
use tracing::debug;

use super::{Strategy, ensure_manager};
use crate::{Ledger, PreparedCall, Venue, VenueCall, YieldVault};

/// Holds vault shares; converts through the vault's own share/asset ratio.
pub struct VaultStrategy<V> {
    id: StrategyId,
    pooling_manager: Address,
    channel: ChannelId,
    vault: Arc<V>,
}

impl<V: YieldVault + 'static> VaultStrategy<V> {
    #[must_use]
    pub fn new(id: StrategyId, pooling_manager: Address, channel: ChannelId, vault: Arc<V>) -> Self {
        Self {
            id,
            pooling_manager,
            channel,
            vault,
        }
    }
}

impl<V: YieldVault + 'static> Strategy for VaultStrategy<V> {
    fn id(&self) -> StrategyId {
        self.id
    }

    fn underlying_asset(&self) -> Result<AssetId> {
        Ok(self.vault.asset())
    }

    fn yield_asset(&self) -> Result<AssetId> {
        Ok(self.vault.share_asset())
    }

    fn channel(&self) -> Result<ChannelId> {
        Ok(self.channel)
    }

    fn pooling_manager(&self) -> Result<Address> {
        Ok(self.pooling_manager)
    }

    fn address_to_approve(&self) -> Result<Address> {
        Ok(self.vault.address())
    }

    fn venue(&self) -> Result<Arc<dyn Venue>> {
        let venue: Arc<dyn Venue> = self.vault.clone();
        Ok(venue)
    }

    fn underlying_to_yield(&self, ledger: &Ledger, amount: Amount) -> Result<Amount> {
        self.vault.convert_to_shares(ledger, amount)
    }

    fn yield_to_underlying(&self, ledger: &Ledger, amount: Amount) -> Result<Amount> {
        self.vault.convert_to_assets(ledger, amount)
    }

    fn deposit_preparation(&self, _ledger: &Ledger, amount: Amount) -> Result<PreparedCall> {
        Ok(PreparedCall {
            target: self.vault.address(),
            call: VenueCall::VaultDeposit {
                assets: amount,
                receiver: self.id.address(),
            },
        })
    }

    fn withdraw(&self, ledger: &mut Ledger, caller: Address, amount: Amount) -> Result<Amount> {
        ensure_manager(self.pooling_manager, caller)?;

        let wanted = self.underlying_to_yield(ledger, amount)?;
        let balance = self.yield_balance(ledger)?;
        let shares = wanted.min(balance);
        if shares.is_zero() {
            return Ok(Amount::ZERO);
        }

        let me = self.id.address();
        let realized = self
            .vault
            .redeem(ledger, me, shares, self.pooling_manager, me)?;
        debug!(
            strategy = %self.id,
            requested = %amount,
            shares = %shares,
            realized = %realized,
            "vault withdraw"
        );
        Ok(realized)
    }
}
