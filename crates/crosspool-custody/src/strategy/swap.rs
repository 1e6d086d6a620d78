//! Oracle-priced strategy that swaps through a single-pool router.
//!
//! Conversions use the price feed, not the pool:
//!
//! ```text
//! underlying_to_yield(a) = a * 10^decimals / price
//! yield_to_underlying(y) = y * price / 10^decimals
//! ```
//!
//! Every swap is bounded by `min_received_factor` around that oracle rate.

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use crosspool_types::amount::{mul_div, pow10, wad_div, wad_mul};
use crosspool_types::constants::{
    DEFAULT_MIN_RECEIVED_FACTOR, MAX_SLIPPAGE_FACTOR, MIN_SLIPPAGE_FACTOR,
};
use crosspool_types::{Amount, AssetId, ChannelId, CrosspoolError, Result, StrategyId};
use tracing::{debug, info};

use super::{Strategy, ensure_manager};
use crate::{
    ExactInputParams, ExactOutputParams, Ledger, PreparedCall, PriceFeed, SwapRouter, Venue,
    VenueCall,
};

/// Holds the yield asset bought on a swap router.
pub struct SwapStrategy<R, P> {
    id: StrategyId,
    pooling_manager: Address,
    underlying: AssetId,
    yield_token: AssetId,
    channel: ChannelId,
    router: Arc<R>,
    price_feed: Arc<P>,
    pool_fee: u32,
    min_received_factor: U256,
}

impl<R: SwapRouter + 'static, P: PriceFeed> SwapStrategy<R, P> {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        id: StrategyId,
        pooling_manager: Address,
        underlying: AssetId,
        yield_token: AssetId,
        channel: ChannelId,
        router: Arc<R>,
        price_feed: Arc<P>,
        pool_fee: u32,
    ) -> Self {
        Self {
            id,
            pooling_manager,
            underlying,
            yield_token,
            channel,
            router,
            price_feed,
            pool_fee,
            min_received_factor: DEFAULT_MIN_RECEIVED_FACTOR,
        }
    }

    /// Oracle scale, `10^decimals`.
    pub fn precision(&self) -> Result<U256> {
        pow10(u32::from(self.price_feed.decimals()))
    }

    fn price(&self) -> Result<U256> {
        let price = self.price_feed.latest_answer()?;
        if price.is_zero() {
            return Err(CrosspoolError::InvalidPrice {
                reason: "price feed answered zero".into(),
            });
        }
        Ok(price)
    }

    /// Minimum out for a deposit swap of `amount` underlying.
    pub fn deposit_min_out(&self, ledger: &Ledger, amount: Amount) -> Result<Amount> {
        wad_mul(self.underlying_to_yield(ledger, amount)?, self.min_received_factor)
    }

    /// Maximum yield spent by an exact-output withdraw of `amount` underlying.
    pub fn withdraw_max_in(&self, ledger: &Ledger, amount: Amount) -> Result<Amount> {
        wad_div(self.underlying_to_yield(ledger, amount)?, self.min_received_factor)
    }
}

impl<R: SwapRouter + 'static, P: PriceFeed> Strategy for SwapStrategy<R, P> {
    fn id(&self) -> StrategyId {
        self.id
    }

    fn underlying_asset(&self) -> Result<AssetId> {
        Ok(self.underlying)
    }

    fn yield_asset(&self) -> Result<AssetId> {
        Ok(self.yield_token)
    }

    fn channel(&self) -> Result<ChannelId> {
        Ok(self.channel)
    }

    fn pooling_manager(&self) -> Result<Address> {
        Ok(self.pooling_manager)
    }

    fn address_to_approve(&self) -> Result<Address> {
        Ok(self.router.address())
    }

    fn venue(&self) -> Result<Arc<dyn Venue>> {
        let venue: Arc<dyn Venue> = self.router.clone();
        Ok(venue)
    }

    fn underlying_to_yield(&self, _ledger: &Ledger, amount: Amount) -> Result<Amount> {
        mul_div(amount, self.precision()?, self.price()?)
    }

    fn yield_to_underlying(&self, _ledger: &Ledger, amount: Amount) -> Result<Amount> {
        mul_div(amount, self.price()?, self.precision()?)
    }

    fn deposit_preparation(&self, ledger: &Ledger, amount: Amount) -> Result<PreparedCall> {
        Ok(PreparedCall {
            target: self.router.address(),
            call: VenueCall::SwapExactInput(ExactInputParams {
                token_in: self.underlying,
                token_out: self.yield_token,
                fee: self.pool_fee,
                recipient: self.id.address(),
                amount_in: amount,
                amount_out_minimum: self.deposit_min_out(ledger, amount)?,
            }),
        })
    }

    fn withdraw(&self, ledger: &mut Ledger, caller: Address, amount: Amount) -> Result<Amount> {
        ensure_manager(self.pooling_manager, caller)?;

        let me = self.id.address();
        let router = self.router.address();
        let balance = self.yield_balance(ledger)?;
        let max_in = self.withdraw_max_in(ledger, amount)?;

        if max_in <= balance {
            ledger.approve(self.yield_token, me, router, max_in);
            let spent = self.router.exact_output_single(
                ledger,
                me,
                &ExactOutputParams {
                    token_in: self.yield_token,
                    token_out: self.underlying,
                    fee: self.pool_fee,
                    recipient: self.pooling_manager,
                    amount_out: amount,
                    amount_in_maximum: max_in,
                },
            )?;
            ledger.approve(self.yield_token, me, router, U256::ZERO);
            debug!(strategy = %self.id, spent = %spent, realized = %amount, "exact-output withdraw");
            return Ok(amount);
        }

        // Not enough yield to buy `amount` back: sell everything held.
        if balance.is_zero() {
            return Ok(Amount::ZERO);
        }
        let min_out = wad_mul(self.yield_to_underlying(ledger, balance)?, self.min_received_factor)?;
        ledger.approve(self.yield_token, me, router, balance);
        let realized = self.router.exact_input_single(
            ledger,
            me,
            &ExactInputParams {
                token_in: self.yield_token,
                token_out: self.underlying,
                fee: self.pool_fee,
                recipient: self.pooling_manager,
                amount_in: balance,
                amount_out_minimum: min_out,
            },
        )?;
        debug!(
            strategy = %self.id,
            requested = %amount,
            realized = %realized,
            "capped exact-input withdraw"
        );
        Ok(realized)
    }

    fn min_received_factor(&self) -> Option<U256> {
        Some(self.min_received_factor)
    }

    fn set_min_received_factor(&mut self, caller: Address, factor: U256) -> Result<()> {
        ensure_manager(self.pooling_manager, caller)?;
        if !(MIN_SLIPPAGE_FACTOR..=MAX_SLIPPAGE_FACTOR).contains(&factor) {
            return Err(CrosspoolError::InvalidSlippage { factor });
        }
        self.min_received_factor = factor;
        info!(strategy = %self.id, factor = %factor, "min received factor updated");
        Ok(())
    }
}
