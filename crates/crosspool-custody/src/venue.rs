//! External venues a strategy routes funds through.
//!
//! Deposits follow a two-phase pattern: the strategy *prepares* a
//! [`PreparedCall`] without touching any funds, and the pooling manager
//! *executes* it against the [`Venue`] from its own balance. The strategy
//! never holds the underlying asset on the way in.

use alloy_primitives::{Address, U256};
use crosspool_types::{Amount, AssetId, Result};
use serde::{Deserialize, Serialize};

use crate::Ledger;

/// Parameters of an exact-input single-pool swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExactInputParams {
    pub token_in: AssetId,
    pub token_out: AssetId,
    pub fee: u32,
    pub recipient: Address,
    pub amount_in: Amount,
    pub amount_out_minimum: Amount,
}

/// Parameters of an exact-output single-pool swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExactOutputParams {
    pub token_in: AssetId,
    pub token_out: AssetId,
    pub fee: u32,
    pub recipient: Address,
    pub amount_out: Amount,
    pub amount_in_maximum: Amount,
}

/// A call a venue knows how to execute on behalf of its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VenueCall {
    /// Deposit `assets` of the vault's underlying and mint shares to `receiver`.
    VaultDeposit { assets: Amount, receiver: Address },
    /// Swap an exact amount in for at least a minimum out.
    SwapExactInput(ExactInputParams),
}

/// An unexecuted call description returned by deposit preparation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedCall {
    /// Venue the call must be sent to.
    pub target: Address,
    pub call: VenueCall,
}

/// Anything that can execute a [`VenueCall`].
pub trait Venue: Send + Sync {
    fn address(&self) -> Address;

    /// Execute `call` with `caller` as the paying account. Returns the
    /// amount the call produced (shares minted, tokens received).
    fn execute(&self, ledger: &mut Ledger, caller: Address, call: &VenueCall) -> Result<Amount>;
}

/// A tokenized vault whose shares are a fungible asset.
pub trait YieldVault: Venue {
    /// The vault's underlying asset.
    fn asset(&self) -> AssetId;

    /// The share token.
    fn share_asset(&self) -> AssetId;

    /// Shares minted for `assets` at the current ratio, floored.
    fn convert_to_shares(&self, ledger: &Ledger, assets: Amount) -> Result<Amount>;

    /// Assets paid out for `shares` at the current ratio, floored.
    fn convert_to_assets(&self, ledger: &Ledger, shares: Amount) -> Result<Amount>;

    /// Burn `shares` held by `owner` and pay the assets to `receiver`.
    fn redeem(
        &self,
        ledger: &mut Ledger,
        caller: Address,
        shares: Amount,
        receiver: Address,
        owner: Address,
    ) -> Result<Amount>;
}

/// A single-pool swap router.
pub trait SwapRouter: Venue {
    /// Returns the amount received.
    fn exact_input_single(
        &self,
        ledger: &mut Ledger,
        caller: Address,
        params: &ExactInputParams,
    ) -> Result<Amount>;

    /// Returns the amount spent.
    fn exact_output_single(
        &self,
        ledger: &mut Ledger,
        caller: Address,
        params: &ExactOutputParams,
    ) -> Result<Amount>;
}

/// Oracle reporting the price of a yield asset in underlying units.
pub trait PriceFeed: Send + Sync {
    /// Latest price, scaled by `10^decimals()`.
    fn latest_answer(&self) -> Result<U256>;

    fn decimals(&self) -> u8;
}
