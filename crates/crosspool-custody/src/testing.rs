//! Test doubles for the external collaborators.
//!
//! State that must roll back with a settlement (balances, share supply,
//! channel deposits) lives in the [`Ledger`]. Knobs a test turns (failure
//! switches, prices, exchange rates) live in the double itself and are
//! never rolled back.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use alloy_primitives::{Address, U256};
use crosspool_codec::address_word;
use crosspool_types::amount::mul_div;
use crosspool_types::constants::WAD;
use crosspool_types::{Amount, AssetId, ChannelId, CrosspoolError, Result, StrategyId};

use crate::{
    Channel, ExactInputParams, ExactOutputParams, Ledger, PreparedCall, PriceFeed, Strategy,
    SwapRouter, Venue, VenueCall, YieldVault,
};

fn venue_error(venue: Address, reason: &str) -> CrosspoolError {
    CrosspoolError::VenueFailure {
        venue,
        reason: reason.to_string(),
    }
}

// ---------------------------------------------------------------------------
// MockVault
// ---------------------------------------------------------------------------

/// Tokenized vault with one virtual share and one virtual asset:
///
/// ```text
/// shares = assets * (supply + 1) / (total_assets + 1)
/// assets = shares * (total_assets + 1) / (supply + 1)
/// ```
///
/// Shares are the asset whose id is the vault's own address. Yield accrues
/// by minting underlying straight to the vault.
pub struct MockVault {
    address: Address,
    asset: AssetId,
    failing: AtomicBool,
}

impl MockVault {
    #[must_use]
    pub fn new(address: Address, asset: AssetId) -> Self {
        Self {
            address,
            asset,
            failing: AtomicBool::new(false),
        }
    }

    /// Make every deposit and redeem fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    #[must_use]
    pub fn total_assets(&self, ledger: &Ledger) -> U256 {
        ledger.balance_of(self.asset, self.address)
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(venue_error(self.address, "vault paused"));
        }
        Ok(())
    }

    fn virtual_supply(&self, ledger: &Ledger) -> U256 {
        ledger.total_supply(self.share_asset()).saturating_add(U256::from(1u8))
    }

    fn virtual_assets(&self, ledger: &Ledger) -> U256 {
        self.total_assets(ledger).saturating_add(U256::from(1u8))
    }
}

impl Venue for MockVault {
    fn address(&self) -> Address {
        self.address
    }

    fn execute(&self, ledger: &mut Ledger, caller: Address, call: &VenueCall) -> Result<Amount> {
        self.check()?;
        match *call {
            VenueCall::VaultDeposit { assets, receiver } => {
                let shares = self.convert_to_shares(ledger, assets)?;
                ledger.transfer_from(self.asset, self.address, caller, self.address, assets)?;
                ledger.mint(self.share_asset(), receiver, shares)?;
                Ok(shares)
            }
            VenueCall::SwapExactInput(_) => Err(venue_error(self.address, "unsupported call")),
        }
    }
}

impl YieldVault for MockVault {
    fn asset(&self) -> AssetId {
        self.asset
    }

    fn share_asset(&self) -> AssetId {
        AssetId(self.address)
    }

    fn convert_to_shares(&self, ledger: &Ledger, assets: Amount) -> Result<Amount> {
        mul_div(assets, self.virtual_supply(ledger), self.virtual_assets(ledger))
    }

    fn convert_to_assets(&self, ledger: &Ledger, shares: Amount) -> Result<Amount> {
        mul_div(shares, self.virtual_assets(ledger), self.virtual_supply(ledger))
    }

    fn redeem(
        &self,
        ledger: &mut Ledger,
        caller: Address,
        shares: Amount,
        receiver: Address,
        owner: Address,
    ) -> Result<Amount> {
        self.check()?;
        if caller != owner {
            return Err(venue_error(self.address, "caller is not share owner"));
        }
        let assets = self.convert_to_assets(ledger, shares)?;
        ledger.burn(self.share_asset(), owner, shares)?;
        ledger.transfer(self.asset, self.address, receiver, assets)?;
        Ok(assets)
    }
}

// ---------------------------------------------------------------------------
// MockSwapRouter
// ---------------------------------------------------------------------------

/// Router quoting from configured exchange rates out of its own reserves.
///
/// `set_exchange_rate(a, b, r)` means one `a` buys `r / 1e18` of `b`. The
/// reverse direction uses the floored inverse `1e36 / r`.
pub struct MockSwapRouter {
    address: Address,
    rates: Mutex<HashMap<(AssetId, AssetId), U256>>,
    failing: AtomicBool,
}

impl MockSwapRouter {
    #[must_use]
    pub fn new(address: Address) -> Self {
        Self {
            address,
            rates: Mutex::new(HashMap::new()),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_exchange_rate(&self, from: AssetId, to: AssetId, rate: U256) {
        self.rates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((from, to), rate);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn rate(&self, token_in: AssetId, token_out: AssetId) -> Result<U256> {
        let rates = self.rates.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(rate) = rates.get(&(token_in, token_out)) {
            return Ok(*rate);
        }
        if let Some(rate) = rates.get(&(token_out, token_in)) {
            return mul_div(WAD, WAD, *rate);
        }
        Err(venue_error(self.address, "no pool"))
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(venue_error(self.address, "router paused"));
        }
        Ok(())
    }
}

impl Venue for MockSwapRouter {
    fn address(&self) -> Address {
        self.address
    }

    fn execute(&self, ledger: &mut Ledger, caller: Address, call: &VenueCall) -> Result<Amount> {
        match call {
            VenueCall::SwapExactInput(params) => self.exact_input_single(ledger, caller, params),
            VenueCall::VaultDeposit { .. } => Err(venue_error(self.address, "unsupported call")),
        }
    }
}

impl SwapRouter for MockSwapRouter {
    fn exact_input_single(
        &self,
        ledger: &mut Ledger,
        caller: Address,
        params: &ExactInputParams,
    ) -> Result<Amount> {
        self.check()?;
        let rate = self.rate(params.token_in, params.token_out)?;
        let amount_out = mul_div(params.amount_in, rate, WAD)?;
        if amount_out < params.amount_out_minimum {
            return Err(venue_error(self.address, "Insufficient output amount"));
        }
        ledger.transfer_from(
            params.token_in,
            self.address,
            caller,
            self.address,
            params.amount_in,
        )?;
        ledger.transfer(params.token_out, self.address, params.recipient, amount_out)?;
        Ok(amount_out)
    }

    fn exact_output_single(
        &self,
        ledger: &mut Ledger,
        caller: Address,
        params: &ExactOutputParams,
    ) -> Result<Amount> {
        self.check()?;
        let rate = self.rate(params.token_in, params.token_out)?;
        let amount_in = mul_div(params.amount_out, WAD, rate)?;
        if amount_in > params.amount_in_maximum {
            return Err(venue_error(self.address, "Excessive input amount"));
        }
        ledger.transfer_from(params.token_in, self.address, caller, self.address, amount_in)?;
        ledger.transfer(
            params.token_out,
            self.address,
            params.recipient,
            params.amount_out,
        )?;
        Ok(amount_in)
    }
}

// ---------------------------------------------------------------------------
// MockPriceFeed
// ---------------------------------------------------------------------------

pub struct MockPriceFeed {
    answer: Mutex<U256>,
    decimals: u8,
}

impl MockPriceFeed {
    #[must_use]
    pub fn new(decimals: u8, answer: U256) -> Self {
        Self {
            answer: Mutex::new(answer),
            decimals,
        }
    }

    pub fn set_answer(&self, answer: U256) {
        *self.answer.lock().unwrap_or_else(PoisonError::into_inner) = answer;
    }
}

impl PriceFeed for MockPriceFeed {
    fn latest_answer(&self) -> Result<U256> {
        Ok(*self.answer.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn decimals(&self) -> u8 {
        self.decimals
    }
}

// ---------------------------------------------------------------------------
// MockChannel
// ---------------------------------------------------------------------------

/// Lifecycle of a deposit pushed through a [`MockChannel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepositStatus {
    Unknown,
    Pending,
    CancelRequested,
    Reclaimed,
}

impl DepositStatus {
    fn code(self) -> U256 {
        U256::from(match self {
            Self::Unknown => 0u8,
            Self::Pending => 1,
            Self::CancelRequested => 2,
            Self::Reclaimed => 3,
        })
    }

    fn from_code(code: U256) -> Self {
        match u8::try_from(code).unwrap_or(0) {
            1 => Self::Pending,
            2 => Self::CancelRequested,
            3 => Self::Reclaimed,
            _ => Self::Unknown,
        }
    }
}

const DEPOSIT_AMOUNT: &str = "channel.deposit.amount";
const DEPOSIT_OWNER: &str = "channel.deposit.owner";
const DEPOSIT_STATUS: &str = "channel.deposit.status";
const DEPOSIT_NONCE: &str = "channel.deposit.nonce";

/// Bridge that escrows pushed funds at its own address.
///
/// Funds arriving from the remote side are modelled by minting to the
/// channel address ([`MockChannel::deliver`]); a pull pays them out. A
/// channel carrying [`AssetId::NATIVE`] takes pushed funds as attached
/// value rather than through an allowance.
pub struct MockChannel {
    id: ChannelId,
    asset: AssetId,
    fail_pull: AtomicBool,
    fail_push: AtomicBool,
}

impl MockChannel {
    #[must_use]
    pub fn new(id: ChannelId, asset: AssetId) -> Self {
        Self {
            id,
            asset,
            fail_pull: AtomicBool::new(false),
            fail_push: AtomicBool::new(false),
        }
    }

    pub fn set_fail_pull(&self, failing: bool) {
        self.fail_pull.store(failing, Ordering::SeqCst);
    }

    pub fn set_fail_push(&self, failing: bool) {
        self.fail_push.store(failing, Ordering::SeqCst);
    }

    /// Funds delivered from the remote side, claimable by a pull.
    pub fn deliver(&self, ledger: &mut Ledger, amount: Amount) -> Result<()> {
        ledger.mint(self.asset, self.id.address(), amount)
    }

    #[must_use]
    pub fn deposit_status(&self, ledger: &Ledger, nonce: U256) -> DepositStatus {
        DepositStatus::from_code(self.load(ledger, DEPOSIT_STATUS, nonce))
    }

    #[must_use]
    pub fn deposit_amount(&self, ledger: &Ledger, nonce: U256) -> Amount {
        self.load(ledger, DEPOSIT_AMOUNT, nonce)
    }

    /// Nonce the next push will get.
    #[must_use]
    pub fn next_nonce(&self, ledger: &Ledger) -> U256 {
        self.load(ledger, DEPOSIT_NONCE, U256::ZERO)
    }

    fn load(&self, ledger: &Ledger, namespace: &str, key: U256) -> U256 {
        ledger.load(self.id.address(), Ledger::slot(namespace, key))
    }

    fn store(&self, ledger: &mut Ledger, namespace: &str, key: U256, value: U256) {
        ledger.store(self.id.address(), Ledger::slot(namespace, key), value);
    }

    fn failure(&self, reason: impl Into<String>) -> CrosspoolError {
        CrosspoolError::ChannelFailure {
            channel: self.id,
            reason: reason.into(),
        }
    }

    fn ensure_owned_deposit(
        &self,
        ledger: &Ledger,
        caller: Address,
        amount: Amount,
        nonce: U256,
        expected: DepositStatus,
    ) -> Result<()> {
        let status = self.deposit_status(ledger, nonce);
        if status != expected {
            return Err(self.failure(format!("deposit {nonce} is {status:?}")));
        }
        let owner = self.load(ledger, DEPOSIT_OWNER, nonce);
        if owner != address_word(caller) {
            return Err(self.failure(format!("deposit {nonce} not owned by {caller}")));
        }
        if self.deposit_amount(ledger, nonce) != amount {
            return Err(self.failure(format!("deposit {nonce} amount mismatch")));
        }
        Ok(())
    }
}

impl Channel for MockChannel {
    fn id(&self) -> ChannelId {
        self.id
    }

    fn asset(&self) -> AssetId {
        self.asset
    }

    fn pull(&self, ledger: &mut Ledger, recipient: Address, amount: Amount) -> Result<Amount> {
        if self.fail_pull.load(Ordering::SeqCst) {
            return Err(self.failure("withdrawal not finalized"));
        }
        ledger
            .transfer(self.asset, self.id.address(), recipient, amount)
            .map_err(|e| self.failure(e.to_string()))?;
        Ok(amount)
    }

    fn push(
        &self,
        ledger: &mut Ledger,
        sender: Address,
        amount: Amount,
        fee: Amount,
    ) -> Result<U256> {
        if self.fail_push.load(Ordering::SeqCst) {
            return Err(self.failure("deposits disabled"));
        }
        let me = self.id.address();
        let moved = if self.asset.is_native() {
            ledger.transfer(self.asset, sender, me, amount)
        } else {
            ledger.transfer_from(self.asset, me, sender, me, amount)
        };
        moved.map_err(|e| self.failure(e.to_string()))?;
        if !fee.is_zero() {
            ledger
                .transfer(AssetId::NATIVE, sender, me, fee)
                .map_err(|e| self.failure(e.to_string()))?;
        }

        let nonce = self.next_nonce(ledger);
        self.store(ledger, DEPOSIT_AMOUNT, nonce, amount);
        self.store(
            ledger,
            DEPOSIT_OWNER,
            nonce,
            address_word(sender),
        );
        self.store(ledger, DEPOSIT_STATUS, nonce, DepositStatus::Pending.code());
        self.store(
            ledger,
            DEPOSIT_NONCE,
            U256::ZERO,
            nonce.saturating_add(U256::from(1u8)),
        );
        Ok(nonce)
    }

    fn cancel_pending_inbound(
        &self,
        ledger: &mut Ledger,
        caller: Address,
        amount: Amount,
        nonce: U256,
    ) -> Result<()> {
        self.ensure_owned_deposit(ledger, caller, amount, nonce, DepositStatus::Pending)?;
        self.store(
            ledger,
            DEPOSIT_STATUS,
            nonce,
            DepositStatus::CancelRequested.code(),
        );
        Ok(())
    }

    fn claim_cancelled(
        &self,
        ledger: &mut Ledger,
        caller: Address,
        asset: AssetId,
        amount: Amount,
        nonce: U256,
    ) -> Result<()> {
        if asset != self.asset {
            return Err(self.failure(format!("channel does not carry {asset}")));
        }
        self.ensure_owned_deposit(ledger, caller, amount, nonce, DepositStatus::CancelRequested)?;
        ledger
            .transfer(self.asset, self.id.address(), caller, amount)
            .map_err(|e| self.failure(e.to_string()))?;
        self.store(ledger, DEPOSIT_STATUS, nonce, DepositStatus::Reclaimed.code());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// BrokenStrategy
// ---------------------------------------------------------------------------

/// An account that does not implement the strategy interface: every call
/// reverts.
pub struct BrokenStrategy {
    id: StrategyId,
}

impl BrokenStrategy {
    #[must_use]
    pub fn new(id: StrategyId) -> Self {
        Self { id }
    }

    fn revert<T>(&self) -> Result<T> {
        Err(venue_error(self.id.address(), "call reverted"))
    }
}

impl Strategy for BrokenStrategy {
    fn id(&self) -> StrategyId {
        self.id
    }

    fn underlying_asset(&self) -> Result<AssetId> {
        self.revert()
    }

    fn yield_asset(&self) -> Result<AssetId> {
        self.revert()
    }

    fn channel(&self) -> Result<ChannelId> {
        self.revert()
    }

    fn pooling_manager(&self) -> Result<Address> {
        self.revert()
    }

    fn address_to_approve(&self) -> Result<Address> {
        self.revert()
    }

    fn venue(&self) -> Result<Arc<dyn Venue>> {
        self.revert()
    }

    fn underlying_to_yield(&self, _ledger: &Ledger, _amount: Amount) -> Result<Amount> {
        self.revert()
    }

    fn yield_to_underlying(&self, _ledger: &Ledger, _amount: Amount) -> Result<Amount> {
        self.revert()
    }

    fn deposit_preparation(&self, _ledger: &Ledger, _amount: Amount) -> Result<PreparedCall> {
        self.revert()
    }

    fn withdraw(&self, _ledger: &mut Ledger, _caller: Address, _amount: Amount) -> Result<Amount> {
        self.revert()
    }
}
