//! Wrapped form of the native asset.
//!
//! The wrapped token's account holds the native backing: wrapping moves
//! native funds into that account and mints the same amount of the
//! wrapped asset; unwrapping burns and pays the backing out again.
//!
//! ```text
//! balance_of(NATIVE, wrapped.address()) >= total_supply(wrapped)
//! ```

use alloy_primitives::Address;
use crosspool_types::{Amount, AssetId, CrosspoolError, Result};
use tracing::debug;

use crate::Ledger;

/// Handle on a wrapped-native token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrappedNative {
    asset: AssetId,
}

impl WrappedNative {
    /// # Errors
    /// [`CrosspoolError::Configuration`] if `asset` is the native asset itself.
    pub fn new(asset: AssetId) -> Result<Self> {
        if asset.is_native() {
            return Err(CrosspoolError::Configuration(
                "wrapped asset must differ from the native asset".into(),
            ));
        }
        Ok(Self { asset })
    }

    #[must_use]
    pub fn asset(&self) -> AssetId {
        self.asset
    }

    /// Turn `amount` of `holder`'s native balance into the wrapped asset.
    pub fn wrap(&self, ledger: &mut Ledger, holder: Address, amount: Amount) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }
        ledger.transfer(AssetId::NATIVE, holder, self.asset.address(), amount)?;
        ledger.mint(self.asset, holder, amount)?;
        debug!(asset = %self.asset, holder = %holder, amount = %amount, "native wrapped");
        Ok(())
    }

    /// Turn `amount` of `holder`'s wrapped balance back into native funds.
    pub fn unwrap(&self, ledger: &mut Ledger, holder: Address, amount: Amount) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }
        ledger.burn(self.asset, holder, amount)?;
        ledger.transfer(AssetId::NATIVE, self.asset.address(), holder, amount)?;
        debug!(asset = %self.asset, holder = %holder, amount = %amount, "native unwrapped");
        Ok(())
    }
}
