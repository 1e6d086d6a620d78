//! Transfer channels (bridges) between the local and remote ledgers.

use alloy_primitives::{Address, U256};
use crosspool_types::{Amount, AssetId, ChannelId, Result};

use crate::Ledger;

/// A bridge carrying one asset between the two ledgers.
///
/// Implementations move funds through the ledger they are handed, so a
/// failed settlement rolls their effects back with everything else.
pub trait Channel: Send + Sync {
    fn id(&self) -> ChannelId;

    /// The asset this channel carries.
    fn asset(&self) -> AssetId;

    /// Claim `amount` that arrived from the remote side and pay it to
    /// `recipient`. Returns the amount actually received.
    fn pull(&self, ledger: &mut Ledger, recipient: Address, amount: Amount) -> Result<Amount>;

    /// Send `amount` from `sender` to the remote side, paying `fee` in the
    /// native asset. Returns the deposit nonce.
    fn push(&self, ledger: &mut Ledger, sender: Address, amount: Amount, fee: Amount)
    -> Result<U256>;

    /// Ask the channel to cancel an outbound deposit that has not been
    /// delivered yet.
    fn cancel_pending_inbound(
        &self,
        ledger: &mut Ledger,
        caller: Address,
        amount: Amount,
        nonce: U256,
    ) -> Result<()>;

    /// Reclaim a cancelled deposit back to `caller`.
    fn claim_cancelled(
        &self,
        ledger: &mut Ledger,
        caller: Address,
        asset: AssetId,
        amount: Amount,
        nonce: U256,
    ) -> Result<()>;
}
