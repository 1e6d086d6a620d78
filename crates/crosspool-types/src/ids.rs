//! Identifiers used throughout Crosspool.
//!
//! Local identities are 20-byte account addresses wrapped in newtypes so a
//! strategy can never be passed where a channel is expected. Remote-side
//! identities (the remote manager) are full 256-bit words and stay as
//! [`U256`].

use std::fmt;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// Amounts are plain 256-bit unsigned integers in the asset's base units.
pub type Amount = U256;

// ---------------------------------------------------------------------------
// StrategyId
// ---------------------------------------------------------------------------

/// Account address of a registered strategy adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct StrategyId(pub Address);

impl StrategyId {
    #[must_use]
    pub fn address(&self) -> Address {
        self.0
    }
}

impl From<Address> for StrategyId {
    fn from(address: Address) -> Self {
        Self(address)
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "strategy:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ChannelId
// ---------------------------------------------------------------------------

/// Account address of a transfer channel (bridge).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ChannelId(pub Address);

impl ChannelId {
    #[must_use]
    pub fn address(&self) -> Address {
        self.0
    }
}

impl From<Address> for ChannelId {
    fn from(address: Address) -> Self {
        Self(address)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "channel:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// AssetId
// ---------------------------------------------------------------------------

/// Token address of a fungible asset held in the custody ledger.
///
/// [`AssetId::NATIVE`] (the zero address) denotes the native fee asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AssetId(pub Address);

impl AssetId {
    /// The native asset used to pay channel and messaging fees.
    pub const NATIVE: Self = Self(Address::ZERO);

    #[must_use]
    pub fn address(&self) -> Address {
        self.0
    }

    #[must_use]
    pub fn is_native(&self) -> bool {
        self.0 == Address::ZERO
    }

    /// First four bytes in hex, for compact log fields.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0.as_slice()[..4])
    }
}

impl From<Address> for AssetId {
    fn from(address: Address) -> Self {
        Self(address)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_native() {
            write!(f, "asset:native")
        } else {
            write!(f, "asset:{}", self.0)
        }
    }
}

// ---------------------------------------------------------------------------
// Epoch
// ---------------------------------------------------------------------------

/// Tag identifying a report batch.
///
/// Epochs are meaningful in sequence but ordering is not enforced: any
/// authenticated epoch is accepted. `Epoch(0)` is a sentinel that the
/// report digest leaves out of its encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Epoch(pub U256);

impl Epoch {
    pub const ZERO: Self = Self(U256::ZERO);

    #[must_use]
    pub fn new(value: u64) -> Self {
        Self(U256::from(value))
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(U256::from(1u8)))
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "epoch:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_asset_is_zero_address() {
        assert!(AssetId::NATIVE.is_native());
        assert!(!AssetId(Address::repeat_byte(0x11)).is_native());
        assert_eq!(format!("{}", AssetId::NATIVE), "asset:native");
    }

    #[test]
    fn epoch_next_and_zero() {
        assert!(Epoch::ZERO.is_zero());
        assert_eq!(Epoch::new(4).next(), Epoch::new(5));
        assert_eq!(Epoch(U256::MAX).next(), Epoch(U256::MAX));
    }

    #[test]
    fn ids_display_prefix() {
        let addr = Address::with_last_byte(7);
        assert!(format!("{}", StrategyId(addr)).starts_with("strategy:0x"));
        assert!(format!("{}", ChannelId(addr)).starts_with("channel:0x"));
    }

    #[test]
    fn asset_short_is_four_bytes() {
        let asset = AssetId(Address::repeat_byte(0xab));
        assert_eq!(asset.short(), "abababab");
    }

    #[test]
    fn serde_roundtrips() {
        let id = StrategyId(Address::with_last_byte(9));
        let json = serde_json::to_string(&id).unwrap();
        let back: StrategyId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);

        let epoch = Epoch::new(42);
        let json = serde_json::to_string(&epoch).unwrap();
        let back: Epoch = serde_json::from_str(&json).unwrap();
        assert_eq!(epoch, back);
    }
}
