//! System-wide constants for Crosspool.
//!
//! Not re-exported at the crate root; access them as
//! `crosspool_types::constants::FOO`.

use alloy_primitives::{b256, B256, U256};

/// Fixed-point scale used for factors and oracle precision (`10^18`).
pub const WAD: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Lower bound of a swap strategy's minimum-received factor (`0.95`).
pub const MIN_SLIPPAGE_FACTOR: U256 = U256::from_limbs([950_000_000_000_000_000, 0, 0, 0]);

/// Upper bound of a swap strategy's minimum-received factor (`1.0`).
pub const MAX_SLIPPAGE_FACTOR: U256 = WAD;

/// Minimum-received factor a swap strategy starts with (`0.99`).
pub const DEFAULT_MIN_RECEIVED_FACTOR: U256 =
    U256::from_limbs([990_000_000_000_000_000, 0, 0, 0]);

/// Selector code mixed into the key of an inbound report message.
pub const REPORT_SELECTOR_CODE: u64 = 2;

/// Selector of the remote handler that receives acknowledgements.
pub const DEFAULT_ACKNOWLEDGEMENT_SELECTOR: B256 =
    b256!("010e13e50cb99b6b3c8270ec6e16acfccbe1164a629d74b43549567a77593aff");

/// Number of 128-bit words in an acknowledgement payload.
pub const ACKNOWLEDGEMENT_PAYLOAD_WORDS: usize = 4;

/// Preimage of the relayer role identifier.
pub const RELAYER_ROLE_NAME: &str = "RELAYER_ROLE";

/// Largest number of fractional digits a config factor may carry before
/// it is truncated to WAD precision.
pub const WAD_DECIMALS: u32 = 18;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Crosspool";
