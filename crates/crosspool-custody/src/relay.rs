//! Message relay between the two ledgers.
//!
//! Inbound messages are counted per key: the remote side bumps a counter,
//! the manager consumes it exactly once. Outbound messages get a nonce and
//! are recorded under a key derived from their full content.

use alloy_primitives::{Address, B256, U256};
use crosspool_codec::outbound_message_key;
use crosspool_types::{Amount, AssetId, CrosspoolError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Ledger;

/// Receipt of a message handed to the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub key: B256,
    pub nonce: U256,
}

/// The relay surface the pooling manager depends on.
pub trait MessageRelay: Send + Sync {
    /// Number of unconsumed inbound messages stored under `key`.
    fn pending_count(&self, ledger: &Ledger, key: B256) -> U256;

    /// Consume one inbound message under `key`.
    fn consume(&self, ledger: &mut Ledger, key: B256) -> Result<()>;

    /// Send `payload` from `sender` to `target`'s `selector` handler,
    /// paying `fee` in the native asset.
    fn send(
        &self,
        ledger: &mut Ledger,
        sender: Address,
        target: U256,
        selector: B256,
        payload: &[U256],
        fee: Amount,
    ) -> Result<OutboundMessage>;
}

const INBOUND: &str = "relay.inbound";
const OUTBOUND: &str = "relay.outbound";
const NONCE: &str = "relay.nonce";

/// Relay whose counters live in ledger storage under its own address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerRelay {
    address: Address,
}

impl LedgerRelay {
    #[must_use]
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// Deliver one inbound message under `key`, as the remote side would.
    pub fn add_message(&self, ledger: &mut Ledger, key: B256) -> Result<()> {
        let slot = Ledger::slot(INBOUND, U256::from_be_bytes(key.0));
        let count = ledger
            .load(self.address, slot)
            .checked_add(U256::from(1u8))
            .ok_or(CrosspoolError::ArithmeticOverflow)?;
        ledger.store(self.address, slot, count);
        Ok(())
    }

    /// Number of outbound messages recorded under `key`.
    #[must_use]
    pub fn outbound_count(&self, ledger: &Ledger, key: B256) -> U256 {
        ledger.load(self.address, Ledger::slot(OUTBOUND, U256::from_be_bytes(key.0)))
    }

    /// Nonce the next outbound message will get.
    #[must_use]
    pub fn next_nonce(&self, ledger: &Ledger) -> U256 {
        ledger.load(self.address, Ledger::slot(NONCE, U256::ZERO))
    }
}

impl MessageRelay for LedgerRelay {
    fn pending_count(&self, ledger: &Ledger, key: B256) -> U256 {
        ledger.load(self.address, Ledger::slot(INBOUND, U256::from_be_bytes(key.0)))
    }

    fn consume(&self, ledger: &mut Ledger, key: B256) -> Result<()> {
        let slot = Ledger::slot(INBOUND, U256::from_be_bytes(key.0));
        let count = ledger.load(self.address, slot);
        if count.is_zero() {
            return Err(CrosspoolError::RelayFailure {
                reason: format!("no pending message under {key}"),
            });
        }
        ledger.store(self.address, slot, count - U256::from(1u8));
        Ok(())
    }

    fn send(
        &self,
        ledger: &mut Ledger,
        sender: Address,
        target: U256,
        selector: B256,
        payload: &[U256],
        fee: Amount,
    ) -> Result<OutboundMessage> {
        if !fee.is_zero() {
            ledger.transfer(AssetId::NATIVE, sender, self.address, fee)?;
        }
        let nonce_slot = Ledger::slot(NONCE, U256::ZERO);
        let nonce = ledger.load(self.address, nonce_slot);
        let key = outbound_message_key(sender, target, nonce, selector, payload);

        let out_slot = Ledger::slot(OUTBOUND, U256::from_be_bytes(key.0));
        let count = ledger.load(self.address, out_slot);
        ledger.store(self.address, out_slot, count.saturating_add(U256::from(1u8)));
        ledger.store(self.address, nonce_slot, nonce.saturating_add(U256::from(1u8)));

        debug!(key = %key, nonce = %nonce, fee = %fee, "relay message sent");
        Ok(OutboundMessage { key, nonce })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relay() -> LedgerRelay {
        LedgerRelay::new(Address::repeat_byte(0x50))
    }

    #[test]
    fn add_then_consume() {
        let relay = relay();
        let mut ledger = Ledger::new();
        let key = B256::repeat_byte(7);
        assert_eq!(relay.pending_count(&ledger, key), U256::ZERO);
        relay.add_message(&mut ledger, key).unwrap();
        relay.add_message(&mut ledger, key).unwrap();
        assert_eq!(relay.pending_count(&ledger, key), U256::from(2u8));
        relay.consume(&mut ledger, key).unwrap();
        assert_eq!(relay.pending_count(&ledger, key), U256::from(1u8));
    }

    #[test]
    fn consume_without_message_fails() {
        let relay = relay();
        let mut ledger = Ledger::new();
        let err = relay.consume(&mut ledger, B256::ZERO).unwrap_err();
        assert!(matches!(err, CrosspoolError::RelayFailure { .. }));
    }

    #[test]
    fn send_assigns_increasing_nonces_and_charges_fee() {
        let relay = relay();
        let mut ledger = Ledger::new();
        let sender = Address::with_last_byte(1);
        ledger
            .mint(AssetId::NATIVE, sender, U256::from(10u8))
            .unwrap();
        let payload = [U256::from(1u8), U256::ZERO, U256::from(2u8), U256::ZERO];
        let first = relay
            .send(&mut ledger, sender, U256::from(9u8), B256::ZERO, &payload, U256::from(3u8))
            .unwrap();
        let second = relay
            .send(&mut ledger, sender, U256::from(9u8), B256::ZERO, &payload, U256::ZERO)
            .unwrap();
        assert_eq!(first.nonce, U256::ZERO);
        assert_eq!(second.nonce, U256::from(1u8));
        assert_ne!(first.key, second.key);
        assert_eq!(relay.outbound_count(&ledger, first.key), U256::from(1u8));
        assert_eq!(relay.next_nonce(&ledger), U256::from(2u8));
        assert_eq!(
            ledger.balance_of(AssetId::NATIVE, relay.address()),
            U256::from(3u8)
        );
    }

    #[test]
    fn send_without_fee_funds_fails() {
        let relay = relay();
        let mut ledger = Ledger::new();
        let err = relay
            .send(
                &mut ledger,
                Address::with_last_byte(1),
                U256::from(9u8),
                B256::ZERO,
                &[],
                U256::from(1u8),
            )
            .unwrap_err();
        assert!(matches!(err, CrosspoolError::InsufficientBalance { .. }));
        assert_eq!(relay.next_nonce(&ledger), U256::ZERO);
    }
}
