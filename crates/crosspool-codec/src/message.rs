//! Relay message keys and the acknowledgement payload.
//!
//! The relay stores messages under a key derived from sender, recipient,
//! selector and payload. 256-bit values travel as two 128-bit halves
//! (low first) because the remote ledger's native word is narrower.

use alloy_primitives::{Address, B256, U256};
use crosspool_types::{Epoch, constants};

use crate::report_hash::WordEncoder;

/// Split a word into `(low128, high128)`.
#[must_use]
pub fn split_u256(value: U256) -> (U256, U256) {
    let low = value & U256::from(u128::MAX);
    let high = value >> 128;
    (low, high)
}

/// An address widened to a 256-bit word, as the remote side sees it.
#[must_use]
pub fn address_word(address: Address) -> U256 {
    U256::from_be_bytes(address.into_word().0)
}

/// Key of the relay message that authenticates an inbound report.
///
/// `Hash(remote_manager, local_manager, selector_code, low(digest), high(digest))`.
/// `selector_code` separates report messages from other message classes
/// travelling between the same two managers.
#[must_use]
pub fn inbound_message_key(
    remote_manager: U256,
    local_manager: Address,
    selector_code: u64,
    digest: B256,
) -> B256 {
    let (low, high) = split_u256(U256::from_be_bytes(digest.0));
    let mut encoder = WordEncoder::new();
    encoder
        .push_word(remote_manager)
        .push_address(local_manager)
        .push_word(U256::from(selector_code))
        .push_word(low)
        .push_word(high);
    encoder.finish()
}

/// Payload of an acknowledgement: `[low(epoch), high(epoch), low(digest), high(digest)]`.
#[must_use]
pub fn acknowledgement_payload(
    epoch: Epoch,
    digest: B256,
) -> [U256; constants::ACKNOWLEDGEMENT_PAYLOAD_WORDS] {
    let (epoch_low, epoch_high) = split_u256(epoch.0);
    let (digest_low, digest_high) = split_u256(U256::from_be_bytes(digest.0));
    [epoch_low, epoch_high, digest_low, digest_high]
}

/// Key under which the relay records an outbound message.
///
/// `Hash(local_manager, remote_target, nonce, selector, len(payload), payload...)`.
#[must_use]
pub fn outbound_message_key(
    local_manager: Address,
    remote_target: U256,
    nonce: U256,
    selector: B256,
    payload: &[U256],
) -> B256 {
    let mut encoder = WordEncoder::new();
    encoder
        .push_address(local_manager)
        .push_word(remote_target)
        .push_word(nonce)
        .push_b256(selector)
        .push_word(U256::from(payload.len()));
    for word in payload {
        encoder.push_word(*word);
    }
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use alloy_primitives::b256;

    use super::*;
    use crate::report_hash::{acknowledgement_digest, report_digest};
    use crosspool_types::{ChannelId, ReportBatch, StrategyAction, StrategyId};

    fn sample_batch() -> ReportBatch {
        ReportBatch::new(Epoch::new(4))
            .with_withdraw_item(ChannelId(Address::with_last_byte(1)), U256::from(10u64))
            .with_report(
                StrategyId(Address::with_last_byte(2)),
                StrategyAction::Withdraw,
                U256::from(5u64),
            )
            .with_deposit_item(ChannelId(Address::with_last_byte(1)), U256::from(3u64))
    }

    #[test]
    fn split_recombines() {
        let value = U256::from(u128::MAX) + (U256::from(7u64) << 128);
        let (low, high) = split_u256(value);
        assert_eq!(low, U256::from(u128::MAX));
        assert_eq!(high, U256::from(7u64));
        assert_eq!((high << 128) | low, value);
    }

    #[test]
    fn split_max() {
        let (low, high) = split_u256(U256::MAX);
        assert_eq!(low, U256::from(u128::MAX));
        assert_eq!(high, U256::from(u128::MAX));
    }

    #[test]
    fn address_word_is_left_padded() {
        assert_eq!(address_word(Address::with_last_byte(0x0a)), U256::from(0x0au64));
    }

    #[test]
    fn inbound_key_vector() {
        let digest = report_digest(&sample_batch());
        let key = inbound_message_key(
            U256::from(0xbeefu64),
            Address::with_last_byte(0x0a),
            constants::REPORT_SELECTOR_CODE,
            digest,
        );
        assert_eq!(
            key,
            b256!("cbd289ccb2ceeb6a2ea03b8dcc5aa29910165f7fb5f3d3e8d6df599a71ba13b4")
        );
    }

    #[test]
    fn selector_code_separates_keys() {
        let digest = report_digest(&sample_batch());
        let remote = U256::from(0xbeefu64);
        let local = Address::with_last_byte(0x0a);
        assert_ne!(
            inbound_message_key(remote, local, 2, digest),
            inbound_message_key(remote, local, 1, digest)
        );
    }

    #[test]
    fn payload_layout() {
        let digest = B256::from((U256::from(9u64) << 128usize | U256::from(5u64)).to_be_bytes::<32>());
        let payload = acknowledgement_payload(Epoch::new(4), digest);
        assert_eq!(
            payload,
            [U256::from(4u64), U256::ZERO, U256::from(5u64), U256::from(9u64)]
        );
    }

    #[test]
    fn outbound_key_vector() {
        let ack = acknowledgement_digest(&sample_batch().strategy_reports);
        let payload = acknowledgement_payload(Epoch::new(4), ack);
        let key = outbound_message_key(
            Address::with_last_byte(0x0a),
            U256::from(0xbeefu64),
            U256::ZERO,
            constants::DEFAULT_ACKNOWLEDGEMENT_SELECTOR,
            &payload,
        );
        assert_eq!(
            key,
            b256!("6d64d72ec4a1f7d7e00a2cffb6b9a9697c0cc65e004a8e0c1fea887b6f48eb0a")
        );
    }

    #[test]
    fn nonce_changes_outbound_key() {
        let payload = acknowledgement_payload(Epoch::new(1), B256::ZERO);
        let selector = constants::DEFAULT_ACKNOWLEDGEMENT_SELECTOR;
        let local = Address::with_last_byte(1);
        let remote = U256::from(2u64);
        assert_ne!(
            outbound_message_key(local, remote, U256::ZERO, selector, &payload),
            outbound_message_key(local, remote, U256::from(1u64), selector, &payload)
        );
    }
}
