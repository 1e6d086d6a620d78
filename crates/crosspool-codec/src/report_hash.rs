//! Report digests in both directions.
//!
//! A digest is Keccak-256 over a concatenation of 32-byte big-endian words.
//! Fields are never length-prefixed, so every field in the report schema is
//! fixed-width: addresses are left-padded, booleans are `0`/`1`, actions use
//! their wire code.

use alloy_primitives::{Address, B256, Keccak256, U256};
use crosspool_types::{ReportBatch, StrategyAction, StrategyReportItem, TransferItem};
use serde::{Deserialize, Serialize};

use crate::message::address_word;

/// Which side of the exchange a digest proves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigestMode {
    /// The remote ledger's claim about a whole batch; authenticates inbound reports.
    RemoteToLocal,
    /// This side's realized outcome; carried by the acknowledgement.
    LocalToRemote,
}

// ---------------------------------------------------------------------------
// WordEncoder
// ---------------------------------------------------------------------------

/// Streams 32-byte words into a Keccak-256 hasher.
pub struct WordEncoder {
    hasher: Keccak256,
}

impl Default for WordEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl WordEncoder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            hasher: Keccak256::new(),
        }
    }

    pub fn push_word(&mut self, word: U256) -> &mut Self {
        self.hasher.update(word.to_be_bytes::<32>());
        self
    }

    pub fn push_b256(&mut self, word: B256) -> &mut Self {
        self.hasher.update(word);
        self
    }

    pub fn push_address(&mut self, address: Address) -> &mut Self {
        self.push_word(address_word(address))
    }

    pub fn push_bool(&mut self, flag: bool) -> &mut Self {
        self.push_word(U256::from(u8::from(flag)))
    }

    pub fn push_action(&mut self, action: StrategyAction) -> &mut Self {
        self.push_word(U256::from(action.code()))
    }

    fn push_transfer(&mut self, item: &TransferItem) -> &mut Self {
        self.push_address(item.channel.address()).push_word(item.amount)
    }

    #[must_use]
    pub fn finish(self) -> B256 {
        self.hasher.finalize()
    }
}

// ---------------------------------------------------------------------------
// Digests
// ---------------------------------------------------------------------------

/// Remote→local digest of a whole batch.
///
/// Layout: `[epoch]` (omitted when the epoch is zero), then
/// `(channel, amount)` per withdraw item, `(strategy, action, amount,
/// processed)` per strategy report and `(channel, amount)` per deposit item.
#[must_use]
pub fn report_digest(batch: &ReportBatch) -> B256 {
    let mut encoder = WordEncoder::new();
    if !batch.epoch.is_zero() {
        encoder.push_word(batch.epoch.0);
    }
    for item in &batch.withdraw_items {
        encoder.push_transfer(item);
    }
    for report in &batch.strategy_reports {
        encoder
            .push_address(report.strategy.address())
            .push_action(report.action)
            .push_word(report.amount)
            .push_bool(report.processed);
    }
    for item in &batch.deposit_items {
        encoder.push_transfer(item);
    }
    encoder.finish()
}

/// Local→remote digest over finalized reports: `(strategy, action, amount)`
/// per report. Neither the epoch nor the processed flag is included.
#[must_use]
pub fn acknowledgement_digest(reports: &[StrategyReportItem]) -> B256 {
    let mut encoder = WordEncoder::new();
    for report in reports {
        encoder
            .push_address(report.strategy.address())
            .push_action(report.action)
            .push_word(report.amount);
    }
    encoder.finish()
}

/// Digest of `batch` in the requested direction.
#[must_use]
pub fn hash_from_report(batch: &ReportBatch, mode: DigestMode) -> B256 {
    match mode {
        DigestMode::RemoteToLocal => report_digest(batch),
        DigestMode::LocalToRemote => acknowledgement_digest(&batch.strategy_reports),
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, b256};
    use crosspool_types::{ChannelId, Epoch, StrategyId};
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    const EMPTY_HASH: B256 =
        b256!("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470");

    fn channel(n: u8) -> ChannelId {
        ChannelId(Address::with_last_byte(n))
    }

    fn strategy(n: u8) -> StrategyId {
        StrategyId(Address::with_last_byte(n))
    }

    fn sample_batch() -> ReportBatch {
        ReportBatch::new(Epoch::new(4))
            .with_withdraw_item(channel(1), U256::from(10u64))
            .with_report(strategy(2), StrategyAction::Withdraw, U256::from(5u64))
            .with_deposit_item(channel(1), U256::from(3u64))
    }

    #[test]
    fn empty_batch_epoch_zero_is_hash_of_nothing() {
        let digest = report_digest(&ReportBatch::new(Epoch::ZERO));
        assert_eq!(digest, EMPTY_HASH);
        assert_eq!(digest, report_digest(&ReportBatch::new(Epoch::ZERO)));
    }

    #[test]
    fn epoch_zero_is_omitted_but_epoch_one_is_not() {
        let zero = report_digest(&ReportBatch::new(Epoch::ZERO));
        let one = report_digest(&ReportBatch::new(Epoch::new(1)));
        assert_ne!(zero, one);
        assert_eq!(
            one,
            b256!("b10e2d527612073b26eecdfd717e6a320cf44b4afac2b0732d9fcbe2b7fa0cf6")
        );
    }

    #[test]
    fn known_batch_vector() {
        assert_eq!(
            report_digest(&sample_batch()),
            b256!("74c50fe7f8fda5b9f4a58dd599833218269364bf25f266dd3c2e1a80e2a108c3")
        );
    }

    #[test]
    fn processed_flag_changes_inbound_digest_only() {
        let batch = sample_batch();
        let mut flipped = batch.clone();
        flipped.strategy_reports[0].processed = true;
        assert_ne!(report_digest(&batch), report_digest(&flipped));
        assert_eq!(
            acknowledgement_digest(&batch.strategy_reports),
            acknowledgement_digest(&flipped.strategy_reports)
        );
    }

    #[test]
    fn acknowledgement_vector() {
        let batch = sample_batch();
        assert_eq!(
            acknowledgement_digest(&batch.strategy_reports),
            b256!("10a1c303518a4cc36e6f9cd79c69b187492159302d4627d08836294d293d6c3a")
        );
        assert_eq!(acknowledgement_digest(&[]), EMPTY_HASH);
    }

    #[test]
    fn hash_from_report_selects_mode() {
        let batch = sample_batch();
        assert_eq!(
            hash_from_report(&batch, DigestMode::RemoteToLocal),
            report_digest(&batch)
        );
        assert_eq!(
            hash_from_report(&batch, DigestMode::LocalToRemote),
            acknowledgement_digest(&batch.strategy_reports)
        );
    }

    #[test]
    fn raw_word_vector() {
        // Two (strategy, value, amount, flag) rows of a production report.
        let mut encoder = WordEncoder::new();
        encoder
            .push_address(address!("AFa27423F3bb4c0337946dDcd1802588807571bf"))
            .push_word(U256::from(5_009_861_221_786_695_105u64))
            .push_word(U256::ZERO)
            .push_bool(true)
            .push_address(address!("E5e2134e536fbfD7513094646E27C401bbb03eF6"))
            .push_word(U256::from(19_993_021_130_296_587u64))
            .push_word(U256::ZERO)
            .push_bool(false);
        let digest = U256::from_be_bytes(encoder.finish().0);
        let expected: U256 =
            "9394751887553205148934003660731450063757890657721159828438100138263725105979"
                .parse()
                .unwrap();
        assert_eq!(digest, expected);
    }

    #[test]
    fn sequence_order_matters() {
        let a = ReportBatch::new(Epoch::new(2))
            .with_report(strategy(1), StrategyAction::Deposit, U256::from(1u64))
            .with_report(strategy(2), StrategyAction::Deposit, U256::from(1u64));
        let b = ReportBatch::new(Epoch::new(2))
            .with_report(strategy(2), StrategyAction::Deposit, U256::from(1u64))
            .with_report(strategy(1), StrategyAction::Deposit, U256::from(1u64));
        assert_ne!(report_digest(&a), report_digest(&b));
    }

    #[test]
    fn withdraw_and_deposit_sides_are_distinct() {
        let inbound = ReportBatch::new(Epoch::new(1)).with_withdraw_item(channel(1), U256::from(1u64));
        let outbound = ReportBatch::new(Epoch::new(1)).with_deposit_item(channel(1), U256::from(1u64));
        // Same words, same position: the layout alone cannot tell them apart.
        assert_eq!(report_digest(&inbound), report_digest(&outbound));
        let both = inbound.clone().with_deposit_item(channel(1), U256::from(1u64));
        assert_ne!(report_digest(&inbound), report_digest(&both));
    }

    #[test]
    fn random_batches_are_deterministic() {
        let mut rng = StdRng::seed_from_u64(7);
        for round in 0..32u64 {
            let batch = ReportBatch::random(&mut rng, Epoch::new(round), 4);
            let first = report_digest(&batch);
            assert_eq!(first, report_digest(&batch.clone()));
            assert_eq!(hash_from_report(&batch, DigestMode::RemoteToLocal), first);

            let mut tampered = batch.clone();
            tampered.strategy_reports[0].amount += U256::from(1u64);
            assert_ne!(report_digest(&tampered), first);
        }
    }
}
