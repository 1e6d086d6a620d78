//! Report batch model.
//!
//! A remote ledger periodically reports what happened on its side as a
//! [`ReportBatch`]: channel withdrawals that fund this side, one instruction
//! per strategy, and channel deposits that carry realized withdrawals back.
//! The order of every sequence is significant. It feeds the digest and
//! drives processing order, so nothing here ever sorts or deduplicates.

use std::fmt;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::amount::checked_add;
use crate::{Amount, ChannelId, CrosspoolError, Epoch, Result, StrategyId};

// ---------------------------------------------------------------------------
// TransferItem
// ---------------------------------------------------------------------------

/// One movement of funds against a transfer channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferItem {
    pub channel: ChannelId,
    pub amount: Amount,
}

impl TransferItem {
    #[must_use]
    pub fn new(channel: ChannelId, amount: Amount) -> Self {
        Self { channel, amount }
    }
}

// ---------------------------------------------------------------------------
// StrategyAction
// ---------------------------------------------------------------------------

/// What a strategy report asks this side to do.
///
/// Discriminants are the on-wire codes used in digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyAction {
    /// Move underlying from the manager into the strategy's venue.
    Deposit = 0,
    /// Valuation only; no funds move.
    Update = 1,
    /// Pull underlying out of the strategy back to the manager.
    Withdraw = 2,
}

impl StrategyAction {
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for StrategyAction {
    type Error = CrosspoolError;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::Deposit),
            1 => Ok(Self::Update),
            2 => Ok(Self::Withdraw),
            other => Err(CrosspoolError::InvalidReport {
                reason: format!("unknown strategy action code {other}"),
            }),
        }
    }
}

impl fmt::Display for StrategyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deposit => write!(f, "DEPOSIT"),
            Self::Update => write!(f, "UPDATE"),
            Self::Withdraw => write!(f, "WITHDRAW"),
        }
    }
}

// ---------------------------------------------------------------------------
// StrategyReportItem
// ---------------------------------------------------------------------------

/// One instruction for a strategy plus its outcome flag.
///
/// `processed` is written by the settlement loop; incoming reports
/// normally carry `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyReportItem {
    pub strategy: StrategyId,
    pub action: StrategyAction,
    pub amount: Amount,
    pub processed: bool,
}

impl StrategyReportItem {
    #[must_use]
    pub fn new(strategy: StrategyId, action: StrategyAction, amount: Amount) -> Self {
        Self {
            strategy,
            action,
            amount,
            processed: false,
        }
    }
}

// ---------------------------------------------------------------------------
// ReportBatch
// ---------------------------------------------------------------------------

/// The unit of settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportBatch {
    pub epoch: Epoch,
    /// Inbound funding, pulled from channels before any strategy runs.
    pub withdraw_items: Vec<TransferItem>,
    /// Per-strategy instructions, processed in order.
    pub strategy_reports: Vec<StrategyReportItem>,
    /// Outbound transfers, pushed after all strategies ran.
    pub deposit_items: Vec<TransferItem>,
}

impl ReportBatch {
    /// An empty batch for `epoch`.
    #[must_use]
    pub fn new(epoch: Epoch) -> Self {
        Self {
            epoch,
            withdraw_items: Vec::new(),
            strategy_reports: Vec::new(),
            deposit_items: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_withdraw_item(mut self, channel: ChannelId, amount: Amount) -> Self {
        self.withdraw_items.push(TransferItem::new(channel, amount));
        self
    }

    #[must_use]
    pub fn with_report(
        mut self,
        strategy: StrategyId,
        action: StrategyAction,
        amount: Amount,
    ) -> Self {
        self.strategy_reports
            .push(StrategyReportItem::new(strategy, action, amount));
        self
    }

    #[must_use]
    pub fn with_deposit_item(mut self, channel: ChannelId, amount: Amount) -> Self {
        self.deposit_items.push(TransferItem::new(channel, amount));
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.withdraw_items.is_empty()
            && self.strategy_reports.is_empty()
            && self.deposit_items.is_empty()
    }

    /// The `processed` flag of every report, in order.
    #[must_use]
    pub fn processed_flags(&self) -> Vec<bool> {
        self.strategy_reports.iter().map(|r| r.processed).collect()
    }
}

// ---------------------------------------------------------------------------
// ReportFees
// ---------------------------------------------------------------------------

/// Native-asset fees a relayer attaches to a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFees {
    /// Paid once per batch, to the channel of the first outbound push.
    /// Unspent when the batch forwards nothing.
    pub inbound_channel_fee: Amount,
    /// Paid to the relay for the acknowledgement message.
    pub outbound_messaging_fee: Amount,
}

impl ReportFees {
    #[must_use]
    pub fn new(inbound_channel_fee: Amount, outbound_messaging_fee: Amount) -> Self {
        Self {
            inbound_channel_fee,
            outbound_messaging_fee,
        }
    }

    /// Sum of both fees; the minimum value a caller must attach.
    pub fn total(&self) -> Result<Amount> {
        checked_add(self.inbound_channel_fee, self.outbound_messaging_fee)
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.inbound_channel_fee == U256::ZERO && self.outbound_messaging_fee == U256::ZERO
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl ReportBatch {
    /// A batch with `reports` random strategy reports and one random
    /// transfer item on each side.
    pub fn random<R: rand::Rng>(rng: &mut R, epoch: Epoch, reports: usize) -> Self {
        use alloy_primitives::Address;

        fn address<R: rand::Rng>(rng: &mut R) -> Address {
            let mut bytes = [0u8; 20];
            rng.fill(&mut bytes);
            Address::from(bytes)
        }

        let mut batch = Self::new(epoch)
            .with_withdraw_item(ChannelId(address(rng)), U256::from(rng.r#gen::<u64>()));
        for _ in 0..reports {
            let action = match rng.gen_range(0u8..3) {
                0 => StrategyAction::Deposit,
                1 => StrategyAction::Update,
                _ => StrategyAction::Withdraw,
            };
            batch = batch.with_report(
                StrategyId(address(rng)),
                action,
                U256::from(rng.r#gen::<u128>()),
            );
        }
        batch.with_deposit_item(ChannelId(address(rng)), U256::from(rng.r#gen::<u64>()))
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::Address;

    use super::*;

    fn strategy(n: u8) -> StrategyId {
        StrategyId(Address::with_last_byte(n))
    }

    #[test]
    fn action_codes_match_wire_values() {
        assert_eq!(StrategyAction::Deposit.code(), 0);
        assert_eq!(StrategyAction::Update.code(), 1);
        assert_eq!(StrategyAction::Withdraw.code(), 2);
        assert_eq!(StrategyAction::try_from(2).unwrap(), StrategyAction::Withdraw);
        assert!(matches!(
            StrategyAction::try_from(3),
            Err(CrosspoolError::InvalidReport { .. })
        ));
    }

    #[test]
    fn builder_preserves_insertion_order() {
        let batch = ReportBatch::new(Epoch::new(1))
            .with_report(strategy(9), StrategyAction::Withdraw, U256::from(1u64))
            .with_report(strategy(1), StrategyAction::Deposit, U256::from(2u64))
            .with_report(strategy(5), StrategyAction::Update, U256::ZERO);
        let order: Vec<_> = batch.strategy_reports.iter().map(|r| r.strategy).collect();
        assert_eq!(order, vec![strategy(9), strategy(1), strategy(5)]);
        assert_eq!(batch.processed_flags(), vec![false, false, false]);
    }

    #[test]
    fn empty_batch() {
        assert!(ReportBatch::new(Epoch::ZERO).is_empty());
        let batch = ReportBatch::new(Epoch::ZERO)
            .with_deposit_item(ChannelId(Address::with_last_byte(1)), U256::from(1u64));
        assert!(!batch.is_empty());
    }

    #[test]
    fn fee_total() {
        let fees = ReportFees::new(U256::from(3u64), U256::from(4u64));
        assert_eq!(fees.total().unwrap(), U256::from(7u64));
        assert!(ReportFees::default().is_zero());
        let overflow = ReportFees::new(U256::MAX, U256::from(1u64));
        assert_eq!(overflow.total().unwrap_err(), CrosspoolError::ArithmeticOverflow);
    }

    #[test]
    fn batch_serde_roundtrip() {
        let batch = ReportBatch::new(Epoch::new(3))
            .with_withdraw_item(ChannelId(Address::with_last_byte(2)), U256::from(10u64))
            .with_report(strategy(4), StrategyAction::Deposit, U256::from(10u64));
        let json = serde_json::to_string(&batch).unwrap();
        let back: ReportBatch = serde_json::from_str(&json).unwrap();
        assert_eq!(batch, back);
    }
}
