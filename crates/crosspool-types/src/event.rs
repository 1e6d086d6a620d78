//! Events emitted by the pooling manager.

use alloy_primitives::{B256, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Amount, ChannelId, Epoch, StrategyAction, StrategyId, StrategyReportItem};

/// Result of dispatching one strategy report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemOutcome {
    /// Position of the report inside the batch.
    pub index: usize,
    pub strategy: StrategyId,
    pub action: StrategyAction,
    pub processed: bool,
    /// Underlying actually moved: deposited for `Deposit`, received for
    /// `Withdraw`, zero for `Update` and for failures.
    pub realized: Amount,
    /// Display form of the absorbed error when `processed` is false.
    pub failure: Option<String>,
}

/// Acknowledgement sent back to the remote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    /// Local→remote digest over the finalized reports.
    pub digest: B256,
    /// Relay key under which the outbound message was recorded.
    pub key: B256,
    /// Relay nonce assigned to the message.
    pub nonce: U256,
}

/// A fully settled report batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportHandled {
    pub epoch: Epoch,
    /// Finalized reports with their `processed` flags.
    pub reports: Vec<StrategyReportItem>,
    pub outcomes: Vec<ItemOutcome>,
    pub acknowledgement: Acknowledgement,
    pub handled_at: DateTime<Utc>,
}

impl ReportHandled {
    /// Final `processed` flag of every report, in batch order.
    #[must_use]
    pub fn processed_flags(&self) -> Vec<bool> {
        self.reports.iter().map(|r| r.processed).collect()
    }
}

/// Everything observable the manager emits, in emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PoolingEvent {
    StrategyRegistered {
        strategy: StrategyId,
        at: DateTime<Utc>,
    },
    ChannelRegistered {
        channel: ChannelId,
        at: DateTime<Utc>,
    },
    StrategySlippageUpdated {
        strategy: StrategyId,
        factor: U256,
        at: DateTime<Utc>,
    },
    ReportHandled(ReportHandled),
}

impl PoolingEvent {
    /// The settled batch, if this is a `ReportHandled` event.
    #[must_use]
    pub fn as_report_handled(&self) -> Option<&ReportHandled> {
        match self {
            Self::ReportHandled(handled) => Some(handled),
            _ => None,
        }
    }
}
