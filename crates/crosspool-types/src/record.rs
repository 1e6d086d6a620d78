//! Registry record of an onboarded strategy.

use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AssetId, ChannelId, StrategyId};

/// Everything the manager learned about a strategy when it was registered.
///
/// Records are append-only: there is no deregistration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyRecord {
    pub strategy: StrategyId,
    /// Asset the manager holds and the remote side reports in.
    pub underlying_asset: AssetId,
    /// Asset the strategy holds after a deposit.
    pub yield_asset: AssetId,
    /// Channel that carries this strategy's underlying between ledgers.
    pub channel: ChannelId,
    /// Venue granted an unlimited underlying allowance from the manager.
    pub approve_target: Address,
    pub registered_at: DateTime<Utc>,
}
