//! Configuration types for a pooling manager deployment.

use alloy_primitives::{Address, B256, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amount::wad_from_decimal;
use crate::{AssetId, ChannelId, constants, CrosspoolError, Result};

fn default_report_selector_code() -> u64 {
    constants::REPORT_SELECTOR_CODE
}

fn default_acknowledgement_selector() -> B256 {
    constants::DEFAULT_ACKNOWLEDGEMENT_SELECTOR
}

/// Identity and wiring of one pooling manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// This manager's own account address.
    pub address: Address,
    /// Identifier of the manager on the remote ledger.
    pub remote_manager: U256,
    /// Initial holder of the admin role.
    pub admin: Address,
    /// Accounts granted the relayer role at construction.
    #[serde(default)]
    pub relayers: Vec<Address>,
    /// Selector code mixed into inbound report message keys.
    #[serde(default = "default_report_selector_code")]
    pub report_selector_code: u64,
    /// Remote handler selector for outbound acknowledgements.
    #[serde(default = "default_acknowledgement_selector")]
    pub acknowledgement_selector: B256,
    /// Channel carrying the native asset, if any.
    #[serde(default)]
    pub native_bridge: Option<NativeBridgeConfig>,
}

/// A channel that carries the native asset while strategies hold its
/// wrapped form.
///
/// Pulled native funds are wrapped on arrival; wrapped funds are unwrapped
/// right before they are pushed back out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeBridgeConfig {
    pub channel: ChannelId,
    pub wrapped_asset: AssetId,
}

impl ManagerConfig {
    #[must_use]
    pub fn new(address: Address, remote_manager: U256, admin: Address) -> Self {
        Self {
            address,
            remote_manager,
            admin,
            relayers: Vec::new(),
            report_selector_code: constants::REPORT_SELECTOR_CODE,
            acknowledgement_selector: constants::DEFAULT_ACKNOWLEDGEMENT_SELECTOR,
            native_bridge: None,
        }
    }

    #[must_use]
    pub fn with_relayer(mut self, relayer: Address) -> Self {
        self.relayers.push(relayer);
        self
    }

    #[must_use]
    pub fn with_native_bridge(mut self, channel: ChannelId, wrapped_asset: AssetId) -> Self {
        self.native_bridge = Some(NativeBridgeConfig {
            channel,
            wrapped_asset,
        });
        self
    }

    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot authenticate anything.
    pub fn validate(&self) -> Result<()> {
        if self.address == Address::ZERO {
            return Err(CrosspoolError::Configuration(
                "manager address must be non-zero".into(),
            ));
        }
        if self.admin == Address::ZERO {
            return Err(CrosspoolError::Configuration(
                "admin must be non-zero".into(),
            ));
        }
        if self.remote_manager.is_zero() {
            return Err(CrosspoolError::Configuration(
                "remote manager must be non-zero".into(),
            ));
        }
        if self.relayers.contains(&Address::ZERO) {
            return Err(CrosspoolError::Configuration(
                "relayer must be non-zero".into(),
            ));
        }
        if let Some(native) = &self.native_bridge {
            if native.wrapped_asset.is_native() {
                return Err(CrosspoolError::Configuration(
                    "wrapped asset must differ from the native asset".into(),
                ));
            }
            if native.channel.address() == Address::ZERO {
                return Err(CrosspoolError::Configuration(
                    "native bridge channel must be non-zero".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Human-written slippage setting for a swap strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlippageConfig {
    /// Fraction of the oracle-implied amount a swap must at least return,
    /// e.g. `0.98`.
    pub min_received_factor: Decimal,
}

impl Default for SlippageConfig {
    fn default() -> Self {
        Self {
            min_received_factor: Decimal::new(99, 2),
        }
    }
}

impl SlippageConfig {
    #[must_use]
    pub fn new(min_received_factor: Decimal) -> Self {
        Self {
            min_received_factor,
        }
    }

    /// The factor as an 18-decimal fixed-point integer. Bounds are
    /// enforced by the strategy that receives it.
    pub fn factor_wad(&self) -> Result<U256> {
        wad_from_decimal(self.min_received_factor)
    }
}
