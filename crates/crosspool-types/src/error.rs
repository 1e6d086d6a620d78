//! Error types for Crosspool.
//!
//! All errors use the `CP_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Report / batch authentication errors
//! - 2xx: Strategy registry and strategy errors
//! - 3xx: Custody ledger and external collaborator errors
//! - 4xx: Access control errors
//! - 9xx: General / internal errors

use alloy_primitives::{Address, B256, U256};
use thiserror::Error;

use crate::{AssetId, ChannelId, Role, StrategyId};

/// Central error enum for all Crosspool operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CrosspoolError {
    // =================================================================
    // Report / Authentication Errors (1xx)
    // =================================================================
    /// No pending relayed message matches the recomputed batch digest.
    #[error("CP_ERR_100: Unauthenticated batch: digest {digest} (message key {key})")]
    UnauthenticatedBatch { digest: B256, key: B256 },

    /// The value attached to the call does not cover the declared fees.
    #[error("CP_ERR_101: Insufficient fee: need {required}, got {provided}")]
    InsufficientFee { required: U256, provided: U256 },

    /// The report batch is structurally unusable.
    #[error("CP_ERR_102: Invalid report: {reason}")]
    InvalidReport { reason: String },

    // =================================================================
    // Registry / Strategy Errors (2xx)
    // =================================================================
    /// The strategy reports a different pooling manager than this one.
    #[error("CP_ERR_200: Invalid pooling manager: strategy expects {actual}, manager is {expected}")]
    InvalidPoolingManager { expected: Address, actual: Address },

    /// The strategy does not answer the expected read interface.
    #[error("CP_ERR_201: Invalid strategy contract {strategy}: {reason}")]
    InvalidStrategyContract { strategy: StrategyId, reason: String },

    /// A strategy operation restricted to the manager was called by someone else.
    #[error("CP_ERR_202: Invalid caller: {caller}")]
    InvalidCaller { caller: Address },

    /// A slippage factor outside the allowed bounds.
    #[error("CP_ERR_203: Invalid slippage factor: {factor}")]
    InvalidSlippage { factor: U256 },

    /// The strategy is not registered.
    #[error("CP_ERR_204: Unknown strategy: {0}")]
    UnknownStrategy(StrategyId),

    /// The channel is not known to the manager.
    #[error("CP_ERR_205: Unknown channel: {0}")]
    UnknownChannel(ChannelId),

    // =================================================================
    // Custody / Collaborator Errors (3xx)
    // =================================================================
    /// Not enough balance to perform a transfer or burn.
    #[error("CP_ERR_300: Insufficient balance of {asset} for {holder}: need {needed}, have {available}")]
    InsufficientBalance {
        asset: AssetId,
        holder: Address,
        needed: U256,
        available: U256,
    },

    /// Not enough allowance for a delegated transfer.
    #[error("CP_ERR_301: Insufficient allowance of {asset} from {owner} to {spender}: need {needed}, have {available}")]
    InsufficientAllowance {
        asset: AssetId,
        owner: Address,
        spender: Address,
        needed: U256,
        available: U256,
    },

    /// Sum of balances no longer matches the recorded total supply.
    #[error("CP_ERR_302: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    /// A transfer channel rejected a pull, push, cancel or claim.
    #[error("CP_ERR_303: Channel {channel} failed: {reason}")]
    ChannelFailure { channel: ChannelId, reason: String },

    /// An external venue (vault, swap router) rejected a call.
    #[error("CP_ERR_304: Venue {venue} failed: {reason}")]
    VenueFailure { venue: Address, reason: String },

    /// The message relay rejected a consume or send.
    #[error("CP_ERR_305: Relay failure: {reason}")]
    RelayFailure { reason: String },

    /// An intermediate product or sum exceeded 256 bits.
    #[error("CP_ERR_306: Arithmetic overflow")]
    ArithmeticOverflow,

    /// A conversion divided by zero (empty oracle price, zero precision).
    #[error("CP_ERR_307: Division by zero")]
    DivisionByZero,

    /// The price feed returned an unusable answer.
    #[error("CP_ERR_308: Invalid price: {reason}")]
    InvalidPrice { reason: String },

    // =================================================================
    // Access Control Errors (4xx)
    // =================================================================
    /// The account lacks the role required by the operation.
    #[error("CP_ERR_400: Account {account} is missing role {role}")]
    AccessControlUnauthorizedAccount { account: Address, role: Role },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("CP_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("CP_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("CP_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, CrosspoolError>;

impl From<serde_json::Error> for CrosspoolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = CrosspoolError::UnauthenticatedBatch {
            digest: B256::ZERO,
            key: B256::repeat_byte(1),
        };
        let msg = format!("{err}");
        assert!(msg.starts_with("CP_ERR_100"), "Got: {msg}");
    }

    #[test]
    fn insufficient_fee_display() {
        let err = CrosspoolError::InsufficientFee {
            required: U256::from(100u64),
            provided: U256::from(50u64),
        };
        let msg = format!("{err}");
        assert!(msg.contains("CP_ERR_101"));
        assert!(msg.contains("100"));
        assert!(msg.contains("50"));
    }

    #[test]
    fn unauthorized_account_names_role() {
        let err = CrosspoolError::AccessControlUnauthorizedAccount {
            account: Address::with_last_byte(3),
            role: Role::Relayer,
        };
        let msg = format!("{err}");
        assert!(msg.contains("CP_ERR_400"));
        assert!(msg.contains("RELAYER"));
    }

    #[test]
    fn serde_error_converts() {
        let err: CrosspoolError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, CrosspoolError::Serialization(_)));
    }

    #[test]
    fn all_errors_have_cp_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(CrosspoolError::ArithmeticOverflow),
            Box::new(CrosspoolError::DivisionByZero),
            Box::new(CrosspoolError::InvalidCaller {
                caller: Address::ZERO,
            }),
            Box::new(CrosspoolError::InvalidSlippage { factor: U256::ZERO }),
            Box::new(CrosspoolError::Internal("test".into())),
            Box::new(CrosspoolError::VenueFailure {
                venue: Address::ZERO,
                reason: "down".into(),
            }),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("CP_ERR_"),
                "Error missing CP_ERR_ prefix: {msg}"
            );
        }
    }
}
