//! Roles and the per-call authorization context.

use std::fmt;

use alloy_primitives::{keccak256, Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::constants;

/// Access-control roles recognised by the pooling manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Registers strategies and channels, tunes slippage, manages roles.
    Admin,
    /// Submits report batches.
    Relayer,
}

impl Role {
    /// 32-byte role identifier. The admin role is the zero word; every
    /// other role is the keccak hash of its name.
    #[must_use]
    pub fn id(&self) -> B256 {
        match self {
            Self::Admin => B256::ZERO,
            Self::Relayer => keccak256(constants::RELAYER_ROLE_NAME.as_bytes()),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "ADMIN"),
            Self::Relayer => write!(f, "RELAYER"),
        }
    }
}

/// Who is calling and how much native value they attached.
///
/// Passed explicitly into every state-changing operation; there is no
/// ambient "current sender".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Address,
    pub value: U256,
}

impl CallContext {
    #[must_use]
    pub fn new(caller: Address) -> Self {
        Self {
            caller,
            value: U256::ZERO,
        }
    }

    #[must_use]
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_role_is_zero_word() {
        assert_eq!(Role::Admin.id(), B256::ZERO);
    }

    #[test]
    fn relayer_role_is_hashed_name() {
        assert_eq!(Role::Relayer.id(), keccak256(b"RELAYER_ROLE"));
        assert_ne!(Role::Relayer.id(), Role::Admin.id());
    }

    #[test]
    fn context_defaults_to_zero_value() {
        let ctx = CallContext::new(Address::with_last_byte(1));
        assert_eq!(ctx.value, U256::ZERO);
        let ctx = ctx.with_value(U256::from(7u64));
        assert_eq!(ctx.value, U256::from(7u64));
    }

    #[test]
    fn role_serde_uses_screaming_case() {
        let json = serde_json::to_string(&Role::Relayer).unwrap();
        assert_eq!(json, "\"RELAYER\"");
    }
}
