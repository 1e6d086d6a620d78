//! Batch authentication against the message relay.
//!
//! A report batch is genuine only if the remote manager sent a message
//! carrying its digest. The message is found by key and consumed, so the
//! same batch cannot be settled twice off one message.

use alloy_primitives::{Address, B256, U256};
use crosspool_codec::{inbound_message_key, report_digest};
use crosspool_custody::{Ledger, MessageRelay};
use crosspool_types::{CrosspoolError, ManagerConfig, ReportBatch, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Digest and relay key of a batch whose message has been consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedBatch {
    pub digest: B256,
    pub key: B256,
}

/// Derives inbound message keys for one (remote, local) manager pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageAuthenticator {
    remote_manager: U256,
    local_manager: Address,
    selector_code: u64,
}

impl MessageAuthenticator {
    #[must_use]
    pub fn new(remote_manager: U256, local_manager: Address, selector_code: u64) -> Self {
        Self {
            remote_manager,
            local_manager,
            selector_code,
        }
    }

    #[must_use]
    pub fn from_config(config: &ManagerConfig) -> Self {
        Self::new(
            config.remote_manager,
            config.address,
            config.report_selector_code,
        )
    }

    /// Relay key of the message that carries `digest`.
    #[must_use]
    pub fn message_key(&self, digest: B256) -> B256 {
        inbound_message_key(
            self.remote_manager,
            self.local_manager,
            self.selector_code,
            digest,
        )
    }

    /// Digest and key `batch` must be relayed under.
    #[must_use]
    pub fn expected(&self, batch: &ReportBatch) -> AuthenticatedBatch {
        let digest = report_digest(batch);
        AuthenticatedBatch {
            digest,
            key: self.message_key(digest),
        }
    }

    /// Whether a message for `batch` is waiting in the relay.
    #[must_use]
    pub fn is_pending(&self, relay: &dyn MessageRelay, ledger: &Ledger, batch: &ReportBatch) -> bool {
        let expected = self.expected(batch);
        !relay.pending_count(ledger, expected.key).is_zero()
    }

    /// Recompute the digest of `batch` and consume its message.
    ///
    /// # Errors
    /// [`CrosspoolError::UnauthenticatedBatch`] if no message is pending
    /// under the derived key. Nothing is consumed in that case.
    pub fn authenticate(
        &self,
        relay: &dyn MessageRelay,
        ledger: &mut Ledger,
        batch: &ReportBatch,
    ) -> Result<AuthenticatedBatch> {
        let expected = self.expected(batch);
        if relay.pending_count(ledger, expected.key).is_zero() {
            return Err(CrosspoolError::UnauthenticatedBatch {
                digest: expected.digest,
                key: expected.key,
            });
        }
        relay.consume(ledger, expected.key)?;
        debug!(
            epoch = %batch.epoch,
            digest = %expected.digest,
            key = %expected.key,
            "batch authenticated"
        );
        Ok(expected)
    }
}
