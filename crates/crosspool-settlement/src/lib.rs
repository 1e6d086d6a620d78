//! # crosspool-settlement
//!
//! **The pooling manager**: the account that custodies pooled underlying on
//! this side, fans it out to yield strategies and settles report batches
//! relayed from the remote ledger.
//!
//! ## Settlement
//!
//! [`PoolingManager::handle_report`] runs one batch as a single atomic unit:
//! 1. Authenticate the batch digest against the relay and consume the
//!    message before any outside call
//! 2. Pull funding from channels (fatal on failure)
//! 3. Dispatch every strategy report, each in its own nested transaction;
//!    failures are recorded as `processed = false`, never propagated
//! 4. Push realized withdrawals back through channels (fatal on failure)
//! 5. Acknowledge the finalized reports through the relay
//!
//! Anything fatal rolls the whole batch back, message consumption included.

pub mod access;
pub mod authenticator;
pub mod orchestrator;
pub mod registry;

pub use access::AccessControl;
pub use authenticator::{AuthenticatedBatch, MessageAuthenticator};
pub use orchestrator::PoolingManager;
pub use registry::{RegisteredStrategy, StrategyRegistry};
