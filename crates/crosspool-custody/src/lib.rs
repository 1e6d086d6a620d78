//! # crosspool-custody
//!
//! **World state and external collaborators for Crosspool.**
//!
//! - [`Ledger`]: balances, allowances and storage with nested atomic
//!   transactions
//! - Collaborator contracts: [`Channel`], [`MessageRelay`] (with the
//!   storage-backed [`LedgerRelay`]), [`Venue`], [`YieldVault`],
//!   [`SwapRouter`], [`PriceFeed`]
//! - [`Strategy`] and its two variants: the ratio-based [`VaultStrategy`]
//!   and the oracle-based [`SwapStrategy`]
//! - [`WrappedNative`]: wrapping of the native asset for native channels
//!
//! Test doubles live in [`testing`] behind the `test-helpers` feature.

pub mod channel;
pub mod ledger;
pub mod relay;
pub mod strategy;
pub mod venue;
pub mod wrapper;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use channel::Channel;
pub use ledger::Ledger;
pub use relay::{LedgerRelay, MessageRelay, OutboundMessage};
pub use strategy::{Strategy, SwapStrategy, VaultStrategy};
pub use venue::{
    ExactInputParams, ExactOutputParams, PreparedCall, PriceFeed, SwapRouter, Venue, VenueCall,
    YieldVault,
};
pub use wrapper::WrappedNative;
