//! # crosspool-types
//!
//! Shared types, errors, and configuration for **Crosspool**, a settlement
//! orchestrator that reconciles a local custody ledger with a remote ledger
//! reporting aggregated deposit and withdraw activity.
//!
//! This crate is the leaf dependency of the workspace. It defines:
//!
//! - **Identifiers**: [`StrategyId`], [`ChannelId`], [`AssetId`], [`Epoch`], [`Amount`]
//! - **Report model**: [`ReportBatch`], [`TransferItem`], [`StrategyReportItem`], [`StrategyAction`], [`ReportFees`]
//! - **Registry model**: [`StrategyRecord`]
//! - **Events**: [`PoolingEvent`], [`ReportHandled`], [`ItemOutcome`], [`Acknowledgement`]
//! - **Authorization**: [`Role`], [`CallContext`]
//! - **Configuration**: [`ManagerConfig`], [`SlippageConfig`]
//! - **Errors**: [`CrosspoolError`] with `CP_ERR_` prefix codes
//! - **Fixed-point helpers**: [`amount`]
//! - **Constants**: system-wide limits and defaults
//!
//! Primitive 256-bit types come from `alloy-primitives` and are re-exported
//! so downstream crates agree on one version.

pub mod amount;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod record;
pub mod report;
pub mod role;

pub use alloy_primitives::{Address, B256, U256};

pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use record::*;
pub use report::*;
pub use role::*;

// Constants and fixed-point helpers are accessed via their modules
// (`crosspool_types::constants::WAD`, `crosspool_types::amount::mul_div`).
