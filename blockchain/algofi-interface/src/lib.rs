//! Client for the Algofi lending protocol: ledger snapshots of the manager,
//! markets and staking contracts, rewards projection, and assembly of the
//! prefixed transaction groups every protocol operation requires.

pub mod client;
pub mod common;
pub mod math;
pub mod models;
pub mod rewards;
pub mod signing;
pub mod state;
pub mod testing;
pub mod transactions;

pub use client::{AlgofiClient, AlgofiMarketData, StorageSnapshot};
