pub mod address;
pub mod client_trait;
pub mod config;
pub mod rpc_utils;

pub use address::Address;
pub use client_trait::{LedgerReader, LedgerSubmitter};
pub use config::ClientConfig;
pub use rpc_utils::{HttpLedger, LendingErrorConverter};
