use crate::state::LedgerState;
use crate::transactions::SuggestedParams;
use common::{AccountBalances, LendingError};

/// Read side of the ledger: application state, balances and chain parameters
pub trait LedgerReader {
    /// Global key/value state of an application at head
    fn global_state(&self, app_id: u64) -> Result<LedgerState, LendingError>;

    /// Local state of `address` in `app_id` at head; empty when not opted in
    fn local_state(&self, address: &str, app_id: u64) -> Result<LedgerState, LendingError>;

    /// Local state as of a past round, served by the historical indexer
    fn local_state_at(
        &self,
        address: &str,
        app_id: u64,
        round: u64,
    ) -> Result<LedgerState, LendingError>;

    fn asset_decimals(&self, asset_id: u64) -> Result<u32, LendingError>;

    fn account_balances(&self, address: &str) -> Result<AccountBalances, LendingError>;

    fn suggested_params(&self) -> Result<SuggestedParams, LendingError>;

    /// Every account opted into `app_id`, across all indexer pages
    fn accounts_opted_into_app(&self, app_id: u64) -> Result<Vec<String>, LendingError>;
}

/// Write side of the ledger
pub trait LedgerSubmitter {
    /// Hand an encoded signed group to the node; returns the first operation's id
    fn send_group(&self, signed_group: Vec<u8>) -> Result<String, LendingError>;

    /// Round the operation was committed in, `None` while still pending
    fn confirmed_round(&self, tx_id: &str) -> Result<Option<u64>, LendingError>;

    fn last_round(&self) -> Result<u64, LendingError>;

    /// Block until a round after `round` exists; returns the new last round
    fn wait_for_round_after(&self, round: u64) -> Result<u64, LendingError>;
}
