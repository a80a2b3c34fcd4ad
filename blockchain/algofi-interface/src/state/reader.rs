use super::decode::LedgerState;
use common::asset_utils::NATIVE_ASSET_ID;
use common::{AccountBalances, LendingError};
use common_rpc::{AccountResponse, ApplicationResponse};

/// Global state of an application response
pub fn global_state(app: &ApplicationResponse) -> Result<LedgerState, LendingError> {
    LedgerState::decode(&app.params.global_state)
}

/// Local state of `app_id` inside an account response; empty when the account is not opted in
pub fn local_state(account: &AccountResponse, app_id: u64) -> Result<LedgerState, LendingError> {
    match account.local_state(app_id) {
        Some(entries) => LedgerState::decode(entries),
        None => Ok(LedgerState::new()),
    }
}

/// Balances keyed by asset id, the native balance under id 1
pub fn account_balances(account: &AccountResponse) -> AccountBalances {
    let mut balances = AccountBalances { address: account.address.clone(), ..Default::default() };
    balances.balances.insert(NATIVE_ASSET_ID, account.amount);
    for holding in &account.assets {
        balances.balances.insert(holding.asset_id, holding.amount);
    }
    balances.app_ids = account.apps_local_state.iter().map(|s| s.id).collect();
    balances
}
