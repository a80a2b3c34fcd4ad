mod builder;
pub mod encoding;
mod group;
mod kind;
mod lending;
mod operation;
mod optin;
mod prepend;
mod staking;
#[cfg(test)]
mod tests;
mod vault;

pub use builder::{validate_layout, GroupBuilder};
pub use group::{wait_for_confirmation, SubmitOutcome, TransactionGroup, WaitOptions};
pub use kind::OperationKind;
pub use lending::{
    prepare_add_collateral, prepare_borrow, prepare_burn, prepare_claim_rewards, prepare_liquidate,
    prepare_mint, prepare_mint_to_collateral, prepare_remove_collateral,
    prepare_remove_collateral_underlying, prepare_repay_borrow, LendingContext, MarketRef,
};
pub use operation::{OnComplete, Operation, OperationBody, SuggestedParams};
pub use optin::{prepare_asset_opt_in, prepare_manager_opt_in, prepare_market_opt_in};
pub use prepend::{prefix_operations, random_note, PrefixContext, NOTE_NONCE_MAX};
pub use staking::{
    prepare_claim_staking_rewards, prepare_stake, prepare_staking_opt_in, prepare_unstake,
    staking_context,
};
pub use vault::{
    prepare_remove_algos_from_vault, prepare_send_governance, prepare_send_keyreg_offline,
    prepare_send_keyreg_online, prepare_supply_algos_to_vault, prepare_sync_vault, KeyregParams,
};
