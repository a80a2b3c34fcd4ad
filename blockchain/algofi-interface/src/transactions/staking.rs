use crate::common::Address;
use crate::math::ProtocolParams;
use crate::state::keys::tags;
use crate::transactions::group::TransactionGroup;
use crate::transactions::kind::OperationKind;
use crate::transactions::lending::{claim_rewards_call, mint_to_collateral_payload, LendingContext, MarketRef};
use crate::transactions::operation::{Operation, SuggestedParams};
use common::asset_utils::transfer_asset_id;
use common::LendingError;

/// Context of a staking contract: its manager, its single market and that market's oracle
pub fn staking_context<'a>(
    sender: Address,
    params: &'a SuggestedParams,
    protocol: ProtocolParams,
    manager_app_id: u64,
    market: &MarketRef,
    oracle_app_id: u64,
    storage_account: Address,
) -> LendingContext<'a> {
    LendingContext {
        sender,
        params,
        protocol,
        manager_app_id,
        market_app_ids: vec![market.app_id],
        oracle_app_ids: vec![oracle_app_id],
        storage_account,
        note_nonce: None,
    }
}

/// Fund the staking storage account, opt it in and rekey it to the staking manager
pub fn prepare_staking_opt_in(
    sender: Address,
    storage_account: Address,
    params: &SuggestedParams,
    protocol: &ProtocolParams,
    manager_app_id: u64,
    market_app_id: u64,
) -> Result<TransactionGroup, LendingError> {
    let fee = protocol.baseline_fee;
    TransactionGroup::with_max_size(
        vec![
            Operation::transfer(
                sender,
                params,
                fee,
                storage_account,
                protocol.staking_opt_in_min_balance,
                common::asset_utils::NATIVE_ASSET_ID,
            ),
            Operation::app_opt_in(storage_account, params, fee, market_app_id),
            Operation::app_opt_in(sender, params, fee, manager_app_id),
            Operation::app_opt_in(storage_account, params, fee, manager_app_id)
                .with_rekey_to(Address::for_application(manager_app_id)),
        ],
        protocol.max_group_size,
    )
}

/// Stake underlying; same shape as mint to collateral against the staking market
pub fn prepare_stake(
    ctx: &LendingContext<'_>,
    market: &MarketRef,
    amount: u64,
) -> Result<TransactionGroup, LendingError> {
    ctx.builder(OperationKind::MintToCollateral)
        .with_payload(mint_to_collateral_payload(ctx, market, amount))
        .build()
}

/// Withdraw staked underlying
pub fn prepare_unstake(
    ctx: &LendingContext<'_>,
    market: &MarketRef,
    amount: u64,
) -> Result<TransactionGroup, LendingError> {
    let assets: Vec<u64> = transfer_asset_id(market.underlying_asset_id).into_iter().collect();
    ctx.builder(OperationKind::RemoveCollateralUnderlying)
        .with_payload(vec![
            ctx.manager_call(tags::REMOVE_COLLATERAL_UNDERLYING).with_int_arg(amount),
            ctx.market_call(market, tags::REMOVE_COLLATERAL_UNDERLYING).with_foreign_assets(&assets),
        ])
        .build()
}

/// Claim staking rewards; the claim pays for the reward transfers it triggers
pub fn prepare_claim_staking_rewards(
    ctx: &LendingContext<'_>,
    rewards_asset_ids: &[u64],
) -> Result<TransactionGroup, LendingError> {
    ctx.builder(OperationKind::ClaimRewards)
        .with_payload(vec![claim_rewards_call(ctx, rewards_asset_ids, 3 * ctx.fee())])
        .build()
}
