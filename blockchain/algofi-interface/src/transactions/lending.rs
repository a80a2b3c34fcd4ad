use crate::common::Address;
use crate::math::ProtocolParams;
use crate::state::keys::tags;
use crate::transactions::builder::GroupBuilder;
use crate::transactions::group::TransactionGroup;
use crate::transactions::kind::OperationKind;
use crate::transactions::operation::{Operation, SuggestedParams};
use common::LendingError;

/// Identifiers of the market a payload targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketRef {
    pub app_id: u64,
    pub address: Address,
    pub underlying_asset_id: u64,
    pub bank_asset_id: u64,
}

impl MarketRef {
    pub fn new(app_id: u64, underlying_asset_id: u64, bank_asset_id: u64) -> Self {
        Self { app_id, address: Address::for_application(app_id), underlying_asset_id, bank_asset_id }
    }
}

/// Everything a prefixed group needs besides its payload
#[derive(Debug, Clone)]
pub struct LendingContext<'a> {
    pub sender: Address,
    pub params: &'a SuggestedParams,
    pub protocol: ProtocolParams,
    pub manager_app_id: u64,
    pub market_app_ids: Vec<u64>,
    pub oracle_app_ids: Vec<u64>,
    pub storage_account: Address,
    pub note_nonce: Option<u64>,
}

impl<'a> LendingContext<'a> {
    pub fn builder(&self, kind: OperationKind) -> GroupBuilder<'a> {
        let builder = GroupBuilder::new(kind, self.sender, self.params)
            .with_protocol_params(self.protocol)
            .with_manager(self.manager_app_id)
            .with_markets(&self.market_app_ids)
            .with_oracles(&self.oracle_app_ids)
            .with_storage_account(self.storage_account);
        match self.note_nonce {
            Some(nonce) => builder.with_note_nonce(nonce),
            None => builder,
        }
    }

    pub fn fee(&self) -> u64 {
        self.protocol.baseline_fee
    }

    pub fn manager_call(&self, tag: &str) -> Operation {
        Operation::app_call(self.sender, self.params, self.fee(), self.manager_app_id, tag)
    }

    /// Market call referencing the manager and the storage account
    pub fn market_call(&self, market: &MarketRef, tag: &str) -> Operation {
        Operation::app_call(self.sender, self.params, self.fee(), market.app_id, tag)
            .with_foreign_apps(&[self.manager_app_id])
            .with_accounts(&[self.storage_account])
    }

    pub fn transfer_to(&self, market: &MarketRef, amount: u64, asset_id: u64) -> Operation {
        Operation::transfer(self.sender, self.params, self.fee(), market.address, amount, asset_id)
    }

    fn build(&self, kind: OperationKind, payload: Vec<Operation>) -> Result<TransactionGroup, LendingError> {
        self.builder(kind).with_payload(payload).build()
    }
}

/// Supply underlying and receive bank tokens
pub fn prepare_mint(
    ctx: &LendingContext<'_>,
    market: &MarketRef,
    amount: u64,
) -> Result<TransactionGroup, LendingError> {
    ctx.build(
        OperationKind::Mint,
        vec![
            ctx.manager_call(tags::MINT),
            ctx.market_call(market, tags::MINT).with_foreign_assets(&[market.bank_asset_id]),
            ctx.transfer_to(market, amount, market.underlying_asset_id),
        ],
    )
}

/// Supply underlying straight into active collateral
pub fn prepare_mint_to_collateral(
    ctx: &LendingContext<'_>,
    market: &MarketRef,
    amount: u64,
) -> Result<TransactionGroup, LendingError> {
    ctx.build(OperationKind::MintToCollateral, mint_to_collateral_payload(ctx, market, amount))
}

pub(crate) fn mint_to_collateral_payload(
    ctx: &LendingContext<'_>,
    market: &MarketRef,
    amount: u64,
) -> Vec<Operation> {
    vec![
        ctx.manager_call(tags::MINT_TO_COLLATERAL),
        ctx.market_call(market, tags::MINT_TO_COLLATERAL),
        ctx.transfer_to(market, amount, market.underlying_asset_id),
    ]
}

/// Post bank tokens as collateral
pub fn prepare_add_collateral(
    ctx: &LendingContext<'_>,
    market: &MarketRef,
    amount: u64,
) -> Result<TransactionGroup, LendingError> {
    ctx.build(
        OperationKind::AddCollateral,
        vec![
            ctx.manager_call(tags::ADD_COLLATERAL),
            ctx.market_call(market, tags::ADD_COLLATERAL),
            ctx.transfer_to(market, amount, market.bank_asset_id),
        ],
    )
}

/// Withdraw collateral as bank tokens
pub fn prepare_remove_collateral(
    ctx: &LendingContext<'_>,
    market: &MarketRef,
    amount: u64,
) -> Result<TransactionGroup, LendingError> {
    ctx.build(
        OperationKind::RemoveCollateral,
        vec![
            ctx.manager_call(tags::REMOVE_COLLATERAL).with_int_arg(amount),
            ctx.market_call(market, tags::REMOVE_COLLATERAL)
                .with_foreign_assets(&[market.bank_asset_id]),
        ],
    )
}

/// Return bank tokens for underlying
pub fn prepare_burn(
    ctx: &LendingContext<'_>,
    market: &MarketRef,
    amount: u64,
) -> Result<TransactionGroup, LendingError> {
    ctx.build(
        OperationKind::Burn,
        vec![
            ctx.manager_call(tags::BURN),
            ctx.market_call(market, tags::BURN).with_foreign_assets(&[market.underlying_asset_id]),
            ctx.transfer_to(market, amount, market.bank_asset_id),
        ],
    )
}

/// Withdraw collateral converted to underlying
pub fn prepare_remove_collateral_underlying(
    ctx: &LendingContext<'_>,
    market: &MarketRef,
    amount: u64,
) -> Result<TransactionGroup, LendingError> {
    ctx.build(
        OperationKind::RemoveCollateralUnderlying,
        vec![
            ctx.manager_call(tags::REMOVE_COLLATERAL_UNDERLYING).with_int_arg(amount),
            ctx.market_call(market, tags::REMOVE_COLLATERAL_UNDERLYING)
                .with_foreign_assets(&[market.underlying_asset_id]),
        ],
    )
}

pub fn prepare_borrow(
    ctx: &LendingContext<'_>,
    market: &MarketRef,
    amount: u64,
) -> Result<TransactionGroup, LendingError> {
    ctx.build(
        OperationKind::Borrow,
        vec![
            ctx.manager_call(tags::BORROW).with_int_arg(amount),
            ctx.market_call(market, tags::BORROW).with_foreign_assets(&[market.underlying_asset_id]),
        ],
    )
}

pub fn prepare_repay_borrow(
    ctx: &LendingContext<'_>,
    market: &MarketRef,
    amount: u64,
) -> Result<TransactionGroup, LendingError> {
    let assets: Vec<u64> =
        common::asset_utils::transfer_asset_id(market.underlying_asset_id).into_iter().collect();
    ctx.build(
        OperationKind::RepayBorrow,
        vec![
            ctx.manager_call(tags::REPAY_BORROW),
            ctx.market_call(market, tags::REPAY_BORROW).with_foreign_assets(&assets),
            ctx.transfer_to(market, amount, market.underlying_asset_id),
        ],
    )
}

/// Repay part of `target_storage`'s borrow and seize its collateral
///
/// The refresh prefix settles the liquidated storage account, so `ctx.storage_account`
/// must be the target; `liquidator_storage` receives the seized collateral.
pub fn prepare_liquidate(
    ctx: &LendingContext<'_>,
    liquidator_storage: Address,
    borrow_market: &MarketRef,
    collateral_market: &MarketRef,
    amount: u64,
) -> Result<TransactionGroup, LendingError> {
    let target_storage = ctx.storage_account;
    ctx.build(
        OperationKind::Liquidate,
        vec![
            ctx.manager_call(tags::LIQUIDATE).with_foreign_apps(&ctx.market_app_ids),
            Operation::app_call(ctx.sender, ctx.params, ctx.fee(), borrow_market.app_id, tags::LIQUIDATE)
                .with_foreign_apps(&[ctx.manager_app_id, collateral_market.app_id])
                .with_accounts(&[target_storage]),
            ctx.transfer_to(borrow_market, amount, borrow_market.underlying_asset_id),
            Operation::app_call(
                ctx.sender,
                ctx.params,
                ctx.protocol.liquidate_update_fee,
                collateral_market.app_id,
                tags::LIQUIDATE,
            )
            .with_foreign_apps(&[ctx.manager_app_id, borrow_market.app_id])
            .with_foreign_assets(&[collateral_market.bank_asset_id])
            .with_accounts(&[target_storage, liquidator_storage]),
        ],
    )
}

/// Claim accrued rewards into the user's account
pub fn prepare_claim_rewards(
    ctx: &LendingContext<'_>,
    rewards_asset_ids: &[u64],
) -> Result<TransactionGroup, LendingError> {
    ctx.build(OperationKind::ClaimRewards, vec![claim_rewards_call(ctx, rewards_asset_ids, ctx.fee())])
}

pub(crate) fn claim_rewards_call(ctx: &LendingContext<'_>, rewards_asset_ids: &[u64], fee: u64) -> Operation {
    let mut op = ctx
        .manager_call(tags::CLAIM_REWARDS)
        .with_accounts(&[ctx.storage_account])
        .with_foreign_assets(rewards_asset_ids);
    op.fee = fee;
    op
}
