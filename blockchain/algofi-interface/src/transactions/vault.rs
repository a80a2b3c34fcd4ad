use crate::common::Address;
use crate::state::keys::tags;
use crate::transactions::group::TransactionGroup;
use crate::transactions::kind::OperationKind;
use crate::transactions::lending::{mint_to_collateral_payload, LendingContext, MarketRef};
use common::asset_utils::NATIVE_ASSET_ID;
use common::LendingError;

/// Participation keys for bringing the vault online
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyregParams {
    pub vote_pk: Vec<u8>,
    pub selection_pk: Vec<u8>,
    pub state_proof_pk: Vec<u8>,
    pub vote_first: u64,
    pub vote_last: u64,
    pub vote_key_dilution: u64,
}

/// Deposit native currency into the governance vault as collateral
pub fn prepare_supply_algos_to_vault(
    ctx: &LendingContext<'_>,
    vault_market: &MarketRef,
    amount: u64,
) -> Result<TransactionGroup, LendingError> {
    if vault_market.underlying_asset_id != NATIVE_ASSET_ID {
        return Err(LendingError::InvalidGroup(format!(
            "vault market {} does not hold the native asset",
            vault_market.app_id
        )));
    }
    ctx.builder(OperationKind::SupplyAlgosToVault)
        .with_payload(mint_to_collateral_payload(ctx, vault_market, amount))
        .build()
}

/// Withdraw native currency from the vault; combines remove collateral and burn
pub fn prepare_remove_algos_from_vault(
    ctx: &LendingContext<'_>,
    vault_market: &MarketRef,
    amount: u64,
) -> Result<TransactionGroup, LendingError> {
    ctx.builder(OperationKind::RemoveAlgosFromVault)
        .with_payload(vec![
            ctx.manager_call(tags::REMOVE_COLLATERAL_UNDERLYING).with_int_arg(amount),
            ctx.market_call(vault_market, tags::REMOVE_COLLATERAL_UNDERLYING),
        ])
        .build()
}

/// Reconcile the vault market with the storage account's native balance
pub fn prepare_sync_vault(
    ctx: &LendingContext<'_>,
    vault_market: &MarketRef,
) -> Result<TransactionGroup, LendingError> {
    ctx.builder(OperationKind::SyncVault)
        .with_payload(vec![
            ctx.manager_call(tags::SYNC_VAULT).with_accounts(&[ctx.storage_account]),
            ctx.market_call(vault_market, tags::SYNC_VAULT),
        ])
        .build()
}

/// Have the vault send a zero payment carrying `note` to the governance address
pub fn prepare_send_governance(
    ctx: &LendingContext<'_>,
    governance_address: Address,
    note: &[u8],
) -> Result<TransactionGroup, LendingError> {
    ctx.builder(OperationKind::SendGovernanceTxn)
        .with_payload(vec![ctx
            .manager_call(tags::SEND_GOVERNANCE_TXN)
            .with_accounts(&[ctx.storage_account, governance_address])
            .with_note(note.to_vec())])
        .build()
}

/// Register the vault's storage account online for consensus
pub fn prepare_send_keyreg_online(
    ctx: &LendingContext<'_>,
    keys: &KeyregParams,
) -> Result<TransactionGroup, LendingError> {
    ctx.builder(OperationKind::SendKeyregOnlineTxn)
        .with_payload(vec![ctx
            .manager_call(tags::SEND_KEYREG_TXN)
            .with_arg(keys.vote_pk.clone())
            .with_arg(keys.selection_pk.clone())
            .with_arg(keys.state_proof_pk.clone())
            .with_int_arg(keys.vote_first)
            .with_int_arg(keys.vote_last)
            .with_int_arg(keys.vote_key_dilution)
            .with_accounts(&[ctx.storage_account])])
        .build()
}

pub fn prepare_send_keyreg_offline(ctx: &LendingContext<'_>) -> Result<TransactionGroup, LendingError> {
    ctx.builder(OperationKind::SendKeyregOfflineTxn)
        .with_payload(vec![ctx
            .manager_call(tags::SEND_KEYREG_OFFLINE_TXN)
            .with_accounts(&[ctx.storage_account])])
        .build()
}
