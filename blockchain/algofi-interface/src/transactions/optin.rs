use crate::common::Address;
use crate::math::ProtocolParams;
use crate::transactions::group::TransactionGroup;
use crate::transactions::operation::{Operation, SuggestedParams};
use crate::transactions::prepend::random_note;
use common::LendingError;

/// Fund a fresh storage account, opt it into the markets and the manager, and
/// rekey it to the manager's application address
///
/// Both `sender` and `storage_account` must sign.
pub fn prepare_manager_opt_in(
    sender: Address,
    storage_account: Address,
    params: &SuggestedParams,
    protocol: &ProtocolParams,
    manager_app_id: u64,
    market_app_ids: &[u64],
) -> Result<TransactionGroup, LendingError> {
    let fee = protocol.baseline_fee;
    let mut operations = Vec::with_capacity(market_app_ids.len() + 3);

    operations.push(Operation::transfer(
        sender,
        params,
        fee,
        storage_account,
        protocol.manager_opt_in_min_balance,
        common::asset_utils::NATIVE_ASSET_ID,
    ));
    for market_app_id in market_app_ids {
        operations.push(Operation::app_opt_in(storage_account, params, fee, *market_app_id));
    }
    operations.push(Operation::app_opt_in(sender, params, fee, manager_app_id));
    operations.push(
        Operation::app_opt_in(storage_account, params, fee, manager_app_id)
            .with_rekey_to(Address::for_application(manager_app_id)),
    );

    TransactionGroup::with_max_size(operations, protocol.max_group_size)
}

/// Single market opt-in; the random note keeps repeated opt-ins distinct
pub fn prepare_market_opt_in(
    sender: Address,
    params: &SuggestedParams,
    protocol: &ProtocolParams,
    market_app_id: u64,
) -> Result<TransactionGroup, LendingError> {
    TransactionGroup::new(vec![Operation::app_opt_in(sender, params, protocol.baseline_fee, market_app_id)
        .with_note(random_note().to_vec())])
}

/// Zero-amount self transfer that enables holding `asset_id`
pub fn prepare_asset_opt_in(
    sender: Address,
    params: &SuggestedParams,
    protocol: &ProtocolParams,
    asset_id: u64,
) -> Result<TransactionGroup, LendingError> {
    TransactionGroup::new(vec![Operation::transfer(
        sender,
        params,
        protocol.baseline_fee,
        sender,
        0,
        asset_id,
    )])
}
