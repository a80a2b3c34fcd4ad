#[cfg(test)]
use crate::common::Address;
use crate::math::ProtocolParams;
use crate::signing::{Ed25519Signer, TransactionSigner};
use crate::state::keys::tags;
use crate::testing::{suggested_params, MemoryLedger};
use crate::transactions::*;
use common::asset_utils::NATIVE_ASSET_ID;
use common::LendingError;
use proptest::prelude::*;
use std::sync::atomic::Ordering;
use std::time::Duration;
use strum::IntoEnumIterator;

const MANAGER: u64 = 10;
const USDC: u64 = 31566704;

fn user() -> Ed25519Signer {
    Ed25519Signer::from_secret_bytes(&[1u8; 32])
}

fn storage() -> Address {
    Address::new([2u8; 32])
}

fn algo_market() -> MarketRef {
    MarketRef::new(20, NATIVE_ASSET_ID, 21)
}

fn usdc_market() -> MarketRef {
    MarketRef::new(22, USDC, 23)
}

fn context(params: &SuggestedParams, nonce: Option<u64>) -> LendingContext<'_> {
    LendingContext {
        sender: user().address(),
        params,
        protocol: ProtocolParams::ALGOFI,
        manager_app_id: MANAGER,
        market_app_ids: vec![20, 22],
        oracle_app_ids: vec![30, 32],
        storage_account: storage(),
        note_nonce: nonce,
    }
}

fn group_for(kind: OperationKind, ctx: &LendingContext<'_>) -> Result<TransactionGroup, LendingError> {
    let algo = algo_market();
    let usdc = usdc_market();
    match kind {
        OperationKind::Mint => prepare_mint(ctx, &usdc, 100),
        OperationKind::MintToCollateral => prepare_mint_to_collateral(ctx, &usdc, 100),
        OperationKind::AddCollateral => prepare_add_collateral(ctx, &usdc, 100),
        OperationKind::RemoveCollateral => prepare_remove_collateral(ctx, &usdc, 100),
        OperationKind::Burn => prepare_burn(ctx, &usdc, 100),
        OperationKind::RemoveCollateralUnderlying => {
            prepare_remove_collateral_underlying(ctx, &usdc, 100)
        }
        OperationKind::Borrow => prepare_borrow(ctx, &algo, 100),
        OperationKind::RepayBorrow => prepare_repay_borrow(ctx, &algo, 100),
        OperationKind::Liquidate => prepare_liquidate(ctx, Address::new([3u8; 32]), &algo, &usdc, 100),
        OperationKind::ClaimRewards => prepare_claim_rewards(ctx, &[USDC]),
        OperationKind::SupplyAlgosToVault => prepare_supply_algos_to_vault(ctx, &algo, 100),
        OperationKind::RemoveAlgosFromVault => prepare_remove_algos_from_vault(ctx, &algo, 100),
        OperationKind::SyncVault => prepare_sync_vault(ctx, &algo),
        OperationKind::SendGovernanceTxn => {
            prepare_send_governance(ctx, Address::new([4u8; 32]), b"af/gov1:j[5,\"a\",\"c\"]")
        }
        OperationKind::SendKeyregOnlineTxn => prepare_send_keyreg_online(
            ctx,
            &KeyregParams {
                vote_pk: vec![5u8; 32],
                selection_pk: vec![6u8; 32],
                state_proof_pk: vec![7u8; 64],
                vote_first: 1,
                vote_last: 3_000_000,
                vote_key_dilution: 1_733,
            },
        ),
        OperationKind::SendKeyregOfflineTxn => prepare_send_keyreg_offline(ctx),
    }
}

proptest! {
    #[test]
    fn prop_every_kind_is_prefixed_then_payload(
        kind in prop::sample::select(OperationKind::iter().collect::<Vec<_>>()),
        nonce in 0..=NOTE_NONCE_MAX,
    ) {
        let params = suggested_params();
        let ctx = context(&params, Some(nonce));
        let group = group_for(kind, &ctx).unwrap();
        let ops = group.operations();

        prop_assert_eq!(ops.len(), 12 + kind.payload_len());
        prop_assert!(ops.len() <= ProtocolParams::MAX_GROUP_SIZE);
        prop_assert!(ops[0].has_tag(tags::FETCH_MARKET_VARIABLES));
        prop_assert_eq!(&ops[0].note, &nonce.to_be_bytes().to_vec());
        prop_assert!(ops[1].has_tag(tags::UPDATE_PRICES));
        prop_assert_eq!(ops[1].fee, 1_000 * kind.fee_multiplier());
        prop_assert!(ops[2].has_tag(tags::UPDATE_PROTOCOL_DATA));
        for (filler, op) in tags::FILLERS.iter().zip(&ops[3..12]) {
            prop_assert!(op.has_tag(filler));
        }
        prop_assert!(ops.iter().all(|op| op.group == Some(group.group_id())));
        prop_assert!(validate_layout(kind, ops, &ProtocolParams::ALGOFI, MANAGER).is_ok());
    }
}

#[test]
fn test_note_nonce_distinguishes_identical_groups() {
    let params = suggested_params();
    let a = prepare_borrow(&context(&params, Some(1)), &algo_market(), 5).unwrap();
    let b = prepare_borrow(&context(&params, Some(2)), &algo_market(), 5).unwrap();
    let c = prepare_borrow(&context(&params, Some(1)), &algo_market(), 5).unwrap();
    assert_ne!(a.group_id(), b.group_id());
    assert_eq!(a.group_id(), c.group_id());
}

#[test]
fn test_repay_native_borrow_references_no_asset() {
    let params = suggested_params();
    let group = prepare_repay_borrow(&context(&params, None), &algo_market(), 5).unwrap();
    match &group.operations()[13].body {
        OperationBody::AppCall { foreign_assets, .. } => assert!(foreign_assets.is_empty()),
        other => panic!("unexpected body {other:?}"),
    }
    assert!(matches!(group.operations()[14].body, OperationBody::Payment { amount: 5, .. }));
}

#[test]
fn test_liquidate_settles_target_storage() {
    let params = suggested_params();
    let liquidator_storage = Address::new([3u8; 32]);
    let group =
        prepare_liquidate(&context(&params, None), liquidator_storage, &algo_market(), &usdc_market(), 9)
            .unwrap();
    let ops = group.operations();
    assert_eq!(ops[2].accounts(), &[storage()]);
    assert_eq!(ops[12].foreign_apps(), &[20, 22]);
    assert_eq!(ops[13].foreign_apps(), &[MANAGER, 22]);
    assert_eq!(ops[15].accounts(), &[storage(), liquidator_storage]);
}

#[test]
fn test_vault_supply_requires_native_market() {
    let params = suggested_params();
    let result = prepare_supply_algos_to_vault(&context(&params, None), &usdc_market(), 5);
    assert!(matches!(result, Err(LendingError::InvalidGroup(_))));
}

#[test]
fn test_manager_opt_in_rekeys_storage() {
    let params = suggested_params();
    let group = prepare_manager_opt_in(
        user().address(),
        storage(),
        &params,
        &ProtocolParams::ALGOFI,
        MANAGER,
        &[20, 22, 24],
    )
    .unwrap();
    let ops = group.operations();

    assert_eq!(ops.len(), 6);
    assert!(matches!(ops[0].body, OperationBody::Payment { amount: 3_569_500, .. }));
    assert!(ops[1..4].iter().all(|op| op.sender == storage()));
    assert_eq!(ops[4].sender, user().address());
    assert_eq!(ops[5].sender, storage());
    assert_eq!(ops[5].rekey_to, Some(Address::for_application(MANAGER)));
    assert!(ops[..5].iter().all(|op| op.rekey_to.is_none()));
}

#[test]
fn test_asset_opt_in_is_zero_self_transfer() {
    let params = suggested_params();
    let sender = user().address();
    let group = prepare_asset_opt_in(sender, &params, &ProtocolParams::ALGOFI, USDC).unwrap();
    assert_eq!(
        group.operations()[0].body,
        OperationBody::AssetTransfer { receiver: sender, amount: 0, asset_id: USDC }
    );
}

#[test]
fn test_staking_groups_target_one_market() {
    let params = suggested_params();
    let market = MarketRef::new(401, USDC, 402);
    let ctx = staking_context(
        user().address(),
        &params,
        ProtocolParams::ALGOFI,
        400,
        &market,
        500,
        storage(),
    );

    let stake = prepare_stake(&ctx, &market, 1_000).unwrap();
    assert_eq!(stake.operations()[0].foreign_apps(), &[401]);
    assert_eq!(stake.operations()[1].foreign_apps(), &[500]);
    assert_eq!(stake.operations()[1].fee, 1_000);
    assert!(stake.operations()[12].accounts().is_empty());

    let claim = prepare_claim_staking_rewards(&ctx, &[USDC]).unwrap();
    assert_eq!(claim.len(), 13);
    assert_eq!(claim.operations()[12].fee, 3_000);

    let native = MarketRef::new(401, NATIVE_ASSET_ID, 402);
    let unstake = prepare_unstake(&ctx, &native, 10).unwrap();
    match &unstake.operations()[13].body {
        OperationBody::AppCall { foreign_assets, .. } => assert!(foreign_assets.is_empty()),
        other => panic!("unexpected body {other:?}"),
    }

    let opt_in =
        prepare_staking_opt_in(user().address(), storage(), &params, &ProtocolParams::ALGOFI, 400, 401)
            .unwrap();
    assert!(matches!(opt_in.operations()[0].body, OperationBody::Payment { amount: 650_000, .. }));
    assert_eq!(opt_in.operations()[3].rekey_to, Some(Address::for_application(400)));
}

#[test]
fn test_positional_count_mismatch_touches_nothing() {
    let params = suggested_params();
    let mut group = prepare_claim_rewards(&context(&params, None), &[]).unwrap();
    let signer = user();
    let signers: Vec<&dyn TransactionSigner> = vec![&signer as &dyn TransactionSigner; group.len() - 1];

    let result = group.sign_with_signers(&signers);
    assert!(matches!(
        result,
        Err(LendingError::SignatureCountMismatch { expected: 13, actual: 12 })
    ));
    assert_eq!(group.unsigned_positions().len(), 13);
}

#[test]
fn test_mismatched_positional_signer_leaves_slot_unsigned() {
    let params = suggested_params();
    let mut group = prepare_claim_rewards(&context(&params, None), &[]).unwrap();
    let signer = user();
    let stranger = Ed25519Signer::from_secret_bytes(&[9u8; 32]);
    let mut signers: Vec<&dyn TransactionSigner> = vec![&signer as &dyn TransactionSigner; group.len()];
    signers[4] = &stranger;

    assert_eq!(group.sign_with_signers(&signers).unwrap(), 12);
    assert!(!group.is_signed(4));
    assert_eq!(group.unsigned_positions(), vec![4]);

    let ledger = MemoryLedger::new();
    assert!(matches!(group.submit(&ledger, None), Err(LendingError::UnsignedOperation(4))));
    assert!(ledger.submitted().is_empty());
}

#[test]
fn test_single_signer_signs_matching_senders() {
    let params = suggested_params();
    let mut group = prepare_manager_opt_in(
        user().address(),
        storage(),
        &params,
        &ProtocolParams::ALGOFI,
        MANAGER,
        &[20],
    )
    .unwrap();

    assert_eq!(group.sign_with_signer(&user()).unwrap(), 2);
    assert_eq!(group.unsigned_positions(), vec![1, 3]);
}

fn signed_group(params: &SuggestedParams) -> TransactionGroup {
    let mut group = prepare_borrow(&context(params, None), &usdc_market(), 50).unwrap();
    group.sign_with_signer(&user()).unwrap();
    assert!(group.is_fully_signed());
    group
}

fn quick_wait() -> WaitOptions {
    WaitOptions {
        max_rounds: 3,
        timeout: Duration::from_secs(5),
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(4),
        ..Default::default()
    }
}

#[test]
fn test_fire_and_forget_submission() {
    let params = suggested_params();
    let ledger = MemoryLedger::new();
    let outcome = signed_group(&params).submit(&ledger, None).unwrap();
    assert_eq!(outcome, SubmitOutcome { tx_id: "TX1".to_string(), confirmed_round: None });
    assert_eq!(ledger.submitted().len(), 1);
}

#[test]
fn test_submission_waits_for_confirmation() {
    let params = suggested_params();
    let ledger = MemoryLedger::new().with_confirmation_delay(Some(2));
    let outcome = signed_group(&params).submit(&ledger, Some(&quick_wait())).unwrap();
    assert_eq!(outcome.confirmed_round, Some(1_002));
}

#[test]
fn test_confirmation_wait_is_bounded() {
    let params = suggested_params();
    let ledger = MemoryLedger::new().with_confirmation_delay(None);
    let result = signed_group(&params).submit(&ledger, Some(&quick_wait()));
    assert!(matches!(result, Err(LendingError::ConfirmationTimeout { rounds: 3, .. })));

    let stalled = MemoryLedger::new().with_confirmation_delay(None).with_stalled_rounds();
    let options = WaitOptions { timeout: Duration::from_millis(20), ..quick_wait() };
    let result = signed_group(&params).submit(&stalled, Some(&options));
    assert!(matches!(result, Err(LendingError::ConfirmationTimeout { rounds: 0, .. })));
}

#[test]
fn test_confirmation_wait_can_be_cancelled() {
    let params = suggested_params();
    let ledger = MemoryLedger::new().with_confirmation_delay(None);
    let options = quick_wait();
    options.cancel.store(true, Ordering::SeqCst);
    let result = signed_group(&params).submit(&ledger, Some(&options));
    assert!(matches!(result, Err(LendingError::ConfirmationCancelled(tx)) if tx == "TX1"));
}

#[test]
fn test_rejection_carries_node_message() {
    let params = suggested_params();
    let ledger = MemoryLedger::new().with_rejection("overspend");
    let result = signed_group(&params).submit(&ledger, None);
    assert!(matches!(result, Err(LendingError::Submission(m)) if m == "overspend"));
}
