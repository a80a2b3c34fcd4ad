use crate::common::Address;
use crate::math::ProtocolParams;
use crate::state::keys::tags;
use crate::transactions::kind::OperationKind;
use crate::transactions::operation::{Operation, SuggestedParams};
use rand::Rng;

/// Upper bound of the random nonce carried by `fetch_market_variables`
pub const NOTE_NONCE_MAX: u64 = 1_000_000;

/// Applications and accounts every refresh prefix references
#[derive(Debug, Clone, Copy)]
pub struct PrefixContext<'a> {
    pub sender: Address,
    pub params: &'a SuggestedParams,
    pub manager_app_id: u64,
    pub market_app_ids: &'a [u64],
    pub oracle_app_ids: &'a [u64],
    pub storage_account: Address,
}

/// Fresh 8-byte big-endian nonce so identical groups get distinct ids
pub fn random_note() -> [u8; 8] {
    rand::thread_rng().gen_range(0..=NOTE_NONCE_MAX).to_be_bytes()
}

/// The refresh triple followed by the filler block
pub fn prefix_operations(
    kind: OperationKind,
    ctx: &PrefixContext<'_>,
    protocol: &ProtocolParams,
    note: [u8; 8],
) -> Vec<Operation> {
    let fee = protocol.baseline_fee;
    let mut operations = Vec::with_capacity(3 + protocol.filler_count);

    operations.push(
        Operation::app_call(ctx.sender, ctx.params, fee, ctx.manager_app_id, tags::FETCH_MARKET_VARIABLES)
            .with_foreign_apps(ctx.market_app_ids)
            .with_note(note.to_vec()),
    );
    // The price refresh pays for the kind's inner operations
    operations.push(
        Operation::app_call(
            ctx.sender,
            ctx.params,
            fee * kind.fee_multiplier(),
            ctx.manager_app_id,
            tags::UPDATE_PRICES,
        )
        .with_foreign_apps(ctx.oracle_app_ids),
    );
    operations.push(
        Operation::app_call(ctx.sender, ctx.params, fee, ctx.manager_app_id, tags::UPDATE_PROTOCOL_DATA)
            .with_foreign_apps(ctx.market_app_ids)
            .with_accounts(&[ctx.storage_account]),
    );

    for tag in tags::FILLERS.iter().take(protocol.filler_count) {
        operations.push(
            Operation::app_call(ctx.sender, ctx.params, fee, ctx.manager_app_id, tag)
                .with_foreign_apps(ctx.market_app_ids),
        );
    }

    operations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::suggested_params;

    #[test]
    fn test_prefix_shape() {
        let params = suggested_params();
        let ctx = PrefixContext {
            sender: Address::new([1u8; 32]),
            params: &params,
            manager_app_id: 10,
            market_app_ids: &[20, 21],
            oracle_app_ids: &[30, 31],
            storage_account: Address::new([2u8; 32]),
        };
        let ops = prefix_operations(OperationKind::RemoveAlgosFromVault, &ctx, &ProtocolParams::ALGOFI, [0, 0, 0, 0, 0, 0, 0, 7]);

        assert_eq!(ops.len(), 12);
        assert!(ops[0].has_tag(tags::FETCH_MARKET_VARIABLES));
        assert_eq!(ops[0].note, vec![0, 0, 0, 0, 0, 0, 0, 7]);
        assert_eq!(ops[1].fee, 4_000);
        assert_eq!(ops[1].foreign_apps(), &[30, 31]);
        assert_eq!(ops[2].accounts(), &[Address::new([2u8; 32])]);
        assert!(ops[11].has_tag("dummy_nine"));
        assert!(ops.iter().all(|op| op.app_id() == Some(10)));
    }

    #[test]
    fn test_random_note_range() {
        for _ in 0..32 {
            assert!(u64::from_be_bytes(random_note()) <= NOTE_NONCE_MAX);
        }
    }
}
