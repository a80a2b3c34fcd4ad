use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Protocol operations that run behind the refresh prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum OperationKind {
    Mint,
    MintToCollateral,
    AddCollateral,
    RemoveCollateral,
    Burn,
    RemoveCollateralUnderlying,
    Borrow,
    RepayBorrow,
    Liquidate,
    ClaimRewards,
    SupplyAlgosToVault,
    RemoveAlgosFromVault,
    SyncVault,
    SendGovernanceTxn,
    SendKeyregOnlineTxn,
    SendKeyregOfflineTxn,
}

impl OperationKind {
    /// Multiple of the baseline fee paid by the `update_prices` refresh call
    pub fn fee_multiplier(&self) -> u64 {
        match self {
            OperationKind::Mint
            | OperationKind::Burn
            | OperationKind::RemoveCollateral
            | OperationKind::RemoveCollateralUnderlying
            | OperationKind::Borrow
            | OperationKind::RepayBorrow
            | OperationKind::Liquidate
            | OperationKind::ClaimRewards
            | OperationKind::SendGovernanceTxn
            | OperationKind::SendKeyregOnlineTxn
            | OperationKind::SendKeyregOfflineTxn => 2,
            OperationKind::RemoveAlgosFromVault => 4,
            OperationKind::MintToCollateral
            | OperationKind::AddCollateral
            | OperationKind::SupplyAlgosToVault
            | OperationKind::SyncVault => 1,
        }
    }

    /// Number of operations following the filler block
    pub fn payload_len(&self) -> usize {
        match self {
            OperationKind::ClaimRewards
            | OperationKind::SendGovernanceTxn
            | OperationKind::SendKeyregOnlineTxn
            | OperationKind::SendKeyregOfflineTxn => 1,
            OperationKind::RemoveCollateral
            | OperationKind::RemoveCollateralUnderlying
            | OperationKind::Borrow
            | OperationKind::RemoveAlgosFromVault
            | OperationKind::SyncVault => 2,
            OperationKind::Mint
            | OperationKind::MintToCollateral
            | OperationKind::AddCollateral
            | OperationKind::Burn
            | OperationKind::RepayBorrow
            | OperationKind::SupplyAlgosToVault => 3,
            OperationKind::Liquidate => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_fee_multipliers() {
        assert_eq!(OperationKind::Borrow.fee_multiplier(), 2);
        assert_eq!(OperationKind::RemoveAlgosFromVault.fee_multiplier(), 4);
        assert_eq!(OperationKind::AddCollateral.fee_multiplier(), 1);
        assert_eq!(OperationKind::iter().filter(|k| k.fee_multiplier() == 2).count(), 11);
    }

    #[test]
    fn test_payload_fits_group() {
        for kind in OperationKind::iter() {
            assert!((1..=4).contains(&kind.payload_len()), "{kind}");
        }
    }

    #[test]
    fn test_names() {
        assert_eq!(OperationKind::RemoveCollateralUnderlying.to_string(), "remove_collateral_underlying");
        assert_eq!(OperationKind::from_str("sync_vault").unwrap(), OperationKind::SyncVault);
    }
}
