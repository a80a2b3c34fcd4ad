use super::scale_factor::ScaleFactor;

/// Immutable protocol constants shared by the group builder and the rewards projector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolParams {
    /// Scale of collateral factors, liquidation incentives and secondary ratios
    pub parameter_scale: ScaleFactor,
    /// Scale of the bank-to-underlying exchange rate
    pub scale: ScaleFactor,
    /// Scale of rewards coefficients
    pub rewards_scale: ScaleFactor,
    /// Oracle prices are quoted in thousandths of a dollar
    pub usd_scale: ScaleFactor,
    /// Filler operations between the refresh triple and the payload
    pub filler_count: usize,
    /// Flat fee of a single operation in micro-units
    pub baseline_fee: u64,
    pub max_group_size: usize,
    /// Fee of the collateral-market leg of a liquidation
    pub liquidate_update_fee: u64,
    /// Minimum balance sent to a fresh storage account on manager opt-in
    pub manager_opt_in_min_balance: u64,
    /// Minimum balance sent to a fresh storage account on staking opt-in
    pub staking_opt_in_min_balance: u64,
}

impl ProtocolParams {
    // Protocol-wide scale factors
    pub const PARAMETER_SCALE: ScaleFactor = ScaleFactor::new(1_000); // 1e3
    pub const SCALE: ScaleFactor = ScaleFactor::new(1_000_000_000); // 1e9
    pub const REWARDS_SCALE: ScaleFactor = ScaleFactor::new(100_000_000_000_000); // 1e14
    pub const USD_SCALE: ScaleFactor = ScaleFactor::new(1_000); // 1e3

    pub const FILLER_COUNT: usize = 9;
    pub const BASELINE_FEE: u64 = 1_000;
    pub const MAX_GROUP_SIZE: usize = 16;

    /// Parameters of the deployed lending protocol
    pub const ALGOFI: Self = Self {
        parameter_scale: Self::PARAMETER_SCALE,
        scale: Self::SCALE,
        rewards_scale: Self::REWARDS_SCALE,
        usd_scale: Self::USD_SCALE,
        filler_count: Self::FILLER_COUNT,
        baseline_fee: Self::BASELINE_FEE,
        max_group_size: Self::MAX_GROUP_SIZE,
        liquidate_update_fee: Self::BASELINE_FEE,
        manager_opt_in_min_balance: 3_569_500,
        staking_opt_in_min_balance: 650_000,
    };
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self::ALGOFI
    }
}
