use crate::math::{mul_div_floor, ProtocolParams};
use crate::models::{Distribution, RewardsCheckpoint, RewardsProgram};
use common::{LendingError, MarketStorageState, UnrealizedRewards};

/// Per-market input of the projection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarketAccrual {
    pub market_counter: u64,
    /// Borrowed plus collateralised underlying of the whole market
    pub underlying_tvl: u128,
    /// Borrowed underlying in milli-dollars, read by the borrow-USD distribution only
    pub borrow_usd: u128,
    /// The storage account's bookkeeping in this market
    pub user: MarketStorageState,
}

/// Rewards a storage account would realize if a claim executed at `now`
///
/// Pure function of its arguments. A market's coefficient delta is
/// `floor(issued * REWARDS_SCALE * numerator / (denominator * tvl))`, floored
/// once; the unrealized primary and the secondary ratio floor after it.
pub fn project_unrealized_rewards(
    program: &RewardsProgram,
    distribution: &Distribution,
    checkpoint: &RewardsCheckpoint,
    markets: &[MarketAccrual],
    now: u64,
    protocol: &ProtocolParams,
) -> Result<UnrealizedRewards, LendingError> {
    let eligible = |m: &&MarketAccrual| distribution.is_eligible(m.market_counter);

    let total_tvl = markets
        .iter()
        .filter(eligible)
        .try_fold(0u128, |acc, m| acc.checked_add(m.underlying_tvl))
        .ok_or(LendingError::MathOverflow)?;
    if total_tvl == 0 {
        return Ok(UnrealizedRewards::ZERO);
    }

    let issued = program.issued_since_update(now);
    let denominator = match distribution {
        Distribution::BorrowUsd => markets
            .iter()
            .filter(eligible)
            .try_fold(0u128, |acc, m| acc.checked_add(m.borrow_usd))
            .ok_or(LendingError::MathOverflow)?,
        Distribution::Weighted { .. } => {
            markets.iter().filter(eligible).map(|m| distribution.weight(m.market_counter) as u128).sum()
        }
        Distribution::Undivided => 1,
    };

    let on_program = checkpoint.is_on_program(program.program_number);
    let mut primary = if on_program { checkpoint.pending_rewards as u128 } else { 0 };
    let mut secondary = if on_program { checkpoint.pending_secondary_rewards as u128 } else { 0 };

    // Scaled once so each market's delta floors a single time
    let scaled_issued = protocol.rewards_scale.scale_up(issued)?;

    for market in markets {
        let delta = if distribution.is_eligible(market.market_counter) {
            let numerator = match distribution {
                Distribution::BorrowUsd => market.borrow_usd,
                Distribution::Weighted { .. } => distribution.weight(market.market_counter) as u128,
                Distribution::Undivided => 1,
            };
            let market_denominator =
                denominator.checked_mul(market.underlying_tvl).ok_or(LendingError::MathOverflow)?;
            mul_div_floor(scaled_issued, numerator, market_denominator)?.unwrap_or(0)
        } else {
            0
        };

        let projected = program
            .coefficient(market.market_counter)
            .checked_add(delta)
            .ok_or(LendingError::MathOverflow)?;
        let user_coefficient = checkpoint.coefficient(market.market_counter, program.program_number);

        let unrealized = protocol
            .rewards_scale
            .mul_div(projected.saturating_sub(user_coefficient), market.user.rewards_balance())?;
        let unrealized_secondary =
            protocol.parameter_scale.mul_div(unrealized, program.secondary_ratio as u128)?;

        primary = primary.checked_add(unrealized).ok_or(LendingError::MathOverflow)?;
        secondary = secondary.checked_add(unrealized_secondary).ok_or(LendingError::MathOverflow)?;
    }

    Ok(UnrealizedRewards { primary, secondary })
}
