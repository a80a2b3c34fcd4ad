pub mod asset;
pub mod manager;
pub mod market;
pub mod rewards_program;
pub mod staking_contract;

pub use asset::{Asset, OracleBinding};
pub use manager::Manager;
pub use market::{Market, MarketParams, MarketPosition};
pub use rewards_program::{Distribution, RewardsCheckpoint, RewardsProgram};
pub use staking_contract::{StakingContract, STAKING_MARKET_COUNTER};
