use serde::{Deserialize, Serialize};

pub mod asset_utils;
pub mod lending;
pub mod registry;
pub use lending::*;

/// Per-market bookkeeping of one storage account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketStorageState {
    /// Bank tokens held as active collateral
    pub active_collateral_bank: u64,
    /// Active collateral converted to underlying units at the cached exchange rate
    pub active_collateral_underlying: u64,
    pub borrow_shares: u64,
    /// Borrow shares converted to underlying units
    pub borrow_underlying: u64,
}

impl MarketStorageState {
    /// Balance that accrues rewards in this market
    pub fn rewards_balance(&self) -> u128 {
        self.active_collateral_underlying as u128 + self.borrow_underlying as u128
    }
}

/// Manager-level bookkeeping of one storage account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerStorageState {
    pub user_global_max_borrow_in_dollars: u64,
    pub user_global_borrowed_in_dollars: u64,
}

/// State of a user inside a staking contract
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingUserState {
    pub pending_rewards: u64,
    pub pending_secondary_rewards: u64,
    pub rewards_coefficient: u128,
    pub staked_bank: u64,
    pub staked: u64,
}

/// Projected claimable rewards (primary, secondary)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnrealizedRewards {
    pub primary: u128,
    pub secondary: u128,
}

impl UnrealizedRewards {
    pub const ZERO: Self = Self { primary: 0, secondary: 0 };

    pub fn as_tuple(&self) -> (u128, u128) {
        (self.primary, self.secondary)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ObligationType {
    Asset,     // Collateral
    Liability, // Borrow
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserObligation {
    pub symbol: String,
    pub asset_id: u64,
    pub asset_decimals: u32,
    pub amount: u64,
    pub protocol_name: String,
    pub market_app_id: u64,
    pub obligation_type: ObligationType,
}

/// Balances of a ledger account keyed by asset id (the native asset uses id 1)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountBalances {
    pub address: String,
    pub balances: std::collections::HashMap<u64, u64>,
    /// Applications the account has opted into
    pub app_ids: Vec<u64>,
}

impl AccountBalances {
    pub fn balance(&self, asset_id: u64) -> u64 {
        self.balances.get(&asset_id).copied().unwrap_or(0)
    }

    pub fn is_opted_into_app(&self, app_id: u64) -> bool {
        self.app_ids.contains(&app_id)
    }

    pub fn is_opted_into_asset(&self, asset_id: u64) -> bool {
        self.balances.contains_key(&asset_id)
    }
}
