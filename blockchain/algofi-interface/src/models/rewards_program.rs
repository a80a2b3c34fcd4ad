use crate::state::keys::{counter_indexed, manager};
use crate::state::LedgerState;
use common::registry::SchemaVersion;
use std::collections::HashMap;

/// How an emission is split between markets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Distribution {
    /// Pro rata to each market's borrowed value in dollars
    BorrowUsd,
    /// Pro rata to 4-bit weights of the markets whose eligibility bit is set
    Weighted { eligibility_bitmap: Vec<u8>, weights: Vec<u8> },
    /// Every market receives the whole emission; used with a single market
    Undivided,
}

impl Distribution {
    /// Bit `counter - 1` of the bitmap, most significant bit first
    pub fn is_eligible(&self, market_counter: u64) -> bool {
        match self {
            Distribution::Weighted { eligibility_bitmap, .. } => {
                let Some(index) = market_counter.checked_sub(1) else {
                    return false;
                };
                eligibility_bitmap
                    .get((index / 8) as usize)
                    .is_some_and(|byte| byte & (0x80 >> (index % 8)) != 0)
            }
            _ => true,
        }
    }

    /// Nibble `counter - 1` of the weights, high nibble first; 0 outside the table
    pub fn weight(&self, market_counter: u64) -> u64 {
        match self {
            Distribution::Weighted { weights, .. } => {
                let Some(index) = market_counter.checked_sub(1) else {
                    return 0;
                };
                match weights.get((index / 2) as usize) {
                    Some(byte) if index % 2 == 0 => (byte >> 4) as u64,
                    Some(byte) => (byte & 0x0f) as u64,
                    None => 0,
                }
            }
            _ => 1,
        }
    }
}

/// The manager's active emission schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardsProgram {
    pub schema_version: SchemaVersion,
    pub program_number: u64,
    pub latest_rewards_time: u64,
    pub rewards_amount: u64,
    pub rewards_per_second: u64,
    pub rewards_asset_id: u64,
    pub secondary_ratio: u64,
    pub secondary_asset_id: u64,
    pub eligibility_bitmap: Vec<u8>,
    pub weights: Vec<u8>,
    /// Global rewards coefficient per market counter
    pub coefficients: HashMap<u64, u128>,
}

impl RewardsProgram {
    /// Read the program from manager global state, with coefficients for `market_counters`
    pub fn from_state(state: &LedgerState, schema_version: SchemaVersion, market_counters: &[u64]) -> Self {
        let coefficients = market_counters
            .iter()
            .map(|counter| {
                let key = counter_indexed(*counter, manager::COUNTER_INDEXED_REWARDS_COEFFICIENT);
                (*counter, state.get_uint(key) as u128)
            })
            .collect();

        Self {
            schema_version,
            program_number: state.get_uint(manager::N_REWARDS_PROGRAMS),
            latest_rewards_time: state.get_uint(manager::LATEST_REWARDS_TIME),
            rewards_amount: state.get_uint(manager::REWARDS_AMOUNT),
            rewards_per_second: state.get_uint(manager::REWARDS_PER_SECOND),
            rewards_asset_id: state.get_uint(manager::REWARDS_ASSET_ID),
            secondary_ratio: state.get_uint(manager::REWARDS_SECONDARY_RATIO),
            secondary_asset_id: state.get_uint(manager::REWARDS_SECONDARY_ASSET_ID),
            eligibility_bitmap: state.get_bytes(manager::REWARDS_ELIGIBILITY_BITMAP).to_vec(),
            weights: state.get_bytes(manager::REWARDS_WEIGHTS).to_vec(),
            coefficients,
        }
    }

    /// Reward assets a claim must reference; ids of 0 and 1 are not transferable assets
    pub fn rewards_asset_ids(&self) -> Vec<u64> {
        [self.rewards_asset_id, self.secondary_asset_id].into_iter().filter(|id| *id > 1).collect()
    }

    pub fn coefficient(&self, market_counter: u64) -> u128 {
        self.coefficients.get(&market_counter).copied().unwrap_or(0)
    }

    pub fn distribution(&self) -> Distribution {
        match self.schema_version {
            SchemaVersion::V1 => Distribution::BorrowUsd,
            SchemaVersion::V2 => Distribution::Weighted {
                eligibility_bitmap: self.eligibility_bitmap.clone(),
                weights: self.weights.clone(),
            },
        }
    }

    /// Emission since the last on-chain update, 0 once the program is exhausted
    pub fn issued_since_update(&self, now: u64) -> u128 {
        if self.rewards_amount == 0 {
            return 0;
        }
        now.saturating_sub(self.latest_rewards_time) as u128 * self.rewards_per_second as u128
    }
}

/// A storage account's rewards position in the manager
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewardsCheckpoint {
    /// Program generation the checkpoint was taken under
    pub program_number: Option<u64>,
    pub pending_rewards: u64,
    pub pending_secondary_rewards: u64,
    /// Coefficient per market counter at the last settlement
    pub coefficients: HashMap<u64, u128>,
}

impl RewardsCheckpoint {
    pub fn from_state(state: &LedgerState, market_counters: &[u64]) -> Self {
        let coefficients = market_counters
            .iter()
            .map(|counter| {
                let key = counter_indexed(*counter, manager::COUNTER_TO_USER_REWARDS_COEFFICIENT_INITIAL);
                (*counter, state.get_uint(key) as u128)
            })
            .collect();

        Self {
            program_number: state.get_uint_opt(manager::USER_REWARDS_PROGRAM_NUMBER),
            pending_rewards: state.get_uint(manager::USER_PENDING_REWARDS),
            pending_secondary_rewards: state.get_uint(manager::USER_SECONDARY_PENDING_REWARDS),
            coefficients,
        }
    }

    pub fn is_on_program(&self, program_number: u64) -> bool {
        self.program_number == Some(program_number)
    }

    /// Checkpoint coefficient, 0 when taken under another program generation
    pub fn coefficient(&self, market_counter: u64, program_number: u64) -> u128 {
        if !self.is_on_program(program_number) {
            return 0;
        }
        self.coefficients.get(&market_counter).copied().unwrap_or(0)
    }
}
