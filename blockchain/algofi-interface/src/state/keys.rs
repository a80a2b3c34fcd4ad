//! State keys and dispatch tags understood by the manager and market applications.
//!
//! Dispatch tags are passed verbatim as the first application argument. State
//! keys are the compact names the contracts store their variables under.

/// Application-call dispatch tags
pub mod tags {
    pub const FETCH_MARKET_VARIABLES: &str = "fetch_market_variables";
    pub const UPDATE_PRICES: &str = "update_prices";
    pub const UPDATE_PROTOCOL_DATA: &str = "update_protocol_data";

    pub const FILLERS: [&str; 9] = [
        "dummy_one",
        "dummy_two",
        "dummy_three",
        "dummy_four",
        "dummy_five",
        "dummy_six",
        "dummy_seven",
        "dummy_eight",
        "dummy_nine",
    ];

    pub const MINT: &str = "mint";
    pub const MINT_TO_COLLATERAL: &str = "mint_to_collateral";
    pub const ADD_COLLATERAL: &str = "add_collateral";
    pub const REMOVE_COLLATERAL: &str = "remove_collateral";
    pub const BURN: &str = "burn";
    pub const REMOVE_COLLATERAL_UNDERLYING: &str = "remove_collateral_underlying";
    pub const BORROW: &str = "borrow";
    pub const REPAY_BORROW: &str = "repay_borrow";
    pub const LIQUIDATE: &str = "liquidate";
    pub const CLAIM_REWARDS: &str = "claim_rewards";
    pub const SYNC_VAULT: &str = "sync_vault";
    pub const SEND_GOVERNANCE_TXN: &str = "send_governance_txn";
    pub const SEND_KEYREG_TXN: &str = "send_keyreg_txn";
    pub const SEND_KEYREG_OFFLINE_TXN: &str = "send_keyreg_offline_txn";
}

/// Market application global and local state
pub mod market {
    pub const ACTIVE_COLLATERAL: &str = "acc";
    pub const BANK_CIRCULATION: &str = "bc";
    pub const BANK_TO_UNDERLYING_EXCHANGE: &str = "bt";
    pub const UNDERLYING_BORROWED: &str = "ub";
    pub const OUTSTANDING_BORROW_SHARES: &str = "obs";
    pub const UNDERLYING_CASH: &str = "uc";
    pub const UNDERLYING_RESERVES: &str = "ur";
    pub const TOTAL_BORROW_INTEREST_RATE: &str = "tbir";
    pub const COLLATERAL_FACTOR: &str = "cf";
    pub const LIQUIDATION_INCENTIVE: &str = "li";
    pub const RESERVE_FACTOR: &str = "rf";
    pub const BASE_INTEREST_RATE: &str = "bir";
    pub const SLOPE_1: &str = "s1";
    pub const SLOPE_2: &str = "s2";
    pub const UTILIZATION_OPTIMAL: &str = "uo";
    pub const MARKET_SUPPLY_CAP_IN_DOLLARS: &str = "msc";
    pub const MARKET_BORROW_CAP_IN_DOLLARS: &str = "mbc";
    pub const ORACLE_APP_ID: &str = "o_a_id";
    pub const ORACLE_PRICE_FIELD: &str = "op_f";
    pub const ORACLE_PRICE_SCALE_FACTOR: &str = "op_s_f";
    pub const MARKET_COUNTER: &str = "mc";

    pub const USER_ACTIVE_COLLATERAL: &str = "uac";
    pub const USER_BORROW_SHARES: &str = "ubs";
}

/// Manager application global and local state
pub mod manager {
    pub const USER_STORAGE_ADDRESS: &str = "usa";
    pub const N_REWARDS_PROGRAMS: &str = "nrp";
    pub const REWARDS_AMOUNT: &str = "ra";
    pub const REWARDS_PER_SECOND: &str = "rps";
    pub const REWARDS_ASSET_ID: &str = "rai";
    pub const REWARDS_SECONDARY_RATIO: &str = "rsr";
    pub const REWARDS_SECONDARY_ASSET_ID: &str = "rsai";
    pub const LATEST_REWARDS_TIME: &str = "lrt";
    pub const REWARDS_ELIGIBILITY_BITMAP: &str = "reb";
    pub const REWARDS_WEIGHTS: &str = "rw";

    /// Suffix after the 8-byte market counter
    pub const COUNTER_INDEXED_REWARDS_COEFFICIENT: &str = "_circ";
    /// Suffix after the 8-byte market counter
    pub const COUNTER_TO_USER_REWARDS_COEFFICIENT_INITIAL: &str = "_ctuirc";

    pub const USER_REWARDS_PROGRAM_NUMBER: &str = "urpn";
    pub const USER_PENDING_REWARDS: &str = "upr";
    pub const USER_SECONDARY_PENDING_REWARDS: &str = "uspr";
    pub const USER_GLOBAL_MAX_BORROW_IN_DOLLARS: &str = "ugmbid";
    pub const USER_GLOBAL_BORROWED_IN_DOLLARS: &str = "ugbid";
}

/// `be8(counter) || suffix`
pub fn counter_indexed(counter: u64, suffix: &str) -> Vec<u8> {
    let mut key = counter.to_be_bytes().to_vec();
    key.extend_from_slice(suffix.as_bytes());
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_indexed_key_layout() {
        let key = counter_indexed(1, manager::COUNTER_INDEXED_REWARDS_COEFFICIENT);
        assert_eq!(&key[..8], &[0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(&key[8..], b"_circ");
    }

    #[test]
    fn test_filler_tags_are_distinct() {
        let mut tags = tags::FILLERS.to_vec();
        tags.sort_unstable();
        tags.dedup();
        assert_eq!(tags.len(), 9);
    }
}
