use crate::common::{Address, LedgerReader};
use crate::math::ProtocolParams;
use crate::models::manager::{storage_address_from, Manager};
use crate::models::market::Market;
use crate::models::rewards_program::{Distribution, RewardsCheckpoint};
use crate::rewards::project_unrealized_rewards;
use common::registry::{SchemaVersion, StakingContractInfo, SymbolInfo};
use common::{LendingError, StakingUserState, UnrealizedRewards};

/// Staking contracts track their single market under counter 1
pub const STAKING_MARKET_COUNTER: u64 = 1;

/// A manager paired with the one market it stakes into
#[derive(Debug, Clone, PartialEq)]
pub struct StakingContract {
    pub name: String,
    pub manager: Manager,
    pub market: Market,
}

impl StakingContract {
    pub fn load<R: LedgerReader + ?Sized>(
        reader: &R,
        name: &str,
        info: &StakingContractInfo,
        schema_version: SchemaVersion,
    ) -> Result<Self, LendingError> {
        let manager = Manager::load(reader, info.manager_app_id, schema_version, &[STAKING_MARKET_COUNTER])?;
        let symbol_info = SymbolInfo {
            market_app_id: info.market_app_id,
            underlying_asset_id: info.underlying_asset_id,
            bank_asset_id: info.bank_asset_id,
        };
        let market = Market::load(reader, name, &symbol_info, SchemaVersion::V1, STAKING_MARKET_COUNTER)?;
        Ok(Self { name: name.to_string(), manager, market })
    }

    pub fn refresh<R: LedgerReader + ?Sized>(&mut self, reader: &R) -> Result<(), LendingError> {
        self.manager.refresh(reader)?;
        self.market.refresh(reader)
    }

    pub fn manager_app_id(&self) -> u64 {
        self.manager.app_id
    }

    pub fn market_app_id(&self) -> u64 {
        self.market.app_id
    }

    pub fn oracle_app_id(&self) -> Result<u64, LendingError> {
        self.market.oracle_app_id().ok_or(LendingError::NoOracle(self.market.asset.underlying_asset_id))
    }

    /// Bank tokens currently staked across all users
    pub fn staked(&self) -> u64 {
        self.market.active_collateral
    }

    pub fn rewards_asset_ids(&self) -> Vec<u64> {
        self.manager.rewards_program.rewards_asset_ids()
    }

    pub fn storage_address<R: LedgerReader + ?Sized>(
        &self,
        reader: &R,
        user_address: &str,
    ) -> Result<Address, LendingError> {
        let local = reader.local_state(user_address, self.manager.app_id)?;
        storage_address_from(&local, user_address)
    }

    pub fn user_state<R: LedgerReader + ?Sized>(
        &self,
        reader: &R,
        user_address: &str,
        protocol: &ProtocolParams,
    ) -> Result<StakingUserState, LendingError> {
        let storage = self.storage_address(reader, user_address)?;
        let checkpoint = self.manager.rewards_checkpoint(reader, &storage)?;
        let program_number = self.manager.rewards_program.program_number;
        let on_program = checkpoint.is_on_program(program_number);
        let market_state = self.market.storage_state(reader, &storage, protocol)?;

        Ok(StakingUserState {
            pending_rewards: if on_program { checkpoint.pending_rewards } else { 0 },
            pending_secondary_rewards: if on_program { checkpoint.pending_secondary_rewards } else { 0 },
            rewards_coefficient: checkpoint.coefficient(STAKING_MARKET_COUNTER, program_number),
            staked_bank: market_state.active_collateral_bank,
            staked: market_state.active_collateral_underlying,
        })
    }

    /// Rewards the user would realize by claiming at `now`; the whole emission goes to the one market
    pub fn unrealized_rewards<R: LedgerReader + ?Sized>(
        &self,
        reader: &R,
        user_address: &str,
        now: u64,
        protocol: &ProtocolParams,
    ) -> Result<UnrealizedRewards, LendingError> {
        let storage = self.storage_address(reader, user_address)?;
        let checkpoint: RewardsCheckpoint = self.manager.rewards_checkpoint(reader, &storage)?;
        let user = self.market.storage_state(reader, &storage, protocol)?;
        let accrual = crate::rewards::MarketAccrual {
            market_counter: STAKING_MARKET_COUNTER,
            underlying_tvl: self.market.underlying_tvl(protocol)?,
            borrow_usd: 0,
            user,
        };
        project_unrealized_rewards(
            &self.manager.rewards_program,
            &Distribution::Undivided,
            &checkpoint,
            &[accrual],
            now,
            protocol,
        )
    }
}
