use crate::common::{Address, LedgerReader};
use crate::math::{mul_div_floor, ProtocolParams};
use crate::models::asset::{Asset, OracleBinding};
use crate::rewards::MarketAccrual;
use crate::state::keys::market as keys;
use crate::state::LedgerState;
use crate::transactions::MarketRef;
use common::registry::{SchemaVersion, SymbolInfo};
use common::{LendingError, MarketStorageState};
use log::debug;

/// Risk and interest-curve parameters of a market
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarketParams {
    pub collateral_factor: u64,
    pub liquidation_incentive: u64,
    pub reserve_factor: u64,
    pub base_interest_rate: u64,
    pub slope_1: u64,
    pub slope_2: u64,
    pub utilization_optimal: u64,
    pub supply_cap_in_dollars: u64,
    pub borrow_cap_in_dollars: u64,
}

/// A user's position in one market, amounts in underlying base units and milli-dollars
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarketPosition {
    pub collateral_underlying: u64,
    pub borrow_underlying: u64,
    pub collateral_usd: u128,
    pub borrow_usd: u128,
    pub borrowing_power: u128,
}

/// Snapshot of one lending market
#[derive(Debug, Clone, PartialEq)]
pub struct Market {
    pub schema_version: SchemaVersion,
    pub symbol: String,
    pub app_id: u64,
    pub address: Address,
    /// 1-based position in the manager's market list
    pub market_counter: u64,
    pub params: MarketParams,
    pub active_collateral: u64,
    pub bank_circulation: u64,
    pub bank_to_underlying_exchange: u64,
    pub underlying_borrowed: u64,
    pub outstanding_borrow_shares: u64,
    pub underlying_cash: u64,
    pub underlying_reserves: u64,
    pub total_borrow_interest_rate: u64,
    pub asset: Asset,
    registry_counter: u64,
}

impl Market {
    /// Build the snapshot from the market's global state and an already-loaded asset
    pub fn from_state(
        symbol: &str,
        info: &SymbolInfo,
        state: &LedgerState,
        schema_version: SchemaVersion,
        registry_counter: u64,
        asset: Asset,
    ) -> Self {
        let mut market = Self {
            schema_version,
            symbol: symbol.to_string(),
            app_id: info.market_app_id,
            address: Address::for_application(info.market_app_id),
            market_counter: registry_counter,
            params: MarketParams::default(),
            active_collateral: 0,
            bank_circulation: 0,
            bank_to_underlying_exchange: 0,
            underlying_borrowed: 0,
            outstanding_borrow_shares: 0,
            underlying_cash: 0,
            underlying_reserves: 0,
            total_borrow_interest_rate: 0,
            asset,
            registry_counter,
        };
        market.apply_state(state);
        market
    }

    pub fn load<R: LedgerReader + ?Sized>(
        reader: &R,
        symbol: &str,
        info: &SymbolInfo,
        schema_version: SchemaVersion,
        registry_counter: u64,
    ) -> Result<Self, LendingError> {
        let state = reader.global_state(info.market_app_id)?;
        let asset = Asset::load(
            reader,
            info.underlying_asset_id,
            info.bank_asset_id,
            oracle_binding(&state),
        )?;
        debug!("Loaded market {} ({})", symbol, info.market_app_id);
        Ok(Self::from_state(symbol, info, &state, schema_version, registry_counter, asset))
    }

    /// Re-read global state and the oracle price
    pub fn refresh<R: LedgerReader + ?Sized>(&mut self, reader: &R) -> Result<(), LendingError> {
        let state = reader.global_state(self.app_id)?;
        self.apply_state(&state);
        self.asset.oracle = oracle_binding(&state);
        self.asset.refresh_price(reader)
    }

    fn apply_state(&mut self, state: &LedgerState) {
        self.params = MarketParams {
            collateral_factor: state.get_uint(keys::COLLATERAL_FACTOR),
            liquidation_incentive: state.get_uint(keys::LIQUIDATION_INCENTIVE),
            reserve_factor: state.get_uint(keys::RESERVE_FACTOR),
            base_interest_rate: state.get_uint(keys::BASE_INTEREST_RATE),
            slope_1: state.get_uint(keys::SLOPE_1),
            slope_2: state.get_uint(keys::SLOPE_2),
            utilization_optimal: state.get_uint(keys::UTILIZATION_OPTIMAL),
            supply_cap_in_dollars: state.get_uint(keys::MARKET_SUPPLY_CAP_IN_DOLLARS),
            borrow_cap_in_dollars: state.get_uint(keys::MARKET_BORROW_CAP_IN_DOLLARS),
        };
        self.active_collateral = state.get_uint(keys::ACTIVE_COLLATERAL);
        self.bank_circulation = state.get_uint(keys::BANK_CIRCULATION);
        self.bank_to_underlying_exchange = state.get_uint(keys::BANK_TO_UNDERLYING_EXCHANGE);
        self.underlying_borrowed = state.get_uint(keys::UNDERLYING_BORROWED);
        self.outstanding_borrow_shares = state.get_uint(keys::OUTSTANDING_BORROW_SHARES);
        self.underlying_cash = state.get_uint(keys::UNDERLYING_CASH);
        self.underlying_reserves = state.get_uint(keys::UNDERLYING_RESERVES);
        self.total_borrow_interest_rate = state.get_uint(keys::TOTAL_BORROW_INTEREST_RATE);

        self.market_counter = match self.schema_version {
            SchemaVersion::V1 => self.registry_counter,
            SchemaVersion::V2 => state.get_uint_opt(keys::MARKET_COUNTER).unwrap_or(self.registry_counter),
        };
    }

    pub fn market_ref(&self) -> MarketRef {
        MarketRef::new(self.app_id, self.asset.underlying_asset_id, self.asset.bank_asset_id)
    }

    pub fn oracle_app_id(&self) -> Option<u64> {
        self.asset.oracle.as_ref().map(|oracle| oracle.app_id)
    }

    /// Underlying claims of the active collateral
    pub fn active_collateral_underlying(&self, protocol: &ProtocolParams) -> Result<u128, LendingError> {
        protocol.scale.mul_div(self.active_collateral as u128, self.bank_to_underlying_exchange as u128)
    }

    /// Borrowed plus collateralised underlying, the base rewards are spread over
    pub fn underlying_tvl(&self, protocol: &ProtocolParams) -> Result<u128, LendingError> {
        Ok(self.underlying_borrowed as u128 + self.active_collateral_underlying(protocol)?)
    }

    /// Storage account bookkeeping derived from its local state in this market
    pub fn storage_state_from(
        &self,
        local: &LedgerState,
        protocol: &ProtocolParams,
    ) -> Result<MarketStorageState, LendingError> {
        let active_collateral_bank = local.get_uint(keys::USER_ACTIVE_COLLATERAL);
        let borrow_shares = local.get_uint(keys::USER_BORROW_SHARES);
        let active_collateral_underlying = protocol
            .scale
            .mul_div(active_collateral_bank as u128, self.bank_to_underlying_exchange as u128)?;
        let borrow_underlying = mul_div_floor(
            self.underlying_borrowed as u128,
            borrow_shares as u128,
            self.outstanding_borrow_shares as u128,
        )?
        .unwrap_or(0);

        Ok(MarketStorageState {
            active_collateral_bank,
            active_collateral_underlying: crate::math::saturating_u64(active_collateral_underlying),
            borrow_shares,
            borrow_underlying: crate::math::saturating_u64(borrow_underlying),
        })
    }

    pub fn storage_state<R: LedgerReader + ?Sized>(
        &self,
        reader: &R,
        storage_address: &Address,
        protocol: &ProtocolParams,
    ) -> Result<MarketStorageState, LendingError> {
        let local = reader.local_state(&storage_address.encode(), self.app_id)?;
        self.storage_state_from(&local, protocol)
    }

    /// Dollar view of a storage state, with borrowing power against the collateral factor
    pub fn position(
        &self,
        storage: &MarketStorageState,
        protocol: &ProtocolParams,
    ) -> Result<MarketPosition, LendingError> {
        let collateral_usd = self.asset.to_usd_scaled(storage.active_collateral_underlying)?;
        let borrow_usd = self.asset.to_usd_scaled(storage.borrow_underlying)?;
        let borrowing_power =
            protocol.parameter_scale.mul_div(collateral_usd, self.params.collateral_factor as u128)?;
        Ok(MarketPosition {
            collateral_underlying: storage.active_collateral_underlying,
            borrow_underlying: storage.borrow_underlying,
            collateral_usd,
            borrow_usd,
            borrowing_power,
        })
    }

    /// Projector input for this market and one storage account
    ///
    /// Only the borrow-USD distribution prices the market, so an oracle is
    /// required under schema V1 alone.
    pub fn accrual(
        &self,
        user: MarketStorageState,
        protocol: &ProtocolParams,
    ) -> Result<MarketAccrual, LendingError> {
        let borrow_usd = match self.schema_version {
            SchemaVersion::V1 => self.asset.to_usd_scaled(self.underlying_borrowed)?,
            SchemaVersion::V2 => 0,
        };
        Ok(MarketAccrual {
            market_counter: self.market_counter,
            underlying_tvl: self.underlying_tvl(protocol)?,
            borrow_usd,
            user,
        })
    }
}

/// Oracle binding stored in the market's global state, if any
fn oracle_binding(state: &LedgerState) -> Option<OracleBinding> {
    let app_id = state.get_uint(keys::ORACLE_APP_ID);
    if app_id == 0 {
        return None;
    }
    Some(OracleBinding {
        app_id,
        price_field: state.get_bytes(keys::ORACLE_PRICE_FIELD).to_vec(),
        scale_factor: state.get_uint(keys::ORACLE_PRICE_SCALE_FACTOR),
    })
}
