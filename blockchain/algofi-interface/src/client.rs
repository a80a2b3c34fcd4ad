use crate::common::{Address, ClientConfig, HttpLedger, LedgerReader, LedgerSubmitter};
use crate::math::ProtocolParams;
use crate::models::{Asset, Manager, Market, StakingContract};
use crate::transactions::{
    self, KeyregParams, LendingContext, SubmitOutcome, SuggestedParams, TransactionGroup, WaitOptions,
};
use chrono::Utc;
use common::registry::{NetworkInfo, Registry, SymbolSet};
use common::{
    AccountBalances, LendingClient, LendingError, ManagerStorageState, MarketStorageState,
    ObligationType, StakingUserState, UnrealizedRewards, UserObligation,
};
use log::{debug, info};
use std::collections::{BTreeMap, HashMap};

/// Everything loaded from the ledger for one network
#[derive(Debug, Clone)]
pub struct AlgofiMarketData {
    pub manager: Manager,
    /// Markets of the max symbol set, in registry order
    pub markets: Vec<Market>,
    pub staking_contracts: HashMap<String, StakingContract>,
}

/// Manager and per-market bookkeeping of one storage account
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageSnapshot {
    pub storage_address: Option<Address>,
    pub manager: ManagerStorageState,
    pub markets: BTreeMap<String, MarketStorageState>,
}

/// Lending protocol client for one network
pub struct AlgofiClient<L> {
    ledger: L,
    network_name: String,
    network: NetworkInfo,
    protocol: ProtocolParams,
    user_address: Option<String>,
    data: AlgofiMarketData,
}

impl AlgofiClient<HttpLedger> {
    /// Client over HTTP endpoints, with the registry read from `config.registry_path`
    pub fn from_config(config: &ClientConfig) -> Result<Self, LendingError> {
        let registry = Registry::from_path(&config.registry_path)?;
        let network = registry.network(&config.network)?.clone();
        let ledger = HttpLedger::new(
            config.algod.clone(),
            config.indexer.clone(),
            config.historical_indexer.clone(),
        );
        Self::new(ledger, &config.network, network, ProtocolParams::ALGOFI, config.user_address.clone())
    }
}

impl<L: LedgerReader + LedgerSubmitter> AlgofiClient<L> {
    pub fn new(
        ledger: L,
        network_name: &str,
        network: NetworkInfo,
        protocol: ProtocolParams,
        user_address: Option<String>,
    ) -> Result<Self, LendingError> {
        let data = load_market_data(&ledger, &network)?;
        info!(
            "Loaded {} markets and {} staking contracts on {}",
            data.markets.len(),
            data.staking_contracts.len(),
            network_name
        );
        Ok(Self {
            ledger,
            network_name: network_name.to_string(),
            network,
            protocol,
            user_address,
            data,
        })
    }

    /// Re-read every snapshot
    pub fn refresh(&mut self) -> Result<(), LendingError> {
        self.load_markets()
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn network(&self) -> &NetworkInfo {
        &self.network
    }

    pub fn network_name(&self) -> &str {
        &self.network_name
    }

    pub fn protocol(&self) -> &ProtocolParams {
        &self.protocol
    }

    pub fn init_round(&self) -> u64 {
        self.network.init_round
    }

    pub fn manager(&self) -> &Manager {
        &self.data.manager
    }

    pub fn markets(&self) -> &[Market] {
        &self.data.markets
    }

    pub fn market(&self, symbol: &str) -> Result<&Market, LendingError> {
        self.data
            .markets
            .iter()
            .find(|market| market.symbol == symbol)
            .ok_or_else(|| LendingError::UnknownSymbol(symbol.to_string()))
    }

    pub fn active_symbols(&self) -> &[String] {
        self.network.ordered_symbols(SymbolSet::Supported)
    }

    /// Markets of the supported symbol set
    pub fn active_markets(&self) -> Vec<&Market> {
        let active = self.active_symbols();
        self.data.markets.iter().filter(|market| active.contains(&market.symbol)).collect()
    }

    /// Asset of an active market
    pub fn asset(&self, symbol: &str) -> Result<&Asset, LendingError> {
        if !self.active_symbols().iter().any(|s| s == symbol) {
            return Err(LendingError::UnknownSymbol(symbol.to_string()));
        }
        self.market(symbol).map(|market| &market.asset)
    }

    pub fn staking_contract(&self, name: &str) -> Result<&StakingContract, LendingError> {
        self.data
            .staking_contracts
            .get(name)
            .ok_or_else(|| LendingError::UnknownStakingContract(name.to_string()))
    }

    pub fn staking_contracts(&self) -> &HashMap<String, StakingContract> {
        &self.data.staking_contracts
    }

    pub fn active_market_app_ids(&self) -> Vec<u64> {
        self.active_markets().iter().map(|market| market.app_id).collect()
    }

    pub fn active_oracle_app_ids(&self) -> Vec<u64> {
        self.active_markets().iter().filter_map(|market| market.oracle_app_id()).collect()
    }

    pub fn active_asset_ids(&self) -> Vec<u64> {
        self.active_markets().iter().map(|market| market.asset.underlying_asset_id).collect()
    }

    pub fn active_bank_asset_ids(&self) -> Vec<u64> {
        self.active_markets().iter().map(|market| market.asset.bank_asset_id).collect()
    }

    pub fn max_atomic_opt_in_market_app_ids(&self) -> Result<Vec<u64>, LendingError> {
        self.network
            .ordered_symbols(SymbolSet::MaxAtomicOptIn)
            .iter()
            .map(|symbol| self.network.market_app_id(symbol))
            .collect()
    }

    pub fn raw_prices(&self) -> Result<BTreeMap<String, u64>, LendingError> {
        self.active_markets()
            .into_iter()
            .map(|market| Ok((market.symbol.clone(), market.asset.raw_price()?)))
            .collect()
    }

    pub fn prices(&self) -> Result<BTreeMap<String, f64>, LendingError> {
        self.active_markets()
            .into_iter()
            .map(|market| Ok((market.symbol.clone(), market.asset.price()?)))
            .collect()
    }

    /// Explicit address, else the configured user
    fn resolve_user(&self, address: Option<&str>) -> Result<String, LendingError> {
        address
            .map(str::to_string)
            .or_else(|| self.user_address.clone())
            .ok_or_else(|| LendingError::Configuration("user address has not been specified".to_string()))
    }

    pub fn user_balances(&self, address: Option<&str>) -> Result<AccountBalances, LendingError> {
        self.ledger.account_balances(&self.resolve_user(address)?)
    }

    pub fn user_balance(&self, asset_id: u64, address: Option<&str>) -> Result<u64, LendingError> {
        Ok(self.user_balances(address)?.balance(asset_id))
    }

    pub fn is_opted_into_app(&self, app_id: u64, address: Option<&str>) -> Result<bool, LendingError> {
        Ok(self.user_balances(address)?.is_opted_into_app(app_id))
    }

    pub fn is_opted_into_asset(&self, asset_id: u64, address: Option<&str>) -> Result<bool, LendingError> {
        Ok(self.user_balances(address)?.is_opted_into_asset(asset_id))
    }

    pub fn storage_address(&self, address: Option<&str>) -> Result<Address, LendingError> {
        let user = self.resolve_user(address)?;
        self.data.manager.storage_address(&self.ledger, &user)
    }

    /// Bookkeeping of a storage account across the manager and the active markets
    pub fn storage_state(&self, storage_address: &Address) -> Result<StorageSnapshot, LendingError> {
        let mut markets = BTreeMap::new();
        for market in self.active_markets() {
            markets.insert(
                market.symbol.clone(),
                market.storage_state(&self.ledger, storage_address, &self.protocol)?,
            );
        }
        Ok(StorageSnapshot {
            storage_address: Some(*storage_address),
            manager: self.data.manager.storage_state(&self.ledger, storage_address)?,
            markets,
        })
    }

    pub fn user_state(&self, address: Option<&str>) -> Result<StorageSnapshot, LendingError> {
        let storage = self.storage_address(address)?;
        self.storage_state(&storage)
    }

    pub fn user_staking_state(
        &self,
        name: &str,
        address: Option<&str>,
    ) -> Result<StakingUserState, LendingError> {
        let user = self.resolve_user(address)?;
        self.staking_contract(name)?.user_state(&self.ledger, &user, &self.protocol)
    }

    /// Rewards the user would realize by claiming now
    pub fn unrealized_rewards(&self, address: Option<&str>) -> Result<UnrealizedRewards, LendingError> {
        self.unrealized_rewards_at(address, now())
    }

    pub fn unrealized_rewards_at(
        &self,
        address: Option<&str>,
        now: u64,
    ) -> Result<UnrealizedRewards, LendingError> {
        let storage = self.storage_address(address)?;
        let markets = self.active_markets();
        self.data.manager.unrealized_rewards(&self.ledger, &storage, &markets, now, &self.protocol)
    }

    pub fn staking_unrealized_rewards(
        &self,
        name: &str,
        address: Option<&str>,
        now: u64,
    ) -> Result<UnrealizedRewards, LendingError> {
        let user = self.resolve_user(address)?;
        self.staking_contract(name)?.unrealized_rewards(&self.ledger, &user, now, &self.protocol)
    }

    /// Every storage account of the protocol, or of one staking contract
    pub fn storage_accounts(&self, staking_contract: Option<&str>) -> Result<Vec<String>, LendingError> {
        let app_id = match staking_contract {
            Some(name) => self.staking_contract(name)?.manager_app_id(),
            None => self
                .active_markets()
                .first()
                .map(|market| market.app_id)
                .ok_or_else(|| LendingError::Configuration("no active markets".to_string()))?,
        };
        let accounts = self.ledger.accounts_opted_into_app(app_id)?;
        debug!("Found {} storage accounts opted into {}", accounts.len(), app_id);
        Ok(accounts)
    }

    pub fn suggested_params(&self) -> Result<SuggestedParams, LendingError> {
        self.ledger.suggested_params()
    }

    fn context<'a>(
        &self,
        sender: Address,
        params: &'a SuggestedParams,
        storage_account: Address,
    ) -> LendingContext<'a> {
        LendingContext {
            sender,
            params,
            protocol: self.protocol,
            manager_app_id: self.data.manager.app_id,
            market_app_ids: self.active_market_app_ids(),
            oracle_app_ids: self.active_oracle_app_ids(),
            storage_account,
            note_nonce: None,
        }
    }

    /// Run an assembler against the user's own storage account
    fn with_context<F>(&self, address: Option<&str>, assemble: F) -> Result<TransactionGroup, LendingError>
    where
        F: FnOnce(&LendingContext<'_>) -> Result<TransactionGroup, LendingError>,
    {
        let user = self.resolve_user(address)?;
        let sender = Address::decode(&user)?;
        let storage = self.data.manager.storage_address(&self.ledger, &user)?;
        let params = self.ledger.suggested_params()?;
        assemble(&self.context(sender, &params, storage))
    }

    /// Run an assembler against the user's storage account in a staking contract
    fn with_staking_context<F>(
        &self,
        name: &str,
        address: Option<&str>,
        assemble: F,
    ) -> Result<TransactionGroup, LendingError>
    where
        F: FnOnce(&LendingContext<'_>, &StakingContract) -> Result<TransactionGroup, LendingError>,
    {
        let contract = self.staking_contract(name)?;
        let user = self.resolve_user(address)?;
        let sender = Address::decode(&user)?;
        let storage = contract.storage_address(&self.ledger, &user)?;
        let params = self.ledger.suggested_params()?;
        let ctx = transactions::staking_context(
            sender,
            &params,
            self.protocol,
            contract.manager_app_id(),
            &contract.market.market_ref(),
            contract.oracle_app_id()?,
            storage,
        );
        assemble(&ctx, contract)
    }

    /// Opt a fresh storage account into the manager and the atomic opt-in markets
    pub fn prepare_opt_in(
        &self,
        storage_account: Address,
        address: Option<&str>,
    ) -> Result<TransactionGroup, LendingError> {
        let sender = Address::decode(&self.resolve_user(address)?)?;
        let params = self.ledger.suggested_params()?;
        transactions::prepare_manager_opt_in(
            sender,
            storage_account,
            &params,
            &self.protocol,
            self.data.manager.app_id,
            &self.max_atomic_opt_in_market_app_ids()?,
        )
    }

    pub fn prepare_market_opt_in(
        &self,
        symbol: &str,
        address: Option<&str>,
    ) -> Result<TransactionGroup, LendingError> {
        let sender = Address::decode(&self.resolve_user(address)?)?;
        let params = self.ledger.suggested_params()?;
        transactions::prepare_market_opt_in(sender, &params, &self.protocol, self.market(symbol)?.app_id)
    }

    pub fn prepare_asset_opt_in(
        &self,
        asset_id: u64,
        address: Option<&str>,
    ) -> Result<TransactionGroup, LendingError> {
        let sender = Address::decode(&self.resolve_user(address)?)?;
        let params = self.ledger.suggested_params()?;
        transactions::prepare_asset_opt_in(sender, &params, &self.protocol, asset_id)
    }

    pub fn prepare_mint(
        &self,
        symbol: &str,
        amount: u64,
        address: Option<&str>,
    ) -> Result<TransactionGroup, LendingError> {
        let market = self.market(symbol)?.market_ref();
        self.with_context(address, |ctx| transactions::prepare_mint(ctx, &market, amount))
    }

    pub fn prepare_mint_to_collateral(
        &self,
        symbol: &str,
        amount: u64,
        address: Option<&str>,
    ) -> Result<TransactionGroup, LendingError> {
        let market = self.market(symbol)?.market_ref();
        self.with_context(address, |ctx| transactions::prepare_mint_to_collateral(ctx, &market, amount))
    }

    pub fn prepare_add_collateral(
        &self,
        symbol: &str,
        amount: u64,
        address: Option<&str>,
    ) -> Result<TransactionGroup, LendingError> {
        let market = self.market(symbol)?.market_ref();
        self.with_context(address, |ctx| transactions::prepare_add_collateral(ctx, &market, amount))
    }

    pub fn prepare_remove_collateral(
        &self,
        symbol: &str,
        amount: u64,
        address: Option<&str>,
    ) -> Result<TransactionGroup, LendingError> {
        let market = self.market(symbol)?.market_ref();
        self.with_context(address, |ctx| transactions::prepare_remove_collateral(ctx, &market, amount))
    }

    pub fn prepare_burn(
        &self,
        symbol: &str,
        amount: u64,
        address: Option<&str>,
    ) -> Result<TransactionGroup, LendingError> {
        let market = self.market(symbol)?.market_ref();
        self.with_context(address, |ctx| transactions::prepare_burn(ctx, &market, amount))
    }

    pub fn prepare_remove_collateral_underlying(
        &self,
        symbol: &str,
        amount: u64,
        address: Option<&str>,
    ) -> Result<TransactionGroup, LendingError> {
        let market = self.market(symbol)?.market_ref();
        self.with_context(address, |ctx| {
            transactions::prepare_remove_collateral_underlying(ctx, &market, amount)
        })
    }

    pub fn prepare_borrow(
        &self,
        symbol: &str,
        amount: u64,
        address: Option<&str>,
    ) -> Result<TransactionGroup, LendingError> {
        let market = self.market(symbol)?.market_ref();
        self.with_context(address, |ctx| transactions::prepare_borrow(ctx, &market, amount))
    }

    pub fn prepare_repay_borrow(
        &self,
        symbol: &str,
        amount: u64,
        address: Option<&str>,
    ) -> Result<TransactionGroup, LendingError> {
        let market = self.market(symbol)?.market_ref();
        self.with_context(address, |ctx| transactions::prepare_repay_borrow(ctx, &market, amount))
    }

    /// Repay `amount` of the target's borrow in `borrow_symbol`, seizing `collateral_symbol`
    pub fn prepare_liquidate(
        &self,
        target_storage: Address,
        borrow_symbol: &str,
        amount: u64,
        collateral_symbol: &str,
        address: Option<&str>,
    ) -> Result<TransactionGroup, LendingError> {
        let borrow_market = self.market(borrow_symbol)?.market_ref();
        let collateral_market = self.market(collateral_symbol)?.market_ref();
        let user = self.resolve_user(address)?;
        let sender = Address::decode(&user)?;
        let liquidator_storage = self.data.manager.storage_address(&self.ledger, &user)?;
        let params = self.ledger.suggested_params()?;
        let ctx = self.context(sender, &params, target_storage);
        transactions::prepare_liquidate(&ctx, liquidator_storage, &borrow_market, &collateral_market, amount)
    }

    pub fn prepare_claim_rewards(&self, address: Option<&str>) -> Result<TransactionGroup, LendingError> {
        let rewards_asset_ids = self.data.manager.rewards_program.rewards_asset_ids();
        self.with_context(address, |ctx| transactions::prepare_claim_rewards(ctx, &rewards_asset_ids))
    }

    pub fn prepare_supply_algos_to_vault(
        &self,
        vault_symbol: &str,
        amount: u64,
        address: Option<&str>,
    ) -> Result<TransactionGroup, LendingError> {
        let market = self.market(vault_symbol)?.market_ref();
        self.with_context(address, |ctx| transactions::prepare_supply_algos_to_vault(ctx, &market, amount))
    }

    pub fn prepare_remove_algos_from_vault(
        &self,
        vault_symbol: &str,
        amount: u64,
        address: Option<&str>,
    ) -> Result<TransactionGroup, LendingError> {
        let market = self.market(vault_symbol)?.market_ref();
        self.with_context(address, |ctx| {
            transactions::prepare_remove_algos_from_vault(ctx, &market, amount)
        })
    }

    pub fn prepare_sync_vault(
        &self,
        vault_symbol: &str,
        address: Option<&str>,
    ) -> Result<TransactionGroup, LendingError> {
        let market = self.market(vault_symbol)?.market_ref();
        self.with_context(address, |ctx| transactions::prepare_sync_vault(ctx, &market))
    }

    pub fn prepare_send_governance(
        &self,
        governance_address: Address,
        note: &[u8],
        address: Option<&str>,
    ) -> Result<TransactionGroup, LendingError> {
        self.with_context(address, |ctx| {
            transactions::prepare_send_governance(ctx, governance_address, note)
        })
    }

    pub fn prepare_send_keyreg_online(
        &self,
        keys: &KeyregParams,
        address: Option<&str>,
    ) -> Result<TransactionGroup, LendingError> {
        self.with_context(address, |ctx| transactions::prepare_send_keyreg_online(ctx, keys))
    }

    pub fn prepare_send_keyreg_offline(&self, address: Option<&str>) -> Result<TransactionGroup, LendingError> {
        self.with_context(address, transactions::prepare_send_keyreg_offline)
    }

    pub fn prepare_staking_opt_in(
        &self,
        name: &str,
        storage_account: Address,
        address: Option<&str>,
    ) -> Result<TransactionGroup, LendingError> {
        let contract = self.staking_contract(name)?;
        let sender = Address::decode(&self.resolve_user(address)?)?;
        let params = self.ledger.suggested_params()?;
        transactions::prepare_staking_opt_in(
            sender,
            storage_account,
            &params,
            &self.protocol,
            contract.manager_app_id(),
            contract.market_app_id(),
        )
    }

    pub fn prepare_stake(
        &self,
        name: &str,
        amount: u64,
        address: Option<&str>,
    ) -> Result<TransactionGroup, LendingError> {
        self.with_staking_context(name, address, |ctx, contract| {
            transactions::prepare_stake(ctx, &contract.market.market_ref(), amount)
        })
    }

    pub fn prepare_unstake(
        &self,
        name: &str,
        amount: u64,
        address: Option<&str>,
    ) -> Result<TransactionGroup, LendingError> {
        self.with_staking_context(name, address, |ctx, contract| {
            transactions::prepare_unstake(ctx, &contract.market.market_ref(), amount)
        })
    }

    pub fn prepare_claim_staking_rewards(
        &self,
        name: &str,
        address: Option<&str>,
    ) -> Result<TransactionGroup, LendingError> {
        self.with_staking_context(name, address, |ctx, contract| {
            transactions::prepare_claim_staking_rewards(ctx, &contract.rewards_asset_ids())
        })
    }

    /// Submit a signed group; with `wait` block until it is confirmed
    pub fn submit(
        &self,
        group: &TransactionGroup,
        wait: Option<&WaitOptions>,
    ) -> Result<SubmitOutcome, LendingError> {
        group.submit(&self.ledger, wait)
    }
}

impl<L: LedgerReader + LedgerSubmitter> LendingClient<u64, AlgofiMarketData> for AlgofiClient<L> {
    fn fetch_markets(&self) -> Result<AlgofiMarketData, LendingError> {
        load_market_data(&self.ledger, &self.network)
    }

    fn set_market_data(&mut self, data: AlgofiMarketData) {
        self.data = data;
    }

    fn get_user_obligations(&self, wallet_address: &str) -> Result<Vec<UserObligation>, LendingError> {
        let snapshot = self.user_state(Some(wallet_address))?;
        let mut obligations = Vec::new();

        for market in self.active_markets() {
            let Some(state) = snapshot.markets.get(&market.symbol) else {
                continue;
            };
            let entries = [
                (state.active_collateral_underlying, ObligationType::Asset),
                (state.borrow_underlying, ObligationType::Liability),
            ];
            for (amount, obligation_type) in entries {
                if amount == 0 {
                    continue;
                }
                obligations.push(UserObligation {
                    symbol: market.symbol.clone(),
                    asset_id: market.asset.underlying_asset_id,
                    asset_decimals: market.asset.underlying_decimals,
                    amount,
                    protocol_name: self.protocol_name().to_string(),
                    market_app_id: market.app_id,
                    obligation_type,
                });
            }
        }
        Ok(obligations)
    }

    fn program_id(&self) -> u64 {
        self.data.manager.app_id
    }

    fn protocol_name(&self) -> &'static str {
        "Algofi"
    }

    fn print_markets(&self) {
        use common::asset_utils::{format_large_number, to_display_amount};
        use prettytable::{row, Table};

        if self.data.markets.is_empty() {
            info!("No markets loaded");
            return;
        }
        info!("{} markets as of {}", self.network_name, Utc::now().to_rfc3339());

        let mut table = Table::new();
        table.add_row(row![
            "Symbol",
            "Market App",
            "Counter",
            "Price",
            "Total Supply",
            "Total Borrows",
            "Borrowed USD",
            "Collateral Factor",
            "Borrow APR"
        ]);

        let parameter_scale = self.protocol.parameter_scale.as_u128() as f64;
        let rate_scale = self.protocol.scale.as_u128() as f64;
        for market in &self.data.markets {
            let decimals = market.asset.underlying_decimals;
            let supply = market
                .underlying_tvl(&self.protocol)
                .map(|tvl| format_large_number(tvl as f64 / 10f64.powi(decimals as i32)))
                .unwrap_or_else(|_| "-".to_string());
            let price = market
                .asset
                .price()
                .map(|price| format!("${price:.4}"))
                .unwrap_or_else(|_| "-".to_string());
            let borrowed_usd = market
                .asset
                .to_usd_scaled(market.underlying_borrowed)
                .map(|milli_usd| format!("${}", format_large_number(Asset::usd_display(milli_usd))))
                .unwrap_or_else(|_| "-".to_string());

            table.add_row(row![
                market.symbol,
                market.app_id,
                market.market_counter,
                price,
                supply,
                format_large_number(to_display_amount(market.underlying_borrowed, decimals)),
                borrowed_usd,
                format!("{:.1}%", market.params.collateral_factor as f64 / parameter_scale * 100.0),
                format!("{:.2}%", market.total_borrow_interest_rate as f64 / rate_scale * 100.0)
            ]);
        }

        table.printstd();
    }
}

/// Wall-clock seconds used as the projection time
pub fn now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

fn load_market_data<R: LedgerReader + ?Sized>(
    reader: &R,
    network: &NetworkInfo,
) -> Result<AlgofiMarketData, LendingError> {
    let mut markets = Vec::new();
    for symbol in network.ordered_symbols(SymbolSet::Max) {
        let info = network.symbol_info(symbol)?;
        let counter = network.market_counter(symbol)?;
        markets.push(Market::load(reader, symbol, info, network.schema_version, counter)?);
    }

    let counters: Vec<u64> = markets.iter().map(|market| market.market_counter).collect();
    let manager = Manager::load(reader, network.manager_app_id, network.schema_version, &counters)?;

    let mut staking_contracts = HashMap::new();
    for (name, info) in &network.staking_contracts {
        staking_contracts.insert(
            name.clone(),
            StakingContract::load(reader, name, info, network.schema_version)?,
        );
    }

    Ok(AlgofiMarketData { manager, markets, staking_contracts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::{Ed25519Signer, TransactionSigner};
    use crate::state::keys::{manager as manager_keys, market as market_keys, tags};
    use crate::state::LedgerState;
    use crate::testing::MemoryLedger;
    use crate::transactions::OperationBody;

    const MANAGER: u64 = 100;
    const ALGO_MARKET: u64 = 201;
    const USDC_MARKET: u64 = 202;
    const STBL_MARKET: u64 = 203;
    const ORACLE: u64 = 500;
    const USDC: u64 = 10;

    const REGISTRY: &str = r#"{
        "testnet": {
            "managerAppId": 100,
            "initRound": 5000,
            "supportedMarketCount": 2,
            "maxMarketCount": 3,
            "maxAtomicOptInMarketCount": 3,
            "SYMBOLS": ["ALGO", "USDC", "STBL"],
            "SYMBOL_INFO": {
                "ALGO": {"marketAppId": 201, "underlyingAssetId": 1, "bankAssetId": 301},
                "USDC": {"marketAppId": 202, "underlyingAssetId": 10, "bankAssetId": 302},
                "STBL": {"marketAppId": 203, "underlyingAssetId": 11, "bankAssetId": 303}
            }
        }
    }"#;

    fn signer() -> Ed25519Signer {
        Ed25519Signer::from_secret_bytes(&[1u8; 32])
    }

    fn storage() -> Address {
        Address::new([2u8; 32])
    }

    fn market_state(price_field: &str, borrowed: u64) -> LedgerState {
        LedgerState::new()
            .with_uint(market_keys::COLLATERAL_FACTOR, 750)
            .with_uint(market_keys::ACTIVE_COLLATERAL, 1_000_000)
            .with_uint(market_keys::BANK_TO_UNDERLYING_EXCHANGE, 1_000_000_000)
            .with_uint(market_keys::UNDERLYING_BORROWED, borrowed)
            .with_uint(market_keys::OUTSTANDING_BORROW_SHARES, borrowed)
            .with_uint(market_keys::ORACLE_APP_ID, ORACLE)
            .with_bytes(market_keys::ORACLE_PRICE_FIELD, price_field.as_bytes().to_vec())
            .with_uint(market_keys::ORACLE_PRICE_SCALE_FACTOR, 1_000_000)
    }

    fn ledger() -> MemoryLedger {
        let user = signer().address().encode();
        let storage_account = storage().encode();
        let mut balances = AccountBalances { address: user.clone(), ..Default::default() };
        balances.balances.insert(1, 5_000_000);
        balances.balances.insert(USDC, 0);
        balances.app_ids = vec![MANAGER];

        MemoryLedger::new()
            .with_asset_decimals(USDC, 6)
            .with_asset_decimals(11, 6)
            .with_asset_decimals(301, 6)
            .with_asset_decimals(302, 6)
            .with_asset_decimals(303, 6)
            .with_global_state(
                MANAGER,
                LedgerState::new()
                    .with_uint(manager_keys::N_REWARDS_PROGRAMS, 1)
                    .with_uint(manager_keys::REWARDS_AMOUNT, 1_000_000)
                    .with_uint(manager_keys::REWARDS_PER_SECOND, 100)
                    .with_uint(manager_keys::LATEST_REWARDS_TIME, 1_000)
                    .with_uint(manager_keys::REWARDS_ASSET_ID, 1)
                    .with_uint(manager_keys::REWARDS_SECONDARY_ASSET_ID, 287867876),
            )
            .with_global_state(ALGO_MARKET, market_state("algo", 500_000))
            .with_global_state(USDC_MARKET, market_state("usdc", 500_000))
            .with_global_state(STBL_MARKET, market_state("stbl", 0))
            .with_global_state(
                ORACLE,
                LedgerState::new().with_uint("algo", 800).with_uint("usdc", 1_000).with_uint("stbl", 1_000),
            )
            .with_local_state(
                &user,
                MANAGER,
                LedgerState::new().with_bytes(manager_keys::USER_STORAGE_ADDRESS, storage().as_bytes().to_vec()),
            )
            .with_local_state(
                &storage_account,
                MANAGER,
                LedgerState::new()
                    .with_uint(manager_keys::USER_REWARDS_PROGRAM_NUMBER, 1)
                    .with_uint(manager_keys::USER_GLOBAL_MAX_BORROW_IN_DOLLARS, 400),
            )
            .with_local_state(
                &storage_account,
                ALGO_MARKET,
                LedgerState::new()
                    .with_uint(market_keys::USER_ACTIVE_COLLATERAL, 250_000)
                    .with_uint(market_keys::USER_BORROW_SHARES, 0),
            )
            .with_local_state(
                &storage_account,
                USDC_MARKET,
                LedgerState::new().with_uint(market_keys::USER_BORROW_SHARES, 100_000),
            )
            .with_balances(balances)
            .with_opted_in(ALGO_MARKET, &[storage_account.as_str(), "OTHER"])
    }

    fn client() -> AlgofiClient<MemoryLedger> {
        let registry = Registry::from_json_str(REGISTRY).unwrap();
        let network = registry.network("testnet").unwrap().clone();
        AlgofiClient::new(
            ledger(),
            "testnet",
            network,
            ProtocolParams::ALGOFI,
            Some(signer().address().encode()),
        )
        .unwrap()
    }

    #[test]
    fn test_loads_max_symbol_set() {
        let client = client();
        assert_eq!(client.markets().len(), 3);
        assert_eq!(client.active_market_app_ids(), vec![ALGO_MARKET, USDC_MARKET]);
        assert_eq!(client.active_oracle_app_ids(), vec![ORACLE, ORACLE]);
        assert_eq!(client.max_atomic_opt_in_market_app_ids().unwrap().len(), 3);
        assert_eq!(client.market("STBL").unwrap().market_counter, 3);
        assert_eq!(client.raw_prices().unwrap()["ALGO"], 800);
        assert_eq!(client.program_id(), MANAGER);
    }

    #[test]
    fn test_unknown_lookups() {
        let client = client();
        assert!(matches!(client.market("DOGE"), Err(LendingError::UnknownSymbol(_))));
        // Loaded but outside the supported set
        assert!(matches!(client.asset("STBL"), Err(LendingError::UnknownSymbol(_))));
        assert!(matches!(client.staking_contract("STBL"), Err(LendingError::UnknownStakingContract(_))));
    }

    #[test]
    fn test_user_state_and_obligations() {
        let client = client();
        let snapshot = client.user_state(None).unwrap();
        assert_eq!(snapshot.storage_address, Some(storage()));
        assert_eq!(snapshot.manager.user_global_max_borrow_in_dollars, 400);
        assert_eq!(snapshot.markets["ALGO"].active_collateral_underlying, 250_000);
        assert_eq!(snapshot.markets["USDC"].borrow_underlying, 100_000);

        let obligations = client.get_user_obligations(&signer().address().encode()).unwrap();
        assert_eq!(obligations.len(), 2);
        assert_eq!(obligations[0].obligation_type, ObligationType::Asset);
        assert_eq!(obligations[1].symbol, "USDC");
        assert_eq!(obligations[1].obligation_type, ObligationType::Liability);
    }

    #[test]
    fn test_balances_and_opt_ins() {
        let client = client();
        assert_eq!(client.user_balance(1, None).unwrap(), 5_000_000);
        assert!(client.is_opted_into_app(MANAGER, None).unwrap());
        assert!(client.is_opted_into_asset(USDC, None).unwrap());
        assert!(!client.is_opted_into_asset(11, None).unwrap());
        assert_eq!(client.storage_accounts(None).unwrap().len(), 2);
    }

    #[test]
    fn test_unrealized_rewards_split_by_borrow_usd() {
        let client = client();
        // 1_000 issued; ALGO borrows $0.400, USDC $0.500 of $0.900, each market's tvl 1_500_000
        let rewards = client.unrealized_rewards_at(None, 1_010).unwrap();
        let scale = 100_000_000_000_000u128;
        let algo = (1_000 * scale * 400 / (900 * 1_500_000)) * 250_000 / scale;
        let usdc = (1_000 * scale * 500 / (900 * 1_500_000)) * 100_000 / scale;
        assert_eq!(rewards.primary, algo + usdc);
        assert_eq!(rewards.secondary, 0);
    }

    #[test]
    fn test_print_markets_borrowed_usd() {
        let client = client();
        client.print_markets();
        // USDC market borrows 500_000 base units at $1.000
        let usdc = client.market("USDC").unwrap();
        let milli_usd = usdc.asset.to_usd_scaled(usdc.underlying_borrowed).unwrap();
        assert_eq!(milli_usd, 500);
        assert!((Asset::usd_display(milli_usd) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_prepared_borrow_is_signed_and_submitted() {
        let client = client();
        let mut group = client.prepare_borrow("USDC", 1_000, None).unwrap();
        let ops = group.operations();
        assert_eq!(ops.len(), 14);
        assert_eq!(ops[2].accounts(), &[storage()]);
        assert!(ops[12].has_tag(tags::BORROW));
        assert_eq!(ops[13].app_id(), Some(USDC_MARKET));

        group.sign_with_signer(&signer()).unwrap();
        let outcome = client.submit(&group, None).unwrap();
        assert_eq!(outcome.tx_id, "TX1");
        assert_eq!(client.ledger().submitted().len(), 1);
    }

    #[test]
    fn test_opt_in_uses_atomic_market_set() {
        let client = client();
        let group = client.prepare_opt_in(storage(), None).unwrap();
        assert_eq!(group.len(), 6);
        assert!(matches!(group.operations()[0].body, OperationBody::Payment { amount: 3_569_500, .. }));
    }

    #[test]
    fn test_claim_references_reward_assets() {
        let client = client();
        let group = client.prepare_claim_rewards(None).unwrap();
        match &group.operations()[12].body {
            OperationBody::AppCall { foreign_assets, .. } => assert_eq!(foreign_assets, &vec![287867876]),
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn test_missing_user_address() {
        let registry = Registry::from_json_str(REGISTRY).unwrap();
        let network = registry.network("testnet").unwrap().clone();
        let client = AlgofiClient::new(ledger(), "testnet", network, ProtocolParams::ALGOFI, None).unwrap();
        assert!(matches!(client.prepare_claim_rewards(None), Err(LendingError::Configuration(_))));
        assert!(matches!(
            client.storage_address(Some(&Address::new([9u8; 32]).encode())),
            Err(LendingError::NoStorageAccount(_))
        ));
    }
}
