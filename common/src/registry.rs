//! Static protocol registry: network name to application ids, symbol ordering and
//! staking contract descriptors. Loaded once, never mutated.

use crate::LendingError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Generation of the on-chain state layout a network runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    /// Borrow-USD weighted rewards, registry-ordered market counters
    #[default]
    V1,
    /// Bitmap/nibble weighted rewards, market counters stored on chain
    V2,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolInfo {
    #[serde(rename = "marketAppId")]
    pub market_app_id: u64,
    #[serde(rename = "underlyingAssetId")]
    pub underlying_asset_id: u64,
    #[serde(rename = "bankAssetId")]
    pub bank_asset_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingContractInfo {
    #[serde(rename = "managerAppId")]
    pub manager_app_id: u64,
    #[serde(rename = "marketAppId")]
    pub market_app_id: u64,
    #[serde(rename = "underlyingAssetId")]
    pub underlying_asset_id: u64,
    #[serde(rename = "bankAssetId")]
    pub bank_asset_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
    #[serde(rename = "managerAppId")]
    pub manager_app_id: u64,
    #[serde(rename = "initRound")]
    pub init_round: u64,
    #[serde(rename = "schemaVersion", default)]
    pub schema_version: SchemaVersion,
    #[serde(rename = "supportedMarketCount")]
    pub supported_market_count: usize,
    #[serde(rename = "maxMarketCount")]
    pub max_market_count: usize,
    #[serde(rename = "maxAtomicOptInMarketCount")]
    pub max_atomic_opt_in_market_count: usize,
    #[serde(rename = "SYMBOLS")]
    pub symbols: Vec<String>,
    #[serde(rename = "SYMBOL_INFO")]
    pub symbol_info: HashMap<String, SymbolInfo>,
    #[serde(rename = "STAKING_CONTRACTS", default)]
    pub staking_contracts: HashMap<String, StakingContractInfo>,
}

/// Which slice of the ordered symbol list to return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolSet {
    /// Markets currently open for use
    Supported,
    /// Every market the manager knows about
    Max,
    /// Markets a storage account can opt into within one group
    MaxAtomicOptIn,
}

impl NetworkInfo {
    pub fn ordered_symbols(&self, set: SymbolSet) -> &[String] {
        let count = match set {
            SymbolSet::Supported => self.supported_market_count,
            SymbolSet::Max => self.max_market_count,
            SymbolSet::MaxAtomicOptIn => self.max_atomic_opt_in_market_count,
        };
        &self.symbols[..count.min(self.symbols.len())]
    }

    pub fn symbol_info(&self, symbol: &str) -> Result<&SymbolInfo, LendingError> {
        self.symbol_info.get(symbol).ok_or_else(|| LendingError::UnknownSymbol(symbol.to_string()))
    }

    pub fn market_app_id(&self, symbol: &str) -> Result<u64, LendingError> {
        self.symbol_info(symbol).map(|info| info.market_app_id)
    }

    /// 1-based position of a symbol in the registry ordering
    pub fn market_counter(&self, symbol: &str) -> Result<u64, LendingError> {
        self.symbols
            .iter()
            .position(|s| s == symbol)
            .map(|index| index as u64 + 1)
            .ok_or_else(|| LendingError::UnknownSymbol(symbol.to_string()))
    }

    pub fn staking_contract(&self, name: &str) -> Result<&StakingContractInfo, LendingError> {
        self.staking_contracts
            .get(name)
            .ok_or_else(|| LendingError::UnknownStakingContract(name.to_string()))
    }

    fn validate(&self, network: &str) -> Result<(), LendingError> {
        for symbol in &self.symbols {
            if !self.symbol_info.contains_key(symbol) {
                return Err(LendingError::Configuration(format!(
                    "{network}: symbol {symbol} has no SYMBOL_INFO entry"
                )));
            }
        }
        if self.supported_market_count > self.max_market_count {
            return Err(LendingError::Configuration(format!(
                "{network}: supportedMarketCount exceeds maxMarketCount"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry {
    networks: HashMap<String, NetworkInfo>,
}

impl Registry {
    pub fn from_json_str(json: &str) -> Result<Self, LendingError> {
        let registry: Registry = serde_json::from_str(json)
            .map_err(|e| LendingError::Configuration(format!("Invalid registry: {e}")))?;
        for (network, info) in &registry.networks {
            info.validate(network)?;
        }
        Ok(registry)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LendingError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            LendingError::Configuration(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    pub fn network(&self, name: &str) -> Result<&NetworkInfo, LendingError> {
        self.networks.get(name).ok_or_else(|| LendingError::UnknownNetwork(name.to_string()))
    }

    pub fn networks(&self) -> impl Iterator<Item = &str> {
        self.networks.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTRY: &str = r#"{
        "testnet": {
            "managerAppId": 100,
            "initRound": 5000,
            "schemaVersion": "v2",
            "supportedMarketCount": 2,
            "maxMarketCount": 3,
            "maxAtomicOptInMarketCount": 3,
            "SYMBOLS": ["ALGO", "USDC", "STBL"],
            "SYMBOL_INFO": {
                "ALGO": {"marketAppId": 201, "underlyingAssetId": 1, "bankAssetId": 301},
                "USDC": {"marketAppId": 202, "underlyingAssetId": 10, "bankAssetId": 302},
                "STBL": {"marketAppId": 203, "underlyingAssetId": 11, "bankAssetId": 303}
            },
            "STAKING_CONTRACTS": {
                "STBL": {"managerAppId": 400, "marketAppId": 401, "underlyingAssetId": 11, "bankAssetId": 402}
            }
        }
    }"#;

    #[test]
    fn test_symbol_sets() {
        let registry = Registry::from_json_str(REGISTRY).unwrap();
        let network = registry.network("testnet").unwrap();
        assert_eq!(network.schema_version, SchemaVersion::V2);
        assert_eq!(network.ordered_symbols(SymbolSet::Supported), ["ALGO", "USDC"]);
        assert_eq!(network.ordered_symbols(SymbolSet::Max).len(), 3);
        assert_eq!(network.market_counter("STBL").unwrap(), 3);
        assert_eq!(network.staking_contract("STBL").unwrap().market_app_id, 401);
    }

    #[test]
    fn test_unknown_entries_are_configuration_faults() {
        let registry = Registry::from_json_str(REGISTRY).unwrap();
        assert!(matches!(registry.network("mainnet"), Err(LendingError::UnknownNetwork(_))));
        let network = registry.network("testnet").unwrap();
        assert!(matches!(network.market_app_id("DOGE"), Err(LendingError::UnknownSymbol(_))));
        assert!(matches!(
            network.staking_contract("ALGO"),
            Err(LendingError::UnknownStakingContract(_))
        ));
    }

    #[test]
    fn test_missing_symbol_info_is_rejected() {
        let broken = REGISTRY.replace(r#""STBL": {"marketAppId": 203, "underlyingAssetId": 11, "bankAssetId": 303}"#, r#""XYZ": {"marketAppId": 203, "underlyingAssetId": 11, "bankAssetId": 303}"#);
        assert!(matches!(Registry::from_json_str(&broken), Err(LendingError::Configuration(_))));
    }
}
