use common::LendingError;
use common_rpc::Endpoint;
use std::env;

/// Connection settings read from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub network: String,
    pub registry_path: String,
    pub algod: Endpoint,
    pub indexer: Endpoint,
    pub historical_indexer: Option<Endpoint>,
    pub user_address: Option<String>,
}

impl ClientConfig {
    pub const DEFAULT_NETWORK: &'static str = "testnet";
    pub const DEFAULT_REGISTRY_PATH: &'static str = "contracts.json";

    /// Reads `ALGOD_URL`, `ALGOD_TOKEN`, `INDEXER_URL`, `INDEXER_TOKEN`,
    /// `HISTORICAL_INDEXER_URL`, `NETWORK`, `REGISTRY_PATH` and `USER_ADDRESS`
    pub fn from_env() -> Result<Self, LendingError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LendingError> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| LendingError::Configuration(format!("Missing {key} environment variable")))
        };

        let algod = Endpoint::new(required("ALGOD_URL")?, lookup("ALGOD_TOKEN"));
        let indexer = Endpoint::new(required("INDEXER_URL")?, lookup("INDEXER_TOKEN"));
        let historical_indexer = lookup("HISTORICAL_INDEXER_URL")
            .filter(|v| !v.is_empty())
            .map(|url| Endpoint::new(url, lookup("INDEXER_TOKEN")));

        Ok(Self {
            network: lookup("NETWORK").unwrap_or_else(|| Self::DEFAULT_NETWORK.to_string()),
            registry_path: lookup("REGISTRY_PATH")
                .unwrap_or_else(|| Self::DEFAULT_REGISTRY_PATH.to_string()),
            algod,
            indexer,
            historical_indexer,
            user_address: lookup("USER_ADDRESS").filter(|v| !v.is_empty()),
        })
    }
}
