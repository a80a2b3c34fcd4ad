use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Header carrying the node / indexer API token
pub const API_TOKEN_HEADER: &str = "X-Algo-API-Token";

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("RPC error: {0}")]
    RpcError(#[from] Box<dyn std::error::Error + Send + Sync>),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Response deserialization error: {0}")]
    DeserializationError(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Application not found: {0}")]
    ApplicationNotFound(u64),

    #[error("Round {0} is not available")]
    RoundUnavailable(u64),

    #[error("Transaction rejected: {0}")]
    Rejected(String),
}

impl RpcError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RpcError::Status { status: 404, .. })
    }
}

/// Trait for converting RpcError to other error types
pub trait RpcErrorConverter<E> {
    /// Convert an RpcError to another error type
    fn convert_error(error: RpcError) -> E;
}

/// Builder for node / indexer REST calls
pub struct AlgodRequestBuilder<'a> {
    client: &'a Client,
    base_url: String,
    token: Option<String>,
    path: String,
    query: Vec<(String, String)>,
}

impl<'a> AlgodRequestBuilder<'a> {
    pub fn new(client: &'a Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            path: String::new(),
            query: Vec::new(),
        }
    }

    /// Set the API token sent with every request
    pub fn with_token(mut self, token: Option<&str>) -> Self {
        self.token = token.filter(|t| !t.is_empty()).map(str::to_string);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Pin the query to a past round (indexer only)
    pub fn with_round(self, round: u64) -> Self {
        self.with_query("round", round)
    }

    fn url(&self) -> String {
        format!("{}{}", self.base_url, self.path)
    }

    /// GET the path and decode the JSON body
    pub fn get_json<T: DeserializeOwned>(self) -> Result<T, RpcError> {
        let mut request = self.client.get(self.url()).query(&self.query);
        if let Some(token) = &self.token {
            request = request.header(API_TOKEN_HEADER, token);
        }
        let response = request.send().map_err(|e| RpcError::RpcError(Box::new(e)))?;
        decode_response(response)
    }

    /// POST raw bytes (application/x-binary) and decode the JSON body
    pub fn post_bytes<T: DeserializeOwned>(self, body: Vec<u8>) -> Result<T, RpcError> {
        let mut request = self
            .client
            .post(self.url())
            .query(&self.query)
            .header(CONTENT_TYPE, "application/x-binary")
            .body(body);
        if let Some(token) = &self.token {
            request = request.header(API_TOKEN_HEADER, token);
        }
        let response = request.send().map_err(|e| RpcError::RpcError(Box::new(e)))?;
        decode_response(response)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

fn decode_response<T: DeserializeOwned>(response: Response) -> Result<T, RpcError> {
    let status = response.status();
    let body = response.text().map_err(|e| RpcError::RpcError(Box::new(e)))?;

    if !status.is_success() {
        // Nodes answer with {"message": ...}; fall back to the raw body
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.message)
            .unwrap_or_else(|_| body.clone());
        return Err(RpcError::Status { status: status.as_u16(), message });
    }

    serde_json::from_str(&body).map_err(|e| RpcError::DeserializationError(e.to_string()))
}

/// Whether a status code means the requested round is out of the indexer's range
pub fn is_round_error(status: u16) -> bool {
    status == StatusCode::BAD_REQUEST.as_u16() || status == StatusCode::NOT_FOUND.as_u16()
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// One entry of a global or local key/value store; key and bytes are base64
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TealKeyValue {
    pub key: String,
    pub value: TealValue,
}

/// `type` 1 is a byte string, 2 an unsigned integer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TealValue {
    #[serde(rename = "type")]
    pub value_type: u8,
    #[serde(default)]
    pub bytes: String,
    #[serde(default)]
    pub uint: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationResponse {
    pub id: u64,
    pub params: ApplicationParams,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationParams {
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(rename = "global-state", default)]
    pub global_state: Vec<TealKeyValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetHolding {
    #[serde(rename = "asset-id")]
    pub asset_id: u64,
    pub amount: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationLocalState {
    pub id: u64,
    #[serde(rename = "key-value", default)]
    pub key_value: Vec<TealKeyValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountResponse {
    pub address: String,
    pub amount: u64,
    #[serde(default)]
    pub assets: Vec<AssetHolding>,
    #[serde(rename = "apps-local-state", default)]
    pub apps_local_state: Vec<ApplicationLocalState>,
    #[serde(rename = "auth-addr", default)]
    pub auth_addr: Option<String>,
}

impl AccountResponse {
    pub fn local_state(&self, app_id: u64) -> Option<&[TealKeyValue]> {
        self.apps_local_state.iter().find(|s| s.id == app_id).map(|s| s.key_value.as_slice())
    }
}

/// Indexer wrapper around an account lookup
#[derive(Debug, Clone, Deserialize)]
pub struct IndexerAccountResponse {
    pub account: AccountResponse,
    #[serde(rename = "current-round")]
    pub current_round: u64,
}

/// One page of indexer account search results
#[derive(Debug, Clone, Deserialize)]
pub struct AccountsPage {
    #[serde(default)]
    pub accounts: Vec<AccountResponse>,
    #[serde(rename = "next-token", default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetResponse {
    pub index: u64,
    pub params: AssetParams,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetParams {
    pub decimals: u32,
    #[serde(rename = "unit-name", default)]
    pub unit_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionParamsResponse {
    #[serde(rename = "consensus-version", default)]
    pub consensus_version: String,
    pub fee: u64,
    /// base64 encoded 32-byte genesis hash
    #[serde(rename = "genesis-hash")]
    pub genesis_hash: String,
    #[serde(rename = "genesis-id")]
    pub genesis_id: String,
    #[serde(rename = "last-round")]
    pub last_round: u64,
    #[serde(rename = "min-fee")]
    pub min_fee: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PendingTransactionResponse {
    #[serde(rename = "confirmed-round", default)]
    pub confirmed_round: Option<u64>,
    #[serde(rename = "pool-error", default)]
    pub pool_error: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeStatusResponse {
    #[serde(rename = "last-round")]
    pub last_round: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostTransactionsResponse {
    #[serde(rename = "txId")]
    pub tx_id: String,
}

// ---------------------------------------------------------------------------
// Typed endpoints
// ---------------------------------------------------------------------------

/// Base url and token of one node or indexer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub url: String,
    pub token: Option<String>,
}

impl Endpoint {
    pub fn new(url: impl Into<String>, token: Option<String>) -> Self {
        Self { url: url.into(), token }
    }

    pub fn request<'a>(&self, client: &'a Client) -> AlgodRequestBuilder<'a> {
        AlgodRequestBuilder::new(client, &self.url).with_token(self.token.as_deref())
    }
}

pub fn get_application(
    client: &Client,
    node: &Endpoint,
    app_id: u64,
) -> Result<ApplicationResponse, RpcError> {
    node.request(client)
        .with_path(format!("/v2/applications/{app_id}"))
        .get_json()
        .map_err(|e| if e.is_not_found() { RpcError::ApplicationNotFound(app_id) } else { e })
}

pub fn get_account(
    client: &Client,
    node: &Endpoint,
    address: &str,
) -> Result<AccountResponse, RpcError> {
    node.request(client)
        .with_path(format!("/v2/accounts/{address}"))
        .get_json()
        .map_err(|e| if e.is_not_found() { RpcError::AccountNotFound(address.to_string()) } else { e })
}

/// Account snapshot from the indexer, optionally at a past round
pub fn get_indexer_account(
    client: &Client,
    indexer: &Endpoint,
    address: &str,
    round: Option<u64>,
) -> Result<IndexerAccountResponse, RpcError> {
    let mut request = indexer
        .request(client)
        .with_path(format!("/v2/accounts/{address}"))
        .with_query("include-all", true);
    if let Some(round) = round {
        request = request.with_round(round);
    }
    request.get_json().map_err(|e| match (e, round) {
        (RpcError::Status { status, .. }, Some(round)) if is_round_error(status) => {
            RpcError::RoundUnavailable(round)
        }
        (e, None) if e.is_not_found() => RpcError::AccountNotFound(address.to_string()),
        (e, _) => e,
    })
}

pub fn get_asset(client: &Client, node: &Endpoint, asset_id: u64) -> Result<AssetResponse, RpcError> {
    node.request(client).with_path(format!("/v2/assets/{asset_id}")).get_json()
}

pub fn get_transaction_params(
    client: &Client,
    node: &Endpoint,
) -> Result<TransactionParamsResponse, RpcError> {
    node.request(client).with_path("/v2/transactions/params").get_json()
}

pub fn get_status(client: &Client, node: &Endpoint) -> Result<NodeStatusResponse, RpcError> {
    node.request(client).with_path("/v2/status").get_json()
}

/// Blocks on the node until a round after `round` is committed
pub fn wait_for_block_after(
    client: &Client,
    node: &Endpoint,
    round: u64,
) -> Result<NodeStatusResponse, RpcError> {
    node.request(client).with_path(format!("/v2/status/wait-for-block-after/{round}")).get_json()
}

pub fn get_pending_transaction(
    client: &Client,
    node: &Endpoint,
    tx_id: &str,
) -> Result<PendingTransactionResponse, RpcError> {
    node.request(client).with_path(format!("/v2/transactions/pending/{tx_id}")).get_json()
}

/// Submit a concatenation of signed msgpack transactions
pub fn send_raw_transaction(
    client: &Client,
    node: &Endpoint,
    signed_group: Vec<u8>,
) -> Result<PostTransactionsResponse, RpcError> {
    node.request(client).with_path("/v2/transactions").post_bytes(signed_group).map_err(|e| match e {
        RpcError::Status { message, .. } => RpcError::Rejected(message),
        e => e,
    })
}
