use crate::common::client_trait::{LedgerReader, LedgerSubmitter};
use crate::state::{reader, LedgerState};
use crate::transactions::SuggestedParams;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::{AccountBalances, LendingError};
use common_rpc::{with_rpc_client, Endpoint, RpcError, RpcErrorConverter};
use log::debug;
use reqwest::blocking::Client;

/// Validity window requested for freshly built operations, in rounds
pub const DEFAULT_VALIDITY_ROUNDS: u64 = 1_000;

/// Centralized error converter for the lending client
pub struct LendingErrorConverter;

impl RpcErrorConverter<LendingError> for LendingErrorConverter {
    fn convert_error(error: RpcError) -> LendingError {
        match error {
            RpcError::RpcError(e) => LendingError::RpcError(e),
            e @ RpcError::Status { .. } => LendingError::RpcError(Box::new(e)),
            RpcError::DeserializationError(e) => LendingError::DeserializationError(e),
            RpcError::InvalidAddress(e) => LendingError::InvalidAddress(e),
            RpcError::AccountNotFound(e) => LendingError::AccountNotFound(e),
            RpcError::ApplicationNotFound(id) => LendingError::ApplicationNotFound(id),
            RpcError::RoundUnavailable(round) => LendingError::HistoricalRoundUnavailable(round),
            RpcError::Rejected(message) => LendingError::Submission(message),
        }
    }
}

/// Helper function to execute a function with a pooled HTTP client
pub fn with_pooled_client<F, R>(endpoint: &Endpoint, f: F) -> Result<R, LendingError>
where
    F: FnOnce(&Client) -> Result<R, RpcError>,
{
    with_rpc_client(&endpoint.url, f).map_err(LendingErrorConverter::convert_error)
}

/// Ledger collaborators backed by a node, an indexer and an optional archival indexer
#[derive(Debug, Clone)]
pub struct HttpLedger {
    pub algod: Endpoint,
    pub indexer: Endpoint,
    pub historical_indexer: Option<Endpoint>,
}

impl HttpLedger {
    pub fn new(algod: Endpoint, indexer: Endpoint, historical_indexer: Option<Endpoint>) -> Self {
        Self { algod, indexer, historical_indexer }
    }
}

impl LedgerReader for HttpLedger {
    fn global_state(&self, app_id: u64) -> Result<LedgerState, LendingError> {
        let app = with_pooled_client(&self.algod, |client| {
            common_rpc::get_application(client, &self.algod, app_id)
        })?;
        reader::global_state(&app)
    }

    fn local_state(&self, address: &str, app_id: u64) -> Result<LedgerState, LendingError> {
        let account = with_pooled_client(&self.algod, |client| {
            common_rpc::get_account(client, &self.algod, address)
        })?;
        reader::local_state(&account, app_id)
    }

    fn local_state_at(
        &self,
        address: &str,
        app_id: u64,
        round: u64,
    ) -> Result<LedgerState, LendingError> {
        let indexer = self
            .historical_indexer
            .as_ref()
            .ok_or(LendingError::HistoricalRoundUnavailable(round))?;
        debug!("Reading local state of {} in app {} at round {}", address, app_id, round);
        let response = with_pooled_client(indexer, |client| {
            common_rpc::get_indexer_account(client, indexer, address, Some(round))
        })?;
        reader::local_state(&response.account, app_id)
    }

    fn asset_decimals(&self, asset_id: u64) -> Result<u32, LendingError> {
        if common::asset_utils::is_native_asset(asset_id) {
            return Ok(common::asset_utils::NATIVE_DECIMALS);
        }
        let asset = with_pooled_client(&self.algod, |client| {
            common_rpc::get_asset(client, &self.algod, asset_id)
        })?;
        Ok(asset.params.decimals)
    }

    fn account_balances(&self, address: &str) -> Result<AccountBalances, LendingError> {
        let account = with_pooled_client(&self.algod, |client| {
            common_rpc::get_account(client, &self.algod, address)
        })?;
        Ok(reader::account_balances(&account))
    }

    fn suggested_params(&self) -> Result<SuggestedParams, LendingError> {
        let params = with_pooled_client(&self.algod, |client| {
            common_rpc::get_transaction_params(client, &self.algod)
        })?;
        let genesis_hash: [u8; 32] = STANDARD
            .decode(&params.genesis_hash)
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| {
                LendingError::DeserializationError(format!(
                    "Bad genesis hash {}",
                    params.genesis_hash
                ))
            })?;

        Ok(SuggestedParams {
            fee: params.fee,
            min_fee: params.min_fee,
            first_valid: params.last_round,
            last_valid: params.last_round + DEFAULT_VALIDITY_ROUNDS,
            genesis_id: params.genesis_id,
            genesis_hash,
        })
    }

    fn accounts_opted_into_app(&self, app_id: u64) -> Result<Vec<String>, LendingError> {
        let accounts = with_pooled_client(&self.indexer, |client| {
            common_rpc::get_accounts_opted_into_app(client, &self.indexer, app_id)
        })?;
        Ok(accounts.into_iter().map(|a| a.address).collect())
    }
}

impl LedgerSubmitter for HttpLedger {
    fn send_group(&self, signed_group: Vec<u8>) -> Result<String, LendingError> {
        let response = with_pooled_client(&self.algod, |client| {
            common_rpc::send_raw_transaction(client, &self.algod, signed_group)
        })?;
        Ok(response.tx_id)
    }

    fn confirmed_round(&self, tx_id: &str) -> Result<Option<u64>, LendingError> {
        let pending = with_pooled_client(&self.algod, |client| {
            common_rpc::get_pending_transaction(client, &self.algod, tx_id)
        })?;
        if !pending.pool_error.is_empty() {
            return Err(LendingError::Submission(pending.pool_error));
        }
        Ok(pending.confirmed_round.filter(|round| *round > 0))
    }

    fn last_round(&self) -> Result<u64, LendingError> {
        let status =
            with_pooled_client(&self.algod, |client| common_rpc::get_status(client, &self.algod))?;
        Ok(status.last_round)
    }

    fn wait_for_round_after(&self, round: u64) -> Result<u64, LendingError> {
        let status = with_pooled_client(&self.algod, |client| {
            common_rpc::wait_for_block_after(client, &self.algod, round)
        })?;
        Ok(status.last_round)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        assert!(matches!(
            LendingErrorConverter::convert_error(RpcError::RoundUnavailable(9)),
            LendingError::HistoricalRoundUnavailable(9)
        ));
        assert!(matches!(
            LendingErrorConverter::convert_error(RpcError::Rejected("overspend".into())),
            LendingError::Submission(m) if m == "overspend"
        ));
        assert!(matches!(
            LendingErrorConverter::convert_error(RpcError::ApplicationNotFound(3)),
            LendingError::ApplicationNotFound(3)
        ));
    }

    #[test]
    fn test_historical_read_without_archive() {
        let ledger = HttpLedger::new(
            Endpoint::new("http://localhost:4001", None),
            Endpoint::new("http://localhost:8980", None),
            None,
        );
        assert!(matches!(
            ledger.local_state_at("ADDR", 1, 77),
            Err(LendingError::HistoricalRoundUnavailable(77))
        ));
    }
}
