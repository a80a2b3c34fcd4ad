//! Testing utilities for the lending client
//!
//! Provides fixed chain parameters and an in-memory ledger implementing both
//! ledger collaborators, so entities, the client and submission can be driven
//! without a node.

use crate::common::{LedgerReader, LedgerSubmitter};
use crate::state::LedgerState;
use crate::transactions::SuggestedParams;
use common::{AccountBalances, LendingError};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Chain parameters stamped on operations built in tests
pub fn suggested_params() -> SuggestedParams {
    SuggestedParams {
        fee: 0,
        min_fee: 1_000,
        first_valid: 1_000,
        last_valid: 2_000,
        genesis_id: "testnet-v1.0".to_string(),
        genesis_hash: [7u8; 32],
    }
}

#[derive(Debug, Default)]
struct SubmissionState {
    round: u64,
    submitted: Vec<Vec<u8>>,
    /// tx id -> round it confirms in
    confirmations: HashMap<String, u64>,
}

/// Ledger held entirely in memory
#[derive(Debug)]
pub struct MemoryLedger {
    globals: HashMap<u64, LedgerState>,
    locals: HashMap<(String, u64), LedgerState>,
    historical_locals: HashMap<(String, u64, u64), LedgerState>,
    decimals: HashMap<u64, u32>,
    balances: HashMap<String, AccountBalances>,
    opted_in: HashMap<u64, Vec<String>>,
    params: SuggestedParams,
    /// Rounds between submission and confirmation; `None` never confirms
    confirmation_delay: Option<u64>,
    rejection: Option<String>,
    stalled: bool,
    state: Mutex<SubmissionState>,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            globals: HashMap::new(),
            locals: HashMap::new(),
            historical_locals: HashMap::new(),
            decimals: HashMap::new(),
            balances: HashMap::new(),
            opted_in: HashMap::new(),
            params: suggested_params(),
            confirmation_delay: Some(1),
            rejection: None,
            stalled: false,
            state: Mutex::new(SubmissionState { round: 1_000, ..Default::default() }),
        }
    }

    pub fn with_global_state(mut self, app_id: u64, state: LedgerState) -> Self {
        self.globals.insert(app_id, state);
        self
    }

    pub fn with_local_state(mut self, address: &str, app_id: u64, state: LedgerState) -> Self {
        self.locals.insert((address.to_string(), app_id), state);
        self
    }

    pub fn with_local_state_at(
        mut self,
        address: &str,
        app_id: u64,
        round: u64,
        state: LedgerState,
    ) -> Self {
        self.historical_locals.insert((address.to_string(), app_id, round), state);
        self
    }

    pub fn with_asset_decimals(mut self, asset_id: u64, decimals: u32) -> Self {
        self.decimals.insert(asset_id, decimals);
        self
    }

    pub fn with_balances(mut self, balances: AccountBalances) -> Self {
        self.balances.insert(balances.address.clone(), balances);
        self
    }

    pub fn with_opted_in(mut self, app_id: u64, addresses: &[&str]) -> Self {
        self.opted_in.insert(app_id, addresses.iter().map(|a| a.to_string()).collect());
        self
    }

    pub fn with_confirmation_delay(mut self, rounds: Option<u64>) -> Self {
        self.confirmation_delay = rounds;
        self
    }

    /// Reject every submission with `message`
    pub fn with_rejection(mut self, message: &str) -> Self {
        self.rejection = Some(message.to_string());
        self
    }

    /// Never advance the round while waiting
    pub fn with_stalled_rounds(mut self) -> Self {
        self.stalled = true;
        self
    }

    /// Encoded groups received so far
    pub fn submitted(&self) -> Vec<Vec<u8>> {
        self.lock().submitted.clone()
    }

    pub fn round(&self) -> u64 {
        self.lock().round
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SubmissionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LedgerReader for MemoryLedger {
    fn global_state(&self, app_id: u64) -> Result<LedgerState, LendingError> {
        self.globals.get(&app_id).cloned().ok_or(LendingError::ApplicationNotFound(app_id))
    }

    fn local_state(&self, address: &str, app_id: u64) -> Result<LedgerState, LendingError> {
        Ok(self.locals.get(&(address.to_string(), app_id)).cloned().unwrap_or_default())
    }

    fn local_state_at(
        &self,
        address: &str,
        app_id: u64,
        round: u64,
    ) -> Result<LedgerState, LendingError> {
        self.historical_locals
            .get(&(address.to_string(), app_id, round))
            .cloned()
            .ok_or(LendingError::HistoricalRoundUnavailable(round))
    }

    fn asset_decimals(&self, asset_id: u64) -> Result<u32, LendingError> {
        if common::asset_utils::is_native_asset(asset_id) {
            return Ok(common::asset_utils::NATIVE_DECIMALS);
        }
        self.decimals.get(&asset_id).copied().ok_or_else(|| {
            LendingError::DeserializationError(format!("Unknown asset {asset_id}"))
        })
    }

    fn account_balances(&self, address: &str) -> Result<AccountBalances, LendingError> {
        self.balances
            .get(address)
            .cloned()
            .ok_or_else(|| LendingError::AccountNotFound(address.to_string()))
    }

    fn suggested_params(&self) -> Result<SuggestedParams, LendingError> {
        Ok(self.params.clone())
    }

    fn accounts_opted_into_app(&self, app_id: u64) -> Result<Vec<String>, LendingError> {
        Ok(self.opted_in.get(&app_id).cloned().unwrap_or_default())
    }
}

impl LedgerSubmitter for MemoryLedger {
    fn send_group(&self, signed_group: Vec<u8>) -> Result<String, LendingError> {
        if let Some(message) = &self.rejection {
            return Err(LendingError::Submission(message.clone()));
        }
        let mut state = self.lock();
        state.submitted.push(signed_group);
        let tx_id = format!("TX{}", state.submitted.len());
        if let Some(delay) = self.confirmation_delay {
            let confirm_round = state.round + delay;
            state.confirmations.insert(tx_id.clone(), confirm_round);
        }
        Ok(tx_id)
    }

    fn confirmed_round(&self, tx_id: &str) -> Result<Option<u64>, LendingError> {
        let state = self.lock();
        Ok(state.confirmations.get(tx_id).copied().filter(|round| *round <= state.round))
    }

    fn last_round(&self) -> Result<u64, LendingError> {
        Ok(self.lock().round)
    }

    fn wait_for_round_after(&self, round: u64) -> Result<u64, LendingError> {
        let mut state = self.lock();
        if !self.stalled && state.round <= round {
            state.round = round + 1;
        }
        Ok(state.round)
    }
}
