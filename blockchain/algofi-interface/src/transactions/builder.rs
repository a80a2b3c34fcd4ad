use crate::common::Address;
use crate::math::ProtocolParams;
use crate::state::keys::tags;
use crate::transactions::group::TransactionGroup;
use crate::transactions::kind::OperationKind;
use crate::transactions::operation::{Operation, SuggestedParams};
use crate::transactions::prepend::{prefix_operations, random_note, PrefixContext};
use common::LendingError;
use log::debug;

/// Builder for prefixed protocol groups: refresh triple, fillers, payload
pub struct GroupBuilder<'a> {
    kind: OperationKind,
    sender: Address,
    params: &'a SuggestedParams,
    protocol: ProtocolParams,
    manager_app_id: u64,
    market_app_ids: Vec<u64>,
    oracle_app_ids: Vec<u64>,
    storage_account: Address,
    note: Option<[u8; 8]>,
    payload: Vec<Operation>,
}

impl<'a> GroupBuilder<'a> {
    pub fn new(kind: OperationKind, sender: Address, params: &'a SuggestedParams) -> Self {
        Self {
            kind,
            sender,
            params,
            protocol: ProtocolParams::default(),
            manager_app_id: 0,
            market_app_ids: Vec::new(),
            oracle_app_ids: Vec::new(),
            storage_account: Address::ZERO,
            note: None,
            payload: Vec::new(),
        }
    }

    pub fn with_protocol_params(mut self, protocol: ProtocolParams) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn with_manager(mut self, manager_app_id: u64) -> Self {
        self.manager_app_id = manager_app_id;
        self
    }

    pub fn with_markets(mut self, market_app_ids: &[u64]) -> Self {
        self.market_app_ids = market_app_ids.to_vec();
        self
    }

    pub fn with_oracles(mut self, oracle_app_ids: &[u64]) -> Self {
        self.oracle_app_ids = oracle_app_ids.to_vec();
        self
    }

    /// Storage account the refresh prefix settles
    pub fn with_storage_account(mut self, storage_account: Address) -> Self {
        self.storage_account = storage_account;
        self
    }

    /// Fix the `fetch_market_variables` nonce instead of drawing one
    pub fn with_note_nonce(mut self, nonce: u64) -> Self {
        self.note = Some(nonce.to_be_bytes());
        self
    }

    pub fn with_payload(mut self, payload: Vec<Operation>) -> Self {
        self.payload = payload;
        self
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn sender(&self) -> Address {
        self.sender
    }

    pub fn params(&self) -> &'a SuggestedParams {
        self.params
    }

    pub fn manager_app_id(&self) -> u64 {
        self.manager_app_id
    }

    pub fn protocol(&self) -> &ProtocolParams {
        &self.protocol
    }

    pub fn baseline_fee(&self) -> u64 {
        self.protocol.baseline_fee
    }

    /// Assemble, validate and group the operations
    pub fn build(self) -> Result<TransactionGroup, LendingError> {
        let ctx = PrefixContext {
            sender: self.sender,
            params: self.params,
            manager_app_id: self.manager_app_id,
            market_app_ids: &self.market_app_ids,
            oracle_app_ids: &self.oracle_app_ids,
            storage_account: self.storage_account,
        };
        let note = self.note.unwrap_or_else(random_note);
        let mut operations = prefix_operations(self.kind, &ctx, &self.protocol, note);
        operations.extend(self.payload);

        validate_layout(self.kind, &operations, &self.protocol, self.manager_app_id)?;
        debug!("Built {} group with {} operations", self.kind, operations.len());

        TransactionGroup::with_max_size(operations, self.protocol.max_group_size)
    }
}

/// Reject any group that is not refresh triple, fillers, then the kind's payload
pub fn validate_layout(
    kind: OperationKind,
    operations: &[Operation],
    protocol: &ProtocolParams,
    manager_app_id: u64,
) -> Result<(), LendingError> {
    let prefix_len = 3 + protocol.filler_count;
    let expected = prefix_len + kind.payload_len();
    if operations.len() != expected {
        return Err(LendingError::InvalidGroup(format!(
            "{kind} expects {expected} operations, got {}",
            operations.len()
        )));
    }
    if operations.len() > protocol.max_group_size {
        return Err(LendingError::InvalidGroup(format!(
            "{} operations exceed the group limit of {}",
            operations.len(),
            protocol.max_group_size
        )));
    }

    let refresh = [tags::FETCH_MARKET_VARIABLES, tags::UPDATE_PRICES, tags::UPDATE_PROTOCOL_DATA];
    let fillers = tags::FILLERS.iter().take(protocol.filler_count).copied();
    for (position, tag) in refresh.into_iter().chain(fillers).enumerate() {
        let op = &operations[position];
        if !op.has_tag(tag) || op.app_id() != Some(manager_app_id) {
            return Err(LendingError::InvalidGroup(format!(
                "operation {position} must be the manager's {tag} call"
            )));
        }
    }

    let update_fee = protocol.baseline_fee * kind.fee_multiplier();
    if operations[1].fee != update_fee {
        return Err(LendingError::InvalidGroup(format!(
            "{} fee must be {update_fee} for {kind}, got {}",
            tags::UPDATE_PRICES,
            operations[1].fee
        )));
    }

    // Refresh and filler tags only belong in the prefix
    for (position, op) in operations.iter().enumerate().skip(prefix_len) {
        let misplaced = refresh
            .iter()
            .chain(tags::FILLERS.iter())
            .any(|tag| op.app_id() == Some(manager_app_id) && op.has_tag(tag));
        if misplaced {
            return Err(LendingError::InvalidGroup(format!(
                "operation {position} repeats a prefix call inside the payload"
            )));
        }
    }

    Ok(())
}
