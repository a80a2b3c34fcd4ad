use crate::common::LedgerSubmitter;
use crate::math::ProtocolParams;
use crate::signing::{Ed25519Signer, TransactionSigner};
use crate::transactions::encoding;
use crate::transactions::operation::Operation;
use common::LendingError;
use ed25519_dalek::SigningKey;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Bounds of the confirmation wait after submission
#[derive(Debug, Clone)]
pub struct WaitOptions {
    /// Rounds to wait past the submission round
    pub max_rounds: u64,
    /// Wall-clock limit of the whole wait
    pub timeout: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Set to abandon the wait
    pub cancel: Arc<AtomicBool>,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            max_rounds: 10,
            timeout: Duration::from_secs(60),
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(4),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub tx_id: String,
    /// Set when the submission waited for confirmation
    pub confirmed_round: Option<u64>,
}

/// Ordered operations sharing one group id, with one signature slot each
#[derive(Debug, Clone)]
pub struct TransactionGroup {
    operations: Vec<Operation>,
    signatures: Vec<Option<[u8; 64]>>,
    group_id: [u8; 32],
}

impl TransactionGroup {
    pub fn new(operations: Vec<Operation>) -> Result<Self, LendingError> {
        Self::with_max_size(operations, ProtocolParams::MAX_GROUP_SIZE)
    }

    /// Stamp every operation with the id of the whole list
    pub fn with_max_size(
        mut operations: Vec<Operation>,
        max_size: usize,
    ) -> Result<Self, LendingError> {
        if operations.is_empty() {
            return Err(LendingError::InvalidGroup("empty group".to_string()));
        }
        if operations.len() > max_size {
            return Err(LendingError::InvalidGroup(format!(
                "{} operations exceed the group limit of {}",
                operations.len(),
                max_size
            )));
        }

        for op in operations.iter_mut() {
            op.group = None;
        }
        let ids: Vec<[u8; 32]> = operations.iter().map(Operation::raw_id).collect();
        let group_id = encoding::group_id(&ids);
        for op in operations.iter_mut() {
            op.group = Some(group_id);
        }

        let signatures = vec![None; operations.len()];
        Ok(Self { operations, signatures, group_id })
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn group_id(&self) -> [u8; 32] {
        self.group_id
    }

    pub fn is_signed(&self, position: usize) -> bool {
        self.signatures.get(position).is_some_and(Option::is_some)
    }

    pub fn unsigned_positions(&self) -> Vec<usize> {
        self.signatures.iter().enumerate().filter(|(_, s)| s.is_none()).map(|(i, _)| i).collect()
    }

    pub fn is_fully_signed(&self) -> bool {
        self.signatures.iter().all(Option::is_some)
    }

    /// Sign every operation whose sender is the signer's address; returns the number signed
    pub fn sign_with_signer(&mut self, signer: &dyn TransactionSigner) -> Result<usize, LendingError> {
        let address = signer.address();
        let mut signed = 0;
        for (op, slot) in self.operations.iter().zip(self.signatures.iter_mut()) {
            if op.sender == address {
                *slot = Some(signer.sign(op)?);
                signed += 1;
            }
        }
        debug!("Signed {} of {} operations as {}", signed, self.operations.len(), address);
        Ok(signed)
    }

    /// Sign positionally, one signer per operation
    ///
    /// A signer whose address is not the operation's sender leaves that slot
    /// unsigned; submission then refuses the group.
    pub fn sign_with_signers(
        &mut self,
        signers: &[&dyn TransactionSigner],
    ) -> Result<usize, LendingError> {
        if signers.len() != self.operations.len() {
            return Err(LendingError::SignatureCountMismatch {
                expected: self.operations.len(),
                actual: signers.len(),
            });
        }

        let mut signed = 0;
        for (position, ((op, slot), signer)) in
            self.operations.iter().zip(self.signatures.iter_mut()).zip(signers).enumerate()
        {
            let address = signer.address();
            if op.sender != address {
                warn!(
                    "Signer {} does not match sender {} of operation {}; slot left unsigned",
                    address, op.sender, position
                );
                continue;
            }
            *slot = Some(signer.sign(op)?);
            signed += 1;
        }
        Ok(signed)
    }

    pub fn sign_with_private_key(&mut self, key: &SigningKey) -> Result<usize, LendingError> {
        self.sign_with_signer(&Ed25519Signer::new(key.clone()))
    }

    pub fn sign_with_private_keys(&mut self, keys: &[SigningKey]) -> Result<usize, LendingError> {
        let signers: Vec<Ed25519Signer> = keys.iter().cloned().map(Ed25519Signer::new).collect();
        let refs: Vec<&dyn TransactionSigner> =
            signers.iter().map(|s| s as &dyn TransactionSigner).collect();
        self.sign_with_signers(&refs)
    }

    /// Concatenated signed envelopes; every slot must be signed
    pub fn encode_signed(&self) -> Result<Vec<u8>, LendingError> {
        let mut out = Vec::new();
        for (position, (op, signature)) in self.operations.iter().zip(&self.signatures).enumerate() {
            let signature = signature.ok_or(LendingError::UnsignedOperation(position))?;
            out.extend_from_slice(&encoding::encode_signed(op, &signature));
        }
        Ok(out)
    }

    /// Submit the signed group; with `wait` poll until confirmed or the wait bound is hit
    pub fn submit<S: LedgerSubmitter + ?Sized>(
        &self,
        submitter: &S,
        wait: Option<&WaitOptions>,
    ) -> Result<SubmitOutcome, LendingError> {
        let encoded = self.encode_signed()?;
        let tx_id = submitter.send_group(encoded)?;
        info!("Submitted group of {} operations, tx id {}", self.len(), tx_id);

        let confirmed_round = match wait {
            Some(options) => Some(wait_for_confirmation(submitter, &tx_id, options)?),
            None => None,
        };
        Ok(SubmitOutcome { tx_id, confirmed_round })
    }
}

/// Poll round by round until `tx_id` is confirmed, cancelled or out of budget
pub fn wait_for_confirmation<S: LedgerSubmitter + ?Sized>(
    submitter: &S,
    tx_id: &str,
    options: &WaitOptions,
) -> Result<u64, LendingError> {
    let started = Instant::now();
    let start_round = submitter.last_round()?;
    let mut last_round = start_round;
    let mut backoff = options.initial_backoff;

    loop {
        if options.cancel.load(Ordering::SeqCst) {
            return Err(LendingError::ConfirmationCancelled(tx_id.to_string()));
        }
        if let Some(round) = submitter.confirmed_round(tx_id)? {
            info!("Transaction {} confirmed in round {}", tx_id, round);
            return Ok(round);
        }

        let waited = last_round.saturating_sub(start_round);
        if waited >= options.max_rounds || started.elapsed() >= options.timeout {
            return Err(LendingError::ConfirmationTimeout { tx_id: tx_id.to_string(), rounds: waited });
        }

        debug!("Waiting for confirmation of {} after round {}", tx_id, last_round);
        let next_round = submitter.wait_for_round_after(last_round)?;
        if next_round > last_round {
            last_round = next_round;
            backoff = options.initial_backoff;
        } else {
            // Node returned without a new round
            std::thread::sleep(backoff);
            backoff = (backoff * 2).min(options.max_backoff);
        }
    }
}
