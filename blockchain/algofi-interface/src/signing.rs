use crate::common::Address;
use crate::transactions::{encoding, Operation};
use common::LendingError;
use ed25519_dalek::{Signer, SigningKey};

/// Produces signatures for operations sent from one address
pub trait TransactionSigner {
    fn address(&self) -> Address;

    fn sign(&self, operation: &Operation) -> Result<[u8; 64], LendingError>;
}

/// In-process ed25519 key
#[derive(Clone)]
pub struct Ed25519Signer {
    key: SigningKey,
}

impl Ed25519Signer {
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    pub fn from_secret_bytes(secret: &[u8; 32]) -> Self {
        Self::new(SigningKey::from_bytes(secret))
    }

    pub fn generate() -> Self {
        Self::new(SigningKey::generate(&mut rand::rngs::OsRng))
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.key
    }
}

impl TransactionSigner for Ed25519Signer {
    fn address(&self) -> Address {
        Address::new(self.key.verifying_key().to_bytes())
    }

    fn sign(&self, operation: &Operation) -> Result<[u8; 64], LendingError> {
        Ok(self.key.sign(&encoding::signing_payload(operation)).to_bytes())
    }
}

impl std::fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519Signer").field("address", &self.address()).finish()
    }
}
