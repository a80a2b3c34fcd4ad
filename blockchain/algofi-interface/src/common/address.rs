use common::LendingError;
use sha2::{Digest, Sha512_256};
use std::fmt;
use std::str::FromStr;

const BASE32_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";
const CHECKSUM_LEN: usize = 4;
const APP_ID_PREFIX: &[u8] = b"appID";

/// SHA-512/256 over the concatenation of `parts`
pub fn sha512_256(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha512_256::new();
    for part in parts {
        hasher.update(part);
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// RFC 4648 base32 without padding
pub fn base32_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity((bytes.len() * 8).div_ceil(5));
    let mut buffer: u32 = 0;
    let mut bits = 0;

    for &byte in bytes {
        buffer = (buffer << 8) | byte as u32;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(BASE32_ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(BASE32_ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize] as char);
    }
    out
}

/// Inverse of [`base32_encode`]; trailing bits that do not fill a byte are dropped
pub fn base32_decode(text: &str) -> Result<Vec<u8>, LendingError> {
    let mut out = Vec::with_capacity(text.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits = 0;

    for c in text.trim_end_matches('=').bytes() {
        let value = BASE32_ALPHABET
            .iter()
            .position(|&a| a == c)
            .ok_or_else(|| LendingError::InvalidAddress(format!("Invalid base32 character {:?}", c as char)))?;
        buffer = (buffer << 5) | value as u32;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((buffer >> bits) as u8);
        }
        buffer &= (1 << bits) - 1;
    }
    Ok(out)
}

/// A 32-byte ledger account, displayed as base32(key || checksum)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 32]);

impl Address {
    pub const ZERO: Address = Address([0u8; 32]);

    pub const fn new(public_key: [u8; 32]) -> Self {
        Self(public_key)
    }

    /// Escrow address controlled by an application
    pub fn for_application(app_id: u64) -> Self {
        Self(sha512_256(&[APP_ID_PREFIX, &app_id.to_be_bytes()]))
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, LendingError> {
        let key: [u8; 32] = bytes
            .try_into()
            .map_err(|_| LendingError::InvalidAddress(format!("Expected 32 bytes, got {}", bytes.len())))?;
        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    fn checksum(&self) -> [u8; CHECKSUM_LEN] {
        let digest = sha512_256(&[&self.0]);
        let mut checksum = [0u8; CHECKSUM_LEN];
        checksum.copy_from_slice(&digest[32 - CHECKSUM_LEN..]);
        checksum
    }

    pub fn encode(&self) -> String {
        let mut raw = self.0.to_vec();
        raw.extend_from_slice(&self.checksum());
        base32_encode(&raw)
    }

    pub fn decode(text: &str) -> Result<Self, LendingError> {
        let raw = base32_decode(text)?;
        if raw.len() != 32 + CHECKSUM_LEN {
            return Err(LendingError::InvalidAddress(text.to_string()));
        }
        let address = Self::from_slice(&raw[..32])?;
        if raw[32..] != address.checksum() {
            return Err(LendingError::InvalidAddress(format!("Checksum mismatch for {}", text)));
        }
        Ok(address)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.encode())
    }
}

impl FromStr for Address {
    type Err = LendingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_address_encoding() {
        let encoded = Address::ZERO.encode();
        assert_eq!(encoded, "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAY5HFKQ");
        assert_eq!(Address::decode(&encoded).unwrap(), Address::ZERO);
    }

    #[test]
    fn test_checksum_is_verified() {
        let encoded = Address::new([7u8; 32]).encode();
        assert!(encoded.starts_with('A'));
        let encoded = format!("B{}", &encoded[1..]);
        assert!(matches!(Address::decode(&encoded), Err(LendingError::InvalidAddress(_))));
        assert!(Address::decode("not-base32!").is_err());
    }

    #[test]
    fn test_application_addresses_are_distinct() {
        let a = Address::for_application(465814065);
        let b = Address::for_application(465814066);
        assert_ne!(a, b);
        assert_eq!(a.encode().len(), 58);
        assert_eq!(a.encode().parse::<Address>().unwrap(), a);
    }

    #[test]
    fn test_base32_round_trip() {
        let bytes: Vec<u8> = (0u8..=40).collect();
        assert_eq!(base32_decode(&base32_encode(&bytes)).unwrap(), bytes);
        assert_eq!(base32_encode(b"f"), "MY");
        assert_eq!(base32_encode(b"foobar"), "MZXW6YTBOI");
    }
}
