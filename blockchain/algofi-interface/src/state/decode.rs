use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::LendingError;
use common_rpc::{TealKeyValue, TealValue};
use std::collections::HashMap;

const TYPE_BYTES: u8 = 1;
const TYPE_UINT: u8 = 2;

/// A state key: text when the raw bytes are valid UTF-8, raw bytes otherwise
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StateKey {
    Text(String),
    Raw(Vec<u8>),
}

impl StateKey {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(text) => StateKey::Text(text),
            Err(e) => StateKey::Raw(e.into_bytes()),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            StateKey::Text(text) => text.as_bytes(),
            StateKey::Raw(bytes) => bytes,
        }
    }
}

impl From<&str> for StateKey {
    fn from(key: &str) -> Self {
        StateKey::Text(key.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateValue {
    Uint(u64),
    Bytes(Vec<u8>),
}

/// Decoded key/value store of one application (global) or one account in one application (local)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerState {
    entries: HashMap<StateKey, StateValue>,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the wire shape: base64 keys, `type` 1 base64 byte strings, `type` 2 integers
    pub fn decode(entries: &[TealKeyValue]) -> Result<Self, LendingError> {
        let mut state = Self::new();
        for entry in entries {
            let key = STANDARD.decode(&entry.key).map_err(|e| {
                LendingError::DeserializationError(format!("Bad state key {}: {}", entry.key, e))
            })?;
            let value = match entry.value.value_type {
                TYPE_BYTES => StateValue::Bytes(STANDARD.decode(&entry.value.bytes).map_err(|e| {
                    LendingError::DeserializationError(format!(
                        "Bad byte value under {}: {}",
                        entry.key, e
                    ))
                })?),
                TYPE_UINT => StateValue::Uint(entry.value.uint),
                other => {
                    return Err(LendingError::DeserializationError(format!(
                        "Unknown state value type {} under {}",
                        other, entry.key
                    )))
                }
            };
            state.entries.insert(StateKey::from_bytes(key), value);
        }
        Ok(state)
    }

    /// Produce the wire shape `decode` accepts, ordered by key
    pub fn encode(&self) -> Vec<TealKeyValue> {
        let mut keys: Vec<&StateKey> = self.entries.keys().collect();
        keys.sort();
        keys.into_iter()
            .map(|key| {
                let value = match &self.entries[key] {
                    StateValue::Uint(uint) => {
                        TealValue { value_type: TYPE_UINT, bytes: String::new(), uint: *uint }
                    }
                    StateValue::Bytes(bytes) => {
                        TealValue { value_type: TYPE_BYTES, bytes: STANDARD.encode(bytes), uint: 0 }
                    }
                };
                TealKeyValue { key: STANDARD.encode(key.as_bytes()), value }
            })
            .collect()
    }

    pub fn insert(&mut self, key: impl AsRef<[u8]>, value: StateValue) {
        self.entries.insert(StateKey::from_bytes(key.as_ref().to_vec()), value);
    }

    pub fn with_uint(mut self, key: impl AsRef<[u8]>, value: u64) -> Self {
        self.insert(key, StateValue::Uint(value));
        self
    }

    pub fn with_bytes(mut self, key: impl AsRef<[u8]>, value: impl Into<Vec<u8>>) -> Self {
        self.insert(key, StateValue::Bytes(value.into()));
        self
    }

    pub fn get(&self, key: impl AsRef<[u8]>) -> Option<&StateValue> {
        self.entries.get(&StateKey::from_bytes(key.as_ref().to_vec()))
    }

    /// Integer under `key`, 0 when absent or not an integer
    pub fn get_uint(&self, key: impl AsRef<[u8]>) -> u64 {
        match self.get(key) {
            Some(StateValue::Uint(value)) => *value,
            _ => 0,
        }
    }

    /// Integer under `key`, `None` when absent
    pub fn get_uint_opt(&self, key: impl AsRef<[u8]>) -> Option<u64> {
        match self.get(key) {
            Some(StateValue::Uint(value)) => Some(*value),
            _ => None,
        }
    }

    /// Byte string under `key`, empty when absent or not a byte string
    pub fn get_bytes(&self, key: impl AsRef<[u8]>) -> &[u8] {
        match self.get(key) {
            Some(StateValue::Bytes(value)) => value,
            _ => &[],
        }
    }

    pub fn contains(&self, key: impl AsRef<[u8]>) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, &StateValue)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entry(key: &str, value_type: u8, bytes: &str, uint: u64) -> TealKeyValue {
        TealKeyValue {
            key: key.to_string(),
            value: TealValue { value_type, bytes: bytes.to_string(), uint },
        }
    }

    #[test]
    fn test_decode_text_and_raw_keys() {
        // "acc" and 0xff 0xfe
        let state = LedgerState::decode(&[
            entry("YWNj", 2, "", 7_000),
            entry("//4=", 1, "AQID", 0),
        ])
        .unwrap();

        assert_eq!(state.get_uint("acc"), 7_000);
        assert_eq!(state.get_bytes([0xff, 0xfe]), &[1, 2, 3]);
        assert!(state.iter().any(|(k, _)| matches!(k, StateKey::Raw(_))));
    }

    #[test]
    fn test_absent_keys_default() {
        let state = LedgerState::new();
        assert_eq!(state.get_uint("missing"), 0);
        assert!(state.get_bytes("missing").is_empty());
        assert_eq!(state.get_uint_opt("missing"), None);
    }

    #[test]
    fn test_unknown_value_type_is_rejected() {
        let result = LedgerState::decode(&[entry("YWNj", 3, "", 0)]);
        assert!(matches!(result, Err(LendingError::DeserializationError(_))));
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(
            uints in proptest::collection::hash_map(proptest::collection::vec(any::<u8>(), 1..16), any::<u64>(), 0..8),
            blobs in proptest::collection::hash_map(proptest::collection::vec(any::<u8>(), 1..16), proptest::collection::vec(any::<u8>(), 0..40), 0..8),
        ) {
            let mut state = LedgerState::new();
            for (k, v) in &uints {
                state.insert(k, StateValue::Uint(*v));
            }
            for (k, v) in &blobs {
                state.insert(k, StateValue::Bytes(v.clone()));
            }
            let decoded = LedgerState::decode(&state.encode()).unwrap();
            prop_assert_eq!(decoded, state);
        }
    }
}
