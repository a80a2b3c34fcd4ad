mod decode;
pub mod keys;
pub mod reader;

pub use decode::{LedgerState, StateKey, StateValue};
