//! Canonical operation encoding.
//!
//! A msgpack subset: maps with lexicographically sorted keys, zero and empty
//! fields omitted, integers in their shortest form. Operation ids hash the
//! encoding under the `TX` domain prefix, group ids hash the id list under `TG`.

use crate::common::address::{base32_encode, sha512_256};
use crate::transactions::operation::{OnComplete, Operation, OperationBody};

const TX_PREFIX: &[u8] = b"TX";
const GROUP_PREFIX: &[u8] = b"TG";

/// Value tree for the encoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MsgValue {
    Uint(u64),
    Str(String),
    Bin(Vec<u8>),
    Array(Vec<MsgValue>),
    Map(Vec<(&'static str, MsgValue)>),
}

impl MsgValue {
    /// Zero values are left out of canonical maps
    fn is_empty(&self) -> bool {
        match self {
            MsgValue::Uint(v) => *v == 0,
            MsgValue::Str(s) => s.is_empty(),
            MsgValue::Bin(b) => b.is_empty(),
            MsgValue::Array(a) => a.is_empty(),
            MsgValue::Map(m) => m.is_empty(),
        }
    }

    /// Canonical map: drop empty entries, sort by key
    pub fn canonical_map(mut entries: Vec<(&'static str, MsgValue)>) -> MsgValue {
        entries.retain(|(_, v)| !v.is_empty());
        entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
        MsgValue::Map(entries)
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        match self {
            MsgValue::Uint(v) => write_uint(*v, out),
            MsgValue::Str(s) => write_str(s, out),
            MsgValue::Bin(b) => write_bin(b, out),
            MsgValue::Array(items) => {
                write_len(items.len(), 0x90, 0xdc, 0xdd, out);
                for item in items {
                    item.encode(out);
                }
            }
            MsgValue::Map(entries) => {
                write_len(entries.len(), 0x80, 0xde, 0xdf, out);
                for (key, value) in entries {
                    write_str(key, out);
                    value.encode(out);
                }
            }
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode(&mut out);
        out
    }
}

fn write_uint(v: u64, out: &mut Vec<u8>) {
    if v < 0x80 {
        out.push(v as u8);
    } else if v <= u8::MAX as u64 {
        out.extend_from_slice(&[0xcc, v as u8]);
    } else if v <= u16::MAX as u64 {
        out.push(0xcd);
        out.extend_from_slice(&(v as u16).to_be_bytes());
    } else if v <= u32::MAX as u64 {
        out.push(0xce);
        out.extend_from_slice(&(v as u32).to_be_bytes());
    } else {
        out.push(0xcf);
        out.extend_from_slice(&v.to_be_bytes());
    }
}

fn write_str(s: &str, out: &mut Vec<u8>) {
    let len = s.len();
    if len < 32 {
        out.push(0xa0 | len as u8);
    } else if len <= u8::MAX as usize {
        out.extend_from_slice(&[0xd9, len as u8]);
    } else if len <= u16::MAX as usize {
        out.push(0xda);
        out.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        out.push(0xdb);
        out.extend_from_slice(&(len as u32).to_be_bytes());
    }
    out.extend_from_slice(s.as_bytes());
}

fn write_bin(b: &[u8], out: &mut Vec<u8>) {
    let len = b.len();
    if len <= u8::MAX as usize {
        out.extend_from_slice(&[0xc4, len as u8]);
    } else if len <= u16::MAX as usize {
        out.push(0xc5);
        out.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        out.push(0xc6);
        out.extend_from_slice(&(len as u32).to_be_bytes());
    }
    out.extend_from_slice(b);
}

// Array and map headers share the fix/16/32 layout
fn write_len(len: usize, fix: u8, marker16: u8, marker32: u8, out: &mut Vec<u8>) {
    if len < 16 {
        out.push(fix | len as u8);
    } else if len <= u16::MAX as usize {
        out.push(marker16);
        out.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        out.push(marker32);
        out.extend_from_slice(&(len as u32).to_be_bytes());
    }
}

// Fixed 32-byte fields are omitted when all zero
fn digest(bytes: &[u8; 32]) -> MsgValue {
    if bytes.iter().all(|&b| b == 0) {
        MsgValue::Bin(Vec::new())
    } else {
        MsgValue::Bin(bytes.to_vec())
    }
}

/// Field map of an unsigned operation
pub fn operation_value(op: &Operation) -> MsgValue {
    let mut fields: Vec<(&'static str, MsgValue)> = vec![
        ("snd", digest(op.sender.as_bytes())),
        ("fee", MsgValue::Uint(op.fee)),
        ("fv", MsgValue::Uint(op.first_valid)),
        ("lv", MsgValue::Uint(op.last_valid)),
        ("gen", MsgValue::Str(op.genesis_id.clone())),
        ("gh", digest(&op.genesis_hash)),
        ("note", MsgValue::Bin(op.note.clone())),
    ];
    if let Some(group) = op.group {
        fields.push(("grp", digest(&group)));
    }
    if let Some(rekey_to) = op.rekey_to {
        fields.push(("rekey", digest(rekey_to.as_bytes())));
    }

    match &op.body {
        OperationBody::Payment { receiver, amount } => {
            fields.push(("type", MsgValue::Str("pay".to_string())));
            fields.push(("rcv", digest(receiver.as_bytes())));
            fields.push(("amt", MsgValue::Uint(*amount)));
        }
        OperationBody::AssetTransfer { receiver, amount, asset_id } => {
            fields.push(("type", MsgValue::Str("axfer".to_string())));
            fields.push(("arcv", digest(receiver.as_bytes())));
            fields.push(("aamt", MsgValue::Uint(*amount)));
            fields.push(("xaid", MsgValue::Uint(*asset_id)));
        }
        OperationBody::AppCall {
            app_id,
            on_complete,
            args,
            foreign_apps,
            foreign_assets,
            accounts,
        } => {
            fields.push(("type", MsgValue::Str("appl".to_string())));
            fields.push(("apid", MsgValue::Uint(*app_id)));
            if *on_complete != OnComplete::NoOp {
                fields.push(("apan", MsgValue::Uint(*on_complete as u64)));
            }
            fields.push((
                "apaa",
                MsgValue::Array(args.iter().map(|a| MsgValue::Bin(a.clone())).collect()),
            ));
            fields.push((
                "apat",
                MsgValue::Array(accounts.iter().map(|a| MsgValue::Bin(a.as_bytes().to_vec())).collect()),
            ));
            fields.push((
                "apfa",
                MsgValue::Array(foreign_apps.iter().map(|id| MsgValue::Uint(*id)).collect()),
            ));
            fields.push((
                "apas",
                MsgValue::Array(foreign_assets.iter().map(|id| MsgValue::Uint(*id)).collect()),
            ));
        }
    }

    MsgValue::canonical_map(fields)
}

pub fn encode_operation(op: &Operation) -> Vec<u8> {
    operation_value(op).to_bytes()
}

pub fn operation_id_raw(op: &Operation) -> [u8; 32] {
    sha512_256(&[TX_PREFIX, &encode_operation(op)])
}

pub fn operation_id(op: &Operation) -> String {
    base32_encode(&operation_id_raw(op))
}

/// Bytes a signer signs for an operation
pub fn signing_payload(op: &Operation) -> Vec<u8> {
    let mut payload = TX_PREFIX.to_vec();
    payload.extend_from_slice(&encode_operation(op));
    payload
}

/// Atomicity identifier over the ordered operation ids
pub fn group_id(ids: &[[u8; 32]]) -> [u8; 32] {
    let txlist = MsgValue::Array(ids.iter().map(|id| MsgValue::Bin(id.to_vec())).collect());
    let encoded = MsgValue::canonical_map(vec![("txlist", txlist)]).to_bytes();
    sha512_256(&[GROUP_PREFIX, &encoded])
}

/// Signed operation envelope
pub fn encode_signed(op: &Operation, signature: &[u8; 64]) -> Vec<u8> {
    MsgValue::canonical_map(vec![
        ("sig", MsgValue::Bin(signature.to_vec())),
        ("txn", operation_value(op)),
    ])
    .to_bytes()
}
