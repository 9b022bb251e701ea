//! Transaction Model and Wire Framing
//!
//! A single in-memory transaction shape serves every coin; the coin's
//! [`Framing`] decides how it is written to the wire and how its id is
//! computed.

pub mod bitcoin;
pub mod decred;
pub mod zcash;

use crate::coins::{CoinParams, Framing};
use crate::types::OutPoint;

/// Witness scale factor for weight computation
pub const WITNESS_SCALE_FACTOR: usize = 4;

/// Transaction input with its claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxInput {
    pub outpoint: OutPoint,
    pub script_sig: Vec<u8>,
    pub witness: Vec<Vec<u8>>,
    pub sequence: u32,
    /// Value of the spent output (Decred writes it into the witness section)
    pub value: u64,
}

/// Transaction output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutput {
    pub value: u64,
    pub script: Vec<u8>,
}

impl TxOutput {
    pub fn new(value: u64, script: Vec<u8>) -> Self {
        Self { value, script }
    }
}

/// Coin-agnostic transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub version: u32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub lock_time: u32,
    /// Zcash and Decred only
    pub expiry_height: u32,
    /// Zcash only
    pub version_group_id: u32,
}

/// Size figures of a serialized transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxMetrics {
    pub size: usize,
    pub base_size: usize,
    pub weight: usize,
    pub vsize: usize,
}

impl Transaction {
    /// Whether any input carries witness data
    pub fn has_witness(&self) -> bool {
        self.inputs.iter().any(|input| !input.witness.is_empty())
    }

    /// Full wire encoding
    pub fn encode(&self, framing: Framing) -> Vec<u8> {
        match framing {
            Framing::Bitcoin => bitcoin::encode(self, true),
            Framing::ZcashSapling => zcash::encode(self),
            Framing::Decred => decred::encode(self),
        }
    }

    /// Transaction id in wire byte order
    pub fn txid(&self, params: &CoinParams) -> [u8; 32] {
        match params.framing {
            Framing::Bitcoin => params.txid_hasher.hash(&bitcoin::encode(self, false)),
            Framing::ZcashSapling => params.txid_hasher.hash(&zcash::encode(self)),
            Framing::Decred => decred::txid(self),
        }
    }

    /// Witness transaction id in wire byte order, when witness data is present
    pub fn wtxid(&self, params: &CoinParams) -> Option<[u8; 32]> {
        if params.framing != Framing::Bitcoin || !self.has_witness() {
            return None;
        }
        Some(params.txid_hasher.hash(&bitcoin::encode(self, true)))
    }

    /// Size, weight and virtual size
    ///
    /// Only Bitcoin framing discounts witness bytes; other framings weigh
    /// four units per byte.
    pub fn metrics(&self, framing: Framing) -> TxMetrics {
        let size = self.encode(framing).len();
        let base_size = match framing {
            Framing::Bitcoin => bitcoin::encode(self, false).len(),
            _ => size,
        };
        let weight = base_size * (WITNESS_SCALE_FACTOR - 1) + size;
        TxMetrics {
            size,
            base_size,
            weight,
            vsize: weight.div_ceil(WITNESS_SCALE_FACTOR),
        }
    }
}

/// Reverse a wire-order hash into display order hex
pub fn display_hex(hash: &[u8; 32]) -> String {
    let mut display = *hash;
    display.reverse();
    hex::encode(display)
}

// MARK: - Compact size

/// Write a Bitcoin CompactSize integer
pub fn write_var_int(value: u64, buf: &mut Vec<u8>) {
    if value < 0xfd {
        buf.push(value as u8);
    } else if value <= 0xffff {
        buf.push(0xfd);
        buf.extend_from_slice(&(value as u16).to_le_bytes());
    } else if value <= 0xffff_ffff {
        buf.push(0xfe);
        buf.extend_from_slice(&(value as u32).to_le_bytes());
    } else {
        buf.push(0xff);
        buf.extend_from_slice(&value.to_le_bytes());
    }
}

/// Write a length-prefixed byte string
pub fn write_var_bytes(bytes: &[u8], buf: &mut Vec<u8>) {
    write_var_int(bytes.len() as u64, buf);
    buf.extend_from_slice(bytes);
}

/// Serialized length of a CompactSize integer
pub fn var_int_len(value: u64) -> usize {
    match value {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}

/// Write a Bitcoin-style output (value, script)
pub(crate) fn write_output(output: &TxOutput, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&output.value.to_le_bytes());
    write_var_bytes(&output.script, buf);
}

/// Write a Bitcoin-style input (outpoint, scriptSig, sequence)
pub(crate) fn write_input(input: &TxInput, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&input.outpoint.hash);
    buf.extend_from_slice(&input.outpoint.vout.to_le_bytes());
    write_var_bytes(&input.script_sig, buf);
    buf.extend_from_slice(&input.sequence.to_le_bytes());
}
