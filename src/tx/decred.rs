//! Decred framing
//!
//! The version word carries the serialization type in its upper 16 bits.
//! A full transaction is the prefix (inputs with tree bytes, outputs with
//! script versions, locktime, expiry) followed by the witness section
//! (value in, block height, block index and signature script per input).

use super::{write_var_bytes, write_var_int, Transaction};
use crate::crypto::hash::blake256;

/// Serialization types written into the version word
pub const SER_FULL: u32 = 0;
pub const SER_NO_WITNESS: u32 = 1;
pub const SER_WITNESS_SIGNING: u32 = 3;

/// Script version of every output produced here
pub const DEFAULT_SCRIPT_VERSION: u16 = 0;

/// Version word with the serialization type folded in
pub fn version_word(version: u32, ser_type: u32) -> u32 {
    (version & 0xffff) | (ser_type << 16)
}

/// Prefix section (without version word)
pub fn write_prefix(tx: &Transaction, buf: &mut Vec<u8>) {
    write_var_int(tx.inputs.len() as u64, buf);
    for input in &tx.inputs {
        buf.extend_from_slice(&input.outpoint.hash);
        buf.extend_from_slice(&input.outpoint.vout.to_le_bytes());
        buf.push(input.outpoint.tree);
        buf.extend_from_slice(&input.sequence.to_le_bytes());
    }

    write_var_int(tx.outputs.len() as u64, buf);
    for output in &tx.outputs {
        buf.extend_from_slice(&output.value.to_le_bytes());
        buf.extend_from_slice(&DEFAULT_SCRIPT_VERSION.to_le_bytes());
        write_var_bytes(&output.script, buf);
    }

    buf.extend_from_slice(&tx.lock_time.to_le_bytes());
    buf.extend_from_slice(&tx.expiry_height.to_le_bytes());
}

/// Witness section (without version word)
pub fn write_witness(tx: &Transaction, buf: &mut Vec<u8>) {
    write_var_int(tx.inputs.len() as u64, buf);
    for input in &tx.inputs {
        buf.extend_from_slice(&input.value.to_le_bytes());
        // Block height and index are unknown to the signer
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&0xffff_ffffu32.to_le_bytes());
        write_var_bytes(&input.script_sig, buf);
    }
}

/// Full serialization
pub fn encode(tx: &Transaction) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256);
    buf.extend_from_slice(&version_word(tx.version, SER_FULL).to_le_bytes());
    write_prefix(tx, &mut buf);
    write_witness(tx, &mut buf);
    buf
}

/// Prefix hash, which is also the transaction id (wire order)
pub fn txid(tx: &Transaction) -> [u8; 32] {
    let mut buf = Vec::with_capacity(128);
    buf.extend_from_slice(&version_word(tx.version, SER_NO_WITNESS).to_le_bytes());
    write_prefix(tx, &mut buf);
    blake256(&buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::{TxInput, TxOutput};
    use crate::types::OutPoint;

    #[test]
    fn test_version_word() {
        assert_eq!(version_word(1, SER_NO_WITNESS), 0x0001_0001);
        assert_eq!(version_word(1, SER_WITNESS_SIGNING), 0x0003_0001);
    }

    #[test]
    fn test_full_layout() {
        let tx = Transaction {
            version: 1,
            inputs: vec![TxInput {
                outpoint: OutPoint::new([0x01; 32], 0),
                script_sig: vec![0x51],
                witness: Vec::new(),
                sequence: 0xffff_ffff,
                value: 100_000_000,
            }],
            outputs: vec![TxOutput::new(0, Vec::new())],
            lock_time: 0,
            expiry_height: 0,
            version_group_id: 0,
        };
        let raw = encode(&tx);
        // version 4, prefix (1 + 41 + 1 + 11 + 8), witness (1 + 8 + 4 + 4 + 2)
        assert_eq!(raw.len(), 4 + 62 + 19);
        assert_eq!(&raw[raw.len() - 6..], &[0xff, 0xff, 0xff, 0xff, 0x01, 0x51]);
    }
}
