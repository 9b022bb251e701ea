//! Decred Pre-Image Hashing
//!
//! `blake256(hashType ‖ prefixHash ‖ witnessHash)`. The prefix hash
//! covers the masked no-witness prefix; the witness hash covers only the
//! signature scripts, with the signed input's script code in place.

use super::{masked_copy, prepared_input, PreImageResult, SigHashType};
use crate::crypto::hash::blake256;
use crate::signing::PreparedTransaction;
use crate::tx::decred::{version_word, write_prefix, SER_NO_WITNESS, SER_WITNESS_SIGNING};
use crate::tx::{write_var_bytes, write_var_int, Transaction};

/// Decred signature hash of one input
pub fn sighash(prepared: &PreparedTransaction, index: usize, sighash_type: SigHashType) -> PreImageResult<[u8; 32]> {
    let input = prepared_input(prepared, index)?;
    let masked = masked_copy(&prepared.unsigned, index, sighash_type, input.script_code())?;

    let mut serialized = Vec::with_capacity(68);
    serialized.extend_from_slice(&u32::from(sighash_type).to_le_bytes());
    serialized.extend_from_slice(&prefix_hash(&masked));
    serialized.extend_from_slice(&witness_signing_hash(&masked));

    Ok(blake256(&serialized))
}

fn prefix_hash(masked: &Transaction) -> [u8; 32] {
    let mut buf = Vec::with_capacity(128);
    buf.extend_from_slice(&version_word(masked.version, SER_NO_WITNESS).to_le_bytes());
    write_prefix(masked, &mut buf);
    blake256(&buf)
}

fn witness_signing_hash(masked: &Transaction) -> [u8; 32] {
    let mut buf = Vec::with_capacity(64);
    buf.extend_from_slice(&version_word(masked.version, SER_WITNESS_SIGNING).to_le_bytes());
    write_var_int(masked.inputs.len() as u64, &mut buf);
    for input in &masked.inputs {
        write_var_bytes(&input.script_sig, &mut buf);
    }
    blake256(&buf)
}
