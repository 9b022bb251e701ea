//! Bitcoin Pre-Image Hashing
//!
//! Legacy, SegWit (BIP-143) and Taproot (BIP-341) sighashes. Groestlcoin
//! runs the same algorithms with the coin's single SHA-256 digest.

use super::{masked_copy, prepared_input, PreImageError, PreImageResult, SigHashType};
use crate::crypto::hash::sha256;
use crate::crypto::{tagged_hash, tags};
use crate::script::SpendPath;
use crate::signing::PreparedTransaction;
use crate::tx::{self, write_var_bytes};

/// Key version committed to by BIP-342 script-path signatures
const KEY_VERSION_0: u8 = 0x00;
/// No OP_CODESEPARATOR executed
const CODESEP_POS_NONE: u32 = 0xffff_ffff;

/// Calculate legacy (pre-SegWit) sighash
pub fn legacy(prepared: &PreparedTransaction, index: usize, sighash_type: SigHashType) -> PreImageResult<[u8; 32]> {
    let input = prepared_input(prepared, index)?;
    let copy = masked_copy(&prepared.unsigned, index, sighash_type, input.script_code())?;

    let mut serialized = tx::bitcoin::encode(&copy, false);
    serialized.extend_from_slice(&u32::from(sighash_type).to_le_bytes());

    Ok(prepared.params.sighash_digest(&serialized))
}

/// Calculate BIP-143 (SegWit v0) sighash
pub fn segwit_v0(prepared: &PreparedTransaction, index: usize, sighash_type: SigHashType) -> PreImageResult<[u8; 32]> {
    let input = prepared_input(prepared, index)?;
    let unsigned = &prepared.unsigned;
    let tx_input = unsigned
        .inputs
        .get(index)
        .ok_or(PreImageError::InvalidInputIndex(index))?;
    let digest = |data: &[u8]| prepared.params.sighash_digest(data);

    let hash_prevouts = if sighash_type.is_anyone_can_pay() {
        [0u8; 32]
    } else {
        let mut prevouts = Vec::with_capacity(36 * unsigned.inputs.len());
        for inp in &unsigned.inputs {
            prevouts.extend_from_slice(&inp.outpoint.hash);
            prevouts.extend_from_slice(&inp.outpoint.vout.to_le_bytes());
        }
        digest(&prevouts)
    };

    let hash_sequence = if sighash_type.is_anyone_can_pay() || sighash_type.is_none() || sighash_type.is_single() {
        [0u8; 32]
    } else {
        let mut sequences = Vec::with_capacity(4 * unsigned.inputs.len());
        for inp in &unsigned.inputs {
            sequences.extend_from_slice(&inp.sequence.to_le_bytes());
        }
        digest(&sequences)
    };

    let hash_outputs = if !sighash_type.is_none() && !sighash_type.is_single() {
        let mut outputs = Vec::new();
        for out in &unsigned.outputs {
            tx::write_output(out, &mut outputs);
        }
        digest(&outputs)
    } else if sighash_type.is_single() && index < unsigned.outputs.len() {
        let mut output = Vec::new();
        tx::write_output(&unsigned.outputs[index], &mut output);
        digest(&output)
    } else {
        [0u8; 32]
    };

    let mut serialized = Vec::with_capacity(256);
    serialized.extend_from_slice(&unsigned.version.to_le_bytes());
    serialized.extend_from_slice(&hash_prevouts);
    serialized.extend_from_slice(&hash_sequence);
    serialized.extend_from_slice(&tx_input.outpoint.hash);
    serialized.extend_from_slice(&tx_input.outpoint.vout.to_le_bytes());
    write_var_bytes(&input.script_code(), &mut serialized);
    serialized.extend_from_slice(&input.utxo.value.to_le_bytes());
    serialized.extend_from_slice(&tx_input.sequence.to_le_bytes());
    serialized.extend_from_slice(&hash_outputs);
    serialized.extend_from_slice(&unsigned.lock_time.to_le_bytes());
    serialized.extend_from_slice(&u32::from(sighash_type).to_le_bytes());

    Ok(digest(&serialized))
}

/// Calculate BIP-341 (Taproot) sighash, key path or single-leaf script path
pub fn taproot(prepared: &PreparedTransaction, index: usize, sighash_type: SigHashType) -> PreImageResult<[u8; 32]> {
    let input = prepared_input(prepared, index)?;
    let unsigned = &prepared.unsigned;
    let tx_input = unsigned
        .inputs
        .get(index)
        .ok_or(PreImageError::InvalidInputIndex(index))?;

    if sighash_type.is_single() && index >= unsigned.outputs.len() {
        return Err(PreImageError::UnsupportedSigHashType(sighash_type.into()));
    }

    let leaf_hash = match &input.path {
        SpendPath::P2trKeyPath { .. } => None,
        SpendPath::P2trScriptPath { leaf, .. } => Some(leaf.hash()),
        other => {
            return Err(PreImageError::UnsupportedTemplate(format!(
                "taproot sighash for {:?}",
                other.sighash_algorithm()
            )))
        }
    };

    let anyone_can_pay = sighash_type.is_anyone_can_pay();
    let mut serialized = Vec::with_capacity(256);

    // Epoch
    serialized.push(0x00);
    serialized.push(sighash_type.to_byte());
    serialized.extend_from_slice(&unsigned.version.to_le_bytes());
    serialized.extend_from_slice(&unsigned.lock_time.to_le_bytes());

    if !anyone_can_pay {
        let mut prevouts = Vec::new();
        let mut amounts = Vec::new();
        let mut scripts = Vec::new();
        let mut sequences = Vec::new();
        for (inp, prev) in unsigned.inputs.iter().zip(&prepared.inputs) {
            prevouts.extend_from_slice(&inp.outpoint.hash);
            prevouts.extend_from_slice(&inp.outpoint.vout.to_le_bytes());
            amounts.extend_from_slice(&prev.utxo.value.to_le_bytes());
            write_var_bytes(&prev.utxo.script, &mut scripts);
            sequences.extend_from_slice(&inp.sequence.to_le_bytes());
        }
        serialized.extend_from_slice(&sha256(&prevouts));
        serialized.extend_from_slice(&sha256(&amounts));
        serialized.extend_from_slice(&sha256(&scripts));
        serialized.extend_from_slice(&sha256(&sequences));
    }

    if !sighash_type.is_none() && !sighash_type.is_single() {
        let mut outputs = Vec::new();
        for out in &unsigned.outputs {
            tx::write_output(out, &mut outputs);
        }
        serialized.extend_from_slice(&sha256(&outputs));
    }

    // spend_type = ext_flag * 2, no annex
    let ext_flag: u8 = if leaf_hash.is_some() { 1 } else { 0 };
    serialized.push(ext_flag * 2);

    if anyone_can_pay {
        serialized.extend_from_slice(&tx_input.outpoint.hash);
        serialized.extend_from_slice(&tx_input.outpoint.vout.to_le_bytes());
        serialized.extend_from_slice(&input.utxo.value.to_le_bytes());
        write_var_bytes(&input.utxo.script, &mut serialized);
        serialized.extend_from_slice(&tx_input.sequence.to_le_bytes());
    } else {
        serialized.extend_from_slice(&(index as u32).to_le_bytes());
    }

    if sighash_type.is_single() {
        let mut output = Vec::new();
        tx::write_output(&unsigned.outputs[index], &mut output);
        serialized.extend_from_slice(&sha256(&output));
    }

    if let Some(leaf_hash) = leaf_hash {
        serialized.extend_from_slice(&leaf_hash);
        serialized.push(KEY_VERSION_0);
        serialized.extend_from_slice(&CODESEP_POS_NONE.to_le_bytes());
    }

    Ok(tagged_hash(tags::TAP_SIGHASH, &serialized))
}
