//! Zcash Sapling Pre-Image Hashing (ZIP-243)
//!
//! BLAKE2b-256 with per-field personalisations. Transparent-only, so the
//! joinsplit, spend and output commitments are zero and valueBalance is 0.

use blake2b_simd::Params;

use super::{prepared_input, PreImageError, PreImageResult, SigHashType};
use crate::signing::PreparedTransaction;
use crate::tx::{write_output, write_var_bytes};

const PREVOUTS_PERSONAL: &[u8; 16] = b"ZcashPrevoutHash";
const SEQUENCE_PERSONAL: &[u8; 16] = b"ZcashSequencHash";
const OUTPUTS_PERSONAL: &[u8; 16] = b"ZcashOutputsHash";
const SIGHASH_PERSONAL_PREFIX: &[u8; 12] = b"ZcashSigHash";

fn blake2b_personal(personal: &[u8; 16], data: &[u8]) -> [u8; 32] {
    let hash = Params::new().hash_length(32).personal(personal).hash(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(hash.as_bytes());
    out
}

/// ZIP-243 signature hash of one transparent input
pub fn sighash(prepared: &PreparedTransaction, index: usize, sighash_type: SigHashType) -> PreImageResult<[u8; 32]> {
    let input = prepared_input(prepared, index)?;
    let unsigned = &prepared.unsigned;
    let tx_input = unsigned
        .inputs
        .get(index)
        .ok_or(PreImageError::InvalidInputIndex(index))?;

    let hash_prevouts = if sighash_type.is_anyone_can_pay() {
        [0u8; 32]
    } else {
        let mut prevouts = Vec::with_capacity(36 * unsigned.inputs.len());
        for inp in &unsigned.inputs {
            prevouts.extend_from_slice(&inp.outpoint.hash);
            prevouts.extend_from_slice(&inp.outpoint.vout.to_le_bytes());
        }
        blake2b_personal(PREVOUTS_PERSONAL, &prevouts)
    };

    let hash_sequence = if sighash_type.is_anyone_can_pay() || sighash_type.is_none() || sighash_type.is_single() {
        [0u8; 32]
    } else {
        let mut sequences = Vec::with_capacity(4 * unsigned.inputs.len());
        for inp in &unsigned.inputs {
            sequences.extend_from_slice(&inp.sequence.to_le_bytes());
        }
        blake2b_personal(SEQUENCE_PERSONAL, &sequences)
    };

    let hash_outputs = if !sighash_type.is_none() && !sighash_type.is_single() {
        let mut outputs = Vec::new();
        for out in &unsigned.outputs {
            write_output(out, &mut outputs);
        }
        blake2b_personal(OUTPUTS_PERSONAL, &outputs)
    } else if sighash_type.is_single() && index < unsigned.outputs.len() {
        let mut output = Vec::new();
        write_output(&unsigned.outputs[index], &mut output);
        blake2b_personal(OUTPUTS_PERSONAL, &output)
    } else {
        [0u8; 32]
    };

    let mut serialized = Vec::with_capacity(256);
    serialized.extend_from_slice(&unsigned.version.to_le_bytes());
    serialized.extend_from_slice(&unsigned.version_group_id.to_le_bytes());
    serialized.extend_from_slice(&hash_prevouts);
    serialized.extend_from_slice(&hash_sequence);
    serialized.extend_from_slice(&hash_outputs);
    // hashJoinSplits, hashShieldedSpends, hashShieldedOutputs
    serialized.extend_from_slice(&[0u8; 96]);
    serialized.extend_from_slice(&unsigned.lock_time.to_le_bytes());
    serialized.extend_from_slice(&unsigned.expiry_height.to_le_bytes());
    // valueBalance
    serialized.extend_from_slice(&0u64.to_le_bytes());
    serialized.extend_from_slice(&u32::from(sighash_type).to_le_bytes());

    serialized.extend_from_slice(&tx_input.outpoint.hash);
    serialized.extend_from_slice(&tx_input.outpoint.vout.to_le_bytes());
    write_var_bytes(&input.script_code(), &mut serialized);
    serialized.extend_from_slice(&input.utxo.value.to_le_bytes());
    serialized.extend_from_slice(&tx_input.sequence.to_le_bytes());

    let mut personal = [0u8; 16];
    personal[..12].copy_from_slice(SIGHASH_PERSONAL_PREFIX);
    personal[12..].copy_from_slice(&prepared.branch_id.to_le_bytes());

    Ok(blake2b_personal(&personal, &serialized))
}
