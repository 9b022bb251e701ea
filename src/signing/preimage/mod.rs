//! Pre-Image Hash Generation
//!
//! Computes the digest each input's signer must sign. The coin's sighash
//! variant picks the algorithm family; within the Bitcoin family the
//! input's spend path picks legacy, BIP143 or BIP341.

pub mod bitcoin;
pub mod decred;
pub mod zcash;

use serde::{Deserialize, Serialize};

use super::{PreparedInput, PreparedTransaction};
use crate::coins::SighashVariant;
use crate::script::spend::SighashAlgorithm;
use crate::script::SpendPath;
use crate::tx::Transaction;
use crate::types::PreimageEntry;
use crate::{log_debug, log_info, log_warn};

// =============================================================================
// Types
// =============================================================================

/// Signature hash types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum SigHashType {
    /// Taproot only: commits like ALL, signature carries no type byte
    Default = 0x00,
    /// Sign all inputs and all outputs
    #[default]
    All = 0x01,
    /// Sign all inputs, no outputs
    None = 0x02,
    /// Sign all inputs, only the output at the same index
    Single = 0x03,
    AllAnyoneCanPay = 0x81,
    NoneAnyoneCanPay = 0x82,
    SingleAnyoneCanPay = 0x83,
}

impl SigHashType {
    pub fn to_byte(&self) -> u8 {
        *self as u8
    }

    pub fn from_u32(value: u32) -> PreImageResult<Self> {
        match value {
            0x00 => Ok(Self::Default),
            0x01 => Ok(Self::All),
            0x02 => Ok(Self::None),
            0x03 => Ok(Self::Single),
            0x81 => Ok(Self::AllAnyoneCanPay),
            0x82 => Ok(Self::NoneAnyoneCanPay),
            0x83 => Ok(Self::SingleAnyoneCanPay),
            other => Err(PreImageError::UnsupportedSigHashType(other)),
        }
    }

    pub fn is_anyone_can_pay(&self) -> bool {
        self.to_byte() & 0x80 != 0
    }

    pub fn is_none(&self) -> bool {
        self.to_byte() & 0x1f == 0x02
    }

    pub fn is_single(&self) -> bool {
        self.to_byte() & 0x1f == 0x03
    }
}

impl TryFrom<u32> for SigHashType {
    type Error = PreImageError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_u32(value)
    }
}

impl From<SigHashType> for u32 {
    fn from(value: SigHashType) -> Self {
        value.to_byte() as u32
    }
}

/// Error types for pre-image operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreImageError {
    #[error("Unsupported sighash type: 0x{0:02x}")]
    UnsupportedSigHashType(u32),

    #[error("Unsupported script template: {0}")]
    UnsupportedTemplate(String),

    #[error("Invalid input index: {0}")]
    InvalidInputIndex(usize),

    #[error("Invalid transaction format: {0}")]
    InvalidTransaction(String),
}

pub type PreImageResult<T> = Result<T, PreImageError>;

// =============================================================================
// Public API
// =============================================================================

/// Hash type actually committed to for a path
///
/// `SIGHASH_DEFAULT` is taproot-only, and taproot `ALL` is emitted as
/// `SIGHASH_DEFAULT` so key-path signatures stay 64 bytes.
pub fn effective_sighash(path: &SpendPath, requested: SigHashType) -> PreImageResult<SigHashType> {
    match (path.is_taproot(), requested) {
        (true, SigHashType::All) => Ok(SigHashType::Default),
        (false, SigHashType::Default) => Err(PreImageError::UnsupportedSigHashType(0)),
        (_, other) => Ok(other),
    }
}

/// One pre-image entry per input, in input order
pub fn compute(prepared: &PreparedTransaction) -> PreImageResult<Vec<PreimageEntry>> {
    let params = prepared.params;
    if prepared.inputs.len() != prepared.unsigned.inputs.len() {
        return Err(PreImageError::InvalidTransaction(format!(
            "{} prepared inputs for {} transaction inputs",
            prepared.inputs.len(),
            prepared.unsigned.inputs.len()
        )));
    }

    let mut entries = Vec::with_capacity(prepared.inputs.len());
    for (index, input) in prepared.inputs.iter().enumerate() {
        let sighash_type = effective_sighash(&input.path, input.sighash_type).inspect_err(|e| {
            log_warn!("preimage", "rejected hash type", input = index, reason = e);
        })?;

        let digest = match params.sighash_variant {
            SighashVariant::Bitcoin | SighashVariant::Groestl => match input.path.sighash_algorithm() {
                SighashAlgorithm::Legacy => bitcoin::legacy(prepared, index, sighash_type)?,
                SighashAlgorithm::SegwitV0 => bitcoin::segwit_v0(prepared, index, sighash_type)?,
                SighashAlgorithm::TaprootKeyPath | SighashAlgorithm::TaprootScriptPath => {
                    bitcoin::taproot(prepared, index, sighash_type)?
                }
            },
            SighashVariant::ZcashSapling => zcash::sighash(prepared, index, sighash_type)?,
            SighashVariant::Decred => decred::sighash(prepared, index, sighash_type)?,
        };

        log_debug!(
            "preimage",
            "input hashed",
            input = index,
            sighash_type = format!("0x{:02x}", sighash_type.to_byte()),
            preimage = hex::encode(digest),
        );

        entries.push(PreimageEntry {
            preimage_hash: digest,
            required_pub_key_hash: input.path.required_key(params),
            input_index: index,
            signing_method: input.path.signing_method(),
            sighash_type,
        });
    }

    log_info!("preimage", "pre-images computed", coin = params.name, inputs = entries.len());
    Ok(entries)
}

// =============================================================================
// Helpers
// =============================================================================

/// Copy of the transaction masked for the legacy-style algorithms
///
/// The signed input carries `script_code`, the others an empty script.
/// NONE and SINGLE zero the other sequences; SINGLE blanks the earlier
/// outputs and drops the later ones; ANYONECANPAY keeps only the signed
/// input.
pub(crate) fn masked_copy(
    tx: &Transaction,
    index: usize,
    sighash_type: SigHashType,
    script_code: Vec<u8>,
) -> PreImageResult<Transaction> {
    if index >= tx.inputs.len() {
        return Err(PreImageError::InvalidInputIndex(index));
    }
    if sighash_type.is_single() && index >= tx.outputs.len() {
        return Err(PreImageError::UnsupportedSigHashType(sighash_type.into()));
    }

    let mut copy = tx.clone();
    let zero_sequences = sighash_type.is_none() || sighash_type.is_single();
    for (i, input) in copy.inputs.iter_mut().enumerate() {
        input.witness.clear();
        if i == index {
            input.script_sig = script_code.clone();
        } else {
            input.script_sig.clear();
            if zero_sequences {
                input.sequence = 0;
            }
        }
    }

    if sighash_type.is_none() {
        copy.outputs.clear();
    } else if sighash_type.is_single() {
        copy.outputs.truncate(index + 1);
        for output in &mut copy.outputs[..index] {
            output.value = u64::MAX;
            output.script.clear();
        }
    }

    if sighash_type.is_anyone_can_pay() {
        let signed = copy.inputs.swap_remove(index);
        copy.inputs = vec![signed];
    }

    Ok(copy)
}

/// Input being signed, checked against the prepared list
pub(crate) fn prepared_input(prepared: &PreparedTransaction, index: usize) -> PreImageResult<&PreparedInput> {
    prepared
        .inputs
        .get(index)
        .ok_or(PreImageError::InvalidInputIndex(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::TapLeaf;
    use crate::tx::{TxInput, TxOutput};
    use crate::types::OutPoint;

    fn sample_tx(inputs: usize, outputs: usize) -> Transaction {
        Transaction {
            version: 1,
            inputs: (0..inputs)
                .map(|i| TxInput {
                    outpoint: OutPoint::new([i as u8; 32], i as u32),
                    script_sig: Vec::new(),
                    witness: Vec::new(),
                    sequence: 0xffff_fffe,
                    value: 1_000,
                })
                .collect(),
            outputs: (0..outputs).map(|i| TxOutput::new(100 * (i as u64 + 1), vec![0x51])).collect(),
            lock_time: 0,
            expiry_height: 0,
            version_group_id: 0,
        }
    }

    #[test]
    fn test_sighash_type_parsing() {
        assert_eq!(SigHashType::from_u32(0x01).unwrap(), SigHashType::All);
        assert_eq!(SigHashType::from_u32(0x81).unwrap(), SigHashType::AllAnyoneCanPay);
        assert_eq!(
            SigHashType::from_u32(0x04).unwrap_err(),
            PreImageError::UnsupportedSigHashType(0x04)
        );
        assert!(!SigHashType::All.is_anyone_can_pay());
        assert!(SigHashType::SingleAnyoneCanPay.is_single());
        assert!(SigHashType::NoneAnyoneCanPay.is_none());
        assert!(!SigHashType::Default.is_none());
    }

    #[test]
    fn test_sighash_type_serde() {
        assert_eq!(serde_json::to_string(&SigHashType::AllAnyoneCanPay).unwrap(), "129");
        let parsed: SigHashType = serde_json::from_str("3").unwrap();
        assert_eq!(parsed, SigHashType::Single);
        assert!(serde_json::from_str::<SigHashType>("4").is_err());
    }

    #[test]
    fn test_effective_sighash() {
        let p2pkh = SpendPath::P2pkh { pubkey_hash: [0; 20] };
        let key_path = SpendPath::P2trKeyPath { output_key: [0; 32] };
        let script_path = SpendPath::P2trScriptPath {
            internal_key: [0; 32],
            leaf: TapLeaf::new(vec![0x51]),
            control_block: Vec::new(),
        };

        assert_eq!(effective_sighash(&key_path, SigHashType::All).unwrap(), SigHashType::Default);
        assert_eq!(effective_sighash(&script_path, SigHashType::All).unwrap(), SigHashType::Default);
        assert_eq!(
            effective_sighash(&key_path, SigHashType::SingleAnyoneCanPay).unwrap(),
            SigHashType::SingleAnyoneCanPay
        );
        assert_eq!(effective_sighash(&p2pkh, SigHashType::All).unwrap(), SigHashType::All);
        assert!(effective_sighash(&p2pkh, SigHashType::Default).is_err());
    }

    #[test]
    fn test_masked_copy_single() {
        let tx = sample_tx(3, 3);
        let copy = masked_copy(&tx, 1, SigHashType::Single, vec![0xac]).unwrap();
        assert_eq!(copy.inputs.len(), 3);
        assert_eq!(copy.inputs[0].sequence, 0);
        assert_eq!(copy.inputs[1].sequence, 0xffff_fffe);
        assert_eq!(copy.inputs[1].script_sig, vec![0xac]);
        assert_eq!(copy.outputs.len(), 2);
        assert_eq!(copy.outputs[0].value, u64::MAX);
        assert!(copy.outputs[0].script.is_empty());
        assert_eq!(copy.outputs[1].value, 200);
    }

    #[test]
    fn test_masked_copy_anyone_can_pay() {
        let tx = sample_tx(3, 1);
        let copy = masked_copy(&tx, 2, SigHashType::AllAnyoneCanPay, vec![0xac]).unwrap();
        assert_eq!(copy.inputs.len(), 1);
        assert_eq!(copy.inputs[0].outpoint, tx.inputs[2].outpoint);
        assert_eq!(copy.outputs.len(), 1);
    }

    #[test]
    fn test_masked_copy_single_out_of_range() {
        let tx = sample_tx(2, 1);
        let err = masked_copy(&tx, 1, SigHashType::Single, Vec::new()).unwrap_err();
        assert_eq!(err, PreImageError::UnsupportedSigHashType(0x03));
        assert_eq!(
            masked_copy(&tx, 5, SigHashType::All, Vec::new()).unwrap_err(),
            PreImageError::InvalidInputIndex(5)
        );
    }
}
