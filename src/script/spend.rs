//! Spend paths
//!
//! Pairs a matched locking script with the caller's spending material and
//! decides how the input is hashed, who must sign it and what its claim
//! (scriptSig and witness) looks like. Fee estimation and final assembly
//! both build claims through [`SpendPath::claim`], so estimated and real
//! sizes only differ by signature and key lengths.

use super::inscription::envelope_leaf;
use super::template::{p2pkh_script, ScriptTemplate};
use super::{push_data, ScriptError, ScriptResult};
use crate::coins::CoinParams;
use crate::crypto::hash::sha256;
use crate::crypto::taproot::{single_leaf_commitment, TapLeaf};
use crate::types::{SigningMethod, SpendingMaterial, UnspentOutput};

/// Placeholder ECDSA signature length (DER plus sighash byte)
pub const ECDSA_SIG_PLACEHOLDER: usize = 72;
/// Placeholder Schnorr signature length (with sighash byte)
pub const SCHNORR_SIG_PLACEHOLDER: usize = 65;
/// Placeholder compressed public key length
pub const PUBKEY_PLACEHOLDER: usize = 33;

/// Key committed to inside a P2SH redeem script or P2WSH witness script
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InnerKey {
    /// Inner P2PK: the key itself is in the script
    Pubkey(Vec<u8>),
    /// Inner P2PKH: the claim must reveal the key
    PubkeyHash([u8; 20]),
}

/// Sighash algorithm family for an input on a Bitcoin-framed coin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SighashAlgorithm {
    Legacy,
    SegwitV0,
    TaprootKeyPath,
    TaprootScriptPath,
}

/// How an input is spent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpendPath {
    P2pk { pubkey: Vec<u8> },
    P2pkh { pubkey_hash: [u8; 20] },
    P2sh { redeem_script: Vec<u8>, inner: InnerKey },
    P2shP2wpkh { redeem_script: Vec<u8>, pubkey_hash: [u8; 20] },
    P2wpkh { pubkey_hash: [u8; 20] },
    P2wsh { witness_script: Vec<u8>, inner: InnerKey },
    P2trKeyPath { output_key: [u8; 32] },
    P2trScriptPath { internal_key: [u8; 32], leaf: TapLeaf, control_block: Vec<u8> },
    Custom { script_sig: Vec<u8>, witness: Vec<Vec<u8>> },
}

impl SpendPath {
    /// Classify an unspent output together with its spending material
    pub fn classify(utxo: &UnspentOutput, params: &CoinParams) -> ScriptResult<SpendPath> {
        // Caller-built claims take precedence over template matching
        if let Some(SpendingMaterial::Custom { script_sig, witness }) = &utxo.spending {
            return Ok(SpendPath::Custom {
                script_sig: script_sig.clone(),
                witness: witness.clone(),
            });
        }

        let template = ScriptTemplate::match_script(&utxo.script);
        match template {
            ScriptTemplate::P2pk { pubkey } => Ok(SpendPath::P2pk { pubkey }),
            ScriptTemplate::P2pkh { pubkey_hash } => Ok(SpendPath::P2pkh { pubkey_hash }),
            ScriptTemplate::P2sh { script_hash } => {
                let redeem_script = redeem_script(utxo, "p2sh")?;
                if params.key_hash(&redeem_script) != script_hash {
                    return Err(ScriptError::InvalidTemplate(
                        "redeem script does not hash to the p2sh output".to_string(),
                    ));
                }
                match ScriptTemplate::match_script(&redeem_script) {
                    ScriptTemplate::P2wpkh { pubkey_hash } if params.supports_segwit => {
                        Ok(SpendPath::P2shP2wpkh { redeem_script, pubkey_hash })
                    }
                    other => {
                        let inner = inner_key(other, "p2sh redeem script")?;
                        Ok(SpendPath::P2sh { redeem_script, inner })
                    }
                }
            }
            ScriptTemplate::P2wpkh { pubkey_hash } => {
                require(params.supports_segwit, "p2wpkh", params)?;
                Ok(SpendPath::P2wpkh { pubkey_hash })
            }
            ScriptTemplate::P2wsh { script_hash } => {
                require(params.supports_segwit, "p2wsh", params)?;
                let witness_script = redeem_script(utxo, "p2wsh")?;
                if sha256(&witness_script) != script_hash {
                    return Err(ScriptError::InvalidTemplate(
                        "witness script does not hash to the p2wsh output".to_string(),
                    ));
                }
                let inner = inner_key(ScriptTemplate::match_script(&witness_script), "p2wsh witness script")?;
                Ok(SpendPath::P2wsh { witness_script, inner })
            }
            ScriptTemplate::P2trKeyPath { output_key } => {
                require(params.supports_taproot, "p2tr", params)?;
                let leaf = match &utxo.spending {
                    Some(SpendingMaterial::TapScript { leaf_script, internal_key }) => {
                        Some((*internal_key, TapLeaf::new(leaf_script.clone())))
                    }
                    Some(SpendingMaterial::Inscription { internal_key, mime_type, payload }) => {
                        Some((*internal_key, envelope_leaf(mime_type, payload)?))
                    }
                    _ => None,
                };
                match leaf {
                    Some((internal_key, leaf)) => {
                        let (output, control) = single_leaf_commitment(&internal_key, &leaf)
                            .map_err(|e| ScriptError::InvalidPublicKey(e.to_string()))?;
                        if output.output_key != output_key {
                            return Err(ScriptError::TapScriptMismatch);
                        }
                        Ok(SpendPath::P2trScriptPath {
                            internal_key,
                            leaf,
                            control_block: control.serialize(),
                        })
                    }
                    None => Ok(SpendPath::P2trKeyPath { output_key }),
                }
            }
            ScriptTemplate::OpReturn { .. } => Err(ScriptError::Unsupported(
                "op_return outputs cannot be spent".to_string(),
            )),
            other => Err(ScriptError::Unsupported(format!(
                "{} output without spending material",
                other.name()
            ))),
        }
    }

    pub fn signing_method(&self) -> SigningMethod {
        match self {
            SpendPath::P2trKeyPath { .. } | SpendPath::P2trScriptPath { .. } => SigningMethod::Schnorr,
            _ => SigningMethod::Ecdsa,
        }
    }

    /// Sighash family on Bitcoin-framed coins
    pub fn sighash_algorithm(&self) -> SighashAlgorithm {
        match self {
            SpendPath::P2shP2wpkh { .. } | SpendPath::P2wpkh { .. } | SpendPath::P2wsh { .. } => {
                SighashAlgorithm::SegwitV0
            }
            SpendPath::P2trKeyPath { .. } => SighashAlgorithm::TaprootKeyPath,
            SpendPath::P2trScriptPath { .. } => SighashAlgorithm::TaprootScriptPath,
            _ => SighashAlgorithm::Legacy,
        }
    }

    pub fn is_taproot(&self) -> bool {
        matches!(self, SpendPath::P2trKeyPath { .. } | SpendPath::P2trScriptPath { .. })
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, SpendPath::Custom { .. })
    }

    /// Script committed to by legacy, BIP143, ZIP-243 and Decred sighashes
    pub fn script_code(&self, locking_script: &[u8]) -> Vec<u8> {
        match self {
            SpendPath::P2sh { redeem_script, .. } => redeem_script.clone(),
            SpendPath::P2shP2wpkh { pubkey_hash, .. } | SpendPath::P2wpkh { pubkey_hash } => p2pkh_script(pubkey_hash),
            SpendPath::P2wsh { witness_script, .. } => witness_script.clone(),
            _ => locking_script.to_vec(),
        }
    }

    /// Key hash (ECDSA) or x-only key (Schnorr) that must sign; empty for custom claims
    pub fn required_key(&self, params: &CoinParams) -> Vec<u8> {
        match self {
            SpendPath::P2pk { pubkey } => params.key_hash(pubkey).to_vec(),
            SpendPath::P2pkh { pubkey_hash }
            | SpendPath::P2shP2wpkh { pubkey_hash, .. }
            | SpendPath::P2wpkh { pubkey_hash } => pubkey_hash.to_vec(),
            SpendPath::P2sh { inner, .. } | SpendPath::P2wsh { inner, .. } => match inner {
                InnerKey::Pubkey(pubkey) => params.key_hash(pubkey).to_vec(),
                InnerKey::PubkeyHash(hash) => hash.to_vec(),
            },
            SpendPath::P2trKeyPath { output_key } => output_key.to_vec(),
            SpendPath::P2trScriptPath { internal_key, .. } => internal_key.to_vec(),
            SpendPath::Custom { .. } => Vec::new(),
        }
    }

    /// Build the claim from a signature (with sighash byte when required) and public key
    pub fn claim(&self, signature: &[u8], public_key: &[u8]) -> (Vec<u8>, Vec<Vec<u8>>) {
        let mut script_sig = Vec::new();
        let mut witness = Vec::new();

        match self {
            SpendPath::P2pk { .. } => push_data(signature, &mut script_sig),
            SpendPath::P2pkh { .. } => {
                push_data(signature, &mut script_sig);
                push_data(public_key, &mut script_sig);
            }
            SpendPath::P2sh { redeem_script, inner } => {
                push_data(signature, &mut script_sig);
                if matches!(inner, InnerKey::PubkeyHash(_)) {
                    push_data(public_key, &mut script_sig);
                }
                push_data(redeem_script, &mut script_sig);
            }
            SpendPath::P2shP2wpkh { redeem_script, .. } => {
                push_data(redeem_script, &mut script_sig);
                witness.push(signature.to_vec());
                witness.push(public_key.to_vec());
            }
            SpendPath::P2wpkh { .. } => {
                witness.push(signature.to_vec());
                witness.push(public_key.to_vec());
            }
            SpendPath::P2wsh { witness_script, inner } => {
                witness.push(signature.to_vec());
                if matches!(inner, InnerKey::PubkeyHash(_)) {
                    witness.push(public_key.to_vec());
                }
                witness.push(witness_script.clone());
            }
            SpendPath::P2trKeyPath { .. } => witness.push(signature.to_vec()),
            SpendPath::P2trScriptPath { leaf, control_block, .. } => {
                witness.push(signature.to_vec());
                witness.push(leaf.script.clone());
                witness.push(control_block.clone());
            }
            SpendPath::Custom { script_sig: sig_script, witness: stack } => {
                script_sig = sig_script.clone();
                witness = stack.clone();
            }
        }

        (script_sig, witness)
    }

    /// Claim with placeholder signature and key, used for size estimation
    pub fn placeholder_claim(&self) -> (Vec<u8>, Vec<Vec<u8>>) {
        let signature = match self.signing_method() {
            SigningMethod::Ecdsa => vec![0u8; ECDSA_SIG_PLACEHOLDER],
            SigningMethod::Schnorr => vec![0u8; SCHNORR_SIG_PLACEHOLDER],
        };
        self.claim(&signature, &[0u8; PUBKEY_PLACEHOLDER])
    }
}

fn redeem_script(utxo: &UnspentOutput, kind: &str) -> ScriptResult<Vec<u8>> {
    match &utxo.spending {
        Some(SpendingMaterial::RedeemScript { script }) => Ok(script.clone()),
        _ => Err(ScriptError::Unsupported(format!(
            "{} output without a redeem script",
            kind
        ))),
    }
}

fn inner_key(template: ScriptTemplate, context: &str) -> ScriptResult<InnerKey> {
    match template {
        ScriptTemplate::P2pk { pubkey } => Ok(InnerKey::Pubkey(pubkey)),
        ScriptTemplate::P2pkh { pubkey_hash } => Ok(InnerKey::PubkeyHash(pubkey_hash)),
        other => Err(ScriptError::Unsupported(format!("{} {}", context, other.name()))),
    }
}

fn require(supported: bool, kind: &str, params: &CoinParams) -> ScriptResult<()> {
    if supported {
        Ok(())
    } else {
        Err(ScriptError::Unsupported(format!("{} on {}", kind, params.name)))
    }
}
