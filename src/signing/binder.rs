//! Signature Binder
//!
//! Matches externally produced `(signature, public_key)` pairs to the
//! pre-image entries they sign. Pairs arrive in no particular order; a
//! pair binds to an entry when its key hashes (or tweaks) to the entry's
//! required key and its signature verifies over the entry's hash.

use bitcoin::secp256k1::PublicKey;

use super::PreparedTransaction;
use crate::crypto::ecdsa::{parse_public_key, verify_and_normalize};
use crate::crypto::schnorr::{verify_schnorr, x_only_bytes};
use crate::crypto::taproot::tweak_public_key;
use crate::script::SpendPath;
use crate::signing::preimage::SigHashType;
use crate::types::{ExternalSignature, PreimageEntry, PublicKeyType, SigningMethod};
use crate::{log_debug, log_info, log_warn};

/// Errors raised while binding signatures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    #[error("No input expects a signature from public key {public_key}")]
    NoMatchingSignature { public_key: String },

    #[error("Signature verification failed for input {input_index}")]
    SignatureVerificationFailed { input_index: usize },

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Got {signatures} signatures and {public_keys} public keys")]
    LengthMismatch { signatures: usize, public_keys: usize },
}

/// A verified signature ready to be placed into its input's claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundSignature {
    pub input_index: usize,
    /// Signature as it appears in the claim, sighash byte included when required
    pub signature: Vec<u8>,
    pub public_key: Vec<u8>,
}

/// Bind signatures to entries; inputs left without a usable candidate stay unbound
pub fn bind(
    prepared: &PreparedTransaction,
    entries: &[PreimageEntry],
    signatures: &[ExternalSignature],
    key_type: Option<PublicKeyType>,
) -> Result<Vec<BoundSignature>, BindError> {
    let has_taproot = entries.iter().any(|e| e.signing_method == SigningMethod::Schnorr);

    for sig in signatures {
        check_public_key(&sig.public_key, key_type, has_taproot)?;
    }

    // Every pair must belong to some input
    for sig in signatures {
        let wanted = entries
            .iter()
            .any(|entry| key_matches(prepared, entry, &sig.public_key));
        if !wanted {
            let public_key = hex::encode(&sig.public_key);
            log_warn!("binder", "signature for unknown key", public_key = public_key);
            return Err(BindError::NoMatchingSignature { public_key });
        }
    }

    let mut bound = Vec::with_capacity(entries.len());
    let mut used = vec![false; signatures.len()];
    let mut unverified = Vec::new();
    for entry in entries {
        if entry.required_pub_key_hash.is_empty() {
            continue;
        }

        let candidates: Vec<usize> = (0..signatures.len())
            .filter(|&i| key_matches(prepared, entry, &signatures[i].public_key))
            .collect();
        if candidates.is_empty() {
            log_debug!("binder", "no candidate", input = entry.input_index);
            continue;
        }

        let verified = candidates.iter().find_map(|&i| {
            claim_signature(entry, &signatures[i]).map(|signature| (i, signature))
        });

        match verified {
            Some((i, signature)) => {
                log_debug!(
                    "binder",
                    "signature bound",
                    input = entry.input_index,
                    candidates = candidates.len()
                );
                used[i] = true;
                bound.push(BoundSignature {
                    input_index: entry.input_index,
                    signature,
                    public_key: signatures[i].public_key.clone(),
                });
            }
            None => unverified.push((entry.input_index, candidates)),
        }
    }

    // A candidate that verifies nowhere is a bad signature; an input whose
    // candidates all belong to other inputs is simply unsigned
    for (input_index, candidates) in unverified {
        if candidates.iter().any(|&i| !used[i]) {
            log_warn!("binder", "no candidate verifies", input = input_index);
            return Err(BindError::SignatureVerificationFailed { input_index });
        }
        log_debug!("binder", "candidates spent elsewhere", input = input_index);
    }

    log_info!(
        "binder",
        "signatures bound",
        bound = bound.len(),
        entries = entries.len(),
        submitted = signatures.len()
    );
    Ok(bound)
}

// MARK: - Keys

fn check_public_key(key: &[u8], key_type: Option<PublicKeyType>, has_taproot: bool) -> Result<(), BindError> {
    let invalid = |reason: String| BindError::InvalidPublicKey(format!("{} ({})", hex::encode(key), reason));

    let accepted = match (key_type, key.len()) {
        (Some(PublicKeyType::Secp256k1), 33) | (Some(PublicKeyType::Secp256k1Extended), 65) | (None, 33 | 65) => true,
        (Some(PublicKeyType::Secp256k1) | None, 32) => has_taproot,
        _ => false,
    };
    if !accepted {
        let expected = match key_type {
            Some(PublicKeyType::Secp256k1Extended) => "65 bytes",
            _ if has_taproot => "33 or 32 bytes",
            Some(PublicKeyType::Secp256k1) => "33 bytes",
            None => "33 or 65 bytes",
        };
        return Err(invalid(format!("expected {}, got {} bytes", expected, key.len())));
    }

    if key.len() == 32 {
        x_only_bytes(key).map_err(|e| invalid(e.to_string()))?;
    } else {
        parse_public_key(key).map_err(|e| invalid(e.to_string()))?;
    }
    Ok(())
}

/// Whether `key` is the key an entry expects
fn key_matches(prepared: &PreparedTransaction, entry: &PreimageEntry, key: &[u8]) -> bool {
    if entry.required_pub_key_hash.is_empty() {
        return false;
    }
    let Some(input) = prepared.inputs.get(entry.input_index) else {
        return false;
    };

    match &input.path {
        SpendPath::P2trKeyPath { output_key } => {
            let Ok(x_only) = x_only_bytes(key) else {
                return false;
            };
            if key.len() == 32 && x_only == *output_key {
                return true;
            }
            tweak_public_key(&x_only, None).is_ok_and(|tweaked| tweaked.output_key == *output_key)
        }
        SpendPath::P2trScriptPath { internal_key, .. } => {
            x_only_bytes(key).is_ok_and(|x_only| x_only == *internal_key)
        }
        _ => {
            (key.len() == 33 || key.len() == 65)
                && prepared.params.key_hash(key).as_slice() == entry.required_pub_key_hash.as_slice()
        }
    }
}

// MARK: - Signatures

/// Verify a candidate and return the signature as the claim carries it
fn claim_signature(entry: &PreimageEntry, sig: &ExternalSignature) -> Option<Vec<u8>> {
    match entry.signing_method {
        SigningMethod::Ecdsa => {
            let public_key = parse_public_key(&sig.public_key).ok()?;
            let der = verify_der(entry, &sig.signature, &public_key)?;
            let mut signature = der;
            signature.push(entry.sighash_type.to_byte());
            Some(signature)
        }
        SigningMethod::Schnorr => {
            let key: [u8; 32] = entry.required_pub_key_hash.as_slice().try_into().ok()?;
            let raw = match (sig.signature.len(), entry.sighash_type) {
                (64, _) => &sig.signature[..],
                (65, SigHashType::Default) => return None,
                (65, ht) if sig.signature[64] == ht.to_byte() => &sig.signature[..64],
                _ => return None,
            };
            if !verify_schnorr(&entry.preimage_hash, raw, &key) {
                return None;
            }
            let mut signature = raw.to_vec();
            if entry.sighash_type != SigHashType::Default {
                signature.push(entry.sighash_type.to_byte());
            }
            Some(signature)
        }
    }
}

/// Strict DER, optionally followed by the entry's hash-type byte; low-S on success
fn verify_der(entry: &PreimageEntry, signature: &[u8], public_key: &PublicKey) -> Option<Vec<u8>> {
    if let Some(der) = verify_and_normalize(&entry.preimage_hash, signature, public_key) {
        return Some(der);
    }
    match signature.split_last() {
        Some((&last, der)) if last == entry.sighash_type.to_byte() => {
            verify_and_normalize(&entry.preimage_hash, der, public_key)
        }
        _ => None,
    }
}
