//! Compiler Messages
//!
//! The four request/response operations of the external-signer flow.
//! Each one re-derives the plan from the request unless a reviewed plan
//! is supplied, so callers pass the plan back to keep the compiled
//! transaction identical to what was reviewed.

use bitcoin::secp256k1::{Keypair, PublicKey, SecretKey};

use super::binder::{self, BindError};
use super::{compiler, preimage, prepare, PreparedTransaction};
use crate::crypto::ecdsa::sign_ecdsa_der;
use crate::crypto::schnorr::sign_schnorr;
use crate::crypto::taproot::{tweak_keypair, tweak_public_key};
use crate::crypto::{secp, CryptoError};
use crate::error::CompilerResult;
use crate::script::SpendPath;
use crate::types::{
    ExternalSignature, PreSigningOutput, PreimageEntry, PrivateKeyBytes, PublicKeyType, SignedTransaction,
    SigningInput, TransactionPlan,
};
use crate::wallet::plan_transaction;
use crate::{log_debug, log_warn};

/// Select inputs and settle fee and change
pub fn plan(input: &SigningInput) -> CompilerResult<TransactionPlan> {
    plan_transaction(input)
}

/// Hashes the external signer must sign; errors travel inside the response
pub fn pre_image_hashes(input: &SigningInput) -> PreSigningOutput {
    let result = prepare(input).and_then(|prepared| preimage::compute(&prepared).map_err(Into::into));
    match result {
        Ok(entries) => PreSigningOutput::ok(entries),
        Err(e) => {
            log_warn!("messages", "pre-image request failed", reason = e);
            PreSigningOutput::failed(&e)
        }
    }
}

/// Compile with signatures and keys paired by position; key type inferred from length
pub fn compile_with_signatures(
    input: &SigningInput,
    signatures: &[Vec<u8>],
    public_keys: &[Vec<u8>],
) -> CompilerResult<SignedTransaction> {
    compile(input, signatures, public_keys, None)
}

/// Compile with signatures and keys of a declared encoding
pub fn compile_with_signatures_and_pubkey_type(
    input: &SigningInput,
    signatures: &[Vec<u8>],
    public_keys: &[Vec<u8>],
    key_type: PublicKeyType,
) -> CompilerResult<SignedTransaction> {
    compile(input, signatures, public_keys, Some(key_type))
}

/// Sign every pre-image with the request's private keys, then compile
pub fn sign(input: &SigningInput) -> CompilerResult<SignedTransaction> {
    let prepared = prepare(input)?;
    let entries = preimage::compute(&prepared)?;

    let keys = input
        .private_keys
        .iter()
        .map(secret_key)
        .collect::<Result<Vec<_>, _>>()?;

    let mut signatures = Vec::with_capacity(entries.len());
    for entry in &entries {
        if entry.required_pub_key_hash.is_empty() {
            continue;
        }
        let signature = sign_entry(&prepared, entry, &keys).ok_or_else(|| {
            log_warn!("messages", "no private key for input", input = entry.input_index);
            BindError::NoMatchingSignature {
                public_key: hex::encode(&entry.required_pub_key_hash),
            }
        })?;
        signatures.push(signature);
    }

    let bound = binder::bind(&prepared, &entries, &signatures, None)?;
    Ok(compiler::assemble(&prepared, &bound)?)
}

fn compile(
    input: &SigningInput,
    signatures: &[Vec<u8>],
    public_keys: &[Vec<u8>],
    key_type: Option<PublicKeyType>,
) -> CompilerResult<SignedTransaction> {
    if signatures.len() != public_keys.len() {
        return Err(BindError::LengthMismatch {
            signatures: signatures.len(),
            public_keys: public_keys.len(),
        }
        .into());
    }
    let pairs: Vec<ExternalSignature> = signatures
        .iter()
        .zip(public_keys)
        .map(|(signature, public_key)| ExternalSignature::new(signature.clone(), public_key.clone()))
        .collect();

    let prepared = prepare(input)?;
    let entries = preimage::compute(&prepared)?;
    let bound = binder::bind(&prepared, &entries, &pairs, key_type)?;
    Ok(compiler::assemble(&prepared, &bound)?)
}

// MARK: - Local signing

fn secret_key(key: &PrivateKeyBytes) -> Result<SecretKey, CryptoError> {
    SecretKey::from_slice(key.as_bytes()).map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))
}

/// Sign one entry with whichever local key it expects
fn sign_entry(prepared: &PreparedTransaction, entry: &PreimageEntry, keys: &[SecretKey]) -> Option<ExternalSignature> {
    let path = &prepared.inputs.get(entry.input_index)?.path;
    let params = prepared.params;

    for secret in keys {
        let public = PublicKey::from_secret_key(secp(), secret);
        let compressed = public.serialize();

        match path {
            SpendPath::P2trKeyPath { output_key } => {
                let keypair = Keypair::from_secret_key(secp(), secret);
                let (internal, _) = keypair.x_only_public_key();
                let matches = tweak_public_key(&internal.serialize(), None)
                    .is_ok_and(|tweaked| tweaked.output_key == *output_key);
                if matches {
                    let tweaked = tweak_keypair(keypair, None).ok()?;
                    let signature = sign_schnorr(&entry.preimage_hash, &tweaked);
                    log_debug!("messages", "signed key path", input = entry.input_index);
                    return Some(ExternalSignature::new(signature.to_vec(), compressed.to_vec()));
                }
            }
            SpendPath::P2trScriptPath { internal_key, .. } => {
                let keypair = Keypair::from_secret_key(secp(), secret);
                if keypair.x_only_public_key().0.serialize() == *internal_key {
                    let signature = sign_schnorr(&entry.preimage_hash, &keypair);
                    log_debug!("messages", "signed script path", input = entry.input_index);
                    return Some(ExternalSignature::new(signature.to_vec(), compressed.to_vec()));
                }
            }
            _ => {
                let uncompressed = public.serialize_uncompressed();
                let matched = [&compressed[..], &uncompressed[..]]
                    .into_iter()
                    .find(|key| params.key_hash(key).as_slice() == entry.required_pub_key_hash.as_slice());
                if let Some(key) = matched {
                    let signature = sign_ecdsa_der(&entry.preimage_hash, secret);
                    log_debug!("messages", "signed ecdsa", input = entry.input_index);
                    return Some(ExternalSignature::new(signature, key.to_vec()));
                }
            }
        }
    }
    None
}
