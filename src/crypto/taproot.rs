//! Taproot Key Tweaking (BIP-341)
//!
//! Internal key to output key tweaking, single-leaf script commitments
//! and control block construction for script-path spends.
//!
//! Reference: https://github.com/bitcoin/bips/blob/master/bip-0341.mediawiki

use bitcoin::secp256k1::{Keypair, Parity, Scalar, XOnlyPublicKey};

use super::schnorr::{tagged_hash, tags};
use super::{secp, CryptoError};

// MARK: - Taproot Constants

/// Default TapScript leaf version (0xc0)
pub const TAPSCRIPT_LEAF_VERSION: u8 = 0xc0;

// MARK: - Taproot Types

/// Taproot output key (tweaked public key)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaprootOutputKey {
    /// The x-only output public key
    pub output_key: [u8; 32],
    /// Parity of the output key (needed for script-path spending)
    pub parity: bool,
}

/// TapLeaf - a single script in the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapLeaf {
    /// Leaf version (default 0xc0 for TapScript)
    pub version: u8,
    /// The script bytes
    pub script: Vec<u8>,
}

impl TapLeaf {
    /// Create a new TapLeaf with default version
    pub fn new(script: Vec<u8>) -> Self {
        Self {
            version: TAPSCRIPT_LEAF_VERSION,
            script,
        }
    }

    /// Calculate the leaf hash
    ///
    /// TapLeaf hash = tagged_hash("TapLeaf", version || compact_size(script) || script)
    pub fn hash(&self) -> [u8; 32] {
        let mut data = Vec::with_capacity(1 + 9 + self.script.len());
        data.push(self.version);
        crate::tx::write_var_int(self.script.len() as u64, &mut data);
        data.extend_from_slice(&self.script);

        tagged_hash(tags::TAP_LEAF, &data)
    }
}

/// Control block for script-path spending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlBlock {
    /// Leaf version with parity bit
    pub leaf_version_with_parity: u8,
    /// Internal public key (32 bytes)
    pub internal_key: [u8; 32],
    /// Merkle path (each element is 32 bytes)
    pub merkle_path: Vec<[u8; 32]>,
}

impl ControlBlock {
    /// Create a new control block
    pub fn new(leaf_version: u8, output_key_parity: bool, internal_key: [u8; 32], merkle_path: Vec<[u8; 32]>) -> Self {
        let leaf_version_with_parity = leaf_version | if output_key_parity { 0x01 } else { 0x00 };

        Self {
            leaf_version_with_parity,
            internal_key,
            merkle_path,
        }
    }

    /// Serialize to bytes
    pub fn serialize(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(1 + 32 + self.merkle_path.len() * 32);
        data.push(self.leaf_version_with_parity);
        data.extend_from_slice(&self.internal_key);
        for hash in &self.merkle_path {
            data.extend_from_slice(hash);
        }
        data
    }
}

// MARK: - Taproot Functions

/// Calculate the tweak hash
///
/// tweak = tagged_hash("TapTweak", internal_key || merkle_root)
///
/// Without a script tree (key-path only) the merkle root is omitted.
pub fn tap_tweak_hash(internal_key: &[u8; 32], merkle_root: Option<&[u8; 32]>) -> [u8; 32] {
    match merkle_root {
        Some(root) => {
            let mut data = [0u8; 64];
            data[..32].copy_from_slice(internal_key);
            data[32..].copy_from_slice(root);
            tagged_hash(tags::TAP_TWEAK, &data)
        }
        None => tagged_hash(tags::TAP_TWEAK, internal_key),
    }
}

fn tweak_scalar(internal_key: &[u8; 32], merkle_root: Option<&[u8; 32]>) -> Result<Scalar, CryptoError> {
    Scalar::from_be_bytes(tap_tweak_hash(internal_key, merkle_root))
        .map_err(|e| CryptoError::TweakFailed(e.to_string()))
}

/// Tweak an internal public key to create the output key
///
/// output_key = internal_key + tweak * G
pub fn tweak_public_key(
    internal_key: &[u8; 32],
    merkle_root: Option<&[u8; 32]>,
) -> Result<TaprootOutputKey, CryptoError> {
    let key = XOnlyPublicKey::from_slice(internal_key)
        .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
    let scalar = tweak_scalar(internal_key, merkle_root)?;

    let (output_key, parity) = key
        .add_tweak(secp(), &scalar)
        .map_err(|e| CryptoError::TweakFailed(e.to_string()))?;

    Ok(TaprootOutputKey {
        output_key: output_key.serialize(),
        parity: parity == Parity::Odd,
    })
}

/// Tweak a keypair for key-path spending
///
/// tweaked_key = private_key + tweak (mod n), after negating for odd y
pub fn tweak_keypair(keypair: Keypair, merkle_root: Option<&[u8; 32]>) -> Result<Keypair, CryptoError> {
    let (internal_key, _parity) = keypair.x_only_public_key();
    let scalar = tweak_scalar(&internal_key.serialize(), merkle_root)?;

    keypair
        .add_xonly_tweak(secp(), &scalar)
        .map_err(|e| CryptoError::TweakFailed(e.to_string()))
}

/// Commitment for a single-leaf script tree
///
/// Returns the output key and the control block that proves `leaf` is
/// committed to by it.
pub fn single_leaf_commitment(
    internal_key: &[u8; 32],
    leaf: &TapLeaf,
) -> Result<(TaprootOutputKey, ControlBlock), CryptoError> {
    let merkle_root = leaf.hash();
    let output = tweak_public_key(internal_key, Some(&merkle_root))?;
    let control = ControlBlock::new(leaf.version, output.parity, *internal_key, Vec::new());
    Ok((output, control))
}
