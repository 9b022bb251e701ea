//! BIP-340 Schnorr Signatures
//!
//! Tagged hashes plus the sign/verify pair used for Taproot inputs.
//!
//! Reference: https://github.com/bitcoin/bips/blob/master/bip-0340.mediawiki

use bitcoin::secp256k1::{schnorr::Signature as SchnorrSignature, Keypair, Message, XOnlyPublicKey};

use super::{secp, CryptoError};

// MARK: - Tagged Hash Functions

/// BIP-340 tagged hash computation
///
/// tagged_hash(tag, msg) = SHA256(SHA256(tag) || SHA256(tag) || msg)
pub fn tagged_hash(tag: &str, msg: &[u8]) -> [u8; 32] {
    use sha2::{Digest, Sha256};

    let tag_hash = Sha256::digest(tag.as_bytes());

    let mut hasher = Sha256::new();
    hasher.update(tag_hash);
    hasher.update(tag_hash);
    hasher.update(msg);

    let mut output = [0u8; 32];
    output.copy_from_slice(&hasher.finalize());
    output
}

/// Standard BIP-340/341 tags
pub mod tags {
    pub const TAP_TWEAK: &str = "TapTweak";
    pub const TAP_LEAF: &str = "TapLeaf";
    pub const TAP_SIGHASH: &str = "TapSighash";
}

// MARK: - Keys

/// Reduce a 33-byte compressed key or a 32-byte x-only key to x-only form
pub fn x_only_bytes(public_key: &[u8]) -> Result<[u8; 32], CryptoError> {
    let mut out = [0u8; 32];
    match public_key.len() {
        32 => out.copy_from_slice(public_key),
        33 if public_key[0] == 0x02 || public_key[0] == 0x03 => out.copy_from_slice(&public_key[1..]),
        n => {
            return Err(CryptoError::InvalidPublicKey(format!(
                "expected 32 or 33 byte key, got {} bytes",
                n
            )))
        }
    }
    XOnlyPublicKey::from_slice(&out).map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
    Ok(out)
}

// MARK: - Sign / Verify

/// Sign a 32-byte digest without auxiliary randomness (deterministic)
pub fn sign_schnorr(digest: &[u8; 32], keypair: &Keypair) -> [u8; 64] {
    let msg = Message::from_digest(*digest);
    let sig = secp().sign_schnorr_no_aux_rand(&msg, keypair);
    *sig.as_ref()
}

/// Verify a 64-byte BIP-340 signature against an x-only key
pub fn verify_schnorr(digest: &[u8; 32], signature: &[u8], x_only_key: &[u8; 32]) -> bool {
    let Ok(sig) = SchnorrSignature::from_slice(signature) else {
        return false;
    };
    let Ok(key) = XOnlyPublicKey::from_slice(x_only_key) else {
        return false;
    };
    let msg = Message::from_digest(*digest);
    secp().verify_schnorr(&sig, &msg, &key).is_ok()
}
