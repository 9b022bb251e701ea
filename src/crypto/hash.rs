//! Hash Functions
//!
//! Thin wrappers returning fixed-size arrays so callers can compare and
//! serialize digests without touching the underlying hash crates.

use bitcoin::hashes::{hash160 as btc_hash160, sha256 as btc_sha256, sha256d as btc_sha256d, Hash};
use blake_hash::Blake256;
use groestl::Groestl512;
use ripemd::Ripemd160;
use sha2::Digest;

/// Single SHA-256
pub fn sha256(data: &[u8]) -> [u8; 32] {
    btc_sha256::Hash::hash(data).to_byte_array()
}

/// Double SHA-256
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    btc_sha256d::Hash::hash(data).to_byte_array()
}

/// RIPEMD-160(SHA-256(data))
pub fn hash160(data: &[u8]) -> [u8; 20] {
    btc_hash160::Hash::hash(data).to_byte_array()
}

/// RIPEMD-160 of an arbitrary byte string
pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    let mut out = [0u8; 20];
    out.copy_from_slice(&Ripemd160::digest(data));
    out
}

/// BLAKE-256 (14 rounds), Decred's transaction and key hash
pub fn blake256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&<Blake256 as blake_hash::Digest>::digest(data));
    out
}

/// BLAKE-256(BLAKE-256(data))
pub fn blake256d(data: &[u8]) -> [u8; 32] {
    blake256(&blake256(data))
}

/// RIPEMD-160(BLAKE-256(data)), the Decred key hash
pub fn blake256_ripemd160(data: &[u8]) -> [u8; 20] {
    ripemd160(&blake256(data))
}

/// Groestl-512(Groestl-512(data))
pub fn groestl512d(data: &[u8]) -> [u8; 64] {
    let first = Groestl512::digest(data);
    let second = Groestl512::digest(first);
    let mut out = [0u8; 64];
    out.copy_from_slice(&second);
    out
}
