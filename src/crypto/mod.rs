//! Cryptographic primitives for the compiler
//!
//! This module provides low-level cryptographic operations including:
//! - Hash functions for every supported coin (SHA-256d, Hash160, BLAKE-256, Groestl)
//! - secp256k1 ECDSA over precomputed digests
//! - Schnorr signatures (BIP-340) for Bitcoin Taproot
//! - Taproot key tweaking and control blocks

pub mod ecdsa;
pub mod hash;
pub mod schnorr;
pub mod taproot;

use bitcoin::secp256k1::{All, Secp256k1};
use std::sync::OnceLock;

pub use schnorr::{tagged_hash, tags};
pub use taproot::{ControlBlock, TapLeaf, TaprootOutputKey, TAPSCRIPT_LEAF_VERSION};

/// Errors raised by key parsing and tweaking
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Tweak failed: {0}")]
    TweakFailed(String),
}

static SECP: OnceLock<Secp256k1<All>> = OnceLock::new();

/// Shared secp256k1 context
pub fn secp() -> &'static Secp256k1<All> {
    SECP.get_or_init(Secp256k1::new)
}
