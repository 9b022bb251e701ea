//! UTXO Transaction Compiler
//!
//! Builds, hashes and assembles transactions for UTXO chains whose keys
//! live outside this process (hardware wallets, HSMs, remote signers).
//!
//! # Architecture
//!
//! This crate provides:
//! - **wallet**: UTXO selection and transaction planning
//! - **fees**: Size and weight estimation per script template
//! - **script**: Template building, matching and address resolution
//! - **signing**: Pre-image hashing, signature binding and assembly
//! - **tx**: Transaction model and per-coin wire framing
//! - **coins**: Parameters for Bitcoin, Litecoin, Dogecoin, Zcash, Groestlcoin and Decred
//!
//! # Flow
//!
//! 1. [`plan`] selects inputs and settles fee and change.
//! 2. [`pre_image_hashes`] returns one hash per input for the external signer.
//! 3. [`compile_with_signatures`] checks each returned signature against its
//!    hash, places it in the right input and serializes the transaction.
//!
//! [`sign`] runs the same pipeline with local private keys.
//!
//! # Security
//!
//! Private keys handed to [`sign`] are held in `zeroize` buffers and are
//! cleared when the request is dropped.
//!
//! # Example
//!
//! ```rust,ignore
//! use utxo_compiler::{compile_with_signatures, pre_image_hashes};
//!
//! let hashes = pre_image_hashes(&request);
//! let signatures = signer.sign_all(&hashes.preimages)?;
//! let signed = compile_with_signatures(&request, &signatures, &public_keys)?;
//! println!("{}", signed.txid);
//! ```

pub mod coins;
pub mod crypto;
pub mod error;
pub mod fees;
pub mod script;
pub mod serde_bytes;
pub mod signing;
pub mod tx;
pub mod types;
pub mod utils;
pub mod wallet;

// Re-export key types for convenience
pub use coins::{CoinParams, CoinType};
pub use error::{CompilerError, CompilerResult, ErrorCode};
pub use signing::preimage::SigHashType;
pub use signing::{
    compile_with_signatures, compile_with_signatures_and_pubkey_type, plan, pre_image_hashes, sign,
};
pub use types::*;
