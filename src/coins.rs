//! Coin Dispatch Table
//!
//! One pipeline serves every supported chain. Everything coin-specific
//! that the selector, sighash computer and assembler need is looked up
//! here by [`CoinType`]; there are no per-coin code paths outside the
//! framing and sighash variants named by [`CoinParams`].

use serde::{Deserialize, Serialize};

use crate::crypto::hash::{blake256, blake256_ripemd160, blake256d, groestl512d, hash160, sha256, sha256d};

/// Supported UTXO coins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoinType {
    Bitcoin,
    Litecoin,
    Dogecoin,
    Zcash,
    Groestlcoin,
    Decred,
}

impl CoinType {
    /// Parameter set for this coin
    pub fn params(&self) -> &'static CoinParams {
        match self {
            CoinType::Bitcoin => &BITCOIN,
            CoinType::Litecoin => &LITECOIN,
            CoinType::Dogecoin => &DOGECOIN,
            CoinType::Zcash => &ZCASH,
            CoinType::Groestlcoin => &GROESTLCOIN,
            CoinType::Decred => &DECRED,
        }
    }
}

/// Checksum used by base58check addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumHasher {
    Sha256d,
    Groestl512d,
    Blake256d,
}

impl ChecksumHasher {
    /// First four bytes of the digest
    pub fn checksum(&self, data: &[u8]) -> [u8; 4] {
        let mut out = [0u8; 4];
        match self {
            ChecksumHasher::Sha256d => out.copy_from_slice(&sha256d(data)[..4]),
            ChecksumHasher::Groestl512d => out.copy_from_slice(&groestl512d(data)[..4]),
            ChecksumHasher::Blake256d => out.copy_from_slice(&blake256d(data)[..4]),
        }
        out
    }
}

/// Hash committing to a public key or script in P2PKH/P2SH/P2WPKH outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyHasher {
    Hash160,
    Blake256Ripemd160,
}

impl KeyHasher {
    pub fn hash(&self, data: &[u8]) -> [u8; 20] {
        match self {
            KeyHasher::Hash160 => hash160(data),
            KeyHasher::Blake256Ripemd160 => blake256_ripemd160(data),
        }
    }
}

/// Which signature-hash algorithm family the coin uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SighashVariant {
    /// Legacy, BIP143 and BIP341 with double SHA-256
    Bitcoin,
    /// Bitcoin algorithms with single SHA-256 everywhere
    Groestl,
    /// ZIP-243
    ZcashSapling,
    /// BLAKE-256 prefix/witness commitment
    Decred,
}

/// Wire framing of the serialized transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    Bitcoin,
    ZcashSapling,
    Decred,
}

/// Hash producing the transaction id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxidHasher {
    Sha256d,
    Sha256,
    Blake256,
}

impl TxidHasher {
    pub fn hash(&self, data: &[u8]) -> [u8; 32] {
        match self {
            TxidHasher::Sha256d => sha256d(data),
            TxidHasher::Sha256 => sha256(data),
            TxidHasher::Blake256 => blake256(data),
        }
    }
}

/// Per-coin parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinParams {
    pub name: &'static str,
    pub p2pkh_prefix: &'static [u8],
    pub p2sh_prefix: &'static [u8],
    pub hrp: Option<&'static str>,
    pub base58_checksum: ChecksumHasher,
    pub key_hasher: KeyHasher,
    pub sighash_variant: SighashVariant,
    pub framing: Framing,
    pub txid_hasher: TxidHasher,
    pub default_version: u32,
    pub default_dust: u64,
    pub supports_segwit: bool,
    pub supports_taproot: bool,
    pub default_branch_id: Option<u32>,
    pub version_group_id: Option<u32>,
}

impl CoinParams {
    /// Hash of a public key or script as committed to by this coin
    pub fn key_hash(&self, data: &[u8]) -> [u8; 20] {
        self.key_hasher.hash(data)
    }

    /// Digest used for Bitcoin-family sighashes and their intermediate hashes
    pub fn sighash_digest(&self, data: &[u8]) -> [u8; 32] {
        match self.sighash_variant {
            SighashVariant::Groestl => sha256(data),
            _ => sha256d(data),
        }
    }
}

/// Zcash Sapling consensus branch id
pub const SAPLING_BRANCH_ID: u32 = 0x76b8_09bb;
/// Zcash Sapling version group id
pub const SAPLING_VERSION_GROUP_ID: u32 = 0x892f_2085;
/// Zcash v4 header (overwintered flag set)
pub const SAPLING_TX_VERSION: u32 = 0x8000_0004;

static BITCOIN: CoinParams = CoinParams {
    name: "bitcoin",
    p2pkh_prefix: &[0x00],
    p2sh_prefix: &[0x05],
    hrp: Some("bc"),
    base58_checksum: ChecksumHasher::Sha256d,
    key_hasher: KeyHasher::Hash160,
    sighash_variant: SighashVariant::Bitcoin,
    framing: Framing::Bitcoin,
    txid_hasher: TxidHasher::Sha256d,
    default_version: 1,
    default_dust: 546,
    supports_segwit: true,
    supports_taproot: true,
    default_branch_id: None,
    version_group_id: None,
};

static LITECOIN: CoinParams = CoinParams {
    name: "litecoin",
    p2pkh_prefix: &[0x30],
    p2sh_prefix: &[0x32],
    hrp: Some("ltc"),
    base58_checksum: ChecksumHasher::Sha256d,
    key_hasher: KeyHasher::Hash160,
    sighash_variant: SighashVariant::Bitcoin,
    framing: Framing::Bitcoin,
    txid_hasher: TxidHasher::Sha256d,
    default_version: 1,
    default_dust: 546,
    supports_segwit: true,
    supports_taproot: false,
    default_branch_id: None,
    version_group_id: None,
};

static DOGECOIN: CoinParams = CoinParams {
    name: "dogecoin",
    p2pkh_prefix: &[0x1e],
    p2sh_prefix: &[0x16],
    hrp: None,
    base58_checksum: ChecksumHasher::Sha256d,
    key_hasher: KeyHasher::Hash160,
    sighash_variant: SighashVariant::Bitcoin,
    framing: Framing::Bitcoin,
    txid_hasher: TxidHasher::Sha256d,
    default_version: 1,
    default_dust: 1_000_000,
    supports_segwit: false,
    supports_taproot: false,
    default_branch_id: None,
    version_group_id: None,
};

static ZCASH: CoinParams = CoinParams {
    name: "zcash",
    p2pkh_prefix: &[0x1c, 0xb8],
    p2sh_prefix: &[0x1c, 0xbd],
    hrp: None,
    base58_checksum: ChecksumHasher::Sha256d,
    key_hasher: KeyHasher::Hash160,
    sighash_variant: SighashVariant::ZcashSapling,
    framing: Framing::ZcashSapling,
    txid_hasher: TxidHasher::Sha256d,
    default_version: SAPLING_TX_VERSION,
    default_dust: 546,
    supports_segwit: false,
    supports_taproot: false,
    default_branch_id: Some(SAPLING_BRANCH_ID),
    version_group_id: Some(SAPLING_VERSION_GROUP_ID),
};

static GROESTLCOIN: CoinParams = CoinParams {
    name: "groestlcoin",
    p2pkh_prefix: &[0x24],
    p2sh_prefix: &[0x05],
    hrp: Some("grs"),
    base58_checksum: ChecksumHasher::Groestl512d,
    key_hasher: KeyHasher::Hash160,
    sighash_variant: SighashVariant::Groestl,
    framing: Framing::Bitcoin,
    txid_hasher: TxidHasher::Sha256,
    default_version: 1,
    default_dust: 546,
    supports_segwit: true,
    supports_taproot: false,
    default_branch_id: None,
    version_group_id: None,
};

static DECRED: CoinParams = CoinParams {
    name: "decred",
    p2pkh_prefix: &[0x07, 0x3f],
    p2sh_prefix: &[0x07, 0x1a],
    hrp: None,
    base58_checksum: ChecksumHasher::Blake256d,
    key_hasher: KeyHasher::Blake256Ripemd160,
    sighash_variant: SighashVariant::Decred,
    framing: Framing::Decred,
    txid_hasher: TxidHasher::Blake256,
    default_version: 1,
    default_dust: 6030,
    supports_segwit: false,
    supports_taproot: false,
    default_branch_id: None,
    version_group_id: None,
};
