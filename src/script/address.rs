//! Address resolution
//!
//! The narrow inverse needed to turn a recipient address into a locking
//! script: base58check with the coin's prefixes and checksum, and
//! bech32/bech32m witness programs with the coin's hrp. Address encoding
//! lives with the wallet, not here.

use bech32::{FromBase32, Variant};

use super::template::ScriptTemplate;
use super::{ScriptError, ScriptResult};
use crate::coins::CoinParams;

/// Resolve an address string to its output template
pub fn resolve_address(address: &str, params: &CoinParams) -> ScriptResult<ScriptTemplate> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(ScriptError::InvalidAddress("empty address".to_string()));
    }

    if let Some(hrp) = params.hrp {
        let lower = trimmed.to_lowercase();
        if lower.starts_with(&format!("{}1", hrp)) {
            return resolve_segwit(trimmed, hrp);
        }
    }

    resolve_base58(trimmed, params)
}

fn resolve_segwit(address: &str, expected_hrp: &str) -> ScriptResult<ScriptTemplate> {
    let (hrp, data, variant) =
        bech32::decode(address).map_err(|e| ScriptError::InvalidAddress(format!("bech32: {}", e)))?;

    if hrp != expected_hrp {
        return Err(ScriptError::InvalidAddress(format!(
            "expected hrp {}, got {}",
            expected_hrp, hrp
        )));
    }

    let (version, program_5bit) = data
        .split_first()
        .ok_or_else(|| ScriptError::InvalidAddress("missing witness version".to_string()))?;
    let version = version.to_u8();
    let program = Vec::<u8>::from_base32(program_5bit)
        .map_err(|e| ScriptError::InvalidAddress(format!("bech32 program: {}", e)))?;

    let expected_variant = if version == 0 { Variant::Bech32 } else { Variant::Bech32m };
    if variant != expected_variant {
        return Err(ScriptError::InvalidAddress(format!(
            "witness v{} requires {:?} checksum",
            version, expected_variant
        )));
    }

    match (version, program.len()) {
        (0, 20) => Ok(ScriptTemplate::P2wpkh { pubkey_hash: to_array(&program) }),
        (0, 32) => Ok(ScriptTemplate::P2wsh { script_hash: to_array(&program) }),
        (1, 32) => Ok(ScriptTemplate::P2trKeyPath { output_key: to_array(&program) }),
        (v, len) => Err(ScriptError::Unsupported(format!(
            "witness v{} program of {} bytes",
            v, len
        ))),
    }
}

fn resolve_base58(address: &str, params: &CoinParams) -> ScriptResult<ScriptTemplate> {
    let decoded = bs58::decode(address)
        .into_vec()
        .map_err(|e| ScriptError::InvalidAddress(format!("base58: {}", e)))?;

    let prefix_len = params.p2pkh_prefix.len();
    if decoded.len() != prefix_len + 20 + 4 {
        return Err(ScriptError::InvalidAddress(format!(
            "unexpected length {}",
            decoded.len()
        )));
    }

    let (payload, checksum) = decoded.split_at(decoded.len() - 4);
    if params.base58_checksum.checksum(payload) != checksum {
        return Err(ScriptError::InvalidAddress("checksum mismatch".to_string()));
    }

    let (prefix, hash) = payload.split_at(prefix_len);
    if prefix == params.p2pkh_prefix {
        Ok(ScriptTemplate::P2pkh { pubkey_hash: to_array(hash) })
    } else if prefix == params.p2sh_prefix {
        Ok(ScriptTemplate::P2sh { script_hash: to_array(hash) })
    } else {
        Err(ScriptError::InvalidAddress(format!(
            "prefix {} does not belong to {}",
            hex::encode(prefix),
            params.name
        )))
    }
}

fn to_array<const N: usize>(slice: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(slice);
    out
}
