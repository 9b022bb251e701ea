//! Shared types for the compiler boundary
//!
//! All data structures that cross the message boundary are defined here
//! for consistent serialization. Byte fields are lowercase hex strings.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::Zeroizing;

use crate::coins::CoinType;
use crate::error::{CompilerError, CompilerResult, ErrorCode};
use crate::script::template::ScriptTemplate;
use crate::serde_bytes::{hex32, hex_vec, hex_vec_list};
use crate::signing::preimage::SigHashType;
use crate::wallet::utxo::SelectionPolicy;

// =============================================================================
// Inputs
// =============================================================================

/// Reference to a previous transaction output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    /// Previous transaction hash in wire byte order
    #[serde(with = "hex32")]
    pub hash: [u8; 32],
    pub vout: u32,
    /// Decred tree (0 regular, 1 stake)
    #[serde(default)]
    pub tree: u8,
}

impl OutPoint {
    pub fn new(hash: [u8; 32], vout: u32) -> Self {
        Self { hash, vout, tree: 0 }
    }

    /// Build from a txid as block explorers display it (reversed byte order)
    pub fn from_txid_hex(txid: &str, vout: u32) -> CompilerResult<Self> {
        let mut hash: [u8; 32] = hex::decode(txid.trim_start_matches("0x"))?
            .try_into()
            .map_err(|_| CompilerError::invalid_input("txid must be 32 bytes"))?;
        hash.reverse();
        Ok(Self::new(hash, vout))
    }

    /// Display-order txid
    pub fn txid_hex(&self) -> String {
        let mut display = self.hash;
        display.reverse();
        hex::encode(display)
    }
}

fn default_sequence() -> u32 {
    crate::utils::get_compiler_config().default_sequence
}

/// A candidate unspent output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnspentOutput {
    pub outpoint: OutPoint,
    pub value: u64,
    /// Locking script of the output being spent
    #[serde(with = "hex_vec")]
    pub script: Vec<u8>,
    #[serde(default = "default_sequence")]
    pub sequence: u32,
    /// Overrides the request-wide hash type for this input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sighash_type: Option<SigHashType>,
    /// Material needed to spend scripts that commit to more than a key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spending: Option<SpendingMaterial>,
}

impl UnspentOutput {
    pub fn new(outpoint: OutPoint, value: u64, script: Vec<u8>) -> Self {
        Self {
            outpoint,
            value,
            script,
            sequence: default_sequence(),
            sighash_type: None,
            spending: None,
        }
    }

    pub fn with_spending(mut self, spending: SpendingMaterial) -> Self {
        self.spending = Some(spending);
        self
    }
}

/// Per-input spending material
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpendingMaterial {
    /// P2SH redeem script or P2WSH witness script
    RedeemScript {
        #[serde(with = "hex_vec")]
        script: Vec<u8>,
    },
    /// Taproot script-path spend of a single-leaf tree
    TapScript {
        #[serde(with = "hex_vec")]
        leaf_script: Vec<u8>,
        #[serde(with = "hex32")]
        internal_key: [u8; 32],
    },
    /// Reveal of an inscription commitment
    Inscription {
        #[serde(with = "hex32")]
        internal_key: [u8; 32],
        mime_type: String,
        #[serde(with = "hex_vec")]
        payload: Vec<u8>,
    },
    /// Caller-built claim, used verbatim
    Custom {
        #[serde(with = "hex_vec")]
        script_sig: Vec<u8>,
        #[serde(default, with = "hex_vec_list")]
        witness: Vec<Vec<u8>>,
    },
}

// =============================================================================
// Outputs
// =============================================================================

/// Where an output pays to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recipient {
    Address(String),
    Script(ScriptTemplate),
}

/// Requested output; a missing value marks the change (or max) output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputIntent {
    pub to: Recipient,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<u64>,
}

impl OutputIntent {
    pub fn to_address(address: impl Into<String>, value: u64) -> Self {
        Self {
            to: Recipient::Address(address.into()),
            value: Some(value),
        }
    }

    pub fn to_script(template: ScriptTemplate, value: Option<u64>) -> Self {
        Self {
            to: Recipient::Script(template),
            value,
        }
    }
}

// =============================================================================
// Request
// =============================================================================

/// A 32-byte secp256k1 private key, wiped on drop
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKeyBytes(Zeroizing<Vec<u8>>);

impl PrivateKeyBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(Zeroizing::new(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for PrivateKeyBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKeyBytes([REDACTED])")
    }
}

impl Serialize for PrivateKeyBytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("[REDACTED]")
    }
}

impl<'de> Deserialize<'de> for PrivateKeyBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = Zeroizing::new(String::deserialize(deserializer)?);
        let bytes = hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom)?;
        Ok(Self::new(bytes))
    }
}

/// A signing request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigningInput {
    pub coin: CoinType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default)]
    pub lock_time: u32,
    /// Zcash and Decred expiry height
    #[serde(default)]
    pub expiry_height: u32,
    /// Zcash consensus branch id (defaults to Sapling)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<u32>,
    #[serde(default)]
    pub hash_type: SigHashType,
    pub utxos: Vec<UnspentOutput>,
    pub outputs: Vec<OutputIntent>,
    /// Fee rate in satoshis per virtual byte
    pub byte_fee: u64,
    #[serde(default)]
    pub policy: SelectionPolicy,
    #[serde(default)]
    pub use_max_amount: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dust_threshold: Option<u64>,
    /// A previously reviewed plan, used unchanged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<TransactionPlan>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub private_keys: Vec<PrivateKeyBytes>,
}

impl SigningInput {
    pub fn new(coin: CoinType, utxos: Vec<UnspentOutput>, outputs: Vec<OutputIntent>, byte_fee: u64) -> Self {
        Self {
            coin,
            version: None,
            lock_time: 0,
            expiry_height: 0,
            branch_id: None,
            hash_type: SigHashType::All,
            utxos,
            outputs,
            byte_fee,
            policy: SelectionPolicy::default(),
            use_max_amount: false,
            dust_threshold: None,
            plan: None,
            private_keys: Vec::new(),
        }
    }
}

// =============================================================================
// Pipeline outputs
// =============================================================================

/// Result of selection, presented for review before signing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPlan {
    pub selected_inputs: Vec<UnspentOutput>,
    pub fee: u64,
    pub change: u64,
    /// Outputs in transaction order, every one with a value
    pub outputs: Vec<OutputIntent>,
    /// Sum of the fixed-value outputs
    #[serde(default)]
    pub amount: u64,
    /// Sum of the selected inputs
    #[serde(default)]
    pub available_amount: u64,
    #[serde(default)]
    pub vsize_estimate: u64,
}

/// Signature algorithm an entry must be signed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SigningMethod {
    Ecdsa,
    Schnorr,
}

/// One hash an external signer must sign
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreimageEntry {
    #[serde(with = "hex32")]
    pub preimage_hash: [u8; 32],
    /// Key hash (ECDSA) or x-only key (Schnorr) expected to sign; empty for custom claims
    #[serde(with = "hex_vec")]
    pub required_pub_key_hash: Vec<u8>,
    pub input_index: usize,
    pub signing_method: SigningMethod,
    pub sighash_type: SigHashType,
}

/// Response of the pre-image message; never an `Err`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreSigningOutput {
    pub error: ErrorCode,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error_message: String,
    pub preimages: Vec<PreimageEntry>,
}

impl PreSigningOutput {
    pub fn ok(preimages: Vec<PreimageEntry>) -> Self {
        Self {
            error: ErrorCode::Ok,
            error_message: String::new(),
            preimages,
        }
    }

    pub fn failed(error: &CompilerError) -> Self {
        Self {
            error: error.code,
            error_message: error.message.clone(),
            preimages: Vec::new(),
        }
    }
}

/// A signature and the key that produced it, in no particular order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalSignature {
    #[serde(with = "hex_vec")]
    pub signature: Vec<u8>,
    #[serde(with = "hex_vec")]
    pub public_key: Vec<u8>,
}

impl ExternalSignature {
    pub fn new(signature: Vec<u8>, public_key: Vec<u8>) -> Self {
        Self { signature, public_key }
    }
}

/// Declared encoding of the supplied public keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicKeyType {
    /// Compressed (33 bytes), or x-only (32 bytes) for taproot
    Secp256k1,
    /// Uncompressed (65 bytes)
    Secp256k1Extended,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedInput {
    pub outpoint: OutPoint,
    #[serde(with = "hex_vec")]
    pub script_sig: Vec<u8>,
    #[serde(with = "hex_vec_list")]
    pub witness: Vec<Vec<u8>>,
    pub sequence: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedOutput {
    pub value: u64,
    #[serde(with = "hex_vec")]
    pub script: Vec<u8>,
}

/// Final signed transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub version: u32,
    pub inputs: Vec<SignedInput>,
    pub outputs: Vec<SignedOutput>,
    #[serde(with = "hex_vec")]
    pub encoded: Vec<u8>,
    /// Display byte order
    pub txid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wtxid: Option<String>,
    pub size: usize,
    pub vsize: usize,
    pub weight: usize,
    pub fee: u64,
}

// =============================================================================
// API Response
// =============================================================================

/// Standard API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<CompilerError>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: CompilerError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

impl<T> From<CompilerResult<T>> for ApiResponse<T> {
    fn from(result: CompilerResult<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::err(e),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"success":false,"error":{"code":"internal","message":"Serialization failed"}}"#.to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outpoint_from_display_txid() {
        let outpoint = OutPoint::from_txid_hex(
            "75ed78f0aeab2dad924065d2357ef01184ceee2181c44e03337746512be9371a",
            1,
        )
        .unwrap();
        assert_eq!(outpoint.hash[0], 0x1a);
        assert_eq!(outpoint.hash[31], 0x75);
        assert_eq!(
            outpoint.txid_hex(),
            "75ed78f0aeab2dad924065d2357ef01184ceee2181c44e03337746512be9371a"
        );
        assert!(OutPoint::from_txid_hex("abcd", 0).is_err());
    }

    #[test]
    fn test_signing_input_defaults() {
        let json = r#"{
            "coin": "bitcoin",
            "utxos": [{
                "outpoint": {"hash": "07c42b969286be06fae38528c85f0a1ce508d4df837eb5ac4cf5f2a7a9d65fa8", "vout": 0},
                "value": 600000,
                "script": "0014bd92088bb7e82d611a9b94fbb74a0908152b784f"
            }],
            "outputs": [{"to": {"address": "bc1q2dsdlq3343vk29runkgv4yc292hmq53jedfjmp"}, "value": 1000}],
            "byte_fee": 1
        }"#;
        let input: SigningInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.hash_type, SigHashType::All);
        assert_eq!(input.policy, SelectionPolicy::SelectAscending);
        assert_eq!(input.utxos[0].sequence, 0xffff_ffff);
        assert!(input.plan.is_none());
        assert!(input.private_keys.is_empty());
    }

    #[test]
    fn test_private_keys_are_redacted() {
        let json = r#"{"coin":"bitcoin","utxos":[],"outputs":[],"byte_fee":1,
            "private_keys":["4646464646464646464646464646464646464646464646464646464646464646"]}"#;
        let input: SigningInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.private_keys[0].as_bytes(), &[0x46; 32]);

        let debug = format!("{:?}", input);
        assert!(!debug.contains("4646"));
        assert!(serde_json::to_string(&input).unwrap().contains("[REDACTED]"));
    }

    #[test]
    fn test_spending_material_tags() {
        let material: SpendingMaterial = serde_json::from_str(
            r#"{"type":"custom","script_sig":"51","witness":["01"]}"#,
        )
        .unwrap();
        assert_eq!(
            material,
            SpendingMaterial::Custom {
                script_sig: vec![0x51],
                witness: vec![vec![0x01]]
            }
        );
    }

    #[test]
    fn test_api_response_serialization() {
        let response = ApiResponse::ok("test_data".to_string());
        let json = response.to_json();
        assert!(json.contains("success"));
        assert!(json.contains("test_data"));

        let failed: ApiResponse<String> = Err(CompilerError::insufficient_funds("short")).into();
        assert!(failed.to_json().contains("insufficient_funds"));
    }
}
