//! Output script templates
//!
//! `build` turns a template into locking-script bytes for a coin;
//! `match_script` is the inverse and falls back to [`ScriptTemplate::Custom`]
//! for anything it does not recognise.

use serde::{Deserialize, Serialize};

use super::inscription::envelope_leaf;
use super::opcodes::*;
use super::{push_data, ScriptError, ScriptResult};
use crate::coins::CoinParams;
use crate::crypto::ecdsa::parse_public_key;
use crate::crypto::hash::sha256;
use crate::crypto::taproot::{single_leaf_commitment, tweak_public_key};
use crate::serde_bytes::{hex20, hex32, hex_vec};

/// Maximum OP_RETURN payload accepted by standard relay policy
pub const MAX_OP_RETURN_SIZE: usize = 80;

/// Supported output script templates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptTemplate {
    P2pk {
        #[serde(with = "hex_vec")]
        pubkey: Vec<u8>,
    },
    P2pkh {
        #[serde(with = "hex20")]
        pubkey_hash: [u8; 20],
    },
    P2sh {
        #[serde(with = "hex20")]
        script_hash: [u8; 20],
    },
    P2wpkh {
        #[serde(with = "hex20")]
        pubkey_hash: [u8; 20],
    },
    P2wsh {
        #[serde(with = "hex32")]
        script_hash: [u8; 32],
    },
    P2trKeyPath {
        #[serde(with = "hex32")]
        output_key: [u8; 32],
    },
    /// Key-path output from an untweaked key (empty merkle root)
    P2trKeyPathInternal {
        #[serde(with = "hex32")]
        internal_key: [u8; 32],
    },
    /// Commit output of an inscription
    Inscription {
        #[serde(with = "hex32")]
        internal_key: [u8; 32],
        mime_type: String,
        #[serde(with = "hex_vec")]
        payload: Vec<u8>,
    },
    OpReturn {
        #[serde(with = "hex_vec")]
        data: Vec<u8>,
    },
    Custom {
        #[serde(with = "hex_vec")]
        script: Vec<u8>,
    },
}

impl ScriptTemplate {
    // MARK: - Key material constructors

    pub fn p2pkh_from_pubkey(pubkey: &[u8], params: &CoinParams) -> Self {
        ScriptTemplate::P2pkh { pubkey_hash: params.key_hash(pubkey) }
    }

    pub fn p2wpkh_from_pubkey(pubkey: &[u8], params: &CoinParams) -> Self {
        ScriptTemplate::P2wpkh { pubkey_hash: params.key_hash(pubkey) }
    }

    pub fn p2sh_from_redeem_script(redeem_script: &[u8], params: &CoinParams) -> Self {
        ScriptTemplate::P2sh { script_hash: params.key_hash(redeem_script) }
    }

    pub fn p2wsh_from_witness_script(witness_script: &[u8]) -> Self {
        ScriptTemplate::P2wsh { script_hash: sha256(witness_script) }
    }

    /// Short name used in logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            ScriptTemplate::P2pk { .. } => "p2pk",
            ScriptTemplate::P2pkh { .. } => "p2pkh",
            ScriptTemplate::P2sh { .. } => "p2sh",
            ScriptTemplate::P2wpkh { .. } => "p2wpkh",
            ScriptTemplate::P2wsh { .. } => "p2wsh",
            ScriptTemplate::P2trKeyPath { .. } => "p2tr_key_path",
            ScriptTemplate::P2trKeyPathInternal { .. } => "p2tr_key_path_internal",
            ScriptTemplate::Inscription { .. } => "inscription",
            ScriptTemplate::OpReturn { .. } => "op_return",
            ScriptTemplate::Custom { .. } => "custom",
        }
    }

    pub fn is_op_return(&self) -> bool {
        matches!(self, ScriptTemplate::OpReturn { .. })
    }

    // MARK: - Build

    /// Locking script for this template on the given coin
    pub fn build(&self, params: &CoinParams) -> ScriptResult<Vec<u8>> {
        match self {
            ScriptTemplate::P2pk { pubkey } => {
                parse_public_key(pubkey).map_err(|e| ScriptError::InvalidPublicKey(e.to_string()))?;
                let mut script = Vec::with_capacity(pubkey.len() + 2);
                push_data(pubkey, &mut script);
                script.push(OP_CHECKSIG);
                Ok(script)
            }
            ScriptTemplate::P2pkh { pubkey_hash } => Ok(p2pkh_script(pubkey_hash)),
            ScriptTemplate::P2sh { script_hash } => {
                let mut script = Vec::with_capacity(23);
                script.push(OP_HASH160);
                push_data(script_hash, &mut script);
                script.push(OP_EQUAL);
                Ok(script)
            }
            ScriptTemplate::P2wpkh { pubkey_hash } => {
                require_segwit(params, self)?;
                Ok(witness_program(0, pubkey_hash))
            }
            ScriptTemplate::P2wsh { script_hash } => {
                require_segwit(params, self)?;
                Ok(witness_program(0, script_hash))
            }
            ScriptTemplate::P2trKeyPath { output_key } => {
                require_taproot(params, self)?;
                Ok(witness_program(1, output_key))
            }
            ScriptTemplate::P2trKeyPathInternal { internal_key } => {
                require_taproot(params, self)?;
                let output = tweak_public_key(internal_key, None)
                    .map_err(|e| ScriptError::InvalidPublicKey(e.to_string()))?;
                Ok(witness_program(1, &output.output_key))
            }
            ScriptTemplate::Inscription { internal_key, mime_type, payload } => {
                require_taproot(params, self)?;
                let leaf = envelope_leaf(mime_type, payload)?;
                let (output, _control) = single_leaf_commitment(internal_key, &leaf)
                    .map_err(|e| ScriptError::InvalidPublicKey(e.to_string()))?;
                Ok(witness_program(1, &output.output_key))
            }
            ScriptTemplate::OpReturn { data } => {
                if data.len() > MAX_OP_RETURN_SIZE {
                    return Err(ScriptError::PayloadTooLarge(data.len()));
                }
                let mut script = vec![OP_RETURN];
                if !data.is_empty() {
                    push_data(data, &mut script);
                }
                Ok(script)
            }
            ScriptTemplate::Custom { script } => Ok(script.clone()),
        }
    }

    // MARK: - Match

    /// Classify a locking script
    pub fn match_script(script: &[u8]) -> ScriptTemplate {
        match script {
            [OP_DUP, OP_HASH160, 0x14, hash @ .., OP_EQUALVERIFY, OP_CHECKSIG] if hash.len() == 20 => {
                ScriptTemplate::P2pkh { pubkey_hash: to_array(hash) }
            }
            [OP_HASH160, 0x14, hash @ .., OP_EQUAL] if hash.len() == 20 => {
                ScriptTemplate::P2sh { script_hash: to_array(hash) }
            }
            [OP_0, 0x14, program @ ..] if program.len() == 20 => {
                ScriptTemplate::P2wpkh { pubkey_hash: to_array(program) }
            }
            [OP_0, 0x20, program @ ..] if program.len() == 32 => {
                ScriptTemplate::P2wsh { script_hash: to_array(program) }
            }
            [OP_1, 0x20, program @ ..] if program.len() == 32 => {
                ScriptTemplate::P2trKeyPath { output_key: to_array(program) }
            }
            [0x21, key @ .., OP_CHECKSIG] if key.len() == 33 => ScriptTemplate::P2pk { pubkey: key.to_vec() },
            [0x41, key @ .., OP_CHECKSIG] if key.len() == 65 => ScriptTemplate::P2pk { pubkey: key.to_vec() },
            [OP_RETURN] => ScriptTemplate::OpReturn { data: Vec::new() },
            [OP_RETURN, rest @ ..] => match single_push(rest) {
                Some(data) if data.len() <= MAX_OP_RETURN_SIZE => ScriptTemplate::OpReturn { data: data.to_vec() },
                _ => ScriptTemplate::Custom { script: script.to_vec() },
            },
            _ => ScriptTemplate::Custom { script: script.to_vec() },
        }
    }
}

/// `OP_DUP OP_HASH160 <20> OP_EQUALVERIFY OP_CHECKSIG`
pub fn p2pkh_script(pubkey_hash: &[u8; 20]) -> Vec<u8> {
    let mut script = Vec::with_capacity(25);
    script.push(OP_DUP);
    script.push(OP_HASH160);
    push_data(pubkey_hash, &mut script);
    script.push(OP_EQUALVERIFY);
    script.push(OP_CHECKSIG);
    script
}

/// `OP_n <program>`
pub fn witness_program(version: u8, program: &[u8]) -> Vec<u8> {
    let mut script = Vec::with_capacity(program.len() + 2);
    script.push(if version == 0 { OP_0 } else { OP_1 + version - 1 });
    push_data(program, &mut script);
    script
}

fn require_segwit(params: &CoinParams, template: &ScriptTemplate) -> ScriptResult<()> {
    if params.supports_segwit {
        Ok(())
    } else {
        Err(ScriptError::Unsupported(format!("{} on {}", template.name(), params.name)))
    }
}

fn require_taproot(params: &CoinParams, template: &ScriptTemplate) -> ScriptResult<()> {
    if params.supports_taproot {
        Ok(())
    } else {
        Err(ScriptError::Unsupported(format!("{} on {}", template.name(), params.name)))
    }
}

fn to_array<const N: usize>(slice: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(slice);
    out
}

/// Data of a script consisting of exactly one push
fn single_push(script: &[u8]) -> Option<&[u8]> {
    let (len, start) = match *script.first()? {
        n @ 0x01..=0x4b => (n as usize, 1),
        OP_PUSHDATA1 => (*script.get(1)? as usize, 2),
        OP_PUSHDATA2 => (u16::from_le_bytes([*script.get(1)?, *script.get(2)?]) as usize, 3),
        _ => return None,
    };
    if script.len() == start + len {
        Some(&script[start..])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coins::CoinType;

    const PK0: &str = "024bc2a31265153f07e70e0bab08724e6b85e217f8cd628ceb62974247bb493382";

    #[test]
    fn test_p2wpkh_build_and_match() {
        let params = CoinType::Bitcoin.params();
        let pubkey = hex::decode(PK0).unwrap();
        let template = ScriptTemplate::p2wpkh_from_pubkey(&pubkey, params);
        let script = template.build(params).unwrap();
        assert_eq!(hex::encode(&script), "0014bd92088bb7e82d611a9b94fbb74a0908152b784f");
        assert_eq!(ScriptTemplate::match_script(&script), template);
    }

    #[test]
    fn test_p2pkh_and_p2sh_match() {
        let p2pkh = hex::decode("76a9145eaaa4f458f9158f86afcba08dd7448d27045e3d88ac").unwrap();
        assert!(matches!(ScriptTemplate::match_script(&p2pkh), ScriptTemplate::P2pkh { .. }));

        let p2sh = hex::decode("a9140055b0c94df477ee6b9f75185dfc9aa8ce2e52e487").unwrap();
        let template = ScriptTemplate::match_script(&p2sh);
        assert!(matches!(template, ScriptTemplate::P2sh { .. }));
        assert_eq!(template.build(CoinType::Groestlcoin.params()).unwrap(), p2sh);
    }

    #[test]
    fn test_p2pk_match() {
        let mut script = vec![0x21];
        script.extend_from_slice(&hex::decode(PK0).unwrap());
        script.push(OP_CHECKSIG);
        let template = ScriptTemplate::match_script(&script);
        assert!(matches!(template, ScriptTemplate::P2pk { .. }));
        assert_eq!(template.build(CoinType::Bitcoin.params()).unwrap(), script);
    }

    #[test]
    fn test_taproot_internal_key_tweak() {
        let internal: [u8; 32] = hex::decode("72ffe9ba28d6f24e22f25d70c180be6cce20a14629bb9318ba279f85c221f24f")
            .unwrap()
            .try_into()
            .unwrap();
        let script = ScriptTemplate::P2trKeyPathInternal { internal_key: internal }
            .build(CoinType::Bitcoin.params())
            .unwrap();
        assert_eq!(
            hex::encode(script),
            "5120412a773e0bba5cfb5462d024cd4bf2cce1b8688a9e7a7a3f8507ebba8f00de58"
        );
    }

    #[test]
    fn test_segwit_rejected_on_dogecoin() {
        let template = ScriptTemplate::P2wpkh { pubkey_hash: [0u8; 20] };
        let err = template.build(CoinType::Dogecoin.params()).unwrap_err();
        assert!(matches!(err, ScriptError::Unsupported(_)));
    }

    #[test]
    fn test_op_return_limits() {
        let params = CoinType::Bitcoin.params();
        let ok = ScriptTemplate::OpReturn { data: vec![0x42; 80] }.build(params).unwrap();
        assert_eq!(&ok[..3], &[OP_RETURN, OP_PUSHDATA1, 80]);
        assert_eq!(
            ScriptTemplate::match_script(&ok),
            ScriptTemplate::OpReturn { data: vec![0x42; 80] }
        );

        let err = ScriptTemplate::OpReturn { data: vec![0x42; 81] }.build(params).unwrap_err();
        assert_eq!(err, ScriptError::PayloadTooLarge(81));
    }

    #[test]
    fn test_unknown_script_is_custom() {
        let script = vec![OP_1, OP_1, OP_EQUAL];
        assert_eq!(
            ScriptTemplate::match_script(&script),
            ScriptTemplate::Custom { script }
        );
    }

    #[test]
    fn test_template_serde_tag() {
        let json = r#"{"type":"p2wpkh","pubkey_hash":"5360df8231ac5965147c9d90ca930a2aafb05232"}"#;
        let template: ScriptTemplate = serde_json::from_str(json).unwrap();
        assert!(matches!(template, ScriptTemplate::P2wpkh { .. }));
        assert_eq!(serde_json::to_string(&template).unwrap(), json);
    }
}
