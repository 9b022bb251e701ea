//! Script Matcher/Builder
//!
//! Output script templates, the inscription envelope, address resolution
//! and the spend paths the sighash computer and assembler work from.

pub mod address;
pub mod inscription;
pub mod spend;
pub mod template;

pub use spend::{InnerKey, SpendPath};
pub use template::ScriptTemplate;

/// Errors raised while building, matching or resolving scripts
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Unsupported script template: {0}")]
    Unsupported(String),

    #[error("Tap script does not commit to the spent output key")]
    TapScriptMismatch,

    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    #[error("Payload too large: {0} bytes")]
    PayloadTooLarge(usize),
}

pub type ScriptResult<T> = Result<T, ScriptError>;

/// Opcodes used by the supported templates
pub mod opcodes {
    pub const OP_0: u8 = 0x00;
    pub const OP_PUSHDATA1: u8 = 0x4c;
    pub const OP_PUSHDATA2: u8 = 0x4d;
    pub const OP_PUSHDATA4: u8 = 0x4e;
    pub const OP_1: u8 = 0x51;
    pub const OP_IF: u8 = 0x63;
    pub const OP_ENDIF: u8 = 0x68;
    pub const OP_RETURN: u8 = 0x6a;
    pub const OP_DUP: u8 = 0x76;
    pub const OP_EQUAL: u8 = 0x87;
    pub const OP_EQUALVERIFY: u8 = 0x88;
    pub const OP_HASH160: u8 = 0xa9;
    pub const OP_CHECKSIG: u8 = 0xac;
}

/// Maximum size of a single script element
pub const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;

/// Append a data push using the smallest push opcode
pub fn push_data(data: &[u8], script: &mut Vec<u8>) {
    let len = data.len();
    if len < opcodes::OP_PUSHDATA1 as usize {
        script.push(len as u8);
    } else if len <= 0xff {
        script.push(opcodes::OP_PUSHDATA1);
        script.push(len as u8);
    } else if len <= 0xffff {
        script.push(opcodes::OP_PUSHDATA2);
        script.extend_from_slice(&(len as u16).to_le_bytes());
    } else {
        script.push(opcodes::OP_PUSHDATA4);
        script.extend_from_slice(&(len as u32).to_le_bytes());
    }
    script.extend_from_slice(data);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_data_framing() {
        let mut script = Vec::new();
        push_data(&[0xab; 75], &mut script);
        assert_eq!(script[0], 75);
        assert_eq!(script.len(), 76);

        let mut script = Vec::new();
        push_data(&[0xab; 76], &mut script);
        assert_eq!(&script[..2], &[0x4c, 76]);

        let mut script = Vec::new();
        push_data(&[0xab; 520], &mut script);
        assert_eq!(&script[..3], &[0x4d, 0x08, 0x02]);
        assert_eq!(script.len(), 523);
    }
}
