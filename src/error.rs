//! Unified error types for the compiler pipeline
//!
//! Every stage has its own `thiserror` enum. All of them fold into
//! [`CompilerError`], which carries a stable snake_case [`ErrorCode`]
//! across the message boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::CryptoError;
use crate::script::ScriptError;
use crate::signing::binder::BindError;
use crate::signing::compiler::AssemblyError;
use crate::signing::preimage::PreImageError;
use crate::wallet::utxo::SelectionError;

/// Main error type for all pipeline operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl CompilerError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, msg)
    }

    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidAddress, msg)
    }

    pub fn invalid_public_key(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidPublicKey, msg)
    }

    pub fn invalid_private_key(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidPrivateKey, msg)
    }

    pub fn insufficient_funds(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InsufficientFunds, msg)
    }

    pub fn no_matching_signature(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::NoMatchingSignature, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }
}

impl fmt::Display for CompilerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for CompilerError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// No error (used by responses that always carry a code)
    #[default]
    Ok,

    // Request errors
    InvalidInput,
    InvalidAddress,
    InvalidPublicKey,
    InvalidPrivateKey,

    // Planning errors
    InsufficientFunds,
    DustThresholdUnreachable,

    // Script and sighash errors
    UnsupportedScriptTemplate,
    UnsupportedSigHashType,

    // Binding and assembly errors
    NoMatchingSignature,
    SignatureVerificationFailed,
    IncompletePlan,

    // Parse errors
    JsonError,
    HexError,

    // Internal
    Internal,
}

impl ErrorCode {
    pub fn is_ok(&self) -> bool {
        *self == ErrorCode::Ok
    }
}

/// Result type alias for pipeline operations
pub type CompilerResult<T> = Result<T, CompilerError>;

// Conversions from common error types

impl From<serde_json::Error> for CompilerError {
    fn from(e: serde_json::Error) -> Self {
        CompilerError::new(ErrorCode::JsonError, e.to_string())
    }
}

impl From<hex::FromHexError> for CompilerError {
    fn from(e: hex::FromHexError) -> Self {
        CompilerError::new(ErrorCode::HexError, e.to_string())
    }
}

impl From<std::io::Error> for CompilerError {
    fn from(e: std::io::Error) -> Self {
        CompilerError::new(ErrorCode::Internal, e.to_string())
    }
}

impl From<bitcoin::secp256k1::Error> for CompilerError {
    fn from(e: bitcoin::secp256k1::Error) -> Self {
        CompilerError::new(ErrorCode::InvalidPublicKey, format!("Secp256k1 error: {}", e))
    }
}

// Conversions from stage errors

impl From<CryptoError> for CompilerError {
    fn from(e: CryptoError) -> Self {
        let code = match e {
            CryptoError::InvalidPublicKey(_) | CryptoError::TweakFailed(_) => ErrorCode::InvalidPublicKey,
            CryptoError::InvalidPrivateKey(_) => ErrorCode::InvalidPrivateKey,
        };
        CompilerError::new(code, e.to_string())
    }
}

impl From<ScriptError> for CompilerError {
    fn from(e: ScriptError) -> Self {
        let code = match e {
            ScriptError::InvalidAddress(_) => ErrorCode::InvalidAddress,
            ScriptError::InvalidPublicKey(_) => ErrorCode::InvalidPublicKey,
            ScriptError::Unsupported(_) | ScriptError::TapScriptMismatch => {
                ErrorCode::UnsupportedScriptTemplate
            }
            ScriptError::InvalidTemplate(_) | ScriptError::PayloadTooLarge(_) => ErrorCode::InvalidInput,
        };
        CompilerError::new(code, e.to_string())
    }
}

impl From<SelectionError> for CompilerError {
    fn from(e: SelectionError) -> Self {
        let code = match e {
            SelectionError::InsufficientFunds { .. } => ErrorCode::InsufficientFunds,
            SelectionError::DustThresholdUnreachable(_) => ErrorCode::DustThresholdUnreachable,
            SelectionError::InvalidRequest(_) => ErrorCode::InvalidInput,
        };
        CompilerError::new(code, e.to_string())
    }
}

impl From<PreImageError> for CompilerError {
    fn from(e: PreImageError) -> Self {
        let code = match e {
            PreImageError::UnsupportedSigHashType(_) => ErrorCode::UnsupportedSigHashType,
            PreImageError::UnsupportedTemplate(_) => ErrorCode::UnsupportedScriptTemplate,
            PreImageError::InvalidInputIndex(_) | PreImageError::InvalidTransaction(_) => {
                ErrorCode::InvalidInput
            }
        };
        CompilerError::new(code, e.to_string())
    }
}

impl From<BindError> for CompilerError {
    fn from(e: BindError) -> Self {
        let code = match e {
            BindError::NoMatchingSignature { .. } => ErrorCode::NoMatchingSignature,
            BindError::SignatureVerificationFailed { .. } => ErrorCode::SignatureVerificationFailed,
            BindError::InvalidPublicKey(_) => ErrorCode::InvalidPublicKey,
            BindError::LengthMismatch { .. } => ErrorCode::InvalidInput,
        };
        CompilerError::new(code, e.to_string())
    }
}

impl From<AssemblyError> for CompilerError {
    fn from(e: AssemblyError) -> Self {
        let code = match e {
            AssemblyError::IncompletePlan(_) => ErrorCode::IncompletePlan,
            AssemblyError::UnsupportedTemplate(_) => ErrorCode::UnsupportedScriptTemplate,
        };
        CompilerError::new(code, e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = CompilerError::insufficient_funds("Not enough value in candidate outputs")
            .with_details("required 1200277, available 900000");

        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("insufficient_funds"));
        assert!(json.contains("Not enough value"));
        assert!(json.contains("required 1200277"));
    }

    #[test]
    fn test_error_display() {
        let err = CompilerError::new(ErrorCode::IncompletePlan, "input 2 unsigned");
        assert_eq!(err.to_string(), "[IncompletePlan] input 2 unsigned");
    }

    #[test]
    fn test_ok_code_is_default() {
        assert!(ErrorCode::default().is_ok());
        assert_eq!(serde_json::to_string(&ErrorCode::Ok).unwrap(), "\"ok\"");
        assert_eq!(
            serde_json::to_string(&ErrorCode::UnsupportedSigHashType).unwrap(),
            "\"unsupported_sig_hash_type\""
        );
    }

    #[test]
    fn test_stage_error_codes() {
        let err: CompilerError = AssemblyError::IncompletePlan(vec![1]).into();
        assert_eq!(err.code, ErrorCode::IncompletePlan);

        let err: CompilerError = SelectionError::DustThresholdUnreachable("all below dust".into()).into();
        assert_eq!(err.code, ErrorCode::DustThresholdUnreachable);

        let err: CompilerError = PreImageError::UnsupportedSigHashType(0x04).into();
        assert_eq!(err.code, ErrorCode::UnsupportedSigHashType);
    }
}
