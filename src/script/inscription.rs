//! Inscription envelope
//!
//! `OP_0 OP_IF "ord" 0x01 <mime> OP_0 <payload chunks> OP_ENDIF`, committed
//! to as the single leaf of a taproot tree. The commit transaction pays to
//! the tweaked key; the reveal spends it through the script path with the
//! witness `[signature, envelope, control block]`.

use super::opcodes::{OP_0, OP_ENDIF, OP_IF};
use super::{push_data, ScriptError, ScriptResult, MAX_SCRIPT_ELEMENT_SIZE};
use crate::crypto::taproot::TapLeaf;

/// Protocol tag pushed first in the envelope
pub const PROTOCOL_ID: &[u8] = b"ord";
/// Field tag announcing the content type
pub const CONTENT_TYPE_TAG: &[u8] = &[0x01];

/// Envelope script for a payload
pub fn envelope_script(mime_type: &str, payload: &[u8]) -> ScriptResult<Vec<u8>> {
    if mime_type.len() > MAX_SCRIPT_ELEMENT_SIZE {
        return Err(ScriptError::PayloadTooLarge(mime_type.len()));
    }

    let mut script = Vec::with_capacity(payload.len() + mime_type.len() + 16);
    script.push(OP_0);
    script.push(OP_IF);
    push_data(PROTOCOL_ID, &mut script);
    push_data(CONTENT_TYPE_TAG, &mut script);
    push_data(mime_type.as_bytes(), &mut script);
    script.push(OP_0);
    for chunk in payload.chunks(MAX_SCRIPT_ELEMENT_SIZE) {
        push_data(chunk, &mut script);
    }
    script.push(OP_ENDIF);

    Ok(script)
}

/// Tap leaf (version 0xc0) holding the envelope
pub fn envelope_leaf(mime_type: &str, payload: &[u8]) -> ScriptResult<TapLeaf> {
    Ok(TapLeaf::new(envelope_script(mime_type, payload)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::taproot::single_leaf_commitment;

    const BRC20: &str = r#"{"p":"brc-20","op":"transfer","tick":"oadf","amt":"20"}"#;

    #[test]
    fn test_brc20_envelope_bytes() {
        let script = envelope_script("text/plain;charset=utf-8", BRC20.as_bytes()).unwrap();
        assert_eq!(
            hex::encode(script),
            "0063036f7264010118746578742f706c61696e3b636861727365743d7574662d3800377b2270223a226272632d3230222c226f70223a227472616e73666572222c227469636b223a226f616466222c22616d74223a223230227d68"
        );
    }

    #[test]
    fn test_brc20_commitment() {
        let internal: [u8; 32] = hex::decode("0f209b6ada5edb42c77fd2bc64ad650ae38314c8f451f3e36d80bc8e26f132cb")
            .unwrap()
            .try_into()
            .unwrap();
        let leaf = envelope_leaf("text/plain;charset=utf-8", BRC20.as_bytes()).unwrap();
        let (output, control) = single_leaf_commitment(&internal, &leaf).unwrap();
        assert_eq!(
            hex::encode(output.output_key),
            "e8b706a97732e705e22ae7710703e7f589ed13c636324461afa443016134cc05"
        );
        assert!(!output.parity);
        assert_eq!(control.serialize()[0], 0xc0);
    }

    #[test]
    fn test_large_payload_is_chunked() {
        let payload = vec![0x61; 1200];
        let script = envelope_script("text/plain", &payload).unwrap();
        // 520 + 520 + 160
        let pushdata2_count = script.windows(3).filter(|w| **w == [0x4d, 0x08, 0x02]).count();
        assert_eq!(pushdata2_count, 2);
        assert_eq!(*script.last().unwrap(), OP_ENDIF);
    }
}
