//! Zcash Sapling (v4) framing
//!
//! `header ‖ version_group_id ‖ inputs ‖ outputs ‖ locktime ‖ expiry ‖
//! valueBalance ‖ nShieldedSpend ‖ nShieldedOutput ‖ nJoinSplit`, with
//! every shielded component empty.

use super::{write_input, write_output, write_var_int, Transaction};

/// Serialize a transparent-only Sapling transaction
pub fn encode(tx: &Transaction) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256);

    buf.extend_from_slice(&tx.version.to_le_bytes());
    buf.extend_from_slice(&tx.version_group_id.to_le_bytes());

    write_var_int(tx.inputs.len() as u64, &mut buf);
    for input in &tx.inputs {
        write_input(input, &mut buf);
    }

    write_var_int(tx.outputs.len() as u64, &mut buf);
    for output in &tx.outputs {
        write_output(output, &mut buf);
    }

    buf.extend_from_slice(&tx.lock_time.to_le_bytes());
    buf.extend_from_slice(&tx.expiry_height.to_le_bytes());

    // valueBalance
    buf.extend_from_slice(&0i64.to_le_bytes());
    // vShieldedSpend, vShieldedOutput, vJoinSplit
    buf.extend_from_slice(&[0x00, 0x00, 0x00]);

    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coins::{SAPLING_TX_VERSION, SAPLING_VERSION_GROUP_ID};

    #[test]
    fn test_empty_sapling_layout() {
        let tx = Transaction {
            version: SAPLING_TX_VERSION,
            inputs: Vec::new(),
            outputs: Vec::new(),
            lock_time: 0,
            expiry_height: 0,
            version_group_id: SAPLING_VERSION_GROUP_ID,
        };
        assert_eq!(
            hex::encode(encode(&tx)),
            "0400008085202f89000000000000000000000000000000000000000000"
        );
    }
}
