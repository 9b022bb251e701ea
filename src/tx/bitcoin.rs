//! Bitcoin framing
//!
//! `version ‖ [marker 00, flag 01] ‖ inputs ‖ outputs ‖ [witness] ‖ locktime`.
//! Also used by Litecoin, Dogecoin and Groestlcoin.

use super::{write_input, write_output, write_var_bytes, write_var_int, Transaction};

/// Serialize, optionally with the segwit marker and witness stacks
///
/// The marker is only written when `include_witness` is set and some
/// input actually carries witness data.
pub fn encode(tx: &Transaction, include_witness: bool) -> Vec<u8> {
    let with_witness = include_witness && tx.has_witness();
    let mut buf = Vec::with_capacity(256);

    buf.extend_from_slice(&tx.version.to_le_bytes());

    if with_witness {
        buf.push(0x00); // marker
        buf.push(0x01); // flag
    }

    write_var_int(tx.inputs.len() as u64, &mut buf);
    for input in &tx.inputs {
        write_input(input, &mut buf);
    }

    write_var_int(tx.outputs.len() as u64, &mut buf);
    for output in &tx.outputs {
        write_output(output, &mut buf);
    }

    if with_witness {
        for input in &tx.inputs {
            write_var_int(input.witness.len() as u64, &mut buf);
            for item in &input.witness {
                write_var_bytes(item, &mut buf);
            }
        }
    }

    buf.extend_from_slice(&tx.lock_time.to_le_bytes());
    buf
}
