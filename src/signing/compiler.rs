//! Transaction Compiler
//!
//! Places bound signatures into each input's claim and serializes the
//! result in the coin's framing.

use super::binder::BoundSignature;
use super::PreparedTransaction;
use crate::tx::display_hex;
use crate::types::{SignedInput, SignedOutput, SignedTransaction};
use crate::{log_info, log_warn};

/// Assembly failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssemblyError {
    #[error("Inputs without a signature: {0:?}")]
    IncompletePlan(Vec<usize>),

    #[error("Unsupported script template: {0}")]
    UnsupportedTemplate(String),
}

/// Assemble the signed transaction
pub fn assemble(
    prepared: &PreparedTransaction,
    bound: &[BoundSignature],
) -> Result<SignedTransaction, AssemblyError> {
    let params = prepared.params;
    let mut tx = prepared.unsigned.clone();

    if tx.inputs.len() != prepared.inputs.len() {
        return Err(AssemblyError::UnsupportedTemplate(format!(
            "{} claims for {} inputs",
            prepared.inputs.len(),
            tx.inputs.len()
        )));
    }

    let mut missing = Vec::new();
    for (index, (tx_input, input)) in tx.inputs.iter_mut().zip(&prepared.inputs).enumerate() {
        let (script_sig, witness) = if input.path.is_custom() {
            input.path.claim(&[], &[])
        } else {
            match bound.iter().find(|b| b.input_index == index) {
                Some(sig) => input.path.claim(&sig.signature, &sig.public_key),
                None => {
                    missing.push(index);
                    continue;
                }
            }
        };

        if !witness.is_empty() && !params.supports_segwit {
            return Err(AssemblyError::UnsupportedTemplate(format!(
                "witness data on {}",
                params.name
            )));
        }
        tx_input.script_sig = script_sig;
        tx_input.witness = witness;
    }

    if !missing.is_empty() {
        log_warn!("compiler", "unsigned inputs", missing = format!("{:?}", missing));
        return Err(AssemblyError::IncompletePlan(missing));
    }

    let encoded = tx.encode(params.framing);
    let metrics = tx.metrics(params.framing);
    let txid = display_hex(&tx.txid(params));
    let wtxid = tx.wtxid(params).map(|hash| display_hex(&hash));

    log_info!(
        "compiler",
        "transaction assembled",
        coin = params.name,
        inputs = tx.inputs.len(),
        outputs = tx.outputs.len(),
        fee = prepared.plan.fee,
        vsize = metrics.vsize,
        txid = txid,
    );

    Ok(SignedTransaction {
        version: tx.version,
        inputs: tx
            .inputs
            .iter()
            .map(|input| SignedInput {
                outpoint: input.outpoint,
                script_sig: input.script_sig.clone(),
                witness: input.witness.clone(),
                sequence: input.sequence,
            })
            .collect(),
        outputs: tx
            .outputs
            .iter()
            .map(|output| SignedOutput {
                value: output.value,
                script: output.script.clone(),
            })
            .collect(),
        encoded,
        txid,
        wtxid,
        size: metrics.size,
        vsize: metrics.vsize,
        weight: metrics.weight,
        fee: prepared.plan.fee,
    })
}
