//! Fee Estimator
//!
//! Sizes a candidate transaction by serializing it with placeholder
//! claims in the coin's real framing, so the estimate and the final
//! transaction share one encoder.

use crate::coins::{CoinParams, Framing};
use crate::script::SpendPath;
use crate::tx::{var_int_len, Transaction, TxInput, WITNESS_SCALE_FACTOR};
use crate::types::UnspentOutput;
use crate::wallet::utxo::FeeModel;

/// Outpoint, script length and sequence of a Bitcoin-framed input, without the script
const BITCOIN_INPUT_BASE: usize = 32 + 4 + 4;
/// Prefix (outpoint, tree, sequence) plus witness (value, height, index) of a Decred input
const DECRED_INPUT_BASE: usize = 32 + 4 + 1 + 4 + 8 + 4 + 4;

// =============================================================================
// Fee model
// =============================================================================

/// Placeholder-claim fee model over a fixed candidate set
#[derive(Debug, Clone)]
pub struct TxFeeModel<'a> {
    params: &'static CoinParams,
    /// Version, locktime and every output; inputs are filled per query
    shell: Transaction,
    /// Position of the value-less output inside `shell.outputs`
    variable_index: Option<usize>,
    candidates: &'a [UnspentOutput],
    paths: &'a [SpendPath],
    byte_fee: u64,
}

impl<'a> TxFeeModel<'a> {
    pub fn new(
        params: &'static CoinParams,
        shell: Transaction,
        variable_index: Option<usize>,
        candidates: &'a [UnspentOutput],
        paths: &'a [SpendPath],
        byte_fee: u64,
    ) -> Self {
        Self {
            params,
            shell,
            variable_index,
            candidates,
            paths,
            byte_fee,
        }
    }

    /// Transaction spending `inputs` with placeholder claims
    pub fn placeholder_transaction(&self, inputs: &[usize], with_variable_output: bool) -> Transaction {
        let mut tx = self.shell.clone();
        if !with_variable_output {
            if let Some(index) = self.variable_index {
                tx.outputs.remove(index);
            }
        }

        tx.inputs = inputs
            .iter()
            .map(|&i| {
                let candidate = &self.candidates[i];
                let (script_sig, witness) = self.paths[i].placeholder_claim();
                TxInput {
                    outpoint: candidate.outpoint,
                    script_sig,
                    witness,
                    sequence: candidate.sequence,
                    value: candidate.value,
                }
            })
            .collect();
        tx
    }

    /// Virtual size of the placeholder transaction
    pub fn vsize(&self, inputs: &[usize], with_variable_output: bool) -> u64 {
        self.placeholder_transaction(inputs, with_variable_output)
            .metrics(self.params.framing)
            .vsize as u64
    }

    /// Weight one candidate adds as an input
    fn input_weight(&self, index: usize) -> usize {
        let (script_sig, witness) = self.paths[index].placeholder_claim();
        let script_len = var_int_len(script_sig.len() as u64) + script_sig.len();

        match self.params.framing {
            Framing::Decred => (DECRED_INPUT_BASE + script_len) * WITNESS_SCALE_FACTOR,
            Framing::ZcashSapling => (BITCOIN_INPUT_BASE + script_len) * WITNESS_SCALE_FACTOR,
            Framing::Bitcoin => {
                let witness_len = if witness.is_empty() {
                    0
                } else {
                    var_int_len(witness.len() as u64)
                        + witness
                            .iter()
                            .map(|item| var_int_len(item.len() as u64) + item.len())
                            .sum::<usize>()
                };
                (BITCOIN_INPUT_BASE + script_len) * WITNESS_SCALE_FACTOR + witness_len
            }
        }
    }
}

impl FeeModel for TxFeeModel<'_> {
    fn fee(&self, inputs: &[usize], with_variable_output: bool) -> u64 {
        self.vsize(inputs, with_variable_output).saturating_mul(self.byte_fee)
    }

    fn marginal_input_fee(&self, index: usize) -> u64 {
        let vsize = self.input_weight(index).div_ceil(WITNESS_SCALE_FACTOR) as u64;
        vsize.saturating_mul(self.byte_fee)
    }
}
