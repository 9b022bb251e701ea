//! External Signature Compilation
//!
//! The signing half of the pipeline:
//! 1. Prepare the unsigned transaction from a plan
//! 2. Generate one pre-image hash per input
//! 3. Bind externally produced signatures to those hashes
//! 4. Assemble the final signed transaction
//!
//! Supported chains: Bitcoin, Litecoin, Dogecoin, Zcash (Sapling),
//! Groestlcoin and Decred.

pub mod binder;
pub mod compiler;
pub mod messages;
pub mod preimage;

pub use messages::{compile_with_signatures, compile_with_signatures_and_pubkey_type, plan, pre_image_hashes, sign};

use crate::coins::CoinParams;
use crate::error::CompilerResult;
use crate::script::SpendPath;
use crate::tx::{Transaction, TxInput, TxOutput};
use crate::types::{SigningInput, TransactionPlan, UnspentOutput};
use crate::wallet::planner::{output_script, plan_transaction, transaction_shell};
use preimage::SigHashType;

/// A selected input with its spend path and requested hash type
#[derive(Debug, Clone)]
pub struct PreparedInput {
    pub utxo: UnspentOutput,
    pub path: SpendPath,
    pub sighash_type: SigHashType,
}

impl PreparedInput {
    /// Script committed to by the non-taproot sighash algorithms
    pub fn script_code(&self) -> Vec<u8> {
        self.path.script_code(&self.utxo.script)
    }
}

/// Unsigned transaction plus everything the later stages need
#[derive(Debug, Clone)]
pub struct PreparedTransaction {
    pub params: &'static CoinParams,
    pub plan: TransactionPlan,
    /// Inputs carry empty claims
    pub unsigned: Transaction,
    pub inputs: Vec<PreparedInput>,
    /// Zcash consensus branch id (0 elsewhere)
    pub branch_id: u32,
}

/// Plan (or take the supplied plan) and build the unsigned transaction
pub fn prepare(input: &SigningInput) -> CompilerResult<PreparedTransaction> {
    let params = input.coin.params();
    let plan = plan_transaction(input)?;

    let mut outputs = Vec::with_capacity(plan.outputs.len());
    for intent in &plan.outputs {
        outputs.push(TxOutput::new(intent.value.unwrap_or(0), output_script(&intent.to, params)?));
    }

    let mut inputs = Vec::with_capacity(plan.selected_inputs.len());
    let mut tx_inputs = Vec::with_capacity(plan.selected_inputs.len());
    for utxo in &plan.selected_inputs {
        let path = SpendPath::classify(utxo, params)?;
        tx_inputs.push(TxInput {
            outpoint: utxo.outpoint,
            script_sig: Vec::new(),
            witness: Vec::new(),
            sequence: utxo.sequence,
            value: utxo.value,
        });
        inputs.push(PreparedInput {
            utxo: utxo.clone(),
            path,
            sighash_type: utxo.sighash_type.unwrap_or(input.hash_type),
        });
    }

    let mut unsigned = transaction_shell(input, params, outputs);
    unsigned.inputs = tx_inputs;

    Ok(PreparedTransaction {
        params,
        plan,
        unsigned,
        inputs,
        branch_id: input.branch_id.or(params.default_branch_id).unwrap_or(0),
    })
}
