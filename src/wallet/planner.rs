//! Transaction Planning
//!
//! Turns a [`SigningInput`] into a [`TransactionPlan`]: resolves output
//! scripts, classifies every candidate, runs the selector against the
//! placeholder-claim fee model and fills in the value-less intent.

use super::utxo::{select_utxos, SelectionError, SelectionTarget};
use crate::coins::CoinParams;
use crate::error::CompilerResult;
use crate::fees::TxFeeModel;
use crate::script::address::resolve_address;
use crate::script::{ScriptResult, SpendPath};
use crate::tx::{Transaction, TxOutput};
use crate::types::{OutputIntent, Recipient, SigningInput, TransactionPlan};
use crate::utils::{get_compiler_config, CompilerConfig};
use crate::{log_debug, log_info, log_warn};

/// Build the plan for a request, or validate and return the supplied one
pub fn plan_transaction(input: &SigningInput) -> CompilerResult<TransactionPlan> {
    plan_with_config(input, get_compiler_config())
}

pub(crate) fn plan_with_config(input: &SigningInput, config: &CompilerConfig) -> CompilerResult<TransactionPlan> {
    let params = input.coin.params();

    let cap = config.max_byte_fee;
    if input.byte_fee > cap {
        log_warn!("planner", "byte fee above cap", byte_fee = input.byte_fee, cap = cap);
        return Err(SelectionError::InvalidRequest(format!(
            "byte fee {} exceeds the cap of {}",
            input.byte_fee, cap
        ))
        .into());
    }

    if let Some(plan) = &input.plan {
        check_supplied_plan(plan)?;
        log_debug!("planner", "using supplied plan", inputs = plan.selected_inputs.len(), fee = plan.fee);
        return Ok(plan.clone());
    }

    if input.outputs.is_empty() {
        return Err(SelectionError::InvalidRequest("no outputs requested".to_string()).into());
    }
    let variable: Vec<usize> = input
        .outputs
        .iter()
        .enumerate()
        .filter(|(_, intent)| intent.value.is_none())
        .map(|(i, _)| i)
        .collect();
    if variable.len() > 1 {
        return Err(SelectionError::InvalidRequest(format!(
            "{} outputs without a value, at most one allowed",
            variable.len()
        ))
        .into());
    }
    let variable_index = variable.first().copied();

    let dust = config.dust_threshold_for(input.dust_threshold, params.default_dust);

    let mut resolved = Vec::with_capacity(input.outputs.len());
    let mut amount: u64 = 0;
    for intent in &input.outputs {
        let script = output_script(&intent.to, params)?;
        if let Some(value) = intent.value {
            let is_op_return = matches!(&intent.to, Recipient::Script(t) if t.is_op_return());
            if value < dust && !is_op_return {
                log_warn!("planner", "output below dust", value = value, dust = dust);
                return Err(SelectionError::DustThresholdUnreachable(format!(
                    "output of {} is below dust {}",
                    value, dust
                ))
                .into());
            }
            amount = amount
                .checked_add(value)
                .ok_or_else(|| SelectionError::InvalidRequest("output values overflow".to_string()))?;
        }
        resolved.push(TxOutput::new(intent.value.unwrap_or(0), script));
    }

    let paths = input
        .utxos
        .iter()
        .map(|utxo| SpendPath::classify(utxo, params))
        .collect::<ScriptResult<Vec<_>>>()?;

    let shell = transaction_shell(input, params, resolved);
    let model = TxFeeModel::new(params, shell, variable_index, &input.utxos, &paths, input.byte_fee);

    let values: Vec<u64> = input.utxos.iter().map(|utxo| utxo.value).collect();
    let target = SelectionTarget {
        amount,
        variable_output: variable_index.is_some(),
        use_max_amount: input.use_max_amount,
        dust_threshold: dust,
        policy: input.policy,
    };
    let selection = select_utxos(&values, &target, &model).inspect_err(|e| {
        log_warn!("planner", "selection failed", reason = e);
    })?;

    let mut outputs: Vec<OutputIntent> = Vec::with_capacity(input.outputs.len());
    for (i, intent) in input.outputs.iter().enumerate() {
        if Some(i) == variable_index {
            match selection.variable_value {
                Some(value) => outputs.push(OutputIntent { to: intent.to.clone(), value: Some(value) }),
                // Folded into the fee
                None => continue,
            }
        } else {
            outputs.push(intent.clone());
        }
    }

    let (amount, change) = match selection.variable_value {
        Some(max) if input.use_max_amount => (amount.saturating_add(max), 0),
        Some(change) => (amount, change),
        None => (amount, 0),
    };

    let plan = TransactionPlan {
        selected_inputs: selection.inputs.iter().map(|&i| input.utxos[i].clone()).collect(),
        fee: selection.fee,
        change,
        outputs,
        amount,
        available_amount: selection.available,
        vsize_estimate: model.vsize(&selection.inputs, selection.variable_value.is_some()),
    };

    log_info!(
        "planner",
        "plan ready",
        coin = params.name,
        inputs = plan.selected_inputs.len(),
        outputs = plan.outputs.len(),
        fee = plan.fee,
        change = plan.change,
    );
    Ok(plan)
}

/// Locking script for a recipient
pub fn output_script(to: &Recipient, params: &CoinParams) -> ScriptResult<Vec<u8>> {
    match to {
        Recipient::Address(address) => resolve_address(address, params)?.build(params),
        Recipient::Script(template) => template.build(params),
    }
}

/// Transaction with the request's header fields and no inputs
pub(crate) fn transaction_shell(input: &SigningInput, params: &CoinParams, outputs: Vec<TxOutput>) -> Transaction {
    Transaction {
        version: input.version.unwrap_or(params.default_version),
        inputs: Vec::new(),
        outputs,
        lock_time: input.lock_time,
        expiry_height: input.expiry_height,
        version_group_id: params.version_group_id.unwrap_or(0),
    }
}

fn check_supplied_plan(plan: &TransactionPlan) -> Result<(), SelectionError> {
    if plan.selected_inputs.is_empty() {
        return Err(SelectionError::InvalidRequest("supplied plan has no inputs".to_string()));
    }

    let overflow = || SelectionError::InvalidRequest("supplied plan values overflow".to_string());
    let inputs = plan
        .selected_inputs
        .iter()
        .try_fold(0u64, |acc, utxo| acc.checked_add(utxo.value))
        .ok_or_else(overflow)?;

    let mut outputs = plan.fee;
    for intent in &plan.outputs {
        let value = intent
            .value
            .ok_or_else(|| SelectionError::InvalidRequest("supplied plan output without a value".to_string()))?;
        outputs = outputs.checked_add(value).ok_or_else(overflow)?;
    }

    if inputs != outputs {
        return Err(SelectionError::InvalidRequest(format!(
            "supplied plan does not balance: inputs {}, outputs plus fee {}",
            inputs, outputs
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coins::CoinType;
    use crate::error::ErrorCode;
    use crate::script::ScriptTemplate;
    use crate::types::{OutPoint, UnspentOutput};
    use crate::wallet::utxo::SelectionPolicy;

    const PK0: &str = "024bc2a31265153f07e70e0bab08724e6b85e217f8cd628ceb62974247bb493382";
    const PK1: &str = "0217142f69535e4dad0dc7060df645c55a174cc1bfa5b9eb2e59aad2ae96072dfc";
    const TO: &str = "bc1q2dsdlq3343vk29runkgv4yc292hmq53jedfjmp";

    fn p2wpkh(pubkey: &str) -> ScriptTemplate {
        let params = CoinType::Bitcoin.params();
        ScriptTemplate::p2wpkh_from_pubkey(&hex::decode(pubkey).unwrap(), params)
    }

    fn segwit_request() -> SigningInput {
        let params = CoinType::Bitcoin.params();
        let script0 = p2wpkh(PK0).build(params).unwrap();
        let script1 = p2wpkh(PK1).build(params).unwrap();
        let utxos = vec![
            UnspentOutput::new(
                OutPoint::new(hex::decode("07c42b969286be06fae38528c85f0a1ce508d4df837eb5ac4cf5f2a7a9d65fa8").unwrap().try_into().unwrap(), 0),
                600_000,
                script0.clone(),
            ),
            UnspentOutput::new(
                OutPoint::new(hex::decode("d6892a5aa54e3b8fe430efd23f49a8950733aaa9d7c915d9989179f48dd1905e").unwrap().try_into().unwrap(), 1),
                500_000,
                script0,
            ),
            UnspentOutput::new(
                OutPoint::new(hex::decode("6021efcf7555f90627364339fc921139dd40a06ccb2cb2a2a4f8f4ea7a2dc74d").unwrap().try_into().unwrap(), 0),
                400_000,
                script1,
            ),
        ];
        let outputs = vec![
            OutputIntent::to_address(TO, 1_200_000),
            OutputIntent::to_script(p2wpkh(PK0), None),
        ];
        let mut input = SigningInput::new(CoinType::Bitcoin, utxos, outputs, 1);
        input.version = Some(1);
        input
    }

    #[test]
    fn test_segwit_plan() {
        let plan = plan_transaction(&segwit_request()).unwrap();
        assert_eq!(plan.fee, 277);
        assert_eq!(plan.change, 299_723);
        assert_eq!(plan.amount, 1_200_000);
        assert_eq!(plan.available_amount, 1_500_000);
        let values: Vec<u64> = plan.selected_inputs.iter().map(|u| u.value).collect();
        assert_eq!(values, vec![400_000, 500_000, 600_000]);
        assert_eq!(plan.outputs[1].value, Some(299_723));
    }

    #[test]
    fn test_supplied_plan_is_returned_unchanged() {
        let mut input = segwit_request();
        let mut plan = plan_transaction(&input).unwrap();
        plan.fee += 1;
        plan.outputs[1].value = plan.outputs[1].value.map(|v| v - 1);
        input.plan = Some(plan.clone());
        assert_eq!(plan_transaction(&input).unwrap(), plan);
    }

    #[test]
    fn test_unbalanced_supplied_plan_rejected() {
        let mut input = segwit_request();
        let mut plan = plan_transaction(&input).unwrap();
        plan.fee += 1;
        input.plan = Some(plan);
        let err = plan_transaction(&input).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }

    #[test]
    fn test_two_value_less_outputs_rejected() {
        let mut input = segwit_request();
        input.outputs.push(OutputIntent::to_script(p2wpkh(PK1), None));
        assert_eq!(plan_transaction(&input).unwrap_err().code, ErrorCode::InvalidInput);
    }

    #[test]
    fn test_dust_output_rejected() {
        let mut input = segwit_request();
        input.outputs[0].value = Some(545);
        assert_eq!(
            plan_transaction(&input).unwrap_err().code,
            ErrorCode::DustThresholdUnreachable
        );

        // OP_RETURN outputs carry no value requirement
        input.outputs[0] = OutputIntent::to_script(ScriptTemplate::OpReturn { data: b"hello".to_vec() }, Some(0));
        assert!(plan_transaction(&input).is_ok());
    }

    #[test]
    fn test_configured_dust_applies_when_request_has_none() {
        let config = CompilerConfig {
            dust_threshold: Some(1_300_000),
            ..CompilerConfig::default()
        };
        let mut input = segwit_request();
        assert_eq!(
            plan_with_config(&input, &config).unwrap_err().code,
            ErrorCode::DustThresholdUnreachable
        );

        // The request's own threshold wins over the configured one
        input.dust_threshold = Some(546);
        let plan = plan_with_config(&input, &config).unwrap();
        assert_eq!(plan.fee, 277);
    }

    fn single_candidate(value: u64) -> SigningInput {
        let params = CoinType::Bitcoin.params();
        let utxo = UnspentOutput::new(OutPoint::new([0x01; 32], 0), value, p2wpkh(PK0).build(params).unwrap());
        let data = OutputIntent::to_script(ScriptTemplate::OpReturn { data: b"hello".to_vec() }, Some(0));
        let mut input = SigningInput::new(CoinType::Bitcoin, vec![utxo], vec![data], 10);
        input.dust_threshold = Some(546);
        input
    }

    #[test]
    fn test_candidate_must_exceed_dust_plus_input_fee() {
        // A P2WPKH input costs 68 vbytes, so 680 sat at 10 sat/vB
        let err = plan_transaction(&single_candidate(546 + 680)).unwrap_err();
        assert_eq!(err.code, ErrorCode::DustThresholdUnreachable);

        let plan = plan_transaction(&single_candidate(546 + 680 + 1)).unwrap();
        assert_eq!(plan.selected_inputs.len(), 1);
        assert_eq!(plan.fee, 1_227);
    }

    #[test]
    fn test_candidate_at_dust_is_skipped() {
        let params = CoinType::Bitcoin.params();
        let script = p2wpkh(PK1).build(params).unwrap();
        let request = |small: u64| {
            let utxos = vec![
                UnspentOutput::new(OutPoint::new([0x01; 32], 0), small, script.clone()),
                UnspentOutput::new(OutPoint::new([0x02; 32], 0), 100_000, script.clone()),
            ];
            let outputs = vec![
                OutputIntent::to_address(TO, 50_000),
                OutputIntent::to_script(p2wpkh(PK0), None),
            ];
            SigningInput::new(CoinType::Bitcoin, utxos, outputs, 1)
        };

        let at_dust = plan_transaction(&request(546)).unwrap();
        assert_eq!(at_dust.selected_inputs.len(), 1);
        assert_eq!(at_dust.selected_inputs[0].value, 100_000);

        let above = plan_transaction(&request(547)).unwrap();
        let values: Vec<u64> = above.selected_inputs.iter().map(|u| u.value).collect();
        assert_eq!(values, vec![547, 100_000]);
    }

    #[test]
    fn test_fee_grows_with_byte_fee_next_to_small_candidates() {
        let params = CoinType::Bitcoin.params();
        let script = p2wpkh(PK1).build(params).unwrap();
        for policy in [SelectionPolicy::SelectAscending, SelectionPolicy::UseAll] {
            let utxos = vec![
                UnspentOutput::new(OutPoint::new([0x01; 32], 0), 800, script.clone()),
                UnspentOutput::new(OutPoint::new([0x02; 32], 0), 100_000, script.clone()),
            ];
            let outputs = vec![
                OutputIntent::to_address(TO, 50_000),
                OutputIntent::to_script(p2wpkh(PK0), None),
            ];
            let mut input = SigningInput::new(CoinType::Bitcoin, utxos, outputs, 3);
            input.policy = policy;
            let cheap = plan_transaction(&input).unwrap();
            input.byte_fee = 4;
            let dear = plan_transaction(&input).unwrap();

            assert_eq!(cheap.selected_inputs, dear.selected_inputs);
            assert!(dear.fee >= cheap.fee, "{:?}: {} < {}", policy, dear.fee, cheap.fee);
        }
    }

    #[test]
    fn test_byte_fee_cap() {
        let mut input = segwit_request();
        input.byte_fee = get_compiler_config().max_byte_fee + 1;
        assert_eq!(plan_transaction(&input).unwrap_err().code, ErrorCode::InvalidInput);
    }

    #[test]
    fn test_use_max_amount() {
        let mut input = segwit_request();
        input.outputs = vec![OutputIntent::to_script(p2wpkh(PK1), None)];
        input.use_max_amount = true;
        input.policy = SelectionPolicy::UseAll;
        let plan = plan_transaction(&input).unwrap();
        assert_eq!(plan.change, 0);
        assert_eq!(plan.selected_inputs.len(), 3);
        assert_eq!(plan.amount + plan.fee, 1_500_000);
        assert_eq!(plan.outputs[0].value, Some(plan.amount));
    }

    #[test]
    fn test_insufficient_funds() {
        let mut input = segwit_request();
        input.outputs[0].value = Some(1_600_000);
        assert_eq!(plan_transaction(&input).unwrap_err().code, ErrorCode::InsufficientFunds);
    }

    #[test]
    fn test_wrong_network_address() {
        let mut input = segwit_request();
        input.coin = CoinType::Litecoin;
        assert_eq!(plan_transaction(&input).unwrap_err().code, ErrorCode::InvalidAddress);
    }
}
