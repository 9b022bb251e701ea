//! UTXO Selection
//!
//! Chooses which candidate outputs fund a request and settles fee and
//! change. The selector only sees candidate values and a [`FeeModel`];
//! scripts, claims and framing are the model's business.

use serde::{Deserialize, Serialize};

// =============================================================================
// Types
// =============================================================================

/// Candidate ordering strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Smallest candidates first
    #[default]
    SelectAscending,
    /// Largest candidates first
    SelectDescending,
    /// Spend every candidate
    UseAll,
}

/// Selection failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: u64, available: u64 },

    #[error("Dust threshold unreachable: {0}")]
    DustThresholdUnreachable(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Fee of a candidate transaction shape
pub trait FeeModel {
    /// Fee for spending the given candidates, with or without the value-less output
    fn fee(&self, inputs: &[usize], with_variable_output: bool) -> u64;

    /// Fee contributed by one candidate when added as an input
    fn marginal_input_fee(&self, index: usize) -> u64;
}

/// What the selected inputs must pay for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionTarget {
    /// Sum of the fixed-value outputs
    pub amount: u64,
    /// Whether a value-less (change or max) output was requested
    pub variable_output: bool,
    pub use_max_amount: bool,
    pub dust_threshold: u64,
    pub policy: SelectionPolicy,
}

/// Outcome of a selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Candidate indices in spend order
    pub inputs: Vec<usize>,
    pub available: u64,
    pub fee: u64,
    /// Value of the variable output; `None` when it was folded into the fee
    pub variable_value: Option<u64>,
}

// =============================================================================
// Public API
// =============================================================================

/// Select inputs from `values` (candidate values in submission order)
pub fn select_utxos(
    values: &[u64],
    target: &SelectionTarget,
    model: &impl FeeModel,
) -> Result<Selection, SelectionError> {
    if values.is_empty() {
        return Err(SelectionError::InsufficientFunds {
            required: target.amount,
            available: 0,
        });
    }
    if target.use_max_amount && !target.variable_output {
        return Err(SelectionError::InvalidRequest(
            "use_max_amount needs an output without a value".to_string(),
        ));
    }

    // At least one candidate must be worth more than dust once its own input fee is paid
    let pays_for_itself =
        (0..values.len()).any(|i| values[i] > target.dust_threshold.saturating_add(model.marginal_input_fee(i)));
    if !pays_for_itself {
        return Err(SelectionError::DustThresholdUnreachable(format!(
            "all {} candidates are below dust plus their input fee",
            values.len()
        )));
    }

    // Eligibility ignores the fee rate so a higher rate never sheds an input
    let mut eligible: Vec<usize> = match target.policy {
        SelectionPolicy::UseAll => (0..values.len()).collect(),
        _ => (0..values.len()).filter(|&i| values[i] > target.dust_threshold).collect(),
    };

    // Stable sorts keep submission order on ties
    match target.policy {
        SelectionPolicy::SelectAscending => eligible.sort_by_key(|&i| values[i]),
        SelectionPolicy::SelectDescending => eligible.sort_by_key(|&i| std::cmp::Reverse(values[i])),
        SelectionPolicy::UseAll => {}
    }

    if target.use_max_amount {
        return select_max(values, eligible, target, model);
    }

    let selected = if target.policy == SelectionPolicy::UseAll {
        eligible
    } else {
        accumulate(values, &eligible, target, model)
    };

    settle(values, selected, target, model)
}

// =============================================================================
// Helpers
// =============================================================================

fn total_of(values: &[u64], inputs: &[usize]) -> Result<u64, SelectionError> {
    inputs.iter().try_fold(0u64, |acc, &i| {
        acc.checked_add(values[i])
            .ok_or_else(|| SelectionError::InvalidRequest("candidate values overflow".to_string()))
    })
}

/// Add candidates in order until the fixed outputs and fee are covered
fn accumulate(values: &[u64], order: &[usize], target: &SelectionTarget, model: &impl FeeModel) -> Vec<usize> {
    let mut selected = Vec::new();
    let mut total: u64 = 0;

    for &index in order {
        selected.push(index);
        total = total.saturating_add(values[index]);
        let fee = model.fee(&selected, target.variable_output);
        if total >= target.amount.saturating_add(fee) {
            break;
        }
    }

    selected
}

fn settle(
    values: &[u64],
    inputs: Vec<usize>,
    target: &SelectionTarget,
    model: &impl FeeModel,
) -> Result<Selection, SelectionError> {
    let available = total_of(values, &inputs)?;
    let fee_without = model.fee(&inputs, false);

    let required = target.amount.saturating_add(fee_without);
    if available < required {
        let required = if target.variable_output {
            target.amount.saturating_add(model.fee(&inputs, true))
        } else {
            required
        };
        return Err(SelectionError::InsufficientFunds { required, available });
    }

    if target.variable_output {
        let fee_with = model.fee(&inputs, true);
        if let Some(change) = available.checked_sub(target.amount.saturating_add(fee_with)) {
            if change >= target.dust_threshold {
                return Ok(Selection {
                    inputs,
                    available,
                    fee: fee_with,
                    variable_value: Some(change),
                });
            }
        }
    }

    // No change output: the leftover is the fee
    Ok(Selection {
        fee: available - target.amount,
        inputs,
        available,
        variable_value: None,
    })
}

fn select_max(
    values: &[u64],
    inputs: Vec<usize>,
    target: &SelectionTarget,
    model: &impl FeeModel,
) -> Result<Selection, SelectionError> {
    let available = total_of(values, &inputs)?;
    let fee = model.fee(&inputs, true);
    let required = target.amount.saturating_add(fee);

    let max = available
        .checked_sub(required)
        .ok_or(SelectionError::InsufficientFunds { required, available })?;
    if max < target.dust_threshold {
        return Err(SelectionError::DustThresholdUnreachable(format!(
            "max output {} is below dust {}",
            max, target.dust_threshold
        )));
    }

    Ok(Selection {
        inputs,
        available,
        fee,
        variable_value: Some(max),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 10 + 100 per input + 30 for the variable output, per sat/vB
    struct LinearModel {
        byte_fee: u64,
    }

    impl FeeModel for LinearModel {
        fn fee(&self, inputs: &[usize], with_variable_output: bool) -> u64 {
            let vsize = 10 + 100 * inputs.len() as u64 + if with_variable_output { 30 } else { 0 };
            vsize * self.byte_fee
        }

        fn marginal_input_fee(&self, _index: usize) -> u64 {
            100 * self.byte_fee
        }
    }

    fn target(amount: u64, variable_output: bool) -> SelectionTarget {
        SelectionTarget {
            amount,
            variable_output,
            use_max_amount: false,
            dust_threshold: 546,
            policy: SelectionPolicy::SelectAscending,
        }
    }

    #[test]
    fn test_ascending_accumulation_with_change() {
        let model = LinearModel { byte_fee: 1 };
        let selection = select_utxos(&[600_000, 500_000, 400_000], &target(1_200_000, true), &model).unwrap();
        assert_eq!(selection.inputs, vec![2, 1, 0]);
        assert_eq!(selection.fee, 340);
        assert_eq!(selection.variable_value, Some(1_500_000 - 1_200_000 - 340));
    }

    #[test]
    fn test_descending_stops_early() {
        let model = LinearModel { byte_fee: 1 };
        let mut t = target(550_000, true);
        t.policy = SelectionPolicy::SelectDescending;
        let selection = select_utxos(&[400_000, 600_000, 500_000], &t, &model).unwrap();
        assert_eq!(selection.inputs, vec![1]);
        assert_eq!(selection.available, 600_000);
    }

    #[test]
    fn test_ties_keep_submission_order() {
        let model = LinearModel { byte_fee: 1 };
        let selection = select_utxos(&[5_000, 5_000, 5_000], &target(9_900, false), &model).unwrap();
        assert_eq!(selection.inputs, vec![0, 1, 2]);
    }

    #[test]
    fn test_change_below_dust_is_folded() {
        let model = LinearModel { byte_fee: 1 };
        // 10_000 - 9_400 - 140 leaves 460 of change
        let selection = select_utxos(&[10_000], &target(9_400, true), &model).unwrap();
        assert_eq!(selection.variable_value, None);
        assert_eq!(selection.fee, 600);
    }

    #[test]
    fn test_no_change_intent_pays_leftover() {
        let model = LinearModel { byte_fee: 2 };
        let selection = select_utxos(&[50_000], &target(40_000, false), &model).unwrap();
        assert_eq!(selection.fee, 10_000);
        assert_eq!(selection.variable_value, None);
    }

    #[test]
    fn test_insufficient_funds() {
        let model = LinearModel { byte_fee: 1 };
        let err = select_utxos(&[600_000, 300_000], &target(1_200_000, true), &model).unwrap_err();
        assert_eq!(
            err,
            SelectionError::InsufficientFunds {
                required: 1_200_000 + 240,
                available: 900_000
            }
        );

        let err = select_utxos(&[], &target(1, true), &model).unwrap_err();
        assert!(matches!(err, SelectionError::InsufficientFunds { available: 0, .. }));
    }

    #[test]
    fn test_all_candidates_dust() {
        let model = LinearModel { byte_fee: 1 };
        let err = select_utxos(&[500, 646], &target(100, true), &model).unwrap_err();
        assert!(matches!(err, SelectionError::DustThresholdUnreachable(_)));
    }

    #[test]
    fn test_eligibility_does_not_depend_on_byte_fee() {
        // 800 covers dust plus its input fee at 2 sat/vB but not at 3
        let mut t = target(50_000, true);
        for policy in [SelectionPolicy::SelectAscending, SelectionPolicy::UseAll] {
            t.policy = policy;
            let cheap = select_utxos(&[800, 100_000], &t, &LinearModel { byte_fee: 2 }).unwrap();
            let dear = select_utxos(&[800, 100_000], &t, &LinearModel { byte_fee: 3 }).unwrap();
            assert_eq!(cheap.inputs, dear.inputs);
            assert!(dear.fee > cheap.fee, "{:?}: {} <= {}", policy, dear.fee, cheap.fee);
        }
    }

    #[test]
    fn test_use_all_keeps_dust_candidates() {
        let mut t = target(1_000, true);
        t.policy = SelectionPolicy::UseAll;
        let selection = select_utxos(&[4_000, 100, 6_000], &t, &LinearModel { byte_fee: 1 }).unwrap();
        assert_eq!(selection.inputs, vec![0, 1, 2]);
        assert_eq!(selection.available, 10_100);
    }

    #[test]
    fn test_use_max_spends_everything() {
        let model = LinearModel { byte_fee: 1 };
        let mut t = target(1_000, true);
        t.use_max_amount = true;
        let selection = select_utxos(&[4_000, 100, 6_000], &t, &model).unwrap();
        // 100 is below dust plus its input fee
        assert_eq!(selection.inputs, vec![0, 2]);
        assert_eq!(selection.fee, 240);
        assert_eq!(selection.variable_value, Some(10_000 - 1_000 - 240));
    }

    #[test]
    fn test_use_max_below_dust() {
        let model = LinearModel { byte_fee: 1 };
        let mut t = target(1_000, true);
        t.use_max_amount = true;
        let err = select_utxos(&[1_600], &t, &model).unwrap_err();
        assert!(matches!(err, SelectionError::DustThresholdUnreachable(_)));
    }

    #[test]
    fn test_use_max_requires_variable_output() {
        let model = LinearModel { byte_fee: 1 };
        let mut t = target(1_000, false);
        t.use_max_amount = true;
        let err = select_utxos(&[10_000], &t, &model).unwrap_err();
        assert!(matches!(err, SelectionError::InvalidRequest(_)));
    }
}
