//! Per-token pricing for the models we know about.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// (input, output) USD cost per token for a model name.
///
/// Matching is by prefix so dated model ids (`claude-sonnet-4-20250514`) resolve.
pub fn model_cost(model: &str) -> Option<(Decimal, Decimal)> {
    let model = model.to_ascii_lowercase();
    let table: &[(&str, Decimal, Decimal)] = &[
        ("claude-opus-4", dec!(0.000015), dec!(0.000075)),
        ("claude-sonnet-4", dec!(0.000003), dec!(0.000015)),
        ("claude-3-7-sonnet", dec!(0.000003), dec!(0.000015)),
        ("claude-3-5-sonnet", dec!(0.000003), dec!(0.000015)),
        ("claude-3-5-haiku", dec!(0.0000008), dec!(0.000004)),
        ("gpt-4o-mini", dec!(0.00000015), dec!(0.0000006)),
        ("gpt-4o", dec!(0.0000025), dec!(0.00001)),
        ("gpt-4.1-mini", dec!(0.0000004), dec!(0.0000016)),
        ("gpt-4.1", dec!(0.000002), dec!(0.000008)),
    ];
    table
        .iter()
        .find(|(prefix, _, _)| model.starts_with(prefix))
        .map(|(_, input, output)| (*input, *output))
}

/// Fallback pricing when the model is not in the table.
pub fn default_cost() -> (Decimal, Decimal) {
    (dec!(0.000003), dec!(0.000015))
}

/// Estimated USD cost of one call.
pub fn estimate(costs: (Decimal, Decimal), input_tokens: u32, output_tokens: u32) -> Decimal {
    costs.0 * Decimal::from(input_tokens) + costs.1 * Decimal::from(output_tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dated_model_ids_resolve_by_prefix() {
        let (input, output) = model_cost("claude-sonnet-4-20250514").unwrap();
        assert_eq!(input, dec!(0.000003));
        assert_eq!(output, dec!(0.000015));
    }

    #[test]
    fn mini_variant_is_not_shadowed_by_base_model() {
        let (input, _) = model_cost("gpt-4o-mini").unwrap();
        assert_eq!(input, dec!(0.00000015));
    }

    #[test]
    fn unknown_model_has_no_entry() {
        assert!(model_cost("mistral-large-latest").is_none());
    }

    #[test]
    fn estimate_sums_both_directions() {
        let cost = estimate((dec!(0.001), dec!(0.002)), 10, 5);
        assert_eq!(cost, dec!(0.02));
    }
}
