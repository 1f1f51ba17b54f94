use super::{
    error::DecisionError,
    expression::{BinaryOp, Expression},
    parser,
    scenario::check_counts,
    symbol::Symbol,
};

/// Expected utility of `objective_text` over the rival's distribution.
///
/// Each scenario contributes `probability * objective[rival := value]`; the
/// decision symbol stays free. The sum is not simplified beyond constant
/// folding, but evaluates to the expectation for any decision value.
pub fn build_expected_utility(
    objective_text: &str,
    decision: &Symbol,
    rival: &Symbol,
    values: &[f64],
    probabilities: &[f64],
) -> Result<Expression, DecisionError> {
    trace!("start: build_expected_utility");
    check_counts(values, probabilities)?;

    let objective = parser::parse(objective_text, &[decision.clone(), rival.clone()])
        .map_err(DecisionError::Objective)?;

    let expected_utility = values
        .iter()
        .zip(probabilities)
        .map(|(value, prob)| {
            Expression::folded_binary(
                BinaryOp::Mul,
                Expression::constant(*prob),
                objective.substitute_value(rival, *value),
            )
        })
        .fold(None, |sum: Option<Expression>, term| {
            Some(match sum {
                None => term,
                Some(sum) => Expression::folded_binary(BinaryOp::Add, sum, term),
            })
        })
        .unwrap_or_else(|| Expression::constant(0.0));

    debug!("expected utility: {}", expected_utility);
    trace!("finish: build_expected_utility");
    Ok(expected_utility)
}
