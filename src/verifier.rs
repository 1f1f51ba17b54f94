//! Independent check of solved values against the constraints as written,
//! before any multiplier augmentation.

use super::{
    error::EvaluationError, lagrangian::Constraint, solver::Solution, symbol::Symbol,
};
use serde::Serialize;

/// Residuals strictly below this count as satisfied.
pub const VERIFICATION_TOLERANCE: f64 = 1e-6;

#[derive(Clone, Serialize, PartialEq, Debug)]
pub struct VerificationResult {
    pub rival_value: f64,
    pub constraint_index: usize,
    pub residual: f64,
    pub satisfied: bool,
}

/// A (solution, constraint) pair whose residual could not be computed.
#[derive(Clone, PartialEq, Debug)]
pub struct VerificationFailure {
    pub rival_value: f64,
    pub constraint_index: usize,
    pub error: EvaluationError,
}

pub type Verification = Result<VerificationResult, VerificationFailure>;

pub fn verify(
    solution: &Solution,
    constraints: &[Constraint],
    decision: &Symbol,
    rival: &Symbol,
) -> Vec<Verification> {
    verify_within(solution, constraints, decision, rival, VERIFICATION_TOLERANCE)
}

/// Substitute the solved decision and the scenario's rival value into every
/// constraint and classify `|residual| < tolerance` as satisfied. A failure
/// affects only its own constraint.
pub fn verify_within(
    solution: &Solution,
    constraints: &[Constraint],
    decision: &Symbol,
    rival: &Symbol,
    tolerance: f64,
) -> Vec<Verification> {
    let rival_value = solution.rival_value();
    constraints
        .iter()
        .enumerate()
        .map(|(constraint_index, constraint)| {
            let mut closed = constraint.expression.substitute_value(rival, rival_value);
            if let Some(decision_value) = solution.value(decision) {
                closed = closed.substitute_value(decision, decision_value);
            }
            match closed.evaluate() {
                Ok(residual) => {
                    let satisfied = residual.abs() < tolerance;
                    if !satisfied {
                        warn!(
                            "{} = {}: `{}` leaves residual {}",
                            rival, rival_value, constraint.source, residual
                        );
                    }
                    Ok(VerificationResult {
                        rival_value,
                        constraint_index,
                        residual,
                        satisfied,
                    })
                }
                Err(error) => {
                    warn!(
                        "{} = {}: cannot check `{}`: {}",
                        rival, rival_value, constraint.source, error
                    );
                    Err(VerificationFailure {
                        rival_value,
                        constraint_index,
                        error,
                    })
                }
            }
        })
        .collect()
}
