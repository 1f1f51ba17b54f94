//! Error taxonomy.
//!
//! Parse, scenario and probability errors reject a whole request. Solve and
//! evaluation errors are scoped to one scenario or one (solution, constraint)
//! pair and are carried inside the results instead.

use super::symbol::Symbol;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum ParseError {
    #[error("unexpected character `{found}` at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },
    #[error("expected {expected} at offset {offset}, found `{found}`")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
        offset: usize,
    },
    #[error("expected {expected}, found end of input")]
    UnexpectedEnd { expected: &'static str },
    #[error("invalid number `{text}` at offset {offset}")]
    InvalidNumber { text: String, offset: usize },
    #[error("unknown symbol `{name}` at offset {offset}")]
    UnknownSymbol { name: String, offset: usize },
}

#[derive(Clone, Debug, PartialEq, Error)]
#[error("{values} rival values but {probabilities} probabilities")]
pub struct ScenarioMismatchError {
    pub values: usize,
    pub probabilities: usize,
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum ProbabilityError {
    #[error("probabilities sum to {sum}, expected 1")]
    Sum { sum: f64 },
    #[error("probability #{index} is {value}, expected a finite non-negative number")]
    Invalid { index: usize, value: f64 },
    #[error("rival value #{index} is not finite")]
    NonFiniteValue { index: usize },
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum EvaluationError {
    #[error("free symbol `{0}` left after substitution")]
    FreeSymbol(Symbol),
    #[error("division by zero")]
    DivisionByZero,
    #[error("undefined result of `{0}`")]
    Undefined(&'static str),
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum SolveError {
    #[error("`{0}` is not determined by the equation system")]
    Underdetermined(Symbol),
    #[error("symbol `{0}` is neither an unknown nor bound by the scenario")]
    UnboundSymbol(Symbol),
    #[error("no answer within {millis} ms")]
    Timeout { millis: u64 },
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

/// Request-level failure of a whole computation.
#[derive(Debug, Error)]
pub enum DecisionError {
    #[error("objective: {0}")]
    Objective(#[source] ParseError),
    #[error("constraint {index}: {source}")]
    Constraint {
        index: usize,
        #[source]
        source: ParseError,
    },
    #[error(transparent)]
    ScenarioMismatch(#[from] ScenarioMismatchError),
    #[error(transparent)]
    Probability(#[from] ProbabilityError),
    #[error("invalid input `{0}`")]
    InvalidInput(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
