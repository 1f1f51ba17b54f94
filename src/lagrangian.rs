use super::{
    error::DecisionError,
    expression::{BinaryOp, Expression},
    parser,
    symbol::Symbol,
};
use serde::Serialize;

/// An expression required to equal zero, with the text it was parsed from.
#[derive(Clone, Serialize, PartialEq, Debug)]
pub struct Constraint {
    pub source: String,
    pub expression: Expression,
}

#[derive(Clone, Serialize, PartialEq, Debug)]
pub struct LagrangianModel {
    pub expected_utility: Expression,
    pub lagrangian: Expression,
    /// One multiplier per constraint, in constraint order.
    pub multipliers: Vec<(Symbol, Constraint)>,
}

impl LagrangianModel {
    pub fn multiplier_symbols(&self) -> Vec<Symbol> {
        self.multipliers
            .iter()
            .map(|(symbol, _)| symbol.clone())
            .collect()
    }

    pub fn constraints(&self) -> Vec<Constraint> {
        self.multipliers
            .iter()
            .map(|(_, constraint)| constraint.clone())
            .collect()
    }
}

/// `expected_utility + Σ λi * constraint_i`.
///
/// Constraints may mention `decision` and `rival`; the rival stays free so
/// that the model can be bound once per scenario later. Multipliers are named
/// `λ1, λ2, ..` by position, suffixed with `_` if that would clash.
pub fn compose(
    expected_utility: Expression,
    constraint_texts: &[String],
    decision: &Symbol,
    rival: &Symbol,
) -> Result<LagrangianModel, DecisionError> {
    trace!("start: compose");
    let known = [decision.clone(), rival.clone()];

    let mut lagrangian = expected_utility.clone();
    let mut multipliers = Vec::with_capacity(constraint_texts.len());
    for (index, text) in constraint_texts.iter().enumerate() {
        let expression = parser::parse(text, &known)
            .map_err(|source| DecisionError::Constraint { index, source })?;
        let multiplier = fresh_multiplier(index, &known);

        lagrangian = Expression::binary(
            BinaryOp::Add,
            lagrangian,
            Expression::binary(
                BinaryOp::Mul,
                Expression::variable(&multiplier),
                expression.clone(),
            ),
        );
        multipliers.push((
            multiplier,
            Constraint {
                source: text.clone(),
                expression,
            },
        ));
    }

    debug!("lagrangian: {}", lagrangian);
    trace!("finish: compose");
    Ok(LagrangianModel {
        expected_utility,
        lagrangian,
        multipliers,
    })
}

fn fresh_multiplier(index: usize, taken: &[Symbol]) -> Symbol {
    let mut multiplier = Symbol::multiplier(index);
    while taken.contains(&multiplier) {
        multiplier = Symbol::new(&format!("{}_", multiplier));
    }
    multiplier
}
