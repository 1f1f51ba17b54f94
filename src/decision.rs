//! The single entry point: raw inputs in, report out.

use super::{
    config::SolverConfig,
    error::DecisionError,
    expectation,
    expression::Expression,
    lagrangian,
    scenario::ScenarioDistribution,
    solver::{self, Outcome, ScenarioSolutions, Solution},
    symbol::Symbol,
    verifier::{self, Verification},
};
use serde::Serialize;

#[derive(Clone, Serialize, PartialEq, Debug)]
pub struct DecisionReport {
    pub decision: Symbol,
    pub rival: Symbol,
    pub multipliers: Vec<Symbol>,
    pub expected_utility: Expression,
    pub lagrangian: Expression,
    /// Left-hand side of `∂L/∂decision = 0`, rival still free.
    pub stationarity_equation: Expression,
    pub scenarios: Vec<ScenarioRecord>,
    pub solutions: Vec<SolutionRecord>,
    pub verifications: Vec<VerificationRecord>,
}

#[derive(Clone, Serialize, PartialEq, Debug)]
pub struct ScenarioRecord {
    pub rival_value: f64,
    pub probability: f64,
    #[serde(flatten)]
    pub status: ScenarioStatus,
}

#[derive(Clone, Serialize, PartialEq, Debug)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScenarioStatus {
    Solved { count: usize },
    NoSolution,
    Failed { error: String },
}

#[derive(Clone, Serialize, PartialEq, Debug)]
pub struct SolutionRecord {
    /// Index into `scenarios`.
    pub scenario_index: usize,
    pub rival_value: f64,
    pub decision_value: f64,
    pub multiplier_values: Vec<MultiplierValue>,
    pub undetermined: Vec<Symbol>,
    /// Every constraint was checked and satisfied.
    pub verified: bool,
}

#[derive(Clone, Serialize, PartialEq, Debug)]
pub struct MultiplierValue {
    pub symbol: Symbol,
    pub value: f64,
}

#[derive(Clone, Serialize, PartialEq, Debug)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerificationRecord {
    Checked {
        /// Index into `solutions`.
        solution_index: usize,
        rival_value: f64,
        constraint_index: usize,
        residual: f64,
        satisfied: bool,
    },
    Unverifiable {
        solution_index: usize,
        rival_value: f64,
        constraint_index: usize,
        error: String,
    },
}

impl VerificationRecord {
    pub fn satisfied(&self) -> bool {
        match self {
            VerificationRecord::Checked { satisfied, .. } => *satisfied,
            VerificationRecord::Unverifiable { .. } => false,
        }
    }

    pub fn solution_index(&self) -> usize {
        match self {
            VerificationRecord::Checked { solution_index, .. }
            | VerificationRecord::Unverifiable { solution_index, .. } => *solution_index,
        }
    }

    fn new(solution_index: usize, verification: Verification) -> Self {
        match verification {
            Ok(result) => VerificationRecord::Checked {
                solution_index,
                rival_value: result.rival_value,
                constraint_index: result.constraint_index,
                residual: result.residual,
                satisfied: result.satisfied,
            },
            Err(failure) => VerificationRecord::Unverifiable {
                solution_index,
                rival_value: failure.rival_value,
                constraint_index: failure.constraint_index,
                error: failure.error.to_string(),
            },
        }
    }
}

/// Optimal decision against every rival scenario.
///
/// Malformed input fails the whole call. Scenarios that cannot be solved and
/// constraints that cannot be checked are reported inside the result.
///
/// # Example
/// ```
/// use lagrange_decision::*;
/// let report = decision::compute_decision(
///     "xA",
///     "-10*xA",
///     "xB",
///     &[0.0, 10.0],
///     &[0.5, 0.5],
///     &[String::from("20 - xA - xB")],
///     &config::SolverConfig::default(),
/// )
/// .unwrap();
/// assert_eq!(report.solutions[0].decision_value, 20.0);
/// assert_eq!(report.solutions[1].decision_value, 10.0);
/// ```
pub fn compute_decision(
    decision_name: &str,
    objective_text: &str,
    rival_name: &str,
    rival_values: &[f64],
    rival_probabilities: &[f64],
    constraint_texts: &[String],
    config: &SolverConfig,
) -> Result<DecisionReport, DecisionError> {
    trace!("start: compute_decision");
    let decision = symbol_named(decision_name)?;
    let rival = symbol_named(rival_name)?;
    if decision == rival {
        return Err(DecisionError::InvalidInput(format!(
            "decision and rival are both `{}`",
            decision
        )));
    }
    let scenario =
        ScenarioDistribution::new(rival_values.to_vec(), rival_probabilities.to_vec())?;

    let expected_utility = expectation::build_expected_utility(
        objective_text,
        &decision,
        &rival,
        scenario.values(),
        scenario.probabilities(),
    )?;
    let model = lagrangian::compose(expected_utility, constraint_texts, &decision, &rival)?;
    let multipliers = model.multiplier_symbols();

    let system = solver::stationarity_system(&model, &decision, &multipliers);
    let solved = solver::solve_system(&system, &rival, &scenario, config);

    let constraints = model.constraints();
    let mut solutions = Vec::new();
    let mut verifications = Vec::new();
    for (scenario_index, scenario) in solved.iter().enumerate() {
        for solution in scenario.solutions() {
            let solution_index = solutions.len();
            let checks: Vec<VerificationRecord> = verifier::verify_within(
                solution,
                &constraints,
                &decision,
                &rival,
                config.verification_tolerance,
            )
            .into_iter()
            .map(|verification| VerificationRecord::new(solution_index, verification))
            .collect();
            let verified = checks.iter().all(VerificationRecord::satisfied);
            solutions.push(solution_record(scenario_index, solution, &decision, verified));
            verifications.extend(checks);
        }
    }

    info!(
        "{} scenario(s), {} solution(s), {} of {} check(s) satisfied",
        solved.len(),
        solutions.len(),
        verifications.iter().filter(|v| v.satisfied()).count(),
        verifications.len()
    );
    trace!("finish: compute_decision");
    Ok(DecisionReport {
        stationarity_equation: system.stationarity,
        decision,
        rival,
        multipliers,
        expected_utility: model.expected_utility,
        lagrangian: model.lagrangian,
        scenarios: solved.iter().map(scenario_record).collect(),
        solutions,
        verifications,
    })
}

fn symbol_named(name: &str) -> Result<Symbol, DecisionError> {
    let name = name.trim();
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) => {
            (c.is_alphabetic() || c == '_') && chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        None => false,
    };
    if !valid {
        return Err(DecisionError::InvalidInput(format!(
            "`{}` is not a symbol name",
            name
        )));
    }
    Ok(Symbol::new(name))
}

fn scenario_record(scenario: &ScenarioSolutions) -> ScenarioRecord {
    ScenarioRecord {
        rival_value: scenario.rival_value,
        probability: scenario.probability,
        status: match &scenario.outcome {
            Outcome::Solved(solutions) => ScenarioStatus::Solved {
                count: solutions.len(),
            },
            Outcome::NoSolution => ScenarioStatus::NoSolution,
            Outcome::Failed(error) => ScenarioStatus::Failed {
                error: error.to_string(),
            },
        },
    }
}

fn solution_record(
    scenario_index: usize,
    solution: &Solution,
    decision: &Symbol,
    verified: bool,
) -> SolutionRecord {
    SolutionRecord {
        scenario_index,
        rival_value: solution.rival_value(),
        decision_value: solution.value(decision).unwrap_or(f64::NAN),
        multiplier_values: solution
            .values()
            .iter()
            .filter(|(symbol, _)| symbol != decision)
            .map(|(symbol, value)| MultiplierValue {
                symbol: symbol.clone(),
                value: *value,
            })
            .collect(),
        undetermined: solution.undetermined().to_vec(),
        verified,
    }
}
