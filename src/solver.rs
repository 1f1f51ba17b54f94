//! Stationarity conditions of a Lagrangian, solved once per rival scenario.
//!
//! The system is `∂L/∂x = 0` together with every `constraint_i = 0`, over the
//! decision `x` and the multipliers. After the rival value is bound, a system
//! whose Jacobian is constant is solved exactly by elimination; anything else
//! goes through a damped Newton search from every configured seed.

use super::{
    config::SolverConfig,
    error::{EvaluationError, SolveError},
    expression::Expression,
    lagrangian::LagrangianModel,
    linalg::{self, LinearSolution, Matrix},
    scenario::ScenarioDistribution,
    symbol::Symbol,
};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressIterator};
use rayon::prelude::*;
use serde::Serialize;
use std::time::Instant;

/// Values of the unknowns for one scenario. Built once, never changed.
#[derive(Clone, Serialize, PartialEq, Debug)]
pub struct Solution {
    rival_value: f64,
    values: Vec<(Symbol, f64)>,
    undetermined: Vec<Symbol>,
}

impl Solution {
    fn from_root(rival_value: f64, unknowns: &[Symbol], root: Root) -> Self {
        let mut values = Vec::new();
        let mut undetermined = Vec::new();
        for (symbol, value) in unknowns.iter().zip(root) {
            match value {
                Some(value) => values.push((symbol.clone(), value)),
                None => undetermined.push(symbol.clone()),
            }
        }
        Solution {
            rival_value,
            values,
            undetermined,
        }
    }

    /// The rival value of the scenario this solution belongs to.
    pub fn rival_value(&self) -> f64 {
        self.rival_value
    }

    pub fn value(&self, symbol: &Symbol) -> Option<f64> {
        self.values
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, value)| *value)
    }

    /// Determined unknowns in unknown order.
    pub fn values(&self) -> &[(Symbol, f64)] {
        &self.values
    }

    /// Unknowns the system leaves free, e.g. multipliers of redundant
    /// constraints.
    pub fn undetermined(&self) -> &[Symbol] {
        &self.undetermined
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum Outcome {
    Solved(Vec<Solution>),
    NoSolution,
    Failed(SolveError),
}

#[derive(Clone, PartialEq, Debug)]
pub struct ScenarioSolutions {
    pub rival_value: f64,
    pub probability: f64,
    pub outcome: Outcome,
}

impl ScenarioSolutions {
    pub fn solutions(&self) -> &[Solution] {
        match &self.outcome {
            Outcome::Solved(solutions) => solutions,
            _ => &[],
        }
    }
}

/// Equations still open in the rival symbol.
#[derive(Clone, PartialEq, Debug)]
pub struct StationaritySystem {
    /// `∂L/∂decision`
    pub stationarity: Expression,
    /// The stationarity condition followed by the constraints, each `= 0`.
    pub equations: Vec<Expression>,
    /// The decision followed by the multipliers.
    pub unknowns: Vec<Symbol>,
}

pub fn stationarity_system(
    model: &LagrangianModel,
    decision: &Symbol,
    multipliers: &[Symbol],
) -> StationaritySystem {
    let stationarity = model.lagrangian.differentiate(decision);
    debug!("stationarity: {} = 0", stationarity);
    let mut equations = vec![stationarity.clone()];
    equations.extend(
        model
            .multipliers
            .iter()
            .map(|(_, constraint)| constraint.expression.clone()),
    );
    let mut unknowns = vec![decision.clone()];
    unknowns.extend(multipliers.iter().cloned());
    StationaritySystem {
        stationarity,
        equations,
        unknowns,
    }
}

/// Solve the stationarity system of `model` for every scenario, in scenario
/// order.
///
/// A scenario without solutions, or whose solve fails, is reported as such
/// and does not affect the others.
pub fn solve_per_scenario(
    model: &LagrangianModel,
    decision: &Symbol,
    multipliers: &[Symbol],
    rival: &Symbol,
    scenario: &ScenarioDistribution,
    config: &SolverConfig,
) -> Vec<ScenarioSolutions> {
    let system = stationarity_system(model, decision, multipliers);
    solve_system(&system, rival, scenario, config)
}

/// `solve_per_scenario` for an already derived system.
pub fn solve_system(
    system: &StationaritySystem,
    rival: &Symbol,
    scenario: &ScenarioDistribution,
    config: &SolverConfig,
) -> Vec<ScenarioSolutions> {
    trace!("start: solve_system");
    let deadline = config.timeout().map(|timeout| Instant::now() + timeout);
    let pairs: Vec<(f64, f64)> = scenario.iter().collect();
    let progress = if config.progress {
        ProgressBar::new(pairs.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    let solve = |&(rival_value, probability): &(f64, f64)| ScenarioSolutions {
        rival_value,
        probability,
        outcome: solve_scenario(system, rival, rival_value, config, deadline),
    };
    let solved: Vec<ScenarioSolutions> = if config.parallel {
        pairs.par_iter().progress_with(progress).map(solve).collect()
    } else {
        pairs.iter().progress_with(progress).map(solve).collect()
    };

    trace!("finish: solve_system");
    solved
}

/// Bind `rival := rival_value` and solve the closed system.
pub fn solve_scenario(
    system: &StationaritySystem,
    rival: &Symbol,
    rival_value: f64,
    config: &SolverConfig,
    deadline: Option<Instant>,
) -> Outcome {
    let closed = ClosedSystem::bind(system, rival, rival_value);
    match closed.solve(config, deadline) {
        Ok(roots) if roots.is_empty() => {
            warn!("{} = {}: no solution", rival, rival_value);
            Outcome::NoSolution
        }
        Ok(roots) => {
            debug!("{} = {}: {} solution(s)", rival, rival_value, roots.len());
            Outcome::Solved(
                roots
                    .into_iter()
                    .map(|root| Solution::from_root(rival_value, &system.unknowns, root))
                    .collect(),
            )
        }
        Err(error) => {
            warn!("{} = {}: {}", rival, rival_value, error);
            Outcome::Failed(error)
        }
    }
}

/// `None` marks an unknown the system leaves free.
type Root = Vec<Option<f64>>;

const POLISH_STEPS: usize = 3;

struct ClosedSystem<'a> {
    equations: Vec<Expression>,
    jacobian: Vec<Vec<Expression>>,
    unknowns: &'a [Symbol],
}

impl<'a> ClosedSystem<'a> {
    fn bind(system: &'a StationaritySystem, rival: &Symbol, rival_value: f64) -> Self {
        let equations: Vec<Expression> = system
            .equations
            .iter()
            .map(|eq| eq.substitute_value(rival, rival_value))
            .collect();
        let jacobian: Vec<Vec<Expression>> = equations
            .iter()
            .map(|eq| {
                system
                    .unknowns
                    .iter()
                    .map(|unknown| eq.differentiate(unknown))
                    .collect()
            })
            .collect();
        ClosedSystem {
            equations,
            jacobian,
            unknowns: &system.unknowns,
        }
    }

    fn solve(&self, config: &SolverConfig, deadline: Option<Instant>) -> Result<Vec<Root>, SolveError> {
        for eq in self.equations.iter() {
            if let Some(unbound) = eq
                .free_symbols()
                .into_iter()
                .find(|s| !self.unknowns.contains(s))
            {
                return Err(SolveError::UnboundSymbol(unbound));
            }
        }
        if self.is_linear() {
            trace!("linear system");
            self.solve_linear()
        } else {
            trace!("nonlinear system");
            self.search_roots(config, deadline)
        }
    }

    fn is_linear(&self) -> bool {
        self.jacobian
            .iter()
            .flatten()
            .all(|d| d.free_symbols().is_empty())
    }

    fn residuals(&self, point: &[f64]) -> Result<Vec<f64>, EvaluationError> {
        let lookup = |s: &Symbol| self.unknowns.iter().position(|u| u == s).map(|i| point[i]);
        self.equations
            .iter()
            .map(|eq| eq.evaluate_with(&lookup))
            .collect()
    }

    fn jacobian_at(&self, point: &[f64]) -> Result<Matrix, EvaluationError> {
        let lookup = |s: &Symbol| self.unknowns.iter().position(|u| u == s).map(|i| point[i]);
        self.jacobian
            .iter()
            .map(|row| {
                row.iter()
                    .map(|d| d.evaluate_with(&lookup))
                    .collect::<Result<Vec<f64>, _>>()
            })
            .collect()
    }

    /// `J u = -F(0)` for a system affine in the unknowns.
    fn solve_linear(&self) -> Result<Vec<Root>, SolveError> {
        let origin = vec![0.0; self.unknowns.len()];
        let a = self.jacobian_at(&origin)?;
        let b: Vec<f64> = self.residuals(&origin)?.into_iter().map(|f| -f).collect();
        match linalg::solve(&a, &b) {
            LinearSolution::Inconsistent => Ok(vec![]),
            LinearSolution::Solved(values) => {
                if values[0].is_none() {
                    return Err(SolveError::Underdetermined(self.unknowns[0].clone()));
                }
                Ok(vec![values])
            }
        }
    }

    fn search_roots(&self, config: &SolverConfig, deadline: Option<Instant>) -> Result<Vec<Root>, SolveError> {
        let n = self.unknowns.len();
        let multiplier_seeds = if n == 1 { 1 } else { config.seeds.len() };
        let mut roots: Vec<Root> = Vec::new();

        for &decision_seed in config.seeds.iter() {
            for &multiplier_seed in config.seeds.iter().take(multiplier_seeds) {
                let start: Vec<f64> = (0..n)
                    .map(|j| match j {
                        0 => decision_seed,
                        j => multiplier_seed * (1.0 + 0.25 * (j - 1) as f64),
                    })
                    .collect();
                let point = match self.newton(start, config, deadline)? {
                    Some(point) => point,
                    None => continue,
                };
                let determined = self.determined_at(&point, config);
                if !determined[0] {
                    return Err(SolveError::Underdetermined(self.unknowns[0].clone()));
                }
                let root: Root = point
                    .into_iter()
                    .zip(determined)
                    .map(|(x, determined)| if determined { Some(x) } else { None })
                    .collect();
                if !roots
                    .iter()
                    .any(|known| same_root(known, &root, config.root_tolerance))
                {
                    roots.push(root);
                }
            }
        }
        roots.sort_by(|a, b| {
            let (a, b) = (a[0].unwrap_or(0.0), b[0].unwrap_or(0.0));
            a.total_cmp(&b)
        });
        Ok(roots)
    }

    /// Levenberg-Marquardt iteration. `None` when the start does not lead to
    /// a root within the iteration cap.
    fn newton(
        &self,
        start: Vec<f64>,
        config: &SolverConfig,
        deadline: Option<Instant>,
    ) -> Result<Option<Vec<f64>>, SolveError> {
        let mut point = start;
        let mut f = match self.residuals(&point) {
            Ok(f) => f,
            Err(_) => return Ok(None),
        };
        let mut damping = 1e-3;

        for _ in 0..config.max_iterations {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return Err(SolveError::Timeout {
                        millis: config.timeout_ms.unwrap_or_default(),
                    });
                }
            }
            let jacobian = match self.jacobian_at(&point) {
                Ok(jacobian) => jacobian,
                Err(_) => return Ok(None),
            };
            if is_root(&f, &jacobian, &point, config.tolerance) {
                return Ok(Some(self.polish(point, f)));
            }
            let (lhs, rhs) = normal_equations(&jacobian, &f, damping);
            let step = match linalg::solve_unique(&lhs, &rhs) {
                Some(step) => step,
                None => {
                    damping *= 10.0;
                    continue;
                }
            };
            let candidate: Vec<f64> = point.iter().zip(&step).map(|(x, d)| x + d).collect();
            match self.residuals(&candidate) {
                Ok(g) if norm2(&g) < norm2(&f) => {
                    point = candidate;
                    f = g;
                    damping = (damping / 10.0).max(1e-15);
                }
                _ => {
                    damping *= 10.0;
                    if damping > 1e15 {
                        return Ok(None);
                    }
                }
            }
        }
        Ok(match self.jacobian_at(&point) {
            Ok(jacobian) if is_root(&f, &jacobian, &point, config.tolerance) => {
                Some(self.polish(point, f))
            }
            _ => None,
        })
    }

    /// Undamped steps from an accepted root while they still shrink the
    /// residual.
    fn polish(&self, mut point: Vec<f64>, mut f: Vec<f64>) -> Vec<f64> {
        for _ in 0..POLISH_STEPS {
            let jacobian = match self.jacobian_at(&point) {
                Ok(jacobian) => jacobian,
                Err(_) => break,
            };
            let (lhs, rhs) = normal_equations(&jacobian, &f, 0.0);
            let step = match linalg::solve_unique(&lhs, &rhs) {
                Some(step) => step,
                None => break,
            };
            let candidate: Vec<f64> = point.iter().zip(&step).map(|(x, d)| x + d).collect();
            match self.residuals(&candidate) {
                Ok(g) if norm2(&g) < norm2(&f) => {
                    point = candidate;
                    f = g;
                }
                _ => break,
            }
        }
        point
    }

    /// Which unknowns are pinned at `root`. An unknown is free when moving
    /// along a null direction of the Jacobian that involves it keeps every
    /// residual at zero.
    fn determined_at(&self, root: &[f64], config: &SolverConfig) -> Vec<bool> {
        let n = root.len();
        let jacobian = match self.jacobian_at(root) {
            Ok(jacobian) => jacobian,
            Err(_) => return vec![true; n],
        };
        let echelon = linalg::reduce(jacobian, n);
        let step = 1e-3 * (1.0 + norm_inf(root));
        let mut determined = vec![true; n];

        for free in (0..n).filter(|c| !echelon.pivots.contains(c)) {
            let mut direction = vec![0.0; n];
            direction[free] = 1.0;
            for (r, &pivot) in echelon.pivots.iter().enumerate() {
                direction[pivot] = -echelon.rows[r][free];
            }
            let moved: Vec<f64> = root
                .iter()
                .zip(&direction)
                .map(|(x, d)| x + step * d)
                .collect();
            let stays = match (self.residuals(&moved), self.jacobian_at(&moved)) {
                (Ok(f), Ok(jacobian)) => is_root(&f, &jacobian, &moved, 10.0 * config.tolerance),
                _ => false,
            };
            if stays {
                for (j, d) in direction.iter().enumerate() {
                    if d.abs() > echelon.eps {
                        determined[j] = false;
                    }
                }
            }
        }
        determined
    }
}

/// `(JᵀJ + μI) δ = -Jᵀf`
fn normal_equations(jacobian: &[Vec<f64>], f: &[f64], damping: f64) -> (Matrix, Vec<f64>) {
    let n = jacobian.first().map_or(0, |row| row.len());
    let mut lhs = vec![vec![0.0; n]; n];
    let mut rhs = vec![0.0; n];
    for (row, fr) in jacobian.iter().zip(f) {
        for i in 0..n {
            rhs[i] -= row[i] * fr;
            for k in 0..n {
                lhs[i][k] += row[i] * row[k];
            }
        }
    }
    for (i, row) in lhs.iter_mut().enumerate() {
        row[i] += damping;
    }
    (lhs, rhs)
}

/// Every residual is small against the size of its equation's first-order
/// terms `Σ |∂f/∂x_j · x_j|`, so that rounding in large terms is not taken
/// for a miss.
fn is_root(f: &[f64], jacobian: &[Vec<f64>], point: &[f64], tolerance: f64) -> bool {
    f.iter().zip(jacobian).all(|(fi, row)| {
        let scale: f64 = row.iter().zip(point).map(|(d, x)| (d * x).abs()).sum();
        fi.abs() < tolerance * (1.0 + scale)
    })
}

fn same_root(a: &Root, b: &Root, tolerance: f64) -> bool {
    a.iter().zip(b).all(|(x, y)| match (x, y) {
        (Some(x), Some(y)) => (x - y).abs() < tolerance * (1.0 + x.abs()),
        (None, None) => true,
        _ => false,
    })
}

fn norm_inf(v: &[f64]) -> f64 {
    v.iter().map(|x| x.abs()).fold(0.0, f64::max)
}

fn norm2(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}
