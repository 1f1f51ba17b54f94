use super::error::DecisionError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

/// Tuning knobs of the solver and verifier. Every field has a default, so a
/// config file only needs the fields it changes.
#[derive(Clone, Deserialize, Serialize, PartialEq, Debug)]
#[serde(default)]
pub struct SolverConfig {
    /// Starting values of the nonlinear search. Every pairing of a decision
    /// seed with a multiplier seed is tried.
    pub seeds: Vec<f64>,
    /// Iteration cap per starting point.
    pub max_iterations: usize,
    /// A point is a root when every residual is below this, relative to the
    /// size of its equation's terms at that point.
    pub tolerance: f64,
    /// Roots closer than this are the same root.
    pub root_tolerance: f64,
    /// A constraint is satisfied when `|residual| < verification_tolerance`.
    pub verification_tolerance: f64,
    pub timeout_ms: Option<u64>,
    pub parallel: bool,
    pub progress: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            seeds: vec![
                0.0, 1.0, -1.0, 0.5, -0.5, 10.0, -10.0, 100.0, -100.0, 1000.0, -1000.0,
            ],
            max_iterations: 100,
            tolerance: 1e-10,
            root_tolerance: 1e-6,
            verification_tolerance: 1e-6,
            timeout_ms: None,
            parallel: true,
            progress: false,
        }
    }
}

impl SolverConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

pub fn from_json(json: &str) -> Result<SolverConfig, DecisionError> {
    Ok(serde_json::from_str(json)?)
}

pub fn from_file(path: &str) -> Result<SolverConfig, DecisionError> {
    from_json(&fs::read_to_string(path)?)
}
