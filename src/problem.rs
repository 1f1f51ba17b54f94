use super::{
    config::SolverConfig,
    decision::{self, DecisionReport},
    error::DecisionError,
};
use serde::{Deserialize, Serialize};
use std::fs;

/// The raw inputs of one decision problem, as a form or a file supplies them.
#[derive(Clone, Deserialize, Serialize, PartialEq, Debug)]
pub struct Problem {
    pub decision: String,
    pub objective: String,
    pub rival: String,
    pub values: Vec<f64>,
    pub probabilities: Vec<f64>,
    #[serde(default)]
    pub constraints: Vec<String>,
}

impl Problem {
    pub fn compute(&self, config: &SolverConfig) -> Result<DecisionReport, DecisionError> {
        decision::compute_decision(
            &self.decision,
            &self.objective,
            &self.rival,
            &self.values,
            &self.probabilities,
            &self.constraints,
            config,
        )
    }
}

/// Numbers from comma-separated text such as `"0, 10"`.
pub fn parse_list(text: &str) -> Result<Vec<f64>, DecisionError> {
    text.split(',')
        .map(str::trim)
        .map(|item| {
            item.parse::<f64>()
                .map_err(|_| DecisionError::InvalidInput(String::from(item)))
        })
        .collect()
}

pub fn from_json(json: &str) -> Result<Problem, DecisionError> {
    Ok(serde_json::from_str(json)?)
}

pub fn from_file(path: &str) -> Result<Problem, DecisionError> {
    from_json(&fs::read_to_string(path)?)
}

/// A bundled problem by name, or a JSON file if `name` is none of them.
pub fn from_name(name: &str) -> Result<Problem, DecisionError> {
    match name {
        "shared_resource" => from_json(include_str!("../resources/problem/shared_resource.json")),
        "quadratic_cost" => from_json(include_str!("../resources/problem/quadratic_cost.json")),
        "square_root" => from_json(include_str!("../resources/problem/square_root.json")),
        path => from_file(path),
    }
}
