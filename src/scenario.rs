use super::error::{DecisionError, ProbabilityError, ScenarioMismatchError};
use serde::Serialize;

/// Allowed distance of the probability sum from one.
pub const PROBABILITY_TOLERANCE: f64 = 1e-9;

/// Discrete distribution over the rival's action.
///
/// Scenario order is kept as given. A value of this type is always valid:
/// equal counts, finite values, non-negative probabilities summing to one.
#[derive(Clone, Serialize, PartialEq, Debug)]
pub struct ScenarioDistribution {
    values: Vec<f64>,
    probabilities: Vec<f64>,
}

impl ScenarioDistribution {
    pub fn new(values: Vec<f64>, probabilities: Vec<f64>) -> Result<Self, DecisionError> {
        check_counts(&values, &probabilities)?;
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(ProbabilityError::NonFiniteValue { index }.into());
        }
        if let Some((index, value)) = probabilities
            .iter()
            .enumerate()
            .find(|(_, p)| !p.is_finite() || **p < 0.0)
        {
            return Err(ProbabilityError::Invalid {
                index,
                value: *value,
            }
            .into());
        }
        let sum: f64 = probabilities.iter().sum();
        if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(ProbabilityError::Sum { sum }.into());
        }
        Ok(ScenarioDistribution {
            values,
            probabilities,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    /// (rival value, probability) pairs in scenario order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.values
            .iter()
            .cloned()
            .zip(self.probabilities.iter().cloned())
    }
}

pub fn check_counts(values: &[f64], probabilities: &[f64]) -> Result<(), ScenarioMismatchError> {
    if values.len() != probabilities.len() {
        return Err(ScenarioMismatchError {
            values: values.len(),
            probabilities: probabilities.len(),
        });
    }
    Ok(())
}
