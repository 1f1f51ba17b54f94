use serde::{Deserialize, Serialize};
use std::fmt;

/// A named variable. Two symbols are the same symbol iff their names match.
#[derive(Clone, Deserialize, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(name: &str) -> Self {
        Symbol(String::from(name))
    }

    /// Multiplier for the `i`-th constraint, counted from zero.
    pub fn multiplier(i: usize) -> Self {
        Symbol(format!("λ{}", i + 1))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Symbol::new(name)
    }
}
