//! Optimal decisions against a rival known only through a discrete
//! distribution, by the Lagrangian method under equality constraints.
//! # Example
//! ```
//! use lagrange_decision::*;
//! let problem = problem::from_name("shared_resource").unwrap();
//!
//! let report = problem.compute(&config::SolverConfig::default()).unwrap();
//! assert_eq!(report.stationarity_equation.to_string(), "-10 - λ1");
//! assert!(report.solutions.iter().all(|s| s.verified));
//! ```
#[macro_use]
extern crate log;

pub mod error;
pub mod expression;
pub mod parser;
pub mod symbol;

pub mod expectation;
pub mod lagrangian;
pub mod scenario;

pub mod linalg;
pub mod solver;
pub mod verifier;

pub mod config;
pub mod decision;
pub mod problem;
pub mod visualizer;
