//!
//! Opt-in checks of model inputs
//!
//! The forward recursion never enforces that `delta` sums to one or that
//! transition rows are stochastic; a violation gives a well-defined but
//! meaningless likelihood. These functions report such violations.
//!
use crate::io::{HmmInput, TransInput};
use ndarray::{ArrayView1, ArrayView2, ArrayView3};

#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    /// entry is negative, NaN or infinite
    InvalidEntry { name: String, value: f64 },
    /// probability vector does not sum to one
    NotNormalized { name: String, sum: f64 },
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Violation::InvalidEntry { name, value } => {
                write!(f, "{} = {} is not a finite non-negative value", name, value)
            }
            Violation::NotNormalized { name, sum } => {
                write!(f, "{} sums to {} instead of 1", name, sum)
            }
        }
    }
}

///
/// `v` is a probability vector: finite, non-negative, `|sum - 1| <= tol`
///
pub fn check_distribution(name: &str, v: ArrayView1<f64>, tol: f64) -> Vec<Violation> {
    let mut violations = check_entries(name, v);
    let sum = v.sum();
    if violations.is_empty() && (sum - 1.0).abs() > tol {
        violations.push(Violation::NotNormalized {
            name: name.to_string(),
            sum,
        });
    }
    violations
}

///
/// every row of `m` is a probability vector
///
pub fn check_stochastic(name: &str, m: ArrayView2<f64>, tol: f64) -> Vec<Violation> {
    m.outer_iter()
        .enumerate()
        .flat_map(|(i, row)| check_distribution(&format!("{}[{}]", name, i), row, tol))
        .collect()
}

///
/// every entry of `allprobs` is finite and non-negative
///
pub fn check_emissions(allprobs: ArrayView2<f64>) -> Vec<Violation> {
    allprobs
        .indexed_iter()
        .filter(|(_, &x)| !is_valid_entry(x))
        .map(|((t, j), &value)| Violation::InvalidEntry {
            name: format!("allprobs[{}][{}]", t, j),
            value,
        })
        .collect()
}

///
/// All violations of a loaded model, in the order `allprobs`, `delta`, `gamma`.
///
pub fn check_inputs(input: &HmmInput, tol: f64) -> Vec<Violation> {
    let mut violations = check_emissions(input.allprobs.view());
    violations.extend(check_distribution("delta", input.delta.view(), tol));
    match &input.gamma {
        TransInput::Homogeneous(gamma) => {
            violations.extend(check_stochastic("gamma", gamma.view(), tol));
        }
        TransInput::TimeVarying(stack) => {
            violations.extend(check_stack("gamma", stack.view(), tol));
        }
        TransInput::Periodic { pool, .. } => {
            violations.extend(check_stack("gamma.pool", pool.view(), tol));
        }
    }
    violations
}

fn check_stack(name: &str, stack: ArrayView3<f64>, tol: f64) -> Vec<Violation> {
    stack
        .outer_iter()
        .enumerate()
        .flat_map(|(k, m)| check_stochastic(&format!("{}[{}]", name, k), m, tol))
        .collect()
}

fn check_entries(name: &str, v: ArrayView1<f64>) -> Vec<Violation> {
    v.iter()
        .enumerate()
        .filter(|(_, &x)| !is_valid_entry(x))
        .map(|(i, &value)| Violation::InvalidEntry {
            name: format!("{}[{}]", name, i),
            value,
        })
        .collect()
}

fn is_valid_entry(x: f64) -> bool {
    x.is_finite() && x >= 0.0
}
