//!
//! Mock models for tests, benchmarks and the `generate` command
//!
//! Random models are simulated from a seeded `Xoshiro256PlusPlus`, so the
//! same arguments always produce the same model.
//!
use crate::error::{ForwardError, Result};
use crate::io::{HmmInput, TransInput};
use crate::trans::TransKind;
use ndarray::{array, Array1, Array2, Array3, ArrayView1};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

/// number of observable symbols of the simulated emission distribution
const N_SYMBOLS: usize = 4;

///
/// random probability vector of length `n` (every entry is positive)
///
pub fn random_distribution<R: Rng>(rng: &mut R, n: usize) -> Array1<f64> {
    let v: Array1<f64> = (0..n).map(|_| rng.gen_range(0.05..1.0)).collect();
    let total = v.sum();
    v / total
}

///
/// random `n x n` row-stochastic matrix
///
pub fn random_stochastic<R: Rng>(rng: &mut R, n: usize) -> Array2<f64> {
    let mut m: Array2<f64> = Array2::zeros((n, n));
    for mut row in m.outer_iter_mut() {
        row.assign(&random_distribution(rng, n));
    }
    m
}

///
/// stack of `k` random `n x n` row-stochastic matrices
///
pub fn random_stack<R: Rng>(rng: &mut R, k: usize, n: usize) -> Array3<f64> {
    let mut stack: Array3<f64> = Array3::zeros((k, n, n));
    for mut m in stack.outer_iter_mut() {
        m.assign(&random_stochastic(rng, n));
    }
    stack
}

///
/// draw an index according to (unnormalized) positive weights
///
fn sample_index<R: Rng>(rng: &mut R, weights: ArrayView1<f64>) -> usize {
    let total = weights.sum();
    let mut u = rng.gen::<f64>() * total;
    for (i, &w) in weights.iter().enumerate() {
        if u < w {
            return i;
        }
        u -= w;
    }
    weights.len() - 1
}

///
/// Simulate a random model and an observation sequence from it
///
/// * `delta` and every transition matrix are random with positive entries
/// * periodic labels cycle as `tod[i] = i % n_periods` (e.g. hour of day)
/// * a hidden path is sampled from the chain, each state emits one of
///   `N_SYMBOLS` symbols, and `allprobs[i, j]` is the probability of the
///   emitted symbol under state `j`
///
/// `n_periods` is used only for `TransKind::Periodic`. Zero states,
/// observations or periods give a `ForwardError::Shape`.
///
pub fn random_input(
    n_states: usize,
    n_obs: usize,
    kind: TransKind,
    n_periods: usize,
    seed: u64,
) -> Result<HmmInput> {
    if n_states == 0 || n_obs == 0 {
        return Err(ForwardError::shape(
            "number of states and observations must be positive",
        ));
    }
    if kind == TransKind::Periodic && n_periods == 0 {
        return Err(ForwardError::shape("periodic pool must have at least one matrix"));
    }
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);

    let delta = random_distribution(&mut rng, n_states);
    let gamma = match kind {
        TransKind::Homogeneous => TransInput::Homogeneous(random_stochastic(&mut rng, n_states)),
        TransKind::TimeVarying => {
            TransInput::TimeVarying(random_stack(&mut rng, n_obs - 1, n_states))
        }
        TransKind::Periodic => TransInput::Periodic {
            pool: random_stack(&mut rng, n_periods, n_states),
            tod: (0..n_obs).map(|i| i % n_periods).collect(),
        },
    };
    let mut emissions: Array2<f64> = Array2::zeros((n_states, N_SYMBOLS));
    for mut row in emissions.outer_iter_mut() {
        row.assign(&random_distribution(&mut rng, N_SYMBOLS));
    }

    let trans = gamma.view();
    let mut allprobs: Array2<f64> = Array2::zeros((n_obs, n_states));
    let mut state = sample_index(&mut rng, delta.view());
    for i in 0..n_obs {
        if i > 0 {
            state = sample_index(&mut rng, trans.matrix(i).row(state));
        }
        let symbol = sample_index(&mut rng, emissions.row(state));
        allprobs.row_mut(i).assign(&emissions.column(symbol));
    }

    Ok(HmmInput {
        allprobs,
        delta,
        gamma,
    })
}

///
/// 2 states and 3 observations
///
/// ```text
/// delta    = [0.5, 0.5]
/// allprobs = [[0.6, 0.4], [0.5, 0.5], [0.3, 0.7]]
/// gamma    = [[0.9, 0.1], [0.2, 0.8]]
/// ```
///
/// Its log-likelihood is `log(0.5 * 0.5 * 0.4464)`.
///
pub fn mock_two_state() -> HmmInput {
    HmmInput {
        allprobs: array![[0.6, 0.4], [0.5, 0.5], [0.3, 0.7]],
        delta: array![0.5, 0.5],
        gamma: TransInput::Homogeneous(array![[0.9, 0.1], [0.2, 0.8]]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Axis;

    #[test]
    fn random_stochastic_rows_sum_to_one() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let m = random_stochastic(&mut rng, 5);
        for row in m.outer_iter() {
            assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-12);
            assert!(row.iter().all(|&x| x > 0.0));
        }
    }
    #[test]
    fn random_input_is_deterministic_and_valid() {
        for kind in [
            TransKind::Homogeneous,
            TransKind::TimeVarying,
            TransKind::Periodic,
        ] {
            let a = random_input(3, 50, kind, 24, 11).unwrap();
            let b = random_input(3, 50, kind, 24, 11).unwrap();
            assert_eq!(a, b);
            assert_eq!(a.gamma.kind(), kind);
            assert_eq!(a.allprobs.dim(), (50, 3));
            assert!(a.transitions().validate(50, 3).is_ok());
            assert!(a.log_likelihood().unwrap().is_finite());
        }
        let c = random_input(3, 50, TransKind::Homogeneous, 24, 12).unwrap();
        assert_ne!(c, random_input(3, 50, TransKind::Homogeneous, 24, 11).unwrap());
    }
    #[test]
    fn periodic_labels_cycle() {
        let input = random_input(2, 30, TransKind::Periodic, 24, 0).unwrap();
        match input.gamma {
            TransInput::Periodic { pool, tod } => {
                assert_eq!(pool.len_of(Axis(0)), 24);
                assert_eq!(tod[0], 0);
                assert_eq!(tod[23], 23);
                assert_eq!(tod[24], 0);
                assert_eq!(tod[29], 5);
            }
            _ => panic!("not periodic"),
        }
    }
    #[test]
    fn random_input_rejects_empty_models() {
        for (n_states, n_obs, kind, n_periods) in [
            (0, 10, TransKind::Homogeneous, 1),
            (2, 0, TransKind::Homogeneous, 1),
            (2, 0, TransKind::TimeVarying, 1),
            (2, 10, TransKind::Periodic, 0),
        ] {
            let r = random_input(n_states, n_obs, kind, n_periods, 0);
            assert!(matches!(r, Err(ForwardError::Shape(_))));
        }
        // the pool size is ignored unless periodic
        assert!(random_input(2, 10, TransKind::Homogeneous, 0, 0).is_ok());
    }
    #[test]
    fn sample_index_follows_weights() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let w = array![0.0, 1.0, 0.0];
        for _ in 0..100 {
            assert_eq!(sample_index(&mut rng, w.view()), 1);
        }
    }
}
