//!
//! Scaled forward algorithm
//!
//! Computes the log-likelihood `log P(x[0], ..., x[n-1])` of one observation
//! sequence under a discrete-state HMM.
//!
//! ```text
//! foo_0 = delta ⊙ allprobs[0]
//! foo_i = (phi_{i-1} · G_i) ⊙ allprobs[i]       (i = 1, ..., n-1)
//! c_i   = Σ_j foo_i[j]
//! phi_i = foo_i / c_i
//! log P = Σ_i log c_i
//! ```
//!
//! `phi_i` is kept normalized at every step so the forward values never
//! underflow; the magnitude is carried by the scaling factors `c_i`.
//! The three variants differ only in how `G_i` is chosen, see [`Transitions`].
//!
use crate::error::{ForwardError, Result};
use crate::prob::Prob;
use crate::trans::Transitions;
use derive_new::new;
use log::debug;
use ndarray::{Array1, ArrayView1, ArrayView2, ArrayView3};

#[cfg(test)]
mod tests;

///
/// Log-likelihood under a single time-homogeneous transition matrix `gamma` (`N x N`).
///
pub fn forward_homogeneous(
    allprobs: ArrayView2<f64>,
    delta: ArrayView1<f64>,
    gamma: ArrayView2<f64>,
) -> Result<f64> {
    forward(allprobs, delta, &Transitions::Homogeneous(gamma)).map(Prob::to_log_value)
}

///
/// Log-likelihood under per-step transition matrices.
///
/// `gammas` is `(nObs-1) x N x N`; `gammas[i-1]` governs the move into observation `i`.
///
pub fn forward_time_varying(
    allprobs: ArrayView2<f64>,
    delta: ArrayView1<f64>,
    gammas: ArrayView3<f64>,
) -> Result<f64> {
    forward(allprobs, delta, &Transitions::TimeVarying(gammas)).map(Prob::to_log_value)
}

///
/// Log-likelihood under a pool of `K` transition matrices (`K x N x N`)
/// selected by a per-observation period label `tod` (e.g. hour of day).
///
/// The move into observation `i` uses `gammas[tod[i]]`.
///
/// ```
/// use hmmforward::forward::{forward_homogeneous, forward_periodic};
/// use ndarray::{array, Axis};
///
/// let allprobs = array![[0.6, 0.4], [0.5, 0.5], [0.3, 0.7]];
/// let delta = array![0.5, 0.5];
/// let gamma = array![[0.9, 0.1], [0.2, 0.8]];
/// let pool = gamma.clone().insert_axis(Axis(0));
/// let l = forward_periodic(allprobs.view(), delta.view(), pool.view(), &[0, 0, 0]).unwrap();
/// assert_eq!(l, forward_homogeneous(allprobs.view(), delta.view(), gamma.view()).unwrap());
/// ```
///
pub fn forward_periodic<'a>(
    allprobs: ArrayView2<f64>,
    delta: ArrayView1<f64>,
    gammas: ArrayView3<'a, f64>,
    tod: &'a [usize],
) -> Result<f64> {
    let trans = Transitions::Periodic { pool: gammas, tod };
    forward(allprobs, delta, &trans).map(Prob::to_log_value)
}

///
/// Run the scaled forward algorithm and return the likelihood as [`Prob`].
///
/// All shapes are checked before the recursion starts. A step whose total mass
/// is zero makes the likelihood zero (`log p = -inf`) and ends the recursion.
///
pub fn forward(
    allprobs: ArrayView2<f64>,
    delta: ArrayView1<f64>,
    trans: &Transitions,
) -> Result<Prob> {
    check_shapes(allprobs, delta, trans)?;
    let (p, _) = run(allprobs, delta, trans, |_, _| {});
    Ok(p)
}

///
/// Same recursion as [`forward`], keeping the scaling factor of every step
/// and the last normalized forward vector.
///
pub fn forward_trace(
    allprobs: ArrayView2<f64>,
    delta: ArrayView1<f64>,
    trans: &Transitions,
) -> Result<ForwardTrace> {
    check_shapes(allprobs, delta, trans)?;
    let mut scales = Vec::with_capacity(allprobs.nrows());
    let (_, phi) = run(allprobs, delta, trans, |_, c| scales.push(c));
    Ok(ForwardTrace::new(scales, phi))
}

///
/// Per-step record of a forward run
///
/// * `scales`
///     scaling factor `c_i` of each computed step. Shorter than the sequence
///     when the recursion stopped at a zero-mass step.
/// * `phi`
///     normalized forward vector of the last computed step,
///     `phi[j] = P(state j | x[0..=i])`
///
#[derive(Debug, Clone, new)]
pub struct ForwardTrace {
    scales: Vec<Prob>,
    phi: Array1<f64>,
}

impl ForwardTrace {
    pub fn likelihood(&self) -> Prob {
        self.scales.iter().product()
    }
    pub fn log_likelihood(&self) -> f64 {
        self.likelihood().to_log_value()
    }
    pub fn scales(&self) -> &[Prob] {
        &self.scales
    }
    pub fn log_scales(&self) -> Vec<f64> {
        self.scales.iter().map(|c| c.to_log_value()).collect()
    }
    pub fn phi(&self) -> ArrayView1<f64> {
        self.phi.view()
    }
    ///
    /// index of the first step whose scaling factor is zero or not finite
    ///
    pub fn first_degenerate_step(&self) -> Option<usize> {
        self.scales.iter().position(|c| !c.is_positive_finite())
    }
}

///
/// Check every shape constraint of one forward run without running it.
///
pub fn check_shapes(
    allprobs: ArrayView2<f64>,
    delta: ArrayView1<f64>,
    trans: &Transitions,
) -> Result<()> {
    let (n_obs, n_states) = allprobs.dim();
    if n_obs == 0 {
        return Err(ForwardError::shape("allprobs has no observations"));
    }
    if n_states == 0 {
        return Err(ForwardError::shape("allprobs has no states"));
    }
    if delta.len() != n_states {
        return Err(ForwardError::Shape(format!(
            "delta has length {} but allprobs has {} states",
            delta.len(),
            n_states
        )));
    }
    trans.validate(n_obs, n_states)
}

///
/// The recursion itself. Shapes must already be checked.
///
/// `on_step(i, c_i)` is called with the scaling factor of every computed step.
/// Returns the likelihood and the last normalized forward vector.
///
fn run<F>(
    allprobs: ArrayView2<f64>,
    delta: ArrayView1<f64>,
    trans: &Transitions,
    mut on_step: F,
) -> (Prob, Array1<f64>)
where
    F: FnMut(usize, Prob),
{
    let (n_obs, n_states) = allprobs.dim();
    debug!(
        "forward {} n_obs={} n_states={} n_matrices={}",
        trans.kind(),
        n_obs,
        n_states,
        trans.n_matrices()
    );

    let mut l = Prob::one();
    let mut phi: Array1<f64> = Array1::zeros(n_states);
    for i in 0..n_obs {
        let foo = if i == 0 {
            &delta * &allprobs.row(0)
        } else {
            phi.dot(&trans.matrix(i)) * &allprobs.row(i)
        };
        let sumfoo = foo.sum();
        let c = Prob::from_prob(sumfoo);
        on_step(i, c);
        l *= c;
        phi = foo / sumfoo;
        if c.is_zero() {
            debug!("forward zero mass at step {}", i);
            return (Prob::zero(), phi);
        }
    }
    (l, phi)
}
