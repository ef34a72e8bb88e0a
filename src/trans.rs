//!
//! Transition schedule: which transition matrix the forward step `i` uses
//!
//! * Homogeneous
//!     one `N x N` matrix for every step
//! * TimeVarying
//!     a stack of `nObs-1` matrices, step `i` uses `stack[i-1]`
//! * Periodic
//!     a pool of `K` matrices and a label `tod[i]` per step, step `i` uses `pool[tod[i]]`
//!
//! Stacks are `Array3` whose axis 0 is the matrix index.
//!
use crate::error::{ForwardError, Result};
use ndarray::{ArrayView2, ArrayView3, Axis};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransKind {
    Homogeneous,
    TimeVarying,
    Periodic,
}

impl std::fmt::Display for TransKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TransKind::Homogeneous => write!(f, "homogeneous"),
            TransKind::TimeVarying => write!(f, "time-varying"),
            TransKind::Periodic => write!(f, "periodic"),
        }
    }
}

impl std::str::FromStr for TransKind {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "homogeneous" | "h" => Ok(TransKind::Homogeneous),
            "time-varying" | "g" => Ok(TransKind::TimeVarying),
            "periodic" | "p" => Ok(TransKind::Periodic),
            _ => Err(format!(
                "unknown transition kind `{}` (homogeneous, time-varying or periodic)",
                s
            )),
        }
    }
}

///
/// Borrowed transition structure of one forward evaluation
///
#[derive(Clone, Copy, Debug)]
pub enum Transitions<'a> {
    Homogeneous(ArrayView2<'a, f64>),
    TimeVarying(ArrayView3<'a, f64>),
    Periodic {
        pool: ArrayView3<'a, f64>,
        tod: &'a [usize],
    },
}

impl<'a> Transitions<'a> {
    pub fn kind(&self) -> TransKind {
        match self {
            Transitions::Homogeneous(_) => TransKind::Homogeneous,
            Transitions::TimeVarying(_) => TransKind::TimeVarying,
            Transitions::Periodic { .. } => TransKind::Periodic,
        }
    }
    ///
    /// number of stored matrices (`1`, `nObs-1` or `K`)
    ///
    pub fn n_matrices(&self) -> usize {
        match self {
            Transitions::Homogeneous(_) => 1,
            Transitions::TimeVarying(stack) => stack.len_of(Axis(0)),
            Transitions::Periodic { pool, .. } => pool.len_of(Axis(0)),
        }
    }
    ///
    /// Check that this schedule can drive a forward run over `n_obs` observations
    /// of `n_states` hidden states.
    ///
    /// * every matrix is `n_states x n_states`
    /// * time-varying: exactly `n_obs - 1` matrices
    /// * periodic: `tod.len() == n_obs` and `tod[i] < K` for every `i >= 1`
    ///
    /// `tod[0]` is never used by the recursion and is not range-checked.
    ///
    pub fn validate(&self, n_obs: usize, n_states: usize) -> Result<()> {
        match self {
            Transitions::Homogeneous(gamma) => check_square(gamma.dim(), n_states, "gamma"),
            Transitions::TimeVarying(stack) => {
                let (n_matrices, n_rows, n_cols) = stack.dim();
                if n_matrices + 1 != n_obs {
                    return Err(ForwardError::Shape(format!(
                        "time-varying gamma has {} matrices but {} observations need {}",
                        n_matrices,
                        n_obs,
                        n_obs.saturating_sub(1)
                    )));
                }
                if n_matrices == 0 {
                    Ok(())
                } else {
                    check_square((n_rows, n_cols), n_states, "gamma[i]")
                }
            }
            Transitions::Periodic { pool, tod } => {
                let (n_periods, n_rows, n_cols) = pool.dim();
                if n_periods == 0 {
                    return Err(ForwardError::shape("periodic gamma pool is empty"));
                }
                check_square((n_rows, n_cols), n_states, "gamma[k]")?;
                if tod.len() != n_obs {
                    return Err(ForwardError::Shape(format!(
                        "tod has {} labels but there are {} observations",
                        tod.len(),
                        n_obs
                    )));
                }
                match tod
                    .iter()
                    .enumerate()
                    .skip(1)
                    .find(|(_, &label)| label >= n_periods)
                {
                    Some((step, &label)) => Err(ForwardError::PeriodOutOfRange {
                        step,
                        label,
                        n_periods,
                    }),
                    None => Ok(()),
                }
            }
        }
    }
    ///
    /// Transition matrix `G_i` applied when moving into observation `i` (`i >= 1`).
    ///
    /// Call only after [`Transitions::validate`] succeeded for the sequence;
    /// indexing is bounds-checked by ndarray and panics otherwise.
    ///
    pub fn matrix(&self, i: usize) -> ArrayView2<'a, f64> {
        debug_assert!(i >= 1);
        match *self {
            Transitions::Homogeneous(gamma) => gamma,
            Transitions::TimeVarying(stack) => stack.index_axis_move(Axis(0), i - 1),
            Transitions::Periodic { pool, tod } => pool.index_axis_move(Axis(0), tod[i]),
        }
    }
}

fn check_square(dim: (usize, usize), n_states: usize, name: &str) -> Result<()> {
    if dim != (n_states, n_states) {
        Err(ForwardError::Shape(format!(
            "{} is {}x{} but there are {} states",
            name, dim.0, dim.1, n_states
        )))
    } else {
        Ok(())
    }
}
