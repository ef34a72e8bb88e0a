//!
//! Log-likelihood of an observation sequence under a discrete-state HMM,
//! by the scaled forward algorithm.
//!
//! ```
//! use hmmforward::forward::forward_homogeneous;
//! use ndarray::array;
//!
//! let allprobs = array![[0.6, 0.4], [0.5, 0.5], [0.3, 0.7]];
//! let delta = array![0.5, 0.5];
//! let gamma = array![[0.9, 0.1], [0.2, 0.8]];
//! let l = forward_homogeneous(allprobs.view(), delta.view(), gamma.view()).unwrap();
//! assert!((l - (0.25f64 * 0.4464).ln()).abs() < 1e-9);
//! ```
//!
pub mod check;
pub mod cli;
pub mod error;
pub mod forward;
pub mod io;
pub mod mocks;
pub mod prelude;
pub mod prob;
pub mod trans;
