//!
//! globally-available parts
//!
pub use crate::error::{ForwardError, Result};
pub use crate::forward::{
    forward, forward_homogeneous, forward_periodic, forward_time_varying, forward_trace,
    ForwardTrace,
};
pub use crate::io::{HmmInput, TransInput};
pub use crate::prob::Prob;
pub use crate::trans::{TransKind, Transitions};
