//!
//! Bodies of the `hmmforward` subcommands
//!
//! Results are printed to stdout as tab-separated lines, diagnostics go to the log.
//!
use crate::check::check_inputs;
use crate::error::{ForwardError, Result};
use crate::forward::check_shapes;
use crate::io::HmmInput;
use crate::mocks::random_input;
use crate::trans::TransKind;
use log::{info, warn};
use std::path::Path;

///
/// Evaluate the log-likelihood of the model file at `input`.
///
/// Input violations are logged; with `strict` they abort the evaluation.
/// With `trace` the log scaling factor of every step is printed before the total.
///
pub fn loglik(input: &Path, strict: bool, tol: f64, trace: bool) -> Result<f64> {
    let model = HmmInput::from_json_file(input)?;
    info!(
        "loaded {} model n_obs={} n_states={} from {}",
        model.gamma.kind(),
        model.n_obs(),
        model.n_states(),
        input.display()
    );

    let violations = check_inputs(&model, tol);
    for v in violations.iter() {
        warn!("{}", v);
    }
    if strict && !violations.is_empty() {
        return Err(ForwardError::Violations(violations.len()));
    }

    let l = if trace {
        let t = model.trace()?;
        for (i, c) in t.log_scales().iter().enumerate() {
            println!("{}\t{}", i, c);
        }
        if let Some(i) = t.first_degenerate_step() {
            warn!("no probability mass left at step {}", i);
        }
        t.log_likelihood()
    } else {
        model.log_likelihood()?
    };
    if !l.is_finite() {
        warn!("log-likelihood is not finite: {}", l);
    }
    println!("#loglik\t{}", l);
    Ok(l)
}

///
/// Print every input violation of the model file; returns the number found.
///
pub fn check(input: &Path, tol: f64) -> Result<usize> {
    let model = HmmInput::from_json_file(input)?;
    check_shapes(
        model.allprobs.view(),
        model.delta.view(),
        &model.transitions(),
    )?;
    let violations = check_inputs(&model, tol);
    for v in violations.iter() {
        println!("{}", v);
    }
    info!("{} violations in {}", violations.len(), input.display());
    Ok(violations.len())
}

///
/// Simulate a random model and write it as json to `output` (or stdout).
///
pub fn generate(
    n_states: usize,
    n_obs: usize,
    kind: TransKind,
    n_periods: usize,
    seed: u64,
    output: Option<&Path>,
) -> Result<()> {
    let model = random_input(n_states, n_obs, kind, n_periods, seed)?;
    match output {
        Some(path) => {
            model.to_json_file(path)?;
            info!("wrote {} model to {}", kind, path.display());
        }
        None => {
            println!("{}", model.to_json_string()?);
        }
    }
    Ok(())
}
