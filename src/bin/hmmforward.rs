use clap::{Parser, Subcommand};
use hmmforward::{cli, trans::TransKind};
use log::error;

#[derive(Parser, Debug)]
#[clap(author, about, version = env!("GIT_HASH"))]
struct Opts {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Log-likelihood of a model file by the scaled forward algorithm
    Loglik {
        /// Model json (gzipped if the name ends with .gz)
        input: std::path::PathBuf,
        /// Refuse to evaluate when delta or a transition row is not a distribution
        #[clap(long)]
        strict: bool,
        /// Tolerance of `|sum - 1|` in the input checks
        #[clap(long, default_value_t = 1e-6)]
        tol: f64,
        /// Print the log scaling factor of every step
        #[clap(long)]
        trace: bool,
    },
    /// List shape errors and non-stochastic inputs of a model file
    Check {
        /// Model json (gzipped if the name ends with .gz)
        input: std::path::PathBuf,
        /// Tolerance of `|sum - 1|`
        #[clap(long, default_value_t = 1e-6)]
        tol: f64,
    },
    /// Simulate a random model file
    Generate {
        /// Number of hidden states
        #[clap(short = 'n')]
        n_states: usize,
        /// Length of the observation sequence
        #[clap(short = 'T')]
        n_obs: usize,
        /// Transition structure: homogeneous, time-varying or periodic
        #[clap(long, default_value = "homogeneous")]
        kind: TransKind,
        /// Number of matrices in the periodic pool (e.g. 24 for hour of day)
        #[clap(short = 'K', default_value_t = 24)]
        n_periods: usize,
        /// Seed of the random generator
        #[clap(short = 's', default_value_t = 0)]
        seed: u64,
        /// Output filename; stdout if not specified
        #[clap(short, long)]
        output: Option<std::path::PathBuf>,
    },
}

fn main() {
    env_logger::init();
    let opts: Opts = Opts::parse();
    eprintln!("# started_at={}", chrono::Local::now());
    eprintln!("# git_hash={}", env!("GIT_HASH"));
    eprintln!("# opts={:?}", opts);

    let result = match &opts.command {
        Commands::Loglik {
            input,
            strict,
            tol,
            trace,
        } => cli::loglik(input, *strict, *tol, *trace).map(|_| 0),
        Commands::Check { input, tol } => {
            cli::check(input, *tol).map(|n_violations| if n_violations > 0 { 1 } else { 0 })
        }
        Commands::Generate {
            n_states,
            n_obs,
            kind,
            n_periods,
            seed,
            output,
        } => cli::generate(
            *n_states,
            *n_obs,
            *kind,
            *n_periods,
            *seed,
            output.as_deref(),
        )
        .map(|_| 0),
    };

    eprintln!("# finished_at={}", chrono::Local::now());
    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
    }
}
