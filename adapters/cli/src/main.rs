#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that forecasts a two-round mayoral election.

mod report;
mod scenario;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use runoff_sim_core::ElectionParameters;
use runoff_sim_system_monte_carlo::MonteCarloElection;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{report::Report, scenario::Scenario};

const LOG_TARGET: &str = "runoff-sim";

/// Monte Carlo simulation of a two-round mayoral election.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Opts {
    /// TOML scenario with the dataset, base preferences and parameters.
    /// Defaults to the 2019 Ascoli Piceno election.
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Number of Monte Carlo trials.
    #[arg(long)]
    draws: Option<u64>,

    /// Dirichlet concentration (higher means less first-round volatility).
    #[arg(long)]
    concentration: Option<f64>,

    /// Standard deviation of the sampled first-round abstention.
    #[arg(long)]
    abstention_volatility: Option<f64>,

    /// Weight in [0, 1] pulling runoff transitions toward the historical runoff.
    #[arg(long)]
    runoff_elasticity: Option<f64>,

    /// Effective sample size of the runoff Beta noise. 0 makes the runoff deterministic.
    #[arg(long)]
    runoff_strength: Option<f64>,

    /// Seed for reproducible runs. A random seed is drawn and logged otherwise.
    #[arg(long, env = "NP_RANDOM_SEED")]
    seed: Option<u64>,

    /// Number of worker threads. Defaults to one per logical CPU.
    #[arg(long)]
    threads: Option<usize>,

    /// Logging filter, e.g. `debug` or `runoff-sim::markov=debug`.
    #[arg(long, short, default_value = "info")]
    log: String,
}

impl Opts {
    fn apply_overrides(&self, params: ElectionParameters) -> ElectionParameters {
        ElectionParameters {
            draws: self.draws.unwrap_or(params.draws),
            concentration: self.concentration.unwrap_or(params.concentration),
            abstention_volatility: self
                .abstention_volatility
                .unwrap_or(params.abstention_volatility),
            runoff_elasticity: self.runoff_elasticity.unwrap_or(params.runoff_elasticity),
            runoff_strength: self.runoff_strength.unwrap_or(params.runoff_strength),
        }
    }
}

fn main() -> Result<()> {
    let opts = Opts::parse();
    let filter = EnvFilter::from_default_env()
        .add_directive(opts.log.parse().context("invalid --log directive")?);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = opts.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure the worker pool")?;
    }

    let scenario = match &opts.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::ascoli_piceno_2019(),
    };
    let params = opts.apply_overrides(scenario.parameters.clone());
    let seed = opts.seed.unwrap_or_else(rand::random);
    info!(target: LOG_TARGET, seed, "seed selected");

    let model = MonteCarloElection::new(&scenario.dataset, &scenario.base_preferences, params)
        .context("failed to build the election model")?;
    let rates = model.simulate(seed);

    print!("{}", Report::new(model.parameters(), seed, &rates));
    Ok(())
}
