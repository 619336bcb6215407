#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Monte Carlo estimator of two-round mayoral election outcomes.
//!
//! Each trial samples first-round shares from a Dirichlet centred on the
//! historical result, samples the abstention rate, and either elects a
//! majority winner outright or resolves a runoff between the two leaders. The
//! runoff projects the sampled first round through the calibrated
//! [`TransitionMatrix`] and perturbs the resulting split with Beta noise.
//!
//! Trials run in fixed-size blocks on the rayon pool. Every block draws from
//! its own ChaCha8 stream derived from the run seed, so a seed reproduces the
//! same [`WinRates`] regardless of how many worker threads execute it.

mod trial;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Beta, Distribution as _, Gamma, Normal};
use rayon::prelude::*;
use runoff_sim_core::{
    BasePreferences, CandidateResult, ElectionDataset, ElectionParameters, ModelError, WinRates,
    ABSTENTION_LABEL,
};
use runoff_sim_system_markov::{
    calibrate_runoff_transition, normalize, Distribution, TransitionMatrix,
};
use tracing::{debug, info};

pub use trial::{RunoffOutcome, TrialOutcome};

/// Target used for every tracing event emitted by this crate.
pub const LOG_TARGET: &str = "runoff-sim::monte-carlo";

/// Number of consecutive trials drawn from one random stream.
pub const TRIALS_PER_STREAM: u64 = 1_024;

const MAJORITY_THRESHOLD: f64 = 0.5;
const ABSTENTION_CEILING: f64 = 0.9;
const GAMMA_SHAPE_FLOOR: f64 = 1e-9;
const BETA_SHAPE_FLOOR: f64 = 1e-6;

/// Runs a full simulation of `dataset` and returns each candidate's win frequency.
///
/// This is the single entry point adapters need: it validates the inputs,
/// calibrates the transition matrix, and runs `params.draws` trials seeded by
/// `seed`.
pub fn simulate_election(
    dataset: &ElectionDataset,
    preferences: &BasePreferences,
    params: ElectionParameters,
    seed: u64,
) -> Result<WinRates, ModelError> {
    Ok(MonteCarloElection::new(dataset, preferences, params)?.simulate(seed))
}

/// Calibrated election model shared read-only by every trial.
#[derive(Debug)]
pub struct MonteCarloElection {
    candidates: Vec<CandidateResult>,
    names: Vec<String>,
    params: ElectionParameters,
    first_round_baseline: Vec<f64>,
    runoff_target: Distribution,
    transition: TransitionMatrix,
    share_samplers: Vec<Gamma<f64>>,
    abstention_sampler: Normal<f64>,
}

impl MonteCarloElection {
    /// Validates the inputs and calibrates the model.
    pub fn new(
        dataset: &ElectionDataset,
        preferences: &BasePreferences,
        params: ElectionParameters,
    ) -> Result<Self, ModelError> {
        params.validate()?;
        dataset.validate()?;

        let candidates = dataset.candidates().to_vec();
        let names: Vec<String> = candidates
            .iter()
            .map(|candidate| candidate.name().to_owned())
            .collect();

        let first_round = normalize(
            &candidates
                .iter()
                .map(|candidate| (candidate.name(), candidate.first_round_share()))
                .collect::<Distribution>(),
        )?;
        let first_round_baseline: Vec<f64> = names
            .iter()
            .map(|name| first_round.get(name).unwrap_or(0.0))
            .collect();

        let mut runoff_masses: Distribution = candidates
            .iter()
            .map(|candidate| (candidate.name(), candidate.runoff_share().unwrap_or(0.0)))
            .collect();
        runoff_masses.set(ABSTENTION_LABEL, dataset.abstention_runoff());
        let runoff_target = normalize(&runoff_masses)?;

        let transition = calibrate_runoff_transition(
            &names,
            &runoff_target,
            ABSTENTION_LABEL,
            preferences,
            params.runoff_elasticity,
        )?;

        let share_samplers = first_round_baseline
            .iter()
            .map(|share| {
                let shape = (share * params.concentration).max(GAMMA_SHAPE_FLOOR);
                Gamma::new(shape, 1.0).map_err(|error| ModelError::InvalidParameters {
                    reason: format!("first-round gamma shape {shape}: {error}"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let abstention_sampler = Normal::new(
            dataset.abstention_first_round(),
            params.abstention_volatility,
        )
        .map_err(|error| ModelError::InvalidParameters {
            reason: format!("abstention normal: {error}"),
        })?;

        debug!(
            target: LOG_TARGET,
            candidates = names.len(),
            concentration = params.concentration,
            runoff_strength = params.runoff_strength,
            "election model calibrated"
        );

        Ok(Self {
            candidates,
            names,
            params,
            first_round_baseline,
            runoff_target,
            transition,
            share_samplers,
            abstention_sampler,
        })
    }

    /// Candidates in ballot order.
    #[must_use]
    pub fn candidates(&self) -> &[CandidateResult] {
        &self.candidates
    }

    /// Parameters the model was built with.
    #[must_use]
    pub fn parameters(&self) -> &ElectionParameters {
        &self.params
    }

    /// Normalised historical first-round shares, in ballot order.
    #[must_use]
    pub fn first_round_baseline(&self) -> &[f64] {
        &self.first_round_baseline
    }

    /// Normalised historical runoff outcome over candidates and abstention.
    #[must_use]
    pub fn runoff_target(&self) -> &Distribution {
        &self.runoff_target
    }

    /// Calibrated first-round to runoff transition matrix.
    #[must_use]
    pub fn transition(&self) -> &TransitionMatrix {
        &self.transition
    }

    /// Runs `draws` trials in parallel and returns each candidate's win frequency.
    ///
    /// Trials are grouped in blocks of [`TRIALS_PER_STREAM`]; block `k` uses
    /// stream `k` of a ChaCha8 generator seeded with `seed`. Per-block tallies
    /// are summed once every block completes.
    #[must_use]
    pub fn simulate(&self, seed: u64) -> WinRates {
        let draws = self.params.draws;
        let streams = stream_count(draws);
        info!(target: LOG_TARGET, draws, streams, seed, "running simulation");

        let tally = (0..streams)
            .into_par_iter()
            .map(|stream| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                rng.set_stream(stream);
                let start = stream * TRIALS_PER_STREAM;
                let end = (start + TRIALS_PER_STREAM).min(draws);
                self.tally_trials(end - start, &mut rng)
            })
            .reduce(|| vec![0; self.names.len()], merge_tallies);

        self.finish(&tally)
    }

    /// Runs `draws` trials sequentially on a caller-supplied generator.
    pub fn simulate_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> WinRates {
        info!(
            target: LOG_TARGET,
            draws = self.params.draws,
            "running sequential simulation"
        );
        let tally = self.tally_trials(self.params.draws, rng);
        self.finish(&tally)
    }

    /// Samples one election and returns its winner.
    ///
    /// `Start -> FirstRoundSampled -> Decided` for a majority, or
    /// `Start -> FirstRoundSampled -> RunoffComputed -> Decided` otherwise.
    pub fn run_trial<R: Rng + ?Sized>(&self, rng: &mut R) -> TrialOutcome {
        let shares = self.sample_first_round(rng);
        let abstention = self.sample_abstention(rng);
        self.decide(&shares, abstention, rng)
    }

    /// Decides an election given first-round shares (ballot order) and an abstention rate.
    ///
    /// `rng` is only consulted for runoff noise, so with a runoff strength of
    /// zero the outcome is a pure function of the inputs.
    ///
    /// # Panics
    ///
    /// Panics when `shares` does not hold one entry per candidate.
    pub fn decide<R: Rng + ?Sized>(
        &self,
        shares: &[f64],
        abstention: f64,
        rng: &mut R,
    ) -> TrialOutcome {
        assert_eq!(shares.len(), self.names.len(), "one share per candidate");

        let (leader, leading_share) = trial::leader(shares).unwrap_or((0, 1.0));
        let finalists = match trial::finalists(shares) {
            Some(finalists) if leading_share <= MAJORITY_THRESHOLD => finalists,
            _ => {
                return TrialOutcome::Majority {
                    winner: leader,
                    share: leading_share,
                }
            }
        };

        TrialOutcome::Runoff(self.resolve_runoff(shares, abstention, finalists, rng))
    }

    /// Deterministic finalist split obtained by projecting the first round.
    ///
    /// The candidate shares and `abstention` are projected through the
    /// transition matrix, restricted to `finalists`, and renormalised. A pair
    /// without projected mass splits evenly.
    #[must_use]
    pub fn runoff_baseline(&self, shares: &[f64], abstention: f64, finalists: [usize; 2]) -> [f64; 2] {
        let mut vector = Vec::with_capacity(shares.len() + 1);
        vector.extend_from_slice(shares);
        vector.push(abstention);

        let projected = self.transition.project_vector(&vector);
        let first = projected[finalists[0]];
        let second = projected[finalists[1]];
        let total = first + second;
        if total > 0.0 && total.is_finite() {
            [first / total, second / total]
        } else {
            [0.5, 0.5]
        }
    }

    fn resolve_runoff<R: Rng + ?Sized>(
        &self,
        shares: &[f64],
        abstention: f64,
        finalists: [usize; 2],
        rng: &mut R,
    ) -> RunoffOutcome {
        let baseline = self.runoff_baseline(shares, abstention, finalists);
        let strength = self.params.runoff_strength;

        let final_shares = if strength <= 0.0 {
            baseline
        } else {
            let alpha = (baseline[0] * strength).max(BETA_SHAPE_FLOOR);
            let beta = (baseline[1] * strength).max(BETA_SHAPE_FLOOR);
            let noise = Beta::new(alpha, beta).expect("runoff beta shapes are floored and finite");
            let first = noise.sample(rng);
            [first, 1.0 - first]
        };

        let winner = if final_shares[0] >= final_shares[1] {
            finalists[0]
        } else {
            finalists[1]
        };

        RunoffOutcome {
            finalists,
            baseline,
            shares: final_shares,
            winner,
        }
    }

    fn sample_first_round<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f64> {
        let draws: Vec<f64> = self
            .share_samplers
            .iter()
            .map(|sampler| sampler.sample(rng))
            .collect();
        let total: f64 = draws.iter().sum();
        if !(total > 0.0 && total.is_finite()) {
            return self.first_round_baseline.clone();
        }
        draws.into_iter().map(|draw| draw / total).collect()
    }

    fn sample_abstention<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.abstention_sampler
            .sample(rng)
            .clamp(0.0, ABSTENTION_CEILING)
    }

    fn tally_trials<R: Rng + ?Sized>(&self, trials: u64, rng: &mut R) -> Vec<u64> {
        let mut tally = vec![0; self.names.len()];
        for _ in 0..trials {
            tally[self.run_trial(rng).winner()] += 1;
        }
        tally
    }

    fn finish(&self, tally: &[u64]) -> WinRates {
        let rates = WinRates::from_tally(&self.names, tally, self.params.draws);
        debug!(
            target: LOG_TARGET,
            modal_winner = rates.modal_winner().unwrap_or_default(),
            "simulation finished"
        );
        rates
    }
}

fn stream_count(draws: u64) -> u64 {
    draws.div_ceil(TRIALS_PER_STREAM)
}

fn merge_tallies(mut left: Vec<u64>, right: Vec<u64>) -> Vec<u64> {
    for (total, partial) in left.iter_mut().zip(right) {
        *total += partial;
    }
    left
}
