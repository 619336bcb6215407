#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the runoff simulator.
//!
//! This crate defines the data surface that connects the historical dataset,
//! the Markov calibration system, the Monte Carlo engine, and the command-line
//! adapter. Every value here is constructed once per run and then shared
//! read-only; systems never mutate a [`CandidateResult`] or an
//! [`ElectionParameters`] after validation succeeds.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

/// State label used for voters who do not cast a valid ballot.
pub const ABSTENTION_LABEL: &str = "Astensione";

/// Tolerance applied when checking that probability rows sum to one.
pub const PROBABILITY_TOLERANCE: f64 = 1e-9;

/// Failures raised while validating election data or building the model.
///
/// All variants describe defects in caller-supplied data. They are detected
/// eagerly at construction time and are never retried.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// A mass mapping could not be normalised into a probability vector.
    #[error("invalid distribution: {reason}")]
    InvalidDistribution {
        /// Human readable description of the offending masses.
        reason: String,
    },
    /// A transition matrix was not square or a row was not stochastic.
    #[error("malformed transition matrix: {reason}")]
    MalformedTransitionMatrix {
        /// Human readable description of the structural defect.
        reason: String,
    },
    /// The runoff target handed to the calibrator lacks the abstention state.
    #[error("runoff target does not contain the abstention state `{label}`")]
    MissingAbstentionState {
        /// Abstention label the calibrator expected to find.
        label: String,
    },
    /// A projection was requested for a distribution lacking a matrix state.
    #[error("distribution does not define state `{label}`")]
    MissingStateKey {
        /// Matrix state absent from the supplied distribution.
        label: String,
    },
    /// Simulation parameters fall outside their valid domain.
    #[error("invalid election parameters: {reason}")]
    InvalidParameters {
        /// Human readable description of the rejected parameter.
        reason: String,
    },
    /// Historical election data is inconsistent.
    #[error("invalid election dataset: {reason}")]
    InvalidDataset {
        /// Human readable description of the inconsistency.
        reason: String,
    },
}

/// Historical first and (optionally) second round result of a candidate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult {
    name: String,
    coalition: String,
    first_round_votes: u64,
    first_round_share: f64,
    #[serde(default)]
    runoff_votes: Option<u64>,
    #[serde(default)]
    runoff_share: Option<f64>,
}

impl CandidateResult {
    /// Creates a candidate eliminated after the first round.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        coalition: impl Into<String>,
        first_round_votes: u64,
        first_round_share: f64,
    ) -> Self {
        Self {
            name: name.into(),
            coalition: coalition.into(),
            first_round_votes,
            first_round_share,
            runoff_votes: None,
            runoff_share: None,
        }
    }

    /// Records the candidate's runoff result.
    #[must_use]
    pub fn with_runoff(mut self, runoff_votes: u64, runoff_share: f64) -> Self {
        self.runoff_votes = Some(runoff_votes);
        self.runoff_share = Some(runoff_share);
        self
    }

    /// Unique identifier of the candidate.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Coalition or list supporting the candidate.
    #[must_use]
    pub fn coalition(&self) -> &str {
        &self.coalition
    }

    /// Valid first-round votes received.
    #[must_use]
    pub const fn first_round_votes(&self) -> u64 {
        self.first_round_votes
    }

    /// Fraction of valid first-round votes received.
    #[must_use]
    pub const fn first_round_share(&self) -> f64 {
        self.first_round_share
    }

    /// Valid runoff votes received, if the candidate reached the runoff.
    #[must_use]
    pub const fn runoff_votes(&self) -> Option<u64> {
        self.runoff_votes
    }

    /// Fraction of valid runoff votes received, if the candidate reached the runoff.
    #[must_use]
    pub const fn runoff_share(&self) -> Option<f64> {
        self.runoff_share
    }

    /// Reports whether the candidate took part in the historical runoff.
    #[must_use]
    pub const fn reached_runoff(&self) -> bool {
        self.runoff_share.is_some()
    }
}

/// Static description of a historical two-round election.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElectionDataset {
    candidates: Vec<CandidateResult>,
    abstention_first_round: f64,
    abstention_runoff: f64,
    #[serde(default)]
    valid_votes_first_round: u64,
    #[serde(default)]
    valid_votes_runoff: u64,
}

impl ElectionDataset {
    /// Creates a dataset from ordered candidate results and both abstention rates.
    #[must_use]
    pub fn new(
        candidates: Vec<CandidateResult>,
        abstention_first_round: f64,
        abstention_runoff: f64,
    ) -> Self {
        Self {
            candidates,
            abstention_first_round,
            abstention_runoff,
            valid_votes_first_round: 0,
            valid_votes_runoff: 0,
        }
    }

    /// Records the number of valid ballots cast in each round.
    #[must_use]
    pub fn with_valid_votes(mut self, first_round: u64, runoff: u64) -> Self {
        self.valid_votes_first_round = first_round;
        self.valid_votes_runoff = runoff;
        self
    }

    /// Candidates in ballot order.
    #[must_use]
    pub fn candidates(&self) -> &[CandidateResult] {
        &self.candidates
    }

    /// Looks up a candidate by name.
    #[must_use]
    pub fn candidate(&self, name: &str) -> Option<&CandidateResult> {
        self.candidates
            .iter()
            .find(|candidate| candidate.name() == name)
    }

    /// Share of eligible voters who abstained in the first round.
    #[must_use]
    pub const fn abstention_first_round(&self) -> f64 {
        self.abstention_first_round
    }

    /// Share of eligible voters who abstained in the runoff.
    #[must_use]
    pub const fn abstention_runoff(&self) -> f64 {
        self.abstention_runoff
    }

    /// Number of valid first-round ballots, zero when unknown.
    #[must_use]
    pub const fn valid_votes_first_round(&self) -> u64 {
        self.valid_votes_first_round
    }

    /// Number of valid runoff ballots, zero when unknown.
    #[must_use]
    pub const fn valid_votes_runoff(&self) -> u64 {
        self.valid_votes_runoff
    }

    /// Checks that the dataset can seed a simulation.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.candidates.is_empty() {
            return Err(invalid_dataset("at least one candidate is required"));
        }

        let mut seen = HashSet::new();
        for candidate in &self.candidates {
            if candidate.name() == ABSTENTION_LABEL {
                return Err(invalid_dataset(format!(
                    "candidate name `{ABSTENTION_LABEL}` is reserved for abstention"
                )));
            }
            if !seen.insert(candidate.name()) {
                return Err(invalid_dataset(format!(
                    "candidate `{}` is listed more than once",
                    candidate.name()
                )));
            }
            if !is_probability(candidate.first_round_share()) {
                return Err(invalid_dataset(format!(
                    "first-round share {} of `{}` is not in [0, 1]",
                    candidate.first_round_share(),
                    candidate.name()
                )));
            }
            if let Some(share) = candidate.runoff_share() {
                if !is_probability(share) {
                    return Err(invalid_dataset(format!(
                        "runoff share {share} of `{}` is not in [0, 1]",
                        candidate.name()
                    )));
                }
            }
        }

        for (label, rate) in [
            ("first-round abstention", self.abstention_first_round),
            ("runoff abstention", self.abstention_runoff),
        ] {
            if !is_probability(rate) {
                return Err(invalid_dataset(format!("{label} rate {rate} is not in [0, 1]")));
            }
        }

        Ok(())
    }
}

fn is_probability(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

fn invalid_dataset(reason: impl Into<String>) -> ModelError {
    ModelError::InvalidDataset {
        reason: reason.into(),
    }
}

/// Where the voters of each origin state tend to go in a runoff.
///
/// Rows map destination labels to non-negative masses and need not be
/// normalised. Origins without a row are treated as fully loyal to themselves
/// during calibration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BasePreferences {
    rows: BTreeMap<String, BTreeMap<String, f64>>,
}

impl BasePreferences {
    /// Creates an empty preference table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the row for `origin`.
    #[must_use]
    pub fn with_row<I, K>(mut self, origin: impl Into<String>, row: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        let row = row
            .into_iter()
            .map(|(destination, mass)| (destination.into(), mass))
            .collect();
        let _ = self.rows.insert(origin.into(), row);
        self
    }

    /// Returns the raw preference row for `origin`, if one was supplied.
    #[must_use]
    pub fn row(&self, origin: &str) -> Option<&BTreeMap<String, f64>> {
        self.rows.get(origin)
    }

    /// Iterates over every origin that carries an explicit row.
    pub fn origins(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    /// Reports whether no origin carries an explicit row.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Tunable uncertainty knobs governing the Monte Carlo sampling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ElectionParameters {
    /// Number of independent trials to run.
    pub draws: u64,
    /// Dirichlet concentration; larger values keep sampled shares closer to the baseline.
    pub concentration: f64,
    /// Standard deviation of the sampled first-round abstention rate.
    pub abstention_volatility: f64,
    /// Blend weight in `[0, 1]` pulling transition rows toward the historical runoff.
    pub runoff_elasticity: f64,
    /// Effective sample size of the runoff Beta noise; zero disables runoff noise.
    pub runoff_strength: f64,
}

impl Default for ElectionParameters {
    fn default() -> Self {
        Self {
            draws: 10_000,
            concentration: 5_000.0,
            abstention_volatility: 0.02,
            runoff_elasticity: 0.2,
            runoff_strength: 600.0,
        }
    }
}

impl ElectionParameters {
    /// Checks every knob against its valid domain.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.draws == 0 {
            return Err(invalid_parameters("draws must be positive"));
        }
        if !(self.concentration.is_finite() && self.concentration > 0.0) {
            return Err(invalid_parameters(format!(
                "concentration {} must be a positive finite number",
                self.concentration
            )));
        }
        if !(self.abstention_volatility.is_finite() && self.abstention_volatility >= 0.0) {
            return Err(invalid_parameters(format!(
                "abstention volatility {} must be a non-negative finite number",
                self.abstention_volatility
            )));
        }
        if !is_probability(self.runoff_elasticity) {
            return Err(invalid_parameters(format!(
                "runoff elasticity {} must lie in [0, 1]",
                self.runoff_elasticity
            )));
        }
        if !(self.runoff_strength.is_finite() && self.runoff_strength >= 0.0) {
            return Err(invalid_parameters(format!(
                "runoff strength {} must be a non-negative finite number",
                self.runoff_strength
            )));
        }
        Ok(())
    }
}

fn invalid_parameters(reason: impl Into<String>) -> ModelError {
    ModelError::InvalidParameters {
        reason: reason.into(),
    }
}

/// Estimated probability of victory for each candidate, in ballot order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WinRates {
    entries: Vec<(String, f64)>,
}

impl WinRates {
    /// Converts per-candidate win counts into frequencies over `draws` trials.
    ///
    /// `names` and `tally` are index aligned.
    #[must_use]
    pub fn from_tally<S: AsRef<str>>(names: &[S], tally: &[u64], draws: u64) -> Self {
        debug_assert_eq!(names.len(), tally.len());
        let draws = draws.max(1) as f64;
        let entries = names
            .iter()
            .zip(tally)
            .map(|(name, &wins)| (name.as_ref().to_owned(), wins as f64 / draws))
            .collect();
        Self { entries }
    }

    /// Win frequency of the named candidate.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|&(_, rate)| rate)
    }

    /// Iterates over candidates and frequencies in ballot order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries
            .iter()
            .map(|(name, rate)| (name.as_str(), *rate))
    }

    /// Number of candidates covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether no candidate is covered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all frequencies; one up to floating error.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, rate)| rate).sum()
    }

    /// Candidates ordered by decreasing frequency. Equal frequencies keep ballot order.
    #[must_use]
    pub fn sorted_descending(&self) -> Vec<(&str, f64)> {
        let mut sorted: Vec<_> = self.iter().collect();
        sorted.sort_by(|left, right| right.1.total_cmp(&left.1));
        sorted
    }

    /// Candidate with the highest frequency.
    #[must_use]
    pub fn modal_winner(&self) -> Option<&str> {
        self.sorted_descending().first().map(|&(name, _)| name)
    }
}
