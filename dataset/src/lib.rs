#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Historical results of the 2019 Ascoli Piceno mayoral election.
//!
//! Figures are the official first round and runoff results published on
//! Eligendo. The base preference table is a hand-calibrated estimate of where
//! each electorate went in the runoff.

use runoff_sim_core::{BasePreferences, CandidateResult, ElectionDataset, ABSTENTION_LABEL};

/// Number of valid ballots in the 2019 first round.
pub const TOTAL_VALID_VOTES_FIRST_ROUND: u64 = 37_826;

/// Number of valid ballots in the 2019 runoff.
pub const TOTAL_VALID_VOTES_RUNOFF: u64 = 27_270;

/// Share of eligible voters who abstained in the first round.
pub const ABSTENTION_RATE_FIRST_ROUND: f64 = 0.379;

/// Share of eligible voters who abstained in the runoff.
pub const ABSTENTION_RATE_RUNOFF: f64 = 0.565;

const FIORAVANTI: &str = "Marco Fioravanti";
const CELANI: &str = "Piero Celani";
const AMELI: &str = "Francesco Ameli";
const VECCHI: &str = "Gianluca Vecchi";
const STALLONE: &str = "Domenico Stallone";

/// Candidates of the 2019 election in ballot order.
#[must_use]
pub fn candidates_2019() -> Vec<CandidateResult> {
    vec![
        CandidateResult::new(FIORAVANTI, "Centrodestra", 14_170, 0.3747).with_runoff(16_199, 0.5931),
        CandidateResult::new(CELANI, "Civiche di centro", 12_288, 0.3248)
            .with_runoff(11_101, 0.4069),
        CandidateResult::new(AMELI, "Centrosinistra", 8_850, 0.2338),
        CandidateResult::new(VECCHI, "Movimento 5 Stelle", 1_985, 0.0525),
        CandidateResult::new(STALLONE, "Civiche", 533, 0.0141),
    ]
}

/// Complete 2019 dataset with abstention rates and valid-vote totals.
#[must_use]
pub fn ascoli_piceno_2019() -> ElectionDataset {
    ElectionDataset::new(
        candidates_2019(),
        ABSTENTION_RATE_FIRST_ROUND,
        ABSTENTION_RATE_RUNOFF,
    )
    .with_valid_votes(TOTAL_VALID_VOTES_FIRST_ROUND, TOTAL_VALID_VOTES_RUNOFF)
}

/// Estimated runoff destinations of each 2019 first-round electorate.
#[must_use]
pub fn base_preferences_2019() -> BasePreferences {
    BasePreferences::new()
        .with_row(
            FIORAVANTI,
            [(FIORAVANTI, 0.96), (CELANI, 0.02), (ABSTENTION_LABEL, 0.02)],
        )
        .with_row(
            CELANI,
            [(CELANI, 0.96), (FIORAVANTI, 0.02), (ABSTENTION_LABEL, 0.02)],
        )
        .with_row(
            AMELI,
            [(CELANI, 0.60), (FIORAVANTI, 0.25), (ABSTENTION_LABEL, 0.15)],
        )
        .with_row(
            VECCHI,
            [(FIORAVANTI, 0.45), (CELANI, 0.35), (ABSTENTION_LABEL, 0.20)],
        )
        .with_row(
            STALLONE,
            [(FIORAVANTI, 0.65), (CELANI, 0.20), (ABSTENTION_LABEL, 0.15)],
        )
        .with_row(
            ABSTENTION_LABEL,
            [(ABSTENTION_LABEL, 0.60), (FIORAVANTI, 0.20), (CELANI, 0.20)],
        )
}
