//! Outcome of a single simulated election.

/// Terminal state of one trial. Every trial elects exactly one candidate.
#[derive(Clone, Debug, PartialEq)]
pub enum TrialOutcome {
    /// A candidate won more than half of the first-round vote.
    Majority {
        /// Index of the winner in ballot order.
        winner: usize,
        /// Winner's sampled first-round share.
        share: f64,
    },
    /// No candidate reached a majority and the two leaders met in a runoff.
    Runoff(RunoffOutcome),
}

impl TrialOutcome {
    /// Index of the elected candidate in ballot order.
    #[must_use]
    pub fn winner(&self) -> usize {
        match self {
            Self::Majority { winner, .. } => *winner,
            Self::Runoff(runoff) => runoff.winner,
        }
    }
}

/// Resolution of a two-candidate runoff.
#[derive(Clone, Debug, PartialEq)]
pub struct RunoffOutcome {
    /// Finalist indices, first-round leader first.
    pub finalists: [usize; 2],
    /// Deterministic split obtained by projecting the first round through the transition matrix.
    pub baseline: [f64; 2],
    /// Final vote split after residual noise; equals `baseline` when runoff noise is disabled.
    pub shares: [f64; 2],
    /// Index of the elected finalist. The first finalist wins an exact tie.
    pub winner: usize,
}

/// Index and share of the largest entry. The earliest candidate wins ties.
pub(crate) fn leader(shares: &[f64]) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (index, &share) in shares.iter().enumerate() {
        match best {
            Some((_, best_share)) if share <= best_share => {}
            _ => best = Some((index, share)),
        }
    }
    best
}

/// The two candidates with the largest shares, in decreasing share order.
///
/// Equal shares keep ballot order.
pub(crate) fn finalists(shares: &[f64]) -> Option<[usize; 2]> {
    let mut order: Vec<usize> = (0..shares.len()).collect();
    order.sort_by(|&left, &right| shares[right].total_cmp(&shares[left]));
    match order.as_slice() {
        [first, second, ..] => Some([*first, *second]),
        _ => None,
    }
}
