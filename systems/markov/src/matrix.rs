//! Immutable labelled row-stochastic matrix.

use std::collections::HashSet;

use runoff_sim_core::{ModelError, PROBABILITY_TOLERANCE};

use crate::Distribution;

/// Row-stochastic Markov matrix whose rows and columns share one label sequence.
///
/// Entry `(i, j)` is the probability that mass in state `i` moves to state `j`.
/// Every row sums to one within [`PROBABILITY_TOLERANCE`]; construction fails
/// otherwise, and the matrix is never mutated afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionMatrix {
    states: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl TransitionMatrix {
    /// Validates and wraps `rows` labelled by `states`.
    pub fn new(states: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self, ModelError> {
        let size = states.len();
        if size == 0 {
            return Err(malformed("the state sequence is empty"));
        }

        let mut seen = HashSet::with_capacity(size);
        for state in &states {
            if !seen.insert(state.as_str()) {
                return Err(malformed(format!("state `{state}` appears more than once")));
            }
        }

        if rows.len() != size {
            return Err(malformed(format!(
                "expected {size} rows, found {}",
                rows.len()
            )));
        }

        for (state, row) in states.iter().zip(&rows) {
            if row.len() != size {
                return Err(malformed(format!(
                    "row `{state}` has {} entries, expected {size}",
                    row.len()
                )));
            }
            if row.iter().any(|value| !(value.is_finite() && *value >= 0.0)) {
                return Err(malformed(format!(
                    "row `{state}` contains a negative or non-finite entry"
                )));
            }
            let sum: f64 = row.iter().sum();
            if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
                return Err(malformed(format!("row `{state}` sums to {sum}")));
            }
        }

        Ok(Self { states, rows })
    }

    /// Ordered state labels shared by rows and columns.
    #[must_use]
    pub fn states(&self) -> &[String] {
        &self.states
    }

    /// Number of states.
    #[must_use]
    pub fn size(&self) -> usize {
        self.states.len()
    }

    /// Position of `label` within [`Self::states`].
    #[must_use]
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.states.iter().position(|state| state == label)
    }

    /// Outgoing probabilities of `origin`, in [`Self::states`] order.
    #[must_use]
    pub fn row(&self, origin: &str) -> Option<&[f64]> {
        self.index_of(origin).map(|index| self.rows[index].as_slice())
    }

    /// Probability that mass in `origin` moves to `destination`.
    #[must_use]
    pub fn probability(&self, origin: &str, destination: &str) -> Option<f64> {
        let column = self.index_of(destination)?;
        self.row(origin).map(|row| row[column])
    }

    /// Left-multiplies `distribution` by the matrix.
    ///
    /// The input must define every state; labels outside the state set are
    /// ignored. The input need not sum to one, the projection preserves its
    /// total mass.
    pub fn project(&self, distribution: &Distribution) -> Result<Distribution, ModelError> {
        let vector = self
            .states
            .iter()
            .map(|state| {
                distribution
                    .get(state)
                    .ok_or_else(|| ModelError::MissingStateKey {
                        label: state.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let projected = self.project_vector(&vector);
        Ok(self
            .states
            .iter()
            .map(String::as_str)
            .zip(projected)
            .collect())
    }

    /// Index-aligned form of [`Self::project`].
    ///
    /// # Panics
    ///
    /// Panics when `vector` does not hold exactly one entry per state.
    #[must_use]
    pub fn project_vector(&self, vector: &[f64]) -> Vec<f64> {
        assert_eq!(
            vector.len(),
            self.size(),
            "projected vector must cover every state"
        );

        let mut result = vec![0.0; self.size()];
        for (mass, row) in vector.iter().zip(&self.rows) {
            for (slot, probability) in result.iter_mut().zip(row) {
                *slot += mass * probability;
            }
        }
        result
    }
}

fn malformed(reason: impl Into<String>) -> ModelError {
    ModelError::MalformedTransitionMatrix {
        reason: reason.into(),
    }
}
