//! Calibration of the first-round to runoff transition matrix.

use runoff_sim_core::{BasePreferences, ModelError};
use tracing::debug;

use crate::{ensure_support, normalize, Distribution, TransitionMatrix, LOG_TARGET};

/// Builds the matrix describing how first-round support flows into the runoff.
///
/// The state set is every label of `first_round_states` followed by
/// `abstention_label`, which is appended once unless already present. Each
/// origin's row blends its base preference row with the normalised
/// `runoff_target`:
///
/// ```text
/// row = (1 - elasticity) * base_row + elasticity * target_row
/// ```
///
/// An `elasticity` of zero keeps pure loyalty, one copies the historical
/// runoff outcome into every row. Origins without a base row stay where they
/// are. Destinations outside the state set are ignored.
pub fn calibrate_runoff_transition<S: AsRef<str>>(
    first_round_states: &[S],
    runoff_target: &Distribution,
    abstention_label: &str,
    base_preferences: &BasePreferences,
    elasticity: f64,
) -> Result<TransitionMatrix, ModelError> {
    if !runoff_target.contains(abstention_label) {
        return Err(ModelError::MissingAbstentionState {
            label: abstention_label.to_owned(),
        });
    }
    if !(0.0..=1.0).contains(&elasticity) {
        return Err(ModelError::InvalidParameters {
            reason: format!("runoff elasticity {elasticity} must lie in [0, 1]"),
        });
    }

    let mut states: Vec<String> = first_round_states
        .iter()
        .map(|state| state.as_ref().to_owned())
        .collect();
    if !states.iter().any(|state| state == abstention_label) {
        states.push(abstention_label.to_owned());
    }

    let target_row = full_row(&runoff_target_row(runoff_target, &states)?, &states);

    let mut rows = Vec::with_capacity(states.len());
    for origin in &states {
        let base_row = full_row(&base_row(origin, &states, base_preferences)?, &states);
        let blended = base_row
            .iter()
            .zip(&target_row)
            .map(|(base, target)| (1.0 - elasticity) * base + elasticity * target)
            .collect();
        rows.push(normalize_row(blended));
    }

    debug!(
        target: LOG_TARGET,
        states = states.len(),
        elasticity,
        "calibrated runoff transition matrix"
    );

    TransitionMatrix::new(states, rows)
}

fn runoff_target_row(
    runoff_target: &Distribution,
    states: &[String],
) -> Result<Distribution, ModelError> {
    let restricted: Distribution = states
        .iter()
        .map(|state| (state.as_str(), runoff_target.get(state).unwrap_or(0.0)))
        .collect();
    normalize(&restricted)
}

fn base_row(
    origin: &str,
    states: &[String],
    base_preferences: &BasePreferences,
) -> Result<Distribution, ModelError> {
    let explicit: Distribution = base_preferences
        .row(origin)
        .into_iter()
        .flatten()
        .filter(|(destination, _)| states.contains(*destination))
        .map(|(destination, mass)| (destination.as_str(), *mass))
        .collect();

    let row = if explicit.is_empty() {
        Distribution::from_masses([(origin, 1.0)])
    } else {
        explicit
    };
    ensure_support(row, states)
}

fn full_row(distribution: &Distribution, states: &[String]) -> Vec<f64> {
    states
        .iter()
        .map(|state| distribution.get(state).unwrap_or(0.0))
        .collect()
}

fn normalize_row(row: Vec<f64>) -> Vec<f64> {
    let total: f64 = row.iter().sum();
    if total == 0.0 {
        let uniform = 1.0 / row.len() as f64;
        return vec![uniform; row.len()];
    }
    row.into_iter().map(|value| value / total).collect()
}

#[cfg(test)]
mod tests {
    use super::{calibrate_runoff_transition, normalize_row};
    use crate::Distribution;
    use runoff_sim_core::{BasePreferences, ModelError};

    const ABSTAIN: &str = "abstain";

    fn target() -> Distribution {
        Distribution::from_masses([("a", 0.3), ("b", 0.2), (ABSTAIN, 0.5)])
    }

    #[test]
    fn missing_abstention_is_rejected() {
        let target = Distribution::from_masses([("a", 0.6), ("b", 0.4)]);
        let result =
            calibrate_runoff_transition(&["a", "b"], &target, ABSTAIN, &BasePreferences::new(), 0.2);
        assert_eq!(
            result,
            Err(ModelError::MissingAbstentionState {
                label: ABSTAIN.to_owned()
            })
        );
    }

    #[test]
    fn abstention_state_is_appended_once() {
        let matrix = calibrate_runoff_transition(
            &["a", "b", "c"],
            &target(),
            ABSTAIN,
            &BasePreferences::new(),
            0.5,
        )
        .expect("calibration succeeds");
        assert_eq!(matrix.states(), ["a", "b", "c", ABSTAIN]);
    }

    #[test]
    fn origins_without_preferences_stay_loyal() {
        let matrix =
            calibrate_runoff_transition(&["a", "b"], &target(), ABSTAIN, &BasePreferences::new(), 0.0)
                .expect("calibration succeeds");
        assert_eq!(matrix.row("b"), Some(&[0.0, 1.0, 0.0][..]));
    }

    #[test]
    fn elasticity_blends_rows() {
        let preferences = BasePreferences::new().with_row("a", [("b", 1.0)]);
        let matrix = calibrate_runoff_transition(&["a", "b"], &target(), ABSTAIN, &preferences, 0.5)
            .expect("calibration succeeds");
        let row = matrix.row("a").expect("row present");
        assert!((row[0] - 0.15).abs() < 1e-12);
        assert!((row[1] - 0.6).abs() < 1e-12);
        assert!((row[2] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn unknown_destinations_are_ignored() {
        let preferences = BasePreferences::new().with_row("a", [("a", 0.5), ("ghost", 0.5)]);
        let matrix = calibrate_runoff_transition(&["a", "b"], &target(), ABSTAIN, &preferences, 0.0)
            .expect("calibration succeeds");
        assert_eq!(matrix.row("a"), Some(&[1.0, 0.0, 0.0][..]));
    }

    #[test]
    fn rejects_elasticity_outside_unit_interval() {
        let result =
            calibrate_runoff_transition(&["a", "b"], &target(), ABSTAIN, &BasePreferences::new(), 1.2);
        assert!(matches!(result, Err(ModelError::InvalidParameters { .. })));
    }

    #[test]
    fn zero_row_falls_back_to_uniform() {
        assert_eq!(normalize_row(vec![0.0; 4]), vec![0.25; 4]);
        assert_eq!(normalize_row(vec![1.0, 3.0]), vec![0.25, 0.75]);
    }
}
