use std::{fs, path::Path};

use anyhow::{Context, Result};
use runoff_sim_core::{BasePreferences, ElectionDataset, ElectionParameters};
use serde::Deserialize;

/// Everything a simulation run needs besides the seed.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    /// Historical results the model is calibrated on.
    pub(crate) dataset: ElectionDataset,
    /// Runoff destinations of each first-round electorate.
    #[serde(default)]
    pub(crate) base_preferences: BasePreferences,
    /// Sampling parameters; command-line flags take precedence.
    #[serde(default)]
    pub(crate) parameters: ElectionParameters,
}

impl Scenario {
    /// Built-in scenario for the 2019 Ascoli Piceno election.
    pub(crate) fn ascoli_piceno_2019() -> Self {
        Self {
            dataset: runoff_sim_dataset::ascoli_piceno_2019(),
            base_preferences: runoff_sim_dataset::base_preferences_2019(),
            parameters: ElectionParameters::default(),
        }
    }

    /// Loads and validates a TOML scenario file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid scenario {}", path.display()))
    }

    fn parse(text: &str) -> Result<Self> {
        let scenario: Self = toml::from_str(text)?;
        scenario.dataset.validate()?;
        scenario.parameters.validate()?;
        Ok(scenario)
    }
}

#[cfg(test)]
mod tests {
    use super::Scenario;

    const ASCOLI_2019: &str = include_str!("../../../scenarios/ascoli_piceno_2019.toml");

    #[test]
    fn bundled_scenario_matches_the_builtin_dataset() {
        let parsed = Scenario::parse(ASCOLI_2019).expect("bundled scenario parses");
        let builtin = Scenario::ascoli_piceno_2019();
        assert_eq!(parsed.dataset, builtin.dataset);
        assert_eq!(parsed.base_preferences, builtin.base_preferences);
        assert_eq!(parsed.parameters, builtin.parameters);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let text = r#"
            [dataset]
            abstention_first_round = 0.3
            abstention_runoff = 0.4

            [[dataset.candidates]]
            name = "Rossi"
            coalition = "Lista A"
            first_round_votes = 600
            first_round_share = 0.6

            [[dataset.candidates]]
            name = "Bianchi"
            coalition = "Lista B"
            first_round_votes = 400
            first_round_share = 0.4
        "#;
        let scenario = Scenario::parse(text).expect("minimal scenario parses");
        assert_eq!(scenario.dataset.candidates().len(), 2);
        assert!(scenario.base_preferences.is_empty());
        assert_eq!(scenario.parameters.draws, 10_000);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let text = r#"
            [parameters]
            runoff_elasticity = 2.0

            [dataset]
            abstention_first_round = 0.3
            abstention_runoff = 0.4

            [[dataset.candidates]]
            name = "Rossi"
            coalition = "Lista A"
            first_round_votes = 600
            first_round_share = 1.0
        "#;
        assert!(Scenario::parse(text).is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let text = r#"
            [parameters]
            drawz = 10

            [dataset]
            abstention_first_round = 0.3
            abstention_runoff = 0.4
            candidates = []
        "#;
        assert!(Scenario::parse(text).is_err());
    }
}
