//! Probability vectors keyed by state label.

use std::collections::BTreeMap;

use runoff_sim_core::ModelError;

/// Non-negative masses keyed by state label.
///
/// A `Distribution` returned by [`normalize`] sums to one; other instances
/// hold raw masses, such as candidate shares extended with an abstention rate.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Distribution {
    masses: BTreeMap<String, f64>,
}

impl Distribution {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a mapping from `(label, mass)` pairs. Later duplicates win.
    #[must_use]
    pub fn from_masses<I, K>(masses: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            masses: masses
                .into_iter()
                .map(|(label, mass)| (label.into(), mass))
                .collect(),
        }
    }

    /// Sets the mass of `label`, replacing any previous value.
    pub fn set(&mut self, label: impl Into<String>, mass: f64) {
        let _ = self.masses.insert(label.into(), mass);
    }

    /// Mass assigned to `label`.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<f64> {
        self.masses.get(label).copied()
    }

    /// Reports whether `label` carries a mass, zero included.
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.masses.contains_key(label)
    }

    /// Number of labels carrying a mass.
    #[must_use]
    pub fn len(&self) -> usize {
        self.masses.len()
    }

    /// Reports whether no label carries a mass.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.masses.is_empty()
    }

    /// Iterates over labels and masses in label order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.masses
            .iter()
            .map(|(label, mass)| (label.as_str(), *mass))
    }

    /// Sum of every mass.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.masses.values().sum()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for Distribution {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self::from_masses(iter)
    }
}

/// Divides every mass by the total so the result sums to one.
///
/// Fails with [`ModelError::InvalidDistribution`] when a mass is negative or
/// not finite, or when the total mass is not positive (which covers empty and
/// all-zero inputs).
pub fn normalize(masses: &Distribution) -> Result<Distribution, ModelError> {
    if let Some((label, mass)) = masses
        .iter()
        .find(|(_, mass)| !(mass.is_finite() && *mass >= 0.0))
    {
        return Err(ModelError::InvalidDistribution {
            reason: format!("mass {mass} of `{label}` is not a non-negative number"),
        });
    }

    let total = masses.total();
    if total <= 0.0 {
        return Err(ModelError::InvalidDistribution {
            reason: format!("total mass {total} is not positive"),
        });
    }

    Ok(masses
        .iter()
        .map(|(label, mass)| (label, mass / total))
        .collect())
}

/// Adds a zero mass for every label of `states` missing from `masses`, then normalises.
pub fn ensure_support<S: AsRef<str>>(
    mut masses: Distribution,
    states: &[S],
) -> Result<Distribution, ModelError> {
    for state in states {
        let _ = masses
            .masses
            .entry(state.as_ref().to_owned())
            .or_insert(0.0);
    }
    normalize(&masses)
}

#[cfg(test)]
mod tests {
    use super::{ensure_support, normalize, Distribution};
    use runoff_sim_core::ModelError;

    #[test]
    fn normalize_sums_to_one() {
        let masses = Distribution::from_masses([("a", 3.0), ("b", 1.0), ("c", 0.0)]);
        let normalized = normalize(&masses).expect("positive mass");
        assert!((normalized.total() - 1.0).abs() < 1e-9);
        assert_eq!(normalized.get("a"), Some(0.75));
        assert_eq!(normalized.get("c"), Some(0.0));
    }

    #[test]
    fn normalize_rejects_empty_and_zero_mass() {
        assert!(matches!(
            normalize(&Distribution::new()),
            Err(ModelError::InvalidDistribution { .. })
        ));
        let zeros = Distribution::from_masses([("a", 0.0), ("b", 0.0)]);
        assert!(matches!(
            normalize(&zeros),
            Err(ModelError::InvalidDistribution { .. })
        ));
    }

    #[test]
    fn normalize_rejects_negative_mass() {
        let masses = Distribution::from_masses([("a", 2.0), ("b", -0.5)]);
        assert!(matches!(
            normalize(&masses),
            Err(ModelError::InvalidDistribution { .. })
        ));
    }

    #[test]
    fn ensure_support_fills_missing_states() {
        let partial = Distribution::from_masses([("a", 0.6), ("b", 0.2)]);
        let full = ensure_support(partial, &["a", "b", "c"]).expect("positive mass");
        assert_eq!(full.len(), 3);
        assert_eq!(full.get("c"), Some(0.0));
        assert!((full.get("a").expect("a") - 0.75).abs() < 1e-12);
    }

    #[test]
    fn ensure_support_propagates_missing_mass() {
        let result = ensure_support(Distribution::new(), &["a", "b"]);
        assert!(matches!(
            result,
            Err(ModelError::InvalidDistribution { .. })
        ));
    }
}
