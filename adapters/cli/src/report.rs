use std::fmt;

use runoff_sim_core::{ElectionParameters, WinRates};

/// Plain-text summary of a finished simulation.
#[derive(Debug)]
pub(crate) struct Report<'a> {
    params: &'a ElectionParameters,
    seed: u64,
    rates: &'a WinRates,
}

impl<'a> Report<'a> {
    pub(crate) fn new(params: &'a ElectionParameters, seed: u64, rates: &'a WinRates) -> Self {
        Self {
            params,
            seed,
            rates,
        }
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Parameters:")?;
        writeln!(f, "  draws: {}", self.params.draws)?;
        writeln!(f, "  concentration: {}", self.params.concentration)?;
        writeln!(
            f,
            "  abstention_volatility: {}",
            self.params.abstention_volatility
        )?;
        writeln!(f, "  runoff_elasticity: {}", self.params.runoff_elasticity)?;
        writeln!(f, "  runoff_strength: {}", self.params.runoff_strength)?;
        writeln!(f, "  seed: {}", self.seed)?;
        writeln!(f)?;
        writeln!(f, "Win frequencies:")?;
        for (name, rate) in self.rates.sorted_descending() {
            writeln!(f, "  {name:25}: {:.2}%", rate * 100.0)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Report;
    use runoff_sim_core::{ElectionParameters, WinRates};

    #[test]
    fn lists_candidates_by_descending_frequency() {
        let params = ElectionParameters {
            draws: 4,
            ..ElectionParameters::default()
        };
        let rates = WinRates::from_tally(&["Rossi", "Bianchi", "Verdi"], &[1, 3, 0], 4);
        let rendered = Report::new(&params, 9, &rates).to_string();

        let expected_tail = format!(
            "Win frequencies:\n  {:25}: 75.00%\n  {:25}: 25.00%\n  {:25}: 0.00%\n",
            "Bianchi", "Rossi", "Verdi"
        );
        assert!(rendered.starts_with("Parameters:\n  draws: 4\n"));
        assert!(rendered.contains("  seed: 9\n\n"));
        assert!(rendered.ends_with(&expected_tail), "{rendered}");
    }
}
