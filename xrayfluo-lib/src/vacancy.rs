use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, XrayFluoError};
use crate::subshell::Subshell;

/// Vacancy probability per subshell plus an aggregate `REST` bucket for
/// absorption in subshells without a partial cross section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VacancyDistribution {
    shells: BTreeMap<Subshell, f64>,
    rest: f64,
}

impl VacancyDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_rest(rest: f64) -> Self {
        Self {
            shells: BTreeMap::new(),
            rest,
        }
    }

    /// Build from `(subshell, probability)` pairs given by name.
    pub fn from_labels<S: AsRef<str>>(labels: &[S], values: &[f64]) -> Result<Self> {
        if labels.len() != values.len() {
            return Err(XrayFluoError::LengthMismatch {
                what: "vacancy distribution",
                expected: labels.len(),
                actual: values.len(),
            });
        }
        let mut distribution = Self::new();
        for (label, &p) in labels.iter().zip(values) {
            let label = label.as_ref();
            if label.eq_ignore_ascii_case("rest") {
                distribution.set_rest(p)?;
            } else {
                distribution.set(label.parse()?, p)?;
            }
        }
        Ok(distribution)
    }

    pub fn set(&mut self, subshell: Subshell, probability: f64) -> Result<()> {
        check_probability(probability)?;
        self.shells.insert(subshell, probability);
        Ok(())
    }

    pub fn set_rest(&mut self, probability: f64) -> Result<()> {
        check_probability(probability)?;
        self.rest = probability;
        Ok(())
    }

    pub(crate) fn add(&mut self, subshell: Subshell, probability: f64) {
        *self.shells.entry(subshell).or_insert(0.0) += probability;
    }

    /// Probability at `subshell`, 0 when absent.
    pub fn get(&self, subshell: Subshell) -> f64 {
        self.shells.get(&subshell).copied().unwrap_or(0.0)
    }

    pub fn rest(&self) -> f64 {
        self.rest
    }

    /// Subshell entries in rank order, `REST` excluded.
    pub fn iter(&self) -> impl Iterator<Item = (Subshell, f64)> + '_ {
        self.shells.iter().map(|(s, p)| (*s, *p))
    }

    pub fn contains(&self, subshell: Subshell) -> bool {
        self.shells.contains_key(&subshell)
    }

    /// Sum over the subshells and `REST`.
    pub fn total(&self) -> f64 {
        self.shells.values().sum::<f64>() + self.rest
    }

    pub fn is_empty(&self) -> bool {
        self.shells.is_empty() && self.rest == 0.0
    }

    /// Probabilities keyed by subshell name, with `REST` last.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        let mut map: BTreeMap<String, f64> =
            self.iter().map(|(s, p)| (s.to_string(), p)).collect();
        map.insert("REST".to_string(), self.rest);
        map
    }
}

impl FromIterator<(Subshell, f64)> for VacancyDistribution {
    /// Negative or non-finite probabilities are dropped.
    fn from_iter<I: IntoIterator<Item = (Subshell, f64)>>(iter: I) -> Self {
        let mut distribution = Self::new();
        for (s, p) in iter {
            if p.is_finite() && p >= 0.0 {
                distribution.add(s, p);
            }
        }
        distribution
    }
}

fn check_probability(p: f64) -> Result<()> {
    if p.is_finite() && p >= 0.0 {
        Ok(())
    } else {
        Err(XrayFluoError::invalid(format!(
            "vacancy probability must be finite and >= 0, got {p}"
        )))
    }
}
