use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Energy (keV) and rate of one emission line.
///
/// `rate` is photons per incident photon (times the weight of the query), or
/// per initial vacancy when produced from a vacancy distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmissionLine {
    pub energy: f64,
    pub rate: f64,
}

/// Why a line was kept out of the line map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineFlag {
    /// `E(origin) - E(destination) <= 0`.
    NonPositiveEnergy,
    /// The origin or the destination has no binding energy.
    MissingBindingEnergy,
}

/// A line that would have been emitted but has no physical energy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedLine {
    pub label: String,
    /// Computed energy, `None` when a binding energy is missing.
    pub energy: Option<f64>,
    pub rate: f64,
    pub flag: LineFlag,
}

/// Emission lines keyed by transition label (`"KL3"`), plus the flagged
/// lines that were excluded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmissionLines {
    lines: BTreeMap<String, EmissionLine>,
    flagged: Vec<FlaggedLine>,
}

impl EmissionLines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, label: &str) -> Option<&EmissionLine> {
        self.lines.get(label)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EmissionLine)> {
        self.lines.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn lines(&self) -> &BTreeMap<String, EmissionLine> {
        &self.lines
    }

    pub fn into_lines(self) -> BTreeMap<String, EmissionLine> {
        self.lines
    }

    pub fn flagged(&self) -> &[FlaggedLine] {
        &self.flagged
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total_rate(&self) -> f64 {
        self.lines.values().map(|l| l.rate).sum()
    }

    /// Accumulate `rate` into `label`. The energy of a line is fixed by its
    /// label, so the first one seen is kept.
    pub(crate) fn add(&mut self, label: &str, energy: f64, rate: f64) {
        match self.lines.get_mut(label) {
            Some(line) => line.rate += rate,
            None => {
                self.lines.insert(label.to_string(), EmissionLine { energy, rate });
            }
        }
    }

    pub(crate) fn add_flagged(&mut self, label: &str, energy: Option<f64>, rate: f64, flag: LineFlag) {
        match self.flagged.iter_mut().find(|f| f.label == label) {
            Some(existing) => existing.rate += rate,
            None => self.flagged.push(FlaggedLine {
                label: label.to_string(),
                energy,
                rate,
                flag,
            }),
        }
    }

    /// Add `other` with every rate multiplied by `weight`.
    pub(crate) fn add_scaled(&mut self, other: &EmissionLines, weight: f64) {
        for (label, line) in &other.lines {
            self.add(label, line.energy, weight * line.rate);
        }
        for f in &other.flagged {
            self.add_flagged(&f.label, f.energy, weight * f.rate, f.flag);
        }
    }

    pub(crate) fn scale(&mut self, weight: f64) {
        self.lines.values_mut().for_each(|l| l.rate *= weight);
        self.flagged.iter_mut().for_each(|f| f.rate *= weight);
    }
}

impl<'a> IntoIterator for &'a EmissionLines {
    type Item = (&'a String, &'a EmissionLine);
    type IntoIter = std::collections::btree_map::Iter<'a, String, EmissionLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}
