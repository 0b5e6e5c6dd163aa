use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, XrayFluoError};
use crate::subshell::Subshell;

/// Tolerance on `omega + Σf <= 1`.
const YIELD_TOLERANCE: f64 = 1.0e-6;

/// One radiative or non-radiative transition of a subshell.
///
/// `destinations` holds the subshell that receives the vacancy for a
/// radiative line (`"KL3"` → `[L3]`) and both final holes for a
/// non-radiative one (`"L1L3M5"` → `[L3, M5]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub label: String,
    pub destinations: Vec<Subshell>,
    pub rate: f64,
}

impl Transition {
    /// Destination inside the same principal shell for a Coster-Kronig
    /// transition, `None` for Auger and radiative transitions.
    pub fn coster_kronig_destination(&self, origin: Subshell) -> Option<Subshell> {
        if self.destinations.len() != 2 {
            return None;
        }
        self.destinations.iter().copied().find(|d| d.same_shell(origin))
    }
}

/// Decay data of one subshell: fluorescence yield, Coster-Kronig yields and
/// normalized transition ratios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shell {
    subshell: Subshell,
    fluorescence_yield: f64,
    coster_kronig_yields: BTreeMap<Subshell, f64>,
    radiative: Vec<Transition>,
    nonradiative: Vec<Transition>,
}

impl Shell {
    pub fn new(subshell: Subshell) -> Self {
        Self {
            subshell,
            fluorescence_yield: 0.0,
            coster_kronig_yields: BTreeMap::new(),
            radiative: Vec::new(),
            nonradiative: Vec::new(),
        }
    }

    pub fn subshell(&self) -> Subshell {
        self.subshell
    }

    pub fn fluorescence_yield(&self) -> f64 {
        self.fluorescence_yield
    }

    /// `f[i→j]` keyed by destination `j`.
    pub fn coster_kronig_yields(&self) -> &BTreeMap<Subshell, f64> {
        &self.coster_kronig_yields
    }

    pub fn coster_kronig_total(&self) -> f64 {
        self.coster_kronig_yields.values().sum()
    }

    /// Probability that a vacancy decays by an Auger transition.
    pub fn auger_yield(&self) -> f64 {
        (1.0 - self.fluorescence_yield - self.coster_kronig_total()).max(0.0)
    }

    /// Shell constants in their external form: `omega` plus `f<i><j>` keys.
    pub fn shell_constants(&self) -> BTreeMap<String, f64> {
        let own = self.subshell.index_in_shell();
        let mut constants = BTreeMap::new();
        constants.insert("omega".to_string(), self.fluorescence_yield);
        for (dest, f) in &self.coster_kronig_yields {
            constants.insert(format!("f{own}{}", dest.index_in_shell()), *f);
        }
        constants
    }

    /// Set `omega` and the Coster-Kronig yields from parallel slices.
    ///
    /// Missing keys are taken as 0. The call fails without modifying the shell
    /// on mismatched lengths, unknown keys, values outside `[0, 1]`, or
    /// `omega + Σf > 1`.
    pub fn set_shell_constants<S: AsRef<str>>(&mut self, keys: &[S], values: &[f64]) -> Result<()> {
        check_lengths("shell constants", keys.len(), values.len())?;

        let own = self.subshell.index_in_shell();
        let mut omega = 0.0;
        let mut yields = BTreeMap::new();
        for (key, &value) in keys.iter().zip(values) {
            let key = key.as_ref().trim();
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(XrayFluoError::invalid(format!(
                    "{} shell constant {key} must be in [0, 1], got {value}",
                    self.subshell
                )));
            }
            if key.eq_ignore_ascii_case("omega") {
                omega = value;
                continue;
            }
            let dest = self.parse_yield_key(key, own)?;
            if yields.insert(dest, value).is_some() {
                return Err(XrayFluoError::invalid(format!(
                    "{} shell constant {key} given twice",
                    self.subshell
                )));
            }
        }

        let total = omega + yields.values().sum::<f64>();
        if total > 1.0 + YIELD_TOLERANCE {
            return Err(XrayFluoError::invalid(format!(
                "{} yields sum to {total} > 1",
                self.subshell
            )));
        }
        yields.retain(|_, f| *f > 0.0);
        self.fluorescence_yield = omega;
        self.coster_kronig_yields = yields;
        Ok(())
    }

    pub fn set_shell_constants_map(&mut self, constants: &BTreeMap<String, f64>) -> Result<()> {
        let (keys, values): (Vec<&str>, Vec<f64>) =
            constants.iter().map(|(k, v)| (k.as_str(), *v)).unzip();
        self.set_shell_constants(&keys, &values)
    }

    /// `f<i><j>` → subshell `j` of the same principal shell, with `i` this
    /// subshell's own index and `j > i`.
    fn parse_yield_key(&self, key: &str, own: usize) -> Result<Subshell> {
        let bad = || XrayFluoError::InvalidLabel {
            subshell: self.subshell.to_string(),
            label: key.to_string(),
        };
        let digits = key
            .strip_prefix('f')
            .or_else(|| key.strip_prefix('F'))
            .ok_or_else(bad)?;
        let mut chars = digits.chars();
        let (Some(i), Some(j), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(bad());
        };
        let i = i.to_digit(10).ok_or_else(bad)? as usize;
        let j = j.to_digit(10).ok_or_else(bad)? as usize;
        if i != own || j <= i {
            return Err(bad());
        }
        self.subshell.sibling(j).ok_or_else(bad)
    }

    /// Set the radiative transition ratios (`"<subshell><destination>"`).
    pub fn set_radiative_transitions<S: AsRef<str>>(
        &mut self,
        labels: &[S],
        values: &[f64],
    ) -> Result<()> {
        check_lengths("radiative transitions", labels.len(), values.len())?;
        self.radiative = self.parse_transitions(labels, values, 1)?;
        Ok(())
    }

    pub fn set_radiative_transitions_map(&mut self, ratios: &BTreeMap<String, f64>) -> Result<()> {
        let (labels, values): (Vec<&str>, Vec<f64>) =
            ratios.iter().map(|(k, v)| (k.as_str(), *v)).unzip();
        self.set_radiative_transitions(&labels, &values)
    }

    /// Set the non-radiative ratios (`"<subshell><hole><hole>"`), Coster-Kronig
    /// and Auger together. Which is which follows from the destinations.
    pub fn set_nonradiative_transitions<S: AsRef<str>>(
        &mut self,
        labels: &[S],
        values: &[f64],
    ) -> Result<()> {
        check_lengths("non-radiative transitions", labels.len(), values.len())?;
        self.nonradiative = self.parse_transitions(labels, values, 2)?;
        Ok(())
    }

    pub fn set_nonradiative_transitions_map(
        &mut self,
        ratios: &BTreeMap<String, f64>,
    ) -> Result<()> {
        let (labels, values): (Vec<&str>, Vec<f64>) =
            ratios.iter().map(|(k, v)| (k.as_str(), *v)).unzip();
        self.set_nonradiative_transitions(&labels, &values)
    }

    fn parse_transitions<S: AsRef<str>>(
        &self,
        labels: &[S],
        values: &[f64],
        holes: usize,
    ) -> Result<Vec<Transition>> {
        let mut parsed: Vec<Transition> = Vec::with_capacity(labels.len());
        for (label, &rate) in labels.iter().zip(values) {
            let label = label.as_ref().trim();
            if !rate.is_finite() || rate < 0.0 {
                return Err(XrayFluoError::invalid(format!(
                    "transition {label} rate must be finite and >= 0, got {rate}"
                )));
            }
            let destinations = self.parse_label(label, holes)?;
            if parsed.iter().any(|t| t.label == label) {
                return Err(XrayFluoError::invalid(format!("transition {label} given twice")));
            }
            parsed.push(Transition {
                label: label.to_string(),
                destinations,
                rate,
            });
        }

        if parsed.is_empty() {
            return Ok(parsed);
        }
        let total: f64 = parsed.iter().map(|t| t.rate).sum();
        if !(total > 0.0) {
            return Err(XrayFluoError::invalid(format!(
                "{} transition rates sum to zero",
                self.subshell
            )));
        }
        for t in &mut parsed {
            t.rate /= total;
        }
        parsed.sort_by(|a, b| a.label.cmp(&b.label));
        Ok(parsed)
    }

    fn parse_label(&self, label: &str, holes: usize) -> Result<Vec<Subshell>> {
        let bad = || XrayFluoError::InvalidLabel {
            subshell: self.subshell.to_string(),
            label: label.to_string(),
        };
        let (origin, mut rest) = Subshell::parse_prefix(label).ok_or_else(bad)?;
        if origin != self.subshell {
            return Err(bad());
        }
        let mut destinations = Vec::with_capacity(holes);
        while !rest.is_empty() {
            let (dest, tail) = Subshell::parse_prefix(rest).ok_or_else(bad)?;
            if dest <= self.subshell {
                return Err(bad());
            }
            destinations.push(dest);
            rest = tail;
        }
        if destinations.len() != holes {
            return Err(bad());
        }
        Ok(destinations)
    }

    pub fn radiative_transitions(&self) -> &[Transition] {
        &self.radiative
    }

    pub fn nonradiative_transitions(&self) -> &[Transition] {
        &self.nonradiative
    }

    /// Normalized radiative ratios by line label.
    pub fn fluorescence_ratios(&self) -> BTreeMap<String, f64> {
        self.radiative.iter().map(|t| (t.label.clone(), t.rate)).collect()
    }

    /// Normalized non-radiative ratios by label, Coster-Kronig and Auger.
    pub fn nonradiative_ratios(&self) -> BTreeMap<String, f64> {
        self.nonradiative.iter().map(|t| (t.label.clone(), t.rate)).collect()
    }

    /// Auger part of the non-radiative ratios, renormalized to sum 1.
    pub fn auger_ratios(&self) -> BTreeMap<String, f64> {
        let auger: Vec<&Transition> = self
            .nonradiative
            .iter()
            .filter(|t| t.coster_kronig_destination(self.subshell).is_none())
            .collect();
        let total: f64 = auger.iter().map(|t| t.rate).sum();
        if total <= 0.0 {
            return BTreeMap::new();
        }
        auger.iter().map(|t| (t.label.clone(), t.rate / total)).collect()
    }

    /// Coster-Kronig part of the non-radiative ratios as
    /// `destination → {label → rate}`, each inner map summing to 1.
    pub fn coster_kronig_ratios(&self) -> BTreeMap<Subshell, BTreeMap<String, f64>> {
        let mut ratios: BTreeMap<Subshell, BTreeMap<String, f64>> = BTreeMap::new();
        for t in &self.nonradiative {
            if let Some(dest) = t.coster_kronig_destination(self.subshell) {
                ratios.entry(dest).or_default().insert(t.label.clone(), t.rate);
            }
        }
        for inner in ratios.values_mut() {
            let total: f64 = inner.values().sum();
            if total > 0.0 {
                inner.values_mut().for_each(|v| *v /= total);
            }
        }
        ratios
    }
}

fn check_lengths(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(XrayFluoError::LengthMismatch {
            what,
            expected,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_radiative_ratios_are_normalized() {
        let mut shell = Shell::new(Subshell::K);
        shell
            .set_radiative_transitions(&["KL2", "KL3", "KM3"], &[1.0, 2.0, 0.5])
            .unwrap();
        let ratios = shell.fluorescence_ratios();
        assert_relative_eq!(ratios.values().sum::<f64>(), 1.0, epsilon = 1e-15);
        assert_relative_eq!(ratios["KL3"], 2.0 / 3.5, epsilon = 1e-15);
        assert_eq!(shell.radiative_transitions()[1].destinations, vec![Subshell::L3]);
    }

    #[test]
    fn test_nonradiative_split() {
        let mut shell = Shell::new(Subshell::L1);
        shell
            .set_nonradiative_transitions(
                &["L1L2M4", "L1L2M5", "L1L3M5", "L1M1M1"],
                &[1.0, 1.0, 2.0, 4.0],
            )
            .unwrap();
        let ck = shell.coster_kronig_ratios();
        assert_eq!(ck.len(), 2);
        assert_relative_eq!(ck[&Subshell::L2]["L1L2M5"], 0.5);
        assert_relative_eq!(ck[&Subshell::L3]["L1L3M5"], 1.0);
        let auger = shell.auger_ratios();
        assert_eq!(auger.len(), 1);
        assert_relative_eq!(auger["L1M1M1"], 1.0);
        assert_relative_eq!(shell.nonradiative_ratios().values().sum::<f64>(), 1.0, epsilon = 1e-15);
    }

    #[test]
    fn test_shell_constants() {
        let mut shell = Shell::new(Subshell::L1);
        shell
            .set_shell_constants(&["omega", "f12", "f13"], &[0.1, 0.3, 0.5])
            .unwrap();
        assert_eq!(shell.fluorescence_yield(), 0.1);
        assert_eq!(shell.coster_kronig_yields()[&Subshell::L2], 0.3);
        assert_relative_eq!(shell.auger_yield(), 0.1, epsilon = 1e-15);
        let constants = shell.shell_constants();
        assert_eq!(constants["f13"], 0.5);
    }

    #[test]
    fn test_setters_reject_bad_input() {
        let mut shell = Shell::new(Subshell::L2);
        assert!(matches!(
            shell.set_radiative_transitions(&["L2M1"], &[1.0, 2.0]),
            Err(XrayFluoError::LengthMismatch { .. })
        ));
        // transition toward a more bound subshell
        assert!(matches!(
            shell.set_radiative_transitions(&["L2L1"], &[1.0]),
            Err(XrayFluoError::InvalidLabel { .. })
        ));
        // label belongs to another subshell
        assert!(shell.set_radiative_transitions(&["L3M5"], &[1.0]).is_err());
        assert!(shell.set_radiative_transitions(&["L2M4"], &[0.0]).is_err());
        assert!(shell.set_radiative_transitions(&["L2M4"], &[-1.0]).is_err());
        assert!(shell.set_nonradiative_transitions(&["L2M4"], &[1.0]).is_err());
        // f21 points backwards, f13 is not this subshell's constant
        assert!(shell.set_shell_constants(&["f21"], &[0.1]).is_err());
        assert!(shell.set_shell_constants(&["f13"], &[0.1]).is_err());
        assert!(shell.set_shell_constants(&["omega", "f23"], &[0.8, 0.3]).is_err());
        assert!(shell.set_shell_constants(&["omega"], &[1.5]).is_err());
        // failed calls leave the shell untouched
        assert!(shell.radiative_transitions().is_empty());
        assert_eq!(shell.fluorescence_yield(), 0.0);
    }

    #[test]
    fn test_map_setters() {
        let mut shell = Shell::new(Subshell::K);
        let ratios: BTreeMap<String, f64> =
            [("KL2".to_string(), 1.0), ("KL3".to_string(), 1.0)].into();
        shell.set_radiative_transitions_map(&ratios).unwrap();
        assert_relative_eq!(shell.fluorescence_ratios()["KL2"], 0.5);

        let constants: BTreeMap<String, f64> = [("omega".to_string(), 0.3)].into();
        shell.set_shell_constants_map(&constants).unwrap();
        assert_eq!(shell.fluorescence_yield(), 0.3);
        assert!(shell.coster_kronig_yields().is_empty());
    }
}
