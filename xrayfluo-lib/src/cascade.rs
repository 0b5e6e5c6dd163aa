//! Vacancy cascade: initial photoelectric vacancies, Coster-Kronig
//! redistribution and multi-generation emission.
//!
//! Every transition moves a vacancy to a subshell of strictly greater rank, so
//! a vacancy can be handed on at most `Subshell::COUNT - 1` times and
//! [`FULL_CASCADE`] generations always exhaust the chain.

use std::collections::BTreeMap;

use tracing::debug;

use crate::attenuation::Process;
use crate::element::{Element, LineTable};
use crate::error::Result;
use crate::lines::EmissionLines;
use crate::subshell::Subshell;
use crate::vacancy::VacancyDistribution;

/// Generation count that always follows a vacancy to the end of its chain.
pub const FULL_CASCADE: usize = Subshell::COUNT;

impl Element {
    /// Probability that a photon of `energy` absorbed by the photoelectric
    /// effect leaves its vacancy in each subshell.
    ///
    /// Subshells with a partial cross section get `partial / total`, or 0 above
    /// `energy`. What the partials leave of the total goes to `REST`. When the
    /// partials exceed the tabulated total they are normalized by their own
    /// sum instead.
    pub fn initial_photoelectric_vacancy_distribution(
        &self,
        energy: f64,
    ) -> Result<VacancyDistribution> {
        let total = self.coefficient(Process::Photoelectric, energy)?;

        let mut partials = Vec::with_capacity(self.partial_photoelectric_curves().len());
        for subshell in self.partial_photoelectric_curves().keys() {
            partials.push((*subshell, self.partial_photoelectric(*subshell, energy)?));
        }
        let sum: f64 = partials.iter().map(|(_, p)| p).sum();
        let denominator = total.max(sum);

        let mut distribution = VacancyDistribution::new();
        if denominator <= 0.0 {
            return Ok(distribution);
        }
        if sum > total {
            debug!(
                element = %self.name(),
                energy,
                sum,
                total,
                "partial photoelectric cross sections exceed the total, normalizing by their sum"
            );
        }
        for (subshell, partial) in partials {
            distribution.set(subshell, partial / denominator)?;
        }
        distribution.set_rest(((total - sum) / denominator).max(0.0))?;
        Ok(distribution)
    }

    pub fn initial_photoelectric_vacancy_distribution_many(
        &self,
        energies: &[f64],
    ) -> Result<Vec<VacancyDistribution>> {
        energies
            .iter()
            .map(|&e| self.initial_photoelectric_vacancy_distribution(e))
            .collect()
    }

    /// One Coster-Kronig generation: each destination `j` receives
    /// `p_i·f[i→j]` and `i` keeps `p_i·(1 - Σ_j f[i→j])`. The total, `REST`
    /// included, is unchanged.
    pub fn cascade_modified_vacancy_distribution(
        &self,
        distribution: &VacancyDistribution,
    ) -> VacancyDistribution {
        let mut modified = VacancyDistribution::with_rest(distribution.rest());
        for (subshell, p) in distribution.iter() {
            let Some(shell) = self.shell(subshell) else {
                modified.add(subshell, p);
                continue;
            };
            let yields = shell.coster_kronig_yields();
            modified.add(subshell, p * (1.0 - shell.coster_kronig_total()));
            for (dest, f) in yields {
                modified.add(*dest, p * f);
            }
        }
        modified
    }

    /// Emission lines from a vacancy distribution.
    ///
    /// Generation 0 emits from `distribution` itself: subshell `s` with
    /// probability `p` gives line `s→d` with rate `p·r·ω_s` (`p·r` when
    /// `use_fluorescence_yield` is false) at energy `E(s) - E(d)`. Each further
    /// generation, up to `cascade`, emits from the vacancies the previous one
    /// created: `p·f[i→j]` by Coster-Kronig transfer and `p·ω·r` at the
    /// destination of every radiative line. Auger decays end the chain.
    pub fn x_ray_lines_from_vacancy_distribution(
        &self,
        distribution: &VacancyDistribution,
        cascade: usize,
        use_fluorescence_yield: bool,
    ) -> EmissionLines {
        let table = self.line_table();
        let mut out = EmissionLines::new();
        let mut pending: BTreeMap<Subshell, f64> =
            distribution.iter().filter(|(_, p)| *p > 0.0).collect();

        let generations = cascade.min(FULL_CASCADE);
        for generation in 0..=generations {
            self.emit(table, &pending, use_fluorescence_yield, &mut out);
            if generation == generations {
                break;
            }
            pending = self.next_generation(table, &pending);
            if pending.is_empty() {
                break;
            }
        }
        out
    }

    fn emit(
        &self,
        table: &LineTable,
        pending: &BTreeMap<Subshell, f64>,
        use_fluorescence_yield: bool,
        out: &mut EmissionLines,
    ) {
        for (subshell, p) in pending {
            let (Some(shell), Some(lines)) = (self.shell(*subshell), table.get(subshell)) else {
                continue;
            };
            let omega = if use_fluorescence_yield {
                shell.fluorescence_yield()
            } else {
                1.0
            };
            for line in lines {
                let rate = p * line.ratio * omega;
                if rate <= 0.0 {
                    continue;
                }
                match (line.flag, line.energy) {
                    (None, Some(energy)) => out.add(&line.label, energy, rate),
                    (Some(flag), energy) => out.add_flagged(&line.label, energy, rate, flag),
                    (None, None) => {}
                }
            }
        }
    }

    /// Vacancies handed on by the decay of `pending`.
    fn next_generation(
        &self,
        table: &LineTable,
        pending: &BTreeMap<Subshell, f64>,
    ) -> BTreeMap<Subshell, f64> {
        let mut next: BTreeMap<Subshell, f64> = BTreeMap::new();
        for (subshell, p) in pending {
            let Some(shell) = self.shell(*subshell) else {
                continue;
            };
            for (dest, f) in shell.coster_kronig_yields() {
                *next.entry(*dest).or_insert(0.0) += p * f;
            }
            let radiative = p * shell.fluorescence_yield();
            if radiative > 0.0 {
                for line in table.get(subshell).into_iter().flatten() {
                    *next.entry(line.destination).or_insert(0.0) += radiative * line.ratio;
                }
            }
        }
        next.retain(|_, p| *p > 0.0);
        next
    }

    // --- cascade cache ---

    /// Use the cascade cache for excitation factors, filling it lazily on the
    /// next query. Disabling keeps a filled cache but stops using it.
    pub fn set_cascade_cache_enabled(&mut self, enabled: bool) {
        self.cascade_cache_enabled = enabled;
    }

    pub fn is_cascade_cache_enabled(&self) -> bool {
        self.cascade_cache_enabled
    }

    /// Compute the full-cascade emission of a unit vacancy in every subshell
    /// that has decay data, keep it until [`Element::empty_cascade_cache`] and
    /// enable its use.
    pub fn fill_cascade_cache(&mut self) {
        self.unit_cascade_lines();
        self.cascade_cache_enabled = true;
    }

    /// Drop the cascade cache and stop filling it lazily.
    pub fn empty_cascade_cache(&mut self) {
        self.cascade_cache.take();
        self.cascade_cache_enabled = false;
    }

    pub fn is_cascade_cache_filled(&self) -> bool {
        self.cascade_cache.get().is_some()
    }

    pub(crate) fn unit_cascade_lines(&self) -> &BTreeMap<Subshell, EmissionLines> {
        self.cascade_cache.get_or_init(|| {
            let cache: BTreeMap<Subshell, EmissionLines> = self
                .shells()
                .map(|shell| {
                    let unit: VacancyDistribution =
                        std::iter::once((shell.subshell(), 1.0)).collect();
                    (
                        shell.subshell(),
                        self.x_ray_lines_from_vacancy_distribution(&unit, FULL_CASCADE, true),
                    )
                })
                .collect();
            debug!(element = %self.name(), subshells = cache.len(), "filled cascade cache");
            cache
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn two_level() -> Element {
        let mut el = Element::new("Xx", 30, 65.0).unwrap();
        el.set_binding_energies(&["K", "L1", "L2", "L3"], &[10.0, 2.0, 1.8, 1.5])
            .unwrap();
        el.set_shell_constants(Subshell::K, &["omega"], &[0.5]).unwrap();
        el.set_radiative_transitions(Subshell::K, &["KL3"], &[1.0]).unwrap();
        el.set_shell_constants(Subshell::L1, &["omega", "f12"], &[0.0, 0.3])
            .unwrap();
        el.set_shell_constants(Subshell::L3, &["omega"], &[0.01]).unwrap();
        el.set_radiative_transitions(Subshell::L3, &["L3M5"], &[1.0]).unwrap();
        el
    }

    #[test]
    fn test_coster_kronig_step() {
        let el = two_level();
        let d = VacancyDistribution::from_labels(&["L1", "L2"], &[1.0, 0.0]).unwrap();
        let m = el.cascade_modified_vacancy_distribution(&d);
        assert_relative_eq!(m.get(Subshell::L1), 0.7, epsilon = 1e-15);
        assert_relative_eq!(m.get(Subshell::L2), 0.3, epsilon = 1e-15);
        assert_relative_eq!(m.total(), d.total(), epsilon = 1e-15);
    }

    #[test]
    fn test_zero_generations() {
        let el = two_level();
        let d = VacancyDistribution::from_labels(&["K"], &[1.0]).unwrap();
        let lines = el.x_ray_lines_from_vacancy_distribution(&d, 0, true);
        assert_eq!(lines.len(), 1);
        let kl3 = lines.get("KL3").unwrap();
        assert_relative_eq!(kl3.energy, 8.5);
        assert_relative_eq!(kl3.rate, 0.5);

        let raw = el.x_ray_lines_from_vacancy_distribution(&d, 0, false);
        assert_relative_eq!(raw.get("KL3").unwrap().rate, 1.0);
    }

    #[test]
    fn test_radiative_vacancy_is_followed() {
        let el = two_level();
        let d = VacancyDistribution::from_labels(&["K"], &[1.0]).unwrap();
        let lines = el.x_ray_lines_from_vacancy_distribution(&d, FULL_CASCADE, true);
        // the L3 hole left by KL3 emits L3M5, whose M5 has no binding energy
        assert!(lines.get("L3M5").is_none());
        assert_eq!(lines.flagged().len(), 1);
        assert_relative_eq!(lines.flagged()[0].rate, 0.5 * 0.01, epsilon = 1e-15);
    }
}
