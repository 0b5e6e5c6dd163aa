use crate::cascade::FULL_CASCADE;
use crate::element::Element;
use crate::error::{Result, XrayFluoError};
use crate::lines::EmissionLines;

impl Element {
    /// Emission lines per incident photon of `energy` (keV), times `weight`.
    ///
    /// Initial photoelectric vacancies followed through the full cascade. While
    /// the cascade cache is enabled the result is assembled from the cached
    /// unit-vacancy emissions instead.
    pub fn photoelectric_excitation_factors(
        &self,
        energy: f64,
        weight: f64,
    ) -> Result<EmissionLines> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(XrayFluoError::invalid(format!(
                "weight must be finite and >= 0, got {weight}"
            )));
        }
        let distribution = self.initial_photoelectric_vacancy_distribution(energy)?;

        if self.cascade_cache_enabled {
            let cache = self.unit_cascade_lines();
            let mut lines = EmissionLines::new();
            for (subshell, p) in distribution.iter() {
                if p <= 0.0 {
                    continue;
                }
                if let Some(unit) = cache.get(&subshell) {
                    lines.add_scaled(unit, p * weight);
                }
            }
            return Ok(lines);
        }

        let mut lines = self.x_ray_lines_from_vacancy_distribution(&distribution, FULL_CASCADE, true);
        lines.scale(weight);
        Ok(lines)
    }

    /// [`Element::photoelectric_excitation_factors`] over several energies.
    ///
    /// `weights` is either empty (every weight 1) or as long as `energies`.
    /// The output follows the input order.
    pub fn photoelectric_excitation_factors_many(
        &self,
        energies: &[f64],
        weights: &[f64],
    ) -> Result<Vec<EmissionLines>> {
        if !weights.is_empty() && weights.len() != energies.len() {
            return Err(XrayFluoError::LengthMismatch {
                what: "weights",
                expected: energies.len(),
                actual: weights.len(),
            });
        }
        energies
            .iter()
            .enumerate()
            .map(|(i, &energy)| {
                let weight = weights.get(i).copied().unwrap_or(1.0);
                self.photoelectric_excitation_factors(energy, weight)
            })
            .collect()
    }
}
