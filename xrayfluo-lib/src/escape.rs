//! Detector escape peaks: fluorescence of the detector material that leaves
//! through the entrance face and removes its energy from the measured photon.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::deboer::de_boer_w;
use crate::error::{Result, XrayFluoError};
use crate::expint::en;
use crate::interp::validate_energy;
use crate::lines::EmissionLines;
use crate::registry::Elements;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EscapeOptions {
    /// Lines closer than this (keV) are merged into one escape peak.
    pub energy_threshold: f64,
    /// Escape peaks weaker than this are dropped.
    pub intensity_threshold: f64,
    /// Number of strongest escape peaks kept.
    pub max_lines: usize,
    /// Angle between the incident beam and the detector surface, degrees.
    pub angle_degrees: f64,
    /// Detector mass thickness in g/cm²; 0 means infinitely thick.
    pub thickness: f64,
}

impl Default for EscapeOptions {
    fn default() -> Self {
        Self {
            energy_threshold: 0.010,
            intensity_threshold: 1.0e-7,
            max_lines: 4,
            angle_degrees: 90.0,
            thickness: 0.0,
        }
    }
}

impl EscapeOptions {
    fn validate(&self) -> Result<()> {
        let non_negative = [
            ("energy_threshold", self.energy_threshold),
            ("intensity_threshold", self.intensity_threshold),
            ("thickness", self.thickness),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(XrayFluoError::invalid(format!(
                    "{name} must be finite and >= 0, got {value}"
                )));
            }
        }
        if !(self.angle_degrees > 0.0 && self.angle_degrees <= 90.0) {
            return Err(XrayFluoError::invalid(format!(
                "angle must be in (0, 90] degrees, got {}",
                self.angle_degrees
            )));
        }
        Ok(())
    }
}

/// Fraction of the photons created along the incident path that leave
/// through the entrance face.
///
/// `mu0` is the incident attenuation per unit depth, `mu1` the attenuation of
/// the fluorescence photon, `thickness` the layer depth (0 for a thick layer).
pub fn escape_probability(mu0: f64, mu1: f64, thickness: f64) -> Result<f64> {
    if !(mu0 > 0.0 && mu0.is_finite() && mu1 > 0.0 && mu1.is_finite()) {
        return Err(XrayFluoError::invalid(format!(
            "attenuation coefficients must be finite and > 0, got {mu0} and {mu1}"
        )));
    }
    let p = if thickness == 0.0 {
        0.5 * (1.0 - (mu1 / mu0) * (mu0 / mu1).ln_1p())
    } else {
        let front = (-mu0 * thickness).exp() * en(2, mu1 * thickness)?;
        0.5 * (1.0 - front - mu1 * de_boer_w(mu0, mu1, thickness)?)
    };
    Ok(p.clamp(0.0, 0.5))
}

#[derive(Debug)]
struct EscapePeak {
    label: String,
    energy: f64,
    rate: f64,
}

/// Greedy merge, strongest first: a peak joins the first group whose energy
/// lies within `threshold`, moving it to the rate-weighted mean.
fn merge_peaks(mut peaks: Vec<EscapePeak>, threshold: f64) -> Vec<EscapePeak> {
    peaks.sort_by(|a, b| b.rate.total_cmp(&a.rate).then_with(|| a.label.cmp(&b.label)));
    let mut groups: Vec<EscapePeak> = Vec::new();
    for peak in peaks {
        match groups
            .iter_mut()
            .find(|g| (g.energy - peak.energy).abs() < threshold)
        {
            Some(group) => {
                let rate = group.rate + peak.rate;
                group.energy = (group.energy * group.rate + peak.energy * peak.rate) / rate;
                group.rate = rate;
            }
            None => groups.push(peak),
        }
    }
    groups
}

/// Merge, drop peaks under the intensity threshold and keep the `max_lines`
/// strongest of what remains.
fn select_peaks(peaks: Vec<EscapePeak>, options: &EscapeOptions) -> Vec<EscapePeak> {
    let mut merged = merge_peaks(peaks, options.energy_threshold);
    merged.retain(|p| p.rate >= options.intensity_threshold);
    // merging can reorder groups
    merged.sort_by(|a, b| b.rate.total_cmp(&a.rate).then_with(|| a.label.cmp(&b.label)));
    merged.truncate(options.max_lines);
    merged
}

impl Elements {
    /// Escape peaks of a detector of the given mass-fraction `composition` for
    /// an incident photon of `energy` (keV).
    ///
    /// Each peak is keyed `"<element>_<line>esc"` and carries the escape energy
    /// and its rate per photon interacting in the detector.
    pub fn escape<S: AsRef<str>>(
        &self,
        composition: &[(S, f64)],
        energy: f64,
        options: &EscapeOptions,
    ) -> Result<EmissionLines> {
        validate_energy(energy)?;
        options.validate()?;
        let composition = self.normalized_composition(composition)?;
        let names: Vec<(&str, f64)> = composition.iter().map(|(e, w)| (e.name(), *w)).collect();

        let mu_total = |e: f64| -> Result<f64> {
            Ok(self.mixture_mass_attenuation(&names, &[e])?[0].total)
        };
        let incident = mu_total(energy)?;
        if incident <= 0.0 {
            return Ok(EmissionLines::new());
        }
        let mu0 = incident / options.angle_degrees.to_radians().sin();

        let mut peaks = Vec::new();
        for (element, fraction) in &composition {
            let absorbed = fraction * element.mass_attenuation(energy)?.photoelectric / incident;
            if absorbed <= 0.0 {
                continue;
            }
            let lines = element.photoelectric_excitation_factors(energy, 1.0)?;
            for (label, line) in lines.iter() {
                let escape_energy = energy - line.energy;
                if escape_energy <= 0.0 || line.rate <= 0.0 {
                    continue;
                }
                let mu1 = mu_total(line.energy)?;
                if mu1 <= 0.0 {
                    continue;
                }
                let p = escape_probability(mu0, mu1, options.thickness)?;
                peaks.push(EscapePeak {
                    label: format!("{}_{label}esc", element.name()),
                    energy: escape_energy,
                    rate: absorbed * line.rate * p,
                });
            }
        }

        let merged = select_peaks(peaks, options);
        debug!(energy, peaks = merged.len(), "escape peaks");

        let mut out = EmissionLines::new();
        for peak in merged {
            out.add(&peak.label, peak.energy, peak.rate);
        }
        Ok(out)
    }
}
