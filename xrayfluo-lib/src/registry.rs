use std::collections::BTreeMap;

use crate::attenuation::MassAttenuation;
use crate::element::Element;
use crate::error::{Result, XrayFluoError};
use crate::interp::validate_energy;
use crate::lines::EmissionLines;

/// A collection of elements keyed by name.
///
/// Nothing is global: build one per data set (or per test) and pass it to
/// whatever needs element data.
#[derive(Debug, Clone, Default)]
pub struct Elements {
    elements: BTreeMap<String, Element>,
}

impl Elements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `element`, returning the one it replaces.
    pub fn add_element(&mut self, element: Element) -> Option<Element> {
        self.elements.insert(element.name().to_string(), element)
    }

    pub fn remove_element(&mut self, element: &str) -> Result<Element> {
        let name = self.resolve(element)?.to_string();
        self.elements
            .remove(&name)
            .ok_or_else(|| XrayFluoError::UnknownElement(element.to_string()))
    }

    /// Resolve an element identifier (name, case-insensitive name, or atomic
    /// number) to the stored name.
    pub fn resolve(&self, element: &str) -> Result<&str> {
        let element = element.trim();
        // Try as atomic number first
        if let Ok(z) = element.parse::<u16>() {
            if let Some(e) = self.elements.values().find(|e| e.atomic_number() == z) {
                return Ok(e.name());
            }
        }
        if let Some((name, _)) = self.elements.get_key_value(element) {
            return Ok(name);
        }
        self.elements
            .keys()
            .find(|name| name.eq_ignore_ascii_case(element))
            .map(String::as_str)
            .ok_or_else(|| XrayFluoError::UnknownElement(element.to_string()))
    }

    pub fn contains(&self, element: &str) -> bool {
        self.resolve(element).is_ok()
    }

    pub fn element(&self, element: &str) -> Result<&Element> {
        let name = self.resolve(element)?;
        self.elements
            .get(name)
            .ok_or_else(|| XrayFluoError::UnknownElement(element.to_string()))
    }

    pub fn element_mut(&mut self, element: &str) -> Result<&mut Element> {
        let name = self.resolve(element)?.to_string();
        self.elements
            .get_mut(&name)
            .ok_or_else(|| XrayFluoError::UnknownElement(element.to_string()))
    }

    pub fn element_names(&self) -> Vec<&str> {
        self.elements.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Resolve a composition and normalize its mass fractions to sum 1.
    pub(crate) fn normalized_composition<S: AsRef<str>>(
        &self,
        composition: &[(S, f64)],
    ) -> Result<Vec<(&Element, f64)>> {
        if composition.is_empty() {
            return Err(XrayFluoError::invalid("empty composition"));
        }
        let mut total = 0.0;
        for (name, fraction) in composition {
            if !fraction.is_finite() || *fraction <= 0.0 {
                return Err(XrayFluoError::invalid(format!(
                    "mass fraction of {} must be finite and > 0, got {fraction}",
                    name.as_ref()
                )));
            }
            total += fraction;
        }
        composition
            .iter()
            .map(|(name, fraction)| Ok((self.element(name.as_ref())?, fraction / total)))
            .collect()
    }

    /// Mass attenuation coefficients of one element.
    pub fn mass_attenuation(&self, element: &str, energies: &[f64]) -> Result<Vec<MassAttenuation>> {
        self.element(element)?.mass_attenuation_many(energies)
    }

    /// Mass attenuation coefficients of a mixture given as `(element, mass
    /// fraction)` pairs. Fractions are normalized to sum 1.
    pub fn mixture_mass_attenuation<S: AsRef<str>>(
        &self,
        composition: &[(S, f64)],
        energies: &[f64],
    ) -> Result<Vec<MassAttenuation>> {
        let composition = self.normalized_composition(composition)?;
        energies
            .iter()
            .map(|&energy| {
                validate_energy(energy)?;
                let mut mixture = MassAttenuation {
                    energy,
                    ..Default::default()
                };
                for (element, fraction) in &composition {
                    mixture.accumulate(&element.mass_attenuation(energy)?, *fraction);
                }
                Ok(mixture)
            })
            .collect()
    }

    /// Excitation factors of one element; see
    /// [`Element::photoelectric_excitation_factors_many`].
    pub fn excitation_factors(
        &self,
        element: &str,
        energies: &[f64],
        weights: &[f64],
    ) -> Result<Vec<EmissionLines>> {
        self.element(element)?
            .photoelectric_excitation_factors_many(energies, weights)
    }

    /// Line families `("<element> <subshell>", binding energy)` that a photon
    /// of `energy` can excite: subshells with binding energy <= `energy` and
    /// at least one radiative transition. Sorted by binding energy, then label.
    pub fn peak_families<S: AsRef<str>>(
        &self,
        elements: &[S],
        energy: f64,
    ) -> Result<Vec<(String, f64)>> {
        validate_energy(energy)?;
        let mut families: Vec<(String, f64)> = Vec::new();
        for name in elements {
            let element = self.element(name.as_ref())?;
            for subshell in element.excited_shells(energy) {
                let radiative = element
                    .shell(subshell)
                    .is_some_and(|s| !s.radiative_transitions().is_empty());
                let Some(binding) = element.binding_energy(subshell) else {
                    continue;
                };
                let label = format!("{} {subshell}", element.name());
                if radiative && !families.iter().any(|(l, _)| *l == label) {
                    families.push((label, binding));
                }
            }
        }
        families.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        Ok(families)
    }

    // --- cascade cache, per element ---

    pub fn set_cascade_cache_enabled(&mut self, element: &str, enabled: bool) -> Result<()> {
        self.element_mut(element)?.set_cascade_cache_enabled(enabled);
        Ok(())
    }

    pub fn fill_cascade_cache(&mut self, element: &str) -> Result<()> {
        self.element_mut(element)?.fill_cascade_cache();
        Ok(())
    }

    pub fn empty_cascade_cache(&mut self, element: &str) -> Result<()> {
        self.element_mut(element)?.empty_cascade_cache();
        Ok(())
    }

    pub fn is_cascade_cache_filled(&self, element: &str) -> Result<bool> {
        Ok(self.element(element)?.is_cascade_cache_filled())
    }
}

impl FromIterator<Element> for Elements {
    fn from_iter<I: IntoIterator<Item = Element>>(iter: I) -> Self {
        let mut elements = Self::new();
        for element in iter {
            elements.add_element(element);
        }
        elements
    }
}
