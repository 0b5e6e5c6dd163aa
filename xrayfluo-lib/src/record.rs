use tracing::debug;
use xrayfluo_data::ElementRecord;

use crate::attenuation::{AttenuationTable, TabulatedCurve};
use crate::element::Element;
use crate::error::Result;
use crate::registry::Elements;
use crate::subshell::Subshell;

impl Element {
    /// Build an element from a loader record. Every field goes through the
    /// same validating setters as manual construction.
    pub fn from_record(record: &ElementRecord) -> Result<Self> {
        let mut element = Element::new(&record.name, record.atomic_number, record.atomic_mass)?;
        if let Some(density) = record.density {
            element.set_density(density)?;
        }

        let (labels, energies): (Vec<&str>, Vec<f64>) = record
            .binding_energies
            .iter()
            .map(|b| (b.subshell.as_str(), b.energy))
            .unzip();
        element.set_binding_energies(&labels, &energies)?;

        if let Some(att) = &record.attenuation {
            element.set_mass_attenuation(AttenuationTable::new(
                att.energy.clone(),
                att.photoelectric.clone(),
                att.coherent.clone(),
                att.incoherent.clone(),
                att.pair.clone(),
            )?);
        }
        for partial in &record.partial_photoelectric {
            let subshell: Subshell = partial.subshell.parse()?;
            element.set_partial_photoelectric(
                subshell,
                TabulatedCurve::new(partial.energy.clone(), partial.value.clone())?,
            );
        }

        for constants in &record.shell_constants {
            let subshell: Subshell = constants.subshell.parse()?;
            let (keys, values): (Vec<&str>, Vec<f64>) = constants
                .constants
                .iter()
                .map(|(k, v)| (k.as_str(), *v))
                .unzip();
            element.set_shell_constants(subshell, &keys, &values)?;
        }
        for transitions in &record.radiative {
            let subshell: Subshell = transitions.subshell.parse()?;
            element.set_radiative_transitions(subshell, &transitions.labels, &transitions.rates)?;
        }
        for transitions in &record.nonradiative {
            let subshell: Subshell = transitions.subshell.parse()?;
            element.set_nonradiative_transitions(subshell, &transitions.labels, &transitions.rates)?;
        }

        debug!(
            element = %element.name(),
            shells = element.shells().count(),
            "loaded element record"
        );
        Ok(element)
    }
}

impl Elements {
    /// Registry of every record; the first invalid record aborts the load.
    pub fn from_records(records: &[ElementRecord]) -> Result<Self> {
        records.iter().map(Element::from_record).collect()
    }
}
