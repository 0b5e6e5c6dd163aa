use std::collections::BTreeMap;
use std::sync::OnceLock;

use tracing::{debug, warn};

use crate::attenuation::{
    AbsorptionEdge, AttenuationTable, EdgeDetection, MassAttenuation, Process, TabulatedCurve,
};
use crate::error::{Result, XrayFluoError};
use crate::interp::validate_energy;
use crate::lines::{EmissionLines, LineFlag};
use crate::shell::Shell;
use crate::subshell::Subshell;

/// A radiative line of one subshell with the energy resolved from the binding
/// energies. Rebuilt whenever binding energies or radiative ratios change.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BaseLine {
    pub label: String,
    pub destination: Subshell,
    pub ratio: f64,
    pub energy: Option<f64>,
    pub flag: Option<LineFlag>,
}

pub(crate) type LineTable = BTreeMap<Subshell, Vec<BaseLine>>;

/// One chemical element: binding energies, decay data per subshell, mass
/// attenuation tables and the derived emission-line caches.
#[derive(Debug, Clone)]
pub struct Element {
    name: String,
    atomic_number: u16,
    atomic_mass: f64,
    density: f64,
    binding_energies: BTreeMap<Subshell, f64>,
    shells: BTreeMap<Subshell, Shell>,
    attenuation: Option<AttenuationTable>,
    partial_photoelectric: BTreeMap<Subshell, TabulatedCurve>,
    line_table: OnceLock<LineTable>,
    pub(crate) cascade_cache: OnceLock<BTreeMap<Subshell, EmissionLines>>,
    pub(crate) cascade_cache_enabled: bool,
}

impl Element {
    pub fn new(name: &str, atomic_number: u16, atomic_mass: f64) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(XrayFluoError::invalid("element name must not be empty"));
        }
        if atomic_number == 0 {
            return Err(XrayFluoError::invalid(format!(
                "{name}: atomic number must be > 0"
            )));
        }
        if !atomic_mass.is_finite() || atomic_mass <= 0.0 {
            return Err(XrayFluoError::invalid(format!(
                "{name}: atomic mass must be finite and > 0, got {atomic_mass}"
            )));
        }
        Ok(Self {
            name: name.trim().to_string(),
            atomic_number,
            atomic_mass,
            density: 1.0,
            binding_energies: BTreeMap::new(),
            shells: BTreeMap::new(),
            attenuation: None,
            partial_photoelectric: BTreeMap::new(),
            line_table: OnceLock::new(),
            cascade_cache: OnceLock::new(),
            cascade_cache_enabled: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn atomic_number(&self) -> u16 {
        self.atomic_number
    }

    pub fn atomic_mass(&self) -> f64 {
        self.atomic_mass
    }

    /// Density in g/cm³ (1.0 unless set).
    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn set_density(&mut self, density: f64) -> Result<()> {
        if !density.is_finite() || density <= 0.0 {
            return Err(XrayFluoError::invalid(format!(
                "{}: density must be finite and > 0, got {density}",
                self.name
            )));
        }
        self.density = density;
        Ok(())
    }

    /// Clear the derived emission lines and the cascade cache.
    pub fn invalidate(&mut self) {
        self.line_table = OnceLock::new();
        self.cascade_cache = OnceLock::new();
    }

    /// Shell data changed: the line table is rebuilt on next use, the cascade
    /// cache is kept until emptied explicitly.
    fn shell_data_changed(&mut self, what: &str) {
        self.line_table = OnceLock::new();
        if self.cascade_cache.get().is_some() {
            warn!(
                element = %self.name,
                "{what} changed while the cascade cache is filled; call empty_cascade_cache()"
            );
        }
    }

    // --- binding energies ---

    /// Replace the binding energies (keV) from parallel slices.
    pub fn set_binding_energies<S: AsRef<str>>(&mut self, labels: &[S], values: &[f64]) -> Result<()> {
        if labels.len() != values.len() {
            return Err(XrayFluoError::LengthMismatch {
                what: "binding energies",
                expected: labels.len(),
                actual: values.len(),
            });
        }
        let mut energies = BTreeMap::new();
        for (label, &energy) in labels.iter().zip(values) {
            let subshell: Subshell = label.as_ref().parse()?;
            if !energy.is_finite() || energy <= 0.0 {
                return Err(XrayFluoError::invalid(format!(
                    "{} {subshell} binding energy must be finite and > 0, got {energy}",
                    self.name
                )));
            }
            energies.insert(subshell, energy);
        }
        self.binding_energies = energies;
        self.shell_data_changed("binding energies");
        Ok(())
    }

    pub fn set_binding_energies_map(&mut self, energies: &BTreeMap<String, f64>) -> Result<()> {
        let (labels, values): (Vec<&str>, Vec<f64>) =
            energies.iter().map(|(k, v)| (k.as_str(), *v)).unzip();
        self.set_binding_energies(&labels, &values)
    }

    pub fn binding_energies(&self) -> &BTreeMap<Subshell, f64> {
        &self.binding_energies
    }

    pub fn binding_energy(&self, subshell: Subshell) -> Option<f64> {
        self.binding_energies.get(&subshell).copied()
    }

    /// Subshells that a photon of `energy` can ionize (binding <= energy), in
    /// rank order.
    pub fn excited_shells(&self, energy: f64) -> Vec<Subshell> {
        self.binding_energies
            .iter()
            .filter(|(_, b)| **b <= energy)
            .map(|(s, _)| *s)
            .collect()
    }

    // --- shell model ---

    fn shell_entry(&self, subshell: Subshell) -> Shell {
        self.shells
            .get(&subshell)
            .cloned()
            .unwrap_or_else(|| Shell::new(subshell))
    }

    fn store_shell(&mut self, shell: Shell, what: &str) {
        self.shells.insert(shell.subshell(), shell);
        self.shell_data_changed(what);
    }

    pub fn set_shell_constants<S: AsRef<str>>(
        &mut self,
        subshell: Subshell,
        keys: &[S],
        values: &[f64],
    ) -> Result<()> {
        let mut shell = self.shell_entry(subshell);
        shell.set_shell_constants(keys, values)?;
        self.store_shell(shell, "shell constants");
        Ok(())
    }

    pub fn set_shell_constants_map(
        &mut self,
        subshell: Subshell,
        constants: &BTreeMap<String, f64>,
    ) -> Result<()> {
        let mut shell = self.shell_entry(subshell);
        shell.set_shell_constants_map(constants)?;
        self.store_shell(shell, "shell constants");
        Ok(())
    }

    pub fn set_radiative_transitions<S: AsRef<str>>(
        &mut self,
        subshell: Subshell,
        labels: &[S],
        values: &[f64],
    ) -> Result<()> {
        let mut shell = self.shell_entry(subshell);
        shell.set_radiative_transitions(labels, values)?;
        self.store_shell(shell, "radiative transitions");
        Ok(())
    }

    pub fn set_radiative_transitions_map(
        &mut self,
        subshell: Subshell,
        ratios: &BTreeMap<String, f64>,
    ) -> Result<()> {
        let mut shell = self.shell_entry(subshell);
        shell.set_radiative_transitions_map(ratios)?;
        self.store_shell(shell, "radiative transitions");
        Ok(())
    }

    pub fn set_nonradiative_transitions<S: AsRef<str>>(
        &mut self,
        subshell: Subshell,
        labels: &[S],
        values: &[f64],
    ) -> Result<()> {
        let mut shell = self.shell_entry(subshell);
        shell.set_nonradiative_transitions(labels, values)?;
        self.store_shell(shell, "non-radiative transitions");
        Ok(())
    }

    pub fn set_nonradiative_transitions_map(
        &mut self,
        subshell: Subshell,
        ratios: &BTreeMap<String, f64>,
    ) -> Result<()> {
        let mut shell = self.shell_entry(subshell);
        shell.set_nonradiative_transitions_map(ratios)?;
        self.store_shell(shell, "non-radiative transitions");
        Ok(())
    }

    pub fn shell(&self, subshell: Subshell) -> Option<&Shell> {
        self.shells.get(&subshell)
    }

    pub fn shells(&self) -> impl Iterator<Item = &Shell> {
        self.shells.values()
    }

    fn require_shell(&self, subshell: Subshell) -> Result<&Shell> {
        self.shells.get(&subshell).ok_or_else(|| {
            XrayFluoError::UnknownSubshell(format!("{} has no data for {subshell}", self.name))
        })
    }

    pub fn fluorescence_ratios(&self, subshell: Subshell) -> Result<BTreeMap<String, f64>> {
        Ok(self.require_shell(subshell)?.fluorescence_ratios())
    }

    pub fn auger_ratios(&self, subshell: Subshell) -> Result<BTreeMap<String, f64>> {
        Ok(self.require_shell(subshell)?.auger_ratios())
    }

    pub fn coster_kronig_ratios(
        &self,
        subshell: Subshell,
    ) -> Result<BTreeMap<Subshell, BTreeMap<String, f64>>> {
        Ok(self.require_shell(subshell)?.coster_kronig_ratios())
    }

    // --- attenuation ---

    pub fn set_mass_attenuation(&mut self, table: AttenuationTable) {
        self.attenuation = Some(table);
    }

    pub fn attenuation_table(&self) -> Option<&AttenuationTable> {
        self.attenuation.as_ref()
    }

    fn require_attenuation(&self) -> Result<&AttenuationTable> {
        self.attenuation.as_ref().ok_or_else(|| {
            XrayFluoError::InvalidTable(format!("{} has no mass attenuation table", self.name))
        })
    }

    /// Mass attenuation coefficients at `energy` (keV).
    pub fn mass_attenuation(&self, energy: f64) -> Result<MassAttenuation> {
        self.require_attenuation()?.mass_attenuation(energy)
    }

    pub fn mass_attenuation_many(&self, energies: &[f64]) -> Result<Vec<MassAttenuation>> {
        self.require_attenuation()?.mass_attenuation_many(energies)
    }

    pub fn coefficient(&self, process: Process, energy: f64) -> Result<f64> {
        self.require_attenuation()?.coefficient(process, energy)
    }

    pub fn set_partial_photoelectric(&mut self, subshell: Subshell, curve: TabulatedCurve) {
        self.partial_photoelectric.insert(subshell, curve);
    }

    pub fn partial_photoelectric_curves(&self) -> &BTreeMap<Subshell, TabulatedCurve> {
        &self.partial_photoelectric
    }

    /// Partial photoelectric coefficient of `subshell` at `energy`; 0 below
    /// the subshell's binding energy or without a binding energy.
    pub fn partial_photoelectric(&self, subshell: Subshell, energy: f64) -> Result<f64> {
        validate_energy(energy)?;
        let Some(curve) = self.partial_photoelectric.get(&subshell) else {
            return Ok(0.0);
        };
        match self.binding_energy(subshell) {
            Some(binding) if binding <= energy => curve.value_at(energy),
            _ => Ok(0.0),
        }
    }

    /// Edges found in the photoelectric table, each assigned to the subshell
    /// whose binding energy is nearest within `tolerance` (relative).
    pub fn matched_edges(
        &self,
        options: &EdgeDetection,
        tolerance: f64,
    ) -> Result<Vec<(Subshell, AbsorptionEdge)>> {
        let edges = self.require_attenuation()?.extract_edge_energies(options);
        Ok(edges
            .into_iter()
            .filter_map(|edge| {
                self.binding_energies
                    .iter()
                    .map(|(s, b)| (*s, ((edge.energy - b) / b).abs()))
                    .filter(|(_, distance)| *distance <= tolerance)
                    .min_by(|a, b| a.1.total_cmp(&b.1))
                    .map(|(s, _)| (s, edge))
            })
            .collect())
    }

    // --- derived lines ---

    /// Radiative lines per origin subshell with resolved energies.
    pub(crate) fn line_table(&self) -> &LineTable {
        self.line_table.get_or_init(|| self.build_line_table())
    }

    fn build_line_table(&self) -> LineTable {
        let mut table = LineTable::new();
        for (subshell, shell) in &self.shells {
            let origin = self.binding_energy(*subshell);
            let lines: Vec<BaseLine> = shell
                .radiative_transitions()
                .iter()
                .filter_map(|t| {
                    let destination = *t.destinations.first()?;
                    let energy = match (origin, self.binding_energy(destination)) {
                        (Some(a), Some(b)) => Some(a - b),
                        _ => None,
                    };
                    let flag = match energy {
                        None => Some(LineFlag::MissingBindingEnergy),
                        Some(e) if e <= 0.0 => Some(LineFlag::NonPositiveEnergy),
                        Some(_) => None,
                    };
                    if let Some(flag) = flag {
                        warn!(element = %self.name, line = %t.label, ?energy, ?flag, "line excluded");
                    }
                    Some(BaseLine {
                        label: t.label.clone(),
                        destination,
                        ratio: t.rate,
                        energy,
                        flag,
                    })
                })
                .collect();
            table.insert(*subshell, lines);
        }
        debug!(element = %self.name, subshells = table.len(), "built emission line table");
        table
    }

    /// Unit-rate emission lines of every subshell (no cascade), keyed by
    /// origin subshell. Flagged lines are left out.
    pub fn x_ray_lines(&self) -> BTreeMap<Subshell, EmissionLines> {
        self.line_table()
            .iter()
            .map(|(s, lines)| {
                let mut out = EmissionLines::new();
                for line in lines {
                    if let (None, Some(energy)) = (line.flag, line.energy) {
                        out.add(&line.label, energy, line.ratio);
                    }
                }
                (*s, out)
            })
            .collect()
    }
}
