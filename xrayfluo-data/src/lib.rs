#![no_std]

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

/// Everything the fluorescence core needs to know about one element, as handed
/// over by a data loader (EPDL97 readers, shell-constant files, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementRecord {
    pub name: String,
    pub atomic_number: u16,
    pub atomic_mass: f64,
    /// Density in g/cm³. `None` keeps the library default.
    pub density: Option<f64>,
    pub binding_energies: Vec<BindingEnergyRecord>,
    pub attenuation: Option<AttenuationRecord>,
    pub partial_photoelectric: Vec<PartialPhotoelectricRecord>,
    pub shell_constants: Vec<ShellConstantsRecord>,
    pub radiative: Vec<TransitionRecord>,
    pub nonradiative: Vec<TransitionRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingEnergyRecord {
    pub subshell: String,
    /// keV
    pub energy: f64,
}

/// Total mass attenuation table on a common energy grid (keV, cm²/g).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttenuationRecord {
    pub energy: Vec<f64>,
    pub photoelectric: Vec<f64>,
    pub coherent: Vec<f64>,
    pub incoherent: Vec<f64>,
    /// Empty when the source library has no pair production column.
    pub pair: Vec<f64>,
}

/// Partial photoelectric cross section of one subshell on its own grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartialPhotoelectricRecord {
    pub subshell: String,
    pub energy: Vec<f64>,
    pub value: Vec<f64>,
}

/// Fluorescence and Coster-Kronig yields of one subshell.
///
/// `constants` holds `("omega", w)` and `("f12", f)`-style pairs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellConstantsRecord {
    pub subshell: String,
    pub constants: Vec<(String, f64)>,
}

/// Relative transition rates of one subshell, not necessarily normalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub subshell: String,
    pub labels: Vec<String>,
    pub rates: Vec<f64>,
}
