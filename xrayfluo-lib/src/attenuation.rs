use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, XrayFluoError};
use crate::interp::{interp_loglog_one, interpolation_indices, validate_energy, validate_table};

/// Photon interaction process of a mass attenuation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Process {
    Photoelectric,
    Coherent,
    Incoherent,
    Pair,
    Total,
}

impl Process {
    /// Processes stored as columns; `Total` is their sum.
    pub const TABULATED: [Process; 4] = [
        Process::Photoelectric,
        Process::Coherent,
        Process::Incoherent,
        Process::Pair,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Process::Photoelectric => "photoelectric",
            Process::Coherent => "coherent",
            Process::Incoherent => "compton",
            Process::Pair => "pair",
            Process::Total => "total",
        }
    }
}

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Process {
    type Err = XrayFluoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "photoelectric" | "photo" => Ok(Process::Photoelectric),
            "coherent" | "rayleigh" => Ok(Process::Coherent),
            "incoherent" | "compton" => Ok(Process::Incoherent),
            "pair" => Ok(Process::Pair),
            "total" => Ok(Process::Total),
            _ => Err(XrayFluoError::invalid(format!("unknown process: {s}"))),
        }
    }
}

/// Mass attenuation coefficients (cm²/g) at one energy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MassAttenuation {
    pub energy: f64,
    pub photoelectric: f64,
    pub coherent: f64,
    pub incoherent: f64,
    pub pair: f64,
    pub total: f64,
}

impl MassAttenuation {
    pub fn get(&self, process: Process) -> f64 {
        match process {
            Process::Photoelectric => self.photoelectric,
            Process::Coherent => self.coherent,
            Process::Incoherent => self.incoherent,
            Process::Pair => self.pair,
            Process::Total => self.total,
        }
    }

    /// Weighted sum, used for mixtures.
    pub(crate) fn accumulate(&mut self, other: &MassAttenuation, weight: f64) {
        self.photoelectric += weight * other.photoelectric;
        self.coherent += weight * other.coherent;
        self.incoherent += weight * other.incoherent;
        self.pair += weight * other.pair;
        self.total += weight * other.total;
    }
}

/// Settings of the absorption edge search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeDetection {
    /// Minimum relative increase of the photoelectric coefficient between
    /// adjacent grid points.
    pub threshold: f64,
}

impl Default for EdgeDetection {
    fn default() -> Self {
        Self { threshold: 0.05 }
    }
}

/// A discontinuity found in a photoelectric table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbsorptionEdge {
    /// Energy of the first grid point above the jump (keV).
    pub energy: f64,
    /// Index of that grid point.
    pub index: usize,
    /// `mu[index] / mu[index - 1]`, infinite when the lower value is zero.
    pub jump_ratio: f64,
}

/// Report every adjacent pair where `values` grows by more than
/// `options.threshold` relative to the lower-energy point.
pub fn extract_edge_energies(
    energy: &[f64],
    values: &[f64],
    options: &EdgeDetection,
) -> Vec<AbsorptionEdge> {
    energy
        .iter()
        .zip(values)
        .enumerate()
        .skip(1)
        .filter_map(|(i, (&e, &v))| {
            let below = values[i - 1];
            if v <= below {
                return None;
            }
            let jump_ratio = if below > 0.0 { v / below } else { f64::INFINITY };
            (jump_ratio - 1.0 > options.threshold).then_some(AbsorptionEdge {
                energy: e,
                index: i,
                jump_ratio,
            })
        })
        .collect()
}

/// One tabulated coefficient on its own energy grid, interpolated log-log.
///
/// Used for the partial photoelectric cross section of a subshell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabulatedCurve {
    energy: Vec<f64>,
    values: Vec<f64>,
}

impl TabulatedCurve {
    pub fn new(energy: Vec<f64>, values: Vec<f64>) -> Result<Self> {
        validate_table("tabulated curve", &energy, &values)?;
        Ok(Self { energy, values })
    }

    pub fn energies(&self) -> &[f64] {
        &self.energy
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Value at `energy`; the end values are held outside the grid.
    pub fn value_at(&self, energy: f64) -> Result<f64> {
        validate_energy(energy)?;
        Ok(interp_loglog_one(energy, &self.energy, &self.values))
    }
}

/// Total mass attenuation table of an element: one strictly increasing energy
/// grid (keV) shared by the photoelectric, coherent, incoherent and pair
/// columns (cm²/g).
///
/// Every column is interpolated log-log on its own and the total is the sum
/// of the interpolated columns. At or beyond the ends of the grid the
/// boundary coefficients are returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttenuationTable {
    energy: Vec<f64>,
    photoelectric: Vec<f64>,
    coherent: Vec<f64>,
    incoherent: Vec<f64>,
    pair: Vec<f64>,
}

impl AttenuationTable {
    /// Build a table. An empty `pair` column means no pair production.
    pub fn new(
        energy: Vec<f64>,
        photoelectric: Vec<f64>,
        coherent: Vec<f64>,
        incoherent: Vec<f64>,
        pair: Vec<f64>,
    ) -> Result<Self> {
        let pair = if pair.is_empty() {
            vec![0.0; energy.len()]
        } else {
            pair
        };
        validate_table("photoelectric", &energy, &photoelectric)?;
        validate_table("coherent", &energy, &coherent)?;
        validate_table("incoherent", &energy, &incoherent)?;
        validate_table("pair", &energy, &pair)?;
        Ok(Self {
            energy,
            photoelectric,
            coherent,
            incoherent,
            pair,
        })
    }

    pub fn energies(&self) -> &[f64] {
        &self.energy
    }

    /// Stored column of a tabulated process, `None` for `Total`.
    pub fn column(&self, process: Process) -> Option<&[f64]> {
        match process {
            Process::Photoelectric => Some(&self.photoelectric),
            Process::Coherent => Some(&self.coherent),
            Process::Incoherent => Some(&self.incoherent),
            Process::Pair => Some(&self.pair),
            Process::Total => None,
        }
    }

    /// Coefficients of `process` on the table grid (`Total` is summed).
    pub fn values(&self, process: Process) -> Vec<f64> {
        match self.column(process) {
            Some(column) => column.to_vec(),
            None => (0..self.energy.len())
                .map(|i| {
                    self.photoelectric[i] + self.coherent[i] + self.incoherent[i] + self.pair[i]
                })
                .collect(),
        }
    }

    pub fn interpolation_indices(&self, energy: f64) -> Option<(usize, usize)> {
        interpolation_indices(&self.energy, energy)
    }

    /// Coefficient of one process at `energy`.
    pub fn coefficient(&self, process: Process, energy: f64) -> Result<f64> {
        validate_energy(energy)?;
        Ok(match self.column(process) {
            Some(column) => interp_loglog_one(energy, &self.energy, column),
            None => Process::TABULATED
                .iter()
                .filter_map(|p| self.column(*p))
                .map(|column| interp_loglog_one(energy, &self.energy, column))
                .sum(),
        })
    }

    /// All coefficients at `energy`.
    pub fn mass_attenuation(&self, energy: f64) -> Result<MassAttenuation> {
        validate_energy(energy)?;
        let at = |column: &[f64]| interp_loglog_one(energy, &self.energy, column);
        let photoelectric = at(&self.photoelectric);
        let coherent = at(&self.coherent);
        let incoherent = at(&self.incoherent);
        let pair = at(&self.pair);
        Ok(MassAttenuation {
            energy,
            photoelectric,
            coherent,
            incoherent,
            pair,
            total: photoelectric + coherent + incoherent + pair,
        })
    }

    pub fn mass_attenuation_many(&self, energies: &[f64]) -> Result<Vec<MassAttenuation>> {
        energies.iter().map(|&e| self.mass_attenuation(e)).collect()
    }

    /// Absorption edges visible in the photoelectric column.
    pub fn extract_edge_energies(&self, options: &EdgeDetection) -> Vec<AbsorptionEdge> {
        extract_edge_energies(&self.energy, &self.photoelectric, options)
    }
}
