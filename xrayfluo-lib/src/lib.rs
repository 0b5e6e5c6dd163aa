pub mod attenuation;
pub mod cascade;
pub mod constants;
pub mod deboer;
pub mod element;
pub mod error;
pub mod escape;
mod excitation;
pub mod expint;
pub mod interp;
pub mod lines;
pub mod peak;
mod record;
pub mod registry;
pub mod shell;
pub mod subshell;
pub mod vacancy;

pub use attenuation::{
    AbsorptionEdge, AttenuationTable, EdgeDetection, MassAttenuation, Process, TabulatedCurve,
};
pub use cascade::FULL_CASCADE;
pub use element::Element;
pub use error::{Result, XrayFluoError};
pub use escape::{EscapeOptions, escape_probability};
pub use expint::ContinuedFraction;
pub use lines::{EmissionLine, EmissionLines, FlaggedLine, LineFlag};
pub use peak::HypermetTails;
pub use registry::Elements;
pub use shell::{Shell, Transition};
pub use subshell::Subshell;
pub use vacancy::VacancyDistribution;
pub use xrayfluo_data;
