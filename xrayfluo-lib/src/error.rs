#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum XrayFluoError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("{what} length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("unknown element: {0}")]
    UnknownElement(String),
    #[error("unknown subshell: {0}")]
    UnknownSubshell(String),
    #[error("invalid transition label '{label}' for subshell {subshell}")]
    InvalidLabel { subshell: String, label: String },
    #[error("invalid table: {0}")]
    InvalidTable(String),
    #[error("continued fraction for x={x} did not converge in {iterations} iterations")]
    NonConvergence { x: f64, iterations: usize },
    #[error("{0} produced a non-finite result")]
    NonFiniteResult(&'static str),
}

pub type Result<T> = std::result::Result<T, XrayFluoError>;

impl XrayFluoError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// True for the caller-input family of failures.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument(_)
                | Self::LengthMismatch { .. }
                | Self::UnknownElement(_)
                | Self::UnknownSubshell(_)
                | Self::InvalidLabel { .. }
        )
    }
}
