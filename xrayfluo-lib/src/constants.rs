/// Euler-Mascheroni constant
pub const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// FWHM of a Gaussian in units of its standard deviation, 2·sqrt(2·ln 2)
pub const FWHM_PER_SIGMA: f64 = 2.354_820_045_030_949_3;

/// Mean energy (keV) to create an electron-hole pair in silicon
pub const SILICON_PAIR_ENERGY: f64 = 0.003_85;

/// Boundary between the series and continued-fraction branches of E1
pub const E1_SERIES_LIMIT: f64 = 1.0;

/// Argument above which the asymptotic expansion of Ei is used
pub(crate) const EI_ASYMPTOTIC_LIMIT: f64 = 40.0;
