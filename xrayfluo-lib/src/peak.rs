//! Error functions and the HYPERMET detector response.

use std::f64::consts::{PI, SQRT_2};

use serde::{Deserialize, Serialize};

use crate::constants::{FWHM_PER_SIGMA, SILICON_PAIR_ENERGY};
use crate::error::{Result, XrayFluoError};

const FRAC_2_SQRT_PI: f64 = std::f64::consts::FRAC_2_SQRT_PI;

/// Below this argument erf is summed as a series, above it erfc comes from a
/// continued fraction.
const ERF_SERIES_LIMIT: f64 = 2.0;

/// `erf(x) = 2/sqrt(π)·exp(-x²)·Σ 2ⁿ x^(2n+1)/(2n+1)!!`, all terms positive.
fn erf_series(x: f64) -> f64 {
    let x2 = x * x;
    let mut term = x;
    let mut sum = 0.0;
    for n in 1..200 {
        sum += term;
        term *= 2.0 * x2 / f64::from(2 * n + 1);
        if term < 1.0e-17 * sum {
            break;
        }
    }
    FRAC_2_SQRT_PI * (-x2).exp() * sum
}

/// `exp(x²)·erfc(x)` for `x >= ERF_SERIES_LIMIT` by Lentz's method on
/// `x + (1/2)/(x + 1/(x + (3/2)/(x + ...)))`.
fn erfcx_continued_fraction(x: f64) -> f64 {
    const TINY: f64 = 1.0e-300;
    let mut f = x;
    let mut c = f;
    let mut d = 0.0;
    for n in 1..500 {
        let a = 0.5 * f64::from(n);
        d = x + a * d;
        if d.abs() < TINY {
            d = TINY;
        }
        d = 1.0 / d;
        c = x + a / c;
        if c.abs() < TINY {
            c = TINY;
        }
        let delta = c * d;
        f *= delta;
        if (delta - 1.0).abs() < 1.0e-16 {
            break;
        }
    }
    1.0 / (PI.sqrt() * f)
}

/// Error function.
pub fn erf(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    let ax = x.abs();
    let value = if ax < ERF_SERIES_LIMIT {
        erf_series(ax)
    } else {
        1.0 - erfc(ax)
    };
    value.copysign(x)
}

/// Complementary error function, accurate in the far tail.
pub fn erfc(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x < 0.0 {
        return 2.0 - erfc(-x);
    }
    if x < ERF_SERIES_LIMIT {
        1.0 - erf_series(x)
    } else if x > 27.3 {
        0.0
    } else {
        (-x * x).exp() * erfcx_continued_fraction(x)
    }
}

/// Scaled complementary error function `exp(x²)·erfc(x)`.
pub fn erfcx(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x >= ERF_SERIES_LIMIT {
        if x.is_infinite() {
            0.0
        } else {
            erfcx_continued_fraction(x)
        }
    } else {
        (x * x).exp() * erfc(x)
    }
}

/// Tail and step parameters of a HYPERMET peak.
///
/// Tail areas are fractions of the Gaussian area and slopes are decay
/// lengths in keV. The step height is relative to the Gaussian peak height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HypermetTails {
    pub short_tail_area: f64,
    pub short_tail_slope: f64,
    pub long_tail_area: f64,
    pub long_tail_slope: f64,
    pub step_height: f64,
}

impl Default for HypermetTails {
    fn default() -> Self {
        Self {
            short_tail_area: 0.0,
            short_tail_slope: 0.03,
            long_tail_area: 0.0,
            long_tail_slope: 1.0,
            step_height: 0.0,
        }
    }
}

/// Low-energy exponential tail of unit area convolved with the Gaussian.
fn tail(dx: f64, sigma: f64, slope: f64) -> f64 {
    let z = dx / (SQRT_2 * sigma);
    let w = z + sigma / (SQRT_2 * slope);
    let shape = if w > 0.0 {
        (-z * z).exp() * erfcx(w)
    } else {
        (dx / slope + sigma * sigma / (2.0 * slope * slope)).exp() * erfc(w)
    };
    shape / (2.0 * slope)
}

/// HYPERMET response at `x` for a line of `gauss_area` counts at `position`.
///
/// Gaussian of the given FWHM, plus short and long low-energy tails and a
/// low-energy step, all sharing the Gaussian resolution.
pub fn hypermet(
    x: f64,
    gauss_area: f64,
    position: f64,
    fwhm: f64,
    tails: &HypermetTails,
) -> Result<f64> {
    if !(fwhm > 0.0) || !fwhm.is_finite() {
        return Err(XrayFluoError::invalid(format!("fwhm must be finite and > 0, got {fwhm}")));
    }
    if !x.is_finite() || !gauss_area.is_finite() || !position.is_finite() {
        return Err(XrayFluoError::invalid("hypermet arguments must be finite"));
    }

    let sigma = fwhm / FWHM_PER_SIGMA;
    let dx = x - position;
    let z = dx / (SQRT_2 * sigma);
    let height = gauss_area / (sigma * (2.0 * PI).sqrt());

    let mut value = height * (-z * z).exp();
    for (area, slope, name) in [
        (tails.short_tail_area, tails.short_tail_slope, "short tail"),
        (tails.long_tail_area, tails.long_tail_slope, "long tail"),
    ] {
        if area != 0.0 {
            if !(slope > 0.0) || !slope.is_finite() {
                return Err(XrayFluoError::invalid(format!(
                    "{name} slope must be finite and > 0, got {slope}"
                )));
            }
            value += area * gauss_area * tail(dx, sigma, slope);
        }
    }
    if tails.step_height != 0.0 {
        value += tails.step_height * height * 0.5 * erfc(z);
    }

    if value.is_finite() {
        Ok(value)
    } else {
        Err(XrayFluoError::NonFiniteResult("hypermet"))
    }
}

/// Detector resolution (FWHM, keV) at `energy` for a silicon detector.
pub fn fwhm(energy: f64, noise: f64, fano: f64) -> f64 {
    fwhm_with_pair_energy(energy, noise, fano, SILICON_PAIR_ENERGY)
}

/// `sqrt(noise² + 2.3548²·fano·quantum_energy·energy)`.
pub fn fwhm_with_pair_energy(energy: f64, noise: f64, fano: f64, quantum_energy: f64) -> f64 {
    (noise * noise + FWHM_PER_SIGMA * FWHM_PER_SIGMA * fano * quantum_energy * energy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_erf_reference_values() {
        assert_relative_eq!(erf(0.1), 0.112_462_916_018_284_9, max_relative = 1e-14);
        assert_relative_eq!(erf(1.0), 0.842_700_792_949_714_9, max_relative = 1e-14);
        assert_relative_eq!(erf(-1.0), -0.842_700_792_949_714_9, max_relative = 1e-14);
        assert_relative_eq!(erfc(3.0), 2.209_049_699_858_544e-5, max_relative = 1e-13);
        assert_relative_eq!(erfc(10.0), 2.088_487_583_762_545e-45, max_relative = 1e-13);
        assert_relative_eq!(erfc(-2.0), 2.0 - 0.004_677_734_981_047_266, max_relative = 1e-14);
        assert_eq!(erf(0.0), 0.0);
        assert_eq!(erfc(40.0), 0.0);
    }

    #[test]
    fn test_erf_branches_agree() {
        let below = erfc(ERF_SERIES_LIMIT - 1e-12);
        let above = erfc(ERF_SERIES_LIMIT + 1e-12);
        assert_relative_eq!(below, above, max_relative = 1e-10);
    }

    #[test]
    fn test_erfcx_large_argument() {
        // exp(x²)erfc(x) ~ 1/(x·sqrt(π)) for large x
        let x = 1.0e4;
        assert_relative_eq!(erfcx(x), 1.0 / (x * PI.sqrt()), max_relative = 1e-8);
    }

    #[test]
    fn test_hypermet_peak_height() {
        let fwhm = 0.15;
        let sigma = fwhm / FWHM_PER_SIGMA;
        let value = hypermet(6.4, 1000.0, 6.4, fwhm, &HypermetTails::default()).unwrap();
        assert_relative_eq!(value, 1000.0 / (sigma * (2.0 * PI).sqrt()), max_relative = 1e-12);
    }

    #[test]
    fn test_hypermet_step_is_low_energy_side() {
        let tails = HypermetTails {
            step_height: 0.01,
            ..Default::default()
        };
        let low = hypermet(5.0, 1000.0, 6.4, 0.15, &tails).unwrap();
        let high = hypermet(7.8, 1000.0, 6.4, 0.15, &tails).unwrap();
        assert!(low > 0.0);
        assert!(high < 1e-12);
    }

    #[test]
    fn test_hypermet_rejects_bad_width() {
        assert!(hypermet(1.0, 1.0, 1.0, 0.0, &HypermetTails::default()).is_err());
        let tails = HypermetTails {
            short_tail_area: 0.1,
            short_tail_slope: 0.0,
            ..Default::default()
        };
        assert!(hypermet(1.0, 1.0, 1.0, 0.1, &tails).is_err());
    }

    #[test]
    fn test_fwhm() {
        assert_relative_eq!(fwhm(0.0, 0.1, 0.114), 0.1);
        let expected = (0.01f64 + 2.354_820_045_030_949_3f64.powi(2) * 0.114 * 0.003_85 * 5.9).sqrt();
        assert_relative_eq!(fwhm(5.9, 0.1, 0.114), expected, max_relative = 1e-14);
    }
}
