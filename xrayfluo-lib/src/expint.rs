//! Exponential integrals.
//!
//! Only real parts are computed. For negative arguments `E1(x)` is the
//! principal value `-Ei(-x)`, which is what the closed forms of the
//! secondary-excitation integrals need when an exponential grows inside the
//! integration range.

use crate::constants::{E1_SERIES_LIMIT, EI_ASYMPTOTIC_LIMIT, EULER_GAMMA};
use crate::error::{Result, XrayFluoError};

/// Stopping rule for the modified Lentz evaluation of `exp(x)·E1(x)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContinuedFraction {
    /// Relative change of the last convergent below which iteration stops.
    pub epsilon: f64,
    pub max_iterations: usize,
}

impl ContinuedFraction {
    /// Tighter rule used internally where differences of `D` are formed.
    pub const PRECISE: Self = Self {
        epsilon: 1.0e-14,
        max_iterations: 1000,
    };
}

impl Default for ContinuedFraction {
    fn default() -> Self {
        Self {
            epsilon: 1.0e-7,
            max_iterations: 100,
        }
    }
}

/// Returns false if `x` is NaN.
pub fn is_number(x: f64) -> bool {
    !x.is_nan()
}

/// Returns false if `x` is NaN or infinite.
pub fn is_finite_number(x: f64) -> bool {
    x.is_finite()
}

pub(crate) fn finite_or(value: f64, what: &'static str) -> Result<f64> {
    if is_finite_number(value) {
        Ok(value)
    } else {
        Err(XrayFluoError::NonFiniteResult(what))
    }
}

/// Abramowitz and Stegun 5.1.53: `E1(x) + ln(x)` for `0 <= x <= 1`.
///
/// Absolute error below 2e-7.
pub fn as_5_1_53(x: f64) -> f64 {
    const A: [f64; 6] = [
        -0.577_215_66,
        0.999_991_93,
        -0.249_910_55,
        0.055_199_68,
        -0.009_760_04,
        0.001_078_57,
    ];
    A.iter().rev().fold(0.0, |acc, &a| acc * x + a)
}

/// Abramowitz and Stegun 5.1.56: `x·exp(x)·E1(x)` for `1 <= x`.
///
/// Absolute error below 5e-5. Kept as a cheap cross-check of the continued
/// fraction.
pub fn as_5_1_56(x: f64) -> f64 {
    let num = (((x + 8.573_328_740_1) * x + 18.059_016_973_0) * x + 8.634_760_892_5) * x
        + 0.267_773_734_3;
    let den = (((x + 9.573_322_345_4) * x + 25.632_956_148_6) * x + 21.099_653_082_7) * x
        + 3.958_496_922_8;
    num / den
}

/// Exponential integral of order 1 (real part).
pub fn e1(x: f64) -> Result<f64> {
    e1_with(x, &ContinuedFraction::default())
}

/// [`e1`] with an explicit continued-fraction stopping rule.
pub fn e1_with(x: f64, cf: &ContinuedFraction) -> Result<f64> {
    if x.is_nan() {
        return Err(XrayFluoError::invalid("E1 of NaN"));
    }
    if x == 0.0 {
        return Err(XrayFluoError::invalid("E1 diverges at x = 0"));
    }
    if x < 0.0 {
        return Ok(-ei(-x)?);
    }
    if x <= E1_SERIES_LIMIT {
        return Ok(as_5_1_53(x) - x.ln());
    }
    if x.is_infinite() {
        return Ok(0.0);
    }
    Ok(lentz_d(x, cf)? * (-x).exp())
}

/// Exponential integral of order `n >= 1` (real part).
///
/// Uses the upward recurrence `E(k+1) = (exp(-x) - x·E(k)) / k` seeded with
/// `E1`, which is accurate for the small orders used in fluorescence work.
pub fn en(n: u32, x: f64) -> Result<f64> {
    if n == 0 {
        return Err(XrayFluoError::invalid("En requires n >= 1"));
    }
    if x == 0.0 {
        return if n == 1 {
            Err(XrayFluoError::invalid("E1 diverges at x = 0"))
        } else {
            Ok(1.0 / f64::from(n - 1))
        };
    }
    let mut value = e1(x)?;
    let decay = (-x).exp();
    for k in 1..n {
        value = (decay - x * value) / f64::from(k);
    }
    finite_or(value, "En")
}

/// `exp(x)·E1(x)`, the `D` function of de Boer's secondary excitation paper.
pub fn de_boer_d(x: f64) -> Result<f64> {
    de_boer_d_with(x, &ContinuedFraction::default())
}

/// [`de_boer_d`] with an explicit continued-fraction stopping rule.
pub fn de_boer_d_with(x: f64, cf: &ContinuedFraction) -> Result<f64> {
    if x.is_nan() {
        return Err(XrayFluoError::invalid("D of NaN"));
    }
    if x == 0.0 {
        return Err(XrayFluoError::invalid("D diverges at x = 0"));
    }
    if x < 0.0 {
        // exp(x)·(-Ei(-x)) without forming Ei(-x) when it is huge
        let y = -x;
        return if y < EI_ASYMPTOTIC_LIMIT {
            Ok(-x.exp() * ei_series(y))
        } else {
            Ok(-ei_scaled_asymptotic(y))
        };
    }
    if x <= E1_SERIES_LIMIT {
        return Ok(x.exp() * (as_5_1_53(x) - x.ln()));
    }
    if x.is_infinite() {
        return Ok(0.0);
    }
    lentz_d(x, cf)
}

/// Modified Lentz evaluation of the continued fraction
/// `exp(x)·E1(x) = 1/(x+1- 1/(x+3- 4/(x+5- ...)))`, valid for `x > 1`.
fn lentz_d(x: f64, cf: &ContinuedFraction) -> Result<f64> {
    const TINY: f64 = 1.0e-300;
    if !(cf.epsilon > 0.0) || cf.max_iterations == 0 {
        return Err(XrayFluoError::invalid(format!(
            "continued fraction needs epsilon > 0 and max_iterations > 0, got {cf:?}"
        )));
    }

    let mut b = x + 1.0;
    let mut c = 1.0 / TINY;
    let mut d = 1.0 / b;
    let mut h = d;
    for i in 1..=cf.max_iterations {
        let an = -((i * i) as f64);
        b += 2.0;
        d = an * d + b;
        if d.abs() < TINY {
            d = TINY;
        }
        d = 1.0 / d;
        c = b + an / c;
        if c.abs() < TINY {
            c = TINY;
        }
        let delta = c * d;
        h *= delta;
        if (delta - 1.0).abs() < cf.epsilon {
            return Ok(h);
        }
    }
    Err(XrayFluoError::NonConvergence {
        x,
        iterations: cf.max_iterations,
    })
}

/// Exponential integral `Ei(x)` (principal value).
pub fn ei(x: f64) -> Result<f64> {
    if x.is_nan() {
        return Err(XrayFluoError::invalid("Ei of NaN"));
    }
    if x == 0.0 {
        return Err(XrayFluoError::invalid("Ei diverges at x = 0"));
    }
    if x < 0.0 {
        return Ok(-e1(-x)?);
    }
    let value = if x < EI_ASYMPTOTIC_LIMIT {
        ei_series(x)
    } else {
        ei_scaled_asymptotic(x) * x.exp()
    };
    finite_or(value, "Ei")
}

/// `Ei(x) = γ + ln x + Σ x^k/(k·k!)`; every term is positive for `x > 0`.
fn ei_series(x: f64) -> f64 {
    let mut term = 1.0;
    let mut sum = 0.0;
    for k in 1..1000 {
        let k = f64::from(k);
        term *= x / k;
        let contribution = term / k;
        sum += contribution;
        if contribution < 1.0e-17 * sum {
            break;
        }
    }
    EULER_GAMMA + x.ln() + sum
}

/// `exp(-x)·Ei(x) ≈ (1/x) Σ k!/x^k`, truncated at the smallest term.
fn ei_scaled_asymptotic(x: f64) -> f64 {
    let mut term = 1.0;
    let mut sum = 1.0;
    for k in 1..200 {
        let next = term * f64::from(k) / x;
        if next >= term || next < 1.0e-17 {
            break;
        }
        term = next;
        sum += term;
    }
    sum / x
}

/// Entire exponential integral `Ein(x) = ∫0^x (1 - exp(-t))/t dt`.
///
/// `Ein(x) = E1(x) + ln|x| + γ` for any real `x != 0`, so differences of `E1`
/// at arguments of the same sign reduce to differences of `Ein` plus a
/// logarithm, which stays finite when the arguments go to zero together.
pub fn ein(x: f64) -> Result<f64> {
    if x.is_nan() {
        return Err(XrayFluoError::invalid("Ein of NaN"));
    }
    if x == 0.0 {
        return Ok(0.0);
    }
    if x > E1_SERIES_LIMIT {
        return Ok(e1_with(x, &ContinuedFraction::PRECISE)? + x.ln() + EULER_GAMMA);
    }
    if x >= -EI_ASYMPTOTIC_LIMIT {
        let mut term = 1.0;
        let mut sum = 0.0;
        for k in 1..1000 {
            let k = f64::from(k);
            term *= -x / k;
            let contribution = term / k;
            sum -= contribution;
            if contribution.abs() < 1.0e-17 * sum.abs() {
                break;
            }
        }
        return Ok(sum);
    }
    let y = -x;
    finite_or(EULER_GAMMA + y.ln() - ei_scaled_asymptotic(y) * y.exp(), "Ein")
}

/// `E1(x)` for `x > 0` to full double precision: through `Ein` up to the
/// series limit, the precise continued fraction above it.
pub fn e1_precise(x: f64) -> Result<f64> {
    if x > 0.0 && x <= E1_SERIES_LIMIT {
        Ok(ein(x)? - x.ln() - EULER_GAMMA)
    } else {
        e1_with(x, &ContinuedFraction::PRECISE)
    }
}

/// `exp(scale)·Ein(x)` for `x < 0` without overflowing when `scale - x <= 0`.
pub(crate) fn ein_scaled(x: f64, scale: f64) -> Result<f64> {
    if x >= -EI_ASYMPTOTIC_LIMIT {
        return Ok(scale.exp() * ein(x)?);
    }
    let y = -x;
    Ok(scale.exp() * (EULER_GAMMA + y.ln()) - (scale + y).exp() * ei_scaled_asymptotic(y))
}
