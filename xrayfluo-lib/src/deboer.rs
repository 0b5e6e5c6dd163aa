//! Secondary-excitation integrals after D.K.G. de Boer, X-Ray Spectrometry 19
//! (1990) 145.
//!
//! All integrals are over mass thickness (g/cm²) with mass attenuation
//! coefficients (cm²/g) as rates, so every `mu·d` product is an optical
//! thickness. The single-layer kernels are closed forms built from `E1`, the
//! scaled `D = exp(x)·E1(x)` and the entire function `Ein`. The two-layer
//! kernels integrate the exponential representation of `E1` with a fixed
//! Gauss-Legendre rule, which removes every `mu·s == p` style singularity by
//! construction.

use crate::constants::E1_SERIES_LIMIT;
use crate::error::{Result, XrayFluoError};
use crate::expint::{ContinuedFraction, de_boer_d_with, e1_precise, ein, ein_scaled, finite_or};

/// `|a|·reach` below which `exp(-a·u)` is expanded to first order.
const SMALL_EXPONENT: f64 = 1.0e-6;

/// Beyond this optical thickness a layer is treated as infinitely thick.
const THICK_LAYER: f64 = 50.0;

/// Width (in `ln s`) of one quadrature panel.
const PANEL_WIDTH: f64 = 0.25;

const GAUSS_NODES: [f64; 4] = [
    0.183_434_642_495_649_8,
    0.525_532_409_916_329_0,
    0.796_666_477_413_626_7,
    0.960_289_856_497_536_3,
];

const GAUSS_WEIGHTS: [f64; 4] = [
    0.362_683_783_378_362_0,
    0.313_706_645_877_887_3,
    0.222_381_034_453_374_5,
    0.101_228_536_290_376_3,
];

/// `exp(x)·E1(x)` to full precision on both sides of the series limit.
fn d_precise(x: f64) -> Result<f64> {
    if x > 0.0 && x <= E1_SERIES_LIMIT {
        Ok(x.exp() * e1_precise(x)?)
    } else {
        de_boer_d_with(x, &ContinuedFraction::PRECISE)
    }
}

fn require_positive(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && !value.is_nan() {
        Ok(())
    } else {
        Err(XrayFluoError::invalid(format!("{name} must be > 0, got {value}")))
    }
}

fn require_finite(name: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(XrayFluoError::invalid(format!("{name} must be finite, got {value}")))
    }
}

/// `(1 - exp(-x))/x` for `x >= 0`, equal to 1 at `x = 0`.
pub(crate) fn phi(x: f64) -> f64 {
    if x < 1.0e-8 {
        1.0 - 0.5 * x
    } else {
        -(-x).exp_m1() / x
    }
}

/// `(exp(-u) - exp(-v))/(v - u)`, finite when `u == v`.
fn divided_exp(u: f64, v: f64) -> f64 {
    (-u.min(v)).exp() * phi((v - u).abs())
}

/// `∫0^d E1(b·u) du` and `∫0^d u·E1(b·u) du`.
fn w_moments(b: f64, d: f64) -> Result<(f64, f64)> {
    let x = b * d;
    if x.is_infinite() {
        return Ok((1.0 / b, 0.5 / (b * b)));
    }
    let e1x = e1_precise(x)?;
    let decay = (-x).exp();
    let m0 = d * e1x - (-x).exp_m1() / b;
    // 1 - (1 + x)·exp(-x), written to keep precision for small x
    let tail = -(-x).exp_m1() - x * decay;
    let m1 = 0.5 * d * d * e1x + 0.5 * tail / (b * b);
    Ok((m0, m1))
}

/// `exp(log_scale)·∫0^d exp(-a·u)·E1(b·u) du` for finite `d`.
///
/// The scale lets callers multiply by a decaying exponential before the
/// growing pieces (`a < 0`) are formed.
pub(crate) fn scaled_w(a: f64, b: f64, d: f64, log_scale: f64) -> Result<f64> {
    if (a * d).abs() < SMALL_EXPONENT {
        let (m0, m1) = w_moments(b, d)?;
        return Ok(log_scale.exp() * (m0 - a * m1));
    }

    // exp(log_scale)·(1 - exp(-a·d))/a
    let weight = if a > 0.0 {
        -(-a * d).exp_m1() * log_scale.exp() / a
    } else if -a * d > 1.0 {
        ((log_scale - a * d).exp() - log_scale.exp()) / -a
    } else {
        log_scale.exp() * (-a * d).exp_m1() / -a
    };
    let boundary = if weight == 0.0 { 0.0 } else { weight * e1_precise(b * d)? };
    let inner = (ein_scaled((a + b) * d, log_scale)? - ein_scaled(b * d, log_scale)?) / a;
    Ok(boundary + inner)
}

/// `W(a, b, d) = ∫0^d exp(-a·u)·E1(b·u) du`.
///
/// `b > 0`. `d` may be infinite when `a > -b`, giving `ln(1 + a/b)/a`.
/// `a` may have either sign; `a == 0` and `a + b == 0` are regular points.
pub fn de_boer_w(a: f64, b: f64, d: f64) -> Result<f64> {
    require_finite("a", a)?;
    require_positive("b", b)?;
    require_finite("b", b)?;
    require_positive("d", d)?;

    if d.is_infinite() {
        if a <= -b {
            return Err(XrayFluoError::invalid(format!(
                "W diverges on an infinite range for a = {a} <= -b = {}",
                -b
            )));
        }
        let ratio = a / b;
        let value = if ratio.abs() < 1.0e-12 {
            1.0 / b
        } else {
            ratio.ln_1p() / a
        };
        return Ok(value);
    }
    finite_or(scaled_w(a, b, d, 0.0)?, "de_boer_w")
}

/// `e^{-v}·(v·D(v) - 1)` and `e^{-v}·(v²·D(v) - v - 1)/2`, the antiderivatives
/// of `E1(v)` and `v·E1(v)`; both vanish at infinity.
fn e1_primitives(v: f64) -> Result<(f64, f64)> {
    if v.is_infinite() {
        return Ok((0.0, 0.0));
    }
    let d = d_precise(v)?;
    let decay = (-v).exp();
    Ok((
        decay * (v * d - 1.0),
        0.5 * decay * (v * v * d - v - 1.0),
    ))
}

/// `Y(a, b, c, d) = ∫0^d exp(-a·u)·E1(b·u + c) du`.
///
/// `b > 0`, `c >= 0` (`c == 0` is [`de_boer_w`]). `d` may be infinite when
/// `a >= 0`.
pub fn de_boer_y(a: f64, b: f64, c: f64, d: f64) -> Result<f64> {
    require_finite("a", a)?;
    require_positive("b", b)?;
    require_finite("b", b)?;
    require_finite("c", c)?;
    if c < 0.0 {
        return Err(XrayFluoError::invalid(format!("c must be >= 0, got {c}")));
    }
    require_positive("d", d)?;
    if c == 0.0 {
        return de_boer_w(a, b, d);
    }
    if d.is_infinite() && a < 0.0 {
        return Err(XrayFluoError::invalid(format!(
            "Y diverges on an infinite range for a = {a} < 0"
        )));
    }

    let far = c + b * d;
    let reach = d.min(30.0 / b);
    if (a * reach).abs() < SMALL_EXPONENT {
        let (p0_far, p1_far) = e1_primitives(far)?;
        let (p0_near, p1_near) = e1_primitives(c)?;
        let m0 = (p0_far - p0_near) / b;
        let m1 = ((p1_far - p1_near) - c * (p0_far - p0_near)) / (b * b);
        return finite_or(m0 - a * m1, "de_boer_y");
    }

    let k = (a + b) / b;
    let far_decay = if d.is_infinite() {
        0.0
    } else {
        (-(a + b) * d).exp()
    };
    let d_far = if far_decay == 0.0 { 0.0 } else { d_precise(far)? };
    let direct = d_precise(c)? - far_decay * d_far;

    // exp(c)·exp(a·c/b)·(E1(k·c) - E1(k·far))
    let shifted = if k * c >= 1.0 || d.is_infinite() {
        let d_k_far = if far_decay == 0.0 {
            0.0
        } else {
            d_precise(k * far)?
        };
        d_precise(k * c)? - far_decay * d_k_far
    } else {
        (k * c).exp() * ((far / c).ln() + ein(k * c)? - ein(k * far)?)
    };

    finite_or((-c).exp() / a * (direct - shifted), "de_boer_y")
}

/// Single-layer secondary excitation integral
///
/// `L0 = ∫0^t ∫0^t exp(-mu1·z)·exp(-mu2·s)·E1(muj·|z - s|) dz ds`
///
/// with `t = density·thickness`. `mu1` is the attenuation of the primary beam
/// along the depth axis, `mu2` that of the fluorescence, `muj` that of the
/// exciting line. A zero or non-finite mass thickness means an infinitely
/// thick layer.
pub fn de_boer_l0(mu1: f64, mu2: f64, muj: f64, density: f64, thickness: f64) -> Result<f64> {
    for (name, mu) in [("mu1", mu1), ("mu2", mu2), ("muj", muj)] {
        require_positive(name, mu)?;
        require_finite(name, mu)?;
    }
    if density.is_nan() || density < 0.0 || thickness.is_nan() || thickness < 0.0 {
        return Err(XrayFluoError::invalid(format!(
            "density and thickness must be >= 0, got {density} and {thickness}"
        )));
    }

    let t = density * thickness;
    let sum = mu1 + mu2;
    if t == 0.0 || !t.is_finite() || mu1.min(mu2) * t > THICK_LAYER {
        let value = ((mu1 / muj).ln_1p() / mu1 + (mu2 / muj).ln_1p() / mu2) / sum;
        return finite_or(value, "de_boer_l0");
    }

    let direct = scaled_w(mu1, muj, t, 0.0)? + scaled_w(mu2, muj, t, 0.0)?;
    let reflected = scaled_w(-mu1, muj, t, -sum * t)? + scaled_w(-mu2, muj, t, -sum * t)?;
    finite_or((direct - reflected) / sum, "de_boer_l0")
}

/// Integrate `f(s)/s` over `s ∈ [1, ∞)` as `∫ f(e^τ) dτ` over `[0, tau_max]`.
fn integrate_log_scale(tau_max: f64, f: impl Fn(f64) -> f64) -> f64 {
    let panels = (tau_max / PANEL_WIDTH).ceil().max(1.0) as usize;
    let half = 0.5 * tau_max / panels as f64;
    let mut total = 0.0;
    for i in 0..panels {
        let mid = (2 * i + 1) as f64 * half;
        let mut panel = 0.0;
        for (node, weight) in GAUSS_NODES.iter().zip(GAUSS_WEIGHTS) {
            panel += weight * (f((mid - half * node).exp()) + f((mid + half * node).exp()));
        }
        total += panel * half;
    }
    total
}

/// Upper limit in `τ = ln s` beyond which the integrand is negligible.
fn tau_limit(scales: &[f64], beta: f64) -> f64 {
    let base = scales
        .iter()
        .filter(|v| v.is_finite() && **v > 0.0)
        .map(|v| v.ln())
        .fold(0.0_f64, f64::max)
        + 25.0;
    if beta > 0.0 {
        base.min((60.0 / beta).ln().max(1.0))
    } else {
        base
    }
}

fn check_two_layer(p: f64, q: f64, d1: f64, d2: f64, mu1: f64, mu2: f64, beta: f64) -> Result<()> {
    for (name, v) in [("p", p), ("q", q), ("beta", beta)] {
        require_finite(name, v)?;
        if v < 0.0 {
            return Err(XrayFluoError::invalid(format!("{name} must be >= 0, got {v}")));
        }
    }
    for (name, v) in [("d1", d1), ("d2", d2), ("mu_1_j", mu1), ("mu_2_j", mu2)] {
        require_positive(name, v)?;
        require_finite(name, v)?;
    }
    Ok(())
}

/// Two-layer kernel with the exciting layer below the fluorescing one
///
/// `X = ∫0^d1 dz ∫0^d2 dt exp(-p·z)·exp(-q·t)·E1(mu_1_j·(d1 - z) + mu_b_j_d_t + mu_2_j·t)`
///
/// `z` is the depth inside the fluorescing layer (mass thickness `d1`), `t`
/// the depth inside the exciting layer (`d2`) measured from its top, and
/// `mu_b_j_d_t` the optical thickness of everything in between for the
/// exciting line.
pub fn de_boer_x(
    p: f64,
    q: f64,
    d1: f64,
    d2: f64,
    mu_1_j: f64,
    mu_2_j: f64,
    mu_b_j_d_t: f64,
) -> Result<f64> {
    check_two_layer(p, q, d1, d2, mu_1_j, mu_2_j, mu_b_j_d_t)?;
    let tau_max = tau_limit(
        &[1.0 / (mu_1_j * d1), 1.0 / (mu_2_j * d2), p / mu_1_j, q / mu_2_j],
        mu_b_j_d_t,
    );
    let value = integrate_log_scale(tau_max, |s| {
        (-mu_b_j_d_t * s).exp()
            * d1
            * divided_exp(p * d1, mu_1_j * d1 * s)
            * d2
            * divided_exp(0.0, (q + mu_2_j * s) * d2)
    });
    finite_or(value, "de_boer_x")
}

/// Two-layer kernel with the exciting layer above the fluorescing one
///
/// `V = ∫0^d1 dz ∫0^d2 dt exp(-p·z)·exp(-q·t)·E1(mu_1_j·z + mu_b_j_d_t + mu_2_j·(d2 - t))`
///
/// Same symbols as [`de_boer_x`]; `V(p, q, d1, d2, m1, m2, b)` equals
/// `X(q, p, d2, d1, m2, m1, b)`.
pub fn de_boer_v(
    p: f64,
    q: f64,
    d1: f64,
    d2: f64,
    mu_1_j: f64,
    mu_2_j: f64,
    mu_b_j_d_t: f64,
) -> Result<f64> {
    check_two_layer(p, q, d1, d2, mu_1_j, mu_2_j, mu_b_j_d_t)?;
    let tau_max = tau_limit(
        &[1.0 / (mu_1_j * d1), 1.0 / (mu_2_j * d2), p / mu_1_j, q / mu_2_j],
        mu_b_j_d_t,
    );
    let value = integrate_log_scale(tau_max, |s| {
        (-mu_b_j_d_t * s).exp()
            * d1
            * divided_exp(0.0, (p + mu_1_j * s) * d1)
            * d2
            * divided_exp(q * d2, mu_2_j * d2 * s)
    });
    finite_or(value, "de_boer_v")
}
