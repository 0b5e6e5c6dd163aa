use crate::error::{Result, XrayFluoError};

/// Locate the grid points bracketing `x` in a strictly increasing grid.
///
/// Returns `(lo, hi)` with `hi == lo + 1` when `x` falls strictly between two
/// grid points, and `lo == hi` when `x` hits a grid point exactly or lies
/// outside the grid (the nearest end point is returned). `None` for an empty
/// grid or a NaN query.
pub fn interpolation_indices(xp: &[f64], x: f64) -> Option<(usize, usize)> {
    if xp.is_empty() || x.is_nan() {
        return None;
    }
    let last = xp.len() - 1;
    if x <= xp[0] {
        return Some((0, 0));
    }
    if x >= xp[last] {
        return Some((last, last));
    }

    // Binary search for the bracket
    let hi = xp.partition_point(|&v| v < x);
    if xp[hi] == x {
        Some((hi, hi))
    } else {
        Some((hi - 1, hi))
    }
}

/// Linear interpolation of a single value.
///
/// Values outside the range are clamped to the boundary values.
pub fn interp_one(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    match interpolation_indices(xp, x) {
        None => f64::NAN,
        Some((lo, hi)) if lo == hi => fp[lo],
        Some((lo, hi)) => {
            let t = (x - xp[lo]) / (xp[hi] - xp[lo]);
            fp[lo] + t * (fp[hi] - fp[lo])
        }
    }
}

/// Log-log interpolation of a single value.
///
/// Between two grid points `ln f` is linear in `ln x`. Queries at or beyond
/// the ends of the grid return the boundary value; tabulated cross sections
/// are not power laws outside their range, so nothing is extrapolated. When
/// one of the bracketing values is zero (pair production below threshold,
/// partial cross sections below their edge) the bracket falls back to linear
/// interpolation.
pub fn interp_loglog_one(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    match interpolation_indices(xp, x) {
        None => f64::NAN,
        Some((lo, hi)) if lo == hi => fp[lo],
        Some((lo, hi)) => {
            let (x0, x1) = (xp[lo], xp[hi]);
            let (y0, y1) = (fp[lo], fp[hi]);
            if y0 > 0.0 && y1 > 0.0 {
                let t = (x.ln() - x0.ln()) / (x1.ln() - x0.ln());
                (y0.ln() + t * (y1.ln() - y0.ln())).exp()
            } else {
                y0 + (x - x0) / (x1 - x0) * (y1 - y0)
            }
        }
    }
}

/// Check that `energy` is a usable interpolation grid for `values`.
pub(crate) fn validate_table(what: &str, energy: &[f64], values: &[f64]) -> Result<()> {
    if energy.is_empty() {
        return Err(XrayFluoError::InvalidTable(format!("{what}: empty energy grid")));
    }
    if energy.len() != values.len() {
        return Err(XrayFluoError::InvalidTable(format!(
            "{what}: {} energies but {} values",
            energy.len(),
            values.len()
        )));
    }
    for (i, &e) in energy.iter().enumerate() {
        if !e.is_finite() || e <= 0.0 {
            return Err(XrayFluoError::InvalidTable(format!(
                "{what}: energy at index {i} must be finite and > 0, got {e}"
            )));
        }
        if i > 0 && e <= energy[i - 1] {
            return Err(XrayFluoError::InvalidTable(format!(
                "{what}: energy grid must be strictly increasing, index {i} has {e} after {}",
                energy[i - 1]
            )));
        }
    }
    for (i, &v) in values.iter().enumerate() {
        if !v.is_finite() || v < 0.0 {
            return Err(XrayFluoError::InvalidTable(format!(
                "{what}: value at index {i} must be finite and >= 0, got {v}"
            )));
        }
    }
    Ok(())
}

/// Reject query energies that cannot be interpolated.
pub(crate) fn validate_energy(energy: f64) -> Result<()> {
    if energy.is_finite() && energy > 0.0 {
        Ok(())
    } else {
        Err(XrayFluoError::invalid(format!(
            "energy must be finite and > 0 keV, got {energy}"
        )))
    }
}
