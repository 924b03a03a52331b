//! Small descriptive-statistics helpers shared by the cleaner, fitters and bootstrap.

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance (divisor `n`), matching maximum-likelihood estimates.
pub fn population_variance(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    Some(values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64)
}

/// Geometric mean `exp(mean(ln v))` of strictly positive values.
pub fn geometric_mean(values: &[f64]) -> Option<f64> {
    if values.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
        return None;
    }
    let logs: Vec<f64> = values.iter().map(|v| v.ln()).collect();
    mean(&logs).map(f64::exp)
}

/// `true` when the values carry no spread worth fitting.
///
/// The threshold is relative to the magnitude of the data so it behaves the same
/// for µg/L and mg/L inputs.
pub fn is_degenerate(values: &[f64]) -> bool {
    let Some(var) = population_variance(values) else {
        return true;
    };
    let scale = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs())).max(1e-300);
    !(var.is_finite()) || var.sqrt() <= 1e-12 * scale
}

/// Empirical percentile with linear interpolation between order statistics
/// (`q` in percent, NumPy's default method).
///
/// `sorted` must be sorted ascending.
pub fn percentile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !q.is_finite() {
        return None;
    }
    let q = q.clamp(0.0, 100.0);
    let pos = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Sort a copy and take the percentile.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    percentile_sorted(&sorted, q)
}
