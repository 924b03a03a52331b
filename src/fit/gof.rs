//! Information criteria and goodness-of-fit statistics.
//!
//! - AICc ranks families and drives the Akaike weights.
//! - Anderson–Darling and Kolmogorov–Smirnov are reported for diagnostics only;
//!   they never exclude a family from the average.
//!
//! The p-values are the usual "case 0" approximations (parameters treated as
//! known). They are optimistic for fitted parameters, which is acceptable for a
//! diagnostic column.

use serde::{Deserialize, Serialize};

use crate::domain::{Family, Params};

/// Guard for `ln F` and `ln(1 - F)` at the extremes.
const CDF_EPS: f64 = 1e-12;

/// Above this adjusted statistic the upper Stephens piece stops decreasing.
const AD_P_CUTOFF: f64 = 153.467;

/// AICc or, when the small-sample correction is undefined (`n <= k + 1`),
/// plain AIC.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InformationCriterion {
    pub value: f64,
    /// `false` means the value is AIC and the fallback should be reported.
    pub small_sample_corrected: bool,
}

/// `AICc = 2k - 2 ln L + 2k(k+1)/(n-k-1)`; falls back to AIC when `n <= k + 1`.
pub fn aicc(log_likelihood: f64, k: usize, n: usize) -> InformationCriterion {
    let aic = 2.0 * k as f64 - 2.0 * log_likelihood;
    if n > k + 1 {
        let k = k as f64;
        InformationCriterion {
            value: aic + 2.0 * k * (k + 1.0) / (n as f64 - k - 1.0),
            small_sample_corrected: true,
        }
    } else {
        InformationCriterion {
            value: aic,
            small_sample_corrected: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoodnessOfFit {
    pub ad_statistic: f64,
    /// `A² (1 + 0.75/n + 2.25/n²)`, the input to the p-value approximation.
    pub ad_adjusted: f64,
    pub ad_p_value: f64,
    pub ks_statistic: f64,
    pub ks_p_value: f64,
}

/// Compute both tests for a fitted family on `values` (any order).
pub fn goodness_of_fit(family: Family, params: &Params, values: &[f64]) -> GoodnessOfFit {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let cdf: Vec<f64> = sorted.iter().map(|&x| family.cdf(x, params)).collect();

    let n = cdf.len() as f64;
    let ad = anderson_darling(&cdf);
    let ad_adjusted = ad * (1.0 + 0.75 / n + 2.25 / (n * n));
    let ks = kolmogorov_smirnov(&cdf);

    GoodnessOfFit {
        ad_statistic: ad,
        ad_adjusted,
        ad_p_value: anderson_darling_p_value(ad_adjusted),
        ks_statistic: ks,
        ks_p_value: kolmogorov_smirnov_p_value(ks, cdf.len()),
    }
}

/// Anderson–Darling `A²` from model CDF values at the sorted sample.
pub fn anderson_darling(sorted_cdf: &[f64]) -> f64 {
    let n = sorted_cdf.len();
    if n == 0 {
        return f64::NAN;
    }
    let clamp = |f: f64| f.clamp(CDF_EPS, 1.0 - CDF_EPS);

    let s: f64 = (0..n)
        .map(|i| {
            let lo = clamp(sorted_cdf[i]);
            let hi = clamp(sorted_cdf[n - 1 - i]);
            (2 * i + 1) as f64 * (lo.ln() + (1.0 - hi).ln())
        })
        .sum();

    -(n as f64) - s / n as f64
}

/// Stephens' piecewise approximation for the adjusted statistic.
///
/// Statistics beyond [`AD_P_CUTOFF`] report `0.0`.
pub fn anderson_darling_p_value(a: f64) -> f64 {
    let p = if a >= AD_P_CUTOFF {
        0.0
    } else if a >= 0.6 {
        (1.2937 - 5.709 * a + 0.0186 * a * a).exp()
    } else if a >= 0.34 {
        (0.9177 - 4.279 * a - 1.38 * a * a).exp()
    } else if a >= 0.2 {
        1.0 - (-8.318 + 42.796 * a - 59.938 * a * a).exp()
    } else {
        1.0 - (-13.436 + 101.14 * a - 223.73 * a * a).exp()
    };
    p.clamp(0.0, 1.0)
}

/// One-sample KS statistic `D` from model CDF values at the sorted sample.
pub fn kolmogorov_smirnov(sorted_cdf: &[f64]) -> f64 {
    let n = sorted_cdf.len() as f64;
    sorted_cdf
        .iter()
        .enumerate()
        .map(|(i, &f)| {
            let above = (i + 1) as f64 / n - f;
            let below = f - i as f64 / n;
            above.max(below)
        })
        .fold(0.0, f64::max)
}

/// Asymptotic KS p-value with Stephens' small-sample effective `λ`.
pub fn kolmogorov_smirnov_p_value(d: f64, n: usize) -> f64 {
    if n == 0 || !d.is_finite() {
        return f64::NAN;
    }
    let sqrt_n = (n as f64).sqrt();
    let lambda = (sqrt_n + 0.12 + 0.11 / sqrt_n) * d;
    q_ks(lambda)
}

/// `Q_KS(λ) = 2 Σ (-1)^{j-1} exp(-2 j² λ²)`.
fn q_ks(lambda: f64) -> f64 {
    let a2 = -2.0 * lambda * lambda;
    let mut sign = 2.0;
    let mut sum = 0.0;
    let mut prev_term = 0.0_f64;

    for j in 1..=100 {
        let j = j as f64;
        let term = sign * (a2 * j * j).exp();
        sum += term;
        if term.abs() <= 1e-3 * prev_term || term.abs() <= 1e-8 * sum {
            return sum.clamp(0.0, 1.0);
        }
        sign = -sign;
        prev_term = term.abs();
    }

    // Series did not settle: λ is tiny and the fit is indistinguishable.
    1.0
}
