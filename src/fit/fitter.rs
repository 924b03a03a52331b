//! Maximum-likelihood fitting for a single distribution family.
//!
//! Given aggregated species values `x_i > 0` we estimate:
//!
//! - Log-Normal: closed-form MLE of `(μ, σ)` on `ln x`
//! - Log-Logistic: simplex MLE of `(μ, ln s)` on `ln x`
//! - Weibull: simplex MLE of `ln k` on `x`, with `λ` profiled out analytically
//! - Gamma: simplex MLE of `ln a` on `x`, with `θ` profiled out analytically
//!
//! The threshold (`location`) is fixed at zero. The log-likelihood stored on the
//! fit is always evaluated on the original concentration scale, which for the
//! log-scale families is their log-scale likelihood minus `Σ ln x_i` (the Jacobian
//! of the transform). This keeps AICc comparable across families.

use nalgebra::DVector;
use tracing::debug;

use crate::domain::{Family, Params};
use crate::fit::gof::{GoodnessOfFit, InformationCriterion, aicc, goodness_of_fit};
use crate::math::{SimplexOptions, is_degenerate, mean, minimize, population_variance};

/// A successfully fitted family.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    pub family: Family,
    pub params: Params,
    /// Log-likelihood on the original concentration scale.
    pub log_likelihood: f64,
    pub aicc: InformationCriterion,
    /// Present for fits on observed data; skipped inside the bootstrap.
    pub gof: Option<GoodnessOfFit>,
    /// Number of values the model was fitted to.
    pub n: usize,
}

impl FittedModel {
    pub fn cdf(&self, x: f64) -> f64 {
        self.family.cdf(x, &self.params)
    }

    pub fn quantile(&self, p: f64) -> Option<f64> {
        self.family.quantile(p, &self.params)
    }
}

/// A family that could not be fitted, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct FitFailure {
    pub family: Family,
    pub reason: String,
}

/// Fits for a set of families, split by outcome (input order preserved).
#[derive(Debug, Clone, Default)]
pub struct FamilyFits {
    pub fitted: Vec<FittedModel>,
    pub failed: Vec<FitFailure>,
}

impl Family {
    /// Fit this family to `values` (all finite and `> 0`).
    pub fn fit(self, values: &[f64]) -> Result<FittedModel, FitFailure> {
        let fail = |reason: String| FitFailure { family: self, reason };

        let params = estimate(self, values).map_err(fail)?;
        if !params.is_valid() {
            return Err(fail(format!("non-finite parameters {params:?}")));
        }

        let log_likelihood = self.log_likelihood(values, &params);
        if !log_likelihood.is_finite() {
            return Err(fail("non-finite log-likelihood".to_string()));
        }

        Ok(FittedModel {
            family: self,
            params,
            log_likelihood,
            aicc: aicc(log_likelihood, self.param_count(), values.len()),
            gof: None,
            n: values.len(),
        })
    }
}

/// Fit every family in `families` and keep those with a usable quantile at `p`.
///
/// Goodness-of-fit statistics are computed only when `with_gof` is set; they are
/// diagnostics and the bootstrap has no use for them.
pub fn fit_families(values: &[f64], families: &[Family], p: f64, with_gof: bool) -> FamilyFits {
    let mut out = FamilyFits::default();

    for &family in families {
        match family.fit(values) {
            Ok(mut model) => {
                match model.quantile(p) {
                    Some(q) if q > 0.0 => {}
                    _ => {
                        out.failed.push(FitFailure {
                            family,
                            reason: "could not derive a valid positive HCp".to_string(),
                        });
                        continue;
                    }
                }
                if with_gof {
                    model.gof = Some(goodness_of_fit(family, &model.params, values));
                }
                debug!(
                    family = family.display_name(),
                    shape = model.params.shape,
                    scale = model.params.scale,
                    log_likelihood = model.log_likelihood,
                    aicc = model.aicc.value,
                    "fitted distribution"
                );
                out.fitted.push(model);
            }
            Err(failure) => {
                debug!(family = family.display_name(), reason = %failure.reason, "fit failed");
                out.failed.push(failure);
            }
        }
    }

    out
}

fn estimate(family: Family, values: &[f64]) -> Result<Params, String> {
    if values.len() < 2 {
        return Err(format!("need at least 2 values, got {}", values.len()));
    }
    if values.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
        return Err("values must be finite and positive".to_string());
    }

    let logs: Vec<f64> = values.iter().map(|v| v.ln()).collect();
    let target: &[f64] = if family.fits_log_scale() { &logs } else { values };
    if is_degenerate(target) {
        return Err("data have zero variance".to_string());
    }

    match family {
        Family::LogNormal => fit_log_normal(&logs),
        Family::LogLogistic => fit_log_logistic(&logs),
        Family::Weibull => fit_weibull(values, &logs),
        Family::Gamma => fit_gamma(values, &logs),
    }
}

fn fit_log_normal(logs: &[f64]) -> Result<Params, String> {
    let mu = mean(logs).ok_or("empty data")?;
    let sigma = population_variance(logs).ok_or("empty data")?.sqrt();
    Ok(Params::new(sigma, 0.0, mu.exp()))
}

fn fit_log_logistic(logs: &[f64]) -> Result<Params, String> {
    let mu0 = mean(logs).ok_or("empty data")?;
    let sd = population_variance(logs).ok_or("empty data")?.sqrt();
    // Logistic variance is s²π²/3.
    let s0 = sd * 3.0_f64.sqrt() / std::f64::consts::PI;

    let nll = |theta: &DVector<f64>| {
        let mu = theta[0];
        let s = theta[1].exp();
        logs.iter()
            .map(|&u| {
                let z = ((u - mu) / s).abs();
                z + s.ln() + 2.0 * (-z).exp().ln_1p()
            })
            .sum::<f64>()
    };

    let x0 = DVector::from_row_slice(&[mu0, s0.ln()]);
    let step = DVector::from_row_slice(&[0.25 * sd, 0.2]);
    let theta = run_simplex(nll, &x0, &step)?;

    Ok(Params::new(1.0 / theta[1].exp(), 0.0, theta[0].exp()))
}

/// Ceiling on the moment-based Weibull starting shape.
const MAX_WEIBULL_START_SHAPE: f64 = 50.0;

fn fit_weibull(values: &[f64], logs: &[f64]) -> Result<Params, String> {
    // ln x of a Weibull is Gumbel(min) with sd = π / (k √6).
    let sd_log = population_variance(logs).ok_or("empty data")?.sqrt();
    let k0 = (std::f64::consts::PI / (6.0_f64.sqrt() * sd_log)).min(MAX_WEIBULL_START_SHAPE);

    // For fixed k the MLE of λ is (mean(x^k))^(1/k), taken relative to max(x)
    // so x^k cannot overflow for large k.
    let x_max = values.iter().copied().fold(0.0, f64::max);
    let lambda_hat = |k: f64| {
        let m = values.iter().map(|x| (x / x_max).powf(k)).sum::<f64>() / values.len() as f64;
        x_max * m.powf(1.0 / k)
    };

    let nll = |theta: &DVector<f64>| {
        let k = theta[0].exp();
        let params = Params::new(k, 0.0, lambda_hat(k));
        -Family::Weibull.log_likelihood(values, &params)
    };

    let x0 = DVector::from_row_slice(&[k0.ln()]);
    let step = DVector::from_row_slice(&[0.2]);
    let theta = run_simplex(nll, &x0, &step)?;

    let k = theta[0].exp();
    Ok(Params::new(k, 0.0, lambda_hat(k)))
}

fn fit_gamma(values: &[f64], logs: &[f64]) -> Result<Params, String> {
    let m = mean(values).ok_or("empty data")?;
    let mean_log = mean(logs).ok_or("empty data")?;

    // Minka's closed-form approximation to the shape MLE.
    let s = m.ln() - mean_log;
    if !(s.is_finite() && s > 0.0) {
        return Err("data have zero variance".to_string());
    }
    let a0 = (3.0 - s + ((s - 3.0).powi(2) + 24.0 * s).sqrt()) / (12.0 * s);

    // For fixed a the MLE of θ is mean / a.
    let nll = |theta: &DVector<f64>| {
        let a = theta[0].exp();
        let params = Params::new(a, 0.0, m / a);
        -Family::Gamma.log_likelihood(values, &params)
    };

    let x0 = DVector::from_row_slice(&[a0.ln()]);
    let step = DVector::from_row_slice(&[0.2]);
    let theta = run_simplex(nll, &x0, &step)?;

    let a = theta[0].exp();
    Ok(Params::new(a, 0.0, m / a))
}

fn run_simplex<F>(f: F, x0: &DVector<f64>, step: &DVector<f64>) -> Result<DVector<f64>, String>
where
    F: Fn(&DVector<f64>) -> f64,
{
    let opts = SimplexOptions::default();
    let min = minimize(f, x0, step, &opts).ok_or("objective is not finite at the starting point")?;
    if !min.converged {
        return Err(format!("optimizer did not converge after {} iterations", min.iterations));
    }
    if !min.f.is_finite() || min.x.iter().any(|v| !v.is_finite()) {
        return Err("optimizer returned non-finite estimates".to_string());
    }
    Ok(min.x)
}
