//! Density, CDF and quantile functions for the four SSD families.
//!
//! All functions take concentrations on the original scale and parameters in the
//! [`Params`] convention, so model averaging can treat families uniformly:
//!
//! - Log-Normal: `ln(x - loc) ~ Normal(ln scale, shape)`
//! - Log-Logistic: `ln(x - loc) ~ Logistic(ln scale, 1 / shape)`
//! - Weibull: `F(x) = 1 - exp(-((x - loc) / scale)^shape)`
//! - Gamma: `(x - loc) ~ Gamma(shape, scale)`

use statrs::distribution::{ContinuousCDF, Gamma};
use statrs::function::erf::{erfc, erfc_inv};
use statrs::function::gamma::ln_gamma;

use crate::domain::{Family, Params};
use crate::math::solve_from_guess_ln;

const LN_SQRT_2PI: f64 = 0.918_938_533_204_672_8;

impl Family {
    /// Log-density at `x`; `-∞` outside the support.
    pub fn ln_pdf(self, x: f64, params: &Params) -> f64 {
        let z = x - params.location;
        if !(z > 0.0) {
            return f64::NEG_INFINITY;
        }
        let Params { shape, scale, .. } = *params;

        match self {
            Family::LogNormal => {
                let u = (z.ln() - scale.ln()) / shape;
                -z.ln() - shape.ln() - LN_SQRT_2PI - 0.5 * u * u
            }
            Family::LogLogistic => {
                // Symmetric form keeps exp() from overflowing in either tail.
                let u = (shape * (z.ln() - scale.ln())).abs();
                shape.ln() - z.ln() - u - 2.0 * (-u).exp().ln_1p()
            }
            Family::Weibull => {
                let r = z / scale;
                shape.ln() - scale.ln() + (shape - 1.0) * r.ln() - r.powf(shape)
            }
            Family::Gamma => -ln_gamma(shape) - shape * scale.ln() + (shape - 1.0) * z.ln() - z / scale,
        }
    }

    /// Cumulative distribution function.
    pub fn cdf(self, x: f64, params: &Params) -> f64 {
        let z = x - params.location;
        if !(z > 0.0) {
            return 0.0;
        }
        let Params { shape, scale, .. } = *params;

        match self {
            Family::LogNormal => {
                let u = (z.ln() - scale.ln()) / shape;
                0.5 * erfc(-u / std::f64::consts::SQRT_2)
            }
            Family::LogLogistic => {
                let u = shape * (z.ln() - scale.ln());
                1.0 / (1.0 + (-u).exp())
            }
            Family::Weibull => -(-(z / scale).powf(shape)).exp_m1(),
            Family::Gamma => match Gamma::new(shape, 1.0 / scale) {
                Ok(dist) => dist.cdf(z),
                Err(_) => f64::NAN,
            },
        }
    }

    /// Inverse CDF for `p` in `(0, 1)`; `None` if `p` is out of range or the
    /// parameters are unusable.
    pub fn quantile(self, p: f64, params: &Params) -> Option<f64> {
        if !(p > 0.0 && p < 1.0) || !params.is_valid() {
            return None;
        }
        let Params {
            shape,
            location,
            scale,
        } = *params;

        let z = match self {
            Family::LogNormal => {
                // Φ⁻¹(p) = -√2 · erfc⁻¹(2p)
                let u = -std::f64::consts::SQRT_2 * erfc_inv(2.0 * p);
                scale * (shape * u).exp()
            }
            Family::LogLogistic => scale * (p / (1.0 - p)).powf(1.0 / shape),
            Family::Weibull => scale * (-(-p).ln_1p()).powf(1.0 / shape),
            Family::Gamma => {
                // No closed form: solve F(z) = p starting from the mean.
                let unit = Params::new(shape, 0.0, scale);
                solve_from_guess_ln(|z| Family::Gamma.cdf(z, &unit), shape * scale, p)?
            }
        };

        let x = location + z;
        x.is_finite().then_some(x)
    }

    /// Sum of log-densities over `values`.
    pub fn log_likelihood(self, values: &[f64], params: &Params) -> f64 {
        values.iter().map(|&x| self.ln_pdf(x, params)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn all_cases() -> Vec<(Family, Params)> {
        vec![
            (Family::LogNormal, Params::new(0.8, 0.0, 12.0)),
            (Family::LogLogistic, Params::new(2.5, 0.0, 12.0)),
            (Family::Weibull, Params::new(1.7, 0.0, 12.0)),
            (Family::Gamma, Params::new(2.2, 0.0, 5.0)),
        ]
    }

    #[test]
    fn quantile_inverts_cdf() {
        for (family, params) in all_cases() {
            for p in [0.01, 0.05, 0.2, 0.5, 0.9] {
                let x = family.quantile(p, &params).unwrap();
                assert_relative_eq!(family.cdf(x, &params), p, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn density_integrates_to_cdf() {
        // Trapezoid integration of exp(ln_pdf) on a log grid must match the CDF.
        for (family, params) in all_cases() {
            let upper = family.quantile(0.7, &params).unwrap();
            let lower = upper * 1e-6;
            let steps = 20_000;
            let (la, lb) = (lower.ln(), upper.ln());
            let h = (lb - la) / steps as f64;
            let mut area = 0.0;
            for i in 0..=steps {
                let t = la + h * i as f64;
                let x = t.exp();
                // dx = x dt on the log grid.
                let w = if i == 0 || i == steps { 0.5 } else { 1.0 };
                area += w * family.ln_pdf(x, &params).exp() * x;
            }
            area *= h;
            let expected = family.cdf(upper, &params) - family.cdf(lower, &params);
            assert_relative_eq!(area, expected, epsilon = 1e-5);
        }
    }

    #[test]
    fn log_normal_median_is_scale() {
        let params = Params::new(1.3, 0.0, 7.0);
        assert_relative_eq!(Family::LogNormal.quantile(0.5, &params).unwrap(), 7.0, epsilon = 1e-9);
        assert_relative_eq!(Family::LogLogistic.quantile(0.5, &params).unwrap(), 7.0, epsilon = 1e-9);
    }

    #[test]
    fn location_shifts_support() {
        let params = Params::new(2.0, 1.0, 3.0);
        assert_eq!(Family::Weibull.cdf(0.5, &params), 0.0);
        assert_eq!(Family::Gamma.ln_pdf(1.0, &params), f64::NEG_INFINITY);
        let q = Family::Weibull.quantile(0.5, &params).unwrap();
        assert!(q > 1.0);
    }

    #[test]
    fn quantile_rejects_out_of_range() {
        let params = Params::new(1.0, 0.0, 1.0);
        assert!(Family::Gamma.quantile(0.0, &params).is_none());
        assert!(Family::LogNormal.quantile(1.0, &params).is_none());
    }
}
