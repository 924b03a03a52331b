//! Akaike-weighted model averaging.
//!
//! The averaged SSD is the mixture `F(x) = Σ wᵢ Fᵢ(x)` of the fitted families,
//! weighted by `wᵢ ∝ exp(-Δᵢ / 2)` where `Δᵢ` is the AICc distance to the best
//! family. The averaged HCp is the `p`-quantile of that mixture, found by
//! bisection between the smallest and largest component quantiles.
//!
//! Single-distribution mode is the degenerate mixture with one unit weight.

use crate::domain::Family;
use crate::error::SsdError;
use crate::fit::fitter::FittedModel;
use crate::math::solve_increasing_ln;

/// Akaike weights for a set of information-criterion values.
///
/// Non-finite criteria receive weight 0. Returns an empty vector when no value
/// is finite.
pub fn akaike_weights(criteria: &[f64]) -> Vec<f64> {
    let best = criteria.iter().copied().filter(|c| c.is_finite()).fold(f64::INFINITY, f64::min);
    if !best.is_finite() {
        return Vec::new();
    }

    let raw: Vec<f64> = criteria
        .iter()
        .map(|&c| if c.is_finite() { (-(c - best) / 2.0).exp() } else { 0.0 })
        .collect();
    let total: f64 = raw.iter().sum();
    raw.into_iter().map(|r| r / total).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeightedModel {
    pub model: FittedModel,
    pub weight: f64,
}

/// A weighted mixture of fitted families.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAverage {
    pub components: Vec<WeightedModel>,
}

impl ModelAverage {
    /// Weight `models` by AICc.
    pub fn akaike(models: Vec<FittedModel>) -> Result<Self, SsdError> {
        if models.is_empty() {
            return Err(SsdError::AllModelsFailed {
                reason: "no distribution family could be fitted".to_string(),
            });
        }
        let criteria: Vec<f64> = models.iter().map(|m| m.aicc.value).collect();
        let weights = akaike_weights(&criteria);
        if weights.is_empty() {
            return Err(SsdError::AllModelsFailed {
                reason: "no fitted family has a finite AICc".to_string(),
            });
        }

        Ok(Self {
            components: models
                .into_iter()
                .zip(weights)
                .map(|(model, weight)| WeightedModel { model, weight })
                .collect(),
        })
    }

    /// Give `family` all the weight; other fitted families stay as zero-weight
    /// components so their diagnostics remain available.
    pub fn single(models: Vec<FittedModel>, family: Family) -> Result<Self, SsdError> {
        if !models.iter().any(|m| m.family == family) {
            return Err(SsdError::AllModelsFailed {
                reason: format!("selected distribution {} could not be fitted", family.display_name()),
            });
        }

        Ok(Self {
            components: models
                .into_iter()
                .map(|model| {
                    let weight = if model.family == family { 1.0 } else { 0.0 };
                    WeightedModel { model, weight }
                })
                .collect(),
        })
    }

    fn active(&self) -> impl Iterator<Item = &WeightedModel> {
        self.components.iter().filter(|c| c.weight > 0.0)
    }

    /// Weight of `family`, or 0 if it is not part of the mixture.
    pub fn weight_of(&self, family: Family) -> f64 {
        self.components
            .iter()
            .find(|c| c.model.family == family)
            .map_or(0.0, |c| c.weight)
    }

    /// Mixture CDF.
    pub fn cdf(&self, x: f64) -> f64 {
        self.active().map(|c| c.weight * c.model.cdf(x)).sum()
    }

    /// Hazardous concentration for fraction `p`.
    pub fn hcp(&self, p: f64) -> Option<f64> {
        let mut lo = f64::INFINITY;
        let mut hi = 0.0_f64;
        for c in self.active() {
            let q = c.model.quantile(p)?;
            if !(q > 0.0) {
                return None;
            }
            lo = lo.min(q);
            hi = hi.max(q);
        }
        if !lo.is_finite() {
            return None;
        }

        solve_increasing_ln(|x| self.cdf(x), lo, hi, p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Params;
    use crate::fit::gof::InformationCriterion;
    use approx::assert_relative_eq;

    fn model(family: Family, params: Params, ic: f64) -> FittedModel {
        FittedModel {
            family,
            params,
            log_likelihood: 0.0,
            aicc: InformationCriterion {
                value: ic,
                small_sample_corrected: true,
            },
            gof: None,
            n: 10,
        }
    }

    #[test]
    fn weights_follow_aicc_differences() {
        let w = akaike_weights(&[10.0, 12.0, 10.0]);
        assert_relative_eq!(w.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(w[0], w[2]);
        assert_relative_eq!(w[1] / w[0], (-1.0_f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn weights_ignore_non_finite_criteria() {
        let w = akaike_weights(&[f64::NAN, 5.0]);
        assert_eq!(w, vec![0.0, 1.0]);
        assert!(akaike_weights(&[f64::INFINITY]).is_empty());
    }

    #[test]
    fn single_component_hcp_is_its_quantile() {
        let params = Params::new(1.0, 0.0, 10.0);
        let avg = ModelAverage::single(vec![model(Family::LogNormal, params, 1.0)], Family::LogNormal).unwrap();
        let expected = Family::LogNormal.quantile(0.05, &params).unwrap();
        assert_relative_eq!(avg.hcp(0.05).unwrap(), expected, max_relative = 1e-10);
    }

    #[test]
    fn mixture_hcp_lies_between_components() {
        let a = model(Family::LogNormal, Params::new(1.0, 0.0, 10.0), 20.0);
        let b = model(Family::Weibull, Params::new(1.5, 0.0, 30.0), 20.5);
        let qa = a.quantile(0.05).unwrap();
        let qb = b.quantile(0.05).unwrap();
        let avg = ModelAverage::akaike(vec![a, b]).unwrap();

        let h = avg.hcp(0.05).unwrap();
        assert!(h > qa.min(qb) && h < qa.max(qb));
        assert_relative_eq!(avg.cdf(h), 0.05, epsilon = 1e-10);
    }

    #[test]
    fn single_mode_zeroes_other_families() {
        let a = model(Family::LogNormal, Params::new(1.0, 0.0, 10.0), 20.0);
        let b = model(Family::Gamma, Params::new(2.0, 0.0, 5.0), 10.0);
        let avg = ModelAverage::single(vec![a, b], Family::LogNormal).unwrap();
        assert_eq!(avg.weight_of(Family::LogNormal), 1.0);
        assert_eq!(avg.weight_of(Family::Gamma), 0.0);
        assert_eq!(avg.weight_of(Family::Weibull), 0.0);

        let missing = ModelAverage::single(vec![], Family::Weibull);
        assert!(matches!(missing, Err(SsdError::AllModelsFailed { .. })));
    }
}
