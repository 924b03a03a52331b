//! Synthetic endpoint datasets drawn from a known SSD.
//!
//! Used to validate the engine end to end: generate endpoints from a family with
//! known parameters, run the analysis, compare the HCp with the true quantile.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Gamma, LogNormal, Normal, Weibull};

use crate::domain::{Family, Params, RawEndpoint};
use crate::error::SsdError;

/// Labels cycled through so generated data cover the broad groups.
const GROUP_LABELS: [&str; 5] = ["Fish", "Crustaceans", "Insects", "Algae", "Amphibians"];

#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub family: Family,
    pub params: Params,
    pub species_count: usize,
    /// Endpoints recorded per species.
    pub endpoints_per_species: usize,
    /// Log-scale sd of the multiplicative noise between a species' endpoints.
    pub within_species_sd: f64,
    pub seed: u64,
}

impl SampleConfig {
    pub fn new(family: Family, params: Params, species_count: usize) -> Self {
        Self {
            family,
            params,
            species_count,
            endpoints_per_species: 1,
            within_species_sd: 0.0,
            seed: 42,
        }
    }
}

/// Generate raw endpoints: one true species value drawn from the SSD, then
/// `endpoints_per_species` noisy replicates around it.
pub fn generate_endpoints(config: &SampleConfig) -> Result<Vec<RawEndpoint>, SsdError> {
    if config.species_count == 0 || config.endpoints_per_species == 0 {
        return Err(SsdError::InvalidConfig("Sample must contain at least one endpoint.".to_string()));
    }
    if !(config.within_species_sd.is_finite() && config.within_species_sd >= 0.0) {
        return Err(SsdError::InvalidConfig("Within-species sd must be finite and >= 0.".to_string()));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let values = draw_values(config.family, &config.params, config.species_count, &mut rng)?;
    let noise = Normal::new(0.0, config.within_species_sd)
        .map_err(|e| SsdError::InvalidConfig(format!("Noise distribution error: {e}")))?;

    let mut rows = Vec::with_capacity(config.species_count * config.endpoints_per_species);
    for (i, value) in values.into_iter().enumerate() {
        let id = format!("Species {:02}", i + 1);
        let label = GROUP_LABELS[i % GROUP_LABELS.len()];
        for _ in 0..config.endpoints_per_species {
            let endpoint = value * noise.sample(&mut rng).exp();
            rows.push(RawEndpoint::new(id.clone(), label, endpoint));
        }
    }

    Ok(rows)
}

/// Draw `n` values from `family` with `params`.
pub fn draw_values(family: Family, params: &Params, n: usize, rng: &mut StdRng) -> Result<Vec<f64>, SsdError> {
    if !params.is_valid() {
        return Err(SsdError::InvalidConfig(format!("Invalid sampling parameters {params:?}.")));
    }
    let dist_err = |e: &dyn std::fmt::Display| SsdError::InvalidConfig(format!("Sampling distribution error: {e}"));
    let Params {
        shape,
        location,
        scale,
    } = *params;

    let raw: Vec<f64> = match family {
        Family::LogNormal => {
            let dist = LogNormal::new(scale.ln(), shape).map_err(|e| dist_err(&e))?;
            (0..n).map(|_| dist.sample(rng)).collect()
        }
        Family::LogLogistic => (0..n)
            .map(|_| {
                // Inverse transform; gen::<f64>() is in [0, 1), so shift away from 0.
                let u: f64 = 1.0 - rng.r#gen::<f64>();
                scale * ((1.0 - u) / u).powf(1.0 / shape)
            })
            .collect(),
        Family::Weibull => {
            let dist = Weibull::new(scale, shape).map_err(|e| dist_err(&e))?;
            (0..n).map(|_| dist.sample(rng)).collect()
        }
        Family::Gamma => {
            let dist = Gamma::new(shape, scale).map_err(|e| dist_err(&e))?;
            (0..n).map(|_| dist.sample(rng)).collect()
        }
    };

    Ok(raw.into_iter().map(|v| v + location).collect())
}

/// Deterministic "ideal" sample: the quantiles at `i / (n + 1)`.
pub fn quantile_values(family: Family, params: &Params, n: usize) -> Option<Vec<f64>> {
    (1..=n)
        .map(|i| family.quantile(i as f64 / (n + 1) as f64, params))
        .collect()
}
