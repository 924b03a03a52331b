//! Analysis configuration.
//!
//! Every field has a default matching the interactive tool this engine backs, so a
//! caller can deserialize a partial document (`{"hcp_percentile": 10}`) and get a
//! complete, validated configuration.

use serde::{Deserialize, Serialize};

use crate::domain::{AggregationMode, AnalysisMode, ExposureTerm, Family, MediaType};
use crate::error::SsdError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub aggregation: AggregationMode,
    #[serde(default = "AnalysisConfig::default_min_species_count")]
    pub min_species_count: usize,
    /// Groups that must be represented (matched against broad group names and raw labels).
    #[serde(default)]
    pub required_groups: Vec<String>,
    /// Keep only endpoints measured in this media.
    #[serde(default)]
    pub media: Option<MediaType>,
    /// Exposure terms in order of preference, best first. Empty keeps all terms.
    #[serde(default)]
    pub exposure_preference: Vec<ExposureTerm>,
    #[serde(default)]
    pub analysis_mode: AnalysisMode,
    /// Required when `analysis_mode` is `single`.
    #[serde(default)]
    pub selected_family: Option<Family>,
    /// Percentile `p` of the HCp, in percent (5.0 means HC5).
    #[serde(default = "AnalysisConfig::default_hcp_percentile")]
    pub hcp_percentile: f64,
    #[serde(default = "AnalysisConfig::default_bootstrap_iterations")]
    pub bootstrap_iterations: usize,
    #[serde(default = "AnalysisConfig::default_confidence_level")]
    pub confidence_level: f64,
    /// Share of failed bootstrap iterations above which the interval is flagged.
    #[serde(default = "AnalysisConfig::default_max_failure_rate")]
    pub max_failure_rate: f64,
    #[serde(default = "AnalysisConfig::default_random_seed")]
    pub random_seed: u64,
    /// Run bootstrap iterations on the rayon pool.
    #[serde(default = "AnalysisConfig::default_parallel")]
    pub parallel: bool,
    /// Number of grid points for the reported CDF curve.
    #[serde(default = "AnalysisConfig::default_curve_points")]
    pub curve_points: usize,
}

impl AnalysisConfig {
    fn default_min_species_count() -> usize {
        8
    }
    fn default_hcp_percentile() -> f64 {
        5.0
    }
    fn default_bootstrap_iterations() -> usize {
        1000
    }
    fn default_confidence_level() -> f64 {
        0.95
    }
    fn default_max_failure_rate() -> f64 {
        0.2
    }
    fn default_random_seed() -> u64 {
        42
    }
    fn default_parallel() -> bool {
        true
    }
    fn default_curve_points() -> usize {
        200
    }

    /// Parse a JSON configuration document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, SsdError> {
        let config: AnalysisConfig = serde_json::from_str(json)
            .map_err(|e| SsdError::InvalidConfig(format!("Failed to parse configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Single-distribution configuration for `family`.
    pub fn single(family: Family) -> Self {
        Self {
            analysis_mode: AnalysisMode::Single,
            selected_family: Some(family),
            ..Self::default()
        }
    }

    /// Families whose fits feed the HCp (all four, or the selected one).
    pub fn active_families(&self) -> Vec<Family> {
        match (self.analysis_mode, self.selected_family) {
            (AnalysisMode::Single, Some(family)) => vec![family],
            _ => Family::ALL.to_vec(),
        }
    }

    /// HCp percentile as a probability in `(0, 1)`.
    pub fn hcp_probability(&self) -> f64 {
        self.hcp_percentile / 100.0
    }

    pub fn validate(&self) -> Result<(), SsdError> {
        if self.analysis_mode == AnalysisMode::Single && self.selected_family.is_none() {
            return Err(SsdError::InvalidConfig(
                "Single-distribution mode requires a selected family.".to_string(),
            ));
        }
        if !(self.hcp_percentile.is_finite() && self.hcp_percentile > 0.0 && self.hcp_percentile < 100.0) {
            return Err(SsdError::InvalidConfig(format!(
                "HCp percentile must be in (0, 100), got {}.",
                self.hcp_percentile
            )));
        }
        if !(self.confidence_level.is_finite() && self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(SsdError::InvalidConfig(format!(
                "Confidence level must be in (0, 1), got {}.",
                self.confidence_level
            )));
        }
        if !(self.max_failure_rate.is_finite() && (0.0..=1.0).contains(&self.max_failure_rate)) {
            return Err(SsdError::InvalidConfig(format!(
                "Maximum bootstrap failure rate must be in [0, 1], got {}.",
                self.max_failure_rate
            )));
        }
        if self.min_species_count < 3 {
            return Err(SsdError::InvalidConfig(format!(
                "Minimum species count must be at least 3, got {}.",
                self.min_species_count
            )));
        }
        if self.curve_points < 2 {
            return Err(SsdError::InvalidConfig("Curve must have at least 2 points.".to_string()));
        }
        Ok(())
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            aggregation: AggregationMode::default(),
            min_species_count: Self::default_min_species_count(),
            required_groups: Vec::new(),
            media: None,
            exposure_preference: Vec::new(),
            analysis_mode: AnalysisMode::default(),
            selected_family: None,
            hcp_percentile: Self::default_hcp_percentile(),
            bootstrap_iterations: Self::default_bootstrap_iterations(),
            confidence_level: Self::default_confidence_level(),
            max_failure_rate: Self::default_max_failure_rate(),
            random_seed: Self::default_random_seed(),
            parallel: Self::default_parallel(),
            curve_points: Self::default_curve_points(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_takes_defaults() {
        let config = AnalysisConfig::from_json(r#"{"hcp_percentile": 10, "aggregation": "most_sensitive"}"#)
            .unwrap();
        assert_eq!(config.hcp_percentile, 10.0);
        assert_eq!(config.aggregation, AggregationMode::MostSensitive);
        assert_eq!(config.min_species_count, 8);
        assert_eq!(config.bootstrap_iterations, 1000);
        assert_eq!(config.random_seed, 42);
    }

    #[test]
    fn single_mode_requires_family() {
        let config = AnalysisConfig {
            analysis_mode: AnalysisMode::Single,
            ..AnalysisConfig::default()
        };
        assert!(matches!(config.validate(), Err(SsdError::InvalidConfig(_))));

        let config = AnalysisConfig::single(Family::Weibull);
        assert!(config.validate().is_ok());
        assert_eq!(config.active_families(), vec![Family::Weibull]);
    }

    #[test]
    fn rejects_out_of_range_percentile() {
        let config = AnalysisConfig {
            hcp_percentile: 100.0,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
